//! The contract every DSP unit satisfies.
//!
//! Plugins are polymorphic over a capability set: every plugin carries
//! parameters and an output node; percussion, synth, and effect behaviour is
//! reached through the capability probes. Callers either probe before
//! dispatching or let the host surface a capability-mismatch error.

use ostinato_core::{NodeId, VoiceId};

use crate::params::ParamMap;

/// Opaque handle to a voice started by [`SynthUnit::note_on`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoiceHandle(pub(crate) VoiceId);

/// Contract implemented by every plugin.
///
/// Construction happens through the registry's constructor closure; it must
/// be cheap, allocate the plugin's own nodes from the shared context, and
/// must not touch the master bus (the host performs that wiring).
pub trait AudioPlugin: Send {
    /// Every parameter the plugin accepts, with current values. Stable
    /// across calls for a given instance.
    fn parameters(&self) -> ParamMap;

    /// Install a parameter value, clamped into its declared range. Unknown
    /// names are silently ignored.
    fn set_param(&mut self, name: &str, value: f64);

    /// Current value, or `None` for unknown names.
    fn get_param(&self, name: &str) -> Option<f64>;

    /// The plugin's terminal node; the host connects this to the master bus
    /// or another destination.
    fn output_node(&self) -> NodeId;

    fn as_percussion(&mut self) -> Option<&mut dyn PercussionUnit> {
        None
    }

    fn as_synth(&mut self) -> Option<&mut dyn SynthUnit> {
        None
    }

    fn as_effect(&mut self) -> Option<&mut dyn EffectUnit> {
        None
    }

    /// Fade every live voice out quickly. Default no-op for units without
    /// voices.
    fn all_notes_off(&mut self) {}

    /// Remove the plugin's nodes from the shared graph. Called once by the
    /// host when the instance is deleted.
    fn destroy(&mut self) {}
}

/// One-shot percussion capability.
pub trait PercussionUnit {
    /// Schedule a hit at audio-clock time `time` (seconds; zero or past
    /// times mean "now") with `velocity` in `[0, 1]`. `note` optionally
    /// overrides the pitch parameter for this hit. Pitch, tone, and decay
    /// follow the parameters as of this call; voices already scheduled are
    /// not revisited.
    fn trigger(&mut self, time: f64, velocity: f64, note: Option<f64>);
}

/// Playable instrument capability.
pub trait SynthUnit {
    /// Schedule a note (MIDI number 0-127) with `velocity` in `[0, 1]`.
    /// `duration` seconds of zero holds the note until
    /// [`note_off`](Self::note_off).
    fn note_on(&mut self, note: u8, velocity: f64, duration: f64) -> VoiceHandle;

    /// Begin the release phase of a voice. Idempotent; unknown or finished
    /// handles are ignored.
    fn note_off(&mut self, voice: VoiceHandle);
}

/// Insert-effect capability.
pub trait EffectUnit {
    /// Wire `source` into the effect and return the node processed audio is
    /// available at. The effect owns all intermediate routing. Call at most
    /// once per source; repeat calls re-route.
    fn process(&mut self, source: NodeId) -> NodeId;
}
