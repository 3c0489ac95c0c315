//! Log drum: the lead percussion voice of the amapiano kit.

use std::sync::Arc;

use ostinato_core::dsp::{bandpass_hz, lfo, lowpass_hz, noise, pan, sine};
use ostinato_core::{
    AudioContext, AudioUnit, NodeId, SchedulerHandle, VoiceLife, VoiceScheduler,
};

use super::support::{midi_to_hz, LN_KILO};
use crate::abi::{AudioPlugin, PercussionUnit};
use crate::error::Result;
use crate::params::{ParamMap, ParamSpec, Params};

/// Pitched log drum. Each hit is a sine body whose pitch drops exponentially
/// onto the fundamental, plus a short band-passed strike transient, through
/// a tone lowpass. Linear attack, exponential decay to the envelope floor.
pub struct LogDrumPlugin {
    context: Arc<AudioContext>,
    params: Params,
    voices: SchedulerHandle,
    node: NodeId,
}

impl LogDrumPlugin {
    pub const ID: &'static str = "log-drum";

    pub fn new(context: &Arc<AudioContext>) -> Result<Self> {
        let (voices, scheduler) = VoiceScheduler::new(context.clock().clone());
        let node = context.graph(|g| g.add(Box::new(scheduler)));

        let params = Params::new()
            .with("pitch", ParamSpec::new(60.0, 24.0, 96.0).unit("MIDI").label("Pitch"))
            .with("decay", ParamSpec::new(0.4, 0.05, 2.0).unit("s").label("Decay"))
            .with("body", ParamSpec::new(0.5, 0.0, 1.0).label("Body"))
            .with("tone", ParamSpec::new(0.6, 0.0, 1.0).label("Tone"));

        Ok(Self {
            context: context.clone(),
            params,
            voices,
            node,
        })
    }

    /// Build one hit from the parameters as of now. Returns the voice and
    /// its total length in seconds.
    fn build_voice(&self, velocity: f64, note: Option<f64>) -> (Box<dyn AudioUnit>, f64) {
        let pitch = note
            .unwrap_or_else(|| self.params.get_or("pitch", 60.0))
            .clamp(0.0, 127.0);
        let decay = self.params.get_or("decay", 0.4) as f32;
        let body = self.params.get_or("body", 0.5) as f32;
        let tone = self.params.get_or("tone", 0.6) as f32;
        let vel = velocity.clamp(0.0, 1.0) as f32;

        let f0 = midi_to_hz(pitch);
        let sweep = f0 * (1.0 + 2.0 * body);
        let pitch_tau = 0.015 + 0.035 * body;
        let attack = 0.002f32;
        let amp_tau = decay / LN_KILO;
        let cutoff = 400.0 + tone * 4200.0;

        let freq_env = move |t: f32| f0 + (sweep - f0) * (-t / pitch_tau).exp();
        let amp_env = move |t: f32| {
            if t < attack {
                vel * (t / attack)
            } else {
                vel * (-(t - attack) / amp_tau).exp()
            }
        };
        let strike_env = move |t: f32| 0.4 * vel * (-t / 0.006).exp();

        let hit = (lfo(freq_env) >> sine::<f32>()) * lfo(amp_env)
            + (noise() >> bandpass_hz::<f32>(2200.0, 1.2)) * lfo(strike_env);
        let hit = hit >> lowpass_hz::<f32>(cutoff, 0.707) >> pan(0.0);

        (Box::new(hit), (attack + decay) as f64 + 0.02)
    }
}

impl AudioPlugin for LogDrumPlugin {
    fn parameters(&self) -> ParamMap {
        self.params.snapshot()
    }

    fn set_param(&mut self, name: &str, value: f64) {
        self.params.set(name, value);
    }

    fn get_param(&self, name: &str) -> Option<f64> {
        self.params.get(name)
    }

    fn output_node(&self) -> NodeId {
        self.node
    }

    fn as_percussion(&mut self) -> Option<&mut dyn PercussionUnit> {
        Some(self)
    }

    fn all_notes_off(&mut self) {
        self.voices.release_all(0.05);
    }

    fn destroy(&mut self) {
        let node = self.node;
        self.context.graph(|g| {
            if g.contains(node) {
                let _ = g.remove(node);
            }
        });
    }
}

impl PercussionUnit for LogDrumPlugin {
    fn trigger(&mut self, time: f64, velocity: f64, note: Option<f64>) {
        let (hit, total) = self.build_voice(velocity, note);
        self.voices.start(time, hit, VoiceLife::Finite(total));
    }
}
