//! Rolling amapiano bass synth.

use std::sync::Arc;

use ostinato_core::dsp::{adsr_live, lfo, moog_q, pan, pass, saw_hz, shape, sine_hz, var, Tanh};
use ostinato_core::{
    shared, AudioContext, AudioUnit, NodeId, SchedulerHandle, VoiceLife, VoiceScheduler,
};

use super::support::{midi_to_hz, warm_up};
use crate::abi::{AudioPlugin, SynthUnit, VoiceHandle};
use crate::error::Result;
use crate::params::{ParamMap, ParamSpec, Params};

/// Sub-heavy bass voice: saw plus half-octave sine through a Moog lowpass
/// with an exponential pluck sweep, ADSR amplitude, and a little drive.
/// Release is gate-driven, so held notes ring until note-off.
pub struct AmapianoBassPlugin {
    context: Arc<AudioContext>,
    params: Params,
    voices: SchedulerHandle,
    node: NodeId,
}

impl AmapianoBassPlugin {
    pub const ID: &'static str = "amapiano-bass";

    pub fn new(context: &Arc<AudioContext>) -> Result<Self> {
        let (voices, scheduler) = VoiceScheduler::new(context.clock().clone());
        let node = context.graph(|g| g.add(Box::new(scheduler)));

        let params = Params::new()
            .with("cutoff", ParamSpec::new(900.0, 100.0, 8000.0).unit("Hz").label("Cutoff"))
            .with("resonance", ParamSpec::new(0.35, 0.0, 0.95).label("Resonance"))
            .with("attack", ParamSpec::new(0.004, 0.001, 0.5).unit("s").label("Attack"))
            .with("decay", ParamSpec::new(0.18, 0.01, 1.0).unit("s").label("Decay"))
            .with("sustain", ParamSpec::new(0.65, 0.0, 1.0).label("Sustain"))
            .with("release", ParamSpec::new(0.25, 0.01, 2.0).unit("s").label("Release"))
            .with("drive", ParamSpec::new(0.25, 0.0, 1.0).label("Drive"))
            .with("sub", ParamSpec::new(0.5, 0.0, 1.0).label("Sub"));

        Ok(Self {
            context: context.clone(),
            params,
            voices,
            node,
        })
    }
}

impl AudioPlugin for AmapianoBassPlugin {
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

    fn as_synth(&mut self) -> Option<&mut dyn SynthUnit> {
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

impl SynthUnit for AmapianoBassPlugin {
    fn note_on(&mut self, note: u8, velocity: f64, duration: f64) -> VoiceHandle {
        let cutoff = self.params.get_or("cutoff", 900.0) as f32;
        let resonance = self.params.get_or("resonance", 0.35) as f32;
        let attack = self.params.get_or("attack", 0.004) as f32;
        let decay = self.params.get_or("decay", 0.18) as f32;
        let sustain = self.params.get_or("sustain", 0.65) as f32;
        let release = self.params.get_or("release", 0.25);
        let drive = self.params.get_or("drive", 0.25) as f32;
        let sub = self.params.get_or("sub", 0.5) as f32;

        let f = midi_to_hz(note.min(127) as f64);
        let vel = velocity.clamp(0.0, 1.0) as f32;

        let gate = shared(0.0);
        let envelope = var(&gate) >> adsr_live(attack, decay, sustain, release as f32);

        let cut_floor = (cutoff * 0.25).max(80.0);
        let cut_env = move |t: f32| cut_floor + (cutoff - cut_floor) * (-t / 0.09).exp();

        let osc = saw_hz(f) * 0.6 + sine_hz::<f32>(f * 0.5) * sub;
        let shaped = ((osc | lfo(cut_env)) >> moog_q::<f32>(resonance) >> (envelope * pass()))
            >> shape(Tanh(1.0 + 2.0 * drive));
        let mut voice: Box<dyn AudioUnit> = Box::new(shaped * (0.8 * vel) >> pan(0.0));

        warm_up(&mut voice, self.context.sample_rate());
        gate.set_value(1.0);

        let hold = (duration > 0.0).then_some(duration);
        let id = self.voices.start(
            0.0,
            voice,
            VoiceLife::Gated {
                gate,
                hold,
                release,
            },
        );
        VoiceHandle(id)
    }

    fn note_off(&mut self, voice: VoiceHandle) {
        self.voices.release(voice.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms(samples: &[f32]) -> f32 {
        let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
        (sum_sq / samples.len().max(1) as f32).sqrt()
    }

    fn bass_on_bus() -> (Arc<AudioContext>, AmapianoBassPlugin) {
        let ctx = Arc::new(AudioContext::builder().offline(48_000.0).build().unwrap());
        let bass = AmapianoBassPlugin::new(&ctx).unwrap();
        ctx.bus(|bus, g| {
            bus.attach(g, bass.output_node());
        });
        (ctx, bass)
    }

    #[test]
    fn test_adsr_defaults_in_range() {
        let (_ctx, bass) = bass_on_bus();
        for (_, spec) in bass.parameters() {
            assert!(spec.min <= spec.default && spec.default <= spec.max);
        }
    }

    #[test]
    fn test_held_note_sustains_until_note_off() {
        let (ctx, mut bass) = bass_on_bus();

        let handle = bass.note_on(36, 1.0, 0.0);
        let (start, _) = ctx.render_secs(0.5).unwrap();
        assert!(rms(&start[12_000..]) > 0.01, "held note should sustain");

        bass.note_off(handle);
        let _ = ctx.render_secs(1.0).unwrap();
        let (tail, _) = ctx.render_secs(0.2).unwrap();
        assert!(rms(&tail) < 1e-3, "released note should die out");
    }

    #[test]
    fn test_note_off_is_idempotent() {
        let (ctx, mut bass) = bass_on_bus();
        let handle = bass.note_on(40, 0.8, 0.0);
        bass.note_off(handle);
        bass.note_off(handle);
        let _ = ctx.render_secs(0.1).unwrap();
    }

    #[test]
    fn test_finite_duration_releases_itself() {
        let (ctx, mut bass) = bass_on_bus();
        let _ = bass.note_on(36, 1.0, 0.25);

        let _ = ctx.render_secs(1.6).unwrap();
        let (tail, _) = ctx.render_secs(0.2).unwrap();
        assert!(rms(&tail) < 1e-3);
    }
}
