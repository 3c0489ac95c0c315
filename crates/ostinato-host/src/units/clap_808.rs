//! 808-style hand clap.

use std::sync::Arc;

use ostinato_core::dsp::{bandpass_hz, highpass_hz, lfo, noise, pan};
use ostinato_core::{
    AudioContext, AudioUnit, NodeId, SchedulerHandle, VoiceLife, VoiceScheduler,
};

use super::support::LN_KILO;
use crate::abi::{AudioPlugin, PercussionUnit};
use crate::error::Result;
use crate::params::{ParamMap, ParamSpec, Params};

/// Number of short pre-bursts before the ringing tail.
const PRE_BURSTS: u32 = 3;

/// Hand clap built from band-passed noise shaped by a multi-burst envelope:
/// three tight pre-hits a few milliseconds apart, then an exponential tail.
pub struct Clap808Plugin {
    context: Arc<AudioContext>,
    params: Params,
    voices: SchedulerHandle,
    node: NodeId,
}

impl Clap808Plugin {
    pub const ID: &'static str = "clap-808";

    pub fn new(context: &Arc<AudioContext>) -> Result<Self> {
        let (voices, scheduler) = VoiceScheduler::new(context.clock().clone());
        let node = context.graph(|g| g.add(Box::new(scheduler)));

        let params = Params::new()
            .with("decay", ParamSpec::new(0.35, 0.05, 1.5).unit("s").label("Decay"))
            .with("spread", ParamSpec::new(0.01, 0.002, 0.03).unit("s").label("Spread"))
            .with("tone", ParamSpec::new(1200.0, 400.0, 4000.0).unit("Hz").label("Tone"));

        Ok(Self {
            context: context.clone(),
            params,
            voices,
            node,
        })
    }

    fn build_voice(&self, velocity: f64) -> (Box<dyn AudioUnit>, f64) {
        let decay = self.params.get_or("decay", 0.35) as f32;
        let spread = self.params.get_or("spread", 0.01) as f32;
        let tone = self.params.get_or("tone", 1200.0) as f32;
        let vel = velocity.clamp(0.0, 1.0) as f32;

        let tail_tau = decay / LN_KILO;
        let tail_start = PRE_BURSTS as f32 * spread;

        let clap_env = move |t: f32| {
            let mut level = 0.0f32;
            for burst in 0..PRE_BURSTS {
                let dt = t - burst as f32 * spread;
                if dt >= 0.0 {
                    level += (-dt / 0.008).exp();
                }
            }
            let dt = t - tail_start;
            if dt >= 0.0 {
                level += 1.2 * (-dt / tail_tau).exp();
            }
            0.4 * vel * level
        };

        let hit = (noise() >> bandpass_hz::<f32>(tone, 1.4) >> highpass_hz::<f32>(300.0, 0.7))
            * lfo(clap_env)
            >> pan(0.0);

        (Box::new(hit), (tail_start + decay) as f64 + 0.02)
    }
}

impl AudioPlugin for Clap808Plugin {
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

impl PercussionUnit for Clap808Plugin {
    fn trigger(&mut self, time: f64, velocity: f64, _note: Option<f64>) {
        let (hit, total) = self.build_voice(velocity);
        self.voices.start(time, hit, VoiceLife::Finite(total));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms(samples: &[f32]) -> f32 {
        let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
        (sum_sq / samples.len().max(1) as f32).sqrt()
    }

    #[test]
    fn test_default_parameters() {
        let ctx = Arc::new(AudioContext::builder().offline(48_000.0).build().unwrap());
        let clap = Clap808Plugin::new(&ctx).unwrap();
        let params = clap.parameters();
        assert_eq!(params["tone"].unit, "Hz");
        assert!(params["spread"].default >= params["spread"].min);
    }

    #[test]
    fn test_trigger_is_audible() {
        let ctx = Arc::new(AudioContext::builder().offline(48_000.0).build().unwrap());
        let mut clap = Clap808Plugin::new(&ctx).unwrap();

        ctx.bus(|bus, g| {
            bus.attach(g, clap.output_node());
        });
        clap.trigger(0.0, 1.0, None);

        let (left, right) = ctx.render(4800).unwrap();
        assert!(rms(&left) > 0.005);
        assert!(rms(&right) > 0.005);
    }

    #[test]
    fn test_velocity_scales_energy() {
        let ctx = Arc::new(AudioContext::builder().offline(48_000.0).build().unwrap());
        let mut clap = Clap808Plugin::new(&ctx).unwrap();
        ctx.bus(|bus, g| {
            bus.attach(g, clap.output_node());
        });

        clap.trigger(0.0, 1.0, None);
        let (loud, _) = ctx.render(4800).unwrap();
        // Let the first hit fully die out.
        let _ = ctx.render_secs(1.0).unwrap();

        clap.trigger(ctx.current_time(), 0.2, None);
        let (soft, _) = ctx.render(4800).unwrap();

        assert!(rms(&loud) > rms(&soft) * 2.0);
    }
}
