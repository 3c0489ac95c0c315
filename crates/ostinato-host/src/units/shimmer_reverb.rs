//! Shimmer reverb insert effect.

use std::sync::Arc;

use ostinato_core::dsp::{highpass_hz, pass, reverb_stereo, var};
use ostinato_core::{shared, AudioContext, AudioUnit, NodeId, Shared};

use crate::abi::{AudioPlugin, EffectUnit};
use crate::error::Result;
use crate::params::{ParamMap, ParamSpec, Params};

/// Crossfade time when the wet chain is rebuilt after a parameter edit.
const WET_CROSSFADE: f32 = 0.02;

/// Bright-tail reverb. The dry path and a high-passed stereo reverb meet at
/// a mix node; `mix` moves live through shared levels, while `size`, `decay`,
/// and `shimmer` swap the wet chain in place under a short crossfade.
pub struct ShimmerReverbPlugin {
    context: Arc<AudioContext>,
    params: Params,
    input_node: NodeId,
    wet_node: NodeId,
    mix_node: NodeId,
    dry_level: Shared,
    wet_level: Shared,
}

fn wet_chain(size: f64, decay: f64, shimmer: f64) -> Box<dyn AudioUnit> {
    let room = 10.0 + 40.0 * size;
    let damping = (0.9 - 0.75 * shimmer).clamp(0.05, 0.95);
    let lowcut = (120.0 + 1800.0 * shimmer) as f32;

    Box::new(
        (highpass_hz::<f32>(lowcut, 0.7) | highpass_hz::<f32>(lowcut, 0.7))
            >> reverb_stereo(room, decay.max(0.1), damping),
    )
}

impl ShimmerReverbPlugin {
    pub const ID: &'static str = "shimmer-reverb";

    pub fn new(context: &Arc<AudioContext>) -> Result<Self> {
        let params = Params::new()
            .with("mix", ParamSpec::new(0.35, 0.0, 1.0).label("Mix"))
            .with("size", ParamSpec::new(0.6, 0.2, 1.0).label("Size"))
            .with("decay", ParamSpec::new(4.0, 0.5, 12.0).unit("s").label("Decay"))
            .with("shimmer", ParamSpec::new(0.5, 0.0, 1.0).label("Shimmer"));

        let mix = params.get_or("mix", 0.35) as f32;
        let dry_level = shared(1.0 - mix);
        let wet_level = shared(mix);

        let (input_node, wet_node, mix_node) = context.graph(|g| {
            let input = g.add(Box::new(pass() | pass()));
            let wet = g.add(wet_chain(0.6, 4.0, 0.5));
            let mix = g.add(Box::new(
                ((pass() | pass()) * (var(&dry_level) | var(&dry_level)))
                    + ((pass() | pass()) * (var(&wet_level) | var(&wet_level))),
            ));

            g.connect_stereo(input, wet, 0);
            // Dry into mix ports 0/1, wet into 2/3.
            g.connect_stereo(input, mix, 0);
            g.connect_stereo(wet, mix, 2);

            (input, wet, mix)
        });

        Ok(Self {
            context: context.clone(),
            params,
            input_node,
            wet_node,
            mix_node,
            dry_level,
            wet_level,
        })
    }

    fn rebuild_wet(&self) {
        let size = self.params.get_or("size", 0.6);
        let decay = self.params.get_or("decay", 4.0);
        let shimmer = self.params.get_or("shimmer", 0.5);
        let wet = self.wet_node;
        self.context
            .graph(|g| g.crossfade(wet, WET_CROSSFADE, wet_chain(size, decay, shimmer)));
    }
}

impl AudioPlugin for ShimmerReverbPlugin {
    fn parameters(&self) -> ParamMap {
        self.params.snapshot()
    }

    fn set_param(&mut self, name: &str, value: f64) {
        if !self.params.set(name, value) {
            return;
        }
        match name {
            "mix" => {
                let mix = self.params.get_or("mix", 0.35) as f32;
                self.dry_level.set_value(1.0 - mix);
                self.wet_level.set_value(mix);
            }
            "size" | "decay" | "shimmer" => self.rebuild_wet(),
            _ => {}
        }
    }

    fn get_param(&self, name: &str) -> Option<f64> {
        self.params.get(name)
    }

    fn output_node(&self) -> NodeId {
        self.mix_node
    }

    fn as_effect(&mut self) -> Option<&mut dyn EffectUnit> {
        Some(self)
    }

    fn destroy(&mut self) {
        let nodes = [self.mix_node, self.wet_node, self.input_node];
        self.context.graph(|g| {
            for node in nodes {
                if g.contains(node) {
                    let _ = g.remove(node);
                }
            }
        });
    }
}

impl EffectUnit for ShimmerReverbPlugin {
    fn process(&mut self, source: NodeId) -> NodeId {
        let input = self.input_node;
        self.context.graph(|g| g.connect_stereo(source, input, 0));
        self.mix_node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ostinato_core::dsp::{dc, sine_hz};

    fn rms(samples: &[f32]) -> f32 {
        let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
        (sum_sq / samples.len().max(1) as f32).sqrt()
    }

    fn test_context() -> Arc<AudioContext> {
        Arc::new(AudioContext::builder().offline(48_000.0).build().unwrap())
    }

    #[test]
    fn test_process_returns_mix_node() {
        let ctx = test_context();
        let mut reverb = ShimmerReverbPlugin::new(&ctx).unwrap();

        let source = ctx.graph(|g| g.add(Box::new(dc((0.2f32, 0.2f32)))));
        let out = reverb.process(source);
        assert_eq!(out, reverb.output_node());
    }

    #[test]
    fn test_dry_passthrough_with_mix_zero() {
        let ctx = test_context();
        let mut reverb = ShimmerReverbPlugin::new(&ctx).unwrap();
        reverb.set_param("mix", 0.0);

        let source = ctx
            .graph(|g| g.add(Box::new(sine_hz::<f32>(330.0) * 0.4 >> ostinato_core::dsp::pan(0.0))));
        let out = reverb.process(source);
        ctx.bus(|bus, g| {
            bus.attach(g, out);
        });

        let (left, _) = ctx.render_secs(0.2).unwrap();
        assert!(rms(&left) > 0.1, "dry path should pass the source through");
    }

    #[test]
    fn test_wet_tail_rings_after_source_stops() {
        let ctx = test_context();
        let mut reverb = ShimmerReverbPlugin::new(&ctx).unwrap();
        reverb.set_param("mix", 1.0);

        // A short burst through the wet path should ring past the burst.
        let source = ctx.graph(|g| {
            g.add(Box::new(
                sine_hz::<f32>(440.0)
                    * ostinato_core::dsp::lfo(|t: f32| if t < 0.05 { 0.8 } else { 0.0 })
                    >> ostinato_core::dsp::pan(0.0),
            ))
        });
        let out = reverb.process(source);
        ctx.bus(|bus, g| {
            bus.attach(g, out);
        });

        let _ = ctx.render_secs(0.1).unwrap();
        let (tail, _) = ctx.render_secs(0.3).unwrap();
        assert!(rms(&tail) > 1e-4, "reverb tail should ring out");
    }

    #[test]
    fn test_unknown_param_is_ignored() {
        let ctx = test_context();
        let mut reverb = ShimmerReverbPlugin::new(&ctx).unwrap();
        reverb.set_param("feedback", 0.9);
        assert_eq!(reverb.get_param("feedback"), None);
    }
}
