//! The audio context: graph, clock, master bus, and output.

use std::sync::Arc;

use fundsp::audiounit::AudioUnit;
use fundsp::net::NodeId;
use fundsp::realnet::NetBackend;
use parking_lot::Mutex;

use crate::clock::AudioClock;
use crate::graph::AudioGraph;
use crate::master::MasterBus;
use crate::output::{CallbackState, OutputEngine};
use crate::{Error, Result};

enum ContextMode {
    /// Rendered by calling [`AudioContext::render`]; no device is opened.
    Offline { backend: Option<NetBackend> },
    /// Rendered by a CPAL stream, started lazily by [`AudioContext::resume`].
    Live {
        engine: OutputEngine,
        pending: Option<NetBackend>,
    },
}

/// Owns the realtime graph all plugins allocate their nodes in, the sample
/// clock scheduling runs against, and the master bus.
///
/// Stereo out. In live mode the output stream starts suspended; call
/// [`resume`](Self::resume) after the first user gesture (or at startup for
/// native front-ends). Anything scheduled while suspended is queued and
/// begins sounding on resume.
pub struct AudioContext {
    graph: Mutex<AudioGraph>,
    master: Mutex<MasterBus>,
    master_output: NodeId,
    clock: Arc<AudioClock>,
    mode: Mutex<ContextMode>,
    sample_rate: f64,
}

impl AudioContext {
    pub fn builder() -> AudioContextBuilder {
        AudioContextBuilder::default()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Current audio-clock time in seconds.
    pub fn current_time(&self) -> f64 {
        self.clock.now()
    }

    pub fn clock(&self) -> &Arc<AudioClock> {
        &self.clock
    }

    /// Ensure audio is running. Idempotent; a no-op for offline contexts.
    pub fn resume(&self) -> Result<()> {
        let mut mode = self.mode.lock();
        match &mut *mode {
            ContextMode::Offline { .. } => Ok(()),
            ContextMode::Live { engine, pending } => {
                if let Some(backend) = pending.take() {
                    engine.start(CallbackState {
                        backend,
                        clock: self.clock.clone(),
                    })?;
                }
                Ok(())
            }
        }
    }

    pub fn is_running(&self) -> bool {
        match &*self.mode.lock() {
            ContextMode::Offline { .. } => true,
            ContextMode::Live { engine, .. } => engine.is_running(),
        }
    }

    /// List available output devices.
    pub fn list_output_devices() -> Result<Vec<String>> {
        OutputEngine::list_devices()
    }

    /// Modify the DSP graph. Changes are committed to the audio thread when
    /// the closure returns.
    pub fn graph<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut AudioGraph) -> R,
    {
        let mut graph = self.graph.lock();
        let result = f(&mut graph);
        graph.commit();
        result
    }

    /// Operate on the master bus together with the graph (attach/detach).
    pub fn bus<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut MasterBus, &mut AudioGraph) -> R,
    {
        let mut graph = self.graph.lock();
        let mut master = self.master.lock();
        let result = f(&mut master, &mut graph);
        graph.commit();
        result
    }

    /// The terminal node before the hardware output.
    pub fn master_output(&self) -> NodeId {
        self.master_output
    }

    /// Master volume, clamped to `[0, 1]` on set.
    pub fn set_master_volume(&self, volume: f32) {
        self.master.lock().set_volume(volume);
    }

    pub fn master_volume(&self) -> f32 {
        self.master.lock().volume()
    }

    /// Render `frames` frames offline, advancing the audio clock exactly as
    /// the live callback would. Returns deinterleaved stereo.
    pub fn render(&self, frames: usize) -> Result<(Vec<f32>, Vec<f32>)> {
        let mut mode = self.mode.lock();
        let backend = match &mut *mode {
            ContextMode::Offline { backend } => backend
                .as_mut()
                .ok_or_else(|| Error::InvalidConfig("render backend missing".into()))?,
            ContextMode::Live { .. } => {
                return Err(Error::NotOffline(
                    "render() is only available on offline contexts".into(),
                ))
            }
        };

        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for _ in 0..frames {
            let (l, r) = backend.get_stereo();
            self.clock.advance(1);
            left.push(l);
            right.push(r);
        }
        Ok((left, right))
    }

    /// Render a duration in seconds offline.
    pub fn render_secs(&self, secs: f64) -> Result<(Vec<f32>, Vec<f32>)> {
        self.render((secs.max(0.0) * self.sample_rate) as usize)
    }
}

/// Builder for [`AudioContext`].
#[derive(Default)]
pub struct AudioContextBuilder {
    offline_sample_rate: Option<f64>,
    device_index: Option<usize>,
}

impl AudioContextBuilder {
    /// Build an offline context at the given sample rate. No audio device is
    /// opened; drive it with [`AudioContext::render`]. Used by tests and
    /// bounce-style rendering.
    pub fn offline(mut self, sample_rate: f64) -> Self {
        self.offline_sample_rate = Some(sample_rate);
        self
    }

    /// Select an output device by index (live mode).
    pub fn output_device(mut self, index: usize) -> Self {
        self.device_index = Some(index);
        self
    }

    pub fn build(self) -> Result<AudioContext> {
        let (sample_rate, engine) = match self.offline_sample_rate {
            Some(rate) => {
                if rate <= 0.0 || !rate.is_finite() {
                    return Err(Error::InvalidConfig(format!(
                        "invalid sample rate: {rate}"
                    )));
                }
                (rate, None)
            }
            None => {
                let engine = OutputEngine::new(self.device_index)?;
                (engine.sample_rate(), Some(engine))
            }
        };

        let mut graph = AudioGraph::with_io(0, 2, sample_rate);
        let backend = graph.backend();
        let master = MasterBus::build(&mut graph);
        let master_output = master.output_node();
        graph.commit();

        let mode = match engine {
            Some(engine) => ContextMode::Live {
                engine,
                pending: Some(backend),
            },
            None => ContextMode::Offline {
                backend: Some(backend),
            },
        };

        Ok(AudioContext {
            graph: Mutex::new(graph),
            master: Mutex::new(master),
            master_output,
            clock: Arc::new(AudioClock::new(sample_rate)),
            mode: Mutex::new(mode),
            sample_rate,
        })
    }
}
