//! Real-time audio context runtime for the ostinato plugin host.
//!
//! # Primary API
//!
//! - [`AudioContext`] / [`AudioContextBuilder`]: owns the DSP graph, the
//!   sample clock, and the output stream (or an offline render loop)
//! - [`AudioGraph`]: graph manipulation inside [`AudioContext::graph`]
//! - [`MasterBus`]: terminal mix stage with clamped master volume
//! - [`VoiceScheduler`] / [`SchedulerHandle`]: sample-accurate voice
//!   scheduling against the audio clock
//!
//! # Example
//!
//! ```ignore
//! use ostinato_core::AudioContext;
//!
//! let ctx = AudioContext::builder().offline(48_000.0).build()?;
//! ctx.graph(|g| {
//!     let osc = g.add(Box::new(ostinato_core::dsp::sine_hz(440.0f32)));
//!     osc
//! });
//! ```

pub mod error;
pub use error::{Error, Result};

mod clock;
pub use clock::AudioClock;

mod graph;
pub use graph::AudioGraph;

mod mixer;
pub use mixer::SlotMixer;

mod master;
pub use master::MasterBus;

mod scheduler;
pub use scheduler::{SchedulerHandle, VoiceLife, VoiceScheduler, VoiceId};

mod context;
pub use context::{AudioContext, AudioContextBuilder};

pub(crate) mod output;

/// Re-export of the FunDSP prelude for DSP building blocks.
pub mod dsp {
    pub use fundsp::prelude::*;
}

pub use fundsp::net::NodeId;
pub use fundsp::prelude::{shared, AudioUnit, BufferMut, BufferRef, Shared};
pub use fundsp::sequencer::Fade;
pub use fundsp::signal::SignalFrame;
