//! Plugin ABI, registry, and host for the ostinato runtime.
//!
//! The host owns the audio context and the live set of plugin instances,
//! bridges to the [`PluginRegistry`], and exposes the full control surface:
//! create/destroy, trigger, note on/off, parameters, routing, state
//! export/import, master volume, and context resume.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ostinato_core::AudioContext;
//! use ostinato_host::{PluginHost, PluginRegistry};
//!
//! let ctx = Arc::new(AudioContext::builder().build()?);
//! let host = PluginHost::new(ctx, Arc::new(PluginRegistry::default()));
//!
//! host.resume()?;
//! host.create_plugin("log-drum", Some("ld-1"))?;
//! host.connect_plugin("ld-1", None)?;
//! host.trigger_plugin("ld-1", 0.0, 1.0, None)?;
//! ```

pub mod error;
pub use error::{HostError, Result};

mod params;
pub use params::{ParamMap, ParamSpec, Params};

mod metadata;
pub use metadata::{Category, PluginKind, PluginMetadata};

mod abi;
pub use abi::{AudioPlugin, EffectUnit, PercussionUnit, SynthUnit, VoiceHandle};

mod declare;
pub use declare::{
    derived_class_name, PluginDeclaration, PluginRegistrar, ABI_VERSION, DECLARATION_SYMBOL,
};

mod registry;
pub use registry::{PluginClass, PluginConstructor, PluginRegistry};

mod state;
pub use state::PluginState;

mod host;
pub use host::{PluginHost, PluginInstance};

pub mod units;
pub use units::{AmapianoBassPlugin, Clap808Plugin, LogDrumPlugin, ShimmerReverbPlugin};
