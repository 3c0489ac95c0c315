//! # Ostinato - live plugin host for groove instruments
//!
//! Umbrella crate wiring together the runtime subsystems:
//! - **ostinato-core** - audio context (FunDSP graph, sample clock, master
//!   bus, CPAL output, offline rendering)
//! - **ostinato-host** - plugin ABI, registry, host operations, and the
//!   built-in amapiano kit (log drum, 808 clap, shimmer reverb, bass)
//! - **ostinato-loader** - catalog-driven hot reload of plugin artifacts
//!
//! ## Quick start
//!
//! ```ignore
//! use ostinato::prelude::*;
//!
//! let engine = OstinatoEngine::builder().build()?;
//! let host = engine.host();
//!
//! host.resume()?;
//! host.create_plugin("log-drum", Some("ld-1"))?;
//! host.connect_plugin("ld-1", None)?;
//! host.trigger_plugin("ld-1", 0.0, 1.0, None)?;
//! ```
//!
//! ## Hot reload
//!
//! Configure a catalog URL on the builder and the engine carries a
//! [`PluginLoader`] that installs, upgrades, and revokes plugin classes at
//! runtime without stopping audio:
//!
//! ```ignore
//! let engine = OstinatoEngine::builder()
//!     .catalog_url("http://localhost:9000")
//!     .build()?;
//! engine.loader().unwrap().load_all()?;
//! ```

/// Re-export of ostinato-core for direct access.
pub use ostinato_core as core;

pub use ostinato_core::{
    AudioClock, AudioContext, AudioContextBuilder, AudioGraph, AudioUnit, MasterBus, NodeId,
    SchedulerHandle, Shared, SlotMixer, VoiceId, VoiceLife, VoiceScheduler,
};

/// Re-export of ostinato-host for direct access.
pub use ostinato_host as host;

pub use ostinato_host::{
    derived_class_name, AmapianoBassPlugin, AudioPlugin, Category, Clap808Plugin, EffectUnit,
    HostError, LogDrumPlugin, ParamMap, ParamSpec, Params, PercussionUnit, PluginClass,
    PluginConstructor, PluginDeclaration, PluginHost, PluginInstance, PluginKind, PluginMetadata,
    PluginRegistrar, PluginRegistry, PluginState, ShimmerReverbPlugin, SynthUnit, VoiceHandle,
    ABI_VERSION, DECLARATION_SYMBOL,
};

/// Re-export of ostinato-loader for direct access.
pub use ostinato_loader as loader;

pub use ostinato_loader::{CatalogClient, CatalogEntry, LoaderError, LoaderEvent, PluginLoader};

/// FunDSP prelude - oscillators, filters, effects, and graph operators.
pub mod dsp {
    pub use ostinato_core::dsp::*;
}

mod builder;
mod engine;
mod error;

pub use builder::OstinatoEngineBuilder;
pub use engine::OstinatoEngine;
pub use error::{Error, Result};

/// Convenience prelude for common imports.
pub mod prelude {
    pub use crate::{OstinatoEngine, OstinatoEngineBuilder};

    pub use crate::core::{AudioContext, AudioUnit, NodeId};

    pub use crate::host::{
        AudioPlugin, HostError, ParamSpec, PluginHost, PluginMetadata, PluginRegistry,
        PluginState, VoiceHandle,
    };

    pub use crate::loader::{LoaderEvent, PluginLoader};
}
