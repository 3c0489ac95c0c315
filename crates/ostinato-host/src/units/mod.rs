//! Built-in DSP units.
//!
//! The stock amapiano kit: log drum and clap one-shots, a playable bass, and
//! a shimmer reverb insert. Registered by `PluginRegistry::default()`.

mod amapiano_bass;
mod clap_808;
mod log_drum;
mod shimmer_reverb;
mod support;

pub use amapiano_bass::AmapianoBassPlugin;
pub use clap_808::Clap808Plugin;
pub use log_drum::LogDrumPlugin;
pub use shimmer_reverb::ShimmerReverbPlugin;

use crate::metadata::{Category, PluginKind, PluginMetadata};
use crate::registry::PluginRegistry;

/// Metadata table for the built-in identifiers. Answers even when the class
/// is not currently registered.
pub(crate) fn builtin_metadata(id: &str) -> Option<PluginMetadata> {
    match id {
        LogDrumPlugin::ID => Some(
            PluginMetadata::new("Log Drum")
                .category(Category::Percussion)
                .kind(PluginKind::Instrument)
                .describe("Pitched log drum with exponential pitch drop and tunable strike")
                .tags(["drum", "amapiano", "one-shot"]),
        ),
        Clap808Plugin::ID => Some(
            PluginMetadata::new("808 Clap")
                .category(Category::Drums)
                .kind(PluginKind::Instrument)
                .describe("Hand clap built from burst-shaped bandpassed noise")
                .tags(["clap", "808", "one-shot"]),
        ),
        ShimmerReverbPlugin::ID => Some(
            PluginMetadata::new("Shimmer Reverb")
                .category(Category::Effects)
                .kind(PluginKind::Effect)
                .describe("Bright-tail reverb with live mix and crossfaded wet-chain edits")
                .tags(["reverb", "shimmer", "space"]),
        ),
        AmapianoBassPlugin::ID => Some(
            PluginMetadata::new("Amapiano Bass")
                .category(Category::Synths)
                .kind(PluginKind::Instrument)
                .describe("Rolling sub-heavy bass with filter pluck and drive")
                .tags(["bass", "amapiano", "synth"]),
        ),
        _ => None,
    }
}

/// Register the built-in units.
pub(crate) fn register_builtin_plugins(registry: &PluginRegistry) {
    registry.register(
        LogDrumPlugin::ID,
        builtin_metadata(LogDrumPlugin::ID).expect("builtin metadata"),
        |ctx| Ok(Box::new(LogDrumPlugin::new(ctx)?)),
    );

    registry.register(
        Clap808Plugin::ID,
        builtin_metadata(Clap808Plugin::ID).expect("builtin metadata"),
        |ctx| Ok(Box::new(Clap808Plugin::new(ctx)?)),
    );

    registry.register(
        ShimmerReverbPlugin::ID,
        builtin_metadata(ShimmerReverbPlugin::ID).expect("builtin metadata"),
        |ctx| Ok(Box::new(ShimmerReverbPlugin::new(ctx)?)),
    );

    registry.register(
        AmapianoBassPlugin::ID,
        builtin_metadata(AmapianoBassPlugin::ID).expect("builtin metadata"),
        |ctx| Ok(Box::new(AmapianoBassPlugin::new(ctx)?)),
    );
}
