//! Error types for host operations.

use thiserror::Error;

/// Errors surfaced synchronously to callers of the plugin host.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Unknown instance: {0}")]
    UnknownInstance(String),

    #[error("Instance id already in use: {0}")]
    DuplicateInstance(String),

    #[error("Plugin instance '{instance}' does not support {operation}")]
    CapabilityMismatch {
        instance: String,
        operation: &'static str,
    },

    #[error("Plugin error: {0}")]
    PluginInternal(String),

    #[error(transparent)]
    Context(#[from] ostinato_core::Error),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, HostError>;
