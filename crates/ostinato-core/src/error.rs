//! Error types for ostinato-core.

use thiserror::Error;

/// Error type for audio context operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Failed to enumerate devices")]
    DevicesError(#[from] cpal::DevicesError),

    #[error("Failed to get device name")]
    DeviceNameError(#[from] cpal::DeviceNameError),

    #[error("Context is not offline: {0}")]
    NotOffline(String),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
