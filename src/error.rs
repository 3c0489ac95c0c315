//! Error type for the umbrella engine.

use thiserror::Error;

/// Any failure from the engine's subsystems.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Context(#[from] ostinato_core::Error),

    #[error(transparent)]
    Host(#[from] ostinato_host::HostError),

    #[error(transparent)]
    Loader(#[from] ostinato_loader::LoaderError),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
