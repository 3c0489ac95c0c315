//! Error types for the hot-reload loader.

use thiserror::Error;

/// Loader failure kinds. Direct calls surface these; the polling loop only
/// logs and reports them through the event stream.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("No catalog entry for plugin '{0}'")]
    UnknownCatalogEntry(String),

    #[error("Failed to fetch artifact '{filename}': {reason}")]
    ArtifactFetchFailed { filename: String, reason: String },

    #[error("Failed to load artifact for '{id}': {reason}")]
    ArtifactLoadFailed { id: String, reason: String },

    #[error("Artifact for '{id}' does not export symbol '{symbol}'")]
    SymbolMissing { id: String, symbol: String },

    #[error("Artifact for '{id}' speaks declaration ABI v{found}, host expects v{expected}")]
    AbiMismatch { id: String, found: u32, expected: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, LoaderError>;
