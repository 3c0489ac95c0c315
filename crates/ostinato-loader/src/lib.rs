//! Hot-reload loader for the ostinato plugin host.
//!
//! Keeps a [`PluginRegistry`](ostinato_host::PluginRegistry) synchronised
//! with an authoritative catalog served over HTTP: fetches plugin source
//! artifacts (cdylibs exporting a
//! [`PluginDeclaration`](ostinato_host::PluginDeclaration)), installs new
//! classes at runtime, upgrades existing ones in place, and removes revoked
//! ones, all without interrupting the audio session. Live instances keep
//! working across unloads because classes and instances pin the backing
//! library.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ostinato_host::PluginRegistry;
//! use ostinato_loader::PluginLoader;
//!
//! let registry = Arc::new(PluginRegistry::default());
//! let loader = Arc::new(PluginLoader::new(
//!     registry,
//!     "http://localhost:9000",
//!     "./artifacts",
//! )?);
//!
//! loader.load_all()?;
//! loader.start_polling(PluginLoader::DEFAULT_POLL_INTERVAL);
//! ```

pub mod error;
pub use error::{LoaderError, Result};

mod catalog;
pub use catalog::{CatalogClient, CatalogEntry};

mod events;
pub use events::LoaderEvent;

mod artifact;

mod loader;
pub use loader::PluginLoader;
