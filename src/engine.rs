//! OstinatoEngine: the wired-up runtime.

use std::sync::Arc;

use ostinato_core::AudioContext;
use ostinato_host::{PluginHost, PluginRegistry};
use ostinato_loader::PluginLoader;

use crate::Result;

/// The assembled runtime: audio context, registry with the built-in kit,
/// plugin host, and (when a catalog URL is configured) the hot-reload
/// loader.
///
/// # Example
///
/// ```ignore
/// use ostinato::prelude::*;
///
/// let engine = OstinatoEngine::builder()
///     .catalog_url("http://localhost:9000")
///     .build()?;
///
/// engine.resume()?;
/// engine.host().create_plugin("amapiano-bass", Some("bass-1"))?;
/// engine.host().connect_plugin("bass-1", None)?;
/// let voice = engine.host().note_on("bass-1", 36, 1.0, 0.0)?;
/// ```
pub struct OstinatoEngine {
    context: Arc<AudioContext>,
    registry: Arc<PluginRegistry>,
    host: PluginHost,
    loader: Option<Arc<PluginLoader>>,
}

impl OstinatoEngine {
    pub fn builder() -> crate::OstinatoEngineBuilder {
        crate::OstinatoEngineBuilder::default()
    }

    pub(crate) fn from_parts(
        context: Arc<AudioContext>,
        registry: Arc<PluginRegistry>,
        host: PluginHost,
        loader: Option<Arc<PluginLoader>>,
    ) -> Self {
        Self {
            context,
            registry,
            host,
            loader,
        }
    }

    /// The shared audio context.
    pub fn context(&self) -> &Arc<AudioContext> {
        &self.context
    }

    /// The plugin class registry.
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// The plugin host; the whole control surface lives here.
    pub fn host(&self) -> &PluginHost {
        &self.host
    }

    /// The hot-reload loader, present when a catalog URL was configured.
    pub fn loader(&self) -> Option<&Arc<PluginLoader>> {
        self.loader.as_ref()
    }

    /// Ensure audio is running. Idempotent.
    pub fn resume(&self) -> Result<()> {
        self.host.resume()?;
        Ok(())
    }

    pub fn sample_rate(&self) -> f64 {
        self.context.sample_rate()
    }
}

impl Drop for OstinatoEngine {
    fn drop(&mut self) {
        if let Some(loader) = &self.loader {
            loader.stop_polling();
        }
    }
}
