//! Builder for [`OstinatoEngine`].

use std::path::PathBuf;
use std::sync::Arc;

use ostinato_core::AudioContext;
use ostinato_host::{PluginHost, PluginRegistry};
use ostinato_loader::PluginLoader;

use crate::{OstinatoEngine, Result};

/// Configures and assembles an [`OstinatoEngine`].
#[derive(Default)]
pub struct OstinatoEngineBuilder {
    offline_sample_rate: Option<f64>,
    device_index: Option<usize>,
    catalog_url: Option<String>,
    artifacts_dir: Option<PathBuf>,
}

impl OstinatoEngineBuilder {
    /// Offline engine at the given sample rate; no audio device is opened.
    /// Drive it through `engine.context().render(..)`.
    pub fn offline(mut self, sample_rate: f64) -> Self {
        self.offline_sample_rate = Some(sample_rate);
        self
    }

    /// Select an output device by index (live mode).
    pub fn output_device(mut self, index: usize) -> Self {
        self.device_index = Some(index);
        self
    }

    /// Enable the hot-reload loader against a plugin catalog service.
    pub fn catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = Some(url.into());
        self
    }

    /// Where fetched plugin artifacts are cached. Defaults to
    /// `ostinato-plugins` under the system temp directory.
    pub fn artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<OstinatoEngine> {
        let mut context_builder = AudioContext::builder();
        if let Some(rate) = self.offline_sample_rate {
            context_builder = context_builder.offline(rate);
        }
        if let Some(index) = self.device_index {
            context_builder = context_builder.output_device(index);
        }
        let context = Arc::new(context_builder.build()?);

        let registry = Arc::new(PluginRegistry::default());
        let host = PluginHost::new(context.clone(), registry.clone());

        let loader = match self.catalog_url {
            Some(url) => {
                let artifacts_dir = self
                    .artifacts_dir
                    .unwrap_or_else(|| std::env::temp_dir().join("ostinato-plugins"));
                Some(Arc::new(PluginLoader::new(
                    registry.clone(),
                    url,
                    artifacts_dir,
                )?))
            }
            None => None,
        };

        Ok(OstinatoEngine::from_parts(context, registry, host, loader))
    }
}
