//! HTTP client for the plugin catalog service.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LoaderError, Result};

/// One installable plugin as described by the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub filename: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Version or mtime tag. Advisory; content changes are not auto-reloaded.
    #[serde(default)]
    pub version: Option<String>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Deserialize)]
struct CatalogResponse {
    plugins: Vec<CatalogEntry>,
}

/// Blocking catalog client with a bounded request timeout.
pub struct CatalogClient {
    agent: ureq::Agent,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { agent, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/plugins/list`. Any non-2xx or transport failure is
    /// *catalog-unavailable*.
    pub fn list(&self) -> Result<Vec<CatalogEntry>> {
        let url = format!("{}/api/plugins/list", self.base_url);
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| LoaderError::CatalogUnavailable(err.to_string()))?;
        let body: CatalogResponse = response
            .into_json()
            .map_err(|err| LoaderError::CatalogUnavailable(format!("bad catalog body: {err}")))?;
        Ok(body.plugins)
    }

    /// `GET /plugins/<filename>?t=<serial>` into `dest`. The serial defeats
    /// intermediary caches so a reload always sees fresh bytes.
    pub fn fetch_artifact(&self, filename: &str, serial: u64, dest: &Path) -> Result<()> {
        let url = format!("{}/plugins/{}?t={}", self.base_url, filename, serial);
        let response = self.agent.get(&url).call().map_err(|err| {
            LoaderError::ArtifactFetchFailed {
                filename: filename.to_string(),
                reason: err.to_string(),
            }
        })?;

        let mut reader = response.into_reader();
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut reader, &mut file)?;
        Ok(())
    }
}
