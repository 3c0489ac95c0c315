//! Persisted plugin instance state.

use serde::{Deserialize, Serialize};

use crate::params::ParamMap;

/// Serialisable snapshot of a plugin instance.
///
/// Round-tripping through [`PluginHost::import_state`] reproduces every
/// named parameter's `value`; the remaining spec fields are advisory and are
/// rebuilt from the class on import.
///
/// [`PluginHost::import_state`]: crate::PluginHost::import_state
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PluginState {
    /// Instance id.
    pub id: String,

    /// Id of the class that produced the instance.
    #[serde(rename = "pluginId")]
    pub plugin_id: String,

    /// Full parameter map as of export.
    pub parameters: ParamMap,

    /// Audio-clock time the instance was created at, in seconds. Advisory.
    pub created_at: f64,
}
