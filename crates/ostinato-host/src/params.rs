//! Parameter model shared by every plugin.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Snapshot of a plugin's parameters, name to spec.
pub type ParamMap = BTreeMap<String, ParamSpec>;

/// A named scalar controlling a plugin.
///
/// `value` always sits inside `[min, max]`; writes are clamped. `unit` and
/// `label` are advisory display strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub label: String,
}

impl ParamSpec {
    pub fn new(default: f64, min: f64, max: f64) -> Self {
        Self {
            value: default,
            min,
            max,
            default,
            unit: String::new(),
            label: String::new(),
        }
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Parameter store owned by a plugin instance.
#[derive(Clone, Debug, Default)]
pub struct Params {
    specs: ParamMap,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.specs.insert(name.into(), spec);
        self
    }

    /// Install a value, clamped into the parameter's range. Unknown names
    /// are ignored so older state can load against newer plugins. Returns
    /// whether the name was known.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.specs.get_mut(name) {
            Some(spec) => {
                let clamped = value.clamp(spec.min, spec.max);
                if clamped != value {
                    tracing::debug!(param = name, value, clamped, "parameter clamped");
                }
                spec.value = clamped;
                true
            }
            None => {
                tracing::debug!(param = name, "ignoring unknown parameter");
                false
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.specs.get(name).map(|spec| spec.value)
    }

    /// Current value with a fallback for required reads inside voice builds.
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    pub fn snapshot(&self) -> ParamMap {
        self.specs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Params {
        Params::new()
            .with("pitch", ParamSpec::new(60.0, 24.0, 96.0).unit("MIDI").label("Pitch"))
            .with("decay", ParamSpec::new(0.4, 0.05, 2.0).unit("s"))
    }

    #[test]
    fn test_defaults_in_range() {
        for (_, spec) in params().snapshot() {
            assert!(spec.min <= spec.default && spec.default <= spec.max);
            assert_eq!(spec.value, spec.default);
        }
    }

    #[test]
    fn test_set_clamps() {
        let mut p = params();
        assert!(p.set("pitch", 48.0));
        assert_eq!(p.get("pitch"), Some(48.0));

        p.set("pitch", 400.0);
        assert_eq!(p.get("pitch"), Some(96.0));

        p.set("pitch", -5.0);
        assert_eq!(p.get("pitch"), Some(24.0));
    }

    #[test]
    fn test_unknown_names_ignored() {
        let mut p = params();
        assert!(!p.set("wobble", 1.0));
        assert_eq!(p.get("wobble"), None);
        // Nothing else changed.
        assert_eq!(p.get("pitch"), Some(60.0));
    }

    #[test]
    fn test_spec_serde_roundtrip() {
        let spec = ParamSpec::new(60.0, 24.0, 96.0).unit("MIDI").label("Pitch");
        let json = serde_json::to_string(&spec).unwrap();
        let decoded: ParamSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, decoded);
    }
}
