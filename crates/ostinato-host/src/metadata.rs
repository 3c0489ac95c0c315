//! Plugin metadata.

use serde::{Deserialize, Serialize};

/// Browsing category of a plugin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Drums,
    Synths,
    Effects,
    Percussion,
    #[default]
    Unknown,
}

/// Capability tag of a plugin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Instrument,
    Effect,
    #[default]
    Unknown,
}

/// Descriptive metadata attached to a plugin class.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Human-readable name.
    pub name: String,

    /// Browsing category.
    pub category: Category,

    /// One-line description.
    pub description: String,

    /// Capability tag.
    pub kind: PluginKind,

    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PluginMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn kind(mut self, kind: PluginKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Synthesised metadata for an identifier nothing is known about, so
    /// lookups never fail.
    pub fn stub(id: &str) -> Self {
        Self {
            name: id.to_string(),
            category: Category::Unknown,
            description: "No description available".to_string(),
            kind: PluginKind::Unknown,
            tags: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let meta = PluginMetadata::new("Log Drum")
            .category(Category::Percussion)
            .kind(PluginKind::Instrument)
            .describe("Pitched log drum")
            .tags(["drum", "amapiano"]);

        assert_eq!(meta.name, "Log Drum");
        assert_eq!(meta.category, Category::Percussion);
        assert_eq!(meta.kind, PluginKind::Instrument);
        assert_eq!(meta.tags.len(), 2);
    }

    #[test]
    fn test_stub_shape() {
        let meta = PluginMetadata::stub("mystery-plugin");
        assert_eq!(meta.name, "mystery-plugin");
        assert_eq!(meta.category, Category::Unknown);
        assert_eq!(meta.kind, PluginKind::Unknown);
        assert_eq!(meta.description, "No description available");
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn test_serde_roundtrip() {
        let meta = PluginMetadata::new("Shimmer")
            .category(Category::Effects)
            .kind(PluginKind::Effect);

        let json = serde_json::to_string(&meta).unwrap();
        let decoded: PluginMetadata = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.name, "Shimmer");
        assert_eq!(decoded.kind, PluginKind::Effect);
    }
}
