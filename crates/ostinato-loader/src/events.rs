//! Structured loader event stream.

/// Events emitted by the loader as it mutates the registry. Delivered to
/// every [`subscribe`](crate::PluginLoader::subscribe)d receiver; the outer
/// application decides what (if anything) to surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoaderEvent {
    Loaded { id: String },
    Reloaded { id: String },
    Unloaded { id: String },
    LoadFailed { id: String, reason: String },
    CatalogUnavailable { reason: String },
}
