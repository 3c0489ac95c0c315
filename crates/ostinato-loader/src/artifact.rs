//! Dynamic artifact installation.

use std::path::Path;
use std::sync::Arc;

use libloading::Library;

use ostinato_host::{
    derived_class_name, PluginClass, PluginConstructor, PluginDeclaration, PluginMetadata,
    PluginRegistrar, PluginRegistry, ABI_VERSION, DECLARATION_SYMBOL,
};

use crate::error::{LoaderError, Result};

/// Registrar handed to an artifact's `register` hook. Every class it
/// registers is pinned to the backing library so the code stays mapped while
/// the class or any instance created from it is alive.
struct LibraryRegistrar<'a> {
    registry: &'a PluginRegistry,
    library: Arc<Library>,
    registered: Vec<String>,
}

impl PluginRegistrar for LibraryRegistrar<'_> {
    fn register_class(
        &mut self,
        id: &str,
        metadata: PluginMetadata,
        constructor: PluginConstructor,
    ) {
        let class = PluginClass {
            constructor,
            metadata,
            artifact: Some(self.library.clone()),
        };
        self.registry.register_class(id, class);
        self.registered.push(id.to_string());
    }
}

/// Open an artifact, validate its declaration, and let it register its class.
/// Returns the library handle the loader keeps for later revocation.
pub(crate) fn install(
    path: &Path,
    entry_id: &str,
    registry: &PluginRegistry,
) -> Result<Arc<Library>> {
    let library = unsafe { Library::new(path) }.map_err(|err| LoaderError::ArtifactLoadFailed {
        id: entry_id.to_string(),
        reason: err.to_string(),
    })?;
    let library = Arc::new(library);

    let declaration: &PluginDeclaration = unsafe {
        let symbol: libloading::Symbol<'_, *const PluginDeclaration> = library
            .get(DECLARATION_SYMBOL.as_bytes())
            .map_err(|_| LoaderError::SymbolMissing {
                id: entry_id.to_string(),
                symbol: DECLARATION_SYMBOL.to_string(),
            })?;
        &**symbol
    };

    if declaration.abi_version != ABI_VERSION {
        return Err(LoaderError::AbiMismatch {
            id: entry_id.to_string(),
            found: declaration.abi_version,
            expected: ABI_VERSION,
        });
    }
    if declaration.id != entry_id {
        return Err(LoaderError::ArtifactLoadFailed {
            id: entry_id.to_string(),
            reason: format!("artifact declares id '{}'", declaration.id),
        });
    }

    let advisory = derived_class_name(entry_id);
    if declaration.class_name != advisory {
        tracing::debug!(
            id = entry_id,
            declared = declaration.class_name,
            derived = %advisory,
            "artifact class name differs from the derived convention"
        );
    }

    let mut registrar = LibraryRegistrar {
        registry,
        library: library.clone(),
        registered: Vec::new(),
    };
    (declaration.register)(&mut registrar);

    if registrar.registered.is_empty() {
        return Err(LoaderError::ArtifactLoadFailed {
            id: entry_id.to_string(),
            reason: "artifact registered no plugin classes".to_string(),
        });
    }

    tracing::info!(id = entry_id, classes = ?registrar.registered, "installed artifact");
    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_rejects_non_library_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-lib.so");
        std::fs::write(&path, b"definitely not an ELF").unwrap();

        let registry = PluginRegistry::empty();
        match install(&path, "fake", &registry) {
            Err(LoaderError::ArtifactLoadFailed { id, .. }) => assert_eq!(id, "fake"),
            other => panic!("expected ArtifactLoadFailed, got {other:?}"),
        }
        assert!(!registry.contains("fake"));
    }

    #[test]
    fn test_install_missing_file() {
        let registry = PluginRegistry::empty();
        assert!(matches!(
            install(Path::new("/nonexistent/plugin.so"), "ghost", &registry),
            Err(LoaderError::ArtifactLoadFailed { .. })
        ));
    }
}
