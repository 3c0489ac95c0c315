//! Declaration contract for dynamically loaded plugin artifacts.
//!
//! An artifact is a cdylib that exports exactly one well-known static,
//! [`PluginDeclaration`], under the symbol named by [`DECLARATION_SYMBOL`].
//! The loader opens the library, checks the ABI version and catalog id, and
//! invokes `register` with a registrar that installs the class while keeping
//! the library mapped for as long as the class or any instance lives.
//!
//! Catalog ids also derive an advisory Rust type name (`my-plugin` becomes
//! `MyPluginPlugin`, see [`derived_class_name`]); the binding contract is the
//! exported declaration, the derived name is documentation and log fodder.

use crate::metadata::PluginMetadata;
use crate::registry::PluginConstructor;

/// Version of the declaration contract. Bumped on breaking changes; the
/// loader refuses artifacts built against another version.
pub const ABI_VERSION: u32 = 1;

/// Exported symbol every artifact publishes.
pub const DECLARATION_SYMBOL: &str = "ostinato_plugin_declaration";

/// Static declaration exported by a plugin artifact.
pub struct PluginDeclaration {
    pub abi_version: u32,
    /// Catalog id this artifact implements (kebab-case).
    pub id: &'static str,
    /// Advisory type name, normally `derived_class_name(id)`.
    pub class_name: &'static str,
    /// Called once after the artifact is opened.
    pub register: fn(&mut dyn PluginRegistrar),
}

/// Sink the artifact registers its class into.
pub trait PluginRegistrar {
    fn register_class(
        &mut self,
        id: &str,
        metadata: PluginMetadata,
        constructor: PluginConstructor,
    );
}

/// Export a [`PluginDeclaration`] under the well-known symbol.
///
/// ```ignore
/// ostinato_host::export_plugin!(PluginDeclaration {
///     abi_version: ostinato_host::ABI_VERSION,
///     id: "my-plugin",
///     class_name: "MyPluginPlugin",
///     register: |registrar| { /* register_class(...) */ },
/// });
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($decl:expr) => {
        #[allow(non_upper_case_globals)]
        #[no_mangle]
        pub static ostinato_plugin_declaration: $crate::PluginDeclaration = $decl;
    };
}

/// Advisory type name derived from a kebab-case plugin id: PascalCase each
/// segment, then append `Plugin`.
pub fn derived_class_name(id: &str) -> String {
    let mut name = String::with_capacity(id.len() + 6);
    for segment in id.split('-') {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.extend(chars);
        }
    }
    name.push_str("Plugin");
    name
}
