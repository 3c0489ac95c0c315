//! The plugin host: the single entry point the outer application drives.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use ostinato_core::{AudioContext, NodeId};

use crate::abi::{AudioPlugin, VoiceHandle};
use crate::error::{HostError, Result};
use crate::metadata::PluginMetadata;
use crate::params::ParamMap;
use crate::registry::PluginRegistry;
use crate::state::PluginState;

/// A live plugin instance tracked by the host.
pub struct PluginInstance {
    id: String,
    plugin_id: String,
    created_at: f64,
    metadata: PluginMetadata,
    plugin: Mutex<Box<dyn AudioPlugin>>,
    output: NodeId,
    /// Master-bus slot while connected there.
    slot: Mutex<Option<usize>>,
    /// Keeps dynamically loaded code mapped while this instance lives.
    _artifact: Option<Arc<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("id", &self.id)
            .field("plugin_id", &self.plugin_id)
            .field("created_at", &self.created_at)
            .field("metadata", &self.metadata)
            .field("output", &self.output)
            .field("slot", &*self.slot.lock())
            .finish_non_exhaustive()
    }
}

impl PluginInstance {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Audio-clock time this instance was created at, in seconds.
    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    pub fn output_node(&self) -> NodeId {
        self.output
    }

    /// Direct access to the underlying plugin, for capability calls the
    /// host does not wrap.
    pub fn plugin(&self) -> MutexGuard<'_, Box<dyn AudioPlugin>> {
        self.plugin.lock()
    }
}

#[derive(Default)]
struct InstanceMap {
    by_id: HashMap<String, Arc<PluginInstance>>,
    order: Vec<String>,
}

/// Owns the audio context, the live set of instances, and routing; bridges
/// the outer application to the registry.
pub struct PluginHost {
    context: Arc<AudioContext>,
    registry: Arc<PluginRegistry>,
    instances: Mutex<InstanceMap>,
    serial: AtomicU64,
}

impl PluginHost {
    pub fn new(context: Arc<AudioContext>, registry: Arc<PluginRegistry>) -> Self {
        Self {
            context,
            registry,
            instances: Mutex::new(InstanceMap::default()),
            serial: AtomicU64::new(1),
        }
    }

    pub fn context(&self) -> &Arc<AudioContext> {
        &self.context
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Ensure the audio context is running. Idempotent; required after the
    /// first user gesture on autoplay-gated front-ends.
    pub fn resume(&self) -> Result<()> {
        self.context.resume()?;
        Ok(())
    }

    /// Create an instance of a registered plugin.
    ///
    /// Fails *unknown-plugin* for unregistered ids and *duplicate-instance*
    /// when the caller supplies an id that is already live (the permissive
    /// overwrite of the original web host orphans an instance, so this host
    /// rejects instead). The new instance is not connected anywhere; call
    /// [`connect_plugin`](Self::connect_plugin).
    pub fn create_plugin(
        &self,
        plugin_id: &str,
        instance_id: Option<&str>,
    ) -> Result<Arc<PluginInstance>> {
        let class = self.registry.class(plugin_id)?;

        let mut instances = self.instances.lock();
        let id = match instance_id {
            Some(id) => {
                if instances.by_id.contains_key(id) {
                    return Err(HostError::DuplicateInstance(id.to_string()));
                }
                id.to_string()
            }
            None => loop {
                let id = format!("{plugin_id}-{}", self.serial.fetch_add(1, Ordering::Relaxed));
                if !instances.by_id.contains_key(&id) {
                    break id;
                }
            },
        };

        let plugin = (class.constructor)(&self.context)?;
        let output = plugin.output_node();

        let instance = Arc::new(PluginInstance {
            id: id.clone(),
            plugin_id: plugin_id.to_string(),
            created_at: self.context.current_time(),
            metadata: class.metadata,
            plugin: Mutex::new(plugin),
            output,
            slot: Mutex::new(None),
            _artifact: class.artifact,
        });

        instances.by_id.insert(id.clone(), instance.clone());
        instances.order.push(id.clone());
        tracing::info!(plugin = plugin_id, instance = %id, "created plugin instance");

        Ok(instance)
    }

    pub fn get_plugin(&self, instance_id: &str) -> Option<Arc<PluginInstance>> {
        self.instances.lock().by_id.get(instance_id).cloned()
    }

    /// Delete an instance: all notes off, disconnect, release its nodes.
    /// Returns false for unknown ids.
    pub fn delete_plugin(&self, instance_id: &str) -> bool {
        let instance = {
            let mut instances = self.instances.lock();
            match instances.by_id.remove(instance_id) {
                Some(instance) => {
                    instances.order.retain(|id| id != instance_id);
                    instance
                }
                None => return false,
            }
        };

        {
            let mut plugin = instance.plugin();
            plugin.all_notes_off();
            if let Some(slot) = instance.slot.lock().take() {
                self.context.bus(|bus, g| bus.detach(g, slot));
            }
            plugin.destroy();
        }
        tracing::info!(instance = instance_id, "deleted plugin instance");
        true
    }

    /// Every live instance, in creation order.
    pub fn all_plugins(&self) -> Vec<Arc<PluginInstance>> {
        let instances = self.instances.lock();
        instances
            .order
            .iter()
            .filter_map(|id| instances.by_id.get(id).cloned())
            .collect()
    }

    /// Connect an instance's output. `None` targets the master bus; a node
    /// destination wires the stereo pair straight in (effect inputs).
    pub fn connect_plugin(&self, instance_id: &str, destination: Option<NodeId>) -> Result<()> {
        let instance = self.instance(instance_id)?;
        match destination {
            None => {
                let mut slot = instance.slot.lock();
                if slot.is_none() {
                    *slot = Some(
                        self.context
                            .bus(|bus, g| bus.attach(g, instance.output_node())),
                    );
                }
                Ok(())
            }
            Some(node) => {
                let output = instance.output_node();
                self.context.graph(|g| g.connect_stereo(output, node, 0));
                Ok(())
            }
        }
    }

    /// Detach an instance from the master bus.
    pub fn disconnect_plugin(&self, instance_id: &str) -> Result<()> {
        let instance = self.instance(instance_id)?;
        if let Some(slot) = instance.slot.lock().take() {
            self.context.bus(|bus, g| bus.detach(g, slot));
        }
        Ok(())
    }

    /// Dispatch a percussion trigger. `time` is audio-clock seconds (zero or
    /// past means now), `velocity` in `[0, 1]`, `note` an optional per-hit
    /// pitch override.
    pub fn trigger_plugin(
        &self,
        instance_id: &str,
        time: f64,
        velocity: f64,
        note: Option<f64>,
    ) -> Result<()> {
        let instance = self.instance(instance_id)?;
        let mut plugin = instance.plugin();
        let percussion = plugin
            .as_percussion()
            .ok_or(HostError::CapabilityMismatch {
                instance: instance_id.to_string(),
                operation: "trigger",
            })?;
        percussion.trigger(time, velocity, note);
        Ok(())
    }

    /// Start a note. `duration` of zero holds until [`note_off`](Self::note_off).
    pub fn note_on(
        &self,
        instance_id: &str,
        note: u8,
        velocity: f64,
        duration: f64,
    ) -> Result<VoiceHandle> {
        let instance = self.instance(instance_id)?;
        let mut plugin = instance.plugin();
        let synth = plugin.as_synth().ok_or(HostError::CapabilityMismatch {
            instance: instance_id.to_string(),
            operation: "noteOn",
        })?;
        Ok(synth.note_on(note, velocity, duration))
    }

    pub fn note_off(&self, instance_id: &str, voice: VoiceHandle) -> Result<()> {
        let instance = self.instance(instance_id)?;
        let mut plugin = instance.plugin();
        let synth = plugin.as_synth().ok_or(HostError::CapabilityMismatch {
            instance: instance_id.to_string(),
            operation: "noteOff",
        })?;
        synth.note_off(voice);
        Ok(())
    }

    /// Thread a source node through an insert effect; returns the node the
    /// processed audio is available at.
    pub fn process_effect(&self, instance_id: &str, source: NodeId) -> Result<NodeId> {
        let instance = self.instance(instance_id)?;
        let mut plugin = instance.plugin();
        let effect = plugin.as_effect().ok_or(HostError::CapabilityMismatch {
            instance: instance_id.to_string(),
            operation: "process",
        })?;
        Ok(effect.process(source))
    }

    pub fn set_parameter(&self, instance_id: &str, name: &str, value: f64) -> Result<()> {
        let instance = self.instance(instance_id)?;
        instance.plugin().set_param(name, value);
        Ok(())
    }

    pub fn get_parameter(&self, instance_id: &str, name: &str) -> Result<Option<f64>> {
        let instance = self.instance(instance_id)?;
        let value = instance.plugin().get_param(name);
        Ok(value)
    }

    pub fn parameters(&self, instance_id: &str) -> Result<ParamMap> {
        let instance = self.instance(instance_id)?;
        let params = instance.plugin().parameters();
        Ok(params)
    }

    /// Pure snapshot of an instance for persistence.
    pub fn export_state(&self, instance_id: &str) -> Result<PluginState> {
        let instance = self.instance(instance_id)?;
        let parameters = instance.plugin().parameters();
        Ok(PluginState {
            id: instance.id().to_string(),
            plugin_id: instance.plugin_id().to_string(),
            parameters,
            created_at: instance.created_at(),
        })
    }

    /// Recreate an instance from exported state, restoring every named
    /// parameter's value. Parameter names the current class does not know
    /// are ignored.
    pub fn import_state(&self, state: &PluginState) -> Result<Arc<PluginInstance>> {
        let instance = self.create_plugin(&state.plugin_id, Some(&state.id))?;
        {
            let mut plugin = instance.plugin();
            for (name, spec) in &state.parameters {
                plugin.set_param(name, spec.value);
            }
        }
        Ok(instance)
    }

    /// The master bus node, the terminal node before hardware output.
    pub fn master_output(&self) -> NodeId {
        self.context.master_output()
    }

    /// Master volume; values clamp into `[0, 1]` silently.
    pub fn set_master_volume(&self, volume: f32) {
        self.context.set_master_volume(volume);
    }

    pub fn master_volume(&self) -> f32 {
        self.context.master_volume()
    }

    fn instance(&self, instance_id: &str) -> Result<Arc<PluginInstance>> {
        self.get_plugin(instance_id)
            .ok_or_else(|| HostError::UnknownInstance(instance_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::LogDrumPlugin;

    fn test_host() -> PluginHost {
        let context = Arc::new(AudioContext::builder().offline(48_000.0).build().unwrap());
        PluginHost::new(context, Arc::new(PluginRegistry::default()))
    }

    #[test]
    fn test_create_resolves_class_and_metadata() {
        let host = test_host();
        let instance = host.create_plugin(LogDrumPlugin::ID, Some("ld-1")).unwrap();

        assert_eq!(instance.id(), "ld-1");
        assert_eq!(instance.plugin_id(), LogDrumPlugin::ID);
        assert_eq!(instance.metadata().name, "Log Drum");
    }

    #[test]
    fn test_create_unknown_plugin_fails() {
        let host = test_host();
        match host.create_plugin("no-such-plugin", None) {
            Err(HostError::UnknownPlugin(id)) => assert_eq!(id, "no-such-plugin"),
            other => panic!("expected UnknownPlugin, got {other:?}"),
        }
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let host = test_host();
        let a = host.create_plugin(LogDrumPlugin::ID, None).unwrap();
        let b = host.create_plugin(LogDrumPlugin::ID, None).unwrap();
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("log-drum-"));
    }

    #[test]
    fn test_duplicate_instance_id_rejected() {
        let host = test_host();
        host.create_plugin(LogDrumPlugin::ID, Some("ld-1")).unwrap();
        match host.create_plugin(LogDrumPlugin::ID, Some("ld-1")) {
            Err(HostError::DuplicateInstance(id)) => assert_eq!(id, "ld-1"),
            other => panic!("expected DuplicateInstance, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_lifecycle() {
        let host = test_host();
        host.create_plugin(LogDrumPlugin::ID, Some("ld-1")).unwrap();
        host.connect_plugin("ld-1", None).unwrap();

        assert!(host.delete_plugin("ld-1"));
        assert!(host.get_plugin("ld-1").is_none());
        assert!(host.all_plugins().is_empty());
        assert!(!host.delete_plugin("ld-1"));

        // The id is free again and yields a distinct instance.
        let again = host.create_plugin(LogDrumPlugin::ID, Some("ld-1")).unwrap();
        assert_eq!(again.id(), "ld-1");
    }

    #[test]
    fn test_all_plugins_insertion_order() {
        let host = test_host();
        host.create_plugin("log-drum", Some("a")).unwrap();
        host.create_plugin("clap-808", Some("b")).unwrap();
        host.create_plugin("amapiano-bass", Some("c")).unwrap();

        let ids: Vec<_> = host.all_plugins().iter().map(|p| p.id().to_string()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_capability_mismatch() {
        let host = test_host();
        host.create_plugin("shimmer-reverb", Some("fx")).unwrap();
        host.create_plugin("log-drum", Some("ld")).unwrap();

        match host.trigger_plugin("fx", 0.0, 1.0, None) {
            Err(HostError::CapabilityMismatch { operation, .. }) => {
                assert_eq!(operation, "trigger")
            }
            other => panic!("expected CapabilityMismatch, got {other:?}"),
        }
        match host.note_on("ld", 60, 1.0, 0.0) {
            Err(HostError::CapabilityMismatch { operation, .. }) => {
                assert_eq!(operation, "noteOn")
            }
            other => panic!("expected CapabilityMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_instance_errors() {
        let host = test_host();
        assert!(matches!(
            host.set_parameter("ghost", "pitch", 1.0),
            Err(HostError::UnknownInstance(_))
        ));
        assert!(matches!(
            host.trigger_plugin("ghost", 0.0, 1.0, None),
            Err(HostError::UnknownInstance(_))
        ));
    }

    #[test]
    fn test_parameter_passthrough_clamps() {
        let host = test_host();
        host.create_plugin("log-drum", Some("ld")).unwrap();

        host.set_parameter("ld", "pitch", 48.0).unwrap();
        assert_eq!(host.get_parameter("ld", "pitch").unwrap(), Some(48.0));

        host.set_parameter("ld", "pitch", 1000.0).unwrap();
        assert_eq!(host.get_parameter("ld", "pitch").unwrap(), Some(96.0));

        // Unknown names are ignored on set and None on get.
        host.set_parameter("ld", "wobble", 3.0).unwrap();
        assert_eq!(host.get_parameter("ld", "wobble").unwrap(), None);
    }

    #[test]
    fn test_export_import_round_trip() {
        let host = test_host();
        host.create_plugin("log-drum", Some("ld-1")).unwrap();
        host.set_parameter("ld-1", "pitch", 48.0).unwrap();
        host.set_parameter("ld-1", "decay", 1.2).unwrap();
        host.set_parameter("ld-1", "body", 0.3).unwrap();

        let state = host.export_state("ld-1").unwrap();
        assert_eq!(state.plugin_id, "log-drum");
        assert!(host.delete_plugin("ld-1"));

        let restored = host.import_state(&state).unwrap();
        assert_eq!(restored.id(), "ld-1");
        assert_eq!(host.get_parameter("ld-1", "pitch").unwrap(), Some(48.0));
        assert_eq!(host.get_parameter("ld-1", "decay").unwrap(), Some(1.2));
        assert_eq!(host.get_parameter("ld-1", "body").unwrap(), Some(0.3));
    }

    #[test]
    fn test_master_volume_clamp() {
        let host = test_host();
        host.set_master_volume(2.5);
        assert_eq!(host.master_volume(), 1.0);
        host.set_master_volume(-0.3);
        assert_eq!(host.master_volume(), 0.0);
    }
}
