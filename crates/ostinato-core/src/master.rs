//! Master bus: slot mixer into a volume stage, piped to the graph output.

use fundsp::net::NodeId;
use fundsp::prelude::{pass, shared, var, Shared};

use crate::graph::AudioGraph;
use crate::mixer::SlotMixer;

/// Initial stereo slot count; doubles when exhausted.
const INITIAL_SLOTS: usize = 16;

/// Terminal mix stage of the audio context.
///
/// Lives for the context's lifetime and is never disconnected. Sources attach
/// to numbered stereo slots on a [`SlotMixer`]; the mixer feeds a volume node
/// whose gain is the master volume, clamped to `[0, 1]`.
pub struct MasterBus {
    mixer_node: NodeId,
    volume_node: NodeId,
    volume: Shared,
    /// Source node per occupied slot.
    slots: Vec<Option<NodeId>>,
}

impl MasterBus {
    pub(crate) fn build(graph: &mut AudioGraph) -> Self {
        let volume = shared(1.0);
        let mixer_node = graph.add(Box::new(SlotMixer::new(INITIAL_SLOTS)));
        let volume_node = graph.add(Box::new(
            (pass() | pass()) * (var(&volume) | var(&volume)),
        ));
        graph.connect_stereo(mixer_node, volume_node, 0);
        graph.pipe_output(volume_node);

        Self {
            mixer_node,
            volume_node,
            volume,
            slots: vec![None; INITIAL_SLOTS],
        }
    }

    /// The node audio leaves the bus from.
    pub fn output_node(&self) -> NodeId {
        self.volume_node
    }

    /// Attach a stereo source to a free slot. Returns the slot index.
    pub fn attach(&mut self, graph: &mut AudioGraph, source: NodeId) -> usize {
        let slot = match self.slots.iter().position(|s| s.is_none()) {
            Some(slot) => slot,
            None => self.grow(graph),
        };
        self.slots[slot] = Some(source);
        graph.connect_stereo(source, self.mixer_node, slot * 2);
        slot
    }

    /// Detach the source occupying `slot`; the slot reads silence afterwards.
    pub fn detach(&mut self, graph: &mut AudioGraph, slot: usize) {
        if slot >= self.slots.len() || self.slots[slot].is_none() {
            return;
        }
        self.slots[slot] = None;
        graph.disconnect(self.mixer_node, slot * 2);
        graph.disconnect(self.mixer_node, slot * 2 + 1);
    }

    /// Replace the mixer with one twice as wide, re-attaching every occupied
    /// slot. Atomic within the enclosing graph commit.
    fn grow(&mut self, graph: &mut AudioGraph) -> usize {
        let new_len = self.slots.len() * 2;
        let new_mixer = graph.add(Box::new(SlotMixer::new(new_len)));

        for (slot, source) in self.slots.iter().enumerate() {
            if let Some(source) = source {
                graph.connect_stereo(*source, new_mixer, slot * 2);
            }
        }
        graph.connect_stereo(new_mixer, self.volume_node, 0);
        graph.remove(self.mixer_node);

        self.mixer_node = new_mixer;
        let free = self.slots.len();
        self.slots.resize(new_len, None);
        free
    }

    /// Set the master volume, clamped to `[0, 1]`. Out-of-range values are
    /// not an error.
    pub fn set_volume(&self, volume: f32) {
        self.volume.set_value(volume.clamp(0.0, 1.0));
    }

    pub fn volume(&self) -> f32 {
        self.volume.value()
    }

    #[cfg(test)]
    pub(crate) fn occupied_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}
