//! Thin frontend over the FunDSP `Net`.

use fundsp::net::{Net, NodeId};
use fundsp::prelude::AudioUnit;
use fundsp::sequencer::Fade;

/// DSP graph frontend.
///
/// Wraps `fundsp::net::Net` with the subset of editing operations the host
/// uses. Obtained inside [`AudioContext::graph`](crate::AudioContext::graph);
/// edits are committed to the audio thread when that closure returns.
pub struct AudioGraph {
    net: Net,
}

impl AudioGraph {
    pub(crate) fn with_io(inputs: usize, outputs: usize, sample_rate: f64) -> Self {
        let mut net = Net::new(inputs, outputs);
        net.set_sample_rate(sample_rate);
        Self { net }
    }

    pub(crate) fn backend(&mut self) -> fundsp::realnet::NetBackend {
        self.net.backend()
    }

    pub fn add(&mut self, unit: Box<dyn AudioUnit>) -> NodeId {
        self.net.push(unit)
    }

    /// Connect first output of `from` to first input of `to`.
    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        self.net.connect(from, 0, to, 0);
    }

    pub fn connect_ports(&mut self, from: NodeId, from_port: usize, to: NodeId, to_port: usize) {
        self.net.connect(from, from_port, to, to_port);
    }

    /// Connect a stereo pair: outputs 0/1 of `from` into `to_port`/`to_port + 1`.
    pub fn connect_stereo(&mut self, from: NodeId, to: NodeId, to_port: usize) {
        self.net.connect(from, 0, to, to_port);
        self.net.connect(from, 1, to, to_port + 1);
    }

    /// Disconnect an input port of `node`; it reads silence afterwards.
    pub fn disconnect(&mut self, node: NodeId, port: usize) {
        self.net.disconnect(node, port);
    }

    pub fn remove(&mut self, node: NodeId) -> Box<dyn AudioUnit> {
        self.net.remove(node)
    }

    pub fn replace(&mut self, node: NodeId, unit: Box<dyn AudioUnit>) -> Box<dyn AudioUnit> {
        self.net.replace(node, unit)
    }

    /// Swap the unit behind `node` with a short crossfade, keeping its edges.
    pub fn crossfade(&mut self, node: NodeId, fade_time: f32, unit: Box<dyn AudioUnit>) {
        self.net.crossfade(node, Fade::Smooth, fade_time, unit);
    }

    /// Connect `source` to the graph outputs.
    pub fn pipe_output(&mut self, source: NodeId) {
        self.net.pipe_output(source);
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.net.contains(node)
    }

    pub fn size(&self) -> usize {
        self.net.size()
    }

    pub(crate) fn commit(&mut self) {
        self.net.commit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundsp::prelude::*;

    #[test]
    fn test_add_and_connect() {
        let mut graph = AudioGraph::with_io(0, 2, 48_000.0);

        let osc = graph.add(Box::new(sine_hz::<f32>(440.0)));
        let filter = graph.add(Box::new(lowpass_hz::<f32>(1000.0, 1.0)));

        assert_eq!(graph.size(), 2);
        assert!(graph.contains(osc));
        assert!(graph.contains(filter));

        graph.connect(osc, filter);
    }

    #[test]
    fn test_remove_node() {
        let mut graph = AudioGraph::with_io(0, 2, 48_000.0);

        let osc = graph.add(Box::new(sine_hz::<f32>(440.0)));
        assert_eq!(graph.size(), 1);

        let _removed = graph.remove(osc);
        assert_eq!(graph.size(), 0);
        assert!(!graph.contains(osc));
    }
}
