//! Stereo slot mixer node.

use fundsp::prelude::{AudioUnit, BufferMut, BufferRef};
use fundsp::signal::SignalFrame;

/// Fixed-width stereo summing node.
///
/// Exposes `2 * slots` input ports (even = left, odd = right) and sums them
/// onto a stereo output. FunDSP net inputs take a single source edge each, so
/// star-topology fan-in onto the master bus goes through one of these; ports
/// left unconnected read as silence.
#[derive(Clone)]
pub struct SlotMixer {
    slots: usize,
}

impl SlotMixer {
    pub fn new(slots: usize) -> Self {
        Self {
            slots: slots.max(1),
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }
}

impl AudioUnit for SlotMixer {
    fn inputs(&self) -> usize {
        self.slots * 2
    }

    fn outputs(&self) -> usize {
        2
    }

    fn reset(&mut self) {}

    fn set_sample_rate(&mut self, _sample_rate: f64) {}

    #[inline]
    fn tick(&mut self, input: &[f32], output: &mut [f32]) {
        let mut left = 0.0;
        let mut right = 0.0;
        for slot in 0..self.slots {
            left += input[slot * 2];
            right += input[slot * 2 + 1];
        }
        output[0] = left;
        output[1] = right;
    }

    fn process(&mut self, size: usize, input: &BufferRef, output: &mut BufferMut) {
        for i in 0..size {
            let mut left = 0.0;
            let mut right = 0.0;
            for slot in 0..self.slots {
                left += input.at_f32(slot * 2, i);
                right += input.at_f32(slot * 2 + 1, i);
            }
            output.set_f32(0, i, left);
            output.set_f32(1, i, right);
        }
    }

    fn get_id(&self) -> u64 {
        const SLOT_MIXER_ID: u64 = 0x_534C_4F54_4D49_5852; // "SLOTMIXR"
        SLOT_MIXER_ID
    }

    fn route(&mut self, _input: &SignalFrame, _frequency: f64) -> SignalFrame {
        SignalFrame::new(self.outputs())
    }

    fn footprint(&self) -> usize {
        core::mem::size_of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixer_sums_slots() {
        let mut mixer = SlotMixer::new(3);
        assert_eq!(mixer.inputs(), 6);
        assert_eq!(mixer.outputs(), 2);

        let input = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let mut output = [0.0f32; 2];
        mixer.tick(&input, &mut output);

        assert!((output[0] - 0.9).abs() < 1e-6);
        assert!((output[1] - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_empty_slots_are_silent() {
        let mut mixer = SlotMixer::new(2);
        let input = [0.0f32; 4];
        let mut output = [0.5f32; 2];
        mixer.tick(&input, &mut output);

        assert_eq!(output, [0.0, 0.0]);
    }
}
