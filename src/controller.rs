//! NES controller input handling.
//!
//! Implements the [standard controller](https://www.nesdev.org/wiki/Standard_controller)
//! protocol on port 1 ($4016):
//!
//! 1. **Strobe**: the game writes 1 then 0 to $4016; the 1→0 edge latches a
//!    snapshot of the current button byte into the shift stage.
//! 2. **Serial read**: each $4016 read returns one bit of the snapshot and
//!    advances the output mask. Order: A, B, Select, Start, Up, Down, Left,
//!    Right. While the strobe is held high, reads return the live A button.
//!
//! The host refreshes `state` from the keyboard once per frame; the latch
//! decouples that from whenever the game chooses to poll.

/// A single controller on port 1. Bit order of `state` and `snapshot`:
/// 0=A, 1=B, 2=Select, 3=Start, 4=Up, 5=Down, 6=Left, 7=Right; 1 = pressed.
pub struct Controller {
    /// Live button byte, maintained by the host.
    pub state: u8,
    /// Buttons as they were at the last strobe 1→0 edge.
    snapshot: u8,
    /// Which snapshot bit the next serial read returns.
    mask: u8,
    strobe: bool,
}

impl Controller {
    pub fn new() -> Self {
        Controller {
            state: 0,
            snapshot: 0,
            mask: 0x01,
            strobe: false,
        }
    }

    /// Write $4016: bit 0 is the strobe. Dropping it latches the snapshot;
    /// every write rewinds the output mask to the A button.
    pub fn write(&mut self, data: u8) {
        let strobe = data & 1 != 0;
        if self.strobe && !strobe {
            self.snapshot = self.state;
        }
        self.strobe = strobe;
        self.mask = 0x01;
    }

    /// Read $4016: the live A button while strobed, otherwise the next
    /// snapshot bit, shifting the mask left afterwards.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return self.state & 0x01;
        }
        let bit = u8::from(self.snapshot & self.mask != 0);
        self.mask = self.mask.wrapping_shl(1);
        bit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strobe_then_reads_shift_out_all_buttons() {
        let mut pad = Controller::new();
        pad.state = 0b1010_0101; // A, Select, Down, Right
        pad.write(1);
        pad.write(0);

        let bits: Vec<u8> = (0..8).map(|_| pad.read()).collect();
        assert_eq!(bits, vec![1, 0, 1, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn held_strobe_always_returns_the_live_a_button() {
        let mut pad = Controller::new();
        pad.write(1);
        pad.state = 0x01;
        assert_eq!(pad.read(), 1);
        assert_eq!(pad.read(), 1);
        pad.state = 0x00;
        assert_eq!(pad.read(), 0);
    }

    #[test]
    fn snapshot_is_fixed_at_the_strobe_edge() {
        let mut pad = Controller::new();
        pad.state = 0x01; // A held
        pad.write(1);
        pad.write(0);
        pad.state = 0x02; // releases A, presses B after the latch
        assert_eq!(pad.read(), 1, "latched A survives the state change");
        assert_eq!(pad.read(), 0, "B was not held at the latch");
    }

    #[test]
    fn writes_rewind_the_output_mask() {
        let mut pad = Controller::new();
        pad.state = 0b0000_0011;
        pad.write(1);
        pad.write(0);
        assert_eq!(pad.read(), 1); // A
        pad.write(0); // rewinds without re-latching
        assert_eq!(pad.read(), 1, "back at the A bit");
    }

    #[test]
    fn reads_past_the_last_button_return_zero() {
        let mut pad = Controller::new();
        pad.state = 0xFF;
        pad.write(1);
        pad.write(0);
        for _ in 0..8 {
            pad.read();
        }
        assert_eq!(pad.read(), 0);
    }
}
