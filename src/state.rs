//! Raw device state.
//!
//! [`RawState`] is a fixed-layout, owned snapshot of one device read: four signed axes and
//! 32 button flags. The adapter keeps two of them (`current` and `previous`) and diffs them
//! every dispatch. It is `Copy`, so committing a frame is a plain assignment.

/// Number of buttons tracked per device.
pub const BUTTON_COUNT: usize = 32;

/// Number of axes tracked per device.
pub const AXIS_COUNT: usize = 4;

/// Raw axis slots of [`RawState`], in report order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RawAxis {
    X,
    Y,
    Z,
    Rz,
}

impl RawAxis {
    pub const ALL: [RawAxis; AXIS_COUNT] = [RawAxis::X, RawAxis::Y, RawAxis::Z, RawAxis::Rz];

    /// Position in [`RawAxis::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One read of a device.
///
/// Axis values are raw device units, nominally in the signed 16-bit range. They are kept as
/// `i32` so out-of-range readings survive until normalization clamps them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawState {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub rz: i32,
    pub buttons: [bool; BUTTON_COUNT],
}

impl RawState {
    #[inline]
    pub fn axis(&self, axis: RawAxis) -> i32 {
        match axis {
            RawAxis::X => self.x,
            RawAxis::Y => self.y,
            RawAxis::Z => self.z,
            RawAxis::Rz => self.rz,
        }
    }

    #[inline]
    pub fn set_axis(&mut self, axis: RawAxis, value: i32) {
        match axis {
            RawAxis::X => self.x = value,
            RawAxis::Y => self.y = value,
            RawAxis::Z => self.z = value,
            RawAxis::Rz => self.rz = value,
        }
    }

    /// Pressed state of button `index`; `false` for indices past [`BUTTON_COUNT`].
    #[inline]
    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }

    /// Sets button `index`. Out-of-range indices are ignored.
    #[inline]
    pub fn set_button(&mut self, index: usize, pressed: bool) {
        if let Some(slot) = self.buttons.get_mut(index) {
            *slot = pressed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_centered_and_released() {
        let s = RawState::default();
        for axis in RawAxis::ALL {
            assert_eq!(s.axis(axis), 0);
        }
        assert!(s.buttons.iter().all(|b| !b));
    }

    #[test]
    fn out_of_range_button_is_ignored() {
        let mut s = RawState::default();
        s.set_button(BUTTON_COUNT, true);
        assert!(!s.button(BUTTON_COUNT));
        assert_eq!(s, RawState::default());
    }

    #[test]
    fn axis_accessors_address_named_fields() {
        let mut s = RawState::default();
        s.set_axis(RawAxis::Rz, -200);
        s.set_axis(RawAxis::Y, 7);
        assert_eq!(s.rz, -200);
        assert_eq!(s.y, 7);
        assert_eq!(s.axis(RawAxis::X), 0);
    }
}
