//! The state shape the adapter asks a device to deliver.
//!
//! A [`DataFormat`] names which [`RawAxis`] slots and how many buttons of [`RawState`] the
//! caller wants filled. [`DataFormat::joystick`] (all four axes, 32 buttons) is the only
//! format the adapter sets. Where those controls sit inside a device's reports is the
//! backend's business; the hidapi backend reads it from the report descriptor
//! (see [`crate::report`]).
//!
//! [`RawState`]: crate::state::RawState

use crate::error::DeviceError;
use crate::state::{RawAxis, AXIS_COUNT, BUTTON_COUNT};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataFormat {
    axes: [bool; AXIS_COUNT],
    button_count: usize,
}

impl DataFormat {
    /// Every axis and all 32 buttons.
    pub const fn joystick() -> Self {
        Self {
            axes: [true; AXIS_COUNT],
            button_count: BUTTON_COUNT,
        }
    }

    /// No axes, no buttons. Build up with [`with_axis`](Self::with_axis) and
    /// [`with_buttons`](Self::with_buttons).
    pub const fn empty() -> Self {
        Self {
            axes: [false; AXIS_COUNT],
            button_count: 0,
        }
    }

    pub fn with_axis(mut self, axis: RawAxis) -> Self {
        self.axes[axis.index()] = true;
        self
    }

    pub fn with_buttons(mut self, count: usize) -> Self {
        self.button_count = count;
        self
    }

    #[inline]
    pub fn includes_axis(&self, axis: RawAxis) -> bool {
        self.axes[axis.index()]
    }

    #[inline]
    pub fn button_count(&self) -> usize {
        self.button_count
    }

    /// Rejects formats that ask for nothing, or for more buttons than [`RawState`] holds.
    ///
    /// [`RawState`]: crate::state::RawState
    pub fn validate(&self) -> Result<(), DeviceError> {
        if self.button_count > BUTTON_COUNT {
            return Err(DeviceError::DataFormat(format!(
                "{} buttons requested, at most {BUTTON_COUNT} supported",
                self.button_count
            )));
        }
        if self.button_count == 0 && !self.axes.iter().any(|a| *a) {
            return Err(DeviceError::DataFormat("format requests no controls".into()));
        }
        Ok(())
    }
}

impl Default for DataFormat {
    fn default() -> Self {
        Self::joystick()
    }
}
