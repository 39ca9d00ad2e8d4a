//! Events and the sink they are delivered to.
//!
//! The adapter reports input as small deltas through a [`MessageHandler`]. The same deltas
//! can be captured as values ([`InputKind`], optionally timestamped as [`InputEvent`]) by
//! sinks such as [`InputEventBus`](crate::eventbus::InputEventBus).
//!
//! ## Value conventions
//! - **Axes:** normalized to `[-1.0, 1.0]` by [`normalize_axis`].
//! - **Buttons:** press/release edges only. The repeat flag is always `false`; this adapter
//!   never synthesizes key repeat.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Full-scale raw axis value.
pub const AXIS_FULL_SCALE: f32 = 32767.0;

/// Logical axis reported to the sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisId {
    LeftX,
    LeftY,
    RightTrigger,
    LeftTrigger,
}

impl AxisId {
    pub fn name(self) -> &'static str {
        match self {
            AxisId::LeftX => "Gamepad_LeftX",
            AxisId::LeftY => "Gamepad_LeftY",
            AxisId::RightTrigger => "Gamepad_RightTrigger",
            AxisId::LeftTrigger => "Gamepad_LeftTrigger",
        }
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical button reported to the sink.
///
/// With [`ButtonIdentity::PerIndex`] the inner value is the physical button index (`0..32`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ButtonId(pub u8);

impl ButtonId {
    /// Bottom face button (A / Cross). Every button reports as this in
    /// [`ButtonIdentity::Shared`] mode.
    pub const FACE_BUTTON_BOTTOM: ButtonId = ButtonId(0);
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Button{}", self.0)
    }
}

/// How physical button indices map to [`ButtonId`]s.
///
/// `PerIndex` gives every physical button its own identifier. `Shared` reports every button
/// as [`ButtonId::FACE_BUTTON_BOTTOM`], which is how the first release of the wheel plugin
/// behaved; it is kept for hosts whose bindings were built around that.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ButtonIdentity {
    #[default]
    PerIndex,
    Shared,
}

impl ButtonIdentity {
    #[inline]
    pub fn resolve(self, index: usize) -> ButtonId {
        match self {
            ButtonIdentity::PerIndex => ButtonId(u8::try_from(index).unwrap_or(u8::MAX)),
            ButtonIdentity::Shared => ButtonId::FACE_BUTTON_BOTTOM,
        }
    }
}

/// Map a raw axis reading to `[-1.0, 1.0]`.
///
/// Linear in `raw / 32767`, clamped at both ends, so `-32768` reads as exactly `-1.0`.
#[inline]
pub fn normalize_axis(raw: i32) -> f32 {
    (raw as f32 / AXIS_FULL_SCALE).clamp(-1.0, 1.0)
}

/// Receiver of normalized input deltas.
///
/// The adapter calls these from its dispatch step, on the driver's thread, once per change.
pub trait MessageHandler {
    fn on_analog_changed(&mut self, axis: AxisId, value: f32);
    fn on_button_pressed(&mut self, button: ButtonId, is_repeat: bool);
    fn on_button_released(&mut self, button: ButtonId, is_repeat: bool);
}

/// A sink that drops everything. Handy as a placeholder until the host installs its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHandler;

impl MessageHandler for NullHandler {
    fn on_analog_changed(&mut self, _axis: AxisId, _value: f32) {}
    fn on_button_pressed(&mut self, _button: ButtonId, _is_repeat: bool) {}
    fn on_button_released(&mut self, _button: ButtonId, _is_repeat: bool) {}
}

/// One input change as a value.
#[derive(Clone, Debug, PartialEq)]
pub enum InputKind {
    /// An axis changed. `value` is normalized to `[-1.0, 1.0]`.
    AxisMoved { axis: AxisId, value: f32 },

    /// A button transitioned to pressed.
    ButtonPressed { button: ButtonId, repeat: bool },

    /// A button transitioned to released.
    ButtonReleased { button: ButtonId, repeat: bool },
}

impl InputKind {
    #[inline]
    pub fn is_axis(&self) -> bool {
        matches!(self, InputKind::AxisMoved { .. })
    }

    #[inline]
    pub fn is_button(&self) -> bool {
        matches!(
            self,
            InputKind::ButtonPressed { .. } | InputKind::ButtonReleased { .. }
        )
    }
}

/// Timestamped input event.
#[derive(Clone, Debug)]
pub struct InputEvent {
    /// Capture time (monotonic).
    pub at: std::time::Instant,
    pub kind: InputKind,
}
