//! Device capability traits.
//!
//! Three seams:
//! - [`DeviceBackend`]: enumerates attached controller-class devices and opens them.
//! - [`InputDevice`]: one opened device; configure, acquire, poll and read raw state.
//!   Releasing the device is dropping it.
//! - [`Device`]: the contract a host's per-frame driver calls. [`DeviceAdapter`] is the
//!   implementation.
//!
//! [`DeviceAdapter`]: crate::adapter::DeviceAdapter

use crate::descriptor::DeviceDescriptor;
use crate::error::DeviceError;
use crate::event::MessageHandler;
use crate::format::DataFormat;
use crate::state::RawState;

/// Returned by an enumeration visitor to continue or stop early.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnumControl {
    Continue,
    Stop,
}

/// Access-sharing policy requested for an opened device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CooperativeLevel {
    /// Keep receiving input while the host application is not focused.
    pub background: bool,
    /// Deny other applications access to the device.
    pub exclusive: bool,
}

impl CooperativeLevel {
    /// Background-capable and shared with other applications.
    pub const BACKGROUND_NONEXCLUSIVE: CooperativeLevel = CooperativeLevel {
        background: true,
        exclusive: false,
    };
}

/// Source of attached devices.
pub trait DeviceBackend {
    type Device: InputDevice;

    /// Visit every attached controller-class device in backend order.
    ///
    /// Stops as soon as `visit` returns [`EnumControl::Stop`].
    fn enumerate(
        &self,
        visit: &mut dyn FnMut(&DeviceDescriptor) -> EnumControl,
    ) -> Result<(), DeviceError>;

    /// Create a handle for a previously enumerated device.
    fn create_device(&self, descriptor: &DeviceDescriptor) -> Result<Self::Device, DeviceError>;
}

/// One opened device.
///
/// Every call is independently fallible. Callers only look at success vs failure.
pub trait InputDevice {
    fn set_data_format(&mut self, format: &DataFormat) -> Result<(), DeviceError>;
    fn set_cooperative_level(&mut self, level: CooperativeLevel) -> Result<(), DeviceError>;
    fn acquire(&mut self) -> Result<(), DeviceError>;
    fn unacquire(&mut self) -> Result<(), DeviceError>;

    /// Refresh the device's state. Fails with e.g. [`DeviceError::InputLost`] when the
    /// device needs to be re-acquired.
    fn poll(&mut self) -> Result<(), DeviceError>;

    /// Copy the state captured by the last successful [`poll`](InputDevice::poll) into `out`.
    fn read_state(&mut self, out: &mut RawState) -> Result<(), DeviceError>;
}

/// Force-feedback motor channels a host may address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceFeedbackChannel {
    LeftLarge,
    LeftSmall,
    RightLarge,
    RightSmall,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForceFeedbackValues {
    pub left_large: f32,
    pub left_small: f32,
    pub right_large: f32,
    pub right_small: f32,
}

/// Contract between a host's frame driver and an input device implementation.
///
/// The driver calls [`tick`](Device::tick) then
/// [`send_controller_events`](Device::send_controller_events) once per frame.
pub trait Device {
    fn tick(&mut self, delta_seconds: f32);

    fn send_controller_events(&mut self);

    /// Replace the sink. Takes effect on the next dispatch; returns the previous sink.
    fn set_message_handler(&mut self, handler: Box<dyn MessageHandler>) -> Box<dyn MessageHandler>;

    /// Console command hook. Returns `true` if the command was handled.
    fn exec(&mut self, command: &str) -> bool;

    fn set_channel_value(&mut self, player: i32, channel: ForceFeedbackChannel, value: f32);

    fn set_channel_values(&mut self, player: i32, values: &ForceFeedbackValues);

    /// Friendly name of the active device, if any.
    fn name(&self) -> Option<&str>;

    /// Backend identifier of the active device, if any.
    fn id(&self) -> Option<&str>;
}
