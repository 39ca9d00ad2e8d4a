//! In-memory backend with scripted devices.
//!
//! [`VirtualBackend`] enumerates devices added with [`VirtualBackend::add_device`]. Each one
//! comes with a [`VirtualDeviceHandle`] that shares state with the opened device, so a test
//! or demo can move axes, press buttons and inject failures after the adapter owns the
//! backend.
//!
//! Failure injection:
//! - [`VirtualBackend::fail_enumeration`]: the enumeration call itself fails.
//! - [`VirtualDeviceHandle::fail_at`]: one open/configure/acquire step always fails.
//! - [`VirtualDeviceHandle::fail_next_polls`]: the next `n` polls fail.
//! - [`VirtualDeviceHandle::lose_input`]: polls fail until the device is re-acquired.

use crate::descriptor::DeviceDescriptor;
use crate::device::{CooperativeLevel, DeviceBackend, EnumControl, InputDevice};
use crate::error::DeviceError;
use crate::format::DataFormat;
use crate::state::{RawAxis, RawState};
use std::sync::{Arc, Mutex, MutexGuard};

/// Open/configure step that can be scripted to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenStep {
    Create,
    DataFormat,
    CooperativeLevel,
    Acquire,
}

#[derive(Debug, Default)]
struct Shared {
    state: RawState,
    fail_at: Option<OpenStep>,
    failing_polls: usize,
    input_lost: bool,
    acquired: bool,
    format: Option<DataFormat>,
    cooperative: Option<CooperativeLevel>,
    opens: usize,
    acquires: usize,
    unacquires: usize,
    polls: usize,
    live_handles: usize,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|e| e.into_inner())
}

/// Test-side view of one virtual device.
#[derive(Clone, Debug)]
pub struct VirtualDeviceHandle {
    descriptor: DeviceDescriptor,
    shared: Arc<Mutex<Shared>>,
}

impl VirtualDeviceHandle {
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    /// Replace the whole raw state the device reports.
    pub fn set_state(&self, state: RawState) {
        lock(&self.shared).state = state;
    }

    pub fn state(&self) -> RawState {
        lock(&self.shared).state
    }

    pub fn set_axis(&self, axis: RawAxis, value: i32) {
        lock(&self.shared).state.set_axis(axis, value);
    }

    pub fn press_button(&self, index: usize) {
        lock(&self.shared).state.set_button(index, true);
    }

    pub fn release_button(&self, index: usize) {
        lock(&self.shared).state.set_button(index, false);
    }

    /// Make `step` fail on every attempt.
    pub fn fail_at(&self, step: OpenStep) {
        lock(&self.shared).fail_at = Some(step);
    }

    /// Fail the next `count` polls, then recover.
    pub fn fail_next_polls(&self, count: usize) {
        lock(&self.shared).failing_polls = count;
    }

    /// Fail polls until the device is acquired again.
    pub fn lose_input(&self) {
        lock(&self.shared).input_lost = true;
    }

    pub fn is_acquired(&self) -> bool {
        lock(&self.shared).acquired
    }

    pub fn has_data_format(&self) -> bool {
        lock(&self.shared).format.is_some()
    }

    pub fn cooperative_level(&self) -> Option<CooperativeLevel> {
        lock(&self.shared).cooperative
    }

    /// Successful `create_device` calls.
    pub fn open_count(&self) -> usize {
        lock(&self.shared).opens
    }

    pub fn acquire_count(&self) -> usize {
        lock(&self.shared).acquires
    }

    pub fn unacquire_count(&self) -> usize {
        lock(&self.shared).unacquires
    }

    pub fn poll_count(&self) -> usize {
        lock(&self.shared).polls
    }

    /// Opened device handles not yet dropped.
    pub fn live_handles(&self) -> usize {
        lock(&self.shared).live_handles
    }
}

/// Backend over [`VirtualDeviceHandle`]s, enumerated in insertion order.
#[derive(Debug, Default)]
pub struct VirtualBackend {
    devices: Vec<VirtualDeviceHandle>,
    enumeration_error: Option<String>,
    visited: Mutex<usize>,
    open_attempts: Mutex<Vec<String>>,
}

impl VirtualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device with the given product name. Its id is `virtual:{n}`.
    pub fn add_device(&mut self, product_name: &str) -> VirtualDeviceHandle {
        let descriptor =
            DeviceDescriptor::new(format!("virtual:{}", self.devices.len()), product_name);
        let handle = VirtualDeviceHandle {
            descriptor,
            shared: Arc::new(Mutex::new(Shared::default())),
        };
        self.devices.push(handle.clone());
        handle
    }

    pub fn fail_enumeration(&mut self, reason: &str) {
        self.enumeration_error = Some(reason.to_string());
    }

    /// Product names passed to `create_device`, in call order.
    pub fn open_attempts(&self) -> Vec<String> {
        self.open_attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Descriptors handed to enumeration visitors so far.
    pub fn visited(&self) -> usize {
        *self.visited.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DeviceBackend for VirtualBackend {
    type Device = VirtualDevice;

    fn enumerate(
        &self,
        visit: &mut dyn FnMut(&DeviceDescriptor) -> EnumControl,
    ) -> Result<(), DeviceError> {
        if let Some(reason) = &self.enumeration_error {
            return Err(DeviceError::Enumeration(reason.clone()));
        }
        for handle in &self.devices {
            *self.visited.lock().unwrap_or_else(|e| e.into_inner()) += 1;
            if visit(&handle.descriptor) == EnumControl::Stop {
                break;
            }
        }
        Ok(())
    }

    fn create_device(&self, descriptor: &DeviceDescriptor) -> Result<VirtualDevice, DeviceError> {
        self.open_attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(descriptor.product_name.clone());

        let handle = self
            .devices
            .iter()
            .find(|h| h.descriptor.instance_id == descriptor.instance_id)
            .ok_or_else(|| DeviceError::Create {
                instance_id: descriptor.instance_id.clone(),
                reason: "no such device".into(),
            })?;

        let mut shared = lock(&handle.shared);
        if shared.fail_at == Some(OpenStep::Create) {
            return Err(DeviceError::Create {
                instance_id: descriptor.instance_id.clone(),
                reason: "scripted failure".into(),
            });
        }
        shared.opens += 1;
        shared.live_handles += 1;
        drop(shared);

        Ok(VirtualDevice {
            shared: Arc::clone(&handle.shared),
            latched: RawState::default(),
        })
    }
}

/// Device opened from a [`VirtualBackend`].
#[derive(Debug)]
pub struct VirtualDevice {
    shared: Arc<Mutex<Shared>>,
    latched: RawState,
}

impl InputDevice for VirtualDevice {
    fn set_data_format(&mut self, format: &DataFormat) -> Result<(), DeviceError> {
        let mut shared = lock(&self.shared);
        if shared.fail_at == Some(OpenStep::DataFormat) {
            return Err(DeviceError::DataFormat("scripted failure".into()));
        }
        format.validate()?;
        shared.format = Some(format.clone());
        Ok(())
    }

    fn set_cooperative_level(&mut self, level: CooperativeLevel) -> Result<(), DeviceError> {
        let mut shared = lock(&self.shared);
        if shared.fail_at == Some(OpenStep::CooperativeLevel) {
            return Err(DeviceError::CooperativeLevel("scripted failure".into()));
        }
        shared.cooperative = Some(level);
        Ok(())
    }

    fn acquire(&mut self) -> Result<(), DeviceError> {
        let mut shared = lock(&self.shared);
        shared.acquires += 1;
        if shared.fail_at == Some(OpenStep::Acquire) {
            return Err(DeviceError::Acquire("scripted failure".into()));
        }
        shared.acquired = true;
        shared.input_lost = false;
        Ok(())
    }

    fn unacquire(&mut self) -> Result<(), DeviceError> {
        let mut shared = lock(&self.shared);
        shared.unacquires += 1;
        shared.acquired = false;
        Ok(())
    }

    fn poll(&mut self) -> Result<(), DeviceError> {
        let mut shared = lock(&self.shared);
        shared.polls += 1;
        if !shared.acquired {
            return Err(DeviceError::NotAcquired);
        }
        if shared.input_lost {
            return Err(DeviceError::InputLost);
        }
        if shared.failing_polls > 0 {
            shared.failing_polls -= 1;
            return Err(DeviceError::Poll("scripted failure".into()));
        }
        self.latched = shared.state;
        Ok(())
    }

    fn read_state(&mut self, out: &mut RawState) -> Result<(), DeviceError> {
        if !lock(&self.shared).acquired {
            return Err(DeviceError::NotAcquired);
        }
        *out = self.latched;
        Ok(())
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        let mut shared = lock(&self.shared);
        shared.live_handles = shared.live_handles.saturating_sub(1);
        shared.acquired = false;
    }
}
