//! The device adapter: discovery, poll and dispatch for a single active device.
//!
//! Lifecycle:
//! 1. [`DeviceAdapter::initialize`] (once): enumerate, pick a device, open and acquire it.
//! 2. [`DeviceAdapter::poll`] (every frame): read raw state into `current`.
//! 3. [`DeviceAdapter::dispatch_events`] (every frame, after poll): report the differences
//!    between `previous` and `current` to the [`MessageHandler`], then commit `current`.
//!
//! # Selection policy
//! - The first enumerated device whose product name contains the vendor token
//!   (case-insensitive) is opened. Success ends enumeration.
//! - A preferred candidate that fails to open is abandoned for good; enumeration continues.
//! - The first device that does *not* match is remembered as the fallback and opened only
//!   if enumeration ends without an acquired device.
//! - Nothing found means `NotReady` for the rest of the run. There is no re-scan.
//!
//! # Failure handling
//! Nothing here returns an error to the caller. Failures are logged through `tracing`, the
//! most recent one is kept in [`DeviceAdapter::last_error`], and the adapter degrades to
//! emitting nothing.

use crate::config::AdapterConfig;
use crate::descriptor::DeviceDescriptor;
use crate::device::{
    CooperativeLevel, Device, DeviceBackend, EnumControl, ForceFeedbackChannel,
    ForceFeedbackValues, InputDevice,
};
use crate::dispatch::dispatch_changes;
use crate::error::{AdapterError, DeviceError};
use crate::event::MessageHandler;
use crate::format::DataFormat;
use crate::state::RawState;
use std::mem;
use tracing::{debug, info, trace, warn};

/// Whether the adapter holds a usable device.
///
/// `Ready` and `NotReady` are both terminal: a failed poll does not demote `Ready`, and
/// `NotReady` has no recovery path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    Uninitialized,
    Ready,
    NotReady,
}

impl Readiness {
    #[inline]
    pub fn is_ready(self) -> bool {
        self == Readiness::Ready
    }
}

pub struct DeviceAdapter<B: DeviceBackend> {
    backend: B,
    config: AdapterConfig,
    handler: Box<dyn MessageHandler>,
    device: Option<B::Device>,
    active: Option<DeviceDescriptor>,
    current: RawState,
    previous: RawState,
    readiness: Readiness,
    last_poll_ok: bool,
    last_error: Option<AdapterError>,
}

impl<B: DeviceBackend> DeviceAdapter<B> {
    /// Build an adapter without touching the backend. Call [`initialize`](Self::initialize)
    /// before polling.
    pub fn new(backend: B, config: AdapterConfig, handler: Box<dyn MessageHandler>) -> Self {
        Self {
            backend,
            config,
            handler,
            device: None,
            active: None,
            current: RawState::default(),
            previous: RawState::default(),
            readiness: Readiness::Uninitialized,
            last_poll_ok: false,
            last_error: None,
        }
    }

    /// Build and run discovery immediately.
    pub fn create(backend: B, config: AdapterConfig, handler: Box<dyn MessageHandler>) -> Self {
        let mut adapter = Self::new(backend, config, handler);
        adapter.initialize();
        adapter
    }

    /// Run discovery. Only the first call does any work; later calls return the
    /// readiness it produced.
    pub fn initialize(&mut self) -> Readiness {
        if self.readiness != Readiness::Uninitialized {
            return self.readiness;
        }

        self.readiness = match self.discover() {
            Ok((device, descriptor)) => {
                self.device = Some(device);
                self.active = Some(descriptor);
                Readiness::Ready
            }
            Err(err) => {
                warn!(error = %err, "input adapter disabled");
                self.last_error = Some(err);
                Readiness::NotReady
            }
        };
        self.readiness
    }

    fn discover(&self) -> Result<(B::Device, DeviceDescriptor), AdapterError> {
        let backend = &self.backend;
        let token = self.config.vendor_token.as_str();

        let mut selected: Option<(B::Device, DeviceDescriptor)> = None;
        let mut fallback: Option<DeviceDescriptor> = None;

        backend
            .enumerate(&mut |descriptor| {
                if !descriptor.matches_vendor(token) {
                    if fallback.is_none() {
                        trace!(device = %descriptor, "remembering fallback candidate");
                        fallback = Some(descriptor.clone());
                    }
                    return EnumControl::Continue;
                }

                match open_candidate(backend, descriptor) {
                    Ok(device) => {
                        info!(device = %descriptor.product_name, "initialized preferred device");
                        selected = Some((device, descriptor.clone()));
                        EnumControl::Stop
                    }
                    Err(err) => {
                        warn!(error = %err, "preferred candidate abandoned");
                        EnumControl::Continue
                    }
                }
            })
            .map_err(AdapterError::EnumerationFailure)?;

        if let Some(found) = selected {
            return Ok(found);
        }

        let Some(descriptor) = fallback else {
            return Err(AdapterError::NoDeviceFound);
        };
        info!(
            token,
            "no preferred device found; falling back to first detected device"
        );
        match open_candidate(backend, &descriptor) {
            Ok(device) => {
                info!(device = %descriptor.product_name, "initialized fallback device");
                Ok((device, descriptor))
            }
            Err(err) => {
                warn!(error = %err, "fallback candidate abandoned");
                Err(AdapterError::NoDeviceFound)
            }
        }
    }

    /// Read the device's current state.
    ///
    /// On failure the device is re-acquired and the read retried once, whether or not the
    /// re-acquire succeeded. Returns `false` when not ready or when the retry fails too; the
    /// following dispatch is then skipped.
    pub fn poll(&mut self) -> bool {
        self.last_poll_ok = false;
        if !self.readiness.is_ready() {
            return false;
        }
        let Some(device) = self.device.as_mut() else {
            return false;
        };

        let result = match read_device(device) {
            Ok(state) => Ok(state),
            Err(first) => {
                debug!(error = %first, "device read failed; re-acquiring");
                if let Err(err) = reacquire(device) {
                    debug!(error = %err, "re-acquire failed; retrying read anyway");
                }
                read_device(device)
            }
        };

        match result {
            Ok(state) => {
                self.current = state;
                self.last_poll_ok = true;
                true
            }
            Err(err) => {
                debug!(error = %err, "device read failed after re-acquire; skipping frame");
                self.last_error = Some(AdapterError::PollFailure(err));
                false
            }
        }
    }

    /// Report changes since the last dispatch, then commit the current state.
    ///
    /// Returns the number of events emitted. Does nothing when not ready or when the most
    /// recent poll failed.
    pub fn dispatch_events(&mut self) -> usize {
        if !self.readiness.is_ready() || !self.last_poll_ok {
            return 0;
        }

        let emitted = dispatch_changes(
            &self.previous,
            &self.current,
            self.config.button_identity,
            self.handler.as_mut(),
        );
        self.previous = self.current;

        if emitted > 0 {
            trace!(emitted, "dispatched input changes");
        }
        emitted
    }

    /// Swap the event sink. The new sink sees events from the next dispatch on.
    pub fn set_message_handler(
        &mut self,
        handler: Box<dyn MessageHandler>,
    ) -> Box<dyn MessageHandler> {
        mem::replace(&mut self.handler, handler)
    }

    #[inline]
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    /// Descriptor of the acquired device.
    pub fn active_device(&self) -> Option<&DeviceDescriptor> {
        self.active.as_ref()
    }

    /// Most recent failure the adapter swallowed.
    pub fn last_error(&self) -> Option<&AdapterError> {
        self.last_error.as_ref()
    }

    /// State committed by the last completed dispatch.
    pub fn previous_state(&self) -> &RawState {
        &self.previous
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: DeviceBackend> Drop for DeviceAdapter<B> {
    fn drop(&mut self) {
        if let Some(mut device) = self.device.take() {
            if let Err(err) = device.unacquire() {
                debug!(error = %err, "unacquire on teardown failed");
            }
            drop(device);
            debug!("released input device");
        }
    }
}

impl<B: DeviceBackend> Device for DeviceAdapter<B> {
    fn tick(&mut self, _delta_seconds: f32) {
        self.poll();
    }

    fn send_controller_events(&mut self) {
        self.dispatch_events();
    }

    fn set_message_handler(&mut self, handler: Box<dyn MessageHandler>) -> Box<dyn MessageHandler> {
        DeviceAdapter::set_message_handler(self, handler)
    }

    fn exec(&mut self, _command: &str) -> bool {
        false
    }

    /// No-op: force feedback is not supported.
    fn set_channel_value(&mut self, _player: i32, _channel: ForceFeedbackChannel, _value: f32) {}

    /// No-op: force feedback is not supported.
    fn set_channel_values(&mut self, _player: i32, _values: &ForceFeedbackValues) {}

    fn name(&self) -> Option<&str> {
        self.active.as_ref().map(|d| d.product_name.as_str())
    }

    fn id(&self) -> Option<&str> {
        self.active.as_ref().map(|d| d.instance_id.as_str())
    }
}

/// Create, configure and acquire one candidate. Any failing step drops the handle.
fn open_candidate<B: DeviceBackend>(
    backend: &B,
    descriptor: &DeviceDescriptor,
) -> Result<B::Device, AdapterError> {
    let fail = |source: DeviceError| AdapterError::CandidateOpenFailure {
        name: descriptor.product_name.clone(),
        source,
    };

    let mut device = backend.create_device(descriptor).map_err(fail)?;
    device.set_data_format(&DataFormat::joystick()).map_err(fail)?;
    device
        .set_cooperative_level(CooperativeLevel::BACKGROUND_NONEXCLUSIVE)
        .map_err(fail)?;
    device.acquire().map_err(fail)?;
    Ok(device)
}

fn read_device<D: InputDevice>(device: &mut D) -> Result<RawState, DeviceError> {
    device.poll()?;
    let mut state = RawState::default();
    device.read_state(&mut state)?;
    Ok(state)
}

/// Release-before-reacquire.
fn reacquire<D: InputDevice>(device: &mut D) -> Result<(), DeviceError> {
    if let Err(err) = device.unacquire() {
        trace!(error = %err, "unacquire before re-acquire failed");
    }
    device.acquire()
}
