//! `hidapi` backend.
//!
//! Enumerates HID collections that look like game controls, opens them by path, and reads
//! input reports without blocking. Each opened device reads its report descriptor into a
//! [`ReportLayout`]; when the descriptor is unavailable or describes no axes or buttons the
//! device falls back to [`ReportLayout::fixed_joystick`]. Reports that don't fit the layout
//! (other report IDs, short reports) are skipped rather than failing the poll.
//!
//! This module does **not** open devices exclusively (hidapi has no such mode; requesting
//! it fails).

use crate::config::HidConfig;
use crate::descriptor::DeviceDescriptor;
use crate::device::{CooperativeLevel, DeviceBackend, EnumControl, InputDevice};
use crate::error::DeviceError;
use crate::format::DataFormat;
use crate::report::ReportLayout;
use crate::state::RawState;
use hidapi::{DeviceInfo, HidApi, HidDevice};
use std::ffi::CString;
use tracing::{debug, trace, warn};

/// Smallest read buffer (full-speed USB interrupt packet). Grown for larger layouts.
pub const MIN_REPORT_BUF: usize = 64;

/// Largest report descriptor hidapi hands out.
pub const MAX_DESCRIPTOR_LEN: usize = 4096;

/// Decide whether a `hidapi` entry is a controller-class device.
///
/// Accepted:
/// - Generic Desktop (`0x01`) Joystick `0x04`, Gamepad `0x05`, Multi-axis `0x08`
/// - Simulation Controls (`0x02`): wheels and pedals on some bases
fn accept_device(info: &DeviceInfo) -> bool {
    match info.usage_page() {
        0x01 => matches!(info.usage(), 0x04 | 0x05 | 0x08),
        0x02 => true,
        _ => false,
    }
}

fn descriptor(info: &DeviceInfo) -> DeviceDescriptor {
    let path = info.path().to_string_lossy().to_string();
    DeviceDescriptor {
        instance_id: path.clone(),
        product_name: info.product_string().unwrap_or("Unknown").to_string(),
        vendor_id: Some(info.vendor_id()),
        product_id: Some(info.product_id()),
        path: Some(path),
    }
}

pub struct HidBackend {
    api: HidApi,
    config: HidConfig,
}

impl HidBackend {
    pub fn new(config: HidConfig) -> Result<Self, DeviceError> {
        let api = HidApi::new().map_err(|e| DeviceError::Enumeration(e.to_string()))?;
        Ok(Self { api, config })
    }

    /// All controller-class devices, in enumeration order.
    pub fn descriptors(&self) -> Vec<DeviceDescriptor> {
        self.api
            .device_list()
            .filter(|info| accept_device(info))
            .map(descriptor)
            .collect()
    }
}

impl DeviceBackend for HidBackend {
    type Device = HidInputDevice;

    fn enumerate(
        &self,
        visit: &mut dyn FnMut(&DeviceDescriptor) -> EnumControl,
    ) -> Result<(), DeviceError> {
        for info in self.api.device_list() {
            if !accept_device(info) {
                continue;
            }
            if visit(&descriptor(info)) == EnumControl::Stop {
                break;
            }
        }
        Ok(())
    }

    fn create_device(&self, descriptor: &DeviceDescriptor) -> Result<HidInputDevice, DeviceError> {
        let create_err = |reason: String| DeviceError::Create {
            instance_id: descriptor.instance_id.clone(),
            reason,
        };
        let path = CString::new(descriptor.instance_id.as_bytes())
            .map_err(|e| create_err(e.to_string()))?;
        let raw = self
            .api
            .open_path(&path)
            .map_err(|e| create_err(e.to_string()))?;
        let layout = report_layout(&raw, &descriptor.product_name);
        Ok(HidInputDevice::new(raw, layout, self.config.reports_per_tick()))
    }
}

fn report_layout(raw: &HidDevice, name: &str) -> ReportLayout {
    let mut buf = [0u8; MAX_DESCRIPTOR_LEN];
    let parsed = raw
        .get_report_descriptor(&mut buf)
        .map_err(|e| DeviceError::Report(e.to_string()))
        .and_then(|n| ReportLayout::from_descriptor(&buf[..n]));
    match parsed {
        Ok(layout) => {
            debug!(
                device = name,
                report_id = ?layout.report_id(),
                axes = layout.axis_count(),
                buttons = layout.button_count(),
                "report layout from descriptor"
            );
            layout
        }
        Err(err) => {
            warn!(
                device = name,
                error = %err,
                "no usable report descriptor; assuming fixed joystick layout"
            );
            ReportLayout::fixed_joystick()
        }
    }
}

/// Opened HID device.
///
/// `poll` drains up to `max_reports_per_tick` pending reports and keeps the newest one that
/// decodes; `read_state` hands that out.
pub struct HidInputDevice {
    raw: HidDevice,
    layout: ReportLayout,
    active: Option<ReportLayout>,
    buf: Vec<u8>,
    latest: RawState,
    acquired: bool,
    max_reports_per_tick: usize,
}

impl HidInputDevice {
    fn new(raw: HidDevice, layout: ReportLayout, max_reports_per_tick: usize) -> Self {
        let buf_len = layout.report_len().max(MIN_REPORT_BUF);
        Self {
            raw,
            layout,
            active: None,
            buf: vec![0u8; buf_len],
            latest: RawState::default(),
            acquired: false,
            max_reports_per_tick: max_reports_per_tick.max(1),
        }
    }

    /// Layout derived for this device, before any data format narrows it.
    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }
}

impl InputDevice for HidInputDevice {
    fn set_data_format(&mut self, format: &DataFormat) -> Result<(), DeviceError> {
        format.validate()?;
        let active = self.layout.restrict(format);
        if active.axis_count() == 0 && active.button_count() == 0 {
            return Err(DeviceError::DataFormat(
                "device reports none of the requested controls".into(),
            ));
        }
        self.active = Some(active);
        Ok(())
    }

    fn set_cooperative_level(&mut self, level: CooperativeLevel) -> Result<(), DeviceError> {
        if level.exclusive {
            return Err(DeviceError::CooperativeLevel(
                "exclusive access is not supported".into(),
            ));
        }
        // hidapi handles are shared and keep reading when unfocused, so background access is
        // the native behavior. Non-blocking reads keep `poll` inside the frame.
        self.raw
            .set_blocking_mode(false)
            .map_err(|e| DeviceError::CooperativeLevel(e.to_string()))
    }

    fn acquire(&mut self) -> Result<(), DeviceError> {
        if self.active.is_none() {
            return Err(DeviceError::Acquire("data format not set".into()));
        }
        self.acquired = true;
        Ok(())
    }

    fn unacquire(&mut self) -> Result<(), DeviceError> {
        self.acquired = false;
        Ok(())
    }

    fn poll(&mut self) -> Result<(), DeviceError> {
        if !self.acquired {
            return Err(DeviceError::NotAcquired);
        }
        let Some(layout) = self.active.as_ref() else {
            return Err(DeviceError::NotAcquired);
        };

        let mut drained = 0;
        while drained < self.max_reports_per_tick {
            match self.raw.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => {
                    drained += 1;
                    if let Err(err) = layout.decode(&self.buf[..n], &mut self.latest) {
                        trace!(error = %err, len = n, "skipping report");
                    }
                }
                Err(e) => return Err(DeviceError::Poll(e.to_string())),
            }
        }
        Ok(())
    }

    fn read_state(&mut self, out: &mut RawState) -> Result<(), DeviceError> {
        if !self.acquired {
            return Err(DeviceError::NotAcquired);
        }
        *out = self.latest;
        Ok(())
    }
}
