//! Device backends.
//!
//! Implementations of [`DeviceBackend`](crate::device::DeviceBackend):
//! - [`hid`]: real devices through `hidapi` (feature **`hid`**, on by default).
//! - [`virtual_input`]: scripted in-memory devices for tests, demos and headless hosts.

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;
pub mod virtual_input;

#[cfg(feature = "hid")]
use crate::{adapter::DeviceAdapter, config::AdapterConfig, event::MessageHandler};

/// Build an adapter over the default `hidapi` backend and run discovery.
///
/// Returns `None` when `config` fails [`AdapterConfig::validate`] or when the HID subsystem
/// cannot be initialized; there is no device to offer the host in either case.
#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub fn create_input_device(
    config: AdapterConfig,
    handler: Box<dyn MessageHandler>,
) -> Option<DeviceAdapter<hid::HidBackend>> {
    if let Err(err) = config.validate() {
        tracing::warn!(error = %err, "refusing to build input device");
        return None;
    }
    match hid::HidBackend::new(config.hid.clone()) {
        Ok(backend) => Some(DeviceAdapter::create(backend, config, handler)),
        Err(err) => {
            tracing::warn!(error = %err, "failed to initialize HID backend");
            None
        }
    }
}
