//! Enumeration records.
//!
//! A [`DeviceDescriptor`] is what a backend hands the adapter for every attached
//! controller-class device during discovery. It is only kept past discovery for the device
//! that ends up acquired (see [`DeviceAdapter::active_device`](crate::adapter::DeviceAdapter::active_device)).
//!
//! # Conventions
//! - `instance_id` is the backend's opaque handle for reopening the device (a HID path for
//!   the hidapi backend, a synthetic `virtual:N` id for the virtual backend).
//! - `product_name` is the friendly, OS-reported name. Vendor matching runs against it.
//! - USB fields are best-effort; unknown values remain `None`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Opaque backend identifier used by `create_device`.
    pub instance_id: String,

    /// Human-readable product name, e.g. `"MOZA R9 Base"`.
    pub product_name: String,

    /// USB Vendor ID (VID), if known.
    pub vendor_id: Option<u16>,

    /// USB Product ID (PID), if known.
    pub product_id: Option<u16>,

    /// OS/topological path, if known. Diagnostic only.
    pub path: Option<String>,
}

impl DeviceDescriptor {
    pub fn new(instance_id: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            product_name: product_name.into(),
            ..Self::default()
        }
    }

    /// Case-insensitive substring match of `token` against the product name.
    ///
    /// An empty token matches nothing.
    pub fn matches_vendor(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        self.product_name
            .to_lowercase()
            .contains(&token.to_lowercase())
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.product_name, self.instance_id)?;
        if let (Some(vid), Some(pid)) = (self.vendor_id, self.product_id) {
            write!(f, " {vid:04x}:{pid:04x}")?;
        }
        Ok(())
    }
}
