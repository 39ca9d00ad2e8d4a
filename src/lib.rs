//! wheelpoll: polling input adapter for wheels and game controllers.
//!
//! Finds a preferred device by product name (falling back to the first controller found),
//! polls its raw state once per frame, and reports only what changed to a
//! [`MessageHandler`].
//!
//! ```no_run
//! use wheelpoll::{create_input_device, AdapterConfig, Device, NullHandler};
//!
//! let mut device = create_input_device(AdapterConfig::default(), Box::new(NullHandler))
//!     .expect("HID backend");
//! loop {
//!     device.tick(1.0 / 60.0);
//!     device.send_controller_events();
//! #   break;
//! }
//! ```

pub mod adapter;
pub mod backends;
pub mod config;
pub mod descriptor;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod filtered_listener;
pub mod format;
pub mod logger;
pub mod report;
pub mod state;

pub use adapter::*;
#[cfg(feature = "hid")]
pub use backends::create_input_device;
pub use config::{AdapterConfig, HidConfig};
pub use descriptor::*;
pub use device::*;
pub use error::*;
pub use event::*;
pub use eventbus::*;
pub use state::*;
