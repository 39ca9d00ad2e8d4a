#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use wheelpoll::backends::virtual_input::{VirtualBackend, VirtualDeviceHandle};
use wheelpoll::{
    AdapterConfig, AxisId, ButtonId, DeviceAdapter, InputEvent, InputKind, InputListener,
    MessageHandler,
};

/// Sink that records everything it receives. Clones share the same log.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<InputKind>>>);

impl Recorder {
    pub fn boxed(&self) -> Box<dyn MessageHandler> {
        Box::new(self.clone())
    }

    /// Drain recorded events.
    pub fn take(&self) -> Vec<InputKind> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl MessageHandler for Recorder {
    fn on_analog_changed(&mut self, axis: AxisId, value: f32) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(InputKind::AxisMoved { axis, value });
    }

    fn on_button_pressed(&mut self, button: ButtonId, is_repeat: bool) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(InputKind::ButtonPressed {
                button,
                repeat: is_repeat,
            });
    }

    fn on_button_released(&mut self, button: ButtonId, is_repeat: bool) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(InputKind::ButtonReleased {
                button,
                repeat: is_repeat,
            });
    }
}

impl InputListener for Recorder {
    fn on_input(&mut self, event: &InputEvent) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.kind.clone());
    }
}

/// Backend with one device per name, in order.
pub fn backend_with(names: &[&str]) -> (VirtualBackend, Vec<VirtualDeviceHandle>) {
    let mut backend = VirtualBackend::new();
    let handles = names.iter().map(|n| backend.add_device(n)).collect();
    (backend, handles)
}

/// Initialized adapter over a single device, plus its handle and recorder.
pub fn single_device_adapter(
    name: &str,
) -> (DeviceAdapter<VirtualBackend>, VirtualDeviceHandle, Recorder) {
    let (backend, mut handles) = backend_with(&[name]);
    let recorder = Recorder::default();
    let adapter = DeviceAdapter::create(backend, AdapterConfig::default(), recorder.boxed());
    (adapter, handles.remove(0), recorder)
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
