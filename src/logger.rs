use crate::event::{InputEvent, InputKind};
use crate::eventbus::InputListener;
use tracing::info;

/// Listener that writes every input event to the `tracing` log at `info` level.
#[derive(Debug, Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Logger
    }
}

impl InputListener for Logger {
    fn on_input(&mut self, event: &InputEvent) {
        match &event.kind {
            InputKind::AxisMoved { axis, value } => info!(%axis, value, "axis"),
            InputKind::ButtonPressed { button, .. } => info!(%button, "pressed"),
            InputKind::ButtonReleased { button, .. } => info!(%button, "released"),
        }
    }
}
