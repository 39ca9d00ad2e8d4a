//! Fan-out sink.
//!
//! [`InputEventBus`] is a [`MessageHandler`] that timestamps every change and forwards it to
//! the registered [`InputListener`]s whose [`EventFilter`] accepts it. Install it as the
//! adapter's sink when more than one consumer needs the stream.

use crate::event::{AxisId, ButtonId, InputEvent, InputKind, MessageHandler};
use std::collections::BTreeMap;
use std::time::Instant;

/// Reacts to input events delivered by an [`InputEventBus`].
pub trait InputListener: Send {
    fn on_input(&mut self, event: &InputEvent);
}

/// Which kinds of events a listener wants.
#[derive(Debug, Clone, Copy)]
pub enum EventFilter {
    All,
    AxisOnly,
    ButtonsOnly,
    Custom(fn(&InputEvent) -> bool),
}

impl EventFilter {
    fn accepts(&self, event: &InputEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::AxisOnly => event.kind.is_axis(),
            EventFilter::ButtonsOnly => event.kind.is_button(),
            EventFilter::Custom(f) => f(event),
        }
    }
}

struct ListenerEntry {
    listener: Box<dyn InputListener>,
    enabled: bool,
    filter: EventFilter,
}

/// Listeners are notified in registration order.
#[derive(Default)]
pub struct InputEventBus {
    next_id: u64,
    listeners: BTreeMap<u64, ListenerEntry>,
}

impl InputEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns its id.
    pub fn add_listener(
        &mut self,
        listener: impl InputListener + 'static,
        filter: EventFilter,
    ) -> u64 {
        let id = self.next_id;
        self.listeners.insert(
            id,
            ListenerEntry {
                listener: Box::new(listener),
                enabled: true,
                filter,
            },
        );
        self.next_id += 1;
        id
    }

    pub fn enable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = true;
        }
    }

    /// Mutes a listener without removing it.
    pub fn disable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = false;
        }
    }

    pub fn remove_listener(&mut self, id: u64) {
        self.listeners.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Emits one event to all enabled, matching listeners.
    pub fn emit(&mut self, event: &InputEvent) {
        for entry in self.listeners.values_mut() {
            if entry.enabled && entry.filter.accepts(event) {
                entry.listener.on_input(event);
            }
        }
    }

    fn emit_kind(&mut self, kind: InputKind) {
        let event = InputEvent {
            at: Instant::now(),
            kind,
        };
        self.emit(&event);
    }
}

impl MessageHandler for InputEventBus {
    fn on_analog_changed(&mut self, axis: AxisId, value: f32) {
        self.emit_kind(InputKind::AxisMoved { axis, value });
    }

    fn on_button_pressed(&mut self, button: ButtonId, is_repeat: bool) {
        self.emit_kind(InputKind::ButtonPressed {
            button,
            repeat: is_repeat,
        });
    }

    fn on_button_released(&mut self, button: ButtonId, is_repeat: bool) {
        self.emit_kind(InputKind::ButtonReleased {
            button,
            repeat: is_repeat,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Record(Arc<Mutex<Vec<InputKind>>>);

    impl Record {
        fn kinds(&self) -> Vec<InputKind> {
            self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }
    }

    impl InputListener for Record {
        fn on_input(&mut self, event: &InputEvent) {
            self.0
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event.kind.clone());
        }
    }

    #[test]
    fn filters_route_by_kind() {
        let axes = Record::default();
        let buttons = Record::default();
        let mut bus = InputEventBus::new();
        bus.add_listener(axes.clone(), EventFilter::AxisOnly);
        bus.add_listener(buttons.clone(), EventFilter::ButtonsOnly);

        bus.on_analog_changed(AxisId::LeftX, 0.5);
        bus.on_button_pressed(ButtonId(1), false);
        bus.on_button_released(ButtonId(1), false);

        assert_eq!(
            axes.kinds(),
            vec![InputKind::AxisMoved {
                axis: AxisId::LeftX,
                value: 0.5
            }]
        );
        assert_eq!(buttons.kinds().len(), 2);
    }

    #[test]
    fn disabled_listener_is_skipped_until_enabled() {
        let rec = Record::default();
        let mut bus = InputEventBus::new();
        let id = bus.add_listener(rec.clone(), EventFilter::All);

        bus.disable(id);
        bus.on_button_pressed(ButtonId(0), false);
        assert!(rec.kinds().is_empty());

        bus.enable(id);
        bus.on_button_released(ButtonId(0), false);
        assert_eq!(rec.kinds().len(), 1);
    }

    #[test]
    fn custom_filter_and_removal() {
        fn left_trigger_only(e: &InputEvent) -> bool {
            matches!(e.kind, InputKind::AxisMoved { axis: AxisId::LeftTrigger, .. })
        }
        let rec = Record::default();
        let mut bus = InputEventBus::new();
        let id = bus.add_listener(rec.clone(), EventFilter::Custom(left_trigger_only));

        bus.on_analog_changed(AxisId::LeftX, 0.1);
        bus.on_analog_changed(AxisId::LeftTrigger, -1.0);
        assert_eq!(rec.kinds().len(), 1);

        bus.remove_listener(id);
        assert!(bus.is_empty());
        bus.on_analog_changed(AxisId::LeftTrigger, 0.0);
        assert_eq!(rec.kinds().len(), 1);
    }
}
