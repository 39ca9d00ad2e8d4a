//! Delta dispatch: diff two raw states and report what changed.
//!
//! Only differences are reported. An axis whose raw value is unchanged emits nothing, and a
//! button only emits on a press or release edge.

use crate::event::{normalize_axis, AxisId, ButtonIdentity, MessageHandler};
use crate::state::{RawAxis, RawState, BUTTON_COUNT};

/// Raw axis → logical axis, in dispatch order.
pub const AXIS_MAP: [(RawAxis, AxisId); 4] = [
    (RawAxis::X, AxisId::LeftX),
    (RawAxis::Y, AxisId::LeftY),
    (RawAxis::Z, AxisId::RightTrigger),
    (RawAxis::Rz, AxisId::LeftTrigger),
];

/// Emit one event per difference between `previous` and `current`.
///
/// Axes are reported first (in [`AXIS_MAP`] order), then buttons by ascending index.
/// Returns the number of events emitted.
pub fn dispatch_changes(
    previous: &RawState,
    current: &RawState,
    identity: ButtonIdentity,
    sink: &mut dyn MessageHandler,
) -> usize {
    let mut emitted = 0;

    for (raw, axis) in AXIS_MAP {
        let (was, now) = (previous.axis(raw), current.axis(raw));
        if was != now {
            sink.on_analog_changed(axis, normalize_axis(now));
            emitted += 1;
        }
    }

    for index in 0..BUTTON_COUNT {
        let was_pressed = previous.button(index);
        let is_pressed = current.button(index);
        if was_pressed == is_pressed {
            continue;
        }
        let button = identity.resolve(index);
        if is_pressed {
            sink.on_button_pressed(button, false);
        } else {
            sink.on_button_released(button, false);
        }
        emitted += 1;
    }

    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ButtonId, InputKind};

    #[derive(Default)]
    struct Collect(Vec<InputKind>);

    impl MessageHandler for Collect {
        fn on_analog_changed(&mut self, axis: AxisId, value: f32) {
            self.0.push(InputKind::AxisMoved { axis, value });
        }
        fn on_button_pressed(&mut self, button: ButtonId, repeat: bool) {
            self.0.push(InputKind::ButtonPressed { button, repeat });
        }
        fn on_button_released(&mut self, button: ButtonId, repeat: bool) {
            self.0.push(InputKind::ButtonReleased { button, repeat });
        }
    }

    #[test]
    fn identical_states_emit_nothing() {
        let mut s = RawState {
            x: 1200,
            z: -5,
            ..RawState::default()
        };
        s.set_button(4, true);
        let mut sink = Collect::default();
        assert_eq!(dispatch_changes(&s, &s, ButtonIdentity::PerIndex, &mut sink), 0);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn axes_emit_normalized_current_value() {
        let prev = RawState::default();
        let cur = RawState {
            x: 32767,
            rz: -32768,
            ..RawState::default()
        };
        let mut sink = Collect::default();
        assert_eq!(dispatch_changes(&prev, &cur, ButtonIdentity::PerIndex, &mut sink), 2);
        assert_eq!(
            sink.0,
            vec![
                InputKind::AxisMoved {
                    axis: AxisId::LeftX,
                    value: 1.0
                },
                InputKind::AxisMoved {
                    axis: AxisId::LeftTrigger,
                    value: -1.0
                },
            ]
        );
    }

    #[test]
    fn button_edges_are_reported_once() {
        let mut prev = RawState::default();
        prev.set_button(9, true);
        let mut cur = RawState::default();
        cur.set_button(2, true);

        let mut sink = Collect::default();
        dispatch_changes(&prev, &cur, ButtonIdentity::PerIndex, &mut sink);
        assert_eq!(
            sink.0,
            vec![
                InputKind::ButtonPressed {
                    button: ButtonId(2),
                    repeat: false
                },
                InputKind::ButtonReleased {
                    button: ButtonId(9),
                    repeat: false
                },
            ]
        );
    }

    #[test]
    fn shared_identity_collapses_buttons() {
        let prev = RawState::default();
        let mut cur = RawState::default();
        cur.set_button(3, true);
        cur.set_button(30, true);

        let mut sink = Collect::default();
        dispatch_changes(&prev, &cur, ButtonIdentity::Shared, &mut sink);
        assert_eq!(sink.0.len(), 2);
        assert!(sink.0.iter().all(|e| matches!(
            e,
            InputKind::ButtonPressed { button, .. } if *button == ButtonId::FACE_BUTTON_BOTTOM
        )));
    }
}
