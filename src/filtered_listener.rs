//! Listener wrapper that decides per event whether to pass it on.

use crate::event::{AxisId, InputEvent, InputKind};
use crate::eventbus::InputListener;
use std::collections::HashMap;

/// Forwards an event to `inner` only when the predicate returns `true`.
///
/// The predicate is `FnMut` and may keep state between events; stateless routing by event
/// kind is what [`EventFilter`](crate::eventbus::EventFilter) is for.
pub struct FilteredListener {
    predicate: Box<dyn FnMut(&InputEvent) -> bool + Send>,
    inner: Box<dyn InputListener>,
    passed: u64,
    dropped: u64,
}

impl FilteredListener {
    pub fn new(
        predicate: impl FnMut(&InputEvent) -> bool + Send + 'static,
        inner: impl InputListener + 'static,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner: Box::new(inner),
            passed: 0,
            dropped: 0,
        }
    }

    /// Suppress axis jitter.
    ///
    /// An axis event passes when it is the first for that axis, when it moved at least
    /// `min_delta` (normalized units) from the last value passed for that axis, or when it
    /// lands exactly on center or an end stop. Button events always pass.
    pub fn axis_threshold(min_delta: f32, inner: impl InputListener + 'static) -> Self {
        let mut last: HashMap<AxisId, f32> = HashMap::new();
        Self::new(
            move |event| {
                let InputKind::AxisMoved { axis, value } = event.kind else {
                    return true;
                };
                let settled = value == 0.0 || value.abs() == 1.0;
                let jitter = last
                    .get(&axis)
                    .is_some_and(|prev| (value - prev).abs() < min_delta);
                let pass = settled || !jitter;
                if pass {
                    last.insert(axis, value);
                }
                pass
            },
            inner,
        )
    }

    /// Events forwarded so far.
    pub fn passed(&self) -> u64 {
        self.passed
    }

    /// Events held back so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl InputListener for FilteredListener {
    fn on_input(&mut self, event: &InputEvent) {
        if (self.predicate)(event) {
            self.passed += 1;
            self.inner.on_input(event);
        } else {
            self.dropped += 1;
        }
    }
}
