// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Long-press recognizer.

use kurbo::Point;

use canopy_arena::{GestureArenaEntry, GestureDisposition, PointerId};

use crate::event::{GestureEvent, GesturePointerEvent};
use crate::recognizer::{
    GestureRecognizer, LONG_PRESS_TIMEOUT_MILLISECONDS, RecognizerArenas, RecognizerId, TOUCH_SLOP,
};

/// Recognizes the primary pointer being held in place past the long-press
/// deadline.
///
/// Movement beyond the slop before the deadline rejects the press. The
/// deadline attempts capture; the single [`GestureEvent::LongPress`] fires
/// once the deadline has elapsed *and* the arena has accepted, with the
/// pointer still down. Whichever of the two happens second triggers the
/// emission, so winning the arena early (say, as the sole member) does not
/// fire a premature long-press.
pub struct LongPressGestureRecognizer<H: FnMut(GestureEvent)> {
    handler: H,
    entry: Option<GestureArenaEntry<RecognizerId>>,
    start: Point,
    down: bool,
    accepted: bool,
    deadline_fired: bool,
    emitted: bool,
    deadline: Option<u64>,
    last_timestamp: u64,
}

impl<H: FnMut(GestureEvent)> LongPressGestureRecognizer<H> {
    /// Create a long-press recognizer reporting to `handler`.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            entry: None,
            start: Point::ZERO,
            down: false,
            accepted: false,
            deadline_fired: false,
            emitted: false,
            deadline: None,
            last_timestamp: 0,
        }
    }

    fn emit(&mut self) {
        if self.emitted {
            return;
        }
        self.emitted = true;
        (self.handler)(GestureEvent::LongPress {
            timestamp: self.last_timestamp,
            position: self.start,
        });
    }

    fn reset(&mut self) {
        self.entry = None;
        self.down = false;
        self.accepted = false;
        self.deadline_fired = false;
        self.emitted = false;
        self.deadline = None;
    }
}

impl<H: FnMut(GestureEvent)> GestureRecognizer for LongPressGestureRecognizer<H> {
    fn add_pointer(
        &mut self,
        arenas: &mut RecognizerArenas,
        id: RecognizerId,
        event: &GesturePointerEvent,
    ) -> bool {
        if !event.is_primary || self.down {
            return false;
        }
        self.reset();
        self.down = true;
        self.start = event.position;
        self.last_timestamp = event.timestamp;
        self.deadline = Some(event.timestamp + LONG_PRESS_TIMEOUT_MILLISECONDS);
        self.entry = Some(arenas.add(event.pointer_id, id));
        true
    }

    fn pointer_moved(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent) {
        self.last_timestamp = event.timestamp;
        if self.emitted || event.position.distance(self.start) <= TOUCH_SLOP {
            return;
        }
        if let Some(entry) = self.entry.take() {
            arenas.resolve(entry, GestureDisposition::Rejected);
        }
    }

    fn pointer_released(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent) {
        self.last_timestamp = event.timestamp;
        self.down = false;
        if let Some(entry) = self.entry.take() {
            // Released before the press completed: this is some other gesture.
            arenas.resolve(entry, GestureDisposition::Rejected);
        } else {
            self.reset();
        }
    }

    fn pointer_canceled(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent) {
        self.last_timestamp = event.timestamp;
        if let Some(entry) = self.entry.take() {
            arenas.resolve(entry, GestureDisposition::Rejected);
        } else {
            self.reset();
        }
    }

    fn accept_gesture(&mut self, _arenas: &mut RecognizerArenas, _pointer: PointerId) {
        self.entry = None;
        self.accepted = true;
        if !self.down {
            self.reset();
            return;
        }
        if self.deadline_fired {
            self.emit();
        }
    }

    fn reject_gesture(&mut self, _arenas: &mut RecognizerArenas, _pointer: PointerId) {
        self.reset();
    }

    fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    fn deadline_elapsed(&mut self, arenas: &mut RecognizerArenas, now: u64) {
        if self.deadline.take().is_none() || !self.down {
            return;
        }
        self.last_timestamp = now;
        self.deadline_fired = true;
        if self.accepted {
            self.emit();
        } else if let Some(entry) = self.entry.take() {
            arenas.resolve(entry, GestureDisposition::Accepted);
        }
    }

    fn dispose(&mut self, arenas: &mut RecognizerArenas) {
        if let Some(entry) = self.entry.take() {
            arenas.resolve(entry, GestureDisposition::Rejected);
        }
        self.reset();
    }
}

impl<H: FnMut(GestureEvent)> core::fmt::Debug for LongPressGestureRecognizer<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LongPressGestureRecognizer")
            .field("down", &self.down)
            .field("accepted", &self.accepted)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
