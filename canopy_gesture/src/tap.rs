// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tap recognizer.

use bitflags::bitflags;
use kurbo::Point;

use canopy_arena::{GestureArenaEntry, GestureDisposition, PointerId};

use crate::event::{GestureEvent, GesturePointerEvent, TapAction};
use crate::recognizer::{
    GestureRecognizer, RecognizerArenas, RecognizerId, TAP_TIMEOUT_MILLISECONDS, TOUCH_SLOP,
};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    struct TapState: u8 {
        const POINTER_CAPTURED = 1;
        const POINTER_RELEASED = 1 << 1;
        const DEADLINE_EXCEEDED = 1 << 2;
    }
}

/// Recognizes a quick press-and-release of the primary pointer.
///
/// A [`TapAction::Down`] is announced either when the arena accepts this
/// recognizer or when the tap deadline passes while the pointer is still
/// down, whichever comes first. Movement past the slop gives up on the tap —
/// with a [`TapAction::Cancel`] if a down was already announced. A release
/// attempts capture; capture plus release completes the tap with
/// [`TapAction::Up`] and [`TapAction::Tap`].
pub struct TapGestureRecognizer<H: FnMut(GestureEvent)> {
    handler: H,
    entry: Option<GestureArenaEntry<RecognizerId>>,
    state: TapState,
    start: Point,
    last_timestamp: u64,
    deadline: Option<u64>,
}

impl<H: FnMut(GestureEvent)> TapGestureRecognizer<H> {
    /// Create a tap recognizer reporting to `handler`.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            entry: None,
            state: TapState::empty(),
            start: Point::ZERO,
            last_timestamp: 0,
            deadline: None,
        }
    }

    fn emit(&mut self, action: TapAction) {
        (self.handler)(GestureEvent::Tap {
            timestamp: self.last_timestamp,
            action,
            position: self.start,
        });
    }

    fn reset(&mut self) {
        self.entry = None;
        self.state = TapState::empty();
        self.deadline = None;
    }
}

impl<H: FnMut(GestureEvent)> GestureRecognizer for TapGestureRecognizer<H> {
    fn add_pointer(
        &mut self,
        arenas: &mut RecognizerArenas,
        id: RecognizerId,
        event: &GesturePointerEvent,
    ) -> bool {
        if !event.is_primary || self.entry.is_some() || !self.state.is_empty() {
            return false;
        }
        self.start = event.position;
        self.last_timestamp = event.timestamp;
        self.deadline = Some(event.timestamp + TAP_TIMEOUT_MILLISECONDS);
        self.entry = Some(arenas.add(event.pointer_id, id));
        true
    }

    fn pointer_moved(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent) {
        if self.entry.is_none() && self.state.is_empty() {
            return;
        }
        self.last_timestamp = event.timestamp;
        if event.position.distance(self.start) <= TOUCH_SLOP {
            return;
        }
        if let Some(entry) = self.entry.take() {
            // The rejection verdict performs the reset.
            arenas.resolve(entry, GestureDisposition::Rejected);
        } else if self.state.contains(TapState::POINTER_CAPTURED) {
            self.emit(TapAction::Cancel);
            self.reset();
        }
    }

    fn pointer_released(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent) {
        if self.entry.is_none() && self.state.is_empty() {
            return;
        }
        self.last_timestamp = event.timestamp;
        self.state |= TapState::POINTER_RELEASED;
        if self.state.contains(TapState::POINTER_CAPTURED) {
            self.emit(TapAction::Up);
            self.emit(TapAction::Tap);
            self.reset();
        } else if let Some(entry) = self.entry.take() {
            arenas.resolve(entry, GestureDisposition::Accepted);
        }
    }

    fn pointer_canceled(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent) {
        if self.entry.is_none() && self.state.is_empty() {
            return;
        }
        self.last_timestamp = event.timestamp;
        if let Some(entry) = self.entry.take() {
            arenas.resolve(entry, GestureDisposition::Rejected);
        } else if self.state.contains(TapState::POINTER_CAPTURED) {
            self.emit(TapAction::Cancel);
            self.reset();
        }
    }

    fn accept_gesture(&mut self, _arenas: &mut RecognizerArenas, _pointer: PointerId) {
        self.entry = None;
        self.state |= TapState::POINTER_CAPTURED;
        if !self.state.contains(TapState::DEADLINE_EXCEEDED) {
            self.deadline = None;
            self.emit(TapAction::Down);
        }
        if self.state.contains(TapState::POINTER_RELEASED) {
            self.emit(TapAction::Up);
            self.emit(TapAction::Tap);
            self.reset();
        }
    }

    fn reject_gesture(&mut self, _arenas: &mut RecognizerArenas, _pointer: PointerId) {
        if self
            .state
            .intersects(TapState::POINTER_CAPTURED | TapState::DEADLINE_EXCEEDED)
        {
            self.emit(TapAction::Cancel);
        }
        self.reset();
    }

    fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    fn deadline_elapsed(&mut self, _arenas: &mut RecognizerArenas, now: u64) {
        if self.deadline.take().is_none() {
            return;
        }
        self.last_timestamp = now;
        self.state |= TapState::DEADLINE_EXCEEDED;
        if !self.state.contains(TapState::POINTER_CAPTURED) {
            self.emit(TapAction::Down);
        }
    }

    fn dispose(&mut self, arenas: &mut RecognizerArenas) {
        if let Some(entry) = self.entry.take() {
            arenas.resolve(entry, GestureDisposition::Rejected);
        }
        self.reset();
    }
}

impl<H: FnMut(GestureEvent)> core::fmt::Debug for TapGestureRecognizer<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TapGestureRecognizer")
            .field("state", &self.state)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
