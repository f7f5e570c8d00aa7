// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag (pan) recognizer.

use kurbo::{Point, Vec2};

use canopy_arena::{GestureArenaEntry, GestureDisposition, PointerId};
use canopy_velocity::VelocityTracker;

use crate::event::{DragAction, GestureEvent, GesturePointerEvent};
use crate::recognizer::{
    GestureRecognizer, RecognizerArenas, RecognizerId, TOUCH_SLOP, fling_velocity,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DragState {
    Ready,
    /// Tracking the pointer, capture not yet attempted.
    Possible,
    /// Captured and emitting updates.
    Started,
}

/// Recognizes the primary pointer being dragged.
///
/// [`DragAction::Down`] fires on engagement. Total movement beyond the slop
/// attempts capture; acceptance fires [`DragAction::Start`] and every later
/// move a [`DragAction::Update`] carrying the per-move delta. Release fires
/// [`DragAction::End`] with the fling-qualified velocity, if any; losing the
/// arena after the down was announced fires [`DragAction::Cancel`].
pub struct DragGestureRecognizer<H: FnMut(GestureEvent)> {
    handler: H,
    entry: Option<GestureArenaEntry<RecognizerId>>,
    state: DragState,
    start: Point,
    last_position: Point,
    last_timestamp: u64,
    released: bool,
    tracker: VelocityTracker,
}

impl<H: FnMut(GestureEvent)> DragGestureRecognizer<H> {
    /// Create a drag recognizer reporting to `handler`.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            entry: None,
            state: DragState::Ready,
            start: Point::ZERO,
            last_position: Point::ZERO,
            last_timestamp: 0,
            released: false,
            tracker: VelocityTracker::new(),
        }
    }

    fn emit(&mut self, action: DragAction, delta: Vec2, velocity: Option<Vec2>) {
        (self.handler)(GestureEvent::Drag {
            timestamp: self.last_timestamp,
            action,
            position: self.last_position,
            delta,
            velocity,
        });
    }

    fn end(&mut self) {
        let velocity = fling_velocity(&self.tracker);
        self.emit(DragAction::End, Vec2::ZERO, velocity);
        self.reset();
    }

    fn reset(&mut self) {
        self.entry = None;
        self.state = DragState::Ready;
        self.released = false;
        self.tracker.reset();
    }
}

impl<H: FnMut(GestureEvent)> GestureRecognizer for DragGestureRecognizer<H> {
    fn add_pointer(
        &mut self,
        arenas: &mut RecognizerArenas,
        id: RecognizerId,
        event: &GesturePointerEvent,
    ) -> bool {
        if !event.is_primary || self.state != DragState::Ready {
            return false;
        }
        self.state = DragState::Possible;
        self.start = event.position;
        self.last_position = event.position;
        self.last_timestamp = event.timestamp;
        self.released = false;
        self.tracker.reset();
        self.tracker.add_position(event.timestamp, event.position);
        self.entry = Some(arenas.add(event.pointer_id, id));
        self.emit(DragAction::Down, Vec2::ZERO, None);
        true
    }

    fn pointer_moved(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent) {
        let delta = event.position - self.last_position;
        self.last_position = event.position;
        self.last_timestamp = event.timestamp;
        self.tracker.add_position(event.timestamp, event.position);

        match self.state {
            DragState::Possible => {
                if event.position.distance(self.start) > TOUCH_SLOP
                    && let Some(entry) = self.entry.take()
                {
                    arenas.resolve(entry, GestureDisposition::Accepted);
                }
            }
            DragState::Started => {
                self.emit(DragAction::Update, delta, None);
            }
            DragState::Ready => {}
        }
    }

    fn pointer_released(&mut self, _arenas: &mut RecognizerArenas, event: &GesturePointerEvent) {
        if self.state == DragState::Ready {
            return;
        }
        self.last_timestamp = event.timestamp;
        self.released = true;
        if self.state == DragState::Started {
            self.end();
        }
        // While still `Possible`, hold the membership: the sweep may yet hand
        // the pointer over, which completes as a zero-length drag.
    }

    fn pointer_canceled(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent) {
        self.last_timestamp = event.timestamp;
        if let Some(entry) = self.entry.take() {
            arenas.resolve(entry, GestureDisposition::Rejected);
        } else if self.state != DragState::Ready {
            self.emit(DragAction::Cancel, Vec2::ZERO, None);
            self.reset();
        }
    }

    fn accept_gesture(&mut self, _arenas: &mut RecognizerArenas, _pointer: PointerId) {
        self.entry = None;
        if self.state != DragState::Possible {
            return;
        }
        self.state = DragState::Started;
        self.emit(DragAction::Start, Vec2::ZERO, None);
        if self.released {
            self.end();
        }
    }

    fn reject_gesture(&mut self, _arenas: &mut RecognizerArenas, _pointer: PointerId) {
        if self.state != DragState::Ready {
            self.emit(DragAction::Cancel, Vec2::ZERO, None);
        }
        self.reset();
    }

    fn dispose(&mut self, arenas: &mut RecognizerArenas) {
        if let Some(entry) = self.entry.take() {
            arenas.resolve(entry, GestureDisposition::Rejected);
        }
        self.reset();
    }
}

impl<H: FnMut(GestureEvent)> core::fmt::Debug for DragGestureRecognizer<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DragGestureRecognizer")
            .field("state", &self.state)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
