// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scale (pinch) recognizer.

use alloc::collections::BTreeMap;

use kurbo::{Point, Vec2};
use smallvec::SmallVec;

use canopy_arena::{GestureArenaEntry, GestureDisposition, PointerId};
use canopy_velocity::VelocityTracker;

use crate::event::{GestureEvent, GesturePointerEvent, ScaleAction};
use crate::recognizer::{
    GestureRecognizer, RecognizerArenas, RecognizerId, SCALE_SLOP, fling_velocity,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScaleState {
    Ready,
    /// Tracking pointers, pinch not recognized yet.
    Possible,
    /// A pinch ended but pointers are still down; a new span divergence
    /// restarts it.
    Accepted,
    /// Emitting updates.
    Started,
}

/// Recognizes a two-pointer pinch.
///
/// The *span* is the mean distance of the tracked pointers from their focal
/// point (their mean position). The pinch is claimed only once the span has
/// diverged from the span measured at engagement by more than
/// [`SCALE_SLOP`](crate::recognizer::SCALE_SLOP) pixels, so jitter never
/// steals pointers from other recognizers, and [`ScaleAction::Start`] fires
/// only when both pointers' arenas have accepted this recognizer. Each
/// pointer feeds its own velocity tracker; a release while pinching reports a
/// fling velocity on the [`ScaleAction::End`] event when it qualifies.
pub struct ScaleGestureRecognizer<H: FnMut(GestureEvent)> {
    handler: H,
    state: ScaleState,
    initial_span: f64,
    current_span: f64,
    focal_point: Point,
    pointers: SmallVec<[(PointerId, Point); 2]>,
    /// Unresolved arena memberships.
    entries: SmallVec<[GestureArenaEntry<RecognizerId>; 2]>,
    /// Pointers whose arenas have accepted this recognizer.
    captured: SmallVec<[PointerId; 2]>,
    /// The span diverged past the slop and capture is under way.
    claimed: bool,
    trackers: BTreeMap<PointerId, VelocityTracker>,
    last_timestamp: u64,
}

impl<H: FnMut(GestureEvent)> ScaleGestureRecognizer<H> {
    /// Create a scale recognizer reporting to `handler`.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            state: ScaleState::Ready,
            initial_span: 0.0,
            current_span: 0.0,
            focal_point: Point::ZERO,
            pointers: SmallVec::new(),
            entries: SmallVec::new(),
            captured: SmallVec::new(),
            claimed: false,
            trackers: BTreeMap::new(),
            last_timestamp: 0,
        }
    }

    fn scale_factor(&self) -> f64 {
        if self.initial_span > 0.0 {
            self.current_span / self.initial_span
        } else {
            1.0
        }
    }

    fn update_spans(&mut self) {
        let count = self.pointers.len();
        if count == 0 {
            self.focal_point = Point::ZERO;
            self.current_span = 0.0;
            return;
        }
        let mut sum = Vec2::ZERO;
        for (_, position) in &self.pointers {
            sum += position.to_vec2();
        }
        let focal_point = (sum / count as f64).to_point();

        let mut total_deviation = 0.0;
        for (_, position) in &self.pointers {
            total_deviation += focal_point.distance(*position);
        }
        self.focal_point = focal_point;
        self.current_span = total_deviation / count as f64;
    }

    fn emit(&mut self, action: ScaleAction, scale: f64, velocity: Option<Vec2>) {
        (self.handler)(GestureEvent::Scale {
            timestamp: self.last_timestamp,
            action,
            focal_point: self.focal_point,
            scale,
            velocity,
        });
    }

    /// Claim the pinch: capture whatever memberships are still unresolved, or
    /// start straight away when the arenas already accepted us.
    fn claim(&mut self, arenas: &mut RecognizerArenas) {
        self.claimed = true;
        if self.entries.is_empty() {
            self.try_start();
        } else {
            for entry in core::mem::take(&mut self.entries) {
                arenas.resolve(entry, GestureDisposition::Accepted);
            }
        }
    }

    fn try_start(&mut self) {
        let both_captured = self.pointers.len() == 2
            && self
                .pointers
                .iter()
                .all(|(id, _)| self.captured.contains(id));
        if matches!(self.state, ScaleState::Possible | ScaleState::Accepted) && both_captured {
            self.state = ScaleState::Started;
            self.claimed = false;
            self.emit(ScaleAction::Start, 1.0, None);
            let factor = self.scale_factor();
            self.emit(ScaleAction::Update, factor, None);
        }
    }

    /// Drop one pointer's tracking state, returning its velocity tracker.
    fn remove_pointer(&mut self, pointer: PointerId) -> Option<VelocityTracker> {
        self.pointers.retain(|(id, _)| *id != pointer);
        self.captured.retain(|id| *id != pointer);
        self.trackers.remove(&pointer)
    }

    /// Resolve one pointer's membership as rejected, if still unresolved.
    fn withdraw(&mut self, arenas: &mut RecognizerArenas, pointer: PointerId) {
        if let Some(index) = self.entries.iter().position(|e| e.pointer() == pointer) {
            let entry = self.entries.remove(index);
            arenas.resolve(entry, GestureDisposition::Rejected);
        }
    }

    /// End a running pinch after `pointer` went away.
    fn finish(&mut self, velocity: Option<Vec2>) {
        self.update_spans();
        let factor = self.scale_factor();
        self.emit(ScaleAction::End, factor, velocity);
        self.state = ScaleState::Accepted;
        self.claimed = false;
        self.initial_span = self.current_span;
    }

    /// Reject everything left and return to `Ready` once no pointers remain.
    fn maybe_reset(&mut self, arenas: &mut RecognizerArenas) {
        if !self.pointers.is_empty() {
            return;
        }
        for entry in core::mem::take(&mut self.entries) {
            arenas.resolve(entry, GestureDisposition::Rejected);
        }
        self.reset();
    }

    fn reset(&mut self) {
        debug_assert!(self.entries.is_empty(), "reset with unresolved memberships");
        self.state = ScaleState::Ready;
        self.initial_span = 0.0;
        self.current_span = 0.0;
        self.claimed = false;
        self.pointers.clear();
        self.captured.clear();
        self.trackers.clear();
    }
}

impl<H: FnMut(GestureEvent)> GestureRecognizer for ScaleGestureRecognizer<H> {
    fn add_pointer(
        &mut self,
        arenas: &mut RecognizerArenas,
        id: RecognizerId,
        event: &GesturePointerEvent,
    ) -> bool {
        if self.pointers.len() == 2 {
            // A pinch tracks exactly two contacts.
            return false;
        }
        self.last_timestamp = event.timestamp;
        self.pointers.push((event.pointer_id, event.position));
        let mut tracker = VelocityTracker::new();
        tracker.add_position(event.timestamp, event.position);
        self.trackers.insert(event.pointer_id, tracker);
        self.entries.push(arenas.add(event.pointer_id, id));
        if self.state == ScaleState::Ready {
            self.state = ScaleState::Possible;
        }
        // A pointer joining changes the configuration: re-baseline the span.
        self.update_spans();
        self.initial_span = self.current_span;
        true
    }

    fn pointer_moved(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent) {
        let Some(slot) = self
            .pointers
            .iter_mut()
            .find(|(id, _)| *id == event.pointer_id)
        else {
            return;
        };
        slot.1 = event.position;
        if let Some(tracker) = self.trackers.get_mut(&event.pointer_id) {
            tracker.add_position(event.timestamp, event.position);
        }
        self.last_timestamp = event.timestamp;
        self.update_spans();

        match self.state {
            ScaleState::Possible | ScaleState::Accepted => {
                if self.pointers.len() == 2
                    && (self.current_span - self.initial_span).abs() > SCALE_SLOP
                {
                    self.claim(arenas);
                }
            }
            ScaleState::Started => {
                let factor = self.scale_factor();
                self.emit(ScaleAction::Update, factor, None);
            }
            ScaleState::Ready => {}
        }
    }

    fn pointer_released(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent) {
        let pointer = event.pointer_id;
        if !self.pointers.iter().any(|(id, _)| *id == pointer) {
            return;
        }
        self.last_timestamp = event.timestamp;
        let tracker = self.remove_pointer(pointer);
        self.withdraw(arenas, pointer);

        if self.state == ScaleState::Started {
            let velocity = tracker.as_ref().and_then(fling_velocity);
            self.finish(velocity);
        }
        self.maybe_reset(arenas);
    }

    fn pointer_canceled(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent) {
        let pointer = event.pointer_id;
        if !self.pointers.iter().any(|(id, _)| *id == pointer) {
            return;
        }
        self.last_timestamp = event.timestamp;
        self.remove_pointer(pointer);
        self.withdraw(arenas, pointer);

        if self.state == ScaleState::Started {
            self.finish(None);
        }
        self.maybe_reset(arenas);
    }

    fn accept_gesture(&mut self, _arenas: &mut RecognizerArenas, pointer: PointerId) {
        self.entries.retain(|e| e.pointer() != pointer);
        if !self.captured.contains(&pointer) {
            self.captured.push(pointer);
        }
        if self.claimed {
            self.try_start();
        }
    }

    fn reject_gesture(&mut self, arenas: &mut RecognizerArenas, pointer: PointerId) {
        if self.state != ScaleState::Possible {
            return;
        }
        // Losing either pointer's arena makes the pinch impossible; withdraw
        // from the other arena as well.
        self.entries.retain(|e| e.pointer() != pointer);
        for entry in core::mem::take(&mut self.entries) {
            arenas.resolve(entry, GestureDisposition::Rejected);
        }
        self.reset();
    }

    fn dispose(&mut self, arenas: &mut RecognizerArenas) {
        for entry in core::mem::take(&mut self.entries) {
            arenas.resolve(entry, GestureDisposition::Rejected);
        }
        self.reset();
    }
}

impl<H: FnMut(GestureEvent)> core::fmt::Debug for ScaleGestureRecognizer<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScaleGestureRecognizer")
            .field("state", &self.state)
            .field("initial_span", &self.initial_span)
            .field("current_span", &self.current_span)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;
    use crate::event::GesturePointerAction;

    fn pid(n: u64) -> PointerId {
        PointerId::new(n).unwrap()
    }

    fn ev(pointer: u64, action: GesturePointerAction, x: f64, timestamp: u64) -> GesturePointerEvent {
        GesturePointerEvent {
            pointer_id: pid(pointer),
            action,
            position: Point::new(x, 0.0),
            timestamp,
            is_primary: pointer == 1,
        }
    }

    fn deliver<R: GestureRecognizer>(recognizer: &mut R, arenas: &mut RecognizerArenas) {
        while let Some(verdict) = arenas.take_verdict() {
            match verdict.disposition {
                GestureDisposition::Accepted => recognizer.accept_gesture(arenas, verdict.pointer),
                GestureDisposition::Rejected => recognizer.reject_gesture(arenas, verdict.pointer),
            }
        }
    }

    fn recognizer() -> (
        Rc<RefCell<Vec<GestureEvent>>>,
        ScaleGestureRecognizer<impl FnMut(GestureEvent)>,
    ) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let recognizer = ScaleGestureRecognizer::new(move |event| sink.borrow_mut().push(event));
        (events, recognizer)
    }

    // Both pointers down at x=0 and x=100 at t=0, arenas closed. Initial span 50.
    fn engage(
        scale: &mut ScaleGestureRecognizer<impl FnMut(GestureEvent)>,
        arenas: &mut RecognizerArenas,
    ) {
        assert!(scale.add_pointer(arenas, RecognizerId(0), &ev(1, GesturePointerAction::Down, 0.0, 0)));
        arenas.close(pid(1));
        assert!(scale.add_pointer(arenas, RecognizerId(0), &ev(2, GesturePointerAction::Down, 100.0, 0)));
        arenas.close(pid(2));
    }

    #[test]
    fn jitter_below_the_slop_never_captures() {
        let (events, mut scale) = recognizer();
        let mut arenas = RecognizerArenas::new();
        engage(&mut scale, &mut arenas);

        // Initial span is 50; moving the far pointer by 8px moves the span by
        // exactly 4, well under the slop.
        scale.pointer_moved(&mut arenas, &ev(2, GesturePointerAction::Move, 108.0, 20));
        scale.pointer_moved(&mut arenas, &ev(2, GesturePointerAction::Move, 104.0, 36));

        assert!(arenas.take_verdict().is_none(), "no membership may resolve");
        assert!(events.borrow().is_empty());
        assert!(arenas.has_arena(pid(1)));
        assert!(arenas.has_arena(pid(2)));
    }

    #[test]
    fn span_divergence_captures_and_starts() {
        let (events, mut scale) = recognizer();
        let mut arenas = RecognizerArenas::new();
        engage(&mut scale, &mut arenas);

        // Span grows from 50 to 60: 10 > SCALE_SLOP.
        scale.pointer_moved(&mut arenas, &ev(2, GesturePointerAction::Move, 120.0, 20));
        deliver(&mut scale, &mut arenas);

        let recorded = events.borrow().clone();
        assert_eq!(recorded.len(), 2);
        assert!(matches!(
            recorded[0],
            GestureEvent::Scale {
                action: ScaleAction::Start,
                scale,
                ..
            } if scale == 1.0
        ));
        assert!(matches!(
            recorded[1],
            GestureEvent::Scale {
                action: ScaleAction::Update,
                scale,
                ..
            } if (scale - 1.2).abs() < 1e-9
        ));
        assert!(!arenas.has_arena(pid(1)));
        assert!(!arenas.has_arena(pid(2)));
    }

    #[test]
    fn default_wins_alone_do_not_start_a_one_pointer_pinch() {
        let (events, mut scale) = recognizer();
        let mut arenas = RecognizerArenas::new();

        scale.add_pointer(&mut arenas, RecognizerId(0), &ev(1, GesturePointerAction::Down, 0.0, 0));
        arenas.close(pid(1));
        // As the sole member, the arena hands the pointer over by default.
        arenas.run_deferred();
        deliver(&mut scale, &mut arenas);

        scale.pointer_moved(&mut arenas, &ev(1, GesturePointerAction::Move, 300.0, 20));
        assert!(events.borrow().is_empty(), "one pointer must never pinch");
    }

    #[test]
    fn starts_even_when_one_arena_accepted_before_the_slop() {
        let (events, mut scale) = recognizer();
        let mut arenas = RecognizerArenas::new();
        engage(&mut scale, &mut arenas);

        // Both single-member arenas resolve by default before any movement.
        arenas.run_deferred();
        deliver(&mut scale, &mut arenas);
        assert!(events.borrow().is_empty());

        // The slop still gates the start; passing it claims the remaining
        // arena and the pinch begins.
        scale.pointer_moved(&mut arenas, &ev(2, GesturePointerAction::Move, 120.0, 20));
        deliver(&mut scale, &mut arenas);

        let recorded = events.borrow().clone();
        assert!(matches!(
            recorded.first(),
            Some(GestureEvent::Scale {
                action: ScaleAction::Start,
                ..
            })
        ));
    }

    #[test]
    fn updates_track_the_live_scale_factor() {
        let (events, mut scale) = recognizer();
        let mut arenas = RecognizerArenas::new();
        engage(&mut scale, &mut arenas);

        scale.pointer_moved(&mut arenas, &ev(2, GesturePointerAction::Move, 120.0, 20));
        deliver(&mut scale, &mut arenas);
        scale.pointer_moved(&mut arenas, &ev(2, GesturePointerAction::Move, 140.0, 36));

        let recorded = events.borrow().clone();
        let last = recorded.last().unwrap();
        assert!(matches!(
            last,
            GestureEvent::Scale {
                action: ScaleAction::Update,
                scale,
                focal_point,
                ..
            } if (scale - 1.4).abs() < 1e-9 && (focal_point.x - 70.0).abs() < 1e-9
        ));
    }

    #[test]
    fn fast_release_ends_with_a_fling_velocity() {
        let (events, mut scale) = recognizer();
        let mut arenas = RecognizerArenas::new();
        engage(&mut scale, &mut arenas);

        // 20px per 16ms is 1250 px/s, above the fling floor.
        for (i, x) in [120.0, 140.0, 160.0, 180.0].iter().enumerate() {
            let t = 16 * (i as u64 + 1);
            scale.pointer_moved(&mut arenas, &ev(2, GesturePointerAction::Move, *x, t));
            deliver(&mut scale, &mut arenas);
        }
        scale.pointer_released(&mut arenas, &ev(2, GesturePointerAction::Up, 180.0, 70));
        deliver(&mut scale, &mut arenas);

        let recorded = events.borrow().clone();
        let end = recorded
            .iter()
            .find(|event| matches!(event, GestureEvent::Scale { action: ScaleAction::End, .. }))
            .expect("a started pinch must end");
        let GestureEvent::Scale { velocity, .. } = end else {
            unreachable!();
        };
        let velocity = velocity.expect("a fast release must report a fling velocity");
        assert!((velocity.x - 1250.0).abs() < 1.0, "got {}", velocity.x);
    }

    #[test]
    fn slow_release_ends_without_a_velocity() {
        let (events, mut scale) = recognizer();
        let mut arenas = RecognizerArenas::new();
        engage(&mut scale, &mut arenas);

        scale.pointer_moved(&mut arenas, &ev(2, GesturePointerAction::Move, 120.0, 20));
        deliver(&mut scale, &mut arenas);
        // A long stall before the release empties the velocity window.
        scale.pointer_released(&mut arenas, &ev(2, GesturePointerAction::Up, 120.0, 500));
        deliver(&mut scale, &mut arenas);

        let recorded = events.borrow().clone();
        let end = recorded
            .iter()
            .find(|event| matches!(event, GestureEvent::Scale { action: ScaleAction::End, .. }))
            .expect("a started pinch must end");
        assert!(matches!(end, GestureEvent::Scale { velocity: None, .. }));
    }

    #[test]
    fn losing_one_arena_withdraws_from_the_other() {
        let (events, mut scale) = recognizer();
        let mut arenas = RecognizerArenas::new();
        engage(&mut scale, &mut arenas);

        // Some other recognizer captured pointer 1's arena.
        scale.reject_gesture(&mut arenas, pid(1));
        deliver(&mut scale, &mut arenas);

        assert!(events.borrow().is_empty());
        assert!(!arenas.has_arena(pid(2)), "the second membership must be resolved");
    }

    #[test]
    fn third_pointer_is_ignored() {
        let (_events, mut scale) = recognizer();
        let mut arenas = RecognizerArenas::new();
        engage(&mut scale, &mut arenas);
        assert!(!scale.add_pointer(&mut arenas, RecognizerId(0), &ev(3, GesturePointerAction::Down, 50.0, 10)));
    }
}
