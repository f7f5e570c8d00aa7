// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The recognizer contract and the tuning constants shared by the built-in
//! recognizers.
//!
//! A recognizer is a stateful arena member: it decides per pointer whether to
//! compete, resolves its membership once its gesture criteria are met (or
//! definitively missed), and emits gesture events only after the arena has
//! accepted it. Recognizers never mutate arena internals directly; everything
//! goes through the [`canopy_arena::GestureArenaManager`] handle passed into
//! each call.

use kurbo::Vec2;

use canopy_arena::{GestureArenaManager, PointerId};
use canopy_velocity::{VelocityTracker, clamp_magnitude};

use crate::event::GesturePointerEvent;

/// Movement beyond this many pixels stops a stationary gesture (tap,
/// long-press) from completing.
pub const TOUCH_SLOP: f64 = 8.0;

/// A pinch's span must diverge from its initial span by more than this many
/// pixels before the scale recognizer claims the pointers.
pub const SCALE_SLOP: f64 = 8.0;

/// Releases slower than this (px/s) do not qualify as flings.
pub const MIN_FLING_VELOCITY: f64 = 50.0;

/// Fling velocities are clamped to this magnitude (px/s).
pub const MAX_FLING_VELOCITY: f64 = 8000.0;

/// How long a press may last and still count as a tap.
pub const TAP_TIMEOUT_MILLISECONDS: u64 = 100;

/// How long a press must be held to become a long-press.
pub const LONG_PRESS_TIMEOUT_MILLISECONDS: u64 = 500;

/// Identifies one registered recognizer inside a
/// [`GestureDispatcher`](crate::GestureDispatcher).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecognizerId(pub(crate) u32);

/// The arena manager type shared by all recognizers of one dispatcher.
pub type RecognizerArenas = GestureArenaManager<RecognizerId>;

/// A stateful client of the gesture arena.
///
/// The dispatcher calls these hooks; implementations react by mutating their
/// own state, resolving arena memberships, and — once accepted — emitting
/// gesture events to their handler. All hooks are infallible: a recognizer
/// that cannot use an event simply ignores it.
pub trait GestureRecognizer {
    /// A pointer went down. Return `true` to engage with it; an engaged
    /// recognizer receives this pointer's later events and is expected to
    /// have registered itself in the pointer's arena under `id`.
    fn add_pointer(
        &mut self,
        arenas: &mut RecognizerArenas,
        id: RecognizerId,
        event: &GesturePointerEvent,
    ) -> bool;

    /// An engaged pointer moved.
    fn pointer_moved(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent);

    /// An engaged pointer was lifted.
    fn pointer_released(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent);

    /// An engaged pointer's stream was aborted. Implementations resolve any
    /// open membership as rejected.
    fn pointer_canceled(&mut self, arenas: &mut RecognizerArenas, event: &GesturePointerEvent);

    /// The arena accepted this recognizer for `pointer`. Only from here on may
    /// the recognizer emit gesture events for that pointer.
    fn accept_gesture(&mut self, arenas: &mut RecognizerArenas, pointer: PointerId);

    /// The arena rejected this recognizer for `pointer`. Delivered exactly
    /// once; the recognizer discards its per-pointer state.
    fn reject_gesture(&mut self, arenas: &mut RecognizerArenas, pointer: PointerId);

    /// The earliest pending deadline on the input clock, if any. The
    /// embedding arranges a wakeup and calls
    /// [`GestureDispatcher::fire_deadlines`](crate::GestureDispatcher::fire_deadlines).
    fn deadline(&self) -> Option<u64> {
        None
    }

    /// The input clock reached a previously reported deadline.
    fn deadline_elapsed(&mut self, arenas: &mut RecognizerArenas, now: u64) {
        let _ = (arenas, now);
    }

    /// Release all resources. Implementations resolve any unresolved
    /// membership as rejected; a member is never left dangling in an arena.
    fn dispose(&mut self, arenas: &mut RecognizerArenas);
}

/// The fling-qualified release velocity for a pointer, if any.
///
/// Returns `None` when the tracker reports no meaningful motion or the
/// magnitude is at or below [`MIN_FLING_VELOCITY`]; otherwise the velocity
/// clamped into the fling band.
pub fn fling_velocity(tracker: &VelocityTracker) -> Option<Vec2> {
    let velocity = tracker.velocity()?;
    if velocity.length_squared() <= MIN_FLING_VELOCITY * MIN_FLING_VELOCITY {
        return None;
    }
    Some(clamp_magnitude(velocity, MIN_FLING_VELOCITY, MAX_FLING_VELOCITY))
}
