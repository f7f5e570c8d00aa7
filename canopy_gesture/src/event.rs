// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer input and gesture output events.
//!
//! [`GesturePointerEvent`] is the contract consumed from the platform capture
//! layer; one value per down/move/up/cancel of one physical pointer.
//! [`GestureEvent`] is what a winning recognizer hands to its registered
//! handler: a tagged union over the gesture families, each variant carrying
//! only its own fields. Events are plain immutable values.

use kurbo::{Point, Vec2};

use canopy_arena::PointerId;

/// What a pointer just did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GesturePointerAction {
    /// The pointer made contact.
    Down,
    /// The pointer moved while down.
    Move,
    /// The pointer was lifted.
    Up,
    /// The pointer stream was aborted by the platform.
    Cancel,
}

/// One pointer sample from the capture layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GesturePointerEvent {
    /// Identifies the physical contact for the lifetime of the gesture.
    pub pointer_id: PointerId,
    /// What happened.
    pub action: GesturePointerAction,
    /// Position in the surface's coordinate space.
    pub position: Point,
    /// Milliseconds on the input clock.
    pub timestamp: u64,
    /// Whether this is the primary pointer of the interaction.
    pub is_primary: bool,
}

/// Phase of a tap gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapAction {
    /// Contact that may become a tap.
    Down,
    /// The tap's pointer was lifted.
    Up,
    /// A previously announced tap will not complete.
    Cancel,
    /// The tap completed.
    Tap,
}

/// Phase of a scale (pinch) gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleAction {
    /// The pinch was recognized.
    Start,
    /// The span changed.
    Update,
    /// A pointer lifted and the pinch ended.
    End,
}

/// Phase of a drag gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragAction {
    /// Contact that may become a drag.
    Down,
    /// The drag was recognized.
    Start,
    /// The pointer moved while dragging.
    Update,
    /// The pointer was lifted.
    End,
    /// The drag will not complete or was aborted.
    Cancel,
}

/// A recognized gesture, emitted by the arena winner to its handler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    /// Tap lifecycle events.
    Tap {
        /// Milliseconds on the input clock.
        timestamp: u64,
        /// Tap phase.
        action: TapAction,
        /// Where the tap started.
        position: Point,
    },
    /// A press held beyond the long-press deadline without moving.
    LongPress {
        /// Milliseconds on the input clock.
        timestamp: u64,
        /// Where the press started.
        position: Point,
    },
    /// Pinch lifecycle events.
    Scale {
        /// Milliseconds on the input clock.
        timestamp: u64,
        /// Pinch phase.
        action: ScaleAction,
        /// Mean position of the tracked pointers.
        focal_point: Point,
        /// `current span / initial span`; 1 when the initial span was zero.
        scale: f64,
        /// Fling velocity in px/s; only on [`ScaleAction::End`], and only
        /// when the release qualified as a fling.
        velocity: Option<Vec2>,
    },
    /// Drag lifecycle events.
    Drag {
        /// Milliseconds on the input clock.
        timestamp: u64,
        /// Drag phase.
        action: DragAction,
        /// Current pointer position.
        position: Point,
        /// Movement since the previous drag event.
        delta: Vec2,
        /// Fling velocity in px/s; only on [`DragAction::End`], and only
        /// when the release qualified as a fling.
        velocity: Option<Vec2>,
    },
}
