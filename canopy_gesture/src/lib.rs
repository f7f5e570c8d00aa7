// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Gesture: pointer gesture recognition over the canopy arena.
//!
//! ## Overview
//!
//! This crate turns a stream of [`GesturePointerEvent`]s into high-level
//! [`GestureEvent`]s. Several recognizers — [`TapGestureRecognizer`],
//! [`LongPressGestureRecognizer`], [`ScaleGestureRecognizer`],
//! [`DragGestureRecognizer`] — observe the same pointers and compete in a
//! per-pointer [`canopy_arena::GestureArenaManager`]; only the arena's winner
//! emits events to its handler, and every loser is told to stand down exactly
//! once.
//!
//! ## Wiring
//!
//! The [`GestureDispatcher`] is the single mutation path into the arena: it
//! offers every pointer down to the registered recognizers, closes the arena
//! once all have had the chance to join, routes later events for a pointer to
//! the recognizers that engaged with it, sweeps on release, delivers arena
//! verdicts back to recognizers, and flushes the arena's deferred
//! single-member resolutions at the end of each event turn.
//!
//! Time is data here: pointer events carry millisecond timestamps and
//! recognizers expose their pending deadlines through
//! [`GestureDispatcher::next_deadline`]. The embedding drives whatever clock
//! it has and calls [`GestureDispatcher::fire_deadlines`]; nothing in this
//! crate schedules wakeups on its own.
//!
//! ```
//! use canopy_gesture::{
//!     GestureDispatcher, GestureEvent, GesturePointerAction, GesturePointerEvent,
//!     TapGestureRecognizer,
//! };
//! use core::cell::RefCell;
//! use kurbo::Point;
//! use std::rc::Rc;
//!
//! let events = Rc::new(RefCell::new(Vec::new()));
//! let sink = events.clone();
//!
//! let mut dispatcher = GestureDispatcher::new();
//! dispatcher.register(Box::new(TapGestureRecognizer::new(move |event| {
//!     sink.borrow_mut().push(event);
//! })));
//!
//! let pointer = core::num::NonZeroU64::new(1).unwrap();
//! let down = GesturePointerEvent {
//!     pointer_id: pointer,
//!     action: GesturePointerAction::Down,
//!     position: Point::new(10.0, 10.0),
//!     timestamp: 0,
//!     is_primary: true,
//! };
//! dispatcher.handle_pointer_event(&down);
//! dispatcher.handle_pointer_event(&GesturePointerEvent {
//!     action: GesturePointerAction::Up,
//!     timestamp: 40,
//!     ..down
//! });
//!
//! assert!(matches!(
//!     events.borrow().last(),
//!     Some(GestureEvent::Tap { .. })
//! ));
//! ```

#![no_std]

extern crate alloc;

pub mod dispatcher;
pub mod drag;
pub mod event;
pub mod long_press;
pub mod recognizer;
pub mod scale;
pub mod tap;

pub use canopy_arena::{GestureArenaEntry, GestureArenaManager, GestureDisposition, PointerId};

pub use dispatcher::GestureDispatcher;
pub use drag::DragGestureRecognizer;
pub use event::{
    DragAction, GestureEvent, GesturePointerAction, GesturePointerEvent, ScaleAction, TapAction,
};
pub use long_press::LongPressGestureRecognizer;
pub use recognizer::{GestureRecognizer, RecognizerArenas, RecognizerId};
pub use scale::ScaleGestureRecognizer;
pub use tap::TapGestureRecognizer;
