// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Arena: deterministic, `no_std` arbitration of competing gesture recognizers.
//!
//! ## Overview
//!
//! When several gesture recognizers observe the same physical pointer — a tap, a
//! long-press, and a pinch may all start from the same touch — exactly one of them
//! may ultimately own the pointer's input stream. This crate provides the *gesture
//! arena*: a per-pointer session in which recognizers register as members, declare
//! themselves in or out, and a [`GestureArenaManager`] decides a single winner.
//!
//! The manager never owns recognizer objects. Members are identified by a caller
//! chosen `Copy + Eq` key, and every accept/reject decision is emitted as an
//! [`ArenaVerdict`] on a FIFO queue that the host drains with
//! [`GestureArenaManager::take_verdict`]. This keeps resolution re-entrancy safe:
//! a recognizer reacting to a verdict may immediately resolve other memberships
//! without the manager being mid-callback.
//!
//! ## Lifecycle
//!
//! 1. On pointer down, each interested recognizer calls
//!    [`GestureArenaManager::add`] and keeps the returned [`GestureArenaEntry`].
//! 2. Once no more members will join, the input pipeline calls
//!    [`GestureArenaManager::close`]. A sole member does not win synchronously;
//!    default resolution is queued and runs at
//!    [`GestureArenaManager::run_deferred`], giving other recognizers the rest of
//!    the turn to pre-empt.
//! 3. Members may resolve at any time via [`GestureArenaManager::resolve`]:
//!    `Rejected` leaves the arena, `Accepted` captures it (immediately when the
//!    arena is closed, or as the *eager winner* while it is still open).
//! 4. On pointer up, the pipeline calls [`GestureArenaManager::sweep`]: the first
//!    registered member still standing wins and every other member is rejected.
//!    [`GestureArenaManager::hold`] defers a sweep until
//!    [`GestureArenaManager::release`] replays it.
//!
//! Each member receives exactly one verdict per arena. Late calls against an
//! arena that has already resolved — or a stale entry whose pointer id has been
//! recycled — are silent no-ops; arbitration races are expected, not errors.
//!
//! ## Minimal example
//!
//! ```
//! use core::num::NonZeroU64;
//! use canopy_arena::{GestureArenaManager, GestureDisposition};
//!
//! let mut manager: GestureArenaManager<u32> = GestureArenaManager::new();
//! let pointer = NonZeroU64::new(7).unwrap();
//!
//! let tap = manager.add(pointer, 1);
//! let _drag = manager.add(pointer, 2);
//! manager.close(pointer);
//!
//! // The tap recognizer captures the arena; the drag recognizer is rejected.
//! manager.resolve(tap, GestureDisposition::Accepted);
//!
//! let verdicts: Vec<_> = core::iter::from_fn(|| manager.take_verdict())
//!     .map(|v| (v.member, v.disposition))
//!     .collect();
//! assert_eq!(
//!     verdicts,
//!     vec![(2, GestureDisposition::Rejected), (1, GestureDisposition::Accepted)],
//! );
//! ```

#![no_std]

extern crate alloc;

use core::num::NonZeroU64;

mod manager;

pub use manager::{GestureArena, GestureArenaManager};

/// Pointer identifier. Unique among all arenas with an active pointer.
pub type PointerId = NonZeroU64;

/// A member's declaration about a gesture it is competing for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureDisposition {
    /// The member claims the gesture and wants to own the pointer.
    Accepted,
    /// The member gives up on the gesture and leaves the arena.
    Rejected,
}

/// Opaque membership token returned by [`GestureArenaManager::add`].
///
/// Pass it back to [`GestureArenaManager::resolve`] exactly once. After the
/// arena has resolved, the token is stale and resolving it does nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GestureArenaEntry<K> {
    pub(crate) pointer: PointerId,
    pub(crate) member: K,
}

impl<K: Copy> GestureArenaEntry<K> {
    /// The pointer whose arena this entry belongs to.
    pub fn pointer(&self) -> PointerId {
        self.pointer
    }

    /// The member key this entry was issued to.
    pub fn member(&self) -> K {
        self.member
    }
}

/// An accept or reject decision for one member, emitted in resolution order.
///
/// Verdicts are queued rather than delivered through callbacks; drain them with
/// [`GestureArenaManager::take_verdict`] after every mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaVerdict<K> {
    /// The pointer whose arena resolved.
    pub pointer: PointerId,
    /// The member the verdict applies to.
    pub member: K,
    /// Whether the member won or lost the arena.
    pub disposition: GestureDisposition,
}
