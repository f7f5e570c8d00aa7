// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena bookkeeping and the resolution state machine.

use alloc::collections::{BTreeMap, VecDeque};

use smallvec::SmallVec;

use crate::{ArenaVerdict, GestureArenaEntry, GestureDisposition, PointerId};

/// One per-pointer arbitration session.
///
/// Created lazily by the first [`GestureArenaManager::add`] for a pointer id and
/// destroyed the moment a winner is determined or the last member leaves.
#[derive(Clone, Debug)]
pub struct GestureArena<K> {
    /// Members in registration order. Registration order breaks ties on sweep.
    members: SmallVec<[K; 4]>,
    /// True until the input pipeline declares that no more members will join.
    is_open: bool,
    /// True while an external caller defers resolution.
    is_held: bool,
    /// A sweep arrived while the arena was held and will replay on release.
    has_pending_sweep: bool,
    /// A member that accepted before the arena closed.
    eager_winner: Option<K>,
}

impl<K> GestureArena<K> {
    fn new() -> Self {
        Self {
            members: SmallVec::new(),
            is_open: true,
            is_held: false,
            has_pending_sweep: false,
            eager_winner: None,
        }
    }

    /// Whether new members may still join.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Whether sweeps are currently deferred.
    pub fn is_held(&self) -> bool {
        self.is_held
    }

    /// Number of members still competing.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Arbitrates gesture arenas for all active pointers.
///
/// Generic over the member key `K` so it never owns or borrows recognizer
/// objects; the host maps keys back to recognizers when draining verdicts.
/// See the crate docs for the lifecycle.
#[derive(Clone, Debug)]
pub struct GestureArenaManager<K> {
    arenas: BTreeMap<PointerId, GestureArena<K>>,
    /// Pointers whose sole remaining member wins by default at the next
    /// [`Self::run_deferred`].
    deferred: VecDeque<PointerId>,
    verdicts: VecDeque<ArenaVerdict<K>>,
}

impl<K: Copy + Eq> GestureArenaManager<K> {
    /// Create a manager with no active arenas.
    pub fn new() -> Self {
        Self {
            arenas: BTreeMap::new(),
            deferred: VecDeque::new(),
            verdicts: VecDeque::new(),
        }
    }

    /// Register `member` in the arena for `pointer`, creating the arena if it
    /// does not exist yet.
    ///
    /// The returned entry is the member's one-shot handle for
    /// [`Self::resolve`].
    pub fn add(&mut self, pointer: PointerId, member: K) -> GestureArenaEntry<K> {
        let arena = self.arenas.entry(pointer).or_insert_with(GestureArena::new);
        arena.members.push(member);
        GestureArenaEntry { pointer, member }
    }

    /// Prevent new members from joining the arena for `pointer`.
    ///
    /// If an eager winner was already recorded it wins immediately. If exactly
    /// one member remains, default resolution is queued for
    /// [`Self::run_deferred`]; it is never applied synchronously so the rest of
    /// the current turn can still pre-empt. An arena with no members is
    /// dropped.
    pub fn close(&mut self, pointer: PointerId) {
        let Some(arena) = self.arenas.get_mut(&pointer) else {
            return;
        };
        if !arena.is_open {
            return;
        }
        arena.is_open = false;
        self.try_resolve(pointer);
    }

    /// Run any queued single-member default resolutions.
    ///
    /// The input pipeline calls this once at the end of each event turn, after
    /// every recognizer has seen the event. A queued arena that has since
    /// resolved, reopened for more members, or changed size is skipped.
    pub fn run_deferred(&mut self) {
        while let Some(pointer) = self.deferred.pop_front() {
            let Some(arena) = self.arenas.get(&pointer) else {
                continue;
            };
            if arena.is_open || arena.members.len() != 1 {
                continue;
            }
            let winner = arena.members[0];
            self.resolve_in_favor_of(pointer, winner);
        }
    }

    /// Force resolution of the arena for `pointer`.
    ///
    /// The first registered member still standing is accepted and every other
    /// member is rejected, in registration order. While the arena is held the
    /// sweep is recorded and replayed by [`Self::release`].
    pub fn sweep(&mut self, pointer: PointerId) {
        if let Some(arena) = self.arenas.get_mut(&pointer)
            && arena.is_held
        {
            arena.has_pending_sweep = true;
            return;
        }
        let Some(arena) = self.arenas.remove(&pointer) else {
            return;
        };
        if let Some((first, rest)) = arena.members.split_first() {
            self.push_verdict(pointer, *first, GestureDisposition::Accepted);
            for member in rest {
                self.push_verdict(pointer, *member, GestureDisposition::Rejected);
            }
        }
    }

    /// Defer sweeps of the arena for `pointer` until [`Self::release`].
    pub fn hold(&mut self, pointer: PointerId) {
        if let Some(arena) = self.arenas.get_mut(&pointer) {
            arena.is_held = true;
        }
    }

    /// Stop deferring sweeps for `pointer`, replaying a pending sweep if one
    /// arrived while the arena was held.
    pub fn release(&mut self, pointer: PointerId) {
        let mut replay = false;
        if let Some(arena) = self.arenas.get_mut(&pointer) {
            arena.is_held = false;
            replay = core::mem::take(&mut arena.has_pending_sweep);
        }
        if replay {
            self.sweep(pointer);
        }
    }

    /// Resolve a membership with the given disposition.
    ///
    /// `Rejected` removes the member and, once the arena is closed, re-attempts
    /// resolution of the remainder. `Accepted` captures the arena: immediately
    /// when it is already closed, otherwise as the eager winner (first
    /// acceptance wins; later ones are ignored while open).
    ///
    /// Stale entries — the arena already resolved, or the member already left —
    /// are ignored.
    pub fn resolve(&mut self, entry: GestureArenaEntry<K>, disposition: GestureDisposition) {
        let GestureArenaEntry { pointer, member } = entry;
        let Some(arena) = self.arenas.get_mut(&pointer) else {
            return;
        };
        if !arena.members.contains(&member) {
            return;
        }
        match disposition {
            GestureDisposition::Rejected => {
                arena.members.retain(|m| *m != member);
                if arena.eager_winner == Some(member) {
                    arena.eager_winner = None;
                }
                let closed = !arena.is_open;
                let empty = arena.members.is_empty();
                self.push_verdict(pointer, member, GestureDisposition::Rejected);
                if closed {
                    self.try_resolve(pointer);
                } else if empty {
                    // A new down for this pointer id recreates the arena.
                    self.arenas.remove(&pointer);
                }
            }
            GestureDisposition::Accepted => {
                if arena.is_open {
                    if arena.eager_winner.is_none() {
                        arena.eager_winner = Some(member);
                    }
                } else {
                    self.resolve_in_favor_of(pointer, member);
                }
            }
        }
    }

    /// Pop the oldest undelivered verdict.
    pub fn take_verdict(&mut self) -> Option<ArenaVerdict<K>> {
        self.verdicts.pop_front()
    }

    /// Inspect the live arena for `pointer`, if any.
    pub fn arena(&self, pointer: PointerId) -> Option<&GestureArena<K>> {
        self.arenas.get(&pointer)
    }

    /// Whether `pointer` currently has a live arena.
    pub fn has_arena(&self, pointer: PointerId) -> bool {
        self.arenas.contains_key(&pointer)
    }

    // Resolution attempt for a closed arena: eager winner first, then the
    // zero- and one-member cases.
    fn try_resolve(&mut self, pointer: PointerId) {
        let Some(arena) = self.arenas.get(&pointer) else {
            return;
        };
        debug_assert!(!arena.is_open, "only closed arenas resolve by default");
        if let Some(winner) = arena.eager_winner {
            self.resolve_in_favor_of(pointer, winner);
        } else if arena.members.is_empty() {
            self.arenas.remove(&pointer);
        } else if arena.members.len() == 1 {
            self.deferred.push_back(pointer);
        }
    }

    fn resolve_in_favor_of(&mut self, pointer: PointerId, winner: K) {
        let Some(arena) = self.arenas.remove(&pointer) else {
            return;
        };
        for member in arena.members.iter().filter(|m| **m != winner) {
            self.push_verdict(pointer, *member, GestureDisposition::Rejected);
        }
        self.push_verdict(pointer, winner, GestureDisposition::Accepted);
    }

    fn push_verdict(&mut self, pointer: PointerId, member: K, disposition: GestureDisposition) {
        self.verdicts.push_back(ArenaVerdict {
            pointer,
            member,
            disposition,
        });
    }
}

impl<K: Copy + Eq> Default for GestureArenaManager<K> {
    fn default() -> Self {
        Self::new()
    }
}
