// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pipeline between pointer input, recognizers, and the arena.
//!
//! ## Event flow
//!
//! - **Down** — every registered recognizer is offered the pointer; the ones
//!   that engage are routed its later events. The arena for the pointer is
//!   then closed: no more members may join.
//! - **Move** — delivered to the routed recognizers; arena verdicts are
//!   delivered between recognizers so an eager capture rejects the others
//!   before they see stale state.
//! - **Up** — delivered to the routed recognizers, then the arena is swept:
//!   an undecided arena resolves to its first registrant.
//! - **Cancel** — delivered to the routed recognizers, which resolve their
//!   own memberships as rejected.
//!
//! After each turn the arena's deferred single-member default resolutions run,
//! mirroring the microtask checkpoint an event loop would provide.
//!
//! Verdict delivery is a queue drain, not a callback: recognizers may resolve
//! further memberships while reacting to a verdict, and those resolutions are
//! delivered in order without re-entering the manager.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;

use smallvec::SmallVec;

use canopy_arena::{GestureDisposition, PointerId};

use crate::event::{GesturePointerAction, GesturePointerEvent};
use crate::recognizer::{GestureRecognizer, RecognizerArenas, RecognizerId};

/// Owns the recognizers and the arena manager, and routes pointer events
/// between them.
///
/// This is the only code path that mutates the arena; recognizers act through
/// the manager handle they are passed and never hold arena state themselves.
pub struct GestureDispatcher {
    arenas: RecognizerArenas,
    recognizers: BTreeMap<RecognizerId, Box<dyn GestureRecognizer>>,
    routes: BTreeMap<PointerId, SmallVec<[RecognizerId; 4]>>,
    next_id: u32,
}

impl GestureDispatcher {
    /// A dispatcher with no recognizers.
    pub fn new() -> Self {
        Self {
            arenas: RecognizerArenas::new(),
            recognizers: BTreeMap::new(),
            routes: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Register a recognizer; it competes for every subsequent pointer down.
    pub fn register(&mut self, recognizer: Box<dyn GestureRecognizer>) -> RecognizerId {
        let id = RecognizerId(self.next_id);
        self.next_id += 1;
        self.recognizers.insert(id, recognizer);
        id
    }

    /// Dispose and remove a recognizer.
    ///
    /// The recognizer resolves any open membership as rejected on the way out,
    /// so no arena is left waiting for it.
    pub fn unregister(&mut self, id: RecognizerId) {
        if let Some(mut recognizer) = self.recognizers.remove(&id) {
            recognizer.dispose(&mut self.arenas);
        }
        for routed in self.routes.values_mut() {
            routed.retain(|r| *r != id);
        }
        self.drain_verdicts();
        self.flush_deferred();
    }

    /// Feed one pointer event through the pipeline.
    pub fn handle_pointer_event(&mut self, event: &GesturePointerEvent) {
        let pointer = event.pointer_id;
        match event.action {
            GesturePointerAction::Down => {
                let ids: SmallVec<[RecognizerId; 8]> =
                    self.recognizers.keys().copied().collect();
                let mut engaged: SmallVec<[RecognizerId; 4]> = SmallVec::new();
                for id in ids {
                    if let Some(recognizer) = self.recognizers.get_mut(&id)
                        && recognizer.add_pointer(&mut self.arenas, id, event)
                    {
                        engaged.push(id);
                    }
                }
                if !engaged.is_empty() {
                    self.routes.insert(pointer, engaged);
                }
                self.arenas.close(pointer);
                self.drain_verdicts();
            }
            GesturePointerAction::Move => {
                for id in self.routes.get(&pointer).cloned().unwrap_or_default() {
                    if let Some(recognizer) = self.recognizers.get_mut(&id) {
                        recognizer.pointer_moved(&mut self.arenas, event);
                    }
                    self.drain_verdicts();
                }
            }
            GesturePointerAction::Up => {
                for id in self.routes.get(&pointer).cloned().unwrap_or_default() {
                    if let Some(recognizer) = self.recognizers.get_mut(&id) {
                        recognizer.pointer_released(&mut self.arenas, event);
                    }
                    self.drain_verdicts();
                }
                self.arenas.sweep(pointer);
                self.drain_verdicts();
                self.routes.remove(&pointer);
            }
            GesturePointerAction::Cancel => {
                for id in self.routes.get(&pointer).cloned().unwrap_or_default() {
                    if let Some(recognizer) = self.recognizers.get_mut(&id) {
                        recognizer.pointer_canceled(&mut self.arenas, event);
                    }
                    self.drain_verdicts();
                }
                self.routes.remove(&pointer);
            }
        }
        self.flush_deferred();
    }

    /// The earliest deadline any recognizer is waiting on, if any.
    ///
    /// The embedding arranges a timer for this instant and then calls
    /// [`Self::fire_deadlines`].
    pub fn next_deadline(&self) -> Option<u64> {
        self.recognizers
            .values()
            .filter_map(|recognizer| recognizer.deadline())
            .min()
    }

    /// Tell every recognizer whose deadline is due that the input clock
    /// reached `now`.
    pub fn fire_deadlines(&mut self, now: u64) {
        let due: SmallVec<[RecognizerId; 4]> = self
            .recognizers
            .iter()
            .filter(|(_, recognizer)| recognizer.deadline().is_some_and(|at| at <= now))
            .map(|(id, _)| *id)
            .collect();
        for id in due {
            if let Some(recognizer) = self.recognizers.get_mut(&id) {
                recognizer.deadline_elapsed(&mut self.arenas, now);
            }
            self.drain_verdicts();
        }
        self.flush_deferred();
    }

    /// Shared access to the arena manager, mostly for inspection.
    pub fn arenas(&self) -> &RecognizerArenas {
        &self.arenas
    }

    fn drain_verdicts(&mut self) {
        while let Some(verdict) = self.arenas.take_verdict() {
            let Some(recognizer) = self.recognizers.get_mut(&verdict.member) else {
                continue;
            };
            match verdict.disposition {
                GestureDisposition::Accepted => {
                    recognizer.accept_gesture(&mut self.arenas, verdict.pointer);
                }
                GestureDisposition::Rejected => {
                    recognizer.reject_gesture(&mut self.arenas, verdict.pointer);
                }
            }
        }
    }

    // The end-of-turn checkpoint for the arena's deferred default
    // resolutions.
    fn flush_deferred(&mut self) {
        self.arenas.run_deferred();
        self.drain_verdicts();
    }
}

impl Default for GestureDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for GestureDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GestureDispatcher")
            .field("recognizers", &self.recognizers.len())
            .field("routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}
