// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Velocity: fling-velocity estimation for pointer gestures.
//!
//! ## Overview
//!
//! Gesture recognizers need a velocity for the pointer at release time — to decide
//! whether a drag ends in a fling, and how fast. Raw pointer samples are noisy and
//! unevenly spaced, so differencing the last two positions is useless. This crate
//! keeps a short history of timestamped positions per pointer
//! ([`VelocityTracker`]) and estimates velocity by fitting quadratic curves to
//! x(t) and y(t) over the recent window with a weighted least-squares solver
//! ([`LeastSquaresSolver`]), reporting an R² confidence alongside the estimate.
//!
//! ## Usage
//!
//! Feed every move sample for a pointer into its tracker, then ask for the
//! velocity at release:
//!
//! ```
//! use canopy_velocity::VelocityTracker;
//! use kurbo::Point;
//!
//! let mut tracker = VelocityTracker::new();
//! for ms in 0..6u64 {
//!     let t = ms * 16;
//!     tracker.add_position(t, Point::new(t as f64 * 2.0, 0.0));
//! }
//!
//! // 2 px/ms along x is 2000 px/s.
//! let velocity = tracker.velocity().unwrap();
//! assert!((velocity.x - 2000.0).abs() < 1.0);
//! ```
//!
//! Estimation never fails on live input: windows that are too small, or sample
//! layouts the solver cannot fit, degrade to a zero-velocity estimate with full
//! confidence rather than an error. Only a tracker that has seen no samples at
//! all has nothing to report.
//!
//! ## See Also
//!
//! `canopy_gesture` for the recognizers that consume these estimates.

#![no_std]

extern crate alloc;

pub mod lsq;
pub mod tracker;

pub use lsq::{LeastSquaresSolver, PolynomialFit};
pub use tracker::{VelocityEstimate, VelocityTracker, clamp_magnitude};
