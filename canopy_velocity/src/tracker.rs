// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-pointer velocity tracking over a bounded sample history.
//!
//! A [`VelocityTracker`] keeps the last [`HISTORY_SIZE`] timestamped positions
//! of one moving pointer in a ring buffer. Estimation walks the ring backward
//! from the newest sample, keeps only samples inside the recency window, and
//! fits x(t) and y(t) independently with degree-2 polynomials; the velocity is
//! the linear term of each fit. The confidence of the two fits multiplies into
//! the estimate's confidence.

use kurbo::{Point, Vec2};

use crate::lsq::LeastSquaresSolver;

/// A gap between consecutive samples larger than this means the pointer
/// stalled; older samples are dropped from the window.
const ASSUME_POINTER_MOVE_STOPPED_MILLISECONDS: u64 = 40;

/// Ring buffer capacity; insertion at capacity overwrites the oldest slot.
pub const HISTORY_SIZE: usize = 20;

/// Samples older than this relative to the newest are ignored.
const HORIZON_MILLISECONDS: u64 = 100;

/// Windows at or below this many samples produce the zero-velocity fallback.
const MIN_SAMPLE_SIZE: usize = 3;

/// Degree of the x(t) and y(t) fits.
const FIT_DEGREE: usize = 2;

/// One timestamped position sample.
#[derive(Clone, Copy, Debug)]
struct PointAtTime {
    /// Milliseconds, from the same clock as the pointer events.
    time: u64,
    point: Point,
}

/// A velocity estimate over the retained sample window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityEstimate {
    /// Estimated velocity in pixels per second.
    pub pixels_per_second: Vec2,
    /// Product of the x and y fit confidences, in `[0, 1]`.
    pub confidence: f64,
    /// Milliseconds between the oldest and newest retained samples.
    pub duration: u64,
    /// Positional offset between the oldest and newest retained samples.
    pub offset: Vec2,
}

/// Bounded history of one pointer's positions, and the velocity derived from it.
#[derive(Clone, Debug)]
pub struct VelocityTracker {
    samples: [Option<PointAtTime>; HISTORY_SIZE],
    index: usize,
}

impl VelocityTracker {
    /// A tracker with no recorded samples.
    pub fn new() -> Self {
        Self {
            samples: [None; HISTORY_SIZE],
            index: 0,
        }
    }

    /// Record a position sample. At capacity the oldest sample is overwritten.
    pub fn add_position(&mut self, time: u64, position: Point) {
        self.index = (self.index + 1) % HISTORY_SIZE;
        self.samples[self.index] = Some(PointAtTime {
            time,
            point: position,
        });
    }

    /// Discard all recorded samples.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Estimate the velocity over the recent sample window.
    ///
    /// Returns `None` only for a tracker that has recorded nothing. A window
    /// that is too small to fit, or that the solver rejects, yields a
    /// zero-velocity estimate with confidence 1.
    pub fn velocity_estimate(&self) -> Option<VelocityEstimate> {
        let newest = self.samples[self.index]?;

        let mut x = [0.0; HISTORY_SIZE];
        let mut y = [0.0; HISTORY_SIZE];
        let mut w = [0.0; HISTORY_SIZE];
        let mut time = [0.0; HISTORY_SIZE];

        // Walk backward from the newest sample, stopping at the horizon, at a
        // stall gap, or at an unwritten slot.
        let mut sample_count = 0;
        let mut index = self.index;
        let mut previous = newest;
        let mut oldest = newest;
        while let Some(sample) = self.samples[index] {
            let age = newest.time.saturating_sub(sample.time);
            let gap = previous.time.abs_diff(sample.time);
            previous = sample;

            if age > HORIZON_MILLISECONDS || gap > ASSUME_POINTER_MOVE_STOPPED_MILLISECONDS {
                break;
            }

            oldest = sample;
            x[sample_count] = sample.point.x;
            y[sample_count] = sample.point.y;
            w[sample_count] = 1.0;
            time[sample_count] = -(age as f64);
            sample_count += 1;
            if sample_count == HISTORY_SIZE {
                break;
            }
            index = if index == 0 { HISTORY_SIZE - 1 } else { index - 1 };
        }

        let duration = newest.time.saturating_sub(oldest.time);
        let offset = newest.point - oldest.point;

        if sample_count > MIN_SAMPLE_SIZE {
            let time = &time[..sample_count];
            let w = &w[..sample_count];
            let x_fit = LeastSquaresSolver::new(time, &x[..sample_count], w).solve(FIT_DEGREE);
            let y_fit = LeastSquaresSolver::new(time, &y[..sample_count], w).solve(FIT_DEGREE);
            if let (Some(x_fit), Some(y_fit)) = (x_fit, y_fit) {
                // The linear coefficients are px/ms; scale to px/s.
                return Some(VelocityEstimate {
                    pixels_per_second: Vec2::new(
                        x_fit.coefficients[1] * 1000.0,
                        y_fit.coefficients[1] * 1000.0,
                    ),
                    confidence: x_fit.confidence * y_fit.confidence,
                    duration,
                    offset,
                });
            }
        }

        Some(VelocityEstimate {
            pixels_per_second: Vec2::ZERO,
            confidence: 1.0,
            duration,
            offset,
        })
    }

    /// The estimated velocity, or `None` when there is no meaningful motion.
    pub fn velocity(&self) -> Option<Vec2> {
        let estimate = self.velocity_estimate()?;
        if estimate.pixels_per_second == Vec2::ZERO {
            return None;
        }
        Some(estimate.pixels_per_second)
    }
}

impl Default for VelocityTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Rescale `velocity` so its magnitude lies within `[min_magnitude, max_magnitude]`.
///
/// A zero vector has no direction to rescale along and is returned unchanged.
pub fn clamp_magnitude(velocity: Vec2, min_magnitude: f64, max_magnitude: f64) -> Vec2 {
    let magnitude_squared = velocity.length_squared();
    if magnitude_squared == 0.0 {
        return velocity;
    }
    if magnitude_squared > max_magnitude * max_magnitude {
        return velocity / velocity.length() * max_magnitude;
    }
    if magnitude_squared < min_magnitude * min_magnitude {
        return velocity / velocity.length() * min_magnitude;
    }
    velocity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_has_no_estimate() {
        let tracker = VelocityTracker::new();
        assert!(tracker.velocity_estimate().is_none());
        assert!(tracker.velocity().is_none());
    }

    #[test]
    fn constant_velocity_is_recovered() {
        // 10 px/ms along x at a 16ms cadence: 10000 px/s.
        let mut tracker = VelocityTracker::new();
        for t in [0u64, 16, 32, 48, 64] {
            tracker.add_position(t, Point::new(10.0 * t as f64, 0.0));
        }

        let estimate = tracker.velocity_estimate().unwrap();
        assert!(
            (estimate.pixels_per_second.x - 10_000.0).abs() < 0.1,
            "got {}",
            estimate.pixels_per_second.x
        );
        assert!(estimate.pixels_per_second.y.abs() < 0.1);
        assert!((estimate.confidence - 1.0).abs() < 1e-6);
        assert_eq!(estimate.duration, 64);
        assert_eq!(estimate.offset, Vec2::new(640.0, 0.0));

        let velocity = tracker.velocity().unwrap();
        assert!((velocity.x - 10_000.0).abs() < 0.1);
    }

    #[test]
    fn too_few_samples_fall_back_to_zero_with_full_confidence() {
        let mut tracker = VelocityTracker::new();
        for t in [0u64, 16, 32] {
            tracker.add_position(t, Point::new(t as f64, t as f64));
        }

        let estimate = tracker.velocity_estimate().unwrap();
        assert_eq!(estimate.pixels_per_second, Vec2::ZERO);
        assert_eq!(estimate.confidence, 1.0);
        assert_eq!(estimate.duration, 32);
        assert_eq!(estimate.offset, Vec2::new(32.0, 32.0));

        // Zero velocity means no meaningful motion.
        assert!(tracker.velocity().is_none());
    }

    #[test]
    fn four_samples_are_enough_to_fit() {
        let mut tracker = VelocityTracker::new();
        for t in [0u64, 16, 32, 48] {
            tracker.add_position(t, Point::new(t as f64, 0.0));
        }
        let velocity = tracker.velocity().unwrap();
        assert!((velocity.x - 1000.0).abs() < 0.1);
    }

    #[test]
    fn samples_beyond_the_horizon_are_ignored() {
        let mut tracker = VelocityTracker::new();
        // A stale sample from an earlier flick, then a fresh burst. The stale
        // sample is older than 100ms relative to the newest and must not drag
        // the estimate down.
        tracker.add_position(0, Point::new(-1000.0, 0.0));
        for t in [150u64, 160, 170, 180, 190] {
            tracker.add_position(t, Point::new((t - 150) as f64, 0.0));
        }

        let estimate = tracker.velocity_estimate().unwrap();
        assert!((estimate.pixels_per_second.x - 1000.0).abs() < 0.1);
        assert_eq!(estimate.duration, 40);
    }

    #[test]
    fn a_stall_gap_cuts_the_window() {
        let mut tracker = VelocityTracker::new();
        // Old burst, a >40ms pause, then a new burst in the other direction.
        for t in [10u64, 20, 30] {
            tracker.add_position(t, Point::new(-(t as f64), 0.0));
        }
        for t in [100u64, 110, 120, 130] {
            tracker.add_position(t, Point::new(2.0 * (t - 100) as f64, 0.0));
        }

        let estimate = tracker.velocity_estimate().unwrap();
        assert!((estimate.pixels_per_second.x - 2000.0).abs() < 0.1);
        assert_eq!(estimate.duration, 30);
    }

    #[test]
    fn a_window_shrunk_by_a_gap_falls_back_to_zero() {
        let mut tracker = VelocityTracker::new();
        tracker.add_position(0, Point::new(0.0, 0.0));
        tracker.add_position(50, Point::new(100.0, 0.0));

        let estimate = tracker.velocity_estimate().unwrap();
        assert_eq!(estimate.pixels_per_second, Vec2::ZERO);
        assert_eq!(estimate.confidence, 1.0);
        assert!(tracker.velocity().is_none());
    }

    #[test]
    fn ring_buffer_wraps_without_losing_recent_samples() {
        let mut tracker = VelocityTracker::new();
        // More samples than the ring holds, evenly spaced inside the horizon.
        for i in 0..(HISTORY_SIZE as u64 + 5) {
            tracker.add_position(i * 4, Point::new(3.0 * 4.0 * i as f64, 0.0));
        }

        let velocity = tracker.velocity().unwrap();
        assert!((velocity.x - 3000.0).abs() < 0.1);
    }

    #[test]
    fn reset_clears_history() {
        let mut tracker = VelocityTracker::new();
        for t in [0u64, 16, 32, 48] {
            tracker.add_position(t, Point::new(t as f64, 0.0));
        }
        tracker.reset();
        assert!(tracker.velocity_estimate().is_none());
    }

    #[test]
    fn clamp_magnitude_limits_both_ends() {
        let fast = Vec2::new(3000.0, 4000.0); // magnitude 5000
        let clamped = clamp_magnitude(fast, 50.0, 1000.0);
        assert!((clamped.length() - 1000.0).abs() < 1e-9);
        assert!((clamped.y / clamped.x - 4.0 / 3.0).abs() < 1e-9);

        let slow = Vec2::new(3.0, 4.0); // magnitude 5
        let raised = clamp_magnitude(slow, 50.0, 1000.0);
        assert!((raised.length() - 50.0).abs() < 1e-9);

        let in_band = Vec2::new(30.0, 40.0); // magnitude 50
        assert_eq!(clamp_magnitude(in_band, 50.0, 1000.0), in_band);

        assert_eq!(clamp_magnitude(Vec2::ZERO, 50.0, 1000.0), Vec2::ZERO);
    }
}
