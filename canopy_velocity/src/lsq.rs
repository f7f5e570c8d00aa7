// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Weighted least-squares polynomial fitting.
//!
//! Fits a polynomial of a requested degree to weighted samples by QR
//! decomposition of the design matrix (modified Gram-Schmidt), then back
//! substitution. Degenerate inputs — more coefficients than samples, or a
//! design matrix with linearly dependent rows — produce no fit rather than a
//! garbage one, and callers fall back to a safe default.

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Norm threshold below which an orthogonalized row counts as singular.
const SINGULAR_NORM: f64 = 1e-6;

/// Variance threshold below which a fit is reported as perfect.
const DEGENERATE_VARIANCE: f64 = 1e-6;

/// A fitted polynomial and its goodness of fit.
#[derive(Clone, Debug, PartialEq)]
pub struct PolynomialFit {
    /// Coefficients by ascending power; `coefficients[i]` scales `x^i`.
    /// Length is `degree + 1`.
    pub coefficients: Vec<f64>,
    /// R² score in `[0, 1]`; 1 is a perfect (or degenerate) fit.
    pub confidence: f64,
}

/// Dense row-major matrix sized for small solver workloads.
///
/// Rows are exposed as borrowed slices so the orthogonalization step can
/// read and scale rows in place without copying.
#[derive(Clone, Debug)]
pub struct Matrix {
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// A zeroed `rows` × `cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Value at (`row`, `col`).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Store `value` at (`row`, `col`).
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// Borrow one row as a slice of the backing storage.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Mutably borrow one row; writes land in the backing storage.
    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }
}

/// Dot product of two equal-length vectors.
#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm of a vector.
#[inline]
fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Fits polynomials to weighted samples.
///
/// Borrows three equal-length series: independent values `x`, dependent
/// values `y`, and per-sample weights `w`. A weight of zero removes a sample
/// from the fit without changing the series shape.
#[derive(Clone, Copy, Debug)]
pub struct LeastSquaresSolver<'a> {
    x: &'a [f64],
    y: &'a [f64],
    w: &'a [f64],
}

impl<'a> LeastSquaresSolver<'a> {
    /// Create a solver over the given samples and weights.
    pub fn new(x: &'a [f64], y: &'a [f64], w: &'a [f64]) -> Self {
        debug_assert!(
            x.len() == y.len() && x.len() == w.len(),
            "sample series must have equal lengths"
        );
        Self { x, y, w }
    }

    /// Fit a polynomial of the given degree to the samples.
    ///
    /// Returns `None` when the degree exceeds the sample count or the design
    /// matrix is singular.
    pub fn solve(&self, degree: usize) -> Option<PolynomialFit> {
        let m = self.x.len();
        if degree > m {
            return None;
        }
        let n = degree + 1;

        // Design matrix: row 0 carries the weights, row i multiplies the row
        // above by x elementwise, so row i is w·x^i.
        let mut a = Matrix::new(n, m);
        for h in 0..m {
            a.set(0, h, self.w[h]);
            for i in 1..n {
                let value = a.get(i - 1, h) * self.x[h];
                a.set(i, h, value);
            }
        }

        // Orthogonalize the rows of `a` into `q`, tracking the upper
        // triangular `r` needed for back substitution.
        let mut q = Matrix::new(n, m);
        let mut r = Matrix::new(n, n);
        for j in 0..n {
            q.row_mut(j).copy_from_slice(a.row(j));
            for i in 0..j {
                let projection = dot(q.row(j), q.row(i));
                for h in 0..m {
                    let value = q.get(j, h) - projection * q.get(i, h);
                    q.set(j, h, value);
                }
            }

            let row_norm = norm(q.row(j));
            if row_norm < SINGULAR_NORM {
                return None;
            }
            let inverse_norm = row_norm.recip();
            for value in q.row_mut(j) {
                *value *= inverse_norm;
            }

            for i in 0..n {
                let value = if i < j { 0.0 } else { dot(q.row(j), a.row(i)) };
                r.set(j, i, value);
            }
        }

        // Solve r * coefficients = q * (w·y), highest degree first.
        let mut weighted_y = vec![0.0; m];
        for h in 0..m {
            weighted_y[h] = self.y[h] * self.w[h];
        }
        let mut coefficients = vec![0.0; n];
        for i in (0..n).rev() {
            let mut value = dot(q.row(i), &weighted_y);
            for j in (i + 1)..n {
                value -= r.get(i, j) * coefficients[j];
            }
            coefficients[i] = value / r.get(i, i);
        }

        // R² of the weighted fit against the weighted mean of y.
        let mut y_mean = 0.0;
        for &value in self.y {
            y_mean += value;
        }
        y_mean /= m as f64;

        let mut sum_squared_error = 0.0;
        let mut sum_squared_total = 0.0;
        for h in 0..m {
            let mut term = 1.0;
            let mut error = self.y[h] - coefficients[0];
            for &coefficient in &coefficients[1..] {
                term *= self.x[h];
                error -= term * coefficient;
            }
            let weight_squared = self.w[h] * self.w[h];
            let deviation = self.y[h] - y_mean;
            sum_squared_error += weight_squared * error * error;
            sum_squared_total += weight_squared * deviation * deviation;
        }

        let confidence = if sum_squared_total <= DEGENERATE_VARIANCE {
            1.0
        } else {
            1.0 - sum_squared_error / sum_squared_total
        };

        Some(PolynomialFit {
            coefficients,
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_above_sample_count_fails() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 1.0, 4.0];
        let w = [1.0, 1.0, 1.0];
        let solver = LeastSquaresSolver::new(&x, &y, &w);
        assert!(solver.solve(4).is_none());
        assert!(solver.solve(2).is_some());
    }

    #[test]
    fn exact_line_is_recovered() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: alloc::vec::Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let w = [1.0; 4];
        let fit = LeastSquaresSolver::new(&x, &y, &w).solve(1).unwrap();

        assert!((fit.coefficients[0] - 3.0).abs() < 1e-9);
        assert!((fit.coefficients[1] - 2.0).abs() < 1e-9);
        assert!((fit.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn exact_quadratic_is_recovered() {
        let x = [-2.0, -1.0, 0.0, 1.0, 2.0];
        let y: alloc::vec::Vec<f64> = x.iter().map(|v| 1.0 - 2.0 * v + 3.0 * v * v).collect();
        let w = [1.0; 5];
        let fit = LeastSquaresSolver::new(&x, &y, &w).solve(2).unwrap();

        assert!((fit.coefficients[0] - 1.0).abs() < 1e-9);
        assert!((fit.coefficients[1] + 2.0).abs() < 1e-9);
        assert!((fit.coefficients[2] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_abscissa_is_singular() {
        let x = [2.0, 2.0, 2.0, 2.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        let w = [1.0; 4];
        assert!(LeastSquaresSolver::new(&x, &y, &w).solve(1).is_none());
    }

    #[test]
    fn constant_samples_report_full_confidence() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [5.0; 4];
        let w = [1.0; 4];
        let fit = LeastSquaresSolver::new(&x, &y, &w).solve(1).unwrap();

        assert!((fit.coefficients[0] - 5.0).abs() < 1e-9);
        assert!(fit.coefficients[1].abs() < 1e-9);
        assert_eq!(fit.confidence, 1.0);
    }

    #[test]
    fn zero_weight_drops_a_sample_from_the_fit() {
        // A wild outlier with zero weight must not disturb the line.
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 1000.0, 3.0];
        let w = [1.0, 1.0, 0.0, 1.0];
        let fit = LeastSquaresSolver::new(&x, &y, &w).solve(1).unwrap();

        assert!(fit.coefficients[0].abs() < 1e-9);
        assert!((fit.coefficients[1] - 1.0).abs() < 1e-9);
        assert!((fit.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn noisy_fit_reports_reduced_confidence() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.1, 0.9, 2.2, 2.8, 4.1];
        let w = [1.0; 5];
        let fit = LeastSquaresSolver::new(&x, &y, &w).solve(1).unwrap();

        assert!(fit.confidence > 0.9, "close-to-linear data should score high");
        assert!(fit.confidence < 1.0, "noise must reduce confidence");
    }

    #[test]
    fn matrix_row_views_write_through() {
        let mut m = Matrix::new(2, 3);
        m.set(1, 0, 1.0);
        for value in m.row_mut(1) {
            *value += 2.0;
        }
        assert_eq!(m.row(1), &[3.0, 2.0, 2.0]);
        assert_eq!(m.get(0, 0), 0.0);
    }
}
