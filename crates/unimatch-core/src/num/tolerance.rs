// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Absolute-tolerance comparisons for objective values.
//!
//! The search maintains its score incrementally by adding one delta per
//! accepted swap. Over millions of accepted moves the running sum drifts from
//! a from-scratch recomputation by a few ulps per step, so equality checks
//! between the two must go through a tolerance instead of `==`.

/// Tolerance used when a single swap delta is compared against a recomputation.
pub const DELTA_TOLERANCE: f64 = 1e-9;

/// Returns `true` if `a` and `b` differ by at most `tolerance`.
///
/// Non-finite inputs never compare equal.
///
/// # Examples
///
/// ```rust
/// # use unimatch_core::num::tolerance::approx_eq;
/// assert!(approx_eq(0.1 + 0.2, 0.3, 1e-12));
/// assert!(!approx_eq(1.0, 1.1, 1e-3));
/// assert!(!approx_eq(f64::NAN, f64::NAN, 1.0));
/// ```
#[inline]
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    debug_assert!(
        tolerance >= 0.0,
        "called `approx_eq` with negative tolerance: {}",
        tolerance
    );

    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= tolerance
}

/// Returns the absolute difference between `a` and `b`, or `f64::INFINITY`
/// if either value is not finite.
#[inline]
pub fn drift(a: f64, b: f64) -> f64 {
    if !a.is_finite() || !b.is_finite() {
        return f64::INFINITY;
    }
    (a - b).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq_within_tolerance() {
        assert!(approx_eq(1.0, 1.0 + 1e-10, DELTA_TOLERANCE));
        assert!(approx_eq(-2.0, -2.0, 0.0));
    }

    #[test]
    fn test_approx_eq_outside_tolerance() {
        assert!(!approx_eq(1.0, 1.0 + 1e-6, DELTA_TOLERANCE));
    }

    #[test]
    fn test_non_finite_never_equal() {
        assert!(!approx_eq(f64::INFINITY, f64::INFINITY, 1.0));
        assert!(!approx_eq(f64::NAN, 0.0, 1.0));
    }

    #[test]
    fn test_drift() {
        assert_eq!(drift(1.5, 1.0), 0.5);
        assert_eq!(drift(1.0, 1.5), 0.5);
        assert_eq!(drift(f64::NAN, 1.0), f64::INFINITY);
    }
}
