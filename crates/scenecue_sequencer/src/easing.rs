// SPDX-License-Identifier: MIT OR Apache-2.0
//! Easing curves that reshape linear progress.

use crate::error::{Result, SequencerError};
use serde::{Deserialize, Serialize};

/// Newton-Raphson iterations used to invert the bezier x(u) polynomial
const NEWTON_ITERATIONS: usize = 8;

/// Bisection steps used when the derivative vanishes
const BISECTION_STEPS: usize = 20;

/// Derivative magnitude below which Newton-Raphson is abandoned
const DERIVATIVE_EPSILON: f64 = 1e-6;

/// Easing applied to a keyframe segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Easing {
    /// Constant rate
    #[default]
    Linear,
    /// Quadratic acceleration, `t²`
    EaseIn,
    /// Quadratic deceleration, `t(2 - t)`
    EaseOut,
    /// Quadratic acceleration then deceleration
    EaseInOut,
    /// CSS-style cubic bezier through (0,0), (x1,y1), (x2,y2), (1,1)
    CubicBezier {
        /// First control point x, in [0, 1]
        x1: f64,
        /// First control point y
        y1: f64,
        /// Second control point x, in [0, 1]
        x2: f64,
        /// Second control point y
        y2: f64,
    },
}

impl Easing {
    /// Build a cubic bezier easing, rejecting x control points that would
    /// make the curve non-monotonic in x.
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        let easing = Self::CubicBezier { x1, y1, x2, y2 };
        if easing.is_solvable() {
            Ok(easing)
        } else {
            Err(SequencerError::InvalidBezier { x1, y1, x2, y2 })
        }
    }

    /// Whether this easing can be evaluated reliably
    pub fn is_solvable(&self) -> bool {
        match *self {
            Self::CubicBezier { x1, y1, x2, y2 } => {
                [x1, y1, x2, y2].iter().all(|v| v.is_finite())
                    && (0.0..=1.0).contains(&x1)
                    && (0.0..=1.0).contains(&x2)
            }
            _ => true,
        }
    }

    /// Apply the easing to progress `t`, clamped to [0, 1]
    pub fn apply(&self, t: f64) -> f64 {
        apply_easing(self, t)
    }
}

/// Map linear progress to eased progress.
///
/// `t` is clamped to [0, 1] first; NaN is treated as 0.
pub fn apply_easing(easing: &Easing, t: f64) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    match *easing {
        Easing::Linear => t,
        Easing::EaseIn => t * t,
        Easing::EaseOut => t * (2.0 - t),
        Easing::EaseInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                -1.0 + (4.0 - 2.0 * t) * t
            }
        }
        Easing::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
    }
}

/// One coordinate of the bezier with endpoints fixed at 0 and 1
fn bezier_coord(p1: f64, p2: f64, u: f64) -> f64 {
    let mu = 1.0 - u;
    3.0 * mu * mu * u * p1 + 3.0 * mu * u * u * p2 + u * u * u
}

fn bezier_coord_derivative(p1: f64, p2: f64, u: f64) -> f64 {
    let mu = 1.0 - u;
    3.0 * mu * mu * p1 + 6.0 * mu * u * (p2 - p1) + 3.0 * u * u * (1.0 - p2)
}

/// Solve x(u) = x for u, then return y(u)
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    let mut u = x;
    let mut converged = true;
    for _ in 0..NEWTON_ITERATIONS {
        let derivative = bezier_coord_derivative(x1, x2, u);
        if derivative.abs() < DERIVATIVE_EPSILON {
            converged = false;
            break;
        }
        u -= (bezier_coord(x1, x2, u) - x) / derivative;
    }

    if !converged || !(0.0..=1.0).contains(&u) {
        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..BISECTION_STEPS {
            u = 0.5 * (lo + hi);
            if bezier_coord(x1, x2, u) < x {
                lo = u;
            } else {
                hi = u;
            }
        }
        u = 0.5 * (lo + hi);
    }

    bezier_coord(y1, y2, u)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_endpoints_are_fixed() {
        let easings = [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::CubicBezier { x1: 0.25, y1: 0.1, x2: 0.25, y2: 1.0 },
        ];
        for easing in easings {
            assert!(apply_easing(&easing, 0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((apply_easing(&easing, 1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(apply_easing(&Easing::Linear, -3.0), 0.0);
        assert_eq!(apply_easing(&Easing::EaseIn, 7.0), 1.0);
        assert_eq!(apply_easing(&Easing::EaseOut, f64::NAN), 0.0);
    }

    #[test]
    fn test_quadratic_curves() {
        assert!((apply_easing(&Easing::EaseIn, 0.5) - 0.25).abs() < EPS);
        assert!((apply_easing(&Easing::EaseOut, 0.5) - 0.75).abs() < EPS);
        assert!((apply_easing(&Easing::EaseInOut, 0.25) - 0.125).abs() < EPS);
        assert!((apply_easing(&Easing::EaseInOut, 0.5) - 0.5).abs() < EPS);
        assert!((apply_easing(&Easing::EaseInOut, 0.75) - 0.875).abs() < EPS);
    }

    #[test]
    fn test_symmetric_bezier_midpoint() {
        let ease = Easing::cubic_bezier(0.42, 0.0, 0.58, 1.0).unwrap();
        assert!((ease.apply(0.5) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_linear_bezier_matches_linear() {
        let ease = Easing::cubic_bezier(0.0, 0.0, 1.0, 1.0).unwrap();
        for i in 0..=10 {
            let t = f64::from(i) / 10.0;
            assert!((ease.apply(t) - t).abs() < 1e-4, "t = {t}");
        }
    }

    #[test]
    fn test_bezier_with_flat_start_uses_bisection() {
        // Derivative of x(u) is zero at u = 0 for x1 = 0
        let ease = Easing::cubic_bezier(0.0, 0.0, 0.0, 1.0).unwrap();
        let value = ease.apply(0.001);
        assert!(value.is_finite());
        assert!((0.0..=1.0).contains(&value));
    }

    #[test]
    fn test_bezier_is_monotonic() {
        let ease = Easing::cubic_bezier(0.25, 0.1, 0.25, 1.0).unwrap();
        let mut previous = 0.0;
        for i in 1..=100 {
            let value = ease.apply(f64::from(i) / 100.0);
            assert!(value >= previous - 1e-9);
            previous = value;
        }
    }

    #[test]
    fn test_invalid_bezier_rejected() {
        assert!(Easing::cubic_bezier(1.5, 0.0, 0.5, 1.0).is_err());
        assert!(Easing::cubic_bezier(0.5, 0.0, -0.1, 1.0).is_err());
        assert!(Easing::cubic_bezier(0.5, f64::NAN, 0.5, 1.0).is_err());
        // y may overshoot
        assert!(Easing::cubic_bezier(0.3, -0.5, 0.7, 1.5).is_ok());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&Easing::EaseInOut).unwrap();
        assert_eq!(json, r#"{"kind":"easeInOut"}"#);
        let parsed: Easing =
            serde_json::from_str(r#"{"kind":"cubicBezier","x1":0.1,"y1":0.2,"x2":0.3,"y2":0.4}"#)
                .unwrap();
        assert_eq!(parsed, Easing::CubicBezier { x1: 0.1, y1: 0.2, x2: 0.3, y2: 0.4 });
    }
}
