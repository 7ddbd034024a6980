//! # Unit Types
//!
//! Type-safe wrappers for the metric units used in reinforcement detailing.
//! They are plain `f64` newtypes that serialize as bare numbers.
//!
//! ## Conventions
//!
//! - Geometry (spans, widths, bar diameters, cut positions): millimetres (mm)
//! - Steel areas from analysis: square centimetres (cm²)
//! - Bar weights: kilograms per metre (kg/m), totals in kilograms (kg)
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::units::{Meters, Millimeters, SquareCentimeters, SquareMillimeters};
//!
//! let span = Millimeters(6500.0);
//! let span_m: Meters = span.into();
//! assert_eq!(span_m.0, 6.5);
//!
//! let area: SquareCentimeters = SquareMillimeters(314.0).into();
//! assert!((area.0 - 3.14).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Length Units
// ============================================================================

/// Length in millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Length in metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 / 1000.0)
    }
}

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

// ============================================================================
// Area Units
// ============================================================================

/// Area in square millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareMillimeters(pub f64);

/// Area in square centimetres (unit of analysis steel requirements)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareCentimeters(pub f64);

impl From<SquareMillimeters> for SquareCentimeters {
    fn from(mm2: SquareMillimeters) -> Self {
        SquareCentimeters(mm2.0 / 100.0)
    }
}

impl From<SquareCentimeters> for SquareMillimeters {
    fn from(cm2: SquareCentimeters) -> Self {
        SquareMillimeters(cm2.0 * 100.0)
    }
}

// ============================================================================
// Mass Units
// ============================================================================

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

/// Linear mass in kilograms per metre (bar unit weight)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KgPerMeter(pub f64);

impl Mul<Meters> for KgPerMeter {
    type Output = Kilograms;
    fn mul(self, rhs: Meters) -> Self::Output {
        Kilograms(self.0 * rhs.0)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Millimeters);
impl_arithmetic!(Meters);
impl_arithmetic!(SquareMillimeters);
impl_arithmetic!(SquareCentimeters);
impl_arithmetic!(Kilograms);
impl_arithmetic!(KgPerMeter);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_m() {
        let mm = Millimeters(11700.0);
        let m: Meters = mm.into();
        assert_eq!(m.0, 11.7);
    }

    #[test]
    fn test_area_conversion() {
        let cm2 = SquareCentimeters(3.5);
        let mm2: SquareMillimeters = cm2.into();
        assert_eq!(mm2.0, 350.0);
    }

    #[test]
    fn test_weight_from_length() {
        let unit = KgPerMeter(2.466);
        let total = unit * Meters(10.0);
        assert!((total.0 - 24.66).abs() < 1e-9);
    }

    #[test]
    fn test_arithmetic() {
        let a = SquareCentimeters(10.0);
        let b = SquareCentimeters(4.0);
        assert_eq!((a + b).0, 14.0);
        assert_eq!((a - b).0, 6.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).0, 5.0);
    }

    #[test]
    fn test_serialization() {
        let len = Millimeters(6500.0);
        let json = serde_json::to_string(&len).unwrap();
        assert_eq!(json, "6500.0");

        let roundtrip: Millimeters = serde_json::from_str(&json).unwrap();
        assert_eq!(len, roundtrip);
    }
}
