//! Reinforcing Bar Properties
//!
//! Nominal properties of deformed reinforcing bars: cross-sectional area,
//! unit weight, and tension lap-splice length.
//!
//! Bar diameters are whole millimetres (`u32`) throughout the crate so that
//! "same diameter" comparisons are exact.
//!
//! ## Lap Lengths
//!
//! The lap length is a multiple of the bar diameter that depends on the
//! concrete class and the steel grade. Multipliers scale with `fy / sqrt(fck)`
//! and are normalised to 40·d for C25 concrete with grade 400 steel.

use std::collections::HashMap;
use std::f64::consts::PI;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{RebarError, RebarResult};
use crate::units::{KgPerMeter, Millimeters, SquareCentimeters, SquareMillimeters};

/// Standard bar diameters (mm) stocked by most fabricators
pub const STANDARD_DIAMETERS_MM: [u32; 14] = [6, 8, 10, 12, 14, 16, 18, 20, 22, 25, 28, 32, 36, 40];

/// Unit weight coefficient: 7850 kg/m³ steel, rounded the way bar schedules do (kg/m per mm²)
const UNIT_WEIGHT_COEFF: f64 = 0.00617;

/// Lap lengths are never shorter than this (mm)
pub const MIN_LAP_LENGTH_MM: f64 = 300.0;

/// Concrete strength class (characteristic cylinder strength in MPa)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConcreteGrade {
    C20,
    #[default]
    C25,
    C30,
    C35,
    C40,
}

impl ConcreteGrade {
    /// All concrete grades for selection lists
    pub const ALL: [ConcreteGrade; 5] = [
        ConcreteGrade::C20,
        ConcreteGrade::C25,
        ConcreteGrade::C30,
        ConcreteGrade::C35,
        ConcreteGrade::C40,
    ];

    /// Characteristic strength fck (MPa)
    pub fn fck_mpa(&self) -> f64 {
        match self {
            ConcreteGrade::C20 => 20.0,
            ConcreteGrade::C25 => 25.0,
            ConcreteGrade::C30 => 30.0,
            ConcreteGrade::C35 => 35.0,
            ConcreteGrade::C40 => 40.0,
        }
    }

    /// Parse from common string representations ("C25", "c25", "25")
    pub fn from_str_flexible(s: &str) -> RebarResult<Self> {
        match s.trim().to_uppercase().trim_start_matches('C') {
            "20" => Ok(ConcreteGrade::C20),
            "25" => Ok(ConcreteGrade::C25),
            "30" => Ok(ConcreteGrade::C30),
            "35" => Ok(ConcreteGrade::C35),
            "40" => Ok(ConcreteGrade::C40),
            _ => Err(RebarError::invalid_input("concrete_grade", s, "Unknown concrete class")),
        }
    }
}

impl std::fmt::Display for ConcreteGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}", self.fck_mpa() as u32)
    }
}

/// Reinforcing steel grade (characteristic yield strength in MPa)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SteelGrade {
    Grade300,
    #[default]
    Grade400,
    Grade500,
}

impl SteelGrade {
    /// All steel grades for selection lists
    pub const ALL: [SteelGrade; 3] = [SteelGrade::Grade300, SteelGrade::Grade400, SteelGrade::Grade500];

    /// Yield strength fy (MPa)
    pub fn fy_mpa(&self) -> f64 {
        match self {
            SteelGrade::Grade300 => 300.0,
            SteelGrade::Grade400 => 400.0,
            SteelGrade::Grade500 => 500.0,
        }
    }

    /// Parse from common string representations ("400", "Grade400", "CB400")
    pub fn from_str_flexible(s: &str) -> RebarResult<Self> {
        let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
        match digits.as_str() {
            "300" => Ok(SteelGrade::Grade300),
            "400" => Ok(SteelGrade::Grade400),
            "500" => Ok(SteelGrade::Grade500),
            _ => Err(RebarError::invalid_input("steel_grade", s, "Unknown steel grade")),
        }
    }
}

impl std::fmt::Display for SteelGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Grade {}", self.fy_mpa() as u32)
    }
}

/// Lap-length multipliers (× bar diameter), keyed by concrete and steel grade
static LAP_MULTIPLIERS: Lazy<HashMap<(ConcreteGrade, SteelGrade), f64>> = Lazy::new(|| {
    use ConcreteGrade::*;
    use SteelGrade::*;
    [
        ((C20, Grade300), 34.0),
        ((C25, Grade300), 30.0),
        ((C30, Grade300), 28.0),
        ((C35, Grade300), 26.0),
        ((C40, Grade300), 24.0),
        ((C20, Grade400), 45.0),
        ((C25, Grade400), 40.0),
        ((C30, Grade400), 37.0),
        ((C35, Grade400), 34.0),
        ((C40, Grade400), 32.0),
        ((C20, Grade500), 56.0),
        ((C25, Grade500), 50.0),
        ((C30, Grade500), 46.0),
        ((C35, Grade500), 43.0),
        ((C40, Grade500), 40.0),
    ]
    .into_iter()
    .collect()
});

/// Nominal cross-sectional area of one bar
pub fn bar_area(diameter_mm: u32) -> SquareCentimeters {
    let d = diameter_mm as f64;
    SquareMillimeters(PI * d * d / 4.0).into()
}

/// Nominal area of one bar in cm²
pub fn bar_area_cm2(diameter_mm: u32) -> f64 {
    bar_area(diameter_mm).value()
}

/// Total area of `count` bars in cm²
pub fn bars_area_cm2(diameter_mm: u32, count: usize) -> f64 {
    bar_area_cm2(diameter_mm) * count as f64
}

/// Unit weight of one bar
pub fn unit_weight(diameter_mm: u32) -> KgPerMeter {
    let d = diameter_mm as f64;
    KgPerMeter(UNIT_WEIGHT_COEFF * d * d)
}

/// Lap-splice multiplier for a concrete/steel combination
pub fn lap_multiplier(concrete: ConcreteGrade, steel: SteelGrade) -> f64 {
    LAP_MULTIPLIERS.get(&(concrete, steel)).copied().unwrap_or(40.0)
}

/// Tension lap-splice length for a bar
///
/// # Example
///
/// ```rust
/// use rebar_core::materials::rebar::{lap_length, ConcreteGrade, SteelGrade};
///
/// let lap = lap_length(20, ConcreteGrade::C25, SteelGrade::Grade400);
/// assert_eq!(lap.0, 800.0);
/// ```
pub fn lap_length(diameter_mm: u32, concrete: ConcreteGrade, steel: SteelGrade) -> Millimeters {
    let raw = lap_multiplier(concrete, steel) * diameter_mm as f64;
    Millimeters(raw.max(MIN_LAP_LENGTH_MM))
}

/// Short bar-mark label, e.g. `3D20`
pub fn bar_label(count: usize, diameter_mm: u32) -> String {
    format!("{}D{}", count, diameter_mm)
}

/// Index of a diameter within the standard size list (for "how many sizes apart" checks)
pub fn size_index(diameter_mm: u32) -> Option<usize> {
    STANDARD_DIAMETERS_MM.iter().position(|&d| d == diameter_mm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_area() {
        // D20: π·20²/4 = 314.16 mm² = 3.1416 cm²
        assert!((bar_area_cm2(20) - 3.1416).abs() < 1e-3);
        // 2D20 ≈ 6.28 cm²
        assert!((bars_area_cm2(20, 2) - 6.283).abs() < 1e-3);
    }

    #[test]
    fn test_unit_weight() {
        // D16: 0.00617 · 256 = 1.579 kg/m
        assert!((unit_weight(16).value() - 1.5795).abs() < 1e-3);
    }

    #[test]
    fn test_lap_length_scales_with_grades() {
        let base = lap_length(20, ConcreteGrade::C25, SteelGrade::Grade400);
        let weaker_concrete = lap_length(20, ConcreteGrade::C20, SteelGrade::Grade400);
        let stronger_steel = lap_length(20, ConcreteGrade::C25, SteelGrade::Grade500);
        assert_eq!(base.0, 800.0);
        assert!(weaker_concrete.0 > base.0);
        assert!(stronger_steel.0 > base.0);
    }

    #[test]
    fn test_lap_length_minimum() {
        let lap = lap_length(6, ConcreteGrade::C40, SteelGrade::Grade300);
        assert_eq!(lap.0, MIN_LAP_LENGTH_MM);
    }

    #[test]
    fn test_every_grade_pair_has_multiplier() {
        for concrete in ConcreteGrade::ALL {
            for steel in SteelGrade::ALL {
                assert!(LAP_MULTIPLIERS.contains_key(&(concrete, steel)));
            }
        }
    }

    #[test]
    fn test_grade_parsing() {
        assert_eq!(ConcreteGrade::from_str_flexible("c30").unwrap(), ConcreteGrade::C30);
        assert_eq!(SteelGrade::from_str_flexible("CB400").unwrap(), SteelGrade::Grade400);
        assert!(SteelGrade::from_str_flexible("A36").is_err());
    }

    #[test]
    fn test_size_index() {
        assert_eq!(size_index(6), Some(0));
        assert_eq!(size_index(25), Some(9));
        assert_eq!(size_index(21), None);
    }
}
