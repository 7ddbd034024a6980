//! # Design Settings
//!
//! One fully-resolved configuration object for a solve. Every group carries
//! `#[serde(default)]`, so a project file may specify only the values it
//! wants to change and the rest resolve to defaults at load time. Formulas
//! elsewhere in the crate read fields directly and never apply their own
//! fallbacks.
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::settings::DesignSettings;
//!
//! let settings: DesignSettings =
//!     serde_json::from_str(r#"{ "beam": { "cover_mm": 30.0 } }"#).unwrap();
//! assert_eq!(settings.beam.cover_mm, 30.0);
//! assert_eq!(settings.rebar.max_layers, 2);
//! assert!(settings.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::cutting::SpliceZoneKind;
use crate::design::MemberType;
use crate::errors::{RebarError, RebarResult};
use crate::materials::{size_index, ConcreteGrade, SteelGrade};

/// Complete settings for one design solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DesignSettings {
    /// Section detailing (cover, stirrups, spacing)
    pub beam: BeamDetailing,
    /// Bar selection options
    pub rebar: RebarOptions,
    /// Stirrup leg count rules
    pub stirrups: StirrupLegRules,
    /// Bar cutting, splicing and anchorage
    pub cutting: CuttingSettings,
    /// Steel weight estimation ratios
    pub weight: WeightEstimation,
    /// Addon bridging thresholds
    pub bridging: BridgingSettings,
}

impl DesignSettings {
    /// Validate the resolved settings.
    ///
    /// Returns the first offending setting.
    pub fn validate(&self) -> RebarResult<()> {
        let b = &self.beam;
        if b.cover_mm <= 0.0 {
            return Err(RebarError::invalid_settings("beam.cover_mm", "must be positive"));
        }
        if b.stirrup_diameter_mm == 0 {
            return Err(RebarError::invalid_settings("beam.stirrup_diameter_mm", "must be positive"));
        }
        if b.aggregate_size_mm < 0.0 || b.min_clear_spacing_mm < 0.0 {
            return Err(RebarError::invalid_settings(
                "beam.min_clear_spacing_mm",
                "spacing inputs cannot be negative",
            ));
        }
        if let Some(mult) = b.spacing_diameter_multiplier {
            if mult <= 0.0 {
                return Err(RebarError::invalid_settings(
                    "beam.spacing_diameter_multiplier",
                    "must be positive when set",
                ));
            }
        }

        let r = &self.rebar;
        if r.available_diameters_mm.is_empty() {
            return Err(RebarError::invalid_settings("rebar.available_diameters_mm", "list is empty"));
        }
        if let Some(d) = r.available_diameters_mm.iter().find(|d| size_index(**d).is_none()) {
            return Err(RebarError::invalid_settings(
                "rebar.available_diameters_mm",
                format!("{} mm is not a standard bar size", d),
            ));
        }
        if !(1..=2).contains(&r.max_layers) {
            return Err(RebarError::invalid_settings("rebar.max_layers", "must be 1 or 2"));
        }
        if r.max_backbone_count < 2 {
            return Err(RebarError::invalid_settings("rebar.max_backbone_count", "must be at least 2"));
        }
        if r.min_backbone_diameter_mm > r.max_backbone_diameter_mm {
            return Err(RebarError::invalid_settings(
                "rebar.min_backbone_diameter_mm",
                "exceeds rebar.max_backbone_diameter_mm",
            ));
        }
        if r.safety_factor < 1.0 {
            return Err(RebarError::invalid_settings("rebar.safety_factor", "must be at least 1.0"));
        }

        let c = &self.cutting;
        if c.max_bar_length_mm <= 0.0 {
            return Err(RebarError::invalid_settings("cutting.max_bar_length_mm", "must be positive"));
        }
        for (name, rule) in [("cutting.beam_zones", &c.beam_zones), ("cutting.girder_zones", &c.girder_zones)] {
            if !(0.0..=0.5).contains(&rule.support_zone_ratio) {
                return Err(RebarError::invalid_settings(name, "support_zone_ratio must be within 0..=0.5"));
            }
        }
        if c.stagger_factor < 0.0 || c.stagger_min_mm < 0.0 {
            return Err(RebarError::invalid_settings("cutting.stagger_factor", "cannot be negative"));
        }

        if self.weight.lap_waste_factor < 1.0 {
            return Err(RebarError::invalid_settings("weight.lap_waste_factor", "must be at least 1.0"));
        }
        Ok(())
    }

    /// Available diameters sorted ascending and de-duplicated
    pub fn sorted_diameters(&self) -> Vec<u32> {
        let mut diameters = self.rebar.available_diameters_mm.clone();
        diameters.sort_unstable();
        diameters.dedup();
        diameters
    }
}

/// Cross-section detailing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamDetailing {
    /// Side cover to the stirrup (mm)
    pub cover_mm: f64,
    /// Stirrup diameter estimate (mm)
    pub stirrup_diameter_mm: u32,
    /// Maximum aggregate size (mm)
    pub aggregate_size_mm: f64,
    /// Absolute minimum clear spacing between bars (mm)
    pub min_clear_spacing_mm: f64,
    /// Optional clear spacing as a multiple of the bar diameter
    pub spacing_diameter_multiplier: Option<f64>,
}

impl Default for BeamDetailing {
    fn default() -> Self {
        Self {
            cover_mm: 25.0,
            stirrup_diameter_mm: 8,
            aggregate_size_mm: 20.0,
            min_clear_spacing_mm: 25.0,
            spacing_diameter_multiplier: None,
        }
    }
}

/// Bar selection options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebarOptions {
    /// Diameters the fabricator stocks (mm)
    pub available_diameters_mm: Vec<u32>,
    /// Smallest diameter considered for backbone bars (mm)
    pub min_backbone_diameter_mm: u32,
    /// Largest diameter considered for backbone bars (mm)
    pub max_backbone_diameter_mm: u32,
    /// Largest backbone bar count per face
    pub max_backbone_count: usize,
    /// Maximum number of bar layers per face (1 or 2)
    pub max_layers: usize,
    /// Round odd layer counts up to even when space allows
    pub prefer_symmetric: bool,
    /// Favour addons with the backbone diameter
    pub prefer_single_diameter: bool,
    /// Multiplier applied to required areas before design
    pub safety_factor: f64,
}

impl Default for RebarOptions {
    fn default() -> Self {
        Self {
            available_diameters_mm: vec![12, 14, 16, 18, 20, 22, 25, 28],
            min_backbone_diameter_mm: 14,
            max_backbone_diameter_mm: 25,
            max_backbone_count: 4,
            max_layers: 2,
            prefer_symmetric: true,
            prefer_single_diameter: true,
            safety_factor: 1.0,
        }
    }
}

/// One entry of the advanced stirrup-leg table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StirrupLegEntry {
    /// Total bars in the outer layer
    pub bar_count: usize,
    /// Whether addon bars are present at the section
    pub has_addons: bool,
    /// Number of stirrup legs
    pub legs: usize,
}

impl StirrupLegEntry {
    pub fn new(bar_count: usize, has_addons: bool, legs: usize) -> Self {
        Self { bar_count, has_addons, legs }
    }
}

/// Stirrup leg count rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StirrupLegRules {
    /// Use the lookup table before the width thresholds
    pub use_advanced_rules: bool,
    /// Lookup table keyed by (bar count, has addons)
    pub advanced_table: Vec<StirrupLegEntry>,
    /// Compact width rule, `"maxWidth:legs;..."`, e.g. `"250:2;400:4;600:6"`
    pub width_rule: String,
}

impl Default for StirrupLegRules {
    fn default() -> Self {
        Self {
            use_advanced_rules: false,
            advanced_table: vec![
                StirrupLegEntry::new(2, false, 2),
                StirrupLegEntry::new(3, false, 2),
                StirrupLegEntry::new(4, false, 2),
                StirrupLegEntry::new(4, true, 4),
                StirrupLegEntry::new(5, true, 4),
                StirrupLegEntry::new(6, true, 4),
                StirrupLegEntry::new(8, true, 6),
            ],
            width_rule: "250:2;400:4;600:6".to_string(),
        }
    }
}

/// Where splices may go, per bar face, for one member type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpliceZoneRule {
    /// Allowed zone kind for top bars
    pub top: SpliceZoneKind,
    /// Allowed zone kind for bottom bars
    pub bottom: SpliceZoneKind,
    /// Fraction of the span treated as the support zone at each end
    pub support_zone_ratio: f64,
}

impl SpliceZoneRule {
    /// Zone kind for a bar face
    pub fn kind_for(&self, is_top_bar: bool) -> SpliceZoneKind {
        if is_top_bar {
            self.top
        } else {
            self.bottom
        }
    }
}

/// Cutting, splicing, and anchorage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuttingSettings {
    /// Longest bar the mill supplies (mm)
    pub max_bar_length_mm: f64,
    /// Splice zones for ordinary beams
    pub beam_zones: SpliceZoneRule,
    /// Splice zones for girders
    pub girder_zones: SpliceZoneRule,
    /// Hook length as a multiple of bar diameter
    pub hook_length_factor: f64,
    /// Minimum hook length (mm)
    pub hook_min_length_mm: f64,
    /// Hook bend angle (degrees)
    pub hook_angle_deg: f64,
    /// Minimum distance between staggered splices (mm)
    pub stagger_min_mm: f64,
    /// Stagger distance as a multiple of the lap length
    pub stagger_factor: f64,
    /// Concrete class used for lap lengths
    pub concrete_grade: ConcreteGrade,
    /// Steel grade used for lap lengths
    pub steel_grade: SteelGrade,
}

impl CuttingSettings {
    /// Splice-zone rule for a member type
    pub fn zones_for(&self, member: MemberType) -> &SpliceZoneRule {
        match member {
            MemberType::Beam => &self.beam_zones,
            MemberType::Girder => &self.girder_zones,
        }
    }
}

impl Default for CuttingSettings {
    fn default() -> Self {
        Self {
            max_bar_length_mm: 11700.0,
            beam_zones: SpliceZoneRule {
                top: SpliceZoneKind::MidSpan,
                bottom: SpliceZoneKind::Support,
                support_zone_ratio: 0.25,
            },
            girder_zones: SpliceZoneRule {
                top: SpliceZoneKind::MidSpan,
                bottom: SpliceZoneKind::Support,
                support_zone_ratio: 0.2,
            },
            hook_length_factor: 12.0,
            hook_min_length_mm: 150.0,
            hook_angle_deg: 90.0,
            stagger_min_mm: 600.0,
            stagger_factor: 1.3,
            concrete_grade: ConcreteGrade::C25,
            steel_grade: SteelGrade::Grade400,
        }
    }
}

/// Addon length ratios (fraction of span length) for weight estimation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthRatios {
    /// Addons at a support (per side)
    pub support: f64,
    /// Addons at mid-span
    pub mid_span: f64,
}

/// Steel weight estimation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightEstimation {
    /// Allowance for backbone lap splices
    pub lap_waste_factor: f64,
    /// Ratios for ordinary beams
    pub beam: LengthRatios,
    /// Ratios for girders
    pub girder: LengthRatios,
}

impl WeightEstimation {
    /// Ratios for a member type
    pub fn ratios_for(&self, member: MemberType) -> LengthRatios {
        match member {
            MemberType::Beam => self.beam,
            MemberType::Girder => self.girder,
        }
    }
}

impl Default for WeightEstimation {
    fn default() -> Self {
        Self {
            lap_waste_factor: 1.03,
            beam: LengthRatios { support: 0.3, mid_span: 0.7 },
            girder: LengthRatios { support: 0.33, mid_span: 0.75 },
        }
    }
}

/// Addon bridging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgingSettings {
    /// Support addon cut-off distance as a fraction of span, ordinary beams
    pub beam_extension_ratio: f64,
    /// Support addon cut-off distance as a fraction of span, girders
    pub girder_extension_ratio: f64,
    /// Gaps shorter than this are always bridged (mm)
    pub min_gap_mm: f64,
    /// Gaps shorter than this many bar diameters are bridged
    pub gap_diameter_factor: f64,
}

impl BridgingSettings {
    /// Extension ratio for a member type
    pub fn extension_ratio(&self, member: MemberType) -> f64 {
        match member {
            MemberType::Beam => self.beam_extension_ratio,
            MemberType::Girder => self.girder_extension_ratio,
        }
    }
}

impl Default for BridgingSettings {
    fn default() -> Self {
        Self {
            beam_extension_ratio: 0.25,
            girder_extension_ratio: 0.33,
            min_gap_mm: 1000.0,
            gap_diameter_factor: 40.0,
        }
    }
}
