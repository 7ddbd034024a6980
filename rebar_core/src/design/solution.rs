//! # Candidate Designs
//!
//! [`ContinuousBeamSolution`] is the design under construction for one
//! candidate backbone: the backbone per face plus every addon placement.
//! Support addons are stored as `Arc<RebarSpec>` so both spans adjoining a
//! support hold the very same spec.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::location::{Face, LocationKey, SpanPoint};
use crate::materials::{bar_label, bars_area_cm2};

/// Option name carried by the failure sentinel
pub const FAILED_OPTION_NAME: &str = "FAILED";

// =============================================================================
// REBAR SPEC
// =============================================================================

/// One addon placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebarSpec {
    /// Bar diameter (mm)
    pub diameter_mm: u32,

    /// Number of addon bars
    pub count: usize,

    /// Outermost layer the addon reaches (1 = alongside the backbone)
    pub layer: usize,

    /// Face reinforced
    pub face: Face,

    /// Addon bars per layer, when spread over more than one layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_breakdown: Option<Vec<usize>>,

    /// Bridged across a whole span
    #[serde(default)]
    pub is_running_through: bool,
}

impl RebarSpec {
    /// Single-layer addon
    pub fn single_layer(face: Face, diameter_mm: u32, count: usize) -> Self {
        Self {
            diameter_mm,
            count,
            layer: 1,
            face,
            layer_breakdown: None,
            is_running_through: false,
        }
    }

    /// Addon spread over layers; `breakdown[i]` is the addon count in layer i+1
    pub fn layered(face: Face, diameter_mm: u32, breakdown: Vec<usize>) -> Self {
        let count = breakdown.iter().sum();
        let layer = breakdown.iter().rposition(|n| *n > 0).map(|i| i + 1).unwrap_or(1);
        Self {
            diameter_mm,
            count,
            layer,
            face,
            layer_breakdown: Some(breakdown),
            is_running_through: false,
        }
    }

    /// "Nothing needed" spec
    pub fn none(face: Face, diameter_mm: u32) -> Self {
        Self::single_layer(face, diameter_mm, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Steel area (cm²)
    pub fn area_cm2(&self) -> f64 {
        bars_area_cm2(self.diameter_mm, self.count)
    }

    /// Same diameter, count and layer
    pub fn is_similar(&self, other: &RebarSpec) -> bool {
        self.diameter_mm == other.diameter_mm && self.count == other.count && self.layer == other.layer
    }

    /// Bar-mark label, e.g. `2D18`
    pub fn label(&self) -> String {
        bar_label(self.count, self.diameter_mm)
    }

    /// Addon bars alongside the backbone
    pub fn layer1_count(&self) -> usize {
        match &self.layer_breakdown {
            Some(breakdown) => breakdown.first().copied().unwrap_or(0),
            None => self.count,
        }
    }

    /// Copy of this spec flagged as running through the span
    pub fn running_through(&self) -> Self {
        Self {
            is_running_through: true,
            ..self.clone()
        }
    }
}

// =============================================================================
// BACKBONE
// =============================================================================

/// Continuous bars along one face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Backbone {
    pub diameter_mm: u32,
    pub count: usize,
}

impl Backbone {
    pub fn new(diameter_mm: u32, count: usize) -> Self {
        Self { diameter_mm, count }
    }

    /// Steel area (cm²)
    pub fn area_cm2(&self) -> f64 {
        bars_area_cm2(self.diameter_mm, self.count)
    }

    pub fn label(&self) -> String {
        bar_label(self.count, self.diameter_mm)
    }
}

// =============================================================================
// SOLUTION
// =============================================================================

/// A complete (or failed) design for one beam group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousBeamSolution {
    /// Name derived from the backbone, e.g. `T2D20-B3D18`
    pub option_name: String,

    /// Top backbone
    pub top: Backbone,

    /// Bottom backbone
    pub bottom: Backbone,

    /// Stirrup diameter (mm)
    pub stirrup_diameter_mm: u32,

    /// Addon placements
    pub reinforcements: BTreeMap<LocationKey, Arc<RebarSpec>>,

    /// Estimated steel weight (kg)
    pub total_steel_weight_kg: f64,

    /// Weight efficiency (higher is lighter)
    pub efficiency_score: f64,

    /// Normalised weight score across candidates (0-100)
    pub weight_score: f64,

    /// Constructability score from the scorer (0-100)
    pub constructability_score: f64,

    /// Final ranking score
    pub total_score: f64,

    /// Bars added only to keep two bars in a layer
    #[serde(default)]
    pub wasted_bar_count: usize,

    pub is_valid: bool,

    /// Human-readable validation or failure message
    pub validation_message: String,
}

impl ContinuousBeamSolution {
    /// Empty design for a backbone pair
    pub fn new(top: Backbone, bottom: Backbone, stirrup_diameter_mm: u32) -> Self {
        Self {
            option_name: format!("T{}-B{}", top.label(), bottom.label()),
            top,
            bottom,
            stirrup_diameter_mm,
            reinforcements: BTreeMap::new(),
            total_steel_weight_kg: 0.0,
            efficiency_score: 0.0,
            weight_score: 0.0,
            constructability_score: 0.0,
            total_score: 0.0,
            wasted_bar_count: 0,
            is_valid: true,
            validation_message: String::new(),
        }
    }

    /// Sentinel returned when no feasible design exists
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            option_name: FAILED_OPTION_NAME.to_string(),
            top: Backbone::new(0, 0),
            bottom: Backbone::new(0, 0),
            stirrup_diameter_mm: 0,
            reinforcements: BTreeMap::new(),
            total_steel_weight_kg: 0.0,
            efficiency_score: 0.0,
            weight_score: 0.0,
            constructability_score: 0.0,
            total_score: 0.0,
            wasted_bar_count: 0,
            is_valid: false,
            validation_message: message.into(),
        }
    }

    /// Mark invalid with a message
    pub fn invalidate(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        self.validation_message = message.into();
    }

    /// Backbone for a face
    pub fn backbone(&self, face: Face) -> Backbone {
        match face {
            Face::Top => self.top,
            Face::Bottom => self.bottom,
        }
    }

    /// Addons placed at a span/face that provide steel at a check point
    pub fn covering_addons(&self, span: usize, face: Face, point: SpanPoint) -> impl Iterator<Item = &RebarSpec> {
        self.reinforcements
            .iter()
            .filter(move |(key, _)| key.covers(span, face, point))
            .map(|(_, spec)| spec.as_ref())
    }

    /// Backbone plus covering addons at a check point (cm²)
    pub fn provided_area_cm2(&self, span: usize, face: Face, point: SpanPoint) -> f64 {
        self.backbone(face).area_cm2()
            + self
                .covering_addons(span, face, point)
                .map(RebarSpec::area_cm2)
                .sum::<f64>()
    }

    /// Any addon reaches a second layer
    pub fn uses_second_layer(&self) -> bool {
        self.reinforcements.values().any(|s| s.layer > 1)
    }

    /// Distinct bar diameters in the design (backbones and addons)
    pub fn distinct_diameters(&self) -> BTreeSet<u32> {
        let mut set: BTreeSet<u32> = [self.top.diameter_mm, self.bottom.diameter_mm].into_iter().collect();
        set.extend(self.reinforcements.values().map(|s| s.diameter_mm));
        set
    }

    /// Total addon bar count (a proxy for placing effort)
    pub fn addon_bar_count(&self) -> usize {
        self.reinforcements.values().map(|s| s.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::location::Section;

    fn sample() -> ContinuousBeamSolution {
        let mut sol = ContinuousBeamSolution::new(Backbone::new(20, 2), Backbone::new(18, 3), 8);
        let support = Arc::new(RebarSpec::single_layer(Face::Top, 20, 2));
        sol.reinforcements
            .insert(LocationKey::new(0, Face::Top, Section::Right), Arc::clone(&support));
        sol.reinforcements
            .insert(LocationKey::new(1, Face::Top, Section::Left), support);
        sol.reinforcements.insert(
            LocationKey::new(0, Face::Bottom, Section::Mid),
            Arc::new(RebarSpec::layered(Face::Bottom, 16, vec![1, 2])),
        );
        sol
    }

    #[test]
    fn test_option_name() {
        assert_eq!(sample().option_name, "T2D20-B3D18");
    }

    #[test]
    fn test_provided_area_counts_only_covering_addons() {
        let sol = sample();
        let top_backbone = sol.top.area_cm2();
        // Span 1 end carries the support addon, span 1 start does not
        assert!((sol.provided_area_cm2(0, Face::Top, SpanPoint::Start) - top_backbone).abs() < 1e-9);
        assert!(sol.provided_area_cm2(0, Face::Top, SpanPoint::End) > top_backbone);
        assert!(sol.provided_area_cm2(1, Face::Top, SpanPoint::Start) > top_backbone);
        assert!((sol.provided_area_cm2(1, Face::Top, SpanPoint::Mid) - top_backbone).abs() < 1e-9);
    }

    #[test]
    fn test_layered_spec() {
        let spec = RebarSpec::layered(Face::Bottom, 16, vec![1, 2]);
        assert_eq!(spec.count, 3);
        assert_eq!(spec.layer, 2);
        assert_eq!(spec.layer1_count(), 1);
        let flat = RebarSpec::layered(Face::Bottom, 16, vec![2, 0]);
        assert_eq!(flat.layer, 1);
        assert_eq!(RebarSpec::single_layer(Face::Top, 20, 3).layer1_count(), 3);
    }

    #[test]
    fn test_second_layer_and_diameters() {
        let sol = sample();
        assert!(sol.uses_second_layer());
        assert_eq!(sol.distinct_diameters().into_iter().collect::<Vec<_>>(), vec![16, 18, 20]);
        assert_eq!(sol.addon_bar_count(), 7);
    }

    #[test]
    fn test_similarity() {
        let a = RebarSpec::single_layer(Face::Top, 20, 2);
        let b = RebarSpec::single_layer(Face::Top, 20, 2).running_through();
        let c = RebarSpec::single_layer(Face::Top, 20, 3);
        assert!(a.is_similar(&b));
        assert!(!a.is_similar(&c));
        assert!(b.is_running_through);
    }

    #[test]
    fn test_failed_sentinel_serializes() {
        let failed = ContinuousBeamSolution::failed("no fit");
        assert!(!failed.is_valid);
        let json = serde_json::to_string(&failed).unwrap();
        assert!(json.contains("FAILED"));
        assert!(json.contains("no fit"));
    }

    #[test]
    fn test_solution_roundtrip_keeps_location_strings() {
        let sol = sample();
        let json = serde_json::to_string(&sol).unwrap();
        assert!(json.contains("Span2_Top_Left"));
        let back: ContinuousBeamSolution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.reinforcements.len(), 3);
    }
}
