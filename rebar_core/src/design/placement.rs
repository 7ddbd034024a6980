//! # Bar Placement Rules
//!
//! Pure geometric capacity checks shared by the filling strategies and the
//! reinforcement filler.
//!
//! ```text
//! usable = width − 2·cover − 2·stirrup
//! n·d + (n−1)·s ≤ usable   →   n = ⌊(usable + s) / (d + s)⌋
//! ```
//!
//! where `s` is the minimum clear spacing for the bar diameter.

use std::str::FromStr;

use tracing::warn;

use crate::errors::RebarError;
use crate::settings::DesignSettings;

/// Aggregate-size multiplier for clear spacing
const AGGREGATE_SPACING_FACTOR: f64 = 1.33;

/// Thresholds used when the configured width rule cannot be parsed
const DEFAULT_WIDTH_RULE: [(f64, usize); 3] = [(250.0, 2), (400.0, 4), (600.0, 6)];

/// Width available to longitudinal bars inside the stirrup (mm)
pub fn usable_width_mm(width_mm: f64, settings: &DesignSettings) -> f64 {
    width_mm - 2.0 * settings.beam.cover_mm - 2.0 * settings.beam.stirrup_diameter_mm as f64
}

/// Minimum clear spacing between bars of a diameter (mm)
pub fn min_clear_spacing_mm(diameter_mm: u32, settings: &DesignSettings) -> f64 {
    let d = diameter_mm as f64;
    let mut spacing = d
        .max(AGGREGATE_SPACING_FACTOR * settings.beam.aggregate_size_mm)
        .max(settings.beam.min_clear_spacing_mm);
    if let Some(mult) = settings.beam.spacing_diameter_multiplier {
        spacing = spacing.max(d * mult);
    }
    spacing
}

/// Maximum bars of one diameter that fit in a single layer
pub fn max_bars_per_layer(width_mm: f64, diameter_mm: u32, settings: &DesignSettings) -> usize {
    let usable = usable_width_mm(width_mm, settings);
    if usable <= 0.0 || diameter_mm == 0 {
        return 0;
    }
    let spacing = min_clear_spacing_mm(diameter_mm, settings);
    let n = ((usable + spacing) / (diameter_mm as f64 + spacing)).floor();
    if n > 0.0 {
        n as usize
    } else {
        0
    }
}

/// Whether backbone and addon bars fit side by side in one layer.
///
/// Clear spacing uses the larger of the two diameters.
pub fn can_fit_mixed_bars(
    width_mm: f64,
    backbone_count: usize,
    backbone_diameter_mm: u32,
    addon_count: usize,
    addon_diameter_mm: u32,
    settings: &DesignSettings,
) -> bool {
    let total = backbone_count + addon_count;
    if total == 0 {
        return true;
    }
    let usable = usable_width_mm(width_mm, settings);
    if usable <= 0.0 {
        return false;
    }
    let spacing = min_clear_spacing_mm(backbone_diameter_mm.max(addon_diameter_mm), settings);
    let bars = backbone_count as f64 * backbone_diameter_mm as f64 + addon_count as f64 * addon_diameter_mm as f64;
    let gaps = (total - 1) as f64 * spacing;
    bars + gaps <= usable + 1e-6
}

/// Width thresholds parsed from a compact rule string such as `"250:2;400:4;600:6"`
#[derive(Debug, Clone, PartialEq)]
pub struct WidthLegRule {
    /// (maximum width mm, legs), ascending by width
    thresholds: Vec<(f64, usize)>,
}

impl WidthLegRule {
    /// Legs for a beam width; wider than every threshold takes the largest leg count
    pub fn legs_for(&self, width_mm: f64) -> usize {
        self.thresholds
            .iter()
            .find(|(max_width, _)| width_mm <= *max_width)
            .map(|(_, legs)| *legs)
            .unwrap_or_else(|| self.thresholds.iter().map(|(_, legs)| *legs).max().unwrap_or(2))
    }

    /// Parse a rule, falling back to the default thresholds when malformed
    pub fn parse_or_default(rule: &str) -> Self {
        rule.parse().unwrap_or_else(|e: RebarError| {
            warn!(rule, error = %e, "malformed stirrup width rule, using default thresholds");
            Self::default()
        })
    }
}

impl Default for WidthLegRule {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_WIDTH_RULE.to_vec(),
        }
    }
}

impl FromStr for WidthLegRule {
    type Err = RebarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut thresholds = Vec::new();
        for entry in s.split([';', ',']).map(str::trim).filter(|e| !e.is_empty()) {
            let (width, legs) = entry
                .split_once(':')
                .ok_or_else(|| RebarError::invalid_settings("stirrups.width_rule", format!("'{}' lacks ':'", entry)))?;
            let width: f64 = width.trim().parse().map_err(|_| {
                RebarError::invalid_settings("stirrups.width_rule", format!("bad width in '{}'", entry))
            })?;
            let legs: usize = legs.trim().parse().map_err(|_| {
                RebarError::invalid_settings("stirrups.width_rule", format!("bad leg count in '{}'", entry))
            })?;
            if width <= 0.0 || legs < 2 {
                return Err(RebarError::invalid_settings(
                    "stirrups.width_rule",
                    format!("'{}' is out of range", entry),
                ));
            }
            thresholds.push((width, legs));
        }
        if thresholds.is_empty() {
            return Err(RebarError::invalid_settings("stirrups.width_rule", "no thresholds"));
        }
        thresholds.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { thresholds })
    }
}

/// Number of stirrup legs at a section
pub fn stirrup_leg_count(width_mm: f64, bar_count: usize, has_addons: bool, settings: &DesignSettings) -> usize {
    let rules = &settings.stirrups;
    if rules.use_advanced_rules {
        if let Some(entry) = rules
            .advanced_table
            .iter()
            .find(|e| e.bar_count == bar_count && e.has_addons == has_addons)
        {
            return entry.legs;
        }
    }
    WidthLegRule::parse_or_default(&rules.width_rule).legs_for(width_mm)
}
