//! # Bar Cutting and Splicing
//!
//! Turns a continuous bar run into bars the mill can supply. Runs longer than
//! the maximum bar length are cut into near-equal pieces with the cuts moved
//! into allowed splice zones, splices of alternate bars are staggered, and
//! hooks are added where the run ends at a column or wall.
//!
//! Placement is best-effort: a cut that cannot reach a splice zone stays at
//! its ideal position. Nothing here rejects a design.
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::cutting::{BarRun, RebarCuttingAlgorithm};
//! use rebar_core::settings::CuttingSettings;
//!
//! let algorithm = RebarCuttingAlgorithm::new(CuttingSettings::default());
//! let run = BarRun::new(vec![8000.0, 8000.0], 20, true).with_supports("COL-C1", "COL-C3");
//! let result = algorithm.process_complete(&run);
//!
//! assert_eq!(result.segments.len(), 2);
//! assert!(result.segments[0].start_hook.is_some());
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::design::{BeamGroup, ContinuousBeamSolution, Face, MemberType, SpanResultData};
use crate::materials::lap_length;
use crate::settings::CuttingSettings;

/// Distance a snapped cut is moved inside its zone (mm)
pub const SNAP_OFFSET_MM: f64 = 50.0;

/// Search radius for a zone boundary, as a fraction of the max bar length
pub const SEARCH_RADIUS_RATIO: f64 = 0.1;

/// Clearance a staggered splice keeps from the next bar's end (mm)
pub const STAGGER_END_CLEARANCE_MM: f64 = 200.0;

/// Where along a span splices are allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpliceZoneKind {
    /// Near each support (outer part of the span)
    Support,
    /// Middle half of the span
    QuarterSpan,
    /// 35 %-65 % of the span
    MidSpan,
}

/// End anchorage hook
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hook {
    pub angle_deg: f64,
    pub length_mm: f64,
}

/// One manufactured piece of a bar run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSegment {
    pub start_mm: f64,
    pub end_mm: f64,
    pub splice_at_start: bool,
    pub splice_at_end: bool,
    /// Splice centre for a segment spliced at its end; moved by staggering
    pub splice_position_mm: Option<f64>,
    /// Creation order, used to pick the bars that are staggered
    pub bar_index: usize,
    pub start_hook: Option<Hook>,
    pub end_hook: Option<Hook>,
}

impl BarSegment {
    pub fn length_mm(&self) -> f64 {
        self.end_mm - self.start_mm
    }
}

/// Segments covering one bar run end to end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuttingResult {
    pub total_length_mm: f64,
    pub segments: Vec<BarSegment>,
    pub is_top_bar: bool,
    /// Lap length used for staggering, once applied
    pub lap_length_mm: Option<f64>,
}

impl CuttingResult {
    pub fn splice_count(&self) -> usize {
        self.segments.iter().filter(|s| s.splice_at_end).count()
    }

    /// Segments are contiguous and cover exactly `[0, total_length]`
    pub fn is_contiguous(&self) -> bool {
        let (Some(first), Some(last)) = (self.segments.first(), self.segments.last()) else {
            return false;
        };
        first.start_mm.abs() < 1e-6
            && (last.end_mm - self.total_length_mm).abs() < 1e-6
            && self.segments.windows(2).all(|w| (w[0].end_mm - w[1].start_mm).abs() < 1e-6)
    }
}

/// A continuous bar line to be cut
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarRun {
    /// Span lengths in order (mm)
    pub span_lengths_mm: Vec<f64>,
    pub diameter_mm: u32,
    pub is_top_bar: bool,
    pub member_type: MemberType,
    /// Bars in the layer; staggering needs at least two
    pub bars_per_layer: usize,
    pub start_support: String,
    pub end_support: String,
}

impl BarRun {
    pub fn new(span_lengths_mm: Vec<f64>, diameter_mm: u32, is_top_bar: bool) -> Self {
        Self {
            span_lengths_mm,
            diameter_mm,
            is_top_bar,
            member_type: MemberType::Beam,
            bars_per_layer: 2,
            start_support: String::new(),
            end_support: String::new(),
        }
    }

    pub fn with_member_type(mut self, member_type: MemberType) -> Self {
        self.member_type = member_type;
        self
    }

    pub fn with_bars_per_layer(mut self, bars: usize) -> Self {
        self.bars_per_layer = bars;
        self
    }

    pub fn with_supports(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_support = start.into();
        self.end_support = end.into();
        self
    }

    /// Backbone run of one face of a solved beam
    pub fn backbone(
        group: &BeamGroup,
        span_results: &[SpanResultData],
        solution: &ContinuousBeamSolution,
        face: Face,
    ) -> Self {
        let backbone = solution.backbone(face);
        let start = span_results
            .first()
            .and_then(|r| r.start_support.clone())
            .unwrap_or_default();
        let end = span_results
            .last()
            .and_then(|r| r.end_support.clone())
            .unwrap_or_default();
        Self::new(
            group.spans.iter().map(|s| s.length_mm).collect(),
            backbone.diameter_mm,
            face == Face::Top,
        )
        .with_member_type(group.member_type)
        .with_bars_per_layer(backbone.count)
        .with_supports(start, end)
    }

    pub fn total_length_mm(&self) -> f64 {
        self.span_lengths_mm.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Zone {
    start: f64,
    end: f64,
}

impl Zone {
    fn contains(&self, x: f64) -> bool {
        x >= self.start && x <= self.end
    }

    /// Point `SNAP_OFFSET_MM` inside the zone from one boundary
    fn inset(&self, from_start: bool) -> f64 {
        if self.end - self.start <= 2.0 * SNAP_OFFSET_MM {
            return (self.start + self.end) / 2.0;
        }
        if from_start {
            self.start + SNAP_OFFSET_MM
        } else {
            self.end - SNAP_OFFSET_MM
        }
    }
}

/// Cuts, staggers and anchors bar runs
#[derive(Debug, Clone, Default)]
pub struct RebarCuttingAlgorithm {
    settings: CuttingSettings,
}

impl RebarCuttingAlgorithm {
    pub fn new(settings: CuttingSettings) -> Self {
        Self { settings }
    }

    /// Cut, then stagger, then anchor
    pub fn process_complete(&self, run: &BarRun) -> CuttingResult {
        let cut = self.auto_cut_bars(&run.span_lengths_mm, run.is_top_bar, run.member_type);
        let staggered = self.apply_staggering(cut, run.diameter_mm, run.bars_per_layer);
        let result = self.apply_end_anchorage(staggered, &run.start_support, &run.end_support, run.diameter_mm);
        debug!(
            diameter = run.diameter_mm,
            top = run.is_top_bar,
            segments = result.segments.len(),
            "bar run cut"
        );
        result
    }

    /// Split a run into bars no longer than the max bar length (best-effort)
    pub fn auto_cut_bars(&self, span_lengths_mm: &[f64], is_top_bar: bool, member: MemberType) -> CuttingResult {
        let total: f64 = span_lengths_mm.iter().sum();
        let max_len = self.settings.max_bar_length_mm;

        if total <= max_len {
            return CuttingResult {
                total_length_mm: total,
                segments: vec![BarSegment {
                    start_mm: 0.0,
                    end_mm: total,
                    splice_at_start: false,
                    splice_at_end: false,
                    splice_position_mm: None,
                    bar_index: 0,
                    start_hook: None,
                    end_hook: None,
                }],
                is_top_bar,
                lap_length_mm: None,
            };
        }

        let pieces = (total / max_len).ceil() as usize;
        let target = total / pieces as f64;
        let zones = self.splice_zones(span_lengths_mm, is_top_bar, member);
        let radius = SEARCH_RADIUS_RATIO * max_len;

        let mut cuts: Vec<f64> = Vec::with_capacity(pieces - 1);
        for i in 1..pieces {
            let ideal = target * i as f64;
            let snapped = snap_to_zone(ideal, &zones, radius);
            let previous = cuts.last().copied().unwrap_or(0.0);
            let cut = if snapped > previous && snapped < total { snapped } else { ideal };
            cuts.push(cut);
        }

        let mut bounds = Vec::with_capacity(pieces + 1);
        bounds.push(0.0);
        bounds.extend(cuts);
        bounds.push(total);

        let last = bounds.len() - 2;
        let segments = bounds
            .windows(2)
            .enumerate()
            .map(|(i, w)| BarSegment {
                start_mm: w[0],
                end_mm: w[1],
                splice_at_start: i > 0,
                splice_at_end: i < last,
                splice_position_mm: (i < last).then_some(w[1]),
                bar_index: i,
                start_hook: None,
                end_hook: None,
            })
            .collect();

        CuttingResult {
            total_length_mm: total,
            segments,
            is_top_bar,
            lap_length_mm: None,
        }
    }

    /// Shift the splices of odd bars forward by the stagger distance
    pub fn apply_staggering(&self, mut result: CuttingResult, diameter_mm: u32, bars_per_layer: usize) -> CuttingResult {
        let lap = lap_length(diameter_mm, self.settings.concrete_grade, self.settings.steel_grade).value();
        result.lap_length_mm = Some(lap);
        if bars_per_layer < 2 {
            return result;
        }

        let stagger = self.stagger_distance(diameter_mm);
        let next_ends: Vec<Option<f64>> = (0..result.segments.len())
            .map(|i| result.segments.get(i + 1).map(|s| s.end_mm))
            .collect();

        for (segment, next_end) in result.segments.iter_mut().zip(next_ends) {
            if segment.bar_index % 2 == 0 {
                continue;
            }
            let (Some(original), Some(next_end)) = (segment.splice_position_mm, next_end) else {
                continue;
            };
            let limit = next_end - STAGGER_END_CLEARANCE_MM;
            if limit <= original {
                continue;
            }
            segment.splice_position_mm = Some((original + stagger).min(limit));
        }
        result
    }

    /// Hooks at ends that land on a column or wall
    pub fn apply_end_anchorage(
        &self,
        mut result: CuttingResult,
        start_support: &str,
        end_support: &str,
        diameter_mm: u32,
    ) -> CuttingResult {
        let hook = self.hook(diameter_mm);
        if needs_hook(start_support) {
            if let Some(first) = result.segments.first_mut() {
                first.start_hook = Some(hook);
            }
        }
        if needs_hook(end_support) {
            if let Some(last) = result.segments.last_mut() {
                last.end_hook = Some(hook);
            }
        }
        result
    }

    /// `max(stagger minimum, lap length × stagger factor)`
    pub fn stagger_distance(&self, diameter_mm: u32) -> f64 {
        let lap = lap_length(diameter_mm, self.settings.concrete_grade, self.settings.steel_grade).value();
        self.settings.stagger_min_mm.max(lap * self.settings.stagger_factor)
    }

    pub fn hook(&self, diameter_mm: u32) -> Hook {
        Hook {
            angle_deg: self.settings.hook_angle_deg,
            length_mm: (self.settings.hook_length_factor * diameter_mm as f64).max(self.settings.hook_min_length_mm),
        }
    }

    fn splice_zones(&self, span_lengths_mm: &[f64], is_top_bar: bool, member: MemberType) -> Vec<Zone> {
        let rule = self.settings.zones_for(member);
        let kind = rule.kind_for(is_top_bar);
        let mut zones = Vec::new();
        let mut x0 = 0.0;
        for &length in span_lengths_mm {
            match kind {
                SpliceZoneKind::Support => {
                    let r = rule.support_zone_ratio * length;
                    zones.push(Zone { start: x0, end: x0 + r });
                    zones.push(Zone { start: x0 + length - r, end: x0 + length });
                }
                SpliceZoneKind::QuarterSpan => zones.push(Zone {
                    start: x0 + 0.25 * length,
                    end: x0 + 0.75 * length,
                }),
                SpliceZoneKind::MidSpan => zones.push(Zone {
                    start: x0 + 0.35 * length,
                    end: x0 + 0.65 * length,
                }),
            }
            x0 += length;
        }
        zones
    }
}

/// Ideal position if it is in a zone, else the nearest zone boundary within
/// `radius` moved inside, else the ideal position unchanged
fn snap_to_zone(ideal: f64, zones: &[Zone], radius: f64) -> f64 {
    if zones.iter().any(|z| z.contains(ideal)) {
        return ideal;
    }
    let mut best: Option<(f64, f64)> = None;
    for zone in zones {
        let candidates = [(zone.start - ideal, zone.inset(true)), (ideal - zone.end, zone.inset(false))];
        for (distance, position) in candidates {
            if distance >= 0.0 && distance <= radius && best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, position));
            }
        }
    }
    best.map_or(ideal, |(_, position)| position)
}

fn needs_hook(support: &str) -> bool {
    let upper = support.to_uppercase();
    upper.contains("COL") || upper.contains("WALL")
}
