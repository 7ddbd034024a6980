//! # Reinforcement Filler
//!
//! Pipeline stage that turns a candidate backbone into a complete addon
//! layout for one beam group.
//!
//! ```text
//! Setup → UnifySupports → FillSpansAndBridge → IntelligentBridging → ComputeMetrics
//! ```
//!
//! Any step that cannot place the required steel invalidates the context
//! with its stage and the numeric deficit; nothing partial is passed on.
//!
//! ## Support Unification
//!
//! A support is shared by the span on its left and the span on its right.
//! The top requirement there is the envelope of both span ends and is
//! designed once; both spans' location keys hold the same `Arc<RebarSpec>`.
//!
//! ## Bridging
//!
//! Similar support addons on a short span become one running-through spec.
//! Mid-span is then redesigned for whatever the backbone and the bridged
//! bars leave uncovered. If that remainder cannot sit beside the bridged
//! bars, the span keeps its separate support addons.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::context::{FailStage, SolutionContext};
use super::filling::{best_filling, default_strategies, score_filling, FillingContext};
use super::location::{Face, LocationKey, Section, SpanPoint};
use super::pipeline::PipelineStage;
use super::placement::{can_fit_mixed_bars, max_bars_per_layer, stirrup_leg_count};
use super::solution::{Backbone, RebarSpec};
use crate::errors::RebarError;
use crate::materials::{bar_area_cm2, unit_weight};
use crate::settings::DesignSettings;
use crate::units::{Meters, Millimeters};

/// Efficiency multiplier when any addon needs a second layer
const SECOND_LAYER_EFFICIENCY: f64 = 0.95;

/// Efficiency multiplier when top and bottom backbone counts differ
const ASYMMETRY_EFFICIENCY: f64 = 0.97;

/// Why a fill step stopped
#[derive(Debug, Clone, PartialEq)]
struct StageFailure {
    stage: FailStage,
    message: String,
}

impl StageFailure {
    fn new(stage: FailStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Addon design for one location plus the bars it wastes
#[derive(Debug, Clone, PartialEq)]
struct LocationDesign {
    spec: RebarSpec,
    waste: usize,
    score: f64,
}

/// Unified specs at one support
#[derive(Debug, Clone, Default)]
struct SupportSpecs {
    top: Option<Arc<RebarSpec>>,
    bottom: Option<Arc<RebarSpec>>,
}

impl SupportSpecs {
    fn get(&self, face: Face) -> Option<&Arc<RebarSpec>> {
        match face {
            Face::Top => self.top.as_ref(),
            Face::Bottom => self.bottom.as_ref(),
        }
    }

    fn set(&mut self, face: Face, spec: Arc<RebarSpec>) {
        match face {
            Face::Top => self.top = Some(spec),
            Face::Bottom => self.bottom = Some(spec),
        }
    }
}

/// Fills addon reinforcement for each candidate backbone
#[derive(Debug, Clone, Copy, Default)]
pub struct ReinforcementFiller;

impl PipelineStage for ReinforcementFiller {
    fn name(&self) -> &'static str {
        "ReinforcementFiller"
    }

    fn execute<'a>(&self, contexts: Vec<SolutionContext<'a>>) -> Vec<SolutionContext<'a>> {
        contexts
            .into_iter()
            .map(|mut ctx| {
                if ctx.is_valid {
                    self.fill(&mut ctx);
                }
                ctx
            })
            .collect()
    }
}

impl ReinforcementFiller {
    /// Run every fill step on one context, invalidating it on the first failure
    pub fn fill(&self, ctx: &mut SolutionContext<'_>) {
        if let Err(failure) = self.run(ctx) {
            debug!(
                option = %ctx.solution.option_name,
                stage = %failure.stage,
                message = %failure.message,
                "candidate rejected by filler"
            );
            ctx.fail(failure.stage, failure.message);
        }
    }

    fn run(&self, ctx: &mut SolutionContext<'_>) -> Result<(), StageFailure> {
        setup(ctx)?;
        let supports = unify_supports(ctx)?;
        let mut mid_waste = fill_spans(ctx, &supports)?;
        bridge(ctx, &mut mid_waste);
        ctx.waste_count += mid_waste.values().sum::<usize>();
        compute_metrics(ctx)
    }
}

fn setup(ctx: &SolutionContext<'_>) -> Result<(), StageFailure> {
    let group = ctx.group;
    let spans = group.span_count();
    let results = ctx.span_results.len();

    if spans == 0 {
        return Err(StageFailure::new(
            FailStage::Setup,
            format!("Beam group '{}' has no spans", group.name),
        ));
    }
    if results == 0 {
        return Err(StageFailure::new(
            FailStage::Setup,
            RebarError::missing_span_data(&group.name, 1, "no analysis results supplied").to_string(),
        ));
    }
    if results < spans {
        return Err(StageFailure::new(
            FailStage::Setup,
            RebarError::missing_span_data(
                &group.name,
                results + 1,
                format!("analysis covers {} of {} spans", results, spans),
            )
            .to_string(),
        ));
    }
    if results > spans {
        return Err(StageFailure::new(
            FailStage::Setup,
            format!(
                "Beam group '{}' has {} spans but {} analysis results",
                group.name, spans, results
            ),
        ));
    }
    if let Some(i) = ctx.span_results.iter().position(|r| !r.is_well_formed()) {
        return Err(StageFailure::new(
            FailStage::Setup,
            RebarError::missing_span_data(&group.name, i + 1, "required areas must be finite and non-negative")
                .to_string(),
        ));
    }
    if ctx.top.count == 0 || ctx.bottom.count == 0 {
        return Err(StageFailure::new(FailStage::Setup, "no backbone assigned"));
    }
    Ok(())
}

/// Width governing bar capacity at support `i` (narrower adjoining span)
fn support_width(ctx: &SolutionContext<'_>, support: usize) -> f64 {
    let spans = &ctx.group.spans;
    let left = support.checked_sub(1).and_then(|s| spans.get(s)).map(|s| s.width_mm);
    let right = spans.get(support).map(|s| s.width_mm);
    match (left, right) {
        (Some(l), Some(r)) => l.min(r),
        (Some(w), None) | (None, Some(w)) => w,
        (None, None) => ctx.group.capacity_width_mm(),
    }
}

/// Requirement envelope at support `i`: span on the left at its end, span on the right at its start
fn support_envelope(ctx: &SolutionContext<'_>, support: usize, face: Face) -> f64 {
    let left = support
        .checked_sub(1)
        .and_then(|s| ctx.span_results.get(s))
        .map(|r| r.required(face, SpanPoint::End));
    let right = ctx.span_results.get(support).map(|r| r.required(face, SpanPoint::Start));
    left.into_iter().chain(right).fold(0.0, f64::max)
}

fn unify_supports(ctx: &mut SolutionContext<'_>) -> Result<Vec<SupportSpecs>, StageFailure> {
    let settings = ctx.settings;
    let sf = settings.rebar.safety_factor;
    let mut supports = vec![SupportSpecs::default(); ctx.group.support_count()];

    for (i, specs) in supports.iter_mut().enumerate() {
        let width = support_width(ctx, i);
        for face in Face::ALL {
            let required = support_envelope(ctx, i, face);
            let backbone = ctx.backbone(face);
            let design = design_location_scored(required, backbone, sf, face, width, settings).ok_or_else(|| {
                StageFailure::new(
                    FailStage::UnifySupports,
                    placement_message(format!("support {} {}", i + 1, face), required * sf, backbone),
                )
            })?;
            ctx.waste_count += design.waste;
            if !design.spec.is_empty() {
                specs.set(face, Arc::new(design.spec));
            }
        }
    }
    Ok(supports)
}

/// Support addons into each span, then mid-span addons. Returns the waste of each mid-span design.
fn fill_spans(
    ctx: &mut SolutionContext<'_>,
    supports: &[SupportSpecs],
) -> Result<BTreeMap<LocationKey, usize>, StageFailure> {
    let settings = ctx.settings;
    let group = ctx.group;
    let results = ctx.span_results;
    let sf = settings.rebar.safety_factor;
    let mut mid_waste = BTreeMap::new();

    for (s, span) in group.spans.iter().enumerate() {
        for face in Face::ALL {
            if let Some(spec) = supports.get(s).and_then(|sup| sup.get(face)) {
                ctx.solution
                    .reinforcements
                    .insert(LocationKey::new(s, face, Section::Left), Arc::clone(spec));
            }
            if let Some(spec) = supports.get(s + 1).and_then(|sup| sup.get(face)) {
                ctx.solution
                    .reinforcements
                    .insert(LocationKey::new(s, face, Section::Right), Arc::clone(spec));
            }
        }

        let data = &results[s];
        for face in Face::ALL {
            let required = data.required(face, SpanPoint::Mid);
            let backbone = ctx.backbone(face);
            // Top steel at mid-span only where the backbone falls short
            if face == Face::Top && required * sf <= backbone.area_cm2() {
                continue;
            }
            let design =
                design_location_scored(required, backbone, sf, face, span.width_mm, settings).ok_or_else(|| {
                    StageFailure::new(
                        FailStage::FillSpans,
                        placement_message(LocationKey::new(s, face, Section::Mid).to_string(), required * sf, backbone),
                    )
                })?;
            if !design.spec.is_empty() {
                let key = LocationKey::new(s, face, Section::Mid);
                if design.waste > 0 {
                    mid_waste.insert(key, design.waste);
                }
                ctx.solution.reinforcements.insert(key, Arc::new(design.spec));
            }
        }
    }
    Ok(mid_waste)
}

/// Mid-span addon left next to a running-through spec
#[derive(Debug, Clone, PartialEq)]
enum MidReconcile {
    /// Backbone plus the bridged bars cover mid-span
    Covered,
    /// Extra bars still needed at mid-span
    Residual(RebarSpec),
    /// The residual does not fit alongside the bridged bars
    NoFit,
}

fn bridge(ctx: &mut SolutionContext<'_>, mid_waste: &mut BTreeMap<LocationKey, usize>) {
    let group = ctx.group;
    let settings = ctx.settings;
    let bridging = &settings.bridging;
    let ratio = bridging.extension_ratio(group.member_type);

    for (s, span) in group.spans.iter().enumerate() {
        for face in Face::ALL {
            let left_key = LocationKey::new(s, face, Section::Left);
            let right_key = LocationKey::new(s, face, Section::Right);
            let mid_key = LocationKey::new(s, face, Section::Mid);
            let reinforcements = &ctx.solution.reinforcements;
            let (Some(left), Some(right)) = (reinforcements.get(&left_key), reinforcements.get(&right_key)) else {
                continue;
            };
            if !left.is_similar(right) {
                continue;
            }

            let gap = span.length_mm - 2.0 * ratio * span.length_mm;
            let threshold = bridging
                .min_gap_mm
                .max(bridging.gap_diameter_factor * left.diameter_mm as f64);
            if gap >= threshold {
                continue;
            }

            let merged = left.running_through();
            let mid = match reconcile_mid(ctx, s, face, span.width_mm, &merged) {
                MidReconcile::Covered => None,
                MidReconcile::Residual(spec) => Some(spec),
                MidReconcile::NoFit => {
                    debug!(location = %mid_key, "mid-span residual does not fit, supports kept separate");
                    continue;
                }
            };

            let reinforcements = &mut ctx.solution.reinforcements;
            reinforcements.remove(&left_key);
            reinforcements.remove(&right_key);
            reinforcements.insert(LocationKey::new(s, face, Section::Full), Arc::new(merged));
            mid_waste.remove(&mid_key);
            match mid {
                Some(spec) => reinforcements.insert(mid_key, Arc::new(spec)),
                None => reinforcements.remove(&mid_key),
            };
        }
    }
}

/// Redesign mid-span for what the backbone and a running-through spec leave uncovered
fn reconcile_mid(
    ctx: &SolutionContext<'_>,
    span: usize,
    face: Face,
    width_mm: f64,
    merged: &RebarSpec,
) -> MidReconcile {
    let settings = ctx.settings;
    let backbone = ctx.backbone(face);
    let target = ctx.span_results[span].required(face, SpanPoint::Mid) * settings.rebar.safety_factor;
    let residual = target - backbone.area_cm2() - merged.area_cm2();
    if residual <= 1e-9 {
        return MidReconcile::Covered;
    }

    candidate_addon_diameters(backbone.diameter_mm, settings)
        .into_iter()
        .filter_map(|d| {
            let count = ((residual / bar_area_cm2(d) - 1e-9).ceil() as usize).max(1);
            let outer = merged.layer1_count() + count;
            let addon_diameter = d.max(merged.diameter_mm);
            can_fit_mixed_bars(width_mm, backbone.count, backbone.diameter_mm, outer, addon_diameter, settings).then(
                || LocationDesign {
                    spec: RebarSpec::single_layer(face, d, count),
                    waste: 0,
                    score: 100.0 - 2.0 * count as f64 + diameter_preference(d, backbone, settings),
                },
            )
        })
        .fold(None, keep_best)
        .map_or(MidReconcile::NoFit, |design| MidReconcile::Residual(design.spec))
}

fn compute_metrics(ctx: &mut SolutionContext<'_>) -> Result<(), StageFailure> {
    let settings = ctx.settings;
    let ratios = settings.weight.ratios_for(ctx.group.member_type);
    let total_length: Meters = Millimeters(ctx.group.total_length_mm()).into();

    let backbone_kg: f64 = Face::ALL
        .iter()
        .map(|face| {
            let bb = ctx.backbone(*face);
            (unit_weight(bb.diameter_mm) * total_length).0 * bb.count as f64 * settings.weight.lap_waste_factor
        })
        .sum();

    let addon_kg: f64 = ctx
        .solution
        .reinforcements
        .iter()
        .filter_map(|(key, spec)| {
            let span = ctx.group.spans.get(key.span)?;
            let ratio = match key.section {
                Section::Left | Section::Right => ratios.support,
                Section::Mid => ratios.mid_span,
                Section::Full => 1.0,
            };
            let length: Meters = Millimeters(span.length_mm * ratio).into();
            Some((unit_weight(spec.diameter_mm) * length).0 * spec.count as f64)
        })
        .sum();

    let weight = backbone_kg + addon_kg;
    if !weight.is_finite() || weight <= 0.0 {
        return Err(StageFailure::new(
            FailStage::Metrics,
            format!("steel weight could not be estimated ({})", weight),
        ));
    }

    let mut efficiency = 1000.0 / weight;
    if ctx.solution.uses_second_layer() {
        efficiency *= SECOND_LAYER_EFFICIENCY;
    }
    if ctx.top.count != ctx.bottom.count {
        efficiency *= ASYMMETRY_EFFICIENCY;
    }

    ctx.solution.total_steel_weight_kg = weight;
    ctx.solution.efficiency_score = efficiency;
    ctx.solution.wasted_bar_count = ctx.waste_count;
    Ok(())
}

fn placement_message(location: impl Into<String>, target_cm2: f64, backbone: Backbone) -> String {
    let deficit = (target_cm2 - backbone.area_cm2()).max(0.0);
    RebarError::placement_infeasible(location, target_cm2, deficit).to_string()
}

// =============================================================================
// DESIGN LOCATION
// =============================================================================

/// Addon diameters in preference order: backbone first, then smaller
/// (descending), then larger (ascending)
pub fn candidate_addon_diameters(backbone_diameter_mm: u32, settings: &DesignSettings) -> Vec<u32> {
    let available = settings.sorted_diameters();
    let mut order = vec![backbone_diameter_mm];
    order.extend(available.iter().rev().copied().filter(|d| *d < backbone_diameter_mm));
    order.extend(available.iter().copied().filter(|d| *d > backbone_diameter_mm));
    order
}

/// Design the addon for one location.
///
/// `required_cm2` is the raw analysis requirement; the safety factor is
/// applied here. Returns an empty addon when the backbone already covers
/// it and `None` when no diameter/layer combination fits the width.
pub fn design_location(
    required_cm2: f64,
    backbone: Backbone,
    safety_factor: f64,
    face: Face,
    width_mm: f64,
    settings: &DesignSettings,
) -> Option<RebarSpec> {
    design_location_scored(required_cm2, backbone, safety_factor, face, width_mm, settings).map(|d| d.spec)
}

fn design_location_scored(
    required_cm2: f64,
    backbone: Backbone,
    safety_factor: f64,
    face: Face,
    width_mm: f64,
    settings: &DesignSettings,
) -> Option<LocationDesign> {
    let target = required_cm2 * safety_factor;
    let backbone_area = backbone.area_cm2();
    if target <= backbone_area + 1e-9 {
        return Some(LocationDesign {
            spec: RebarSpec::none(face, backbone.diameter_mm),
            waste: 0,
            score: 0.0,
        });
    }

    let candidates = candidate_addon_diameters(backbone.diameter_mm, settings);
    let deficit = target - backbone_area;

    let single = candidates
        .iter()
        .filter_map(|&d| {
            let count = ((deficit / bar_area_cm2(d) - 1e-9).ceil() as usize).max(1);
            can_fit_mixed_bars(width_mm, backbone.count, backbone.diameter_mm, count, d, settings).then(|| {
                let score = 100.0 - 2.0 * count as f64 + diameter_preference(d, backbone, settings);
                LocationDesign {
                    spec: RebarSpec::single_layer(face, d, count),
                    waste: 0,
                    score,
                }
            })
        })
        .fold(None, keep_best);
    if single.is_some() {
        return single;
    }

    if settings.rebar.max_layers < 2 {
        return None;
    }

    let strategies = default_strategies();
    candidates
        .iter()
        .filter_map(|&d| {
            let filling_ctx = layered_context(target, backbone, d, width_mm, settings);
            let result = best_filling(&strategies, &filling_ctx)?;
            result.is_valid.then(|| LocationDesign {
                spec: RebarSpec::layered(face, d, result.addon_breakdown(backbone.count)),
                waste: result.waste_count,
                score: score_filling(&result) + diameter_preference(d, backbone, settings),
            })
        })
        .fold(None, keep_best)
}

fn keep_best(best: Option<LocationDesign>, next: LocationDesign) -> Option<LocationDesign> {
    match best {
        Some(current) if current.score >= next.score => Some(current),
        _ => Some(next),
    }
}

/// Same-diameter bonus and a slight preference for thinner addons
fn diameter_preference(diameter_mm: u32, backbone: Backbone, settings: &DesignSettings) -> f64 {
    let same = if diameter_mm == backbone.diameter_mm {
        if settings.rebar.prefer_single_diameter {
            10.0
        } else {
            3.0
        }
    } else {
        0.0
    };
    same - 0.1 * diameter_mm as f64
}

fn layered_context(
    target_cm2: f64,
    backbone: Backbone,
    addon_diameter_mm: u32,
    width_mm: f64,
    settings: &DesignSettings,
) -> FillingContext {
    let layer1_capacity = if can_fit_mixed_bars(width_mm, backbone.count, backbone.diameter_mm, 0, addon_diameter_mm, settings) {
        let mut addons = 0;
        while can_fit_mixed_bars(
            width_mm,
            backbone.count,
            backbone.diameter_mm,
            addons + 1,
            addon_diameter_mm,
            settings,
        ) {
            addons += 1;
        }
        backbone.count + addons
    } else {
        0
    };

    let mut ctx = FillingContext {
        required_area_cm2: target_cm2,
        backbone_area_cm2: backbone.area_cm2(),
        backbone_count: backbone.count,
        backbone_diameter_mm: backbone.diameter_mm,
        addon_diameter_mm,
        layer1_capacity,
        layer2_capacity: max_bars_per_layer(width_mm, addon_diameter_mm, settings),
        max_layers: settings.rebar.max_layers,
        stirrup_legs: 2,
        prefer_symmetric: settings.rebar.prefer_symmetric,
    };
    let outer_layer = ctx.total_bars_needed().min(layer1_capacity);
    ctx.stirrup_legs = stirrup_leg_count(width_mm, outer_layer, true, settings);
    ctx
}
