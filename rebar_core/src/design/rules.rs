//! # Rule Engine
//!
//! Detailing checks run on filled candidates. A critical violation removes
//! the candidate; warnings only cost score.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::context::SolutionContext;
use super::location::{Face, SpanPoint};
use super::placement::{can_fit_mixed_bars, max_bars_per_layer};
use super::solution::RebarSpec;
use crate::materials::size_index;

/// How far apart (in standard sizes) an addon may be from its backbone before a warning
const MAX_SIZE_STEPS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Candidate is rejected
    Critical,
    /// Candidate survives with a score penalty
    Warning,
}

/// One failed rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    /// Score deducted for warnings
    pub penalty: f64,
}

impl RuleViolation {
    pub fn critical(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity: Severity::Critical,
            message: message.into(),
            penalty: 0.0,
        }
    }

    pub fn warning(rule: &str, message: impl Into<String>, penalty: f64) -> Self {
        Self {
            rule: rule.to_string(),
            severity: Severity::Warning,
            message: message.into(),
            penalty,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// Validates filled candidates
pub trait RuleEngine {
    fn validate(&self, ctx: &SolutionContext<'_>) -> Vec<RuleViolation>;
}

/// Built-in detailing rules
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRuleEngine;

impl RuleEngine for DefaultRuleEngine {
    fn validate(&self, ctx: &SolutionContext<'_>) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        check_backbone(ctx, &mut violations);
        check_layers(ctx, &mut violations);
        check_sections(ctx, &mut violations);
        check_diameters(ctx, &mut violations);
        violations
    }
}

fn check_backbone(ctx: &SolutionContext<'_>, out: &mut Vec<RuleViolation>) {
    let width = ctx.group.capacity_width_mm();
    for face in Face::ALL {
        let bb = ctx.backbone(face);
        if bb.count < 2 {
            out.push(RuleViolation::critical(
                "backbone-count",
                format!("{} backbone has {} bar(s), at least 2 required", face, bb.count),
            ));
        }
        let capacity = max_bars_per_layer(width, bb.diameter_mm, ctx.settings);
        if bb.count > capacity {
            out.push(RuleViolation::critical(
                "backbone-fit",
                format!("{} backbone {} exceeds {} bars per layer", face, bb.label(), capacity),
            ));
        }
    }
}

fn check_layers(ctx: &SolutionContext<'_>, out: &mut Vec<RuleViolation>) {
    let max_layers = ctx.settings.rebar.max_layers;
    for (key, spec) in &ctx.solution.reinforcements {
        if spec.layer > max_layers {
            out.push(RuleViolation::critical(
                "max-layers",
                format!("{} uses layer {}, max {}", key, spec.layer, max_layers),
            ));
        }
    }
}

/// Layer-1 fit and congestion at every check point
fn check_sections(ctx: &SolutionContext<'_>, out: &mut Vec<RuleViolation>) {
    for (s, span) in ctx.group.spans.iter().enumerate() {
        for face in Face::ALL {
            let bb = ctx.backbone(face);
            for point in SpanPoint::ALL {
                let addons: Vec<&RebarSpec> = ctx.solution.covering_addons(s, face, point).collect();
                if addons.is_empty() {
                    continue;
                }
                let outer: usize = addons.iter().map(|a| a.layer1_count()).sum();
                let addon_diameter = addons.iter().map(|a| a.diameter_mm).max().unwrap_or(bb.diameter_mm);
                let location = format!("Span{} {} {}", s + 1, face, point);

                if !can_fit_mixed_bars(span.width_mm, bb.count, bb.diameter_mm, outer, addon_diameter, ctx.settings) {
                    out.push(RuleViolation::critical(
                        "layer-fit",
                        format!("{}: {} + {} addon bars do not fit in layer 1", location, bb.label(), outer),
                    ));
                } else if !can_fit_mixed_bars(
                    span.width_mm,
                    bb.count,
                    bb.diameter_mm,
                    outer + 1,
                    addon_diameter,
                    ctx.settings,
                ) && outer > 0
                {
                    out.push(RuleViolation::warning(
                        "congestion",
                        format!("{}: layer 1 is full", location),
                        1.0,
                    ));
                }
            }
        }
    }
}

fn check_diameters(ctx: &SolutionContext<'_>, out: &mut Vec<RuleViolation>) {
    for (key, spec) in &ctx.solution.reinforcements {
        let bb = ctx.backbone(key.face);
        if let (Some(a), Some(b)) = (size_index(spec.diameter_mm), size_index(bb.diameter_mm)) {
            if a.abs_diff(b) > MAX_SIZE_STEPS {
                out.push(RuleViolation::warning(
                    "diameter-jump",
                    format!("{} addon D{} far from backbone D{}", key, spec.diameter_mm, bb.diameter_mm),
                    2.0,
                ));
            }
        }
    }

    let distinct: BTreeSet<u32> = ctx.solution.distinct_diameters();
    if distinct.len() > 3 {
        out.push(RuleViolation::warning(
            "diameter-variety",
            format!("{} different bar diameters", distinct.len()),
            2.0 * (distinct.len() - 3) as f64,
        ));
    }
}
