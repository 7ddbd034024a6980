//! # Backbone Generation
//!
//! First pipeline stage: fans one seed context out into one context per
//! candidate (top backbone, bottom backbone) pair.
//!
//! Diameters already chosen for connected beams, then the floor's preferred
//! diameter, are tried first; the rest of the configured backbone range
//! follows in ascending order. Per diameter, bar counts start at two and grow
//! while the backbone stays within the face's peak requirement and fits one
//! layer of the narrowest span.
//!
//! A user-locked design skips generation and yields exactly that backbone.

use tracing::debug;

use super::context::{FailStage, SolutionContext};
use super::location::Face;
use super::pipeline::PipelineStage;
use super::placement::max_bars_per_layer;
use super::solution::Backbone;
use crate::materials::{bars_area_cm2, size_index};

/// Fewest bars allowed in a backbone face
pub const MIN_BACKBONE_COUNT: usize = 2;

/// Generates candidate backbones
#[derive(Debug, Clone, Copy, Default)]
pub struct BackboneStage;

impl PipelineStage for BackboneStage {
    fn name(&self) -> &'static str {
        "BackboneGeneration"
    }

    fn execute<'a>(&self, contexts: Vec<SolutionContext<'a>>) -> Vec<SolutionContext<'a>> {
        contexts.into_iter().flat_map(|ctx| self.expand(ctx)).collect()
    }
}

impl BackboneStage {
    /// Backbone diameters to try, neighbor and preferred diameters first
    pub fn candidate_diameters(ctx: &SolutionContext<'_>) -> Vec<u32> {
        let rebar = &ctx.settings.rebar;
        let mut order: Vec<u32> = Vec::new();
        let mut push = |d: u32| {
            if size_index(d).is_some() && !order.contains(&d) {
                order.push(d);
            }
        };

        for (_, neighbor) in ctx.constraints.neighbors_of(ctx.group) {
            push(neighbor.diameter_mm);
        }
        if let Some(d) = ctx.constraints.preferred_main_diameter_mm {
            push(d);
        }
        for d in ctx.settings.sorted_diameters() {
            if (rebar.min_backbone_diameter_mm..=rebar.max_backbone_diameter_mm).contains(&d) {
                push(d);
            }
        }
        order
    }

    /// Candidate backbones for one face
    pub fn face_candidates(ctx: &SolutionContext<'_>, face: Face) -> Vec<Backbone> {
        let width = ctx.group.capacity_width_mm();
        let peak = ctx
            .span_results
            .iter()
            .map(|r| r.max_required(face))
            .fold(0.0, f64::max)
            * ctx.settings.rebar.safety_factor;

        let mut candidates = Vec::new();
        for d in Self::candidate_diameters(ctx) {
            let max_count = ctx
                .settings
                .rebar
                .max_backbone_count
                .min(max_bars_per_layer(width, d, ctx.settings));
            for count in MIN_BACKBONE_COUNT..=max_count {
                // Always keep the two-bar backbone; more bars only while under the peak
                if count > MIN_BACKBONE_COUNT && bars_area_cm2(d, count) > peak {
                    break;
                }
                candidates.push(Backbone::new(d, count));
            }
        }
        candidates
    }

    fn expand<'a>(&self, mut ctx: SolutionContext<'a>) -> Vec<SolutionContext<'a>> {
        if !ctx.is_valid {
            return vec![ctx];
        }

        if let Some(external) = ctx.external {
            debug!(group = %ctx.group.name, top = %external.top.label(), bottom = %external.bottom.label(), "using locked backbone");
            return vec![ctx.with_backbone(external.forced(Face::Top), external.forced(Face::Bottom))];
        }

        let top = Self::face_candidates(&ctx, Face::Top);
        let bottom = Self::face_candidates(&ctx, Face::Bottom);
        if top.is_empty() || bottom.is_empty() {
            let rebar = &ctx.settings.rebar;
            let message = format!(
                "no backbone of D{}-D{} fits {:.0} mm width",
                rebar.min_backbone_diameter_mm,
                rebar.max_backbone_diameter_mm,
                ctx.group.capacity_width_mm()
            );
            ctx.fail(FailStage::Backbone, message);
            return vec![ctx];
        }

        debug!(
            group = %ctx.group.name,
            top = top.len(),
            bottom = bottom.len(),
            "backbone candidates generated"
        );
        top.iter()
            .flat_map(|t| bottom.iter().map(move |b| (*t, *b)))
            .map(|(t, b)| ctx.with_backbone(t, b))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::beam::{BeamGroup, Span, SpanResultData};
    use crate::design::constraints::{ExternalConstraints, NeighborDesign, ProjectConstraints};
    use crate::settings::DesignSettings;

    fn group() -> BeamGroup {
        BeamGroup::new("B2", vec![Span::new(6000.0, 300.0, 500.0)]).connected_to("B1")
    }

    #[test]
    fn test_neighbor_diameter_tried_first() {
        let g = group();
        let results = vec![SpanResultData::new([0.0; 3], [0.0; 3])];
        let settings = DesignSettings::default();
        let mut constraints = ProjectConstraints::new();
        constraints.neighbor_designs.insert(
            "B1".into(),
            NeighborDesign { diameter_mm: 22, count: 3, stirrup_diameter_mm: 8 },
        );
        let ctx = SolutionContext::seed(&g, &results, &settings, &constraints, None);
        let diameters = BackboneStage::candidate_diameters(&ctx);
        assert_eq!(diameters[0], 22);
        assert_eq!(diameters.iter().filter(|d| **d == 22).count(), 1);
        assert_eq!(&diameters[1..], &[14, 16, 18, 20, 25]);
    }

    #[test]
    fn test_counts_grow_only_under_peak() {
        let g = group();
        // 9 cm² top peak: 2D16 (4.0), 3D16 (6.0), 4D16 (8.0) all below
        let results = vec![SpanResultData::new([9.0, 1.0, 2.0], [0.0, 1.0, 0.0])];
        let settings = DesignSettings::default();
        let constraints = ProjectConstraints::new();
        let ctx = SolutionContext::seed(&g, &results, &settings, &constraints, None);

        let top = BackboneStage::face_candidates(&ctx, Face::Top);
        let d16: Vec<usize> = top.iter().filter(|b| b.diameter_mm == 16).map(|b| b.count).collect();
        assert_eq!(d16, vec![2, 3, 4]);
        let d25: Vec<usize> = top.iter().filter(|b| b.diameter_mm == 25).map(|b| b.count).collect();
        assert_eq!(d25, vec![2]);

        let bottom = BackboneStage::face_candidates(&ctx, Face::Bottom);
        assert!(bottom.iter().all(|b| b.count == 2));
    }

    #[test]
    fn test_fan_out_is_cartesian_product() {
        let g = group();
        let results = vec![SpanResultData::new([0.0; 3], [0.0; 3])];
        let settings = DesignSettings::default();
        let constraints = ProjectConstraints::new();
        let seed = SolutionContext::seed(&g, &results, &settings, &constraints, None);
        let contexts = BackboneStage.execute(vec![seed]);
        // 6 diameters in 14..=25, two bars each, per face
        assert_eq!(contexts.len(), 36);
        assert!(contexts.iter().all(|c| c.is_valid));
    }

    #[test]
    fn test_locked_design_yields_single_context() {
        let g = group();
        let results = vec![SpanResultData::new([0.0; 3], [0.0; 3])];
        let settings = DesignSettings::default();
        let constraints = ProjectConstraints::new();
        let external = ExternalConstraints { top: Backbone::new(20, 3), bottom: Backbone::new(18, 2) };
        let seed = SolutionContext::seed(&g, &results, &settings, &constraints, Some(&external));
        let contexts = BackboneStage.execute(vec![seed]);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].solution.option_name, "T3D20-B2D18");
    }

    #[test]
    fn test_too_narrow_fails_backbone_stage() {
        let g = BeamGroup::new("B9", vec![Span::new(4000.0, 80.0, 300.0)]);
        let results = vec![SpanResultData::new([1.0; 3], [1.0; 3])];
        let settings = DesignSettings::default();
        let constraints = ProjectConstraints::new();
        let seed = SolutionContext::seed(&g, &results, &settings, &constraints, None);
        let contexts = BackboneStage.execute(vec![seed]);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].fail_stage, Some(FailStage::Backbone));
    }
}
