//! Unit of work flowing through the pipeline.

use std::fmt;

use super::beam::{BeamGroup, SpanResultData};
use super::constraints::{ExternalConstraints, ProjectConstraints};
use super::location::Face;
use super::solution::{Backbone, ContinuousBeamSolution};
use crate::settings::DesignSettings;

/// Step at which a context was invalidated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailStage {
    Backbone,
    Setup,
    UnifySupports,
    FillSpans,
    Metrics,
    RuleEngine,
    Admissibility,
    Deadline,
}

impl fmt::Display for FailStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailStage::Backbone => "Backbone",
            FailStage::Setup => "Setup",
            FailStage::UnifySupports => "UnifySupports",
            FailStage::FillSpans => "FillSpansAndBridge",
            FailStage::Metrics => "ComputeMetrics",
            FailStage::RuleEngine => "RuleEngine",
            FailStage::Admissibility => "Admissibility",
            FailStage::Deadline => "Deadline",
        };
        write!(f, "{}", name)
    }
}

/// One candidate design in flight.
///
/// Inputs are borrowed from the caller; the candidate backbone and solution
/// are owned, so sibling contexts never share mutable state.
#[derive(Debug, Clone)]
pub struct SolutionContext<'a> {
    pub group: &'a BeamGroup,
    pub span_results: &'a [SpanResultData],
    pub settings: &'a DesignSettings,
    pub constraints: &'a ProjectConstraints,
    pub external: Option<&'a ExternalConstraints>,

    pub top: Backbone,
    pub bottom: Backbone,
    pub solution: ContinuousBeamSolution,
    pub is_valid: bool,
    pub waste_count: usize,
    pub fail_stage: Option<FailStage>,
    pub fail_message: String,
    /// Accumulated rule-warning penalty
    pub rule_penalty: f64,
}

impl<'a> SolutionContext<'a> {
    /// Seed context before any backbone is chosen
    pub fn seed(
        group: &'a BeamGroup,
        span_results: &'a [SpanResultData],
        settings: &'a DesignSettings,
        constraints: &'a ProjectConstraints,
        external: Option<&'a ExternalConstraints>,
    ) -> Self {
        let none = Backbone::new(0, 0);
        Self {
            group,
            span_results,
            settings,
            constraints,
            external,
            top: none,
            bottom: none,
            solution: ContinuousBeamSolution::new(none, none, settings.beam.stirrup_diameter_mm),
            is_valid: true,
            waste_count: 0,
            fail_stage: None,
            fail_message: String::new(),
            rule_penalty: 0.0,
        }
    }

    /// Copy of this context carrying a candidate backbone pair
    pub fn with_backbone(&self, top: Backbone, bottom: Backbone) -> Self {
        Self {
            top,
            bottom,
            solution: ContinuousBeamSolution::new(top, bottom, self.settings.beam.stirrup_diameter_mm),
            ..self.clone()
        }
    }

    pub fn backbone(&self, face: Face) -> Backbone {
        match face {
            Face::Top => self.top,
            Face::Bottom => self.bottom,
        }
    }

    /// Invalidate with a stage tag and message
    pub fn fail(&mut self, stage: FailStage, message: impl Into<String>) {
        let message = message.into();
        self.is_valid = false;
        self.fail_stage = Some(stage);
        self.solution.invalidate(message.clone());
        self.fail_message = message;
    }

    /// `"<stage>: <message>"` for diagnostics
    pub fn failure_summary(&self) -> String {
        match self.fail_stage {
            Some(stage) => format!("{} [{}]: {}", self.solution.option_name, stage, self.fail_message),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::beam::Span;

    #[test]
    fn test_backbone_fan_out_owns_solution() {
        let group = BeamGroup::new("B1", vec![Span::new(5000.0, 300.0, 500.0)]);
        let results = vec![SpanResultData::new([1.0; 3], [1.0; 3])];
        let settings = DesignSettings::default();
        let constraints = ProjectConstraints::new();
        let seed = SolutionContext::seed(&group, &results, &settings, &constraints, None);

        let mut a = seed.with_backbone(Backbone::new(20, 2), Backbone::new(18, 2));
        let b = seed.with_backbone(Backbone::new(16, 3), Backbone::new(16, 3));
        a.fail(FailStage::FillSpans, "deficit 1.20 cm²");

        assert!(!a.is_valid);
        assert!(!a.solution.is_valid);
        assert!(b.is_valid);
        assert_eq!(b.solution.option_name, "T3D16-B3D16");
        assert!(a.failure_summary().contains("FillSpansAndBridge"));
    }
}
