//! # Rebar Pipeline
//!
//! Solves one beam group. A seed context runs through an ordered list of
//! stages (`Vec<SolutionContext> -> Vec<SolutionContext>`); invalid contexts
//! are dropped after every stage. Survivors are checked by the rule engine,
//! filtered by admissibility, scored and ranked.
//!
//! The pipeline never returns an error: an infeasible beam yields an empty
//! list, and [`RebarPipeline::execute_with_diagnostics`] reports why.
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::design::{BeamGroup, ProjectConstraints, RebarPipeline, Span, SpanResultData};
//! use rebar_core::settings::DesignSettings;
//!
//! let group = BeamGroup::new("B1", vec![Span::new(6000.0, 300.0, 500.0)]);
//! let results = vec![SpanResultData::new([8.0, 2.0, 8.0], [3.0, 9.0, 3.0])];
//! let solutions = RebarPipeline::standard().execute(
//!     &group,
//!     &results,
//!     &DesignSettings::default(),
//!     &ProjectConstraints::new(),
//!     None,
//! );
//! assert!(!solutions.is_empty() && solutions.len() <= 5);
//! assert!(solutions.iter().all(|s| s.is_valid));
//! ```

use tracing::{debug, instrument};

use super::backbone::BackboneStage;
use super::beam::{BeamGroup, SpanResultData};
use super::constraints::{ExternalConstraints, ProjectConstraints};
use super::context::{FailStage, SolutionContext};
use super::filler::ReinforcementFiller;
use super::orchestrator::Deadline;
use super::rules::{DefaultRuleEngine, RuleEngine};
use super::scoring::{
    check_admissibility, rank_solutions, total_score, weight_scores, ConstructabilityScorer,
    DefaultConstructabilityScorer, PREFERRED_DIAMETER_BONUS,
};
use super::solution::ContinuousBeamSolution;
use crate::settings::DesignSettings;

/// Most solutions returned per beam
pub const MAX_SOLUTIONS: usize = 5;

/// One step of the pipeline
pub trait PipelineStage {
    fn name(&self) -> &'static str;

    fn execute<'a>(&self, contexts: Vec<SolutionContext<'a>>) -> Vec<SolutionContext<'a>>;
}

/// Outcome of one beam solve
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    /// Ranked solutions, best first
    pub solutions: Vec<ContinuousBeamSolution>,
    /// Most specific failure seen, set whenever candidates were dropped
    pub failure: Option<String>,
}

/// Tracks the failure from the latest stage reached
#[derive(Debug, Default)]
struct FailureTracker {
    best: Option<(FailStage, String)>,
}

impl FailureTracker {
    fn record(&mut self, ctx: &SolutionContext<'_>) {
        let Some(stage) = ctx.fail_stage else { return };
        let deeper = match &self.best {
            Some((current, _)) => stage_depth(stage) > stage_depth(*current),
            None => true,
        };
        if deeper {
            self.best = Some((stage, ctx.failure_summary()));
        }
    }

    fn record_message(&mut self, stage: FailStage, message: String) {
        self.best = Some((stage, message));
    }

    fn into_message(self) -> Option<String> {
        self.best.map(|(_, message)| message)
    }
}

fn stage_depth(stage: FailStage) -> u8 {
    match stage {
        FailStage::Deadline => 0,
        FailStage::Backbone => 1,
        FailStage::Setup => 2,
        FailStage::UnifySupports => 3,
        FailStage::FillSpans => 4,
        FailStage::Metrics => 5,
        FailStage::RuleEngine => 6,
        FailStage::Admissibility => 7,
    }
}

/// Ordered stages plus the validation and scoring seams
pub struct RebarPipeline {
    stages: Vec<Box<dyn PipelineStage>>,
    rule_engine: Box<dyn RuleEngine>,
    scorer: Box<dyn ConstructabilityScorer>,
    max_solutions: usize,
}

impl Default for RebarPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl RebarPipeline {
    /// Pipeline with the given stages and the default rule engine and scorer
    pub fn new(stages: Vec<Box<dyn PipelineStage>>) -> Self {
        Self {
            stages,
            rule_engine: Box::new(DefaultRuleEngine),
            scorer: Box::new(DefaultConstructabilityScorer),
            max_solutions: MAX_SOLUTIONS,
        }
    }

    /// Backbone generation followed by the reinforcement filler
    pub fn standard() -> Self {
        Self::new(vec![Box::new(BackboneStage), Box::new(ReinforcementFiller)])
    }

    pub fn with_rule_engine(mut self, engine: Box<dyn RuleEngine>) -> Self {
        self.rule_engine = engine;
        self
    }

    pub fn with_scorer(mut self, scorer: Box<dyn ConstructabilityScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_max_solutions(mut self, max: usize) -> Self {
        self.max_solutions = max;
        self
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Ranked solutions for one beam group (best first, at most five)
    pub fn execute(
        &self,
        group: &BeamGroup,
        span_results: &[SpanResultData],
        settings: &DesignSettings,
        constraints: &ProjectConstraints,
        external: Option<&ExternalConstraints>,
    ) -> Vec<ContinuousBeamSolution> {
        self.execute_with_diagnostics(group, span_results, settings, constraints, external, None)
            .solutions
    }

    /// As [`execute`](Self::execute), also reporting why candidates failed
    #[instrument(skip_all, fields(group = %group.name, spans = group.span_count()))]
    pub fn execute_with_diagnostics(
        &self,
        group: &BeamGroup,
        span_results: &[SpanResultData],
        settings: &DesignSettings,
        constraints: &ProjectConstraints,
        external: Option<&ExternalConstraints>,
        deadline: Option<&Deadline>,
    ) -> PipelineRun {
        let mut failures = FailureTracker::default();

        if let Err(e) = settings.validate().and_then(|_| group.validate()) {
            failures.record_message(FailStage::Setup, e.to_string());
            return PipelineRun {
                solutions: Vec::new(),
                failure: failures.into_message(),
            };
        }

        let mut contexts = vec![SolutionContext::seed(group, span_results, settings, constraints, external)];

        for stage in &self.stages {
            if let Some(Err(e)) = deadline.map(|d| d.check(&format!("starting {}", stage.name()))) {
                failures.record_message(FailStage::Deadline, e.to_string());
                return PipelineRun {
                    solutions: Vec::new(),
                    failure: failures.into_message(),
                };
            }

            let before = contexts.len();
            contexts = stage.execute(contexts);
            contexts = retain_valid(contexts, &mut failures);
            debug!(stage = stage.name(), before, survivors = contexts.len(), "stage complete");

            if contexts.is_empty() {
                return PipelineRun {
                    solutions: Vec::new(),
                    failure: failures.into_message(),
                };
            }
        }

        for ctx in contexts.iter_mut() {
            let violations = self.rule_engine.validate(ctx);
            if let Some(critical) = violations.iter().find(|v| v.is_critical()) {
                let message = format!("{}: {}", critical.rule, critical.message);
                ctx.fail(FailStage::RuleEngine, message);
                continue;
            }
            ctx.rule_penalty += violations.iter().map(|v| v.penalty).sum::<f64>();
        }
        contexts = retain_valid(contexts, &mut failures);

        // Admissibility comes before any scoring
        for ctx in contexts.iter_mut() {
            if let Err(message) = check_admissibility(&ctx.solution, ctx.span_results) {
                ctx.fail(FailStage::Admissibility, message);
            }
        }
        contexts = retain_valid(contexts, &mut failures);
        debug!(survivors = contexts.len(), "validation complete");

        let solutions = self.score(contexts, group, constraints);
        PipelineRun {
            solutions: rank_solutions(solutions, self.max_solutions),
            failure: failures.into_message(),
        }
    }

    fn score(
        &self,
        contexts: Vec<SolutionContext<'_>>,
        group: &BeamGroup,
        constraints: &ProjectConstraints,
    ) -> Vec<ContinuousBeamSolution> {
        let weights: Vec<f64> = contexts.iter().map(|c| c.solution.total_steel_weight_kg).collect();
        let weight_scores = weight_scores(&weights);

        contexts
            .into_iter()
            .zip(weight_scores)
            .map(|(ctx, weight_score)| {
                let penalty = ctx.rule_penalty;
                let mut solution = ctx.solution;
                let constructability = self.scorer.score(&solution);
                let bonus = if uses_preferred_diameter(&solution, group, constraints) {
                    PREFERRED_DIAMETER_BONUS
                } else {
                    0.0
                };
                solution.weight_score = weight_score;
                solution.constructability_score = constructability;
                solution.total_score = total_score(weight_score, constructability, penalty, bonus);
                solution.validation_message = if penalty > 0.0 {
                    format!("Valid with warnings (penalty {:.1})", penalty)
                } else {
                    "Valid".to_string()
                };
                solution
            })
            .collect()
    }
}

fn retain_valid<'a>(contexts: Vec<SolutionContext<'a>>, failures: &mut FailureTracker) -> Vec<SolutionContext<'a>> {
    let (valid, invalid): (Vec<_>, Vec<_>) = contexts.into_iter().partition(|c| c.is_valid);
    for ctx in &invalid {
        failures.record(ctx);
    }
    if !invalid.is_empty() {
        debug!(dropped = invalid.len(), "contexts dropped");
    }
    valid
}

/// Backbone diameter matches the floor preference or a connected neighbor
fn uses_preferred_diameter(solution: &ContinuousBeamSolution, group: &BeamGroup, constraints: &ProjectConstraints) -> bool {
    let matches = |d: u32| d == solution.top.diameter_mm || d == solution.bottom.diameter_mm;
    constraints.preferred_main_diameter_mm.is_some_and(matches)
        || constraints.neighbors_of(group).any(|(_, n)| matches(n.diameter_mm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::beam::Span;
    use crate::design::constraints::NeighborDesign;
    use crate::design::location::{Face, SpanPoint};
    use crate::design::rules::RuleViolation;
    use crate::design::scoring::{CONSTRUCTABILITY_SHARE, WEIGHT_SHARE};
    use crate::design::solution::Backbone;
    use crate::logging;

    /// Reports a fixed set of violations for every candidate
    struct FixedRules(Vec<RuleViolation>);

    impl RuleEngine for FixedRules {
        fn validate(&self, _ctx: &SolutionContext<'_>) -> Vec<RuleViolation> {
            self.0.clone()
        }
    }

    /// Rejects candidates whose top backbone uses one diameter
    struct RejectTopDiameter(u32);

    impl RuleEngine for RejectTopDiameter {
        fn validate(&self, ctx: &SolutionContext<'_>) -> Vec<RuleViolation> {
            if ctx.top.diameter_mm == self.0 {
                vec![RuleViolation::critical("no-d16-top", "top D16 not stocked")]
            } else {
                Vec::new()
            }
        }
    }

    struct FixedScore(f64);

    impl ConstructabilityScorer for FixedScore {
        fn score(&self, _solution: &ContinuousBeamSolution) -> f64 {
            self.0
        }
    }

    fn run_with(pipeline: &RebarPipeline) -> PipelineRun {
        let (group, results) = two_span();
        pipeline.execute_with_diagnostics(
            &group,
            &results,
            &DesignSettings::default(),
            &ProjectConstraints::new(),
            None,
            None,
        )
    }

    fn two_span() -> (BeamGroup, Vec<SpanResultData>) {
        let group = BeamGroup::new(
            "B1",
            vec![Span::new(6000.0, 300.0, 500.0), Span::new(5000.0, 300.0, 500.0)],
        );
        let results = vec![
            SpanResultData::new([6.0, 2.0, 11.0], [3.0, 9.5, 3.0]),
            SpanResultData::new([10.0, 2.0, 5.0], [3.0, 7.0, 3.0]),
        ];
        (group, results)
    }

    #[test]
    fn test_standard_stage_order() {
        assert_eq!(
            RebarPipeline::standard().stage_names(),
            vec!["BackboneGeneration", "ReinforcementFiller"]
        );
    }

    #[test]
    fn test_solutions_are_admissible_ranked_and_unique() {
        let (group, results) = two_span();
        let solutions = RebarPipeline::standard().execute(
            &group,
            &results,
            &DesignSettings::default(),
            &ProjectConstraints::new(),
            None,
        );
        assert!(!solutions.is_empty());
        assert!(solutions.len() <= MAX_SOLUTIONS);

        for solution in &solutions {
            assert!(solution.is_valid);
            for (s, data) in results.iter().enumerate() {
                for face in Face::ALL {
                    for point in SpanPoint::ALL {
                        assert!(
                            solution.provided_area_cm2(s, face, point) >= data.required(face, point) * 0.98,
                            "{} under-provides Span{} {} {}",
                            solution.option_name,
                            s + 1,
                            face,
                            point
                        );
                    }
                }
            }
        }

        for pair in solutions.windows(2) {
            assert!(pair[0].total_score >= pair[1].total_score);
            if pair[0].total_score == pair[1].total_score {
                assert!(pair[0].total_steel_weight_kg <= pair[1].total_steel_weight_kg);
            }
        }
        let mut names: Vec<&str> = solutions.iter().map(|s| s.option_name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), solutions.len());
    }

    #[test]
    fn test_deterministic() {
        let (group, results) = two_span();
        let settings = DesignSettings::default();
        let constraints = ProjectConstraints::new();
        let pipeline = RebarPipeline::standard();
        let a = pipeline.execute(&group, &results, &settings, &constraints, None);
        let b = pipeline.execute(&group, &results, &settings, &constraints, None);
        let names = |v: &[ContinuousBeamSolution]| v.iter().map(|s| s.option_name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&a), names(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_infeasible_beam_returns_empty_with_reason() {
        let group = BeamGroup::new("B3", vec![Span::new(6000.0, 150.0, 400.0)]);
        let results = vec![SpanResultData::new([40.0, 5.0, 40.0], [3.0, 30.0, 3.0])];
        let run = RebarPipeline::standard().execute_with_diagnostics(
            &group,
            &results,
            &DesignSettings::default(),
            &ProjectConstraints::new(),
            None,
            None,
        );
        assert!(run.solutions.is_empty());
        let failure = run.failure.unwrap();
        assert!(failure.contains("deficit"), "{}", failure);
    }

    #[test]
    fn test_missing_results_reported() {
        let (group, mut results) = two_span();
        results.pop();
        let run = RebarPipeline::standard().execute_with_diagnostics(
            &group,
            &results,
            &DesignSettings::default(),
            &ProjectConstraints::new(),
            None,
            None,
        );
        assert!(run.solutions.is_empty());
        assert!(run.failure.unwrap().contains("B1 span 2"));
    }

    #[test]
    fn test_invalid_settings_reported() {
        let (group, results) = two_span();
        let mut settings = DesignSettings::default();
        settings.rebar.available_diameters_mm.clear();
        let run = RebarPipeline::standard().execute_with_diagnostics(
            &group,
            &results,
            &settings,
            &ProjectConstraints::new(),
            None,
            None,
        );
        assert!(run.solutions.is_empty());
        assert!(run.failure.unwrap().contains("available_diameters_mm"));
    }

    #[test]
    fn test_expired_deadline_stops_before_first_stage() {
        let (group, results) = two_span();
        let deadline = Deadline::after(std::time::Duration::ZERO);
        let run = RebarPipeline::standard().execute_with_diagnostics(
            &group,
            &results,
            &DesignSettings::default(),
            &ProjectConstraints::new(),
            None,
            Some(&deadline),
        );
        assert!(run.solutions.is_empty());
        assert!(run.failure.unwrap().contains("BackboneGeneration"));
    }

    #[test]
    fn test_locked_backbone_is_respected() {
        let (group, results) = two_span();
        let external = ExternalConstraints { top: Backbone::new(20, 2), bottom: Backbone::new(20, 3) };
        let solutions = RebarPipeline::standard().execute(
            &group,
            &results,
            &DesignSettings::default(),
            &ProjectConstraints::new(),
            Some(&external),
        );
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].top, Backbone::new(20, 2));
        assert_eq!(solutions[0].bottom, Backbone::new(20, 3));
    }

    #[test]
    fn test_warnings_cost_exactly_their_penalty() {
        logging::init_test();
        let clean = run_with(
            &RebarPipeline::standard()
                .with_rule_engine(Box::new(FixedRules(Vec::new())))
                .with_scorer(Box::new(FixedScore(50.0))),
        );
        let warned = run_with(
            &RebarPipeline::standard()
                .with_rule_engine(Box::new(FixedRules(vec![
                    RuleViolation::warning("congestion", "layer 1 is full", 4.0),
                    RuleViolation::warning("diameter-jump", "D12 beside D25", 3.5),
                ])))
                .with_scorer(Box::new(FixedScore(50.0))),
        );

        assert!(!clean.solutions.is_empty());
        assert_eq!(clean.solutions.len(), warned.solutions.len());
        for (a, b) in clean.solutions.iter().zip(&warned.solutions) {
            assert_eq!(a.option_name, b.option_name);
            assert!((a.total_score - b.total_score - 7.5).abs() < 1e-9);
            assert_eq!(a.validation_message, "Valid");
            assert_eq!(b.validation_message, "Valid with warnings (penalty 7.5)");
            assert!(b.is_valid);
        }
    }

    #[test]
    fn test_critical_violation_drops_candidate() {
        logging::init_test();
        let run = run_with(&RebarPipeline::standard().with_rule_engine(Box::new(RejectTopDiameter(16))));
        assert!(run.solutions.iter().all(|s| s.top.diameter_mm != 16));

        let rejected = run_with(&RebarPipeline::standard().with_rule_engine(Box::new(FixedRules(vec![
            RuleViolation::critical("backbone-fit", "does not fit"),
            RuleViolation::warning("congestion", "layer 1 is full", 2.0),
        ]))));
        assert!(rejected.solutions.is_empty());
        let failure = rejected.failure.unwrap();
        assert!(failure.contains("[RuleEngine]"), "{}", failure);
        assert!(failure.contains("backbone-fit: does not fit"), "{}", failure);
    }

    #[test]
    fn test_constructability_enters_total_at_forty_percent() {
        logging::init_test();
        let pipeline = |score: f64| {
            RebarPipeline::standard()
                .with_rule_engine(Box::new(FixedRules(Vec::new())))
                .with_scorer(Box::new(FixedScore(score)))
        };
        let low = run_with(&pipeline(50.0));
        let high = run_with(&pipeline(80.0));

        assert!(!high.solutions.is_empty());
        for (a, b) in low.solutions.iter().zip(&high.solutions) {
            assert_eq!(a.option_name, b.option_name);
            assert!((b.total_score - a.total_score - 0.4 * 30.0).abs() < 1e-9);
            assert_eq!(b.constructability_score, 80.0);
            let expected = WEIGHT_SHARE * b.weight_score + CONSTRUCTABILITY_SHARE * 80.0;
            assert!((b.total_score - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_max_solutions_limit() {
        let run = run_with(&RebarPipeline::standard().with_max_solutions(2));
        assert!(!run.solutions.is_empty());
        assert!(run.solutions.len() <= 2);

        let full = run_with(&RebarPipeline::standard());
        assert_eq!(run.solutions[0], full.solutions[0]);
    }

    #[test]
    fn test_preferred_diameter_bonus() {
        let group = BeamGroup::new("B2", vec![Span::new(5000.0, 300.0, 500.0)]).connected_to("B1");
        let solution = ContinuousBeamSolution::new(Backbone::new(20, 2), Backbone::new(16, 2), 8);
        let mut constraints = ProjectConstraints::new();
        assert!(!uses_preferred_diameter(&solution, &group, &constraints));
        constraints.neighbor_designs.insert(
            "B1".into(),
            NeighborDesign { diameter_mm: 16, count: 2, stirrup_diameter_mm: 8 },
        );
        assert!(uses_preferred_diameter(&solution, &group, &constraints));
    }
}
