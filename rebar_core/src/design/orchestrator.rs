//! # Multi-Beam Orchestrator
//!
//! Solves every beam on a floor in priority order. Beams solved earlier
//! constrain beams solved later: each success is recorded as a neighbor
//! design so connected beams try the same bar diameter first.
//!
//! [`ProjectConstraints`] is owned here. Each beam solve sees an immutable
//! snapshot and hands back a [`ConstraintUpdate`]; the orchestrator applies
//! it before the next beam starts. Every beam gets exactly one result entry,
//! valid or not.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::beam::{BeamGroup, SpanResultData};
use super::constraints::{ConstraintUpdate, ExternalConstraints, ProjectConstraints};
use super::pipeline::{RebarPipeline, MAX_SOLUTIONS};
use super::solution::ContinuousBeamSolution;
use crate::errors::{RebarError, RebarResult};
use crate::settings::DesignSettings;

// =============================================================================
// DEADLINE
// =============================================================================

/// Wall-clock budget for a solve
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    /// Deadline `budget` from now
    pub fn after(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.budget
    }

    /// `Err(DeadlineExceeded)` once the budget is spent
    pub fn check(&self, activity: &str) -> RebarResult<()> {
        if self.is_expired() {
            let elapsed_ms = u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX);
            return Err(RebarError::DeadlineExceeded {
                elapsed_ms,
                activity: activity.to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// JOBS AND RESULTS
// =============================================================================

/// One beam to solve: geometry plus analysis results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamJob {
    pub group: BeamGroup,
    pub span_results: Vec<SpanResultData>,
}

impl BeamJob {
    pub fn new(group: BeamGroup, span_results: Vec<SpanResultData>) -> Self {
        Self { group, span_results }
    }
}

/// Outcome for one beam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamDesignResult {
    pub group_name: String,
    /// Chosen design, or the FAILED sentinel
    pub solution: ContinuousBeamSolution,
    /// Other diverse candidates, best first
    pub alternatives: Vec<ContinuousBeamSolution>,
    pub is_valid: bool,
}

impl BeamDesignResult {
    fn failed(group_name: &str, message: impl Into<String>) -> Self {
        Self {
            group_name: group_name.to_string(),
            solution: ContinuousBeamSolution::failed(message),
            alternatives: Vec::new(),
            is_valid: false,
        }
    }
}

/// Results of a floor solve, in solve order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FloorSolveReport {
    pub results: Vec<BeamDesignResult>,
}

impl FloorSolveReport {
    /// Result for a group
    pub fn get(&self, group_name: &str) -> Option<&BeamDesignResult> {
        self.results.iter().find(|r| r.group_name == group_name)
    }

    pub fn valid_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_valid).count()
    }
}

// =============================================================================
// DIVERSITY
// =============================================================================

/// Picks a spread of alternatives from ranked candidates
pub trait DiversitySelector {
    fn select(&self, ranked: Vec<ContinuousBeamSolution>, limit: usize) -> Vec<ContinuousBeamSolution>;
}

/// Best first, then candidates with an unseen backbone diameter pair, then the rest
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDiversitySelector;

impl DiversitySelector for DefaultDiversitySelector {
    fn select(&self, ranked: Vec<ContinuousBeamSolution>, limit: usize) -> Vec<ContinuousBeamSolution> {
        let mut seen: Vec<(u32, u32)> = Vec::new();
        let mut picked = Vec::new();
        let mut rest = Vec::new();

        for solution in ranked {
            let pair = (solution.top.diameter_mm, solution.bottom.diameter_mm);
            if seen.contains(&pair) {
                rest.push(solution);
            } else {
                seen.push(pair);
                picked.push(solution);
            }
        }
        picked.extend(rest);
        picked.truncate(limit);
        picked
    }
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Sequential floor solver
pub struct MultiBeamOrchestrator {
    pipeline: RebarPipeline,
    selector: Box<dyn DiversitySelector>,
    settings: DesignSettings,
}

impl MultiBeamOrchestrator {
    /// Orchestrator using the standard pipeline
    pub fn new(settings: DesignSettings) -> Self {
        Self {
            pipeline: RebarPipeline::standard(),
            selector: Box::new(DefaultDiversitySelector),
            settings,
        }
    }

    pub fn with_pipeline(mut self, pipeline: RebarPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_selector(mut self, selector: Box<dyn DiversitySelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn settings(&self) -> &DesignSettings {
        &self.settings
    }

    /// Solve every job in priority order (stable for equal priorities).
    ///
    /// Returns the report and the constraints as updated by every success.
    #[instrument(skip_all, fields(beams = jobs.len()))]
    pub fn solve_floor(
        &self,
        jobs: &[BeamJob],
        mut constraints: ProjectConstraints,
        deadline: Option<&Deadline>,
    ) -> (FloorSolveReport, ProjectConstraints) {
        let mut order: Vec<&BeamJob> = jobs.iter().collect();
        order.sort_by_key(|job| job.group.priority);

        let mut report = FloorSolveReport::default();
        for job in order {
            let name = job.group.name.as_str();

            if let Some(Err(e)) = deadline.map(|d| d.check(&format!("solving {}", name))) {
                warn!(group = name, "deadline reached, beam not solved");
                report.results.push(BeamDesignResult::failed(name, e.to_string()));
                continue;
            }

            let (result, update) = self.solve_beam(job, &constraints, deadline);
            if let Some(update) = update {
                constraints.apply(update);
            }
            report.results.push(result);
        }

        info!(
            solved = report.valid_count(),
            total = report.results.len(),
            "floor solve complete"
        );
        (report, constraints)
    }

    /// Solve one beam against a constraints snapshot
    pub fn solve_beam(
        &self,
        job: &BeamJob,
        constraints: &ProjectConstraints,
        deadline: Option<&Deadline>,
    ) -> (BeamDesignResult, Option<ConstraintUpdate>) {
        let group = &job.group;
        let external = group.locked_design.map(ExternalConstraints::from);

        let run = self.pipeline.execute_with_diagnostics(
            group,
            &job.span_results,
            &self.settings,
            constraints,
            external.as_ref(),
            deadline,
        );

        let mut selected = self.selector.select(run.solutions, MAX_SOLUTIONS).into_iter();
        let Some(best) = selected.next() else {
            let message = run
                .failure
                .unwrap_or_else(|| format!("No feasible reinforcement for '{}'", group.name));
            warn!(group = %group.name, reason = %message, "beam has no feasible design");
            return (BeamDesignResult::failed(&group.name, message), None);
        };

        info!(
            group = %group.name,
            option = %best.option_name,
            score = best.total_score,
            weight_kg = best.total_steel_weight_kg,
            "beam solved"
        );
        let update = ConstraintUpdate::from_solution(&group.name, &best);
        let result = BeamDesignResult {
            group_name: group.name.clone(),
            solution: best,
            alternatives: selected.collect(),
            is_valid: true,
        };
        (result, Some(update))
    }
}
