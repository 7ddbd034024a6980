//! # Floor Projects
//!
//! A `FloorProject` is the root container saved to disk: metadata, design
//! settings, every beam on the floor with its analysis results, and the
//! cross-beam constraints left by the last solve.
//!
//! ## Structure
//!
//! ```text
//! FloorProject
//! ├── meta: ProjectMetadata (version, engineer, job info, timestamps)
//! ├── settings: DesignSettings
//! ├── beams: Vec<BeamJob> (group + span results)
//! └── constraints: ProjectConstraints
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::design::{BeamGroup, BeamJob, Span, SpanResultData};
//! use rebar_core::project::FloorProject;
//!
//! let mut project = FloorProject::new("Jane Engineer", "25-042", "ACME Corp");
//! project.add_beam(BeamJob::new(
//!     BeamGroup::new("B1", vec![Span::new(6000.0, 300.0, 500.0)]),
//!     vec![SpanResultData::new([8.0, 2.0, 8.0], [3.0, 9.0, 3.0])],
//! ));
//!
//! let report = project.solve(None).unwrap();
//! assert_eq!(report.beams.len(), 1);
//! assert!(report.beams[0].is_valid);
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cutting::{BarRun, CuttingResult, RebarCuttingAlgorithm};
use crate::design::{
    BeamDesignResult, BeamJob, ContinuousBeamSolution, Deadline, Face, MultiBeamOrchestrator, ProjectConstraints,
};
use crate::errors::{RebarError, RebarResult};
use crate::settings::DesignSettings;

/// Current schema version for project files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorProject {
    pub meta: ProjectMetadata,

    #[serde(default)]
    pub settings: DesignSettings,

    /// Beams in input order; solve order comes from their priority
    #[serde(default)]
    pub beams: Vec<BeamJob>,

    #[serde(default)]
    pub constraints: ProjectConstraints,
}

impl FloorProject {
    /// Create an empty project.
    ///
    /// ```rust
    /// use rebar_core::project::{FloorProject, SCHEMA_VERSION};
    ///
    /// let project = FloorProject::new("John Doe", "25-001", "Client Corp");
    /// assert_eq!(project.meta.engineer, "John Doe");
    /// assert_eq!(project.meta.version, SCHEMA_VERSION);
    /// ```
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        FloorProject {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: DesignSettings::default(),
            beams: Vec::new(),
            constraints: ProjectConstraints::new(),
        }
    }

    pub fn add_beam(&mut self, job: BeamJob) {
        self.beams.push(job);
        self.touch();
    }

    /// Remove a beam by group name
    pub fn remove_beam(&mut self, name: &str) -> Option<BeamJob> {
        let index = self.beams.iter().position(|b| b.group.name == name)?;
        self.touch();
        Some(self.beams.remove(index))
    }

    pub fn beam(&self, name: &str) -> Option<&BeamJob> {
        self.beams.iter().find(|b| b.group.name == name)
    }

    pub fn beam_count(&self) -> usize {
        self.beams.len()
    }

    /// Update the modified timestamp
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Settings are sane and group names are unique
    pub fn validate(&self) -> RebarResult<()> {
        self.settings.validate()?;
        let mut names = BTreeSet::new();
        for job in &self.beams {
            if !names.insert(job.group.name.as_str()) {
                return Err(RebarError::invalid_input(
                    "beams",
                    job.group.name.clone(),
                    "Duplicate beam group name",
                ));
            }
        }
        Ok(())
    }

    /// Solve every beam, cut the chosen backbones, and keep the resulting constraints.
    ///
    /// Infeasible beams appear in the report as invalid entries; only bad
    /// settings or duplicate names are errors.
    pub fn solve(&mut self, deadline: Option<&Deadline>) -> RebarResult<FloorDesignReport> {
        self.validate()?;
        let orchestrator = MultiBeamOrchestrator::new(self.settings.clone());
        let (solved, constraints) = orchestrator.solve_floor(&self.beams, self.constraints.clone(), deadline);
        self.constraints = constraints;
        self.touch();

        let cutter = RebarCuttingAlgorithm::new(self.settings.cutting.clone());
        let beams: Vec<BeamReport> = solved
            .results
            .into_iter()
            .map(|result| {
                let cutting = match self.beam(&result.group_name) {
                    Some(job) if result.is_valid => cut_backbones(&cutter, job, &result.solution),
                    _ => Vec::new(),
                };
                BeamReport::new(result, cutting)
            })
            .collect();

        let report = FloorDesignReport {
            job_id: self.meta.job_id.clone(),
            generated: Utc::now(),
            beams,
            constraints: self.constraints.clone(),
        };
        info!(
            job = %report.job_id,
            valid = report.valid_count(),
            total = report.beams.len(),
            "floor design report ready"
        );
        Ok(report)
    }
}

impl Default for FloorProject {
    fn default() -> Self {
        FloorProject::new("", "", "")
    }
}

fn cut_backbones(cutter: &RebarCuttingAlgorithm, job: &BeamJob, solution: &ContinuousBeamSolution) -> Vec<CuttingResult> {
    Face::ALL
        .iter()
        .map(|&face| cutter.process_complete(&BarRun::backbone(&job.group, &job.span_results, solution, face)))
        .collect()
}

/// Project metadata stored in the file header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,
    pub engineer: String,
    /// Job/project number
    pub job_id: String,
    pub client: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// One beam in a design report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamReport {
    pub group_name: String,
    pub is_valid: bool,
    pub solution: ContinuousBeamSolution,
    pub alternatives: Vec<ContinuousBeamSolution>,
    /// Top then bottom backbone, for valid beams
    pub cutting: Vec<CuttingResult>,
}

impl BeamReport {
    fn new(result: BeamDesignResult, cutting: Vec<CuttingResult>) -> Self {
        Self {
            group_name: result.group_name,
            is_valid: result.is_valid,
            solution: result.solution,
            alternatives: result.alternatives,
            cutting,
        }
    }
}

/// Output of a floor solve, saved next to the project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorDesignReport {
    pub job_id: String,
    pub generated: DateTime<Utc>,
    pub beams: Vec<BeamReport>,
    pub constraints: ProjectConstraints,
}

impl FloorDesignReport {
    pub fn get(&self, group_name: &str) -> Option<&BeamReport> {
        self.beams.iter().find(|b| b.group_name == group_name)
    }

    pub fn valid_count(&self) -> usize {
        self.beams.iter().filter(|b| b.is_valid).count()
    }

    /// Total steel of the chosen designs (kg)
    pub fn total_steel_weight_kg(&self) -> f64 {
        self.beams
            .iter()
            .filter(|b| b.is_valid)
            .map(|b| b.solution.total_steel_weight_kg)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{BeamGroup, Span, SpanResultData};

    fn project() -> FloorProject {
        let mut project = FloorProject::new("Test Engineer", "25-007", "Test Client");
        project.add_beam(BeamJob::new(
            BeamGroup::new(
                "B1",
                vec![Span::new(8000.0, 300.0, 600.0), Span::new(8000.0, 300.0, 600.0)],
            ),
            vec![
                SpanResultData::new([4.0, 2.0, 12.0], [3.0, 9.0, 3.0]).with_supports("COL-1", "COL-2"),
                SpanResultData::new([12.0, 2.0, 4.0], [3.0, 9.0, 3.0]).with_supports("COL-2", "WALL-3"),
            ],
        ));
        project.add_beam(BeamJob::new(
            BeamGroup::new("B2", vec![Span::new(5000.0, 250.0, 450.0)])
                .with_priority(1)
                .connected_to("B1"),
            vec![SpanResultData::new([5.0, 1.0, 5.0], [2.0, 5.0, 2.0])],
        ));
        project
    }

    #[test]
    fn test_project_creation() {
        let project = FloorProject::new("John Doe", "25-001", "Acme Corp");
        assert_eq!(project.meta.job_id, "25-001");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.beam_count(), 0);
    }

    #[test]
    fn test_project_serialization() {
        let project = project();
        let json = serde_json::to_string_pretty(&project).unwrap();
        assert!(json.contains("Test Engineer"));
        assert!(json.contains("\"B2\""));

        let roundtrip: FloorProject = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, project);
    }

    #[test]
    fn test_missing_settings_default() {
        let project = FloorProject::new("E", "J", "C");
        let mut value = serde_json::to_value(&project).unwrap();
        value.as_object_mut().unwrap().remove("settings");
        value.as_object_mut().unwrap().remove("constraints");
        let loaded: FloorProject = serde_json::from_value(value).unwrap();
        assert_eq!(loaded.settings, DesignSettings::default());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut project = project();
        let copy = project.beams[0].clone();
        project.add_beam(copy);
        let err = project.solve(None).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_remove_beam() {
        let mut project = project();
        assert!(project.remove_beam("B2").is_some());
        assert!(project.remove_beam("B2").is_none());
        assert_eq!(project.beam_count(), 1);
    }

    #[test]
    fn test_solve_reports_designs_and_cutting() {
        let mut project = project();
        let report = project.solve(None).unwrap();
        assert_eq!(report.beams.len(), 2);
        assert_eq!(report.valid_count(), 2);
        assert!(report.total_steel_weight_kg() > 0.0);

        // 16 m run is longer than a mill bar: two pieces, hooked at both column/wall ends
        let b1 = report.get("B1").unwrap();
        assert_eq!(b1.cutting.len(), 2);
        for cut in &b1.cutting {
            assert!(cut.is_contiguous());
            assert_eq!(cut.segments.len(), 2);
            assert!(cut.segments[0].start_hook.is_some());
            assert!(cut.segments[1].end_hook.is_some());
        }
        assert!(b1.cutting[0].is_top_bar);

        assert!(project.constraints.neighbor_designs.contains_key("B1"));
        assert_eq!(report.constraints, project.constraints);
    }
}
