//! # Beam Reinforcement Design
//!
//! Longitudinal reinforcement design for continuous beams. A beam group and
//! its per-span analysis results go in; ranked candidate layouts come out.
//!
//! ## Flow
//!
//! 1. [`backbone`] - candidate continuous top/bottom bars
//! 2. [`filler`] - support and mid-span addons, shared supports, bridging, weight
//! 3. [`rules`] - detailing checks
//! 4. [`scoring`] - admissibility, scores, ranking
//!
//! [`pipeline`] strings these together for one beam; [`orchestrator`] runs a
//! whole floor so connected beams share bar diameters.
//!
//! ## Building Blocks
//!
//! - [`placement`] - clear spacing, bars per layer, stirrup legs
//! - [`filling`] - strategies that split addon bars across layers
//! - [`location`] - section keys like `Span2_Top_Left`
//! - [`solution`] - bar specs and the solution record
//! - [`constraints`] - cross-beam state

pub mod backbone;
pub mod beam;
pub mod constraints;
pub mod context;
pub mod filler;
pub mod filling;
pub mod location;
pub mod orchestrator;
pub mod pipeline;
pub mod placement;
pub mod rules;
pub mod scoring;
pub mod solution;

// Re-export commonly used types
pub use backbone::BackboneStage;
pub use beam::{BeamGroup, LockedDesign, MemberType, Span, SpanResultData};
pub use constraints::{ConstraintUpdate, ExternalConstraints, NeighborDesign, ProjectConstraints};
pub use context::{FailStage, SolutionContext};
pub use filler::ReinforcementFiller;
pub use filling::{BalancedStrategy, FillingContext, FillingResult, FillingStrategy, GreedyStrategy};
pub use location::{Face, LocationKey, Section, SpanPoint};
pub use orchestrator::{
    BeamDesignResult, BeamJob, Deadline, DefaultDiversitySelector, DiversitySelector, FloorSolveReport,
    MultiBeamOrchestrator,
};
pub use pipeline::{PipelineRun, PipelineStage, RebarPipeline, MAX_SOLUTIONS};
pub use rules::{DefaultRuleEngine, RuleEngine, RuleViolation, Severity};
pub use scoring::{ConstructabilityScorer, DefaultConstructabilityScorer};
pub use solution::{Backbone, ContinuousBeamSolution, RebarSpec, FAILED_OPTION_NAME};
