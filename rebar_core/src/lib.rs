//! # rebar_core - Continuous Beam Reinforcement Design
//!
//! `rebar_core` designs longitudinal reinforcement for continuous concrete
//! beams. Given each beam's spans and the required steel areas from a
//! structural analysis, it generates candidate bar layouts, checks them for
//! spacing and layering, scores and ranks them, and details the winners into
//! cut, spliced and hooked bars. All inputs and outputs are JSON-serializable.
//!
//! ## Quick Start
//!
//! ```rust
//! use rebar_core::design::{BeamGroup, BeamJob, MultiBeamOrchestrator, ProjectConstraints, Span, SpanResultData};
//! use rebar_core::settings::DesignSettings;
//!
//! let job = BeamJob::new(
//!     BeamGroup::new("B1", vec![Span::new(6000.0, 300.0, 500.0), Span::new(5000.0, 300.0, 500.0)]),
//!     vec![
//!         SpanResultData::new([6.0, 2.0, 11.0], [3.0, 9.5, 3.0]),
//!         SpanResultData::new([10.0, 2.0, 5.0], [3.0, 7.0, 3.0]),
//!     ],
//! );
//!
//! let orchestrator = MultiBeamOrchestrator::new(DesignSettings::default());
//! let (report, _constraints) = orchestrator.solve_floor(&[job], ProjectConstraints::new(), None);
//!
//! let b1 = report.get("B1").unwrap();
//! assert!(b1.is_valid);
//! println!("{} ({:.1} kg)", b1.solution.option_name, b1.solution.total_steel_weight_kg);
//! ```
//!
//! ## Modules
//!
//! - [`design`] - Pipeline, filler, rules, scoring and the floor orchestrator
//! - [`cutting`] - Bar cutting, splice staggering and end hooks
//! - [`settings`] - Design settings with defaults
//! - [`materials`] - Rebar table and lap lengths
//! - [`project`] - Floor project container and design report
//! - [`file_io`] - Atomic saves and versioned loads
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`logging`] - `tracing` subscriber setup

pub mod cutting;
pub mod design;
pub mod errors;
pub mod file_io;
pub mod logging;
pub mod materials;
pub mod project;
pub mod settings;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use errors::{RebarError, RebarResult};
pub use file_io::{load_project, save_project, save_report};
pub use project::{FloorDesignReport, FloorProject, ProjectMetadata};
pub use settings::DesignSettings;
