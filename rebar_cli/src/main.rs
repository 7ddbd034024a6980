//! # rebar_cli
//!
//! Solves a floor project from the command line.
//!
//! ```text
//! rebar_cli <project.json> [report.json]
//! rebar_cli                 # built-in two-beam demo
//! ```
//!
//! Prints the ranked designs and cutting schedule for each beam and writes
//! the JSON report (default `<project>.report.json`). `RUST_LOG=debug`
//! shows pipeline progress.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use rebar_core::cutting::CuttingResult;
use rebar_core::design::{BeamGroup, BeamJob, Deadline, MemberType, Span, SpanResultData};
use rebar_core::file_io::{load_project, report_path_for, save_project, save_report};
use rebar_core::project::{BeamReport, FloorDesignReport, FloorProject};
use rebar_core::{logging, RebarResult};
use tracing::error;

/// Wall-clock budget for one floor
const SOLVE_BUDGET: Duration = Duration::from_secs(60);

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = match args.first() {
        Some(project) => run_project(Path::new(project), args.get(1).map(PathBuf::from)),
        None => run_demo(),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.error_code(), "{}", e);
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

fn run_project(path: &Path, report_path: Option<PathBuf>) -> RebarResult<()> {
    let mut project = load_project(path)?;
    let deadline = Deadline::after(SOLVE_BUDGET);
    let report = project.solve(Some(&deadline))?;
    print_report(&project, &report);

    let report_path = report_path.unwrap_or_else(|| report_path_for(path));
    save_report(&report, &report_path)?;
    save_project(&project, path)?;
    println!("Report written to {}", report_path.display());
    Ok(())
}

fn run_demo() -> RebarResult<()> {
    println!("No project given. Running the built-in two-beam demo...");
    println!();

    let mut project = demo_project();
    let report = project.solve(None)?;
    print_report(&project, &report);

    println!();
    println!("JSON Output:");
    if let Ok(json) = serde_json::to_string_pretty(&report) {
        println!("{}", json);
    }
    Ok(())
}

/// A two-span girder and a single-span beam framing into it
fn demo_project() -> FloorProject {
    let mut project = FloorProject::new("Demo Engineer", "DEMO-01", "Demo Client");
    project.add_beam(BeamJob::new(
        BeamGroup::new(
            "G1",
            vec![Span::new(8000.0, 350.0, 650.0), Span::new(7000.0, 350.0, 650.0)],
        )
        .with_member_type(MemberType::Girder)
        .connected_to("B1"),
        vec![
            SpanResultData::new([6.0, 3.0, 16.0], [4.0, 12.0, 4.0]).with_supports("COL-A1", "COL-A2"),
            SpanResultData::new([15.0, 3.0, 6.0], [4.0, 10.0, 4.0]).with_supports("COL-A2", "COL-A3"),
        ],
    ));
    project.add_beam(BeamJob::new(
        BeamGroup::new("B1", vec![Span::new(6000.0, 300.0, 500.0)])
            .with_priority(1)
            .connected_to("G1"),
        vec![SpanResultData::new([5.0, 2.0, 6.0], [2.5, 7.5, 2.5]).with_supports("G1", "WALL-W1")],
    ));
    project
}

fn print_report(project: &FloorProject, report: &FloorDesignReport) {
    println!("═══════════════════════════════════════");
    println!("  FLOOR {} - {} beam(s)", project.meta.job_id, report.beams.len());
    println!("═══════════════════════════════════════");
    for beam in &report.beams {
        println!();
        print_beam(beam);
    }
    println!();
    println!("═══════════════════════════════════════");
    println!(
        "  {} of {} beams designed, {:.1} kg steel",
        report.valid_count(),
        report.beams.len(),
        report.total_steel_weight_kg()
    );
    println!("═══════════════════════════════════════");
}

fn print_beam(beam: &BeamReport) {
    let solution = &beam.solution;
    if !beam.is_valid {
        println!("{}: [FAIL] {}", beam.group_name, solution.validation_message);
        return;
    }

    println!(
        "{}: {} [OK]  score {:.1}, {:.1} kg",
        beam.group_name, solution.option_name, solution.total_score, solution.total_steel_weight_kg
    );
    for (key, spec) in &solution.reinforcements {
        println!("    {:<18} {}", key.to_string(), spec.label());
    }
    if solution.wasted_bar_count > 0 {
        println!("    ({} bar(s) added to complete a layer)", solution.wasted_bar_count);
    }
    for alt in &beam.alternatives {
        println!(
            "  alt {:<14} score {:.1}, {:.1} kg",
            alt.option_name, alt.total_score, alt.total_steel_weight_kg
        );
    }
    for cut in &beam.cutting {
        print_cutting(cut);
    }
}

fn print_cutting(cut: &CuttingResult) {
    let face = if cut.is_top_bar { "Top" } else { "Bot" };
    let pieces: Vec<String> = cut
        .segments
        .iter()
        .map(|s| {
            let mut piece = format!("{:.0}-{:.0}", s.start_mm, s.end_mm);
            if s.start_hook.is_some() {
                piece.insert(0, '⌐');
            }
            if s.end_hook.is_some() {
                piece.push('¬');
            }
            piece
        })
        .collect();
    println!("  cut {} {:.0} mm: {}", face, cut.total_length_mm, pieces.join(" | "));
}
