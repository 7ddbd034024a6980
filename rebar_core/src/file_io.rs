//! # File I/O Module
//!
//! Project and report files on disk:
//! - **Atomic saves**: write to `.tmp`, fsync, rename over the target
//! - **Version validation**: refuse project files from an incompatible schema
//!
//! Both projects and reports are pretty-printed JSON. A report is saved next
//! to its project as `<stem>.report.json`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rebar_core::file_io::{load_project, report_path_for, save_project, save_report};
//! use std::path::Path;
//!
//! let path = Path::new("level2.json");
//! let mut project = load_project(path)?;
//! let report = project.solve(None)?;
//! save_report(&report, &report_path_for(path))?;
//! save_project(&project, path)?;
//! # Ok::<(), rebar_core::errors::RebarError>(())
//! ```

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::errors::{RebarError, RebarResult};
use crate::project::{FloorDesignReport, FloorProject, SCHEMA_VERSION};

/// Save a project atomically
pub fn save_project(project: &FloorProject, path: &Path) -> RebarResult<()> {
    write_json_atomic(project, path)
}

/// Save a design report atomically
pub fn save_report(report: &FloorDesignReport, path: &Path) -> RebarResult<()> {
    write_json_atomic(report, path)
}

/// Load a project and check its schema version.
///
/// # Returns
///
/// * `Err(RebarError::VersionMismatch)` - File version is incompatible
/// * `Err(RebarError::SerializationError)` - Invalid JSON
/// * `Err(RebarError::FileError)` - I/O error
pub fn load_project(path: &Path) -> RebarResult<FloorProject> {
    let contents = fs::read_to_string(path)
        .map_err(|e| RebarError::file_error("read", path.display().to_string(), e.to_string()))?;

    let project: FloorProject = serde_json::from_str(&contents).map_err(|e| RebarError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;

    validate_version(&project.meta.version)?;
    debug!(path = %path.display(), beams = project.beam_count(), "project loaded");
    Ok(project)
}

/// `level2.json` → `level2.report.json`
pub fn report_path_for(project_path: &Path) -> PathBuf {
    let stem = project_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    project_path.with_file_name(format!("{}.report.json", stem))
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serialize, write to a temp file, sync, then rename over `path`
fn write_json_atomic<T: Serialize>(value: &T, path: &Path) -> RebarResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        RebarError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        RebarError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        RebarError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        RebarError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    debug!(path = %path.display(), bytes = json.len(), "file saved");
    Ok(())
}

/// Major must match; in 0.x a newer minor is rejected too
fn validate_version(file_version: &str) -> RebarResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    let mismatch = || RebarError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let (Some(&file_major), Some(&current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }
    if current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    use crate::design::{BeamGroup, BeamJob, Span, SpanResultData};

    fn temp_path(name: &str) -> PathBuf {
        temp_dir().join(format!("rebar_core_test_{}.json", name))
    }

    fn sample() -> FloorProject {
        let mut project = FloorProject::new("Test Engineer", "TEST-001", "Test Client");
        project.add_beam(BeamJob::new(
            BeamGroup::new("B1", vec![Span::new(6000.0, 300.0, 500.0)]),
            vec![SpanResultData::new([8.0, 2.0, 8.0], [3.0, 9.0, 3.0])],
        ));
        project
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_path("roundtrip");
        let project = sample();
        save_project(&project, &path).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.meta.job_id, "TEST-001");
        assert_eq!(loaded.beams, project.beams);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let path = temp_path("atomic");
        save_project(&sample(), &path).unwrap();
        assert!(path.exists());
        assert!(!tmp_path_for(&path).exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_report_saved_next_to_project() {
        let path = temp_path("report");
        let report_path = report_path_for(&path);
        assert_eq!(report_path, temp_dir().join("rebar_core_test_report.report.json"));

        let mut project = sample();
        let report = project.solve(None).unwrap();
        save_report(&report, &report_path).unwrap();

        let text = fs::read_to_string(&report_path).unwrap();
        let loaded: FloorDesignReport = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.beams.len(), 1);
        assert_eq!(loaded.beams[0].group_name, "B1");

        let _ = fs::remove_file(&report_path);
    }

    #[test]
    fn test_load_rejects_bad_files() {
        let missing = load_project(&temp_path("does_not_exist")).unwrap_err();
        assert_eq!(missing.error_code(), "FILE_ERROR");

        let garbage = temp_path("garbage");
        fs::write(&garbage, "{ not json").unwrap();
        assert_eq!(load_project(&garbage).unwrap_err().error_code(), "SERIALIZATION_ERROR");
        let _ = fs::remove_file(&garbage);

        let future = temp_path("future");
        let mut project = sample();
        project.meta.version = "1.0.0".to_string();
        save_project(&project, &future).unwrap();
        assert_eq!(load_project(&future).unwrap_err().error_code(), "VERSION_MISMATCH");
        let _ = fs::remove_file(&future);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }
}
