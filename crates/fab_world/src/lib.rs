//! Job-file loading and tunables overrides, shared by the CLI and any
//! future embedding.
//!
//! The job roster is plain text, one wafer id per line. Blank and
//! whitespace-only lines are ignored; everything else is taken verbatim as
//! an id. Phase durations and defect chances come from the tunables
//! profile, not the file.

use std::path::{Path, PathBuf};

use fab_core::{Job, JobId, Tunables};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("input file not found: {0}")]
    NotFound(PathBuf),
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} contains no job ids")]
    NoJobs(PathBuf),
    #[error("parsing tunables from {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Read the job roster file into ids, preserving file order.
pub fn load_job_ids(path: &Path) -> Result<Vec<JobId>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let ids: Vec<JobId> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| JobId(line.to_string()))
        .collect();

    if ids.is_empty() {
        return Err(LoadError::NoJobs(path.to_path_buf()));
    }
    Ok(ids)
}

/// Load the roster and build one job per id from the tunables profile.
pub fn load_jobs(path: &Path, tunables: &Tunables) -> Result<Vec<Job>, LoadError> {
    let ids = load_job_ids(path)?;
    Ok(ids
        .into_iter()
        .map(|id| Job::from_profile(id, tunables))
        .collect())
}

/// Load a tunables profile from a JSON file. Missing fields fall back to
/// the defaults, so an override file only needs the knobs it changes.
pub fn load_tunables(path: &Path) -> Result<Tunables, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| LoadError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_one_id_per_line() {
        let file = write_temp("T_1\nT_2\nT_3\n");
        let ids = load_job_ids(file.path()).unwrap();
        assert_eq!(
            ids,
            vec![
                JobId("T_1".to_string()),
                JobId("T_2".to_string()),
                JobId("T_3".to_string())
            ]
        );
    }

    #[test]
    fn skips_blank_and_whitespace_lines() {
        let file = write_temp("T_1\n\n   \n\tT_2\n");
        let ids = load_job_ids(file.path()).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1], JobId("T_2".to_string()), "ids are trimmed");
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_job_ids(Path::new("/nonexistent/jobs.txt")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn empty_roster_is_an_error() {
        let file = write_temp("\n  \n");
        let err = load_job_ids(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::NoJobs(_)));
    }

    #[test]
    fn jobs_get_profile_durations() {
        let file = write_temp("T_1\n");
        let tunables = Tunables::default();
        let jobs = load_jobs(file.path(), &tunables).unwrap();
        assert_eq!(jobs[0].phases[0].required_ticks, 60);
        assert_eq!(jobs[0].phases[1].required_ticks, 20);
        assert_eq!(jobs[0].phases[2].required_ticks, 120);
        assert_eq!(jobs[0].current_stage, 0);
    }

    #[test]
    fn tunables_file_overrides_only_named_fields() {
        let file = write_temp(r#"{"battery_capacity_mwh": 1000, "deposition_w": 150}"#);
        let tunables = load_tunables(file.path()).unwrap();
        assert_eq!(tunables.battery_capacity_mwh, 1_000);
        assert_eq!(tunables.deposition_w, 150);
        assert_eq!(tunables.implant_w, 200, "untouched fields keep defaults");
    }

    #[test]
    fn malformed_tunables_file_is_an_error() {
        let file = write_temp("not json");
        let err = load_tunables(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }
}
