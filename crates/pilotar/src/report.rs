//! Result publication.
//!
//! The runner hands the ordered result list to a [`Reporter`] once, after the
//! suite completes. Publication failures are the caller's to log; they never
//! affect test outcomes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::{PilotarError, PilotarResult};
use crate::runner::TestCaseResult;

/// Aggregate counts for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of cases executed
    pub total: usize,
    /// Cases that passed
    pub passed: usize,
    /// Cases that failed
    pub failed: usize,
    /// Sum of case durations in seconds
    pub duration: f64,
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
}

impl RunSummary {
    /// Tally a result list.
    #[must_use]
    pub fn from_results(results: &[TestCaseResult]) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration: results.iter().map(|r| r.duration).sum(),
            generated_at: Utc::now(),
        }
    }
}

/// Consumes the ordered result list at the end of a run.
pub trait Reporter {
    /// Publish the results, returning the location of the artifact.
    fn publish(&self, results: &[TestCaseResult]) -> PilotarResult<PathBuf>;
}

/// Writes `results_<timestamp>.json` under the reports directory.
#[derive(Debug, Clone)]
pub struct JsonReporter {
    reports_dir: PathBuf,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    summary: RunSummary,
    results: &'a [TestCaseResult],
}

impl JsonReporter {
    /// Reporter rooted at the given directory.
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }
}

impl Reporter for JsonReporter {
    fn publish(&self, results: &[TestCaseResult]) -> PilotarResult<PathBuf> {
        std::fs::create_dir_all(&self.reports_dir).map_err(|e| PilotarError::Report {
            message: format!("cannot create {}: {e}", self.reports_dir.display()),
        })?;

        let document = ReportDocument {
            summary: RunSummary::from_results(results),
            results,
        };
        let json = serde_json::to_string_pretty(&document)?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = self.reports_dir.join(format!("results_{timestamp}.json"));
        std::fs::write(&path, json).map_err(|e| PilotarError::Report {
            message: format!("cannot write {}: {e}", path.display()),
        })?;

        tracing::info!(report = %path.display(), "report written");
        Ok(path)
    }
}

/// Load a previously written report file (summary and results).
pub fn read_report(path: &Path) -> PilotarResult<(RunSummary, Vec<TestCaseResult>)> {
    #[derive(Deserialize)]
    struct OwnedDocument {
        summary: RunSummary,
        results: Vec<TestCaseResult>,
    }
    let contents = std::fs::read_to_string(path)?;
    let document: OwnedDocument = serde_json::from_str(&contents)?;
    Ok((document.summary, document.results))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn result(id: &str, success: bool) -> TestCaseResult {
        TestCaseResult {
            id: id.to_string(),
            name: format!("case {id}"),
            description: String::new(),
            success,
            duration: 1.5,
            error: (!success).then(|| "boom".to_string()),
            screenshot: None,
            steps: vec![],
            start_time: Utc::now(),
            end_time: Utc::now(),
        }
    }

    #[test]
    fn test_summary_tallies() {
        let results = vec![result("A", true), result("B", false), result("C", true)];
        let summary = RunSummary::from_results(&results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert!((summary.duration - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_json_reporter_writes_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = JsonReporter::new(dir.path());

        let results = vec![result("TC001", true), result("TC002", false)];
        let path = reporter.publish(&results).unwrap();

        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("results_"));

        let (summary, loaded) = read_report(&path).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "TC001");
        assert_eq!(loaded[1].error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_reporter_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/reports");
        let reporter = JsonReporter::new(&nested);
        let path = reporter.publish(&[]).unwrap();
        assert!(path.starts_with(&nested));
    }
}
