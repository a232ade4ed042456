//! Result types returned by the batch and merge stages.
//!
//! Everything here is plain data and `Serialize`, so the CLI can dump a
//! whole run as JSON with `--json`.

use crate::error::{Md2PdfError, TaskError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One Markdown file to convert and where its PDF goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionTask {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
}

/// The outcome of attempting one [`ConversionTask`].
///
/// `destination_path` exists on disk if and only if `succeeded` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub task: ConversionTask,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
}

impl ConversionResult {
    pub fn success(task: ConversionTask) -> Self {
        Self {
            task,
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(task: ConversionTask, error: TaskError) -> Self {
        Self {
            task,
            succeeded: false,
            error: Some(error),
        }
    }
}

/// Aggregate counters for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Wall-clock time for the conversion loop, excluding the merge.
    pub duration_ms: u64,
}

impl BatchStats {
    pub fn from_results(results: &[ConversionResult], duration_ms: u64) -> Self {
        let succeeded = results.iter().filter(|r| r.succeeded).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            duration_ms,
        }
    }
}

/// Where the merged PDF ended up and whether it carries page numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub path: PathBuf,
    pub page_count: usize,
    /// Number of per-file PDFs that went into the merge.
    pub sources: usize,
    /// False when footer numbering failed and the unnumbered merge was kept.
    pub numbered: bool,
}

/// Everything a conversion run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// One entry per resolved input file, in resolution order.
    pub results: Vec<ConversionResult>,
    pub stats: BatchStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeOutcome>,
}

impl RunReport {
    /// True when every file converted.
    pub fn all_succeeded(&self) -> bool {
        self.stats.failed == 0
    }

    /// Destinations of the successful conversions, in batch order.
    pub fn successful_outputs(&self) -> Vec<PathBuf> {
        self.results
            .iter()
            .filter(|r| r.succeeded)
            .map(|r| r.task.destination_path.clone())
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results.iter().filter(|r| !r.succeeded)
    }

    /// Turn any per-file failure into [`Md2PdfError::PartialFailure`].
    pub fn into_result(self) -> Result<Self, Md2PdfError> {
        if self.all_succeeded() {
            Ok(self)
        } else {
            Err(Md2PdfError::PartialFailure {
                succeeded: self.stats.succeeded,
                failed: self.stats.failed,
                total: self.stats.total,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str) -> ConversionTask {
        ConversionTask {
            source_path: PathBuf::from(format!("{name}.md")),
            destination_path: PathBuf::from(format!("out/{name}.pdf")),
        }
    }

    fn report(results: Vec<ConversionResult>) -> RunReport {
        let stats = BatchStats::from_results(&results, 12);
        RunReport {
            results,
            stats,
            merge: None,
        }
    }

    #[test]
    fn stats_count_successes_and_failures() {
        let r = report(vec![
            ConversionResult::success(task("a")),
            ConversionResult::failure(
                task("b"),
                TaskError::RenderFailed {
                    path: "b.md".into(),
                    detail: "boom".into(),
                },
            ),
            ConversionResult::success(task("c")),
        ]);
        assert_eq!(r.stats.total, 3);
        assert_eq!(r.stats.succeeded, 2);
        assert_eq!(r.stats.failed, 1);
        assert!(!r.all_succeeded());
        assert_eq!(
            r.successful_outputs(),
            vec![PathBuf::from("out/a.pdf"), PathBuf::from("out/c.pdf")]
        );
        assert_eq!(r.failures().count(), 1);
    }

    #[test]
    fn into_result_reports_partial_failure() {
        let r = report(vec![
            ConversionResult::success(task("a")),
            ConversionResult::failure(
                task("b"),
                TaskError::Cancelled {
                    path: "b.md".into(),
                },
            ),
        ]);
        match r.into_result() {
            Err(Md2PdfError::PartialFailure {
                succeeded: 1,
                failed: 1,
                total: 2,
            }) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn successful_report_passes_through() {
        let r = report(vec![ConversionResult::success(task("a"))]);
        assert!(r.clone().into_result().is_ok());
    }

    #[test]
    fn report_serialises_without_empty_fields() {
        let r = report(vec![ConversionResult::success(task("a"))]);
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("merge").is_none());
        assert!(json["results"][0].get("error").is_none());
        assert_eq!(json["stats"]["succeeded"], 1);
    }
}
