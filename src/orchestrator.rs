//! Merge the batch's PDFs into one document with running page numbers.
//!
//! ```text
//! Idle ──▶ Merging ──▶ Renumbering ──▶ Done
//!             │             │
//!          MergeFailed   RenumberFailed ──▶ UsingUnnumberedFallback ──▶ Done
//! ```
//!
//! The merged document is written to `<name>.temp.pdf` first. When footer
//! numbering succeeds the numbered PDF is written to the final path and the
//! intermediate is removed; when it fails, the intermediate is renamed to
//! the final path. A numbering failure is never an error for the caller.

use crate::config::FooterSpec;
use crate::error::{Md2PdfError, RenumberError};
use crate::output::MergeOutcome;
use crate::pdf::{FooterRenumberer, PdfDocument, PdfMerger};
use crate::progress::ProgressCallback;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the orchestrator is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    Idle,
    Merging,
    Renumbering,
    RenumberFailed,
    UsingUnnumberedFallback,
    Done,
}

/// Runs the merge → renumber sequence over successful batch outputs.
pub struct MergeOrchestrator {
    footer: FooterSpec,
    progress: Option<ProgressCallback>,
    state: MergeState,
}

impl MergeOrchestrator {
    pub fn new(footer: FooterSpec) -> Self {
        Self {
            footer,
            progress: None,
            state: MergeState::Idle,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> MergeState {
        self.state
    }

    /// Final merged path: `name` under `output_dir`, with a `.pdf` suffix.
    pub fn merged_path(output_dir: &Path, name: &str) -> PathBuf {
        let path = output_dir.join(name);
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            path
        } else {
            path.with_extension("pdf")
        }
    }

    /// The unnumbered intermediate written beside `final_path`.
    pub fn intermediate_path(final_path: &Path) -> PathBuf {
        final_path.with_extension("temp.pdf")
    }

    /// Reject a merge whose final or intermediate file would land on one of
    /// `outputs`.
    pub fn check_collisions(final_path: &Path, outputs: &[PathBuf]) -> Result<(), Md2PdfError> {
        let intermediate = Self::intermediate_path(final_path);
        for target in [final_path, intermediate.as_path()] {
            if let Some(clash) = outputs.iter().find(|o| o.as_path() == target) {
                return Err(Md2PdfError::InvalidConfig(format!(
                    "merge output '{}' would overwrite converted file '{}'",
                    target.display(),
                    clash.display()
                )));
            }
        }
        Ok(())
    }

    /// Merge `sources` (in order) into `final_path` and number its pages.
    pub async fn run(
        &mut self,
        sources: &[PathBuf],
        final_path: &Path,
    ) -> Result<MergeOutcome, Md2PdfError> {
        self.run_with(sources, final_path, FooterRenumberer::renumber)
            .await
    }

    /// [`run`](Self::run) with a custom numbering step.
    pub async fn run_with<F>(
        &mut self,
        sources: &[PathBuf],
        final_path: &Path,
        renumber: F,
    ) -> Result<MergeOutcome, Md2PdfError>
    where
        F: FnOnce(PdfDocument, &FooterSpec) -> Result<PdfDocument, RenumberError>,
    {
        Self::check_collisions(final_path, sources)?;
        self.state = MergeState::Merging;
        info!("Merging {} PDFs into {}", sources.len(), final_path.display());
        if let Some(ref cb) = self.progress {
            cb.on_merge_start(sources.len());
        }

        if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| Md2PdfError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let mut merged = PdfMerger::merge_files(sources)?;
        let page_count = merged.page_count();
        let intermediate = Self::intermediate_path(final_path);
        let bytes = merged.to_bytes().map_err(|e| Md2PdfError::MergeFailed {
            path: final_path.to_path_buf(),
            detail: e.to_string(),
        })?;
        tokio::fs::write(&intermediate, &bytes)
            .await
            .map_err(|source| Md2PdfError::OutputWriteFailed {
                path: intermediate.clone(),
                source,
            })?;
        debug!("Intermediate merge written to {}", intermediate.display());

        self.state = MergeState::Renumbering;
        let numbered = match renumber(merged, &self.footer) {
            Ok(doc) => persist(doc, final_path).await,
            Err(e) => Err(e),
        };

        let numbered = match numbered {
            Ok(()) => {
                if let Err(e) = tokio::fs::remove_file(&intermediate).await {
                    warn!(
                        "Could not remove intermediate '{}': {e}",
                        intermediate.display()
                    );
                }
                info!("Merged PDF with page numbers saved: {}", final_path.display());
                true
            }
            Err(e) => {
                self.state = MergeState::RenumberFailed;
                warn!("Page numbering failed, keeping unnumbered merge: {e}");
                self.state = MergeState::UsingUnnumberedFallback;
                tokio::fs::rename(&intermediate, final_path)
                    .await
                    .map_err(|source| Md2PdfError::OutputWriteFailed {
                        path: final_path.to_path_buf(),
                        source,
                    })?;
                info!(
                    "Merged PDF saved (without page numbers): {}",
                    final_path.display()
                );
                false
            }
        };

        self.state = MergeState::Done;
        if let Some(ref cb) = self.progress {
            cb.on_merge_complete(final_path, page_count, numbered);
        }
        Ok(MergeOutcome {
            path: final_path.to_path_buf(),
            page_count,
            sources: sources.len(),
            numbered,
        })
    }
}

async fn persist(mut doc: PdfDocument, path: &Path) -> Result<(), RenumberError> {
    let persist_err = |detail: String| RenumberError::Persist {
        path: path.to_path_buf(),
        detail,
    };
    let bytes = doc.to_bytes().map_err(|e| persist_err(e.to_string()))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| persist_err(e.to_string()))
}
