//! Sequential per-file conversion with partial-failure tracking.
//!
//! Files are converted one at a time against a single [`PdfRenderer`]. A
//! failure at any stage (read, render, directory creation, write) marks that
//! file failed and the batch moves on; the returned results always line up
//! one-to-one with the resolved file set. A failed or cancelled file never
//! leaves a PDF from an earlier run at its destination.

use crate::config::ConversionConfig;
use crate::error::{Md2PdfError, TaskError};
use crate::output::{ConversionResult, ConversionTask};
use crate::pdf::PdfDocument;
use crate::pipeline::discover;
use crate::pipeline::markdown::HtmlTemplate;
use crate::pipeline::render::PdfRenderer;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

/// Drives a batch of [`ConversionTask`]s through Markdown → HTML → PDF.
pub struct BatchConverter<'a, R> {
    renderer: &'a R,
    config: &'a ConversionConfig,
    template: HtmlTemplate,
}

impl<'a, R: PdfRenderer> BatchConverter<'a, R> {
    /// Loads the stylesheet and template named by `config` once for the
    /// whole batch.
    pub fn new(renderer: &'a R, config: &'a ConversionConfig) -> Self {
        Self {
            renderer,
            config,
            template: HtmlTemplate::from_config(config),
        }
    }

    pub fn with_template(mut self, template: HtmlTemplate) -> Self {
        self.template = template;
        self
    }

    /// Resolve the file set and convert every file.
    ///
    /// `selection` is used verbatim when given; otherwise `input_root` is
    /// scanned. Fails only when nothing can be attempted: no input files, or
    /// the output root cannot be created.
    pub async fn convert_batch(
        &self,
        selection: Option<&[PathBuf]>,
        input_root: &Path,
        output_root: &Path,
    ) -> Result<Vec<ConversionResult>, Md2PdfError> {
        let tasks = discover::plan_tasks(selection, input_root, output_root)?;
        tokio::fs::create_dir_all(output_root)
            .await
            .map_err(|source| Md2PdfError::OutputDirectoryFailed {
                path: output_root.to_path_buf(),
                source,
            })?;
        Ok(self.run_tasks(tasks).await)
    }

    /// Convert already-planned tasks in order.
    pub async fn run_tasks(&self, tasks: Vec<ConversionTask>) -> Vec<ConversionResult> {
        let total = tasks.len();
        let progress = self.config.progress_callback.as_ref();
        if let Some(cb) = progress {
            cb.on_batch_start(total);
        }

        let mut results = Vec::with_capacity(total);
        for (index, task) in tasks.into_iter().enumerate() {
            if self.cancelled() {
                let error = TaskError::Cancelled {
                    path: task.source_path.clone(),
                };
                if let Some(cb) = progress {
                    cb.on_file_error(index, total, &error.to_string());
                }
                discard_stale(&task.destination_path).await;
                results.push(ConversionResult::failure(task, error));
                continue;
            }

            if let Some(cb) = progress {
                cb.on_file_start(index, total, &task.source_path);
            }
            match self.convert_one(&task).await {
                Ok(()) => {
                    info!(
                        "[{}/{}] {} → {}",
                        index + 1,
                        total,
                        task.source_path.display(),
                        task.destination_path.display()
                    );
                    if let Some(cb) = progress {
                        cb.on_file_complete(index, total, &task.destination_path);
                    }
                    results.push(ConversionResult::success(task));
                }
                Err(error) => {
                    warn!("[{}/{}] {error}", index + 1, total);
                    if let Some(cb) = progress {
                        cb.on_file_error(index, total, &error.to_string());
                    }
                    discard_stale(&task.destination_path).await;
                    results.push(ConversionResult::failure(task, error));
                }
            }
        }

        let succeeded = results.iter().filter(|r| r.succeeded).count();
        info!("Conversion completed: {succeeded}/{total} files converted successfully");
        if let Some(cb) = progress {
            cb.on_batch_complete(total, succeeded);
        }
        results
    }

    fn cancelled(&self) -> bool {
        self.config
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    async fn convert_one(&self, task: &ConversionTask) -> Result<(), TaskError> {
        let source = &task.source_path;
        let markdown =
            tokio::fs::read_to_string(source)
                .await
                .map_err(|e| TaskError::ReadFailed {
                    path: source.clone(),
                    detail: e.to_string(),
                })?;

        let html = self.template.render(&markdown);
        debug!("{}: {} bytes of HTML", source.display(), html.len());

        let pdf = self
            .renderer
            .render(&html, source_dir(source), &self.config.page)
            .await
            .map_err(|e| TaskError::RenderFailed {
                path: source.clone(),
                detail: e.to_string(),
            })?;
        if pdf.is_empty() {
            return Err(TaskError::RenderFailed {
                path: source.clone(),
                detail: "renderer returned no data".into(),
            });
        }
        if let Err(e) = PdfDocument::load_mem(&pdf) {
            return Err(TaskError::RenderFailed {
                path: source.clone(),
                detail: format!("renderer returned an unreadable PDF: {e}"),
            });
        }

        write_pdf(&task.destination_path, &pdf).await
    }
}

/// Directory relative assets of `source` resolve against.
fn source_dir(source: &Path) -> Option<&Path> {
    match source.parent() {
        Some(p) if p.as_os_str().is_empty() => Some(Path::new(".")),
        other => other,
    }
}

/// Remove a destination left over from an earlier run.
async fn discard_stale(dest: &Path) {
    match tokio::fs::remove_file(dest).await {
        Ok(()) => debug!("Removed stale {}", dest.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove stale {}: {e}", dest.display()),
    }
}

/// Write `bytes` to `<dest>.tmp` and rename over `dest`, so `dest` never
/// holds a partial PDF.
async fn write_pdf(dest: &Path, bytes: &[u8]) -> Result<(), TaskError> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TaskError::OutputDirectory {
                path: parent.to_path_buf(),
                detail: e.to_string(),
            })?;
    }

    let tmp = dest.with_extension("pdf.tmp");
    let written = match tokio::fs::write(&tmp, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp, dest).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(TaskError::WriteFailed {
            path: dest.to_path_buf(),
            detail: e.to_string(),
        });
    }
    Ok(())
}
