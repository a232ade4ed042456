//! Run-level entry points: launch the browser, convert, merge, close.
//!
//! Every entry point resolves its task list before the browser starts, so an
//! empty input fails fast without launching Chromium or creating any output
//! directory. The browser session is closed on every exit path of the run.

use crate::batch::BatchConverter;
use crate::config::ConversionConfig;
use crate::error::Md2PdfError;
use crate::orchestrator::MergeOrchestrator;
use crate::output::{BatchStats, ConversionTask, RunReport};
use crate::pipeline::discover;
use crate::pipeline::render::{ChromeRenderer, PdfRenderer};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{info, warn};

/// Convert every Markdown file under `input_dir` into `output_dir`.
///
/// Merges the results when [`ConversionConfig::merge_name`] is set.
///
/// # Returns
/// `Ok(RunReport)` even if some files failed (check
/// [`RunReport::all_succeeded`] or call [`RunReport::into_result`]).
///
/// # Errors
/// Returns `Err(Md2PdfError)` only for fatal errors:
/// - No Markdown files found
/// - Output directory cannot be created
/// - The browser failed to start
/// - The merge of the successful outputs failed
pub async fn convert_directory(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<RunReport, Md2PdfError> {
    let (input_dir, output_dir) = (input_dir.as_ref(), output_dir.as_ref());
    info!("Starting batch conversion: {}", input_dir.display());
    let tasks = discover::plan_tasks(None, input_dir, output_dir)?;
    run_with_browser(tasks, output_dir, config).await
}

/// Convert an explicit selection of files, in the given order.
///
/// Relative entries are resolved against `input_root`, and each PDF keeps
/// its path relative to `input_root` under `output_dir`.
pub async fn convert_files(
    files: &[PathBuf],
    input_root: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<RunReport, Md2PdfError> {
    let output_dir = output_dir.as_ref();
    let tasks = discover::plan_tasks(Some(files), input_root.as_ref(), output_dir)?;
    run_with_browser(tasks, output_dir, config).await
}

/// Convert a single Markdown file.
///
/// `output` may be a `.pdf` path or a directory (no extension); when `None`
/// the PDF is written beside the input. Merge settings are ignored.
pub async fn convert_file(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    config: &ConversionConfig,
) -> Result<RunReport, Md2PdfError> {
    let input = input.as_ref();
    if !input.is_file() {
        return Err(Md2PdfError::InputNotFound {
            path: input.to_path_buf(),
        });
    }
    let task = discover::single_file_task(input, output);
    let output_dir = task
        .destination_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let config = ConversionConfig {
        merge_name: None,
        ..config.clone()
    };
    run_with_browser(vec![task], &output_dir, &config).await
}

/// Synchronous wrapper around [`convert_directory`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<RunReport, Md2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_directory(input_dir, output_dir, config))
}

/// Run planned tasks against an existing renderer, then merge if requested.
///
/// This is the seam the browser-backed entry points share; callers that
/// bring their own [`PdfRenderer`] use it directly.
///
/// Fails before touching the file system when `tasks` is empty or when the
/// merged file (or its intermediate) would overwrite one of the outputs.
pub async fn convert_with<R: PdfRenderer>(
    renderer: &R,
    tasks: Vec<ConversionTask>,
    output_dir: &Path,
    config: &ConversionConfig,
) -> Result<RunReport, Md2PdfError> {
    if tasks.is_empty() {
        return Err(Md2PdfError::NoInputFiles {
            root: output_dir.to_path_buf(),
        });
    }
    if let Some(ref name) = config.merge_name {
        let outputs: Vec<PathBuf> = tasks.iter().map(|t| t.destination_path.clone()).collect();
        MergeOrchestrator::check_collisions(
            &MergeOrchestrator::merged_path(output_dir, name),
            &outputs,
        )?;
    }

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| Md2PdfError::OutputDirectoryFailed {
            path: output_dir.to_path_buf(),
            source,
        })?;

    let start = Instant::now();
    let results = BatchConverter::new(renderer, config).run_tasks(tasks).await;
    let stats = BatchStats::from_results(&results, start.elapsed().as_millis() as u64);
    let mut report = RunReport {
        results,
        stats,
        merge: None,
    };

    let Some(ref name) = config.merge_name else {
        return Ok(report);
    };
    if config
        .cancel
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::SeqCst))
    {
        warn!("Run cancelled, skipping merge");
        return Ok(report);
    }
    let sources = report.successful_outputs();
    if sources.is_empty() {
        warn!("No files converted, nothing to merge");
        return Ok(report);
    }

    let final_path = MergeOrchestrator::merged_path(output_dir, name);
    let mut orchestrator = MergeOrchestrator::new(config.footer.clone())
        .with_progress(config.progress_callback.clone());
    report.merge = Some(orchestrator.run(&sources, &final_path).await?);
    Ok(report)
}

async fn run_with_browser(
    tasks: Vec<ConversionTask>,
    output_dir: &Path,
    config: &ConversionConfig,
) -> Result<RunReport, Md2PdfError> {
    let renderer = ChromeRenderer::launch(&config.browser).await?;
    let report = convert_with(&renderer, tasks, output_dir, config).await;
    renderer.close().await;

    if let Ok(ref r) = report {
        info!(
            "Run complete: {}/{} files, {}ms",
            r.stats.succeeded, r.stats.total, r.stats.duration_ms
        );
    }
    report
}
