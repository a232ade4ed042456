//! File-set resolution: which Markdown files to convert and where each PDF
//! lands.
//!
//! Directory runs replay each file's path relative to the input root under
//! the output root, so `docs/guide/intro.md` becomes `out/guide/intro.pdf`.

use crate::error::Md2PdfError;
use crate::output::ConversionTask;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions recognised as Markdown, compared case-insensitively.
pub const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|m| ext.eq_ignore_ascii_case(m))
        })
        .unwrap_or(false)
}

/// Recursively list Markdown files under `root` in lexicographic,
/// depth-first order. Unreadable entries are skipped with a warning.
pub fn discover_markdown(root: &Path) -> Result<Vec<PathBuf>, Md2PdfError> {
    if !root.is_dir() {
        return Err(Md2PdfError::InputNotFound {
            path: root.to_path_buf(),
        });
    }

    let files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_markdown(e.path()))
        .map(|e| e.into_path())
        .collect();

    debug!("Discovered {} Markdown files under {}", files.len(), root.display());
    Ok(files)
}

/// Build the ordered task list for a directory run.
///
/// With `selection`, those files are used verbatim in caller order; relative
/// entries are taken relative to `input_root`. Without it, `input_root` is
/// scanned. An empty result is [`Md2PdfError::NoInputFiles`].
pub fn plan_tasks(
    selection: Option<&[PathBuf]>,
    input_root: &Path,
    output_root: &Path,
) -> Result<Vec<ConversionTask>, Md2PdfError> {
    let sources: Vec<PathBuf> = match selection {
        Some(files) => files
            .iter()
            .map(|f| {
                if f.is_absolute() || f.starts_with(input_root) {
                    f.clone()
                } else {
                    input_root.join(f)
                }
            })
            .collect(),
        None => discover_markdown(input_root)?,
    };

    if sources.is_empty() {
        return Err(Md2PdfError::NoInputFiles {
            root: input_root.to_path_buf(),
        });
    }

    sources
        .into_iter()
        .map(|source| {
            let relative = source
                .strip_prefix(input_root)
                .map_err(|_| Md2PdfError::OutsideInputRoot {
                    path: source.clone(),
                    root: input_root.to_path_buf(),
                })?
                .to_path_buf();
            if relative
                .components()
                .any(|c| matches!(c, Component::ParentDir))
            {
                return Err(Md2PdfError::OutsideInputRoot {
                    path: source,
                    root: input_root.to_path_buf(),
                });
            }
            Ok(ConversionTask {
                destination_path: destination_for(&relative, output_root),
                source_path: source,
            })
        })
        .collect()
}

/// `relative` with its extension replaced by `.pdf`, under `output_root`.
pub fn destination_for(relative: &Path, output_root: &Path) -> PathBuf {
    output_root.join(relative).with_extension("pdf")
}

/// The task for single-file mode.
///
/// `output` without an extension names a directory and the PDF takes the
/// input's file stem; no `output` puts the PDF beside the input.
pub fn single_file_task(input: &Path, output: Option<&Path>) -> ConversionTask {
    let destination_path = match output {
        None => input.with_extension("pdf"),
        Some(out) if out.extension().is_none() => {
            let stem = input.file_stem().unwrap_or(input.as_os_str());
            out.join(stem).with_extension("pdf")
        }
        Some(out) => out.to_path_buf(),
    };
    ConversionTask {
        source_path: input.to_path_buf(),
        destination_path,
    }
}
