//! Error types for the edgequake-md2pdf library.
//!
//! Each kind of failure has its own type:
//!
//! * [`Md2PdfError`] — **Fatal**: the run cannot proceed or cannot produce
//!   its requested artifact (no input files, browser failed to start, merge
//!   of the per-file PDFs failed). Returned as `Err(Md2PdfError)` from the
//!   top-level `convert*` functions.
//!
//! * [`TaskError`] — **Non-fatal**: a single Markdown file failed to read,
//!   render or write. Stored inside [`crate::output::ConversionResult`] so
//!   the batch keeps going and callers can inspect partial success.
//!
//! * [`RenderError`] — the browser could not print one HTML page. Becomes
//!   a [`TaskError::RenderFailed`] for that file.
//!
//! * [`PdfError`] — a low-level PDF primitive (load, page tree walk, save)
//!   failed. Wrapped into one of the other types by the caller.
//!
//! * [`MergeError`] — a source PDF could not be concatenated. Surfaces to
//!   callers as [`Md2PdfError::MergeFailed`].
//!
//! * [`RenumberError`] — footer injection failed. Always recovered by the
//!   merge orchestrator, which falls back to the unnumbered merged PDF.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-md2pdf library.
///
/// Per-file failures use [`TaskError`] and are stored in
/// [`crate::output::ConversionResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The resolved file set is empty.
    #[error("No Markdown files found in '{root}'\nExpected at least one *.md or *.markdown file.")]
    NoInputFiles { root: PathBuf },

    /// Input file or directory does not exist.
    #[error("Input path not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// An explicitly selected file is outside the input root, so its
    /// destination cannot be derived.
    #[error("'{path}' is not inside the input directory '{root}'")]
    OutsideInputRoot { path: PathBuf, root: PathBuf },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The output root could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write a run-level artifact (the merged PDF).
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Collaborator errors ───────────────────────────────────────────────
    /// The headless browser session could not be started.
    #[error(
        "Failed to start the headless browser: {detail}\n\n\
Chromium or Chrome must be installed. You can:\n\
  • Install Chromium through your package manager.\n\
  • Point --chrome (or MD2PDF_CHROME) at an existing chrome/chromium binary.\n"
    )]
    CollaboratorUnavailable { detail: String },

    // ── Merge errors ──────────────────────────────────────────────────────
    /// A per-file PDF could not be read or concatenated.
    #[error("PDF merge failed on '{path}': {detail}")]
    MergeFailed { path: PathBuf, detail: String },

    /// Merging was requested without an output name.
    #[error("A merge output name is required when merging.\nProvide it with -n/--name <NAME>.")]
    MergeNameRequired,

    /// Some files succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::RunReport::into_result`] when the caller
    /// wants to treat any file failure as an error.
    #[error("{failed}/{total} files failed to convert")]
    PartialFailure {
        succeeded: usize,
        failed: usize,
        total: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file in a batch.
///
/// Stored alongside [`crate::output::ConversionResult`] when a file fails.
/// The batch always continues with the next file.
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TaskError {
    /// The Markdown source could not be read as UTF-8 text.
    #[error("Failed to read '{path}': {detail}")]
    ReadFailed { path: PathBuf, detail: String },

    /// The HTML → PDF collaborator failed.
    #[error("Rendering '{path}' failed: {detail}")]
    RenderFailed { path: PathBuf, detail: String },

    /// The produced PDF could not be written.
    #[error("Failed to write '{path}': {detail}")]
    WriteFailed { path: PathBuf, detail: String },

    /// The destination's parent directory could not be created.
    #[error("Failed to create output directory '{path}': {detail}")]
    OutputDirectory { path: PathBuf, detail: String },

    /// The run was cancelled before this file was started.
    #[error("Skipped '{path}': conversion cancelled")]
    Cancelled { path: PathBuf },
}

/// The HTML → PDF collaborator could not produce a PDF.
///
/// Mapped to [`TaskError::RenderFailed`] by the batch, which knows the
/// source path.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The HTML could not be written to a temporary file.
    #[error("Failed to stage HTML for printing: {0}")]
    Staging(#[source] std::io::Error),

    /// The browser failed to open, load or print the page.
    #[error("Browser could not print the page: {0}")]
    Browser(String),
}

/// Failure of a low-level PDF primitive.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The bytes could not be parsed as a PDF.
    #[error("Failed to load PDF: {0}")]
    Load(String),

    /// The PDF parsed but its object graph is not usable (missing page
    /// tree, page that is not a dictionary, …).
    #[error("Malformed PDF: {0}")]
    Malformed(String),

    /// Serialising the document failed.
    #[error("Failed to save PDF: {0}")]
    Save(String),
}

/// Concatenating source PDFs failed.
///
/// Merging is all-or-nothing: the first unusable source aborts the merge.
#[derive(Debug, Error)]
pub enum MergeError {
    /// There was nothing to concatenate.
    #[error("No source documents to merge")]
    NoSources,

    /// A source document (0-based `index`) is unreadable or malformed.
    #[error("Source document {} could not be merged: {source}", .index + 1)]
    Source {
        index: usize,
        #[source]
        source: PdfError,
    },
}

/// Footer injection failed on a page.
///
/// Never fatal: the merge orchestrator keeps the unnumbered document.
#[derive(Debug, Error)]
pub enum RenumberError {
    /// Compositing the footer onto a page failed.
    #[error("Footer overlay failed on page {page}: {detail}")]
    Overlay { page: usize, detail: String },

    /// The document's page tree could not be walked.
    #[error("Cannot enumerate pages for renumbering: {detail}")]
    Document { detail: String },

    /// The numbered document could not be persisted.
    #[error("Failed to save numbered PDF '{path}': {detail}")]
    Persist { path: PathBuf, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_display() {
        let e = Md2PdfError::PartialFailure {
            succeeded: 2,
            failed: 1,
            total: 3,
        };
        assert!(e.to_string().contains("1/3"), "got: {e}");
    }

    #[test]
    fn no_input_files_names_root() {
        let e = Md2PdfError::NoInputFiles {
            root: PathBuf::from("docs"),
        };
        assert!(e.to_string().contains("'docs'"));
    }

    #[test]
    fn task_error_roundtrips_through_json() {
        let e = TaskError::RenderFailed {
            path: PathBuf::from("a.md"),
            detail: "tab crashed".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: TaskError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn renumber_error_display() {
        let e = RenumberError::Overlay {
            page: 4,
            detail: "page is not a dictionary".into(),
        };
        assert!(e.to_string().contains("page 4"));
    }

    #[test]
    fn merge_error_reports_one_based_index() {
        let e = MergeError::Source {
            index: 1,
            source: PdfError::Load("bad xref".into()),
        };
        assert!(e.to_string().contains("Source document 2"), "got: {e}");
    }

    #[test]
    fn collaborator_unavailable_has_hint() {
        let e = Md2PdfError::CollaboratorUnavailable {
            detail: "no executable".into(),
        };
        assert!(e.to_string().contains("--chrome"));
    }
}
