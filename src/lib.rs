//! # edgequake-md2pdf
//!
//! Convert batches of Markdown documents into paginated PDFs, and optionally
//! merge them into one PDF with a single running page counter.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown files
//!  │
//!  ├─ 1. Discover  explicit selection or sorted recursive scan
//!  ├─ 2. HTML      pulldown-cmark + CSS + {{ }} template
//!  ├─ 3. Print     headless Chromium Page.printToPDF, one tab per file
//!  ├─ 4. Write     atomic per-file PDF under the output root
//!  └─ 5. Merge     concatenate successes, stamp "Page N of M" footers
//!                  (falls back to the unnumbered merge if stamping fails)
//! ```
//!
//! Files are converted one after another against a single browser session.
//! A file that fails is recorded in the [`RunReport`] and the batch moves on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_md2pdf::{convert_directory, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .merge_into("handbook")
//!         .footer_text("ACME Handbook")
//!         .build()?;
//!     let report = convert_directory("docs", "build/pdf", &config).await?;
//!     eprintln!("{}/{} converted", report.stats.succeeded, report.stats.total);
//!     if let Some(merge) = &report.merge {
//!         eprintln!("merged {} pages into {}", merge.page_count, merge.path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Post-processing only
//!
//! The [`pdf`] module works on any PDFs, with no browser involved:
//!
//! ```rust,no_run
//! use edgequake_md2pdf::{FooterRenumberer, FooterSpec, PdfDocument, PdfMerger};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let a = PdfDocument::load("a.pdf".as_ref())?;
//! let b = PdfDocument::load("b.pdf".as_ref())?;
//! let merged = PdfMerger::merge(vec![a, b])?;
//! let mut numbered = FooterRenumberer::renumber(merged, &FooterSpec::default())?;
//! std::fs::write("ab.pdf", numbered.to_bytes()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-md2pdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## Requirements
//!
//! A Chrome or Chromium install. It is found automatically in the usual
//! locations; otherwise set [`BrowserOptions::executable`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod pdf;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::BatchConverter;
pub use config::{
    BrowserOptions, ConversionConfig, ConversionConfigBuilder, FooterSpec, PageOptions, Preset,
    DEFAULT_CREDIT,
};
pub use convert::{convert_directory, convert_file, convert_files, convert_sync, convert_with};
pub use error::{MergeError, Md2PdfError, PdfError, RenderError, RenumberError, TaskError};
pub use orchestrator::{MergeOrchestrator, MergeState};
pub use output::{BatchStats, ConversionResult, ConversionTask, MergeOutcome, RunReport};
pub use pdf::{FooterRenumberer, PdfDocument, PdfMerger, PdfPage, PdfPageOverlay, StandardFont};
pub use pipeline::markdown::HtmlTemplate;
pub use pipeline::render::{ChromeRenderer, PdfRenderer};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
