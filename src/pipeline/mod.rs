//! Per-file conversion stages.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ markdown ──▶ render
//! (file set)   (HTML doc)   (Chromium printToPDF)
//! ```
//!
//! 1. [`discover`] — resolve the ordered file set and each file's
//!    destination under the output root
//! 2. [`markdown`] — Markdown → HTML body, wrapped in the CSS + template
//! 3. [`render`]   — print the HTML to PDF bytes through the one browser
//!    session of the run; the only stage that talks to another process

pub mod discover;
pub mod markdown;
pub mod render;
