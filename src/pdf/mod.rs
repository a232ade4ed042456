//! PDF post-processing: concatenation and footer numbering.
//!
//! ```text
//! Vec<PdfDocument> ──PdfMerger::merge──▶ PdfDocument
//!                                          │
//!                  FooterRenumberer::renumber (PdfPageOverlay per page)
//!                                          ▼
//!                                     PdfDocument
//! ```
//!
//! All object-graph work goes through `lopdf`; nothing here tokenises or
//! renders PDF content itself.

mod dests;
pub mod document;
pub mod fonts;
pub mod merge;
pub mod overlay;
pub mod renumber;

pub use document::{MediaBox, PdfDocument, PdfPage};
pub use fonts::StandardFont;
pub use merge::PdfMerger;
pub use overlay::{PdfPageOverlay, OVERLAY_FONT_RESOURCE};
pub use renumber::{FooterRenumberer, FOOTER_BASELINE_OFFSET};
