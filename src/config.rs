//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. One struct holds the styling inputs
//! handed to the Markdown → HTML collaborator, the page geometry handed to
//! the browser, the footer drawn during renumbering, and the merge request.
//!
//! # Builder over constructor
//! Most callers only touch two or three knobs (`--css`, `--compact`,
//! `--merge`). The builder lets them set exactly those and rely on the
//! documented defaults for the rest.

use crate::error::Md2PdfError;
use crate::pdf::StandardFont;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Footer text used when no custom text is configured.
pub const DEFAULT_CREDIT: &str = "Generated by edgequake-md2pdf";

/// Configuration for a Markdown-to-PDF run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::{ConversionConfig, Preset};
///
/// let config = ConversionConfig::builder()
///     .preset(Preset::Business)
///     .compact(true)
///     .font_size(14)
///     .merge_into("handbook")
///     .build()
///     .unwrap();
/// assert!(config.merge_requested());
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Stylesheets concatenated into the HTML `<style>` block, in order.
    ///
    /// When empty, the preset's stylesheets are used; when those are missing
    /// too, a built-in stylesheet keeps the output readable.
    pub css_sources: Vec<PathBuf>,

    /// HTML template with `{{ css_content }}` and `{{ html_content }}`
    /// placeholders. Overrides the preset's template.
    pub template: Option<PathBuf>,

    /// Named CSS/template combination. Default: None.
    pub preset: Option<Preset>,

    /// Compact layout: 0.3in print margins instead of 0.5in. Default: false.
    pub compact: bool,

    /// Base font size in CSS pixels. Range: 8–72. Default: 16.
    pub font_size: u32,

    /// Paper geometry and print flags handed to the browser.
    pub page: PageOptions,

    /// Footer drawn on every page of the merged document.
    pub footer: FooterSpec,

    /// File name of the merged PDF, relative to the output root.
    ///
    /// `Some` requests a merge. A missing `.pdf` suffix is added.
    pub merge_name: Option<String>,

    /// Headless browser launch options.
    pub browser: BrowserOptions,

    /// Receives one event per file as the batch advances.
    pub progress_callback: Option<ProgressCallback>,

    /// Cooperative cancellation flag, observed between files only.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            css_sources: Vec::new(),
            template: None,
            preset: None,
            compact: false,
            font_size: 16,
            page: PageOptions::default(),
            footer: FooterSpec::default(),
            merge_name: None,
            browser: BrowserOptions::default(),
            progress_callback: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("css_sources", &self.css_sources)
            .field("template", &self.template)
            .field("preset", &self.preset)
            .field("compact", &self.compact)
            .field("font_size", &self.font_size)
            .field("page", &self.page)
            .field("footer", &self.footer)
            .field("merge_name", &self.merge_name)
            .field("browser", &self.browser)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// True when a merged PDF was requested.
    pub fn merge_requested(&self) -> bool {
        self.merge_name.is_some()
    }

    /// Stylesheets to load: explicit sources win over the preset's.
    pub fn effective_css_sources(&self) -> Vec<PathBuf> {
        if !self.css_sources.is_empty() {
            return self.css_sources.clone();
        }
        self.preset.unwrap_or_default().css_files()
    }

    /// Template to load: explicit template wins over the preset's.
    pub fn effective_template(&self) -> Option<PathBuf> {
        self.template
            .clone()
            .or_else(|| self.preset.and_then(|p| p.template_file()))
    }

    /// Print margin injected into the PDF stylesheet.
    pub fn print_margin(&self) -> &'static str {
        if self.compact {
            "0.3in"
        } else {
            "0.5in"
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn css(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.css_sources.push(path.into());
        self
    }

    pub fn css_sources<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.config.css_sources = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn template(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.template = Some(path.into());
        self
    }

    pub fn preset(mut self, preset: Preset) -> Self {
        self.config.preset = Some(preset);
        self
    }

    pub fn compact(mut self, v: bool) -> Self {
        self.config.compact = v;
        self
    }

    pub fn font_size(mut self, px: u32) -> Self {
        self.config.font_size = px.clamp(8, 72);
        self
    }

    pub fn page(mut self, page: PageOptions) -> Self {
        self.config.page = page;
        self
    }

    pub fn footer(mut self, footer: FooterSpec) -> Self {
        self.config.footer = footer;
        self
    }

    pub fn footer_text(mut self, text: impl Into<String>) -> Self {
        self.config.footer.text = text.into();
        self
    }

    pub fn merge_into(mut self, name: impl Into<String>) -> Self {
        self.config.merge_name = Some(name.into());
        self
    }

    pub fn browser(mut self, browser: BrowserOptions) -> Self {
        self.config.browser = browser;
        self
    }

    pub fn headless(mut self, v: bool) -> Self {
        self.config.browser.headless = v;
        self
    }

    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.browser.executable = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.config.cancel = Some(flag);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        let c = &self.config;
        if !(8..=72).contains(&c.font_size) {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Font size must be 8–72, got {}",
                c.font_size
            )));
        }
        if c.page.paper_width <= 0.0 || c.page.paper_height <= 0.0 {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Paper size must be positive, got {}x{} in",
                c.page.paper_width, c.page.paper_height
            )));
        }
        if c.footer.font_size <= 0.0 {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Footer font size must be positive, got {}",
                c.footer.font_size
            )));
        }
        if let Some(ref name) = c.merge_name {
            if name.trim().is_empty() {
                return Err(Md2PdfError::MergeNameRequired);
            }
        }
        Ok(self.config)
    }
}

// ── Plain-data sections ──────────────────────────────────────────────────

/// Named CSS/template combinations shipped with the tool.
///
/// | Preset | Stylesheets | Template |
/// |--------|-------------|----------|
/// | `Default`  | `css/simple.css`, `css/prism.css` | built-in |
/// | `Business` | `css/business.css` | `templates/business.html` |
/// | `Simple`   | `css/simple.css` | built-in |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Default,
    Business,
    Simple,
}

impl Preset {
    pub fn css_files(self) -> Vec<PathBuf> {
        match self {
            Preset::Default => vec![
                PathBuf::from("css/simple.css"),
                PathBuf::from("css/prism.css"),
            ],
            Preset::Business => vec![PathBuf::from("css/business.css")],
            Preset::Simple => vec![PathBuf::from("css/simple.css")],
        }
    }

    pub fn template_file(self) -> Option<PathBuf> {
        match self {
            Preset::Business => Some(PathBuf::from("templates/business.html")),
            Preset::Default | Preset::Simple => None,
        }
    }
}

/// Paper geometry and print flags for `Page.printToPDF`.
///
/// Dimensions are in inches, as the DevTools protocol expects. The defaults
/// give a tall 9 × 13.5 in page with narrow side margins, which suits code
/// listings and wide tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageOptions {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub landscape: bool,
    pub print_background: bool,
    /// Let an `@page` rule in the stylesheet override the paper size.
    pub prefer_css_page_size: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            paper_width: 9.0,
            paper_height: 13.5,
            margin_top: 0.4,
            margin_bottom: 0.4,
            margin_left: 0.2,
            margin_right: 0.2,
            landscape: false,
            print_background: true,
            prefer_css_page_size: true,
        }
    }
}

/// The footer line drawn on every page during renumbering.
///
/// Each page receives `"{text} - Page {n} of {total}"`, centred
/// horizontally, with its baseline just below `bottom_margin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterSpec {
    pub text: String,
    pub font: StandardFont,
    /// Font size in points.
    pub font_size: f32,
    /// Distance in points from the bottom edge of the page.
    pub bottom_margin: f32,
    /// Number given to the first page.
    pub start_page: usize,
}

impl Default for FooterSpec {
    fn default() -> Self {
        Self {
            text: DEFAULT_CREDIT.to_string(),
            font: StandardFont::Helvetica,
            font_size: 9.0,
            bottom_margin: 30.0,
            start_page: 1,
        }
    }
}

impl FooterSpec {
    /// The footer line for a page, given its global number.
    pub fn line(&self, page_number: usize, total: usize) -> String {
        format!("{} - Page {} of {}", self.text, page_number, total)
    }
}

/// Headless browser launch options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserOptions {
    /// Launch without a visible window. Default: true.
    pub headless: bool,
    /// Explicit chrome/chromium binary. If None, chromiumoxide searches the
    /// usual install locations.
    pub executable: Option<PathBuf>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_css_wins_over_preset() {
        let config = ConversionConfig::builder()
            .preset(Preset::Business)
            .css("mine.css")
            .build()
            .unwrap();
        assert_eq!(config.effective_css_sources(), vec![PathBuf::from("mine.css")]);
        // The preset still supplies the template.
        assert_eq!(
            config.effective_template(),
            Some(PathBuf::from("templates/business.html"))
        );
    }

    #[test]
    fn no_preset_means_default_stylesheets() {
        let config = ConversionConfig::default();
        assert_eq!(config.effective_css_sources(), Preset::Default.css_files());
        assert_eq!(config.effective_template(), None);
    }

    #[test]
    fn font_size_is_clamped() {
        let config = ConversionConfig::builder().font_size(200).build().unwrap();
        assert_eq!(config.font_size, 72);
    }

    #[test]
    fn blank_merge_name_is_rejected() {
        let err = ConversionConfig::builder().merge_into("  ").build().unwrap_err();
        assert!(matches!(err, Md2PdfError::MergeNameRequired));
    }

    #[test]
    fn compact_shrinks_margin() {
        let config = ConversionConfig::builder().compact(true).build().unwrap();
        assert_eq!(config.print_margin(), "0.3in");
        assert_eq!(ConversionConfig::default().print_margin(), "0.5in");
    }

    #[test]
    fn footer_line_format() {
        let footer = FooterSpec {
            text: "Handbook".into(),
            ..FooterSpec::default()
        };
        assert_eq!(footer.line(3, 10), "Handbook - Page 3 of 10");
    }

    #[test]
    fn preset_serde_is_lowercase() {
        let json = serde_json::to_string(&Preset::Business).unwrap();
        assert_eq!(json, "\"business\"");
    }
}
