//! HTML → PDF printing through a headless Chromium session.
//!
//! One [`ChromeRenderer`] is launched per run and reused for every file.
//! Each render stages the HTML in a temporary file, opens a fresh tab on it
//! and calls `Page.printToPDF`; the tab and the temp file are released
//! before `render` returns, whether it succeeded or not.
//!
//! The HTML is staged next to the Markdown source when possible so relative
//! image and stylesheet references resolve exactly as they do in an editor
//! preview.

use crate::config::{BrowserOptions, PageOptions};
use crate::error::{Md2PdfError, RenderError};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::future::Future;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Turns one HTML document into PDF bytes.
///
/// The batch holds exactly one renderer and calls it sequentially, so
/// implementations need not support concurrent calls.
pub trait PdfRenderer: Send + Sync {
    /// `source_dir` is the directory of the Markdown file, used to resolve
    /// relative assets.
    fn render(
        &self,
        html: &str,
        source_dir: Option<&Path>,
        options: &PageOptions,
    ) -> impl Future<Output = Result<Vec<u8>, RenderError>> + Send;
}

/// A running Chromium process plus its CDP event loop.
pub struct ChromeRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromeRenderer {
    /// Start the browser. Failure here is fatal for the run.
    pub async fn launch(options: &BrowserOptions) -> Result<Self, Md2PdfError> {
        let mut builder = BrowserConfig::builder();
        builder = if options.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        if let Some(ref exe) = options.executable {
            builder = builder.chrome_executable(exe);
        }
        let config = builder
            .args(vec![
                "--disable-gpu",
                "--no-sandbox",
                "--disable-dev-shm-usage",
            ])
            .build()
            .map_err(|detail| Md2PdfError::CollaboratorUnavailable { detail })?;

        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| Md2PdfError::CollaboratorUnavailable {
                    detail: e.to_string(),
                })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser event loop stopped: {e}");
                    break;
                }
            }
        });

        info!("Browser session started (headless: {})", options.headless);
        Ok(Self { browser, handler })
    }

    /// Shut the browser down and wait for the process to exit.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser did not close cleanly: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Waiting for browser exit failed: {e}");
        }
        self.handler.abort();
        info!("Browser session closed");
    }
}

impl PdfRenderer for ChromeRenderer {
    async fn render(
        &self,
        html: &str,
        source_dir: Option<&Path>,
        options: &PageOptions,
    ) -> Result<Vec<u8>, RenderError> {
        let staged = stage_html(html, source_dir).map_err(RenderError::Staging)?;
        let url = file_url(staged.path());
        debug!("Printing {url}");

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Browser(format!("cannot open tab: {e}")))?;

        let printed = match page.goto(url.as_str()).await {
            Ok(_) => page
                .pdf(print_params(options))
                .await
                .map_err(|e| RenderError::Browser(format!("printToPDF failed: {e}"))),
            Err(e) => Err(RenderError::Browser(format!("cannot load page: {e}"))),
        };

        if let Err(e) = page.close().await {
            warn!("Failed to close tab: {e}");
        }
        // `staged` is deleted here.
        printed
    }
}

fn print_params(options: &PageOptions) -> PrintToPdfParams {
    PrintToPdfParams {
        landscape: Some(options.landscape),
        display_header_footer: Some(false),
        print_background: Some(options.print_background),
        prefer_css_page_size: Some(options.prefer_css_page_size),
        paper_width: Some(options.paper_width),
        paper_height: Some(options.paper_height),
        margin_top: Some(options.margin_top),
        margin_bottom: Some(options.margin_bottom),
        margin_left: Some(options.margin_left),
        margin_right: Some(options.margin_right),
        ..Default::default()
    }
}

/// Write `html` to a temp file in `source_dir` if it exists, else in the
/// system temp directory.
fn stage_html(html: &str, source_dir: Option<&Path>) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".md2pdf-").suffix(".html");
    let mut file = match source_dir.filter(|d| d.is_dir()) {
        Some(dir) => builder
            .tempfile_in(dir)
            .or_else(|_| builder.tempfile())?,
        None => builder.tempfile()?,
    };
    file.write_all(html.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// `file://` URL for an absolute or relative path, percent-encoding
/// everything except unreserved characters and `/`.
pub fn file_url(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let raw = absolute.to_string_lossy().replace('\\', "/");
    let mut url = String::from("file://");
    if !raw.starts_with('/') {
        url.push('/');
    }
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' | b':' => {
                url.push(b as char)
            }
            _ => url.push_str(&format!("%{b:02X}")),
        }
    }
    url
}
