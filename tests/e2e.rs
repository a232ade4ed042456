//! End-to-end integration tests for edgequake-md2pdf.
//!
//! These tests launch a real Chrome/Chromium and print actual PDFs. They are
//! gated behind the `E2E_ENABLED` environment variable so they do not run in
//! CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! Point at a specific browser with `MD2PDF_CHROME=/path/to/chrome`.

use edgequake_md2pdf::{
    convert_directory, convert_file, convert_files, ChromeRenderer, ConversionConfig,
    ConversionConfigBuilder, PageOptions, PdfDocument, PdfRenderer, Preset, TaskError,
};
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

fn builder() -> ConversionConfigBuilder {
    let builder = ConversionConfig::builder();
    match std::env::var_os("MD2PDF_CHROME") {
        Some(exe) => builder.chrome_executable(PathBuf::from(exe)),
        None => builder,
    }
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, body).unwrap();
    path
}

/// Assert `path` is a loadable PDF with at least one page.
fn assert_valid_pdf(path: &Path, context: &str) -> PdfDocument {
    let bytes = std::fs::read(path)
        .unwrap_or_else(|e| panic!("[{context}] {} unreadable: {e}", path.display()));
    assert!(
        bytes.starts_with(b"%PDF-"),
        "[{context}] Output must start with the PDF header"
    );
    let doc = PdfDocument::load_mem(&bytes).expect("PDF should parse");
    assert!(doc.page_count() >= 1, "[{context}] PDF has no pages");
    println!(
        "[{context}] ✓  {} bytes, {} pages",
        bytes.len(),
        doc.page_count()
    );
    doc
}

const SAMPLE: &str = r#"# Release Notes

Some **bold** text, a [link](https://example.com) and `inline code`.

| Feature | Status |
|---------|--------|
| Tables  | ✓      |
| Lists   | ✓      |

```rust
fn main() {
    println!("hello");
}
```

- [x] task one
- [ ] task two
"#;

// ── Renderer tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_renderer_prints_html() {
    e2e_skip_unless_enabled!();

    let config = builder().build().expect("valid config");
    let renderer = ChromeRenderer::launch(&config.browser)
        .await
        .expect("browser should start");

    let pdf = renderer
        .render("<h1>Hello</h1>", None, &PageOptions::default())
        .await
        .expect("render should succeed");
    renderer.close().await;

    assert!(pdf.starts_with(b"%PDF-"));
    let doc = PdfDocument::load_mem(&pdf).expect("PDF should parse");
    let page = doc.pages().unwrap()[0];
    // 9 × 13.5 in at 72 pt/in.
    assert!((page.media_box.width() - 648.0).abs() < 1.0);
    assert!((page.media_box.height() - 972.0).abs() < 1.0);
}

// ── Conversion tests ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_single_file_beside_input() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "notes.md", SAMPLE);

    let config = builder().preset(Preset::Simple).build().expect("valid config");
    let report = convert_file(&input, None, &config)
        .await
        .expect("conversion should succeed");

    assert!(report.all_succeeded());
    assert!(report.merge.is_none());
    assert_valid_pdf(&dir.path().join("notes.pdf"), "single_file");
}

#[tokio::test]
async fn test_convert_directory_and_merge() {
    e2e_skip_unless_enabled!();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(input.path(), "01-intro.md", "# Intro\n\nWelcome.");
    write(input.path(), "02-guide/usage.md", SAMPLE);
    write(input.path(), "03-appendix.md", "# Appendix\n\nThe end.");

    let config = builder()
        .compact(true)
        .font_size(12)
        .merge_into("handbook")
        .footer_text("E2E Handbook")
        .build()
        .expect("valid config");
    let report = convert_directory(input.path(), output.path(), &config)
        .await
        .expect("conversion should succeed");

    assert_eq!(report.stats.total, 3);
    assert!(report.all_succeeded());
    assert_valid_pdf(&output.path().join("02-guide/usage.pdf"), "nested");

    let merge = report.merge.expect("merge requested");
    assert!(merge.numbered, "footer numbering should succeed on Chromium output");
    assert_eq!(merge.sources, 3);
    let merged = assert_valid_pdf(&merge.path, "merged");
    assert_eq!(merged.page_count(), merge.page_count);
    assert!(!output.path().join("handbook.temp.pdf").exists());
}

#[tokio::test]
async fn test_unreadable_file_does_not_stop_batch() {
    e2e_skip_unless_enabled!();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(input.path(), "ok.md", "# Fine");
    // Not valid UTF-8, so reading it as Markdown fails.
    std::fs::write(input.path().join("binary.md"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

    let config = builder().build().expect("valid config");
    let selection = vec![PathBuf::from("binary.md"), PathBuf::from("ok.md")];
    let report = convert_files(&selection, input.path(), output.path(), &config)
        .await
        .expect("run should complete");

    assert!(!report.results[0].succeeded);
    assert!(matches!(
        report.results[0].error,
        Some(TaskError::ReadFailed { .. })
    ));
    assert!(report.results[1].succeeded);
    assert_valid_pdf(&output.path().join("ok.pdf"), "survivor");
}
