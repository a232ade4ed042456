//! CLI binary for edgequake-md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_md2pdf::{
    convert_directory, convert_file, BatchProgressCallback, ConversionConfig, Md2PdfError, Preset,
    ProgressCallback, RunReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar at the bottom of the terminal and
/// one log line per converted file above it.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the file currently being converted.
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    /// Spinner-only until `on_batch_start` reports the file count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Starting browser…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.activate_bar(total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total} Markdown files…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, source: &Path) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(source.display().to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, output: &Path) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index + 1,
            total,
            output.display(),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, error: &str) {
        // Keep long error messages to one terminal line.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let failed = total.saturating_sub(succeeded);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&succeeded.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }

    fn on_merge_start(&self, sources: usize) {
        eprintln!("{} Merging {sources} PDFs…", cyan("◆"));
    }

    fn on_merge_complete(&self, output: &Path, pages: usize, numbered: bool) {
        let note = if numbered {
            dim("page numbers applied")
        } else {
            red("without page numbers")
        };
        eprintln!(
            "{} {} pages  →  {}  {}",
            green("✔"),
            pages,
            bold(&output.display().to_string()),
            note
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Single file, PDF beside the input
  md2pdf README.md

  # Single file to an explicit path
  md2pdf notes.md build/notes.pdf

  # Every Markdown file under docs/, mirrored into build/pdf/
  md2pdf -d docs build/pdf

  # Merge the whole directory into one numbered PDF
  md2pdf -d docs build/pdf -m -n handbook --footer-text "ACME Handbook"

  # Business preset with a smaller base font
  md2pdf -d docs --preset business --font-size 12 --compact

  # JSON run report
  md2pdf -d docs build/pdf --json > report.json

PRESETS:
  default    css/simple.css + css/prism.css, built-in template
  business   css/business.css + templates/business.html
  simple     css/simple.css, built-in template

  Stylesheet and template paths are resolved against the working directory.
  Missing files fall back to the built-in stylesheet and template.

ENVIRONMENT VARIABLES:
  MD2PDF_CHROME           Path to a Chrome/Chromium executable
  MD2PDF_FOOTER_TEXT      Credit shown in merged-PDF footers
  RUST_LOG                Overrides the log filter (e.g. edgequake_md2pdf=debug)

  Press Ctrl-C to stop after the current file; remaining files are reported
  as cancelled and no merge is performed. Press it again to exit at once
  (status 130).
"#;

/// Convert Markdown files to PDF through headless Chromium.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert Markdown files to PDF, optionally merged with page numbers",
    long_about = "Convert a Markdown file, or every Markdown file under a directory, into \
paginated PDFs printed by headless Chrome/Chromium. With --merge the successful outputs are \
combined into one PDF whose pages carry a \"<credit> - Page N of M\" footer.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file, or a directory with -d.
    input: PathBuf,

    /// Output PDF (file mode) or output directory (directory mode).
    output: Option<PathBuf>,

    /// Convert every Markdown file under INPUT.
    #[arg(short, long)]
    directory: bool,

    /// Stylesheets applied in order (e.g. --css simple.css prism.css).
    #[arg(long, num_args = 1.., value_name = "FILE")]
    css: Vec<PathBuf>,

    /// Predefined stylesheet and template combination.
    #[arg(long, env = "MD2PDF_PRESET", value_enum)]
    preset: Option<PresetArg>,

    /// HTML template with {{ css_content }} and {{ html_content }} placeholders.
    #[arg(long, env = "MD2PDF_TEMPLATE", value_name = "FILE")]
    template: Option<PathBuf>,

    /// Tighter layout: narrower margins and denser typography.
    #[arg(long, env = "MD2PDF_COMPACT")]
    compact: bool,

    /// Base font size in pixels (8–72).
    #[arg(long, env = "MD2PDF_FONT_SIZE", default_value_t = 16,
          value_parser = clap::value_parser!(u32).range(8..=72))]
    font_size: u32,

    /// Merge all generated PDFs into one numbered PDF (requires --name).
    #[arg(short, long)]
    merge: bool,

    /// File name of the merged PDF (".pdf" is added).
    #[arg(short, long)]
    name: Option<String>,

    /// Credit text in the merged PDF's footer.
    #[arg(long, env = "MD2PDF_FOOTER_TEXT")]
    footer_text: Option<String>,

    /// Show the browser window instead of running headless.
    #[arg(long)]
    no_headless: bool,

    /// Chrome/Chromium executable to launch.
    #[arg(long, env = "MD2PDF_CHROME", value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// Output the run report as JSON on stdout.
    #[arg(long, env = "MD2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "MD2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PresetArg {
    Default,
    Business,
    Simple,
}

impl From<PresetArg> for Preset {
    fn from(v: PresetArg) -> Self {
        match v {
            PresetArg::Default => Preset::Default,
            PresetArg::Business => Preset::Business,
            PresetArg::Simple => Preset::Simple,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.quiet || show_progress {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = if cli.verbose { "debug" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.merge && cli.name.is_none() {
        anyhow::bail!(Md2PdfError::MergeNameRequired);
    }
    if !cli.input.exists() {
        anyhow::bail!(Md2PdfError::InputNotFound {
            path: cli.input.clone()
        });
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if note_interrupt(&cancel) {
                    eprintln!("{}", red("Interrupted again, exiting"));
                    std::process::exit(130);
                }
                eprintln!(
                    "{}",
                    dim("Stopping after the current file (Ctrl-C again to exit now)")
                );
            }
        });
    }

    let config = build_config(&cli, progress_cb, cancel)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let report = if cli.directory {
        let output_dir = cli.output.clone().unwrap_or_else(|| cli.input.clone());
        convert_directory(&cli.input, &output_dir, &config)
            .await
            .context("Conversion failed")?
    } else {
        convert_file(&cli.input, cli.output.as_deref(), &config)
            .await
            .context("Conversion failed")?
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report, show_progress);
    }

    report.into_result()?;
    Ok(())
}

/// Record an interrupt. True when one was already pending.
fn note_interrupt(cancel: &AtomicBool) -> bool {
    cancel.swap(true, Ordering::SeqCst)
}

/// Inline summary; the progress callback already printed the per-file log.
fn print_summary(report: &RunReport, show_progress: bool) {
    let stats = &report.stats;
    if !show_progress {
        eprintln!(
            "Converted {}/{} files in {}ms",
            stats.succeeded, stats.total, stats.duration_ms
        );
        for failure in report.failures() {
            if let Some(ref e) = failure.error {
                eprintln!("  {} {e}", red("✗"));
            }
        }
        if let Some(ref merge) = report.merge {
            eprintln!(
                "Merged {} PDFs ({} pages) into {}{}",
                merge.sources,
                merge.page_count,
                merge.path.display(),
                if merge.numbered {
                    ""
                } else {
                    " without page numbers"
                }
            );
        }
    } else {
        eprintln!("   {}", dim(&format!("{}ms total", stats.duration_ms)));
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    cancel: Arc<AtomicBool>,
) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .css_sources(cli.css.iter().cloned())
        .compact(cli.compact)
        .font_size(cli.font_size)
        .headless(!cli.no_headless)
        .cancel_flag(cancel);

    if let Some(preset) = cli.preset {
        builder = builder.preset(preset.into());
    }
    if let Some(ref template) = cli.template {
        builder = builder.template(template);
    }
    if let Some(ref chrome) = cli.chrome {
        builder = builder.chrome_executable(chrome);
    }
    if let Some(ref text) = cli.footer_text {
        builder = builder.footer_text(text);
    }
    if cli.merge {
        if let Some(ref name) = cli.name {
            builder = builder.merge_into(name);
        }
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
