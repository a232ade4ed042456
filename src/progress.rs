//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the batch converts each Markdown file and, optionally, merges
//! the results.
//!
//! Files are converted strictly one after another, so events arrive in
//! batch order: `on_file_start(i)` is always followed by exactly one of
//! `on_file_complete(i)` / `on_file_error(i)` before `on_file_start(i + 1)`.
//!
//! # Example
//!
//! ```rust
//! use edgequake_md2pdf::{BatchProgressCallback, ConversionConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, output: &Path) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} → {}", index + 1, total, output.display());
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch pipeline as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 0-based; `total` is the size of the
/// resolved file set.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the file set is resolved, before any conversion.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a file is read.
    fn on_file_start(&self, index: usize, total: usize, source: &Path) {
        let _ = (index, total, source);
    }

    /// Called when a file's PDF has been written.
    fn on_file_complete(&self, index: usize, total: usize, output: &Path) {
        let _ = (index, total, output);
    }

    /// Called when a file fails at any stage.
    ///
    /// `error` is the human-readable [`crate::error::TaskError`] message.
    fn on_file_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let _ = (total, succeeded);
    }

    /// Called before the successful outputs are merged.
    fn on_merge_start(&self, sources: usize) {
        let _ = sources;
    }

    /// Called when the merged PDF is on disk.
    ///
    /// `numbered` is false when footer renumbering failed and the
    /// unnumbered merge was kept instead.
    fn on_merge_complete(&self, output: &Path, pages: usize, numbered: bool) {
        let _ = (output, pages, numbered);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        succeeded: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total: usize) {
            self.started_total.store(total, Ordering::SeqCst);
        }

        fn on_file_start(&self, _index: usize, _total: usize, _source: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _total: usize, _output: &Path) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total: usize, succeeded: usize) {
            self.succeeded.store(succeeded, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_file_start(0, 2, Path::new("a.md"));
        cb.on_file_complete(0, 2, Path::new("a.pdf"));
        cb.on_file_error(1, 2, "render failed");
        cb.on_batch_complete(2, 1);
        cb.on_merge_start(1);
        cb.on_merge_complete(Path::new("all.pdf"), 3, false);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        tracker.on_file_start(0, 3, Path::new("a.md"));
        tracker.on_file_complete(0, 3, Path::new("a.pdf"));
        tracker.on_file_start(1, 3, Path::new("b.md"));
        tracker.on_file_error(1, 3, "render failed");
        tracker.on_file_start(2, 3, Path::new("c.md"));
        tracker.on_file_complete(2, 3, Path::new("c.pdf"));
        tracker.on_batch_complete(3, 2);

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(1);
        cb.on_file_complete(0, 1, Path::new("x.pdf"));
    }
}
