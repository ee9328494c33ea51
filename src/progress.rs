//! Progress-callback trait for scan and relocation events.
//!
//! Inject an [`Arc<dyn SweepProgressCallback>`] via
//! [`crate::config::SweepConfigBuilder::progress_callback`] to receive
//! events as the sweep moves through its phases. Events are informational
//! only; nothing a callback does can change the result of a scan.
//!
//! # Example
//!
//! ```rust
//! use edgequake_imgsweep::{SweepConfig, SweepProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     documents: AtomicUsize,
//! }
//!
//! impl SweepProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, path: &Path, matched: usize) {
//!         let done = self.documents.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("#{done} {} ({matched} images used)", path.display());
//!     }
//! }
//!
//! let config = SweepConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { documents: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The linear states a sweep passes through.
///
/// `Idle → Discovering → Extracting → Finalizing → Relocating → Done`.
/// `Relocating` is skipped by a scan-only run.
///
/// `Idle` is the state before a run starts and is never reported through
/// [`SweepProgressCallback::on_phase`]; the first phase a callback sees is
/// `Discovering`. `Extracting` also covers normalization and elimination:
/// each reference is normalized and removed from the working set as soon as
/// it is extracted, so those steps have no phase of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanPhase {
    Idle,
    Discovering,
    Extracting,
    Finalizing,
    Relocating,
    Done,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanPhase::Idle => "idle",
            ScanPhase::Discovering => "discovering",
            ScanPhase::Extracting => "extracting",
            ScanPhase::Finalizing => "finalizing",
            ScanPhase::Relocating => "relocating",
            ScanPhase::Done => "done",
        };
        f.write_str(s)
    }
}

/// Called by the sweep as it processes documents and moves images.
///
/// Implementations must be `Send + Sync`: documents are processed
/// concurrently, so `on_document_*` and `on_image_*` may be called from
/// different tasks at once. All methods default to no-ops.
pub trait SweepProgressCallback: Send + Sync {
    /// Called on every phase transition.
    fn on_phase(&self, phase: ScanPhase) {
        let _ = phase;
    }

    /// Called once discovery has enumerated both file sets.
    fn on_discovery_complete(&self, images: usize, documents: usize) {
        let _ = (images, documents);
    }

    /// Called before a document is read.
    fn on_document_start(&self, path: &Path) {
        let _ = path;
    }

    /// Called after a document's references were applied to the working set.
    ///
    /// `matched` counts references that removed an image from the set.
    fn on_document_complete(&self, path: &Path, matched: usize) {
        let _ = (path, matched);
    }

    /// Called when a document could not be read; the scan continues.
    fn on_document_error(&self, path: &Path, error: &str) {
        let _ = (path, error);
    }

    /// Called once every document has been attempted.
    fn on_scan_complete(&self, total_images: usize, unused: usize) {
        let _ = (total_images, unused);
    }

    /// Called before the first move.
    fn on_relocation_start(&self, total: usize) {
        let _ = total;
    }

    /// Called after an image was moved (or planned, in a dry run).
    fn on_image_moved(&self, source: &Path, destination: &Path) {
        let _ = (source, destination);
    }

    /// Called when one image could not be moved; other moves continue.
    fn on_image_error(&self, source: &Path, error: &str) {
        let _ = (source, error);
    }

    /// Called once after all moves were attempted.
    fn on_relocation_complete(&self, total: usize, moved: usize) {
        let _ = (total, moved);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SweepProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SweepConfig`].
pub type ProgressCallback = Arc<dyn SweepProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        phases: Mutex<Vec<ScanPhase>>,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl SweepProgressCallback for TrackingCallback {
        fn on_phase(&self, phase: ScanPhase) {
            self.phases.lock().unwrap().push(phase);
        }

        fn on_document_complete(&self, _path: &Path, _matched: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, _path: &Path, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_phase(ScanPhase::Discovering);
        cb.on_discovery_complete(3, 1);
        cb.on_document_start(Path::new("a.md"));
        cb.on_document_complete(Path::new("a.md"), 2);
        cb.on_document_error(Path::new("b.md"), "boom");
        cb.on_scan_complete(3, 1);
        cb.on_relocation_start(1);
        cb.on_image_moved(Path::new("c.png"), Path::new("q/c.png"));
        cb.on_image_error(Path::new("d.png"), "busy");
        cb.on_relocation_complete(1, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_phase(ScanPhase::Discovering);
        tracker.on_phase(ScanPhase::Extracting);
        tracker.on_document_complete(Path::new("a.md"), 1);
        tracker.on_document_complete(Path::new("b.md"), 0);
        tracker.on_document_error(Path::new("c.md"), "unreadable");

        assert_eq!(
            *tracker.phases.lock().unwrap(),
            vec![ScanPhase::Discovering, ScanPhase::Extracting]
        );
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn phase_display() {
        assert_eq!(ScanPhase::Relocating.to_string(), "relocating");
    }
}
