//! # edgequake-imgsweep
//!
//! Find images that no Markdown document references and move them into a
//! quarantine directory.
//!
//! Documentation trees accumulate screenshots nobody links to any more. This
//! crate scans a project for image files and Markdown documents, works out
//! which images are never embedded, and relocates those into a quarantine
//! directory (`unused-images/` by default) while keeping their relative
//! paths, so any mistake is undone by moving the file back.
//!
//! ## Pipeline Overview
//!
//! ```text
//! workspace
//!  │
//!  ├─ 1. Discover  **/*.{png,jpg,…} and **/*.md (walkdir + globset)
//!  ├─ 2. Extract   ![alt](path), ![alt](<path>), optional "title"
//!  ├─ 3. Normalize resolve against document dir or workspace root
//!  ├─ 4. Resolve   eliminate referenced images from a shared working set
//!  └─ 5. Relocate  move the survivors into the quarantine directory
//! ```
//!
//! Documents are processed concurrently; removals from the working set are
//! serialised behind one lock. A document that cannot be read is skipped
//! and reported, which can only make more images look unused, never fewer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_imgsweep::{scan_dir, SweepConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SweepConfig::default();
//!     let output = scan_dir("./docs", &config).await?;
//!     for image in &output.unused {
//!         println!("{}", image.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For host-free use, [`resolve_unused`] works on in-memory paths and text:
//!
//! ```rust
//! use edgequake_imgsweep::{resolve_unused, CaseSensitivity, MarkdownDocument, PathNormalizer};
//! use std::path::PathBuf;
//!
//! let normalizer = PathNormalizer::new("/proj", CaseSensitivity::Sensitive);
//! let images = [PathBuf::from("/proj/a.png"), PathBuf::from("/proj/b.png")];
//! let docs = [MarkdownDocument::new("/proj/readme.md", "![logo](a.png)")];
//! # #[cfg(unix)]
//! assert_eq!(resolve_unused(&images, &docs, &normalizer), vec![PathBuf::from("/proj/b.png")]);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Builds the `imgsweep` binary (clap, indicatif, tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scan;
pub mod workspace;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CaseSensitivity, SweepConfig, SweepConfigBuilder};
pub use error::{DocumentError, RelocationError, SweepError};
pub use output::{
    DocumentResult, MoveResult, RelocationOutput, RelocationStats, ScanOutput, ScanStats,
    SweepOutput,
};
pub use pipeline::extract::{extract_paths, ImageReference, MarkdownDocument};
pub use pipeline::normalize::PathNormalizer;
pub use pipeline::relocate::relocate;
pub use pipeline::resolve::{resolve_unused, WorkingSet};
pub use progress::{NoopProgressCallback, ProgressCallback, ScanPhase, SweepProgressCallback};
pub use scan::{scan, scan_dir, sweep, sweep_dir, sweep_sync, write_report};
pub use workspace::{FsWorkspace, Workspace};
