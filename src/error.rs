//! Error types for the edgequake-imgsweep library.
//!
//! Three error types reflect three failure modes:
//!
//! * [`SweepError`] — **Fatal**: the scan cannot proceed at all (no
//!   workspace root, discovery failed, bad configuration). Returned as
//!   `Err(SweepError)` from the top-level `scan*` / `sweep*` functions.
//!
//! * [`DocumentError`] — **Non-fatal**: a single Markdown document could not
//!   be read. It is stored in [`crate::output::DocumentResult`] and the
//!   document contributes no references, so the unused set can only grow.
//!
//! * [`RelocationError`] — **Non-fatal**: a single image could not be moved.
//!   Stored in [`crate::output::MoveResult`]; the other moves continue.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-imgsweep library.
#[derive(Debug, Error)]
pub enum SweepError {
    // ── Setup errors ──────────────────────────────────────────────────────
    /// The host has no workspace root to scan.
    #[error("No workspace root is configured")]
    NoWorkspaceRoot,

    /// The workspace root does not exist.
    #[error("Workspace root not found: '{path}'\nCheck the path exists and is readable.")]
    WorkspaceRootMissing { path: PathBuf },

    /// The workspace root exists but is a file.
    #[error("Workspace root '{path}' is not a directory")]
    WorkspaceRootNotADirectory { path: PathBuf },

    /// A glob pattern could not be compiled.
    #[error("Invalid glob pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    /// File discovery failed before any document was read.
    #[error("File discovery failed under '{root}': {detail}")]
    DiscoveryFailed { root: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write a JSON report.
    #[error("Failed to write report '{path}': {source}")]
    ReportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single Markdown document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The document could not be read from disk.
    #[error("{path}: read failed: {detail}")]
    ReadFailed { path: PathBuf, detail: String },

    /// The document is not valid UTF-8 text.
    #[error("{path}: not valid UTF-8 text")]
    NotUtf8 { path: PathBuf },
}

impl DocumentError {
    /// Classify an I/O error raised while reading `path`.
    pub fn from_io(path: PathBuf, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::InvalidData {
            DocumentError::NotUtf8 { path }
        } else {
            DocumentError::ReadFailed {
                path,
                detail: err.to_string(),
            }
        }
    }
}

/// A non-fatal error for a single image relocation.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum RelocationError {
    /// The image does not live under the workspace root, so it has no
    /// relative path to recreate inside the quarantine directory.
    #[error("{path}: outside the workspace root")]
    OutsideWorkspace { path: PathBuf },

    /// Something already exists at the destination.
    #[error("{destination}: destination already exists")]
    DestinationExists { destination: PathBuf },

    /// Creating the destination directory failed.
    #[error("{dir}: could not create directory: {detail}")]
    CreateDirFailed { dir: PathBuf, detail: String },

    /// The move itself failed.
    #[error("{image} → {destination}: move failed: {detail}")]
    MoveFailed {
        image: PathBuf,
        destination: PathBuf,
        detail: String,
    },
}
