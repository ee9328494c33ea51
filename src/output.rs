//! Result types for scans and relocations.
//!
//! All types derive `Serialize` so the CLI can emit them as JSON.

use crate::error::{DocumentError, RelocationError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a scan found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutput {
    /// Workspace root the scan ran against.
    pub root: PathBuf,
    /// Images no document references, sorted.
    pub unused: Vec<PathBuf>,
    /// One entry per discovered document, sorted by path.
    pub documents: Vec<DocumentResult>,
    pub stats: ScanStats,
}

impl ScanOutput {
    /// Documents that could not be read.
    pub fn failed_documents(&self) -> impl Iterator<Item = &DocumentResult> {
        self.documents.iter().filter(|d| d.error.is_some())
    }
}

/// What one document contributed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    pub path: PathBuf,
    /// Image embeds found, network ones included.
    pub references: usize,
    /// Embeds that were not `http(s)://`.
    pub local_references: usize,
    /// References that proved an image used.
    pub matched: usize,
    /// Set when the document could not be read; all counts are then zero.
    pub error: Option<DocumentError>,
}

/// Scan-wide counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_images: usize,
    pub total_documents: usize,
    pub failed_documents: usize,
    pub total_references: usize,
    pub network_references: usize,
    pub unused_images: usize,
    pub duration_ms: u64,
}

/// Everything a relocation did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocationOutput {
    /// Absolute quarantine directory.
    pub quarantine_dir: PathBuf,
    /// One entry per unused image, sorted by source.
    pub moves: Vec<MoveResult>,
    pub stats: RelocationStats,
}

impl RelocationOutput {
    pub fn failures(&self) -> impl Iterator<Item = &MoveResult> {
        self.moves.iter().filter(|m| m.error.is_some())
    }
}

/// One attempted move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResult {
    pub source: PathBuf,
    /// Planned destination; absent when none could be computed.
    pub destination: Option<PathBuf>,
    pub error: Option<RelocationError>,
}

/// Relocation counters. `moved` counts only successful moves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelocationStats {
    pub total: usize,
    pub moved: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub duration_ms: u64,
}

/// A scan followed by a relocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutput {
    pub scan: ScanOutput,
    pub relocation: RelocationOutput,
}
