//! Scan and sweep entry points.
//!
//! A **scan** discovers images and documents, eliminates every image some
//! document references, and reports the rest. It never modifies the
//! workspace. A **sweep** is a scan followed by
//! [`relocate`](crate::pipeline::relocate::relocate) on the unused set.

use crate::config::SweepConfig;
use crate::error::{DocumentError, SweepError};
use crate::output::{DocumentResult, ScanOutput, ScanStats, SweepOutput};
use crate::pipeline::extract::MarkdownDocument;
use crate::pipeline::normalize::{normalize_lexically, PathNormalizer};
use crate::pipeline::relocate::{self, quarantine_dir};
use crate::pipeline::resolve::{SharedWorkingSet, WorkingSet};
use crate::progress::ScanPhase;
use crate::workspace::{FsWorkspace, Workspace};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Find every image no Markdown document in `workspace` references.
///
/// # Errors
/// Returns `Err(SweepError)` only for fatal setup problems: no workspace
/// root, or discovery failed. A document that cannot be read is recorded in
/// its [`DocumentResult`] and the scan carries on without its references.
pub async fn scan<W: Workspace>(
    workspace: &W,
    config: &SweepConfig,
) -> Result<ScanOutput, SweepError> {
    let output = scan_inner(workspace, config).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_phase(ScanPhase::Done);
    }
    Ok(output)
}

/// Scan, then move the unused images into the quarantine directory.
pub async fn sweep<W: Workspace>(
    workspace: &W,
    config: &SweepConfig,
) -> Result<SweepOutput, SweepError> {
    let scan = scan_inner(workspace, config).await?;
    let relocation = relocate::relocate(workspace, &scan.unused, config).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_phase(ScanPhase::Done);
    }
    Ok(SweepOutput { scan, relocation })
}

/// [`scan`] a local directory.
pub async fn scan_dir(
    root: impl AsRef<Path>,
    config: &SweepConfig,
) -> Result<ScanOutput, SweepError> {
    let workspace = FsWorkspace::new(root)?;
    scan(&workspace, config).await
}

/// [`sweep`] a local directory.
pub async fn sweep_dir(
    root: impl AsRef<Path>,
    config: &SweepConfig,
) -> Result<SweepOutput, SweepError> {
    let workspace = FsWorkspace::new(root)?;
    sweep(&workspace, config).await
}

/// Synchronous wrapper around [`sweep_dir`].
///
/// Creates a temporary tokio runtime internally.
pub fn sweep_sync(root: impl AsRef<Path>, config: &SweepConfig) -> Result<SweepOutput, SweepError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SweepError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(sweep_dir(root, config))
}

/// Write any output type as pretty JSON.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_report<T: Serialize>(
    path: impl AsRef<Path>,
    report: &T,
) -> Result<(), SweepError> {
    let path = path.as_ref();
    let json = serde_json::to_vec_pretty(report)
        .map_err(|e| SweepError::Internal(format!("Failed to serialise report: {e}")))?;
    let write_failed = |source| SweepError::ReportWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn scan_inner<W: Workspace>(
    workspace: &W,
    config: &SweepConfig,
) -> Result<ScanOutput, SweepError> {
    let start = Instant::now();

    // ── Step 1: Workspace root ───────────────────────────────────────────
    let root = normalize_lexically(&workspace.root()?);
    let normalizer = PathNormalizer::new(&root, config.case_sensitivity);
    info!(
        "Scanning {} ({} comparison)",
        root.display(),
        if normalizer.is_case_insensitive() {
            "case-insensitive"
        } else {
            "case-sensitive"
        }
    );

    // ── Step 2: Discover images and documents ────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_phase(ScanPhase::Discovering);
    }
    let excludes = discovery_excludes(&root, config);
    let images = workspace.find_files(&config.image_glob(), &excludes).await?;
    let markdowns = workspace.find_files(&config.markdown_glob(), &excludes).await?;
    info!(
        "Found {} images and {} Markdown documents",
        images.len(),
        markdowns.len()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_discovery_complete(images.len(), markdowns.len());
    }

    // ── Step 3: Eliminate referenced images ──────────────────────────────
    let set = SharedWorkingSet::new(WorkingSet::new(&images, &normalizer));
    let total_images = images.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_phase(ScanPhase::Extracting);
    }
    let mut documents: Vec<DocumentResult> = stream::iter(markdowns.iter().map(|path| {
        let set = &set;
        let normalizer = &normalizer;
        async move { process_document(workspace, set, normalizer, path, config).await }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    // ── Step 4: Finalize ─────────────────────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_phase(ScanPhase::Finalizing);
    }
    documents.sort_by(|a, b| a.path.cmp(&b.path));
    let unused = set.into_inner().into_unused();

    let stats = ScanStats {
        total_images,
        total_documents: documents.len(),
        failed_documents: documents.iter().filter(|d| d.error.is_some()).count(),
        total_references: documents.iter().map(|d| d.references).sum(),
        network_references: documents
            .iter()
            .map(|d| d.references - d.local_references)
            .sum(),
        unused_images: unused.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    if unused.is_empty() {
        info!("No unused images found ({}ms)", stats.duration_ms);
    } else {
        info!(
            "{} of {} images unused ({}ms)",
            unused.len(),
            total_images,
            stats.duration_ms
        );
    }
    if stats.failed_documents > 0 {
        warn!(
            "{} documents could not be read; their references were not counted",
            stats.failed_documents
        );
    }
    if let Some(ref cb) = config.progress_callback {
        cb.on_scan_complete(total_images, unused.len());
    }

    Ok(ScanOutput {
        root,
        unused,
        documents,
        stats,
    })
}

/// Read one document and apply its references. Never fails the scan.
async fn process_document<W: Workspace>(
    workspace: &W,
    set: &SharedWorkingSet,
    normalizer: &PathNormalizer,
    path: &Path,
    config: &SweepConfig,
) -> DocumentResult {
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(path);
    }

    let text = match workspace.read_text(path).await {
        Ok(text) => text,
        Err(e) => {
            let error = DocumentError::from_io(path.to_path_buf(), &e);
            warn!("Skipping document: {}", error);
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_error(path, &error.to_string());
            }
            return DocumentResult {
                path: path.to_path_buf(),
                references: 0,
                local_references: 0,
                matched: 0,
                error: Some(error),
            };
        }
    };

    let doc = MarkdownDocument::new(path, text);
    let tally = set.apply(&doc, normalizer);
    debug!(
        "{}: {} references, {} matched",
        path.display(),
        tally.references,
        tally.matched
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_complete(path, tally.matched);
    }

    DocumentResult {
        path: doc.path,
        references: tally.references,
        local_references: tally.local(),
        matched: tally.matched,
        error: None,
    }
}

/// Configured excludes plus the quarantine directory when it sits under the root.
fn discovery_excludes(root: &Path, config: &SweepConfig) -> Vec<String> {
    let mut excludes = config.exclude.clone();
    let quarantine = quarantine_dir(root, config);
    if let Ok(relative) = quarantine.strip_prefix(root) {
        if !relative.as_os_str().is_empty() {
            let relative = relative.to_string_lossy().replace('\\', "/");
            excludes.push(format!("{}/**", globset::escape(&relative)));
        }
    }
    excludes
}
