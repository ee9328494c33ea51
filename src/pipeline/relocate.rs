//! Relocation: move unused images into the quarantine directory.
//!
//! Each image keeps its path relative to the workspace root, so
//! `docs/img/old.png` ends up at `<quarantine>/docs/img/old.png` and can be
//! restored by moving it back. Moves run with the same bounded concurrency
//! as document processing; one failed move never stops the others.

use crate::config::SweepConfig;
use crate::error::{RelocationError, SweepError};
use crate::output::{MoveResult, RelocationOutput, RelocationStats};
use crate::pipeline::normalize::normalize_lexically;
use crate::progress::ScanPhase;
use crate::workspace::Workspace;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Absolute quarantine directory for `root`.
pub fn quarantine_dir(root: &Path, config: &SweepConfig) -> PathBuf {
    normalize_lexically(&root.join(&config.quarantine_dir))
}

/// Where `image` lands inside `quarantine`.
pub fn destination_for(
    root: &Path,
    quarantine: &Path,
    image: &Path,
) -> Result<PathBuf, RelocationError> {
    let image = normalize_lexically(&root.join(image));
    let relative = image
        .strip_prefix(root)
        .map_err(|_| RelocationError::OutsideWorkspace {
            path: image.clone(),
        })?;
    if relative.as_os_str().is_empty() {
        return Err(RelocationError::OutsideWorkspace { path: image });
    }
    Ok(quarantine.join(relative))
}

/// Move every path in `unused` into the quarantine directory.
///
/// # Errors
/// Returns `Err(SweepError)` only when the workspace has no root. Per-image
/// failures are recorded in the returned [`MoveResult`]s.
pub async fn relocate<W: Workspace>(
    workspace: &W,
    unused: &[PathBuf],
    config: &SweepConfig,
) -> Result<RelocationOutput, SweepError> {
    let start = Instant::now();
    let root = normalize_lexically(&workspace.root()?);
    let quarantine = quarantine_dir(&root, config);
    let total = unused.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_phase(ScanPhase::Relocating);
        cb.on_relocation_start(total);
    }
    info!(
        "{} {} unused images into {}",
        if config.dry_run { "Planning" } else { "Moving" },
        total,
        quarantine.display()
    );

    let moved = AtomicUsize::new(0);
    let mut moves: Vec<MoveResult> = stream::iter(unused.iter().map(|image| {
        let root = &root;
        let quarantine = &quarantine;
        let moved = &moved;
        async move {
            let result = move_one(workspace, root, quarantine, image, config.dry_run).await;
            if let Some(ref cb) = config.progress_callback {
                match (&result.destination, &result.error) {
                    (Some(dst), None) => cb.on_image_moved(image, dst),
                    (_, Some(e)) => cb.on_image_error(image, &e.to_string()),
                    (None, None) => {}
                }
            }
            match &result.error {
                None => {
                    moved.fetch_add(1, Ordering::SeqCst);
                }
                Some(e) => warn!("{}", e),
            }
            result
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    moves.sort_by(|a, b| a.source.cmp(&b.source));
    let moved = moved.into_inner();

    let stats = RelocationStats {
        total,
        moved,
        failed: total - moved,
        dry_run: config.dry_run,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!("Relocated {}/{} images in {}ms", moved, total, stats.duration_ms);
    if let Some(ref cb) = config.progress_callback {
        cb.on_relocation_complete(total, moved);
    }

    Ok(RelocationOutput {
        quarantine_dir: quarantine,
        moves,
        stats,
    })
}

async fn move_one<W: Workspace>(
    workspace: &W,
    root: &Path,
    quarantine: &Path,
    image: &Path,
    dry_run: bool,
) -> MoveResult {
    let destination = match destination_for(root, quarantine, image) {
        Ok(d) => d,
        Err(e) => {
            return MoveResult {
                source: image.to_path_buf(),
                destination: None,
                error: Some(e),
            }
        }
    };

    let error = if dry_run {
        debug!("Would move {} → {}", image.display(), destination.display());
        None
    } else {
        try_move(workspace, image, &destination).await.err()
    };

    MoveResult {
        source: image.to_path_buf(),
        destination: Some(destination),
        error,
    }
}

async fn try_move<W: Workspace>(
    workspace: &W,
    image: &Path,
    destination: &Path,
) -> Result<(), RelocationError> {
    if workspace.exists(destination).await {
        return Err(RelocationError::DestinationExists {
            destination: destination.to_path_buf(),
        });
    }
    if let Some(dir) = destination.parent() {
        workspace
            .ensure_dir(dir)
            .await
            .map_err(|e| RelocationError::CreateDirFailed {
                dir: dir.to_path_buf(),
                detail: e.to_string(),
            })?;
    }
    workspace
        .move_path(image, destination)
        .await
        .map_err(|e| RelocationError::MoveFailed {
            image: image.to_path_buf(),
            destination: destination.to_path_buf(),
            detail: e.to_string(),
        })?;
    debug!("Moved {} → {}", image.display(), destination.display());
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_destination_preserves_relative_path() {
        let dst = destination_for(
            Path::new("/proj"),
            Path::new("/proj/unused-images"),
            Path::new("/proj/docs/img/old.png"),
        )
        .unwrap();
        assert_eq!(dst, PathBuf::from("/proj/unused-images/docs/img/old.png"));
    }

    #[test]
    fn test_relative_image_anchored_at_root() {
        let dst = destination_for(
            Path::new("/proj"),
            Path::new("/attic"),
            Path::new("img/old.png"),
        )
        .unwrap();
        assert_eq!(dst, PathBuf::from("/attic/img/old.png"));
    }

    #[test]
    fn test_outside_root_rejected() {
        let err = destination_for(
            Path::new("/proj"),
            Path::new("/proj/unused-images"),
            Path::new("/elsewhere/a.png"),
        )
        .unwrap_err();
        assert!(matches!(err, RelocationError::OutsideWorkspace { .. }));
    }

    #[test]
    fn test_quarantine_dir_relative_and_absolute() {
        let relative = SweepConfig::default();
        assert_eq!(
            quarantine_dir(Path::new("/proj"), &relative),
            PathBuf::from("/proj/unused-images")
        );
        let absolute = SweepConfig::builder().quarantine_dir("/attic").build().unwrap();
        assert_eq!(quarantine_dir(Path::new("/proj"), &absolute), PathBuf::from("/attic"));
    }
}
