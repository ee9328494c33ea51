//! Host interface: discovery, reading, and file moves.
//!
//! The scan never touches the filesystem directly. Everything it needs from
//! its environment goes through [`Workspace`], so the core can run against a
//! real directory ([`FsWorkspace`]) or against anything else a host provides
//! (an editor's virtual workspace, an in-memory fixture in tests).

use crate::error::SweepError;
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Everything a sweep needs from its host environment.
///
/// Each operation fails independently. Discovery and `root` failures are
/// fatal to a scan; read and move failures only affect one file.
pub trait Workspace: Send + Sync {
    /// The single root used for root-relative references and quarantine paths.
    ///
    /// A host with nothing open returns [`SweepError::NoWorkspaceRoot`].
    fn root(&self) -> Result<PathBuf, SweepError>;

    /// All files under the root matching the `include` glob and none of the
    /// `exclude` globs. Globs are matched against root-relative paths.
    fn find_files(
        &self,
        include: &str,
        exclude: &[String],
    ) -> impl Future<Output = Result<Vec<PathBuf>, SweepError>> + Send;

    /// Full UTF-8 text of a document.
    fn read_text(&self, path: &Path) -> impl Future<Output = io::Result<String>> + Send;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> impl Future<Output = bool> + Send;

    /// Create `path` and any missing parents.
    fn ensure_dir(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;

    /// Move `from` to `to`.
    fn move_path(&self, from: &Path, to: &Path) -> impl Future<Output = io::Result<()>> + Send;
}

/// A [`Workspace`] backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    /// Open `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SweepError> {
        let given = root.as_ref();
        let root = std::path::absolute(given).map_err(|_| SweepError::WorkspaceRootMissing {
            path: given.to_path_buf(),
        })?;
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(SweepError::WorkspaceRootNotADirectory { path: root }),
            Err(_) => return Err(SweepError::WorkspaceRootMissing { path: root }),
        }
        debug!("Opened workspace: {}", root.display());
        Ok(Self { root })
    }
}

impl Workspace for FsWorkspace {
    fn root(&self) -> Result<PathBuf, SweepError> {
        Ok(self.root.clone())
    }

    async fn find_files(
        &self,
        include: &str,
        exclude: &[String],
    ) -> Result<Vec<PathBuf>, SweepError> {
        let include = compile_include(include)?;
        let exclude = compile_excludes(exclude)?;
        let root = self.root.clone();

        tokio::task::spawn_blocking(move || walk(&root, &include, &exclude))
            .await
            .map_err(|e| SweepError::Internal(format!("discovery task failed: {e}")))?
    }

    async fn read_text(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::symlink_metadata(path).await.is_ok()
    }

    async fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn move_path(&self, from: &Path, to: &Path) -> io::Result<()> {
        match tokio::fs::rename(from, to).await {
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                // Quarantine on another filesystem: copy, then drop the original.
                tokio::fs::copy(from, to).await?;
                tokio::fs::remove_file(from).await
            }
            other => other,
        }
    }
}

// ── Discovery helpers ────────────────────────────────────────────────────

/// Include globs match case-insensitively so `E.PNG` counts as a PNG.
fn compile_include(pattern: &str) -> Result<GlobSet, SweepError> {
    let glob = GlobBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| invalid_pattern(pattern, e))?;
    GlobSetBuilder::new()
        .add(glob)
        .build()
        .map_err(|e| invalid_pattern(pattern, e))
}

fn compile_excludes(patterns: &[String]) -> Result<GlobSet, SweepError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).map_err(|e| invalid_pattern(pattern, e))?);
    }
    builder
        .build()
        .map_err(|e| invalid_pattern(&patterns.join(", "), e))
}

fn invalid_pattern(pattern: &str, err: globset::Error) -> SweepError {
    SweepError::InvalidPattern {
        pattern: pattern.to_string(),
        detail: err.to_string(),
    }
}

/// Walk `root` (without following symlinks) and return sorted matches.
///
/// An unreadable root is fatal; an unreadable subdirectory is logged and
/// skipped.
fn walk(root: &Path, include: &GlobSet, exclude: &GlobSet) -> Result<Vec<PathBuf>, SweepError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(SweepError::DiscoveryFailed {
                    root: root.to_path_buf(),
                    detail: e.to_string(),
                });
            }
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if include.is_match(relative) && !exclude.is_match(relative) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, b"x").unwrap();
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = FsWorkspace::new(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, SweepError::WorkspaceRootMissing { .. }));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "file.md");
        let err = FsWorkspace::new(dir.path().join("file.md")).unwrap_err();
        assert!(matches!(err, SweepError::WorkspaceRootNotADirectory { .. }));
    }

    #[tokio::test]
    async fn test_find_files_with_excludes() {
        let dir = TempDir::new().unwrap();
        for rel in [
            "a.png",
            "img/B.PNG",
            "img/c.txt",
            "docs/readme.md",
            ".git/objects/d.png",
            "unused-images/old.png",
        ] {
            touch(dir.path(), rel);
        }
        let ws = FsWorkspace::new(dir.path()).unwrap();
        let excludes = vec!["**/.git/**".to_string(), "unused-images/**".to_string()];

        let images = ws.find_files("**/*.{png,jpg}", &excludes).await.unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.strip_prefix(ws.root().unwrap()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("a.png"), PathBuf::from("img/B.PNG")]);

        let docs = ws.find_files("**/*.md", &excludes).await.unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_pattern_rejected() {
        let dir = TempDir::new().unwrap();
        let ws = FsWorkspace::new(dir.path()).unwrap();
        let err = ws.find_files("**/*.{png", &[]).await.unwrap_err();
        assert!(matches!(err, SweepError::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn test_move_and_exists() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.png");
        let ws = FsWorkspace::new(dir.path()).unwrap();
        let from = dir.path().join("a.png");
        let to_dir = dir.path().join("q/sub");
        ws.ensure_dir(&to_dir).await.unwrap();
        ws.move_path(&from, &to_dir.join("a.png")).await.unwrap();
        assert!(!ws.exists(&from).await);
        assert!(ws.exists(&to_dir.join("a.png")).await);
    }
}
