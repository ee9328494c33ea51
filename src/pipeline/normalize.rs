//! Path normalization: turn a raw reference into a comparable absolute path.
//!
//! Rules, in order:
//!
//! 1. A filesystem-absolute reference (`/img/a.png`, `C:\img\a.png`) is
//!    taken relative to the **workspace root**, not the filesystem root.
//!    Authors write root-relative links in a repository's Markdown; a
//!    literal `/img` at the filesystem root is never what they mean.
//! 2. A relative reference is resolved against the document's directory.
//! 3. `.` and `..` segments and redundant separators are collapsed
//!    lexically. Nothing touches the filesystem here.
//! 4. The comparison key is case-folded when the scan's policy is
//!    case-insensitive, exact otherwise.

use crate::config::CaseSensitivity;
use crate::pipeline::extract::ImageReference;
use std::path::{Component, Path, PathBuf};

/// Normalizes candidate paths and references against one workspace root.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    root: PathBuf,
    case_insensitive: bool,
}

impl PathNormalizer {
    /// `root` should be absolute; it is normalized lexically here.
    pub fn new(root: impl AsRef<Path>, case: CaseSensitivity) -> Self {
        Self {
            root: normalize_lexically(root.as_ref()),
            case_insensitive: case.is_insensitive(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Normalize a discovered image path. Relative paths hang off the root.
    pub fn resolve_candidate(&self, path: &Path) -> PathBuf {
        normalize_lexically(&self.anchor(path))
    }

    /// Normalize a raw reference found in a document living in `document_dir`.
    pub fn resolve_reference(&self, raw: &str, document_dir: &Path) -> PathBuf {
        let raw_path = Path::new(raw);
        let joined = if raw_path.has_root() || raw_path.is_absolute() {
            self.root.join(strip_root(raw_path))
        } else {
            self.anchor(document_dir).join(raw_path)
        };
        normalize_lexically(&joined)
    }

    /// Comparison key for an already-normalized path.
    pub fn key(&self, normalized: &Path) -> String {
        let s = normalized.to_string_lossy();
        if self.case_insensitive {
            s.to_lowercase()
        } else {
            s.into_owned()
        }
    }

    pub fn candidate_key(&self, path: &Path) -> String {
        self.key(&self.resolve_candidate(path))
    }

    pub fn reference_key(&self, reference: &ImageReference<'_>) -> String {
        self.key(&self.resolve_reference(reference.raw, reference.document_dir))
    }

    fn anchor(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Collapse `.`, `..` and repeated separators without consulting the filesystem.
///
/// `..` at the root is dropped; leading `..` in a relative path is kept.
/// Applying this twice gives the same result as applying it once.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let tail = out.components().next_back();
                let can_pop = matches!(tail, Some(Component::Normal(_)));
                let at_root = matches!(tail, Some(Component::RootDir | Component::Prefix(_)));
                if can_pop {
                    out.pop();
                } else if !at_root {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Drop prefix and root components so the path can be joined under another root.
fn strip_root(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sensitive() -> PathNormalizer {
        PathNormalizer::new("/proj", CaseSensitivity::Sensitive)
    }

    #[test]
    fn test_relative_to_document() {
        let n = sensitive();
        assert_eq!(
            n.resolve_reference("img/b.png", Path::new("/proj/docs")),
            PathBuf::from("/proj/docs/img/b.png")
        );
    }

    #[test]
    fn test_dot_segments_collapse() {
        let n = sensitive();
        assert_eq!(
            n.resolve_reference("./../assets//x/../a.png", Path::new("/proj/docs")),
            PathBuf::from("/proj/assets/a.png")
        );
    }

    #[test]
    fn test_absolute_is_root_relative() {
        let n = sensitive();
        assert_eq!(
            n.resolve_reference("/img/a.png", Path::new("/proj/deep/docs")),
            PathBuf::from("/proj/img/a.png")
        );
    }

    #[test]
    fn test_parent_cannot_escape_filesystem_root() {
        assert_eq!(
            normalize_lexically(Path::new("/../../a.png")),
            PathBuf::from("/a.png")
        );
    }

    #[test]
    fn test_relative_leading_parent_kept() {
        assert_eq!(
            normalize_lexically(Path::new("../x/./y")),
            PathBuf::from("../x/y")
        );
        assert_eq!(normalize_lexically(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_idempotent() {
        for p in ["/proj/a/../b/./c.png", "/x//y/", "rel/../../z", ".", "/"] {
            let once = normalize_lexically(Path::new(p));
            assert_eq!(normalize_lexically(&once), once, "input: {p}");
        }
    }

    #[test]
    fn test_relative_candidate_anchored_at_root() {
        let n = sensitive();
        assert_eq!(
            n.resolve_candidate(Path::new("img/c.png")),
            PathBuf::from("/proj/img/c.png")
        );
    }

    #[test]
    fn test_case_policy_controls_key() {
        let insensitive = PathNormalizer::new("/proj", CaseSensitivity::Insensitive);
        let image = insensitive.candidate_key(Path::new("/proj/Img/E.PNG"));
        let resolved = insensitive.resolve_reference("img/e.png", Path::new("/proj"));
        let reference = insensitive.key(&resolved);
        assert_eq!(image, reference);

        let n = sensitive();
        assert_ne!(
            n.candidate_key(Path::new("/proj/Img/E.PNG")),
            n.key(&n.resolve_reference("img/e.png", Path::new("/proj")))
        );
    }

    #[test]
    fn test_key_idempotent_under_folding() {
        let n = PathNormalizer::new("/proj", CaseSensitivity::Insensitive);
        let k = n.candidate_key(Path::new("/proj/A/B.PNG"));
        assert_eq!(n.candidate_key(Path::new(&k)), k);
    }
}
