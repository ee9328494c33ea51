//! Configuration types for an unused-image sweep.
//!
//! All sweep behaviour is controlled through [`SweepConfig`], built via its
//! [`SweepConfigBuilder`]. One struct carries every knob so a config can be
//! cloned into each worker and logged as a whole.

use crate::error::SweepError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Image extensions discovered by default (matched case-insensitively).
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp", "svg"];

/// Markdown extensions discovered by default.
pub const DEFAULT_MARKDOWN_EXTENSIONS: &[&str] = &["md"];

/// Quarantine directory name, relative to the workspace root.
pub const DEFAULT_QUARANTINE_DIR: &str = "unused-images";

/// Directories never searched for images or documents.
pub const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/node_modules/**"];

/// Configuration for a scan (and optional relocation).
///
/// Built via [`SweepConfig::builder()`] or using [`SweepConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_imgsweep::{CaseSensitivity, SweepConfig};
///
/// let config = SweepConfig::builder()
///     .concurrency(4)
///     .quarantine_dir("attic/images")
///     .case_sensitivity(CaseSensitivity::Insensitive)
///     .dry_run(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SweepConfig {
    /// Number of documents (and moves) in flight at once.
    ///
    /// Defaults to the host's available parallelism, detected when the
    /// config is created. The work is I/O-bound, so raising it past the core
    /// count is harmless; lowering it to 1 gives a strictly sequential scan.
    pub concurrency: usize,

    /// Where unused images are moved. Relative paths are resolved against the
    /// workspace root. Default: `unused-images`.
    pub quarantine_dir: PathBuf,

    /// Image file extensions, without the dot.
    pub image_extensions: Vec<String>,

    /// Markdown file extensions, without the dot.
    pub markdown_extensions: Vec<String>,

    /// Root-relative glob patterns excluded from discovery.
    ///
    /// The quarantine directory is always excluded on top of these, so a
    /// second run never picks up images the first run already moved.
    pub exclude: Vec<String>,

    /// How reference paths are compared with image paths. Default: [`CaseSensitivity::Auto`].
    pub case_sensitivity: CaseSensitivity,

    /// Compute relocation destinations without touching the filesystem. Default: false.
    pub dry_run: bool,

    /// Receives scan and relocation events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            quarantine_dir: PathBuf::from(DEFAULT_QUARANTINE_DIR),
            image_extensions: to_owned_list(DEFAULT_IMAGE_EXTENSIONS),
            markdown_extensions: to_owned_list(DEFAULT_MARKDOWN_EXTENSIONS),
            exclude: to_owned_list(DEFAULT_EXCLUDES),
            case_sensitivity: CaseSensitivity::default(),
            dry_run: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SweepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweepConfig")
            .field("concurrency", &self.concurrency)
            .field("quarantine_dir", &self.quarantine_dir)
            .field("image_extensions", &self.image_extensions)
            .field("markdown_extensions", &self.markdown_extensions)
            .field("exclude", &self.exclude)
            .field("case_sensitivity", &self.case_sensitivity)
            .field("dry_run", &self.dry_run)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn SweepProgressCallback>"),
            )
            .finish()
    }
}

impl SweepConfig {
    /// Create a new builder for `SweepConfig`.
    pub fn builder() -> SweepConfigBuilder {
        SweepConfigBuilder {
            config: Self::default(),
        }
    }

    /// Glob matching every image file, e.g. `**/*.{png,jpg,…}`.
    pub fn image_glob(&self) -> String {
        extension_glob(&self.image_extensions)
    }

    /// Glob matching every Markdown document, e.g. `**/*.md`.
    pub fn markdown_glob(&self) -> String {
        extension_glob(&self.markdown_extensions)
    }
}

/// Builder for [`SweepConfig`].
#[derive(Debug)]
pub struct SweepConfigBuilder {
    config: SweepConfig,
}

impl SweepConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn quarantine_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.quarantine_dir = dir.into();
        self
    }

    pub fn image_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.image_extensions = normalise_extensions(exts);
        self
    }

    pub fn markdown_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.markdown_extensions = normalise_extensions(exts);
        self
    }

    /// Add one exclude glob to the defaults.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.config.exclude.push(pattern.into());
        self
    }

    pub fn case_sensitivity(mut self, cs: CaseSensitivity) -> Self {
        self.config.case_sensitivity = cs;
        self
    }

    pub fn dry_run(mut self, v: bool) -> Self {
        self.config.dry_run = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SweepConfig, SweepError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(SweepError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.image_extensions.is_empty() {
            return Err(SweepError::InvalidConfig(
                "At least one image extension is required".into(),
            ));
        }
        if c.markdown_extensions.is_empty() {
            return Err(SweepError::InvalidConfig(
                "At least one Markdown extension is required".into(),
            ));
        }
        if c.quarantine_dir.as_os_str().is_empty() {
            return Err(SweepError::InvalidConfig(
                "Quarantine directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How normalized paths are compared.
///
/// Whether `Img/E.PNG` and `img/e.png` name the same file is a property of
/// the filesystem, not of the path, so the policy is chosen once per scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaseSensitivity {
    /// Detect from the host platform (default).
    #[default]
    Auto,
    /// Compare exact-case.
    Sensitive,
    /// Compare case-folded.
    Insensitive,
}

impl CaseSensitivity {
    /// Resolve [`CaseSensitivity::Auto`] against the running platform.
    ///
    /// Windows and macOS ship case-insensitive filesystems by default;
    /// everything else is treated as case-sensitive.
    pub fn is_insensitive(self) -> bool {
        match self {
            CaseSensitivity::Auto => cfg!(any(windows, target_os = "macos")),
            CaseSensitivity::Sensitive => false,
            CaseSensitivity::Insensitive => true,
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn normalise_extensions<I, S>(exts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = exts
        .into_iter()
        .map(|e| e.into().trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

fn extension_glob(exts: &[String]) -> String {
    match exts {
        [single] => format!("**/*.{single}"),
        many => format!("**/*.{{{}}}", many.join(",")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_globs_match_discovery_patterns() {
        let c = SweepConfig::default();
        assert_eq!(c.image_glob(), "**/*.{png,jpg,jpeg,gif,bmp,tiff,webp,svg}");
        assert_eq!(c.markdown_glob(), "**/*.md");
    }

    #[test]
    fn builder_clamps_concurrency() {
        let c = SweepConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn extensions_are_normalised() {
        let c = SweepConfig::builder()
            .image_extensions([".PNG", "png", " jpg "])
            .build()
            .unwrap();
        assert_eq!(c.image_extensions, vec!["jpg", "png"]);
    }

    #[test]
    fn empty_extensions_rejected() {
        let err = SweepConfig::builder()
            .markdown_extensions(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, SweepError::InvalidConfig(_)));
    }

    #[test]
    fn explicit_case_policies() {
        assert!(CaseSensitivity::Insensitive.is_insensitive());
        assert!(!CaseSensitivity::Sensitive.is_insensitive());
        assert_eq!(
            CaseSensitivity::Auto.is_insensitive(),
            cfg!(any(windows, target_os = "macos"))
        );
    }

    #[test]
    fn debug_hides_callback() {
        let c = SweepConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn SweepProgressCallback>"));
    }
}
