//! Reference extraction: find every Markdown image embed in a document.
//!
//! This is deliberately a pattern match, not a Markdown parse. It recognises
//!
//! - `![alt](path)`
//! - `![alt](<path with spaces>)`
//! - either form followed by a title, `"…"` or `'…'`, optionally after a comma
//!
//! and yields the path part only. Paths are not validated; a string that
//! names no real file simply never matches a candidate later on.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// `![alt](` then an angle-bracket path (group 1) or a bare path (group 2),
/// then an optional title, then `)`.
///
/// Alt text may hold one level of balanced brackets (`![Fig [1]](a.png)`)
/// and a bare path one level of balanced parentheses (`shot(1).png`).
static RE_IMAGE_EMBED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"!\[(?:[^\[\]]|\[[^\[\]]*\])*\]"#,
        r#"\(\s*(?:<([^<>\n]+)>|((?:[^\s,"'()]|\([^\s,"'()]*\))+))"#,
        r#"(?:\s*,?\s*(?:"[^"]*"|'[^']*'))?\s*\)"#,
    ))
    .unwrap()
});

/// A Markdown document read once at the start of its processing.
#[derive(Debug, Clone)]
pub struct MarkdownDocument {
    pub path: PathBuf,
    pub text: String,
}

impl MarkdownDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Directory relative references are resolved against.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Every image reference in the document, in text order.
    pub fn references(&self) -> impl Iterator<Item = ImageReference<'_>> + '_ {
        references(self.dir(), &self.text)
    }
}

/// A raw, not-yet-normalized image path found inside one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageReference<'a> {
    /// The path exactly as written, minus angle brackets and title.
    pub raw: &'a str,
    /// Directory of the containing document.
    pub document_dir: &'a Path,
    /// `http://` / `https://` references can never name a local candidate.
    pub is_network: bool,
}

/// Yield the raw path of every image embed in `text`, left to right.
///
/// The iterator is lazy and borrows `text`; calling this again restarts the
/// scan from the beginning.
pub fn extract_paths(text: &str) -> impl Iterator<Item = &str> + '_ {
    RE_IMAGE_EMBED.captures_iter(text).filter_map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
    })
}

/// Yield tagged references for a document living in `document_dir`.
pub fn references<'a>(
    document_dir: &'a Path,
    text: &'a str,
) -> impl Iterator<Item = ImageReference<'a>> + 'a {
    extract_paths(text).map(move |raw| ImageReference {
        raw,
        document_dir,
        is_network: is_network_reference(raw),
    })
}

/// True for `http://` and `https://` references (scheme matched case-insensitively).
pub fn is_network_reference(raw: &str) -> bool {
    starts_with_ignore_case(raw, "http://") || starts_with_ignore_case(raw, "https://")
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(text: &str) -> Vec<&str> {
        extract_paths(text).collect()
    }

    #[test]
    fn test_plain_and_titled() {
        let text = "intro ![x](a.png) middle ![y](img/b.png \"title\") end";
        assert_eq!(paths(text), vec!["a.png", "img/b.png"]);
    }

    #[test]
    fn test_single_quoted_title_with_comma() {
        assert_eq!(paths("![d](c.gif, 'Caption')"), vec!["c.gif"]);
        assert_eq!(paths("![d](c.gif,\"Caption\")"), vec!["c.gif"]);
    }

    #[test]
    fn test_angle_brackets_keep_spaces() {
        assert_eq!(
            paths("![s](<path with space.png>)"),
            vec!["path with space.png"]
        );
        assert_eq!(
            paths("![s](<dir/my pic.jpg> \"t\")"),
            vec!["dir/my pic.jpg"]
        );
    }

    #[test]
    fn test_bare_path_stops_at_space() {
        // Without angle brackets a space can only start a title; anything
        // else is not an image embed.
        assert!(paths("![s](path with space.png)").is_empty());
    }

    #[test]
    fn test_order_preserved_and_restartable() {
        let text = "![1](one.png)\n\n![2](two.png)\n![3](<three.svg>)";
        assert_eq!(paths(text), vec!["one.png", "two.png", "three.svg"]);
        assert_eq!(paths(text), paths(text));
    }

    #[test]
    fn test_plain_links_ignored() {
        assert!(paths("[not an image](a.png)").is_empty());
    }

    #[test]
    fn test_parentheses_in_bare_path() {
        assert_eq!(
            paths("![shot](img/screenshot(1).png)"),
            vec!["img/screenshot(1).png"]
        );
        assert_eq!(
            paths("![shot](img/screenshot(1).png \"t\") ![n](b.png)"),
            vec!["img/screenshot(1).png", "b.png"]
        );
    }

    #[test]
    fn test_brackets_in_alt_text() {
        assert_eq!(paths("![Figure [1] overview](fig1.png)"), vec!["fig1.png"]);
        assert_eq!(paths("![[a] and [b]](ab.png)"), vec!["ab.png"]);
    }

    #[test]
    fn test_empty_alt() {
        assert_eq!(paths("![](blank.webp)"), vec!["blank.webp"]);
    }

    #[test]
    fn test_network_detection() {
        assert!(is_network_reference("http://example.com/d.png"));
        assert!(is_network_reference("HTTPS://example.com/d.png"));
        assert!(!is_network_reference("httpdocs/d.png"));
        assert!(!is_network_reference("./d.png"));
        assert!(!is_network_reference("h"));
    }

    #[test]
    fn test_references_are_tagged() {
        let doc = MarkdownDocument::new(
            "/proj/docs/readme.md",
            "![a](a.png) ![b](https://cdn.example.com/b.png)",
        );
        let refs: Vec<_> = doc.references().collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].document_dir, Path::new("/proj/docs"));
        assert!(!refs[0].is_network);
        assert!(refs[1].is_network);
    }
}
