//! Elimination: the working set of images not yet proven used.
//!
//! The set starts with every discovered image and only ever shrinks. A
//! reference whose key matches a member removes it; later references to the
//! same image find nothing and are no-ops. Whatever survives every document
//! is unused.

use crate::pipeline::extract::MarkdownDocument;
use crate::pipeline::normalize::PathNormalizer;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::trace;

/// Images still considered unused, keyed by their comparison key.
///
/// One key can name several files: `A.png` and `a.png` are distinct on a
/// case-sensitive filesystem but share a key under a case-insensitive
/// policy. A matching reference removes all of them.
#[derive(Debug, Default)]
pub struct WorkingSet {
    remaining: HashMap<String, Vec<PathBuf>>,
    count: usize,
    initial: usize,
}

impl WorkingSet {
    /// Build the set from discovered images, normalizing each once.
    ///
    /// Inputs that normalize to the same path are one file; the first
    /// spelling given is the one reported.
    pub fn new<I, P>(images: I, normalizer: &PathNormalizer) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut remaining: HashMap<String, Vec<PathBuf>> = HashMap::new();
        let mut seen = HashSet::new();
        for image in images {
            let image = image.as_ref();
            let normalized = normalizer.resolve_candidate(image);
            if !seen.insert(normalized.clone()) {
                continue;
            }
            remaining
                .entry(normalizer.key(&normalized))
                .or_default()
                .push(image.to_path_buf());
        }
        let count = seen.len();
        Self {
            remaining,
            count,
            initial: count,
        }
    }

    /// Number of distinct images the set started with.
    pub fn initial_len(&self) -> usize {
        self.initial
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.remaining.contains_key(key)
    }

    /// Remove every member with this key, returning their paths if any were present.
    pub fn eliminate(&mut self, key: &str) -> Option<Vec<PathBuf>> {
        let removed = self.remaining.remove(key)?;
        self.count -= removed.len();
        Some(removed)
    }

    /// Apply every local reference in `doc` to the set.
    pub fn apply(
        &mut self,
        doc: &MarkdownDocument,
        normalizer: &PathNormalizer,
    ) -> DocumentTally {
        tally_document(doc, normalizer, |key| self.eliminate(key).is_some())
    }

    /// The surviving images, sorted.
    pub fn into_unused(self) -> Vec<PathBuf> {
        let mut unused: Vec<PathBuf> = self.remaining.into_values().flatten().collect();
        unused.sort();
        unused
    }
}

/// A [`WorkingSet`] shared by concurrent document workers.
///
/// Each membership test and removal happens under one lock acquisition, so
/// two workers can never both claim the same image. The lock is never held
/// across I/O or across references.
#[derive(Debug, Default)]
pub struct SharedWorkingSet {
    inner: Mutex<WorkingSet>,
}

impl SharedWorkingSet {
    pub fn new(set: WorkingSet) -> Self {
        Self {
            inner: Mutex::new(set),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn eliminate(&self, key: &str) -> Option<Vec<PathBuf>> {
        self.lock().eliminate(key)
    }

    /// Apply every local reference in `doc`, locking once per reference.
    pub fn apply(&self, doc: &MarkdownDocument, normalizer: &PathNormalizer) -> DocumentTally {
        tally_document(doc, normalizer, |key| self.eliminate(key).is_some())
    }

    pub fn into_inner(self) -> WorkingSet {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WorkingSet> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// What one document contributed to the scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentTally {
    /// Image embeds found.
    pub references: usize,
    /// Of those, `http(s)://` references that were skipped.
    pub network: usize,
    /// References that removed an image from the working set.
    pub matched: usize,
}

impl DocumentTally {
    pub fn local(&self) -> usize {
        self.references - self.network
    }
}

fn tally_document<F>(
    doc: &MarkdownDocument,
    normalizer: &PathNormalizer,
    mut eliminate: F,
) -> DocumentTally
where
    F: FnMut(&str) -> bool,
{
    let mut tally = DocumentTally::default();
    for reference in doc.references() {
        tally.references += 1;
        if reference.is_network {
            tally.network += 1;
            continue;
        }
        let key = normalizer.reference_key(&reference);
        if eliminate(&key) {
            trace!("{} uses {}", doc.path.display(), key);
            tally.matched += 1;
        }
    }
    tally
}

/// Compute the unused subset of `images` given fully loaded `documents`.
///
/// Pure and synchronous: no I/O, deterministic for any document order.
pub fn resolve_unused<P: AsRef<Path>>(
    images: &[P],
    documents: &[MarkdownDocument],
    normalizer: &PathNormalizer,
) -> Vec<PathBuf> {
    let mut set = WorkingSet::new(images, normalizer);
    for doc in documents {
        if set.is_empty() {
            break;
        }
        set.apply(doc, normalizer);
    }
    set.into_unused()
}
