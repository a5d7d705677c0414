//! Identity and size contract for archivables, plus the string reason key.

use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity token of an archivable.
///
/// Two handles carrying the same token are the same pending item, no matter
/// what else they contain. Producers either draw tokens from [`ArchivableId::next`]
/// or pick their own (e.g. a content hash) via [`ArchivableId::from_raw`];
/// mixing both schemes in one accumulator is the producer's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchivableId(u64);

impl ArchivableId {
    /// Issue a fresh, process-unique token.
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ArchivableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit of content pending delivery to a storage backend.
///
/// The accumulator only ever looks at the identity token and the size.
pub trait Archivable {
    fn id(&self) -> ArchivableId;

    /// Approximate serialized size in bytes. `None` counts as zero.
    fn size(&self) -> Option<u64> {
        None
    }
}

/// Failure reason identified by a string, as found in replay logs.
#[derive(Debug, Clone, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReasonKey(String);

impl ReasonKey {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReasonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ReasonKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ReasonKey {
    fn from(reason: &str) -> Self {
        Self::new(reason)
    }
}

impl From<String> for ReasonKey {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}
