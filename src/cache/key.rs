//! Content-addressed cache keys
//!
//! A key is the short digest of the recipe overlay directory paired with a
//! format version. Bumping the version forces every consumer to rebuild even
//! when the recipes are unchanged.

use crate::error::{PrebuildError, PrebuildResult};
use crate::hash;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Version attached to every tag. Increment to invalidate all caches.
pub const FORMAT_VERSION: u32 = 1;

/// Number of hex characters of the directory digest kept in a key
pub const DIGEST_LEN: usize = 8;

/// Identity of one valid install
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    digest: String,
    format_version: u32,
}

impl CacheKey {
    /// Build a key from a digest prefix, validating its shape
    pub fn new(digest: impl Into<String>, format_version: u32) -> PrebuildResult<Self> {
        let digest = digest.into();
        if digest.len() != DIGEST_LEN
            || !digest
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(PrebuildError::InvalidCacheKey(format!(
                "digest must be {} lowercase hex characters, got '{}'",
                DIGEST_LEN, digest
            )));
        }
        Ok(Self {
            digest,
            format_version,
        })
    }

    /// Hash a recipe directory into a key at the current format version
    pub fn from_directory(path: &Path) -> PrebuildResult<Self> {
        let full = hash::hash_path(path)?;
        let key = Self::new(&full[..DIGEST_LEN], FORMAT_VERSION)?;
        debug!("Recipes at {} hash to {}", path.display(), key);
        Ok(key)
    }

    /// Short directory digest
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.digest, self.format_version)
    }
}

impl FromStr for CacheKey {
    type Err = PrebuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digest, version) = s
            .rsplit_once('_')
            .ok_or_else(|| PrebuildError::InvalidCacheKey(format!("missing '_' in '{}'", s)))?;
        let version = version.parse::<u32>().map_err(|_| {
            PrebuildError::InvalidCacheKey(format!("bad format version in '{}'", s))
        })?;
        Self::new(digest, version)
    }
}
