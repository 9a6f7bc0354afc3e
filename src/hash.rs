//! Content hashing for cache keys and archive checksums
//!
//! A directory digest depends only on the bytes and relative names of the
//! files beneath it, never on the order the filesystem lists them in.

use crate::error::{PrebuildError, PrebuildResult};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Read size used when streaming file contents into a hasher
const CHUNK_SIZE: usize = 4096;

/// Hash algorithms used by archive checksums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Hex digest of an in-memory buffer
    pub fn digest_hex(&self, bytes: &[u8]) -> String {
        match self {
            Self::Md5 => hex::encode(Md5::digest(bytes)),
            Self::Sha256 => hex::encode(Sha256::digest(bytes)),
            Self::Sha512 => hex::encode(Sha512::digest(bytes)),
        }
    }

    /// Hex digest of a file, streamed in fixed-size chunks
    pub fn hash_file(&self, path: &Path) -> PrebuildResult<String> {
        match self {
            Self::Md5 => stream_file::<Md5>(path),
            Self::Sha256 => stream_file::<Sha256>(path),
            Self::Sha512 => stream_file::<Sha512>(path),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        };
        write!(f, "{}", name)
    }
}

fn stream_file<D: Digest>(path: &Path) -> PrebuildResult<String> {
    let mut hasher = D::new();
    feed_file(&mut hasher, path)?;
    Ok(hex::encode(hasher.finalize()))
}

fn feed_file<D: Digest>(hasher: &mut D, path: &Path) -> PrebuildResult<u64> {
    let mut file = File::open(path)
        .map_err(|e| PrebuildError::io(format!("opening {} for hashing", path.display()), e))?;
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| PrebuildError::io(format!("reading {}", path.display()), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok(total)
}

/// List every regular file below `root`, sorted lexicographically.
///
/// A file path yields a single-element list; a missing path yields none.
pub fn recursive_file_list(root: &Path) -> PrebuildResult<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let context = format!("walking {}", root.display());
            match e.into_io_error() {
                Some(source) => PrebuildError::io(context, source),
                None => PrebuildError::Internal(format!("{}: filesystem loop", context)),
            }
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Relative path with `/` separators, the form fed into directory digests
pub(crate) fn relative_key(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Hash an explicit set of files below `root` into one SHA-256 digest.
///
/// The list is sorted by relative path first, so callers may pass it in any
/// order. Each file contributes its relative name and its bytes.
pub fn hash_files(root: &Path, files: &[PathBuf]) -> PrebuildResult<String> {
    let mut keyed: Vec<(String, &PathBuf)> = files
        .iter()
        .map(|file| (relative_key(root, file), file))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Sha256::new();
    for (name, file) in keyed {
        let len = file
            .metadata()
            .map_err(|e| PrebuildError::io(format!("inspecting {}", file.display()), e))?
            .len();
        hasher.update((name.len() as u64).to_le_bytes());
        hasher.update(name.as_bytes());
        hasher.update(len.to_le_bytes());
        feed_file(&mut hasher, file)?;
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hash a file or a directory tree, returning the full SHA-256 hex digest
pub fn hash_path(path: &Path) -> PrebuildResult<String> {
    if path.is_file() {
        return HashAlgorithm::Sha256.hash_file(path);
    }
    if !path.is_dir() {
        return Err(PrebuildError::missing(path, "nothing to hash"));
    }

    let files = recursive_file_list(path)?;
    debug!("Hashing {} files under {}", files.len(), path.display());
    hash_files(path, &files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("zlib")).unwrap();
        fs::create_dir_all(dir.path().join("openssl/patches")).unwrap();
        fs::write(dir.path().join("zlib/portfile.cmake"), "vcpkg_from_github()").unwrap();
        fs::write(dir.path().join("zlib/CONTROL"), "Source: zlib\nVersion: 1.2.11").unwrap();
        fs::write(dir.path().join("openssl/portfile.cmake"), "include(openssl)").unwrap();
        fs::write(dir.path().join("openssl/patches/fix.patch"), "--- a\n+++ b\n").unwrap();
        dir
    }

    #[test]
    fn digest_is_deterministic() {
        let dir = sample_tree();
        let first = hash_path(dir.path()).unwrap();
        let second = hash_path(dir.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn digest_ignores_listing_order() {
        let dir = sample_tree();
        let mut files = recursive_file_list(dir.path()).unwrap();
        let sorted = hash_files(dir.path(), &files).unwrap();
        files.reverse();
        let reversed = hash_files(dir.path(), &files).unwrap();
        files.swap(0, 2);
        let shuffled = hash_files(dir.path(), &files).unwrap();

        assert_eq!(sorted, reversed);
        assert_eq!(sorted, shuffled);
    }

    #[test]
    fn identical_trees_in_different_places_match() {
        let a = sample_tree();
        let b = sample_tree();
        assert_eq!(hash_path(a.path()).unwrap(), hash_path(b.path()).unwrap());
    }

    #[test]
    fn single_byte_change_changes_digest() {
        let dir = sample_tree();
        let before = hash_path(dir.path()).unwrap();
        fs::write(dir.path().join("openssl/patches/fix.patch"), "--- a\n+++ c\n").unwrap();
        assert_ne!(before, hash_path(dir.path()).unwrap());
    }

    #[test]
    fn added_file_changes_digest() {
        let dir = sample_tree();
        let before = hash_path(dir.path()).unwrap();
        fs::write(dir.path().join("zlib/usage"), "").unwrap();
        assert_ne!(before, hash_path(dir.path()).unwrap());
    }

    #[test]
    fn removed_file_changes_digest() {
        let dir = sample_tree();
        let before = hash_path(dir.path()).unwrap();
        fs::remove_file(dir.path().join("zlib/CONTROL")).unwrap();
        assert_ne!(before, hash_path(dir.path()).unwrap());
    }

    #[test]
    fn renamed_file_changes_digest() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.cmake"), "same").unwrap();
        let before = hash_path(dir.path()).unwrap();
        fs::rename(dir.path().join("a.cmake"), dir.path().join("b.cmake")).unwrap();
        assert_ne!(before, hash_path(dir.path()).unwrap());
    }

    #[test]
    fn recursive_list_is_sorted_and_files_only() {
        let dir = sample_tree();
        let files = recursive_file_list(dir.path()).unwrap();
        assert_eq!(files.len(), 4);
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
        assert!(files.iter().all(|f| f.is_file()));
    }

    #[test]
    fn recursive_list_of_missing_path_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(recursive_file_list(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn hash_missing_path_errors() {
        let dir = TempDir::new().unwrap();
        let err = hash_path(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PrebuildError::MissingArtifact { .. }));
    }

    #[test]
    fn file_hash_matches_in_memory_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archive.tgz");
        let payload = vec![7u8; CHUNK_SIZE * 3 + 17];
        fs::write(&path, &payload).unwrap();

        for algorithm in [HashAlgorithm::Md5, HashAlgorithm::Sha256, HashAlgorithm::Sha512] {
            assert_eq!(
                algorithm.hash_file(&path).unwrap(),
                algorithm.digest_hex(&payload)
            );
        }
    }

    #[test]
    fn known_md5_digest() {
        assert_eq!(
            HashAlgorithm::Md5.digest_hex(b""),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }
}
