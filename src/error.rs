//! Error types for prebuild
//!
//! All modules use `PrebuildResult<T>` as their return type. Every variant is
//! fatal: the pipeline aborts before the tag file or bundle manifest is
//! written, so the next run sees stale state and redoes the work.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for prebuild operations
pub type PrebuildResult<T> = Result<T, PrebuildError>;

/// All errors that can occur while provisioning or bundling
#[derive(Error, Debug)]
pub enum PrebuildError {
    // Download errors
    #[error("Download failed: {url}: {reason}")]
    Network { url: String, reason: String },

    #[error(
        "Checksum mismatch for {}: expected {algorithm} {expected}, got {actual}",
        path.display()
    )]
    Integrity {
        path: PathBuf,
        algorithm: String,
        expected: String,
        actual: String,
    },

    // External tool errors
    #[error("Command failed with exit code {code}: {command}\n\nstdout:\n{stdout}\n\nstderr:\n{stderr}")]
    ToolFailure {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Failed to launch {command}")]
    ToolLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Bundle errors
    #[error("Missing artifact {}: {context}", path.display())]
    MissingArtifact { path: PathBuf, context: String },

    #[error("Framework library does not follow the naming convention: {file}")]
    Naming { file: String },

    #[error("Malformed dependency descriptor {}: {reason}", path.display())]
    Descriptor { path: PathBuf, reason: String },

    // Cache errors
    #[error("Invalid cache key: {0}")]
    InvalidCacheKey(String),

    #[error("Unsupported host platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Toolchain root {} does not name a directory", .0.display())]
    InvalidToolchainRoot(PathBuf),

    // Configuration errors
    #[error("Invalid configuration at {}: {reason}", path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PrebuildError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a missing artifact error
    pub fn missing(path: impl Into<PathBuf>, context: impl Into<String>) -> Self {
        Self::MissingArtifact {
            path: path.into(),
            context: context.into(),
        }
    }

    /// Create a descriptor error
    pub fn descriptor(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Descriptor {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a network error
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Network { .. } => Some("Check network access and rerun; the cache will be rebuilt"),
            Self::Integrity { .. } => {
                Some("The archive may be truncated or replaced upstream; rerun with --force-bootstrap")
            }
            Self::MissingArtifact { .. } => {
                Some("The SDK contents disagree with its catalog; rerun with --force-build")
            }
            Self::ToolLaunch { .. } => Some("Pass --toolchain-root or rerun with --force-bootstrap"),
            Self::InvalidToolchainRoot(_) => Some("Pass the checkout directory itself, e.g. ../vcpkg"),
            _ => None,
        }
    }
}
