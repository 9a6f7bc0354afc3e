//! On-disk layout of one cache location

use crate::cache::key::CacheKey;
use crate::error::{PrebuildError, PrebuildResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// Triplet of the Android target
pub const ANDROID_TRIPLET: &str = "arm64-android";

/// Operating system the tool runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Windows,
    MacOS,
    Linux,
}

impl HostPlatform {
    /// Platform this binary was compiled for
    pub fn detect() -> PrebuildResult<Self> {
        if cfg!(target_os = "windows") {
            Ok(Self::Windows)
        } else if cfg!(target_os = "macos") {
            Ok(Self::MacOS)
        } else if cfg!(target_os = "linux") {
            Ok(Self::Linux)
        } else {
            Err(PrebuildError::UnsupportedPlatform(
                std::env::consts::OS.to_string(),
            ))
        }
    }

    /// Triplet for host builds and host tools
    pub fn triplet(&self) -> &'static str {
        match self {
            Self::Windows => "x64-windows",
            Self::MacOS => "x64-osx",
            Self::Linux => "x64-linux",
        }
    }

    /// File name of the package-manager executable
    pub fn exe_name(&self) -> &'static str {
        match self {
            Self::Windows => "vcpkg.exe",
            _ => "vcpkg",
        }
    }

    /// Executable suffix for SDK tools
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            _ => "",
        }
    }

    /// Cache base used when neither the environment nor the config names one
    pub fn default_cache_base(&self) -> PathBuf {
        match self {
            Self::MacOS => dirs::home_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("prebuild")
                .join("vcpkg"),
            _ => std::env::temp_dir().join("prebuild").join("vcpkg"),
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::MacOS => "macos",
            Self::Linux => "linux",
        };
        write!(f, "{}", name)
    }
}

/// Paths owned by one cache instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    /// Root of the package-manager tree
    pub base_path: PathBuf,
    /// Sibling lock file serializing runs against `base_path`
    pub lock_path: PathBuf,
    /// Last successfully written cache key
    pub tag_path: PathBuf,
    /// Package-manager executable
    pub exe_path: PathBuf,
}

impl CacheLocation {
    /// Layout rooted at an explicit directory. `base_path` must end in a
    /// named component; the lock file is its `.lock` sibling.
    pub fn at(base_path: impl Into<PathBuf>, host: HostPlatform) -> Self {
        let base_path = base_path.into();
        let mut lock_name = base_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        lock_name.push(".lock");
        Self {
            lock_path: base_path.with_file_name(lock_name),
            tag_path: base_path.join(".id"),
            exe_path: base_path.join(host.exe_name()),
            base_path,
        }
    }

    /// Layout for `key` below the cache base. Android caches live in their
    /// own subtree.
    pub fn for_key(cache_base: &Path, key: &CacheKey, android: bool, host: HostPlatform) -> Self {
        let parent = if android {
            cache_base.join("android")
        } else {
            cache_base.to_path_buf()
        };
        Self::at(parent.join(key.digest()), host)
    }

    /// File whose presence marks a complete toolchain extraction
    pub fn marker_path(&self) -> PathBuf {
        self.base_path.join(".vcpkg-root")
    }

    /// Recipe overlay inside the cache
    pub fn ports_path(&self) -> PathBuf {
        self.base_path.join("ports")
    }

    /// Transient build artifacts
    pub fn buildtrees_path(&self) -> PathBuf {
        self.base_path.join("buildtrees")
    }

    pub fn installed_root(&self) -> PathBuf {
        self.base_path.join("installed")
    }

    pub fn installed_path(&self, triplet: &str) -> PathBuf {
        self.installed_root().join(triplet)
    }

    /// Toolchain file the build system includes
    pub fn toolchain_file(&self) -> PathBuf {
        self.base_path
            .join("scripts")
            .join("buildsystems")
            .join("vcpkg.cmake")
    }

    /// Auxiliary Android packages, one directory per package
    pub fn android_packages_path(&self) -> PathBuf {
        self.base_path.join("android")
    }
}
