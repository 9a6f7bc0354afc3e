//! Immutable run settings
//!
//! Built once from command-line options, the config file and the
//! environment, then passed by reference to every component.

use crate::cache::key::CacheKey;
use crate::cache::location::{CacheLocation, HostPlatform, ANDROID_TRIPLET};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{PrebuildError, PrebuildResult};
use crate::lock::MIN_POLL_INTERVAL;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Environment variable overriding the cache base directory
pub const CACHE_BASE_ENV: &str = "PREBUILD_CACHE_BASE";

/// What the run provisions for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Native build on the host triplet
    Host,
    /// Android build for the named application module
    Android { app: String },
}

/// Options given on the command line
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub android: Option<String>,
    pub toolchain_root: Option<PathBuf>,
    pub force_bootstrap: bool,
    pub force_build: bool,
    pub skip_bootstrap: bool,
    pub ports_dir: Option<PathBuf>,
    pub project_root: Option<PathBuf>,
    pub build_root: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: HostPlatform,
    pub target: Target,
    /// Repository the recipes and Android apps live in
    pub project_root: PathBuf,
    /// Recipe overlay hashed into the cache key
    pub ports_dir: PathBuf,
    /// Directory the build configuration document is written to
    pub build_root: PathBuf,
    pub cache_base: PathBuf,
    /// User-supplied toolchain tree, never cleaned or downloaded
    pub toolchain_root: Option<PathBuf>,
    pub force_bootstrap: bool,
    pub force_build: bool,
    pub skip_bootstrap: bool,
    pub lock_poll: Duration,
    pub dependency_set: String,
    pub bundle_libraries: Vec<String>,
    pub catalog: Catalog,
}

impl Settings {
    /// Combine the invocation with the config file and environment
    pub fn resolve(mut invocation: Invocation, config: &Config) -> PrebuildResult<Self> {
        let host = HostPlatform::detect()?;
        let env_base = std::env::var_os(CACHE_BASE_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let cache_base = resolve_cache_base(env_base, config.cache.base_dir.clone(), host);
        let cwd =
            std::env::current_dir().map_err(|e| PrebuildError::io("reading current directory", e))?;
        if let Some(root) = invocation.toolchain_root.take() {
            invocation.toolchain_root = Some(normalize_root(&root, &cwd)?);
        }
        let project_root = invocation.project_root.take().unwrap_or(cwd);
        Ok(Self::new(host, invocation, project_root, cache_base, config))
    }

    /// Assemble settings from already-resolved parts
    pub fn new(
        host: HostPlatform,
        invocation: Invocation,
        project_root: PathBuf,
        cache_base: PathBuf,
        config: &Config,
    ) -> Self {
        let ports_dir = invocation
            .ports_dir
            .unwrap_or_else(|| project_root.join("cmake").join("ports"));
        let build_root = invocation
            .build_root
            .unwrap_or_else(|| project_root.join("build"));
        let target = match invocation.android {
            Some(app) => Target::Android { app },
            None => Target::Host,
        };
        Self {
            host,
            target,
            ports_dir,
            build_root,
            project_root,
            cache_base,
            toolchain_root: invocation.toolchain_root,
            force_bootstrap: invocation.force_bootstrap,
            force_build: invocation.force_build,
            skip_bootstrap: invocation.skip_bootstrap,
            lock_poll: lock_poll(config.cache.lock_poll_secs),
            dependency_set: config.provision.dependency_set.clone(),
            bundle_libraries: config.bundle.libraries.clone(),
            catalog: Catalog::for_host(host),
        }
    }

    pub fn is_android(&self) -> bool {
        matches!(self.target, Target::Android { .. })
    }

    /// Triplet the install targets
    pub fn triplet(&self) -> &str {
        match self.target {
            Target::Host => self.host.triplet(),
            Target::Android { .. } => ANDROID_TRIPLET,
        }
    }

    /// Cache location for `key`, or the explicit toolchain root
    pub fn location(&self, key: &CacheKey) -> CacheLocation {
        match &self.toolchain_root {
            Some(root) => CacheLocation::at(root, self.host),
            None => CacheLocation::for_key(&self.cache_base, key, self.is_android(), self.host),
        }
    }

    /// Android application module directory
    pub fn app_root(&self) -> Option<PathBuf> {
        match &self.target {
            Target::Android { app } => {
                Some(self.project_root.join("android").join("apps").join(app))
            }
            Target::Host => None,
        }
    }

    /// The application's own runtime-script tree
    pub fn app_script_root(&self) -> PathBuf {
        self.project_root
            .join("interface")
            .join("resources")
            .join("qml")
    }
}

/// Absolute, `.`/`..`-free form of an explicit toolchain root.
///
/// The lock file sits beside the root, so the root must end in a named
/// directory.
fn normalize_root(root: &Path, cwd: &Path) -> PrebuildResult<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in cwd.join(root).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    if normalized.file_name().is_none() {
        return Err(PrebuildError::InvalidToolchainRoot(root.to_path_buf()));
    }
    Ok(normalized)
}

/// Configured poll interval, never below one second so waiting never spins
fn lock_poll(secs: u64) -> Duration {
    let configured = Duration::from_secs(secs);
    if configured < MIN_POLL_INTERVAL {
        warn!(
            "lock_poll_secs = {} is too short, using {} s",
            secs,
            MIN_POLL_INTERVAL.as_secs()
        );
        return MIN_POLL_INTERVAL;
    }
    configured
}

/// Pick the cache base: environment, then config, then the host default
pub fn resolve_cache_base(
    env_base: Option<PathBuf>,
    config_base: Option<PathBuf>,
    host: HostPlatform,
) -> PathBuf {
    if let Some(base) = env_base.or(config_base) {
        return base;
    }
    let base = host.default_cache_base();
    warn!(
        "Environment variable {} not set, using {}",
        CACHE_BASE_ENV,
        base.display()
    );
    base
}
