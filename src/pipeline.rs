//! End-to-end provisioning run
//!
//! One run computes the cache key, serializes on the location's lock,
//! rebuilds the cache when it is stale, assembles the Android bundle when
//! targeting Android, and finally writes the build config and tag. The lock
//! is released when the run returns, successfully or not.

use crate::bundle::packages::{copy_shared_libs, fetch_packages};
use crate::bundle::resolver::{self, AppLayout, BundleSummary, LibraryDependencyResolver};
use crate::cache::key::CacheKey;
use crate::cache::location::CacheLocation;
use crate::cache::repo::{AssessFlags, DependencyCache};
use crate::cache::state::{assess, CacheState, FreshReason, Staleness, StalenessCheck};
use crate::catalog::SDK_PACKAGE;
use crate::error::PrebuildResult;
use crate::lock::SingletonLock;
use crate::settings::Settings;
use crate::toolbox::Toolbox;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of a provisioning run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub key: CacheKey,
    pub location: CacheLocation,
    pub staleness: Staleness,
    pub state: CacheState,
    /// Build configuration document consumers include
    pub config_path: PathBuf,
    pub bundle: Option<BundleSummary>,
}

/// Read-only view of a cache location
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub key: CacheKey,
    pub location: CacheLocation,
    pub stored_tag: Option<String>,
    pub staleness: Staleness,
}

pub struct Pipeline<'a> {
    settings: &'a Settings,
    toolbox: &'a dyn Toolbox,
}

impl<'a> Pipeline<'a> {
    pub fn new(settings: &'a Settings, toolbox: &'a dyn Toolbox) -> Self {
        Self { settings, toolbox }
    }

    /// Provision the cache for the current recipes
    pub fn run(&self) -> PrebuildResult<RunReport> {
        let settings = self.settings;
        debug!("Provisioning with the {} toolbox", self.toolbox.name());
        let key = CacheKey::from_directory(&settings.ports_dir)?;
        let location = settings.location(&key);
        info!(
            "Using cache {} for key {}",
            location.base_path.display(),
            key
        );

        let _lock = SingletonLock::acquire(&location.lock_path, settings.lock_poll)?;
        let mut cache = DependencyCache::new(
            location,
            key.clone(),
            settings.host,
            settings.is_android(),
            settings.catalog.clone(),
        );

        let staleness = cache.assess(assess_flags(settings))?;
        if staleness.is_stale() {
            self.provision(&mut cache)?;
        } else if staleness == Staleness::Fresh(FreshReason::ExplicitRoot) {
            // A user checkout is never cleaned or bootstrapped, only installed into
            self.install_dependencies(&cache)?;
        }

        let bundle = match settings.app_root() {
            Some(app_root) => Some(self.assemble_bundle(&cache, &app_root)?),
            None => None,
        };

        let config_path = cache.finish(&settings.build_root)?;
        info!("Build config written to {}", config_path.display());

        Ok(RunReport {
            key,
            location: cache.location().clone(),
            staleness,
            state: cache.state(),
            config_path,
            bundle,
        })
    }

    fn provision(&self, cache: &mut DependencyCache) -> PrebuildResult<()> {
        let settings = self.settings;
        cache.bootstrap(self.toolbox, &settings.ports_dir, settings.force_bootstrap)?;
        self.install_dependencies(cache)?;
        cache.mark_provisioned()
    }

    fn install_dependencies(&self, cache: &DependencyCache) -> PrebuildResult<()> {
        if self.settings.is_android() {
            cache.install_android_prebuilt(self.toolbox)
        } else {
            cache.install(self.toolbox, &self.settings.dependency_set)
        }
    }

    fn assemble_bundle(
        &self,
        cache: &DependencyCache,
        app_root: &Path,
    ) -> PrebuildResult<BundleSummary> {
        let settings = self.settings;
        cache.install_android_prebuilt(self.toolbox)?;

        let packages = &settings.catalog.android_packages;
        let packages_root = cache.location().android_packages_path();
        fetch_packages(self.toolbox, packages, &packages_root)?;

        let resolver = LibraryDependencyResolver::new(
            &packages_root.join(SDK_PACKAGE),
            settings.bundle_libraries.clone(),
            settings.host,
        );
        let resolution = resolver.resolve(self.toolbox, &settings.app_script_root())?;

        let layout = AppLayout::new(app_root);
        copy_shared_libs(packages, &packages_root, &layout.lib_dir)?;
        resolver::install(&resolution, &layout)
    }
}

/// Assess the cache without locking or writing anything
pub fn status(settings: &Settings) -> PrebuildResult<StatusReport> {
    let key = CacheKey::from_directory(&settings.ports_dir)?;
    let cache = DependencyCache::new(
        settings.location(&key),
        key.clone(),
        settings.host,
        settings.is_android(),
        settings.catalog.clone(),
    );
    let stored_tag = cache.read_tag()?;
    let flags = assess_flags(settings);
    let staleness = assess(&StalenessCheck {
        explicit_root: flags.explicit_root,
        force_build: flags.force_build,
        skip_verification: flags.skip_verification,
        ..StalenessCheck::new(&key, stored_tag.clone())
    });

    Ok(StatusReport {
        key,
        location: cache.location().clone(),
        stored_tag: stored_tag.map(|t| t.trim_end().to_string()),
        staleness,
    })
}

fn assess_flags(settings: &Settings) -> AssessFlags {
    AssessFlags {
        explicit_root: settings.toolchain_root.is_some(),
        force_build: settings.force_build,
        skip_verification: settings.skip_bootstrap,
    }
}
