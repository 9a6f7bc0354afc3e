//! One provisioned package-manager tree
//!
//! `DependencyCache` owns a cache location for the duration of a run and
//! walks it through the state machine in [`crate::cache::state`]. Callers
//! must hold the location's [`crate::lock::SingletonLock`].

use crate::cache::buildconfig::BuildConfig;
use crate::cache::key::CacheKey;
use crate::cache::location::{CacheLocation, HostPlatform, ANDROID_TRIPLET};
use crate::cache::state::{
    assess, needs_toolchain_download, transition, CacheEvent, CacheState, Staleness,
    StalenessCheck,
};
use crate::catalog::Catalog;
use crate::error::{PrebuildError, PrebuildResult};
use crate::fetch::download_and_extract;
use crate::toolbox::{run_checked, CommandSpec, Toolbox};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Flags that influence the staleness decision
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessFlags {
    pub explicit_root: bool,
    pub force_build: bool,
    pub skip_verification: bool,
}

pub struct DependencyCache {
    location: CacheLocation,
    key: CacheKey,
    host: HostPlatform,
    android: bool,
    catalog: Catalog,
    state: CacheState,
}

impl DependencyCache {
    pub fn new(
        location: CacheLocation,
        key: CacheKey,
        host: HostPlatform,
        android: bool,
        catalog: Catalog,
    ) -> Self {
        Self {
            location,
            key,
            host,
            android,
            catalog,
            state: CacheState::Unknown,
        }
    }

    pub fn location(&self) -> &CacheLocation {
        &self.location
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Triplet the install targets
    pub fn triplet(&self) -> &str {
        if self.android {
            ANDROID_TRIPLET
        } else {
            self.host.triplet()
        }
    }

    /// Contents of the tag file, `None` when absent
    pub fn read_tag(&self) -> PrebuildResult<Option<String>> {
        let path = &self.location.tag_path;
        debug!("Looking for tag file {}", path.display());
        match fs::read_to_string(path) {
            Ok(tag) => {
                debug!("Found stored tag {}", tag.trim_end());
                Ok(Some(tag))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PrebuildError::io(format!("reading {}", path.display()), e)),
        }
    }

    /// Compare the stored tag against this run's key
    pub fn assess(&mut self, flags: AssessFlags) -> PrebuildResult<Staleness> {
        let check = StalenessCheck {
            explicit_root: flags.explicit_root,
            force_build: flags.force_build,
            skip_verification: flags.skip_verification,
            ..StalenessCheck::new(&self.key, self.read_tag()?)
        };
        let verdict = assess(&check);
        info!("Cache {} is {}", self.location.base_path.display(), verdict);
        self.state = transition(self.state, &CacheEvent::Assessed(verdict.clone()))?;
        Ok(verdict)
    }

    /// Remove the whole tree. A partially deleted or absent tree is fine.
    pub fn clean(&self) {
        let path = &self.location.base_path;
        info!("Cleaning cache at {}", path.display());
        match fs::remove_dir_all(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to fully remove {}: {}", path.display(), e),
        }
    }

    /// Clean, fetch the toolchain when needed and install the recipe overlay
    pub fn bootstrap(
        &self,
        toolbox: &dyn Toolbox,
        ports_source: &Path,
        force_bootstrap: bool,
    ) -> PrebuildResult<()> {
        self.clean();

        let exe_exists = self.location.exe_path.is_file();
        let marker_exists = self.location.marker_path().is_file();
        if needs_toolchain_download(force_bootstrap, exe_exists, marker_exists) {
            download_and_extract(toolbox, &self.catalog.toolchain, &self.location.base_path)?;
        }

        self.replace_ports(ports_source)
    }

    /// Swap the cache's recipe overlay for a fresh copy of `source`
    pub fn replace_ports(&self, source: &Path) -> PrebuildResult<()> {
        let ports = self.location.ports_path();
        info!("Replacing port files in {}", ports.display());
        remove_tree_or_link(&ports)?;
        copy_tree(source, &ports)
    }

    /// Run the package-manager install for the dependency set
    pub fn install(&self, toolbox: &dyn Toolbox, dependency_set: &str) -> PrebuildResult<()> {
        let base = &self.location.base_path;
        info!("Installing {} for {}", dependency_set, self.triplet());
        let command = CommandSpec::new(&self.location.exe_path)
            .arg("--vcpkg-root")
            .arg(base)
            .arg("install")
            .arg("--triplet")
            .arg(self.triplet())
            .arg(dependency_set)
            .current_dir(base);
        run_checked(toolbox, &command)?;

        let buildtrees = self.location.buildtrees_path();
        if buildtrees.is_dir() {
            debug!("Wiping build trees");
            if let Err(e) = fs::remove_dir_all(&buildtrees) {
                warn!("Failed to remove {}: {}", buildtrees.display(), e);
            }
        }
        Ok(())
    }

    /// Fetch the prebuilt Android install tree unless it is already present
    pub fn install_android_prebuilt(&self, toolbox: &dyn Toolbox) -> PrebuildResult<()> {
        if self.location.installed_path(ANDROID_TRIPLET).is_dir() {
            debug!("Prebuilt {} tree already present", ANDROID_TRIPLET);
            return Ok(());
        }
        download_and_extract(
            toolbox,
            &self.catalog.android_installed,
            &self.location.installed_root(),
        )
    }

    /// Record that a stale cache has been rebuilt
    pub fn mark_provisioned(&mut self) -> PrebuildResult<()> {
        self.state = transition(self.state, &CacheEvent::Provisioned)?;
        Ok(())
    }

    /// Write the build config and then the tag. Runs on every successful
    /// run so consumers always see the current key.
    pub fn finish(&mut self, build_root: &Path) -> PrebuildResult<PathBuf> {
        let next = transition(self.state, &CacheEvent::Tagged)?;
        let config = BuildConfig::new(
            &self.location,
            self.triplet(),
            self.host.triplet(),
            self.android,
        )
        .write(build_root)?;
        self.write_tag()?;
        self.state = next;
        Ok(config)
    }

    /// Replace the tag file in one rename so readers never see a partial tag
    fn write_tag(&self) -> PrebuildResult<()> {
        let base = &self.location.base_path;
        let tag = self.key.to_string();
        info!("Writing tag {} to {}", tag, self.location.tag_path.display());

        fs::create_dir_all(base)
            .map_err(|e| PrebuildError::io(format!("creating {}", base.display()), e))?;
        let mut tmp = tempfile::NamedTempFile::new_in(base)
            .map_err(|e| PrebuildError::io("creating temporary tag file", e))?;
        tmp.write_all(tag.as_bytes())
            .map_err(|e| PrebuildError::io("writing temporary tag file", e))?;
        tmp.persist(&self.location.tag_path).map_err(|e| {
            PrebuildError::io(
                format!("replacing {}", self.location.tag_path.display()),
                e.error,
            )
        })?;
        Ok(())
    }
}

/// Remove a directory tree, or the symlink standing in for one
fn remove_tree_or_link(path: &Path) -> PrebuildResult<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(PrebuildError::io(format!("inspecting {}", path.display()), e)),
    };
    let result = if meta.file_type().is_symlink() {
        // Directory symlinks on windows are removed as directories.
        fs::remove_file(path).or_else(|_| fs::remove_dir(path))
    } else if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| PrebuildError::io(format!("removing {}", path.display()), e))
}

/// Recursively copy `src` into a new directory `dst`
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> PrebuildResult<()> {
    if !src.is_dir() {
        return Err(PrebuildError::missing(src, "recipe directory"));
    }
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| {
            PrebuildError::Internal(format!("walking {}: {}", src.display(), e))
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| PrebuildError::Internal(e.to_string()))?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| PrebuildError::io(format!("creating {}", target.display()), e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| {
                PrebuildError::io(format!("copying {}", entry.path().display()), e)
            })?;
        }
    }
    Ok(())
}
