//! Build-system configuration document
//!
//! Points the downstream build at the toolchain file and install roots of
//! the current cache location. Host builds also get a guard that aborts
//! configuration when the cached toolchain path drifts from the computed
//! one, which forces a clean build directory.

use crate::cache::location::CacheLocation;
use crate::error::{PrebuildError, PrebuildResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name written into the build root
pub const CONFIG_FILE_NAME: &str = "vcpkg.cmake";

const DRIFT_GUARD: &str = r#"
# If the cached cmake toolchain path is different from the computed one, exit
if(NOT (CMAKE_TOOLCHAIN_FILE_UNCACHED STREQUAL CMAKE_TOOLCHAIN_FILE))
    message(FATAL_ERROR "CMAKE_TOOLCHAIN_FILE has changed, please wipe the build directory and rerun cmake")
endif()
"#;

/// Inputs of the rendered document
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub toolchain_file: PathBuf,
    pub install_root: PathBuf,
    pub tools_dir: PathBuf,
    pub drift_guard: bool,
}

impl BuildConfig {
    pub fn new(location: &CacheLocation, triplet: &str, host_triplet: &str, android: bool) -> Self {
        Self {
            toolchain_file: location.toolchain_file(),
            install_root: location.installed_path(triplet),
            tools_dir: location.installed_path(host_triplet).join("tools"),
            drift_guard: !android,
        }
    }

    /// Render with forward slashes only
    pub fn render(&self) -> String {
        let toolchain = self.toolchain_file.display();
        let mut doc = format!(
            "\nset(CMAKE_TOOLCHAIN_FILE \"{toolchain}\" CACHE FILEPATH \"Toolchain file\")\n\
             set(CMAKE_TOOLCHAIN_FILE_UNCACHED \"{toolchain}\")\n\
             set(VCPKG_INSTALL_ROOT \"{}\")\n\
             set(VCPKG_TOOLS_DIR \"{}\")\n",
            self.install_root.display(),
            self.tools_dir.display(),
        );
        if self.drift_guard {
            doc.push_str(DRIFT_GUARD);
        }
        doc.replace('\\', "/")
    }

    /// Write the document to `<build_root>/vcpkg.cmake`, replacing any
    /// previous contents
    pub fn write(&self, build_root: &Path) -> PrebuildResult<PathBuf> {
        fs::create_dir_all(build_root).map_err(|e| {
            PrebuildError::io(format!("creating build root {}", build_root.display()), e)
        })?;
        let path = build_root.join(CONFIG_FILE_NAME);
        info!("Writing build config to {}", path.display());
        fs::write(&path, self.render())
            .map_err(|e| PrebuildError::io(format!("writing {}", path.display()), e))?;
        Ok(path)
    }
}
