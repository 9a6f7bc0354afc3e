//! Auxiliary prebuilt Android SDKs

use crate::catalog::PackageSpec;
use crate::error::{PrebuildError, PrebuildResult};
use crate::fetch::download_and_extract;
use crate::toolbox::Toolbox;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fetch every package not yet present below `packages_root`.
///
/// A package directory only appears once fully extracted, so its presence
/// is enough to skip it.
pub fn fetch_packages(
    toolbox: &dyn Toolbox,
    packages: &[PackageSpec],
    packages_root: &Path,
) -> PrebuildResult<()> {
    for package in packages {
        let dest = packages_root.join(&package.name);
        if dest.is_dir() {
            debug!("Package {} already present", package.name);
            continue;
        }
        download_and_extract(toolbox, package, &dest)?;
    }
    Ok(())
}

/// Copy the shared libraries each package exposes into `jni_dir`.
///
/// Returns the copied destinations in catalog order.
pub fn copy_shared_libs(
    packages: &[PackageSpec],
    packages_root: &Path,
    jni_dir: &Path,
) -> PrebuildResult<Vec<PathBuf>> {
    fs::create_dir_all(jni_dir)
        .map_err(|e| PrebuildError::io(format!("creating {}", jni_dir.display()), e))?;

    let mut copied = Vec::new();
    for package in packages {
        let Some(folder) = &package.shared_lib_subfolder else {
            continue;
        };
        let folder = packages_root.join(&package.name).join(folder);
        let sources = if package.include_libs.is_empty() {
            list_files(&folder)?
        } else {
            package.include_libs.iter().map(|lib| folder.join(lib)).collect()
        };

        for source in sources {
            if !source.is_file() {
                return Err(PrebuildError::missing(
                    &source,
                    format!("shared library of package {}", package.name),
                ));
            }
            let Some(name) = source.file_name() else {
                continue;
            };
            let dest = jni_dir.join(name);
            info!("Copying {}", source.display());
            fs::copy(&source, &dest)
                .map_err(|e| PrebuildError::io(format!("copying {}", source.display()), e))?;
            copied.push(dest);
        }
    }
    Ok(copied)
}

/// Regular files directly inside `folder`, sorted by name
fn list_files(folder: &Path) -> PrebuildResult<Vec<PathBuf>> {
    let entries = fs::read_dir(folder)
        .map_err(|e| PrebuildError::io(format!("listing {}", folder.display()), e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| PrebuildError::io(format!("listing {}", folder.display()), e))?
            .path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
