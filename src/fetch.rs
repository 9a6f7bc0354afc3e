//! Download, verify and unpack catalog archives

use crate::catalog::PackageSpec;
use crate::error::{PrebuildError, PrebuildResult};
use crate::toolbox::Toolbox;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Fetch `package` into a temporary file, check its digest, then extract it
/// into `dest`.
///
/// Nothing is extracted when the digest does not match. The archive is
/// unpacked into a staging directory beside `dest` and renamed into place,
/// so an interrupted extraction never leaves a partial tree at `dest`.
pub fn download_and_extract(
    toolbox: &dyn Toolbox,
    package: &PackageSpec,
    dest: &Path,
) -> PrebuildResult<()> {
    let url = package.url();
    info!("Fetching {} from {} to {}", package.name, url, dest.display());

    let download = tempfile::Builder::new()
        .prefix("prebuild-")
        .suffix(&format!("-{}", package.file))
        .tempfile()
        .map_err(|e| PrebuildError::io("creating download file", e))?;
    toolbox.fetch(&url, download.path())?;

    let actual = package.hash_algorithm.hash_file(download.path())?;
    if !actual.eq_ignore_ascii_case(&package.checksum) {
        return Err(PrebuildError::Integrity {
            path: download.path().to_path_buf(),
            algorithm: package.hash_algorithm.to_string(),
            expected: package.checksum.clone(),
            actual,
        });
    }
    debug!("Verified {} checksum of {}", package.hash_algorithm, package.file);

    let parent = dest
        .parent()
        .ok_or_else(|| PrebuildError::Internal(format!("{} has no parent", dest.display())))?;
    fs::create_dir_all(parent)
        .map_err(|e| PrebuildError::io(format!("creating {}", parent.display()), e))?;
    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(parent)
        .map_err(|e| {
            PrebuildError::io(format!("creating staging directory in {}", parent.display()), e)
        })?;

    toolbox.extract(download.path(), package.archive_kind, staging.path())?;
    promote(staging.path(), dest)
}

/// Move an extracted tree onto `dest`. An existing `dest` keeps its other
/// entries; entries present in both are replaced.
fn promote(staged: &Path, dest: &Path) -> PrebuildResult<()> {
    if !dest.exists() {
        return fs::rename(staged, dest).map_err(|e| {
            PrebuildError::io(format!("moving extracted tree to {}", dest.display()), e)
        });
    }

    let entries = fs::read_dir(staged)
        .map_err(|e| PrebuildError::io(format!("listing {}", staged.display()), e))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| PrebuildError::io(format!("listing {}", staged.display()), e))?;
        let target = dest.join(entry.file_name());
        if let Ok(meta) = fs::symlink_metadata(&target) {
            let removed = if meta.is_dir() {
                fs::remove_dir_all(&target)
            } else {
                fs::remove_file(&target)
            };
            removed.map_err(|e| PrebuildError::io(format!("replacing {}", target.display()), e))?;
        }
        fs::rename(entry.path(), &target)
            .map_err(|e| PrebuildError::io(format!("moving {}", target.display()), e))?;
    }
    Ok(())
}
