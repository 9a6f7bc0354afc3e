//! Runtime-script import discovery
//!
//! Runs the SDK's import scanner over the application's script tree and
//! keeps the SDK modules it resolves to. Modules inside the application's
//! own tree are packaged elsewhere.

use crate::cache::location::HostPlatform;
use crate::error::{PrebuildError, PrebuildResult};
use crate::toolbox::{run_checked, CommandSpec, Toolbox};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One record of the scanner's JSON output
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ImportEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Absent when the import resolved in none of the import paths
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Scanner executable inside the SDK
pub fn scanner_path(sdk_root: &Path, host: HostPlatform) -> PathBuf {
    sdk_root
        .join("bin")
        .join(format!("qmlimportscanner{}", host.exe_suffix()))
}

/// Parse the scanner's stdout
pub fn parse_output(stdout: &str) -> PrebuildResult<Vec<ImportEntry>> {
    Ok(serde_json::from_str(stdout)?)
}

/// Run the scanner and return every SDK path outside `app_root`
pub fn scan(
    toolbox: &dyn Toolbox,
    sdk_root: &Path,
    app_root: &Path,
    host: HostPlatform,
) -> PrebuildResult<Vec<PathBuf>> {
    let scanner = scanner_path(sdk_root, host);
    if !scanner.is_file() {
        return Err(PrebuildError::missing(&scanner, "import scanner"));
    }

    let app_root = canonical_or_self(app_root);
    let command = CommandSpec::new(&scanner)
        .arg("-rootPath")
        .arg(&app_root)
        .arg("-importPath")
        .arg(sdk_root.join("qml"));
    let stdout = run_checked(toolbox, &command)?;
    let entries = parse_output(&stdout)?;
    debug!("Import scanner reported {} entries", entries.len());

    Ok(external_imports(&entries, &app_root))
}

/// Keep existing import paths that lie outside `app_root`, in report order
pub fn external_imports(entries: &[ImportEntry], app_root: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for entry in entries {
        let Some(path) = &entry.path else {
            warn!(
                "Import could not be resolved in any of the import paths: {}",
                entry.name
            );
            continue;
        };
        let Ok(path) = fs::canonicalize(path) else {
            debug!("Skipping nonexistent import path {}", path.display());
            continue;
        };
        if path.starts_with(app_root) {
            continue;
        }
        paths.push(path);
    }
    paths
}

fn canonical_or_self(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
