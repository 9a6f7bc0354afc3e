//! Transitive closure of the SDK libraries an application loads
//!
//! Starting from the root libraries, each library's descriptor contributes
//! native libraries, bundled directories and jars. A library entry naming
//! another framework library with its own descriptor pulls that library's
//! descriptor in as well. Runtime-script modules come from the import
//! scanner instead of the descriptors.

use crate::bundle::classify::{classify, FileRole, ResolvedFile};
use crate::bundle::descriptor::{self, DependencyEntry};
use crate::bundle::manifest::BundleManifest;
use crate::bundle::scanner;
use crate::cache::location::HostPlatform;
use crate::error::{PrebuildError, PrebuildResult};
use crate::hash;
use crate::toolbox::Toolbox;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Descriptor entries under this prefix are found by the import scanner
pub const RUNTIME_SCRIPT_PREFIX: &str = "qml";

/// Libraries every application bundle starts from
pub const DEFAULT_ROOT_LIBRARIES: &[&str] = &[
    "Qt5Concurrent",
    "Qt5Core",
    "Qt5Gui",
    "Qt5Multimedia",
    "Qt5Network",
    "Qt5OpenGL",
    "Qt5Qml",
    "Qt5Quick",
    "Qt5QuickControls2",
    "Qt5QuickTemplates2",
    "Qt5Script",
    "Qt5ScriptTools",
    "Qt5Svg",
    "Qt5WebChannel",
    "Qt5WebSockets",
    "Qt5Widgets",
    "Qt5XmlPatterns",
    "Qt5AndroidExtras",
    "Qt5WebView",
];

/// Where each role lands inside an Android application module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLayout {
    pub lib_dir: PathBuf,
    pub jar_dir: PathBuf,
    pub asset_dir: PathBuf,
    pub manifest_path: PathBuf,
}

impl AppLayout {
    pub fn new(app_root: &Path) -> Self {
        let main = app_root.join("src").join("main");
        Self {
            lib_dir: main.join("jniLibs").join("arm64-v8a"),
            jar_dir: app_root.join("libs"),
            asset_dir: main.join("assets"),
            manifest_path: main.join("res").join("values").join("libs.xml"),
        }
    }

    /// Final location of a resolved file
    pub fn destination(&self, file: &ResolvedFile) -> PathBuf {
        let dir = match file.role {
            FileRole::FrameworkLib { .. } | FileRole::BundledLib => &self.lib_dir,
            FileRole::Jar => &self.jar_dir,
            FileRole::Asset { .. } => &self.asset_dir,
        };
        dir.join(&file.destination_name)
    }
}

/// Files reachable from the root libraries, before classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Closure {
    /// Absolute paths, deduplicated, in first-seen order
    pub files: Vec<PathBuf>,
    pub permissions: Vec<String>,
    pub features: Vec<String>,
}

impl Closure {
    fn add_file(&mut self, seen: &mut HashSet<PathBuf>, path: PathBuf) {
        if seen.insert(path.clone()) {
            self.files.push(path);
        }
    }
}

/// Classified closure, verified to exist on disk
#[derive(Debug, Clone)]
pub struct Resolution {
    pub files: Vec<ResolvedFile>,
    pub permissions: Vec<String>,
    pub features: Vec<String>,
}

/// Counts reported after a bundle is installed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BundleSummary {
    pub framework_libs: usize,
    pub bundled_libs: usize,
    pub jars: usize,
    pub assets: usize,
    pub permissions: Vec<String>,
    pub features: Vec<String>,
    pub manifest_path: PathBuf,
}

pub struct LibraryDependencyResolver {
    sdk_root: PathBuf,
    roots: Vec<String>,
    host: HostPlatform,
}

impl LibraryDependencyResolver {
    pub fn new(sdk_root: &Path, roots: Vec<String>, host: HostPlatform) -> Self {
        Self {
            sdk_root: fs::canonicalize(sdk_root).unwrap_or_else(|_| sdk_root.to_path_buf()),
            roots,
            host,
        }
    }

    pub fn sdk_root(&self) -> &Path {
        &self.sdk_root
    }

    /// Walk the descriptor graph from the root libraries.
    ///
    /// A root whose library file is absent is not part of this SDK build and
    /// is skipped.
    pub fn collect(&self) -> PrebuildResult<Closure> {
        let sdk = &self.sdk_root;
        let mut closure = Closure::default();
        let mut seen_files = HashSet::new();
        let mut visited = HashSet::new();
        let mut queue: VecDeque<String> = self.roots.iter().cloned().collect();

        while let Some(name) = queue.pop_front() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let lib_file = framework_lib_path(sdk, &name);
            if !lib_file.exists() {
                debug!("Skipping {}: {} not in SDK", name, lib_file.display());
                continue;
            }
            closure.add_file(&mut seen_files, lib_file);

            let descriptor_file = descriptor::descriptor_path(sdk, &name);
            if !descriptor_file.is_file() {
                continue;
            }
            for entry in descriptor::load(&descriptor_file)? {
                let bundled_jar = entry.is_bundled_jar();
                match entry {
                    DependencyEntry::Lib(relative) | DependencyEntry::Bundled(relative) => {
                        if relative.starts_with(RUNTIME_SCRIPT_PREFIX) {
                            continue;
                        }
                        if let Some(dependency) = framework_dependency(&relative) {
                            if !visited.contains(dependency)
                                && descriptor::descriptor_path(sdk, dependency).is_file()
                            {
                                queue.push_back(dependency.to_string());
                            }
                        }
                        for file in expand(&sdk.join(&relative))? {
                            closure.add_file(&mut seen_files, file);
                        }
                    }
                    DependencyEntry::Jar { path, .. } => {
                        if bundled_jar {
                            closure.add_file(&mut seen_files, sdk.join(path));
                        }
                    }
                    DependencyEntry::Permission(permission) => {
                        push_unique(&mut closure.permissions, permission)
                    }
                    DependencyEntry::Feature(feature) => push_unique(&mut closure.features, feature),
                }
            }
        }

        debug!(
            "Descriptor closure has {} files from {} libraries",
            closure.files.len(),
            visited.len()
        );
        Ok(closure)
    }

    /// Collect, add scanned imports, classify and verify the closure
    pub fn resolve(&self, toolbox: &dyn Toolbox, app_script_root: &Path) -> PrebuildResult<Resolution> {
        let mut closure = self.collect()?;
        let mut seen: HashSet<PathBuf> = closure.files.iter().cloned().collect();
        for import in scanner::scan(toolbox, &self.sdk_root, app_script_root, self.host)? {
            for file in expand(&import)? {
                closure.add_file(&mut seen, file);
            }
        }

        let files = classify_closure(&self.sdk_root, &closure.files)?;
        verify_sources(&files)?;
        info!("Resolved {} bundle files", files.len());
        Ok(Resolution {
            files,
            permissions: closure.permissions,
            features: closure.features,
        })
    }
}

/// Classify every file by its path relative to `sdk_root`
pub fn classify_closure(sdk_root: &Path, files: &[PathBuf]) -> PrebuildResult<Vec<ResolvedFile>> {
    files
        .iter()
        .map(|source| {
            if !source.starts_with(sdk_root) {
                return Err(PrebuildError::Internal(format!(
                    "{} is outside the SDK root {}",
                    source.display(),
                    sdk_root.display()
                )));
            }
            let relative_path = hash::relative_key(sdk_root, source);
            let (role, destination_name) = classify(&relative_path)?;
            Ok(ResolvedFile {
                source_path: source.clone(),
                relative_path,
                role,
                destination_name,
            })
        })
        .collect()
}

/// Every source must exist before anything is written
pub fn verify_sources(files: &[ResolvedFile]) -> PrebuildResult<()> {
    match files.iter().find(|f| !f.source_path.is_file()) {
        Some(missing) => Err(PrebuildError::missing(
            &missing.source_path,
            "dependency file listed by the SDK",
        )),
        None => Ok(()),
    }
}

/// Write the manifest, then copy every file to its destination
pub fn install(resolution: &Resolution, layout: &AppLayout) -> PrebuildResult<BundleSummary> {
    BundleManifest::from_files(&resolution.files).write(&layout.manifest_path)?;

    let mut summary = BundleSummary {
        permissions: resolution.permissions.clone(),
        features: resolution.features.clone(),
        manifest_path: layout.manifest_path.clone(),
        ..Default::default()
    };
    for file in &resolution.files {
        let dest = layout.destination(file);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PrebuildError::io(format!("creating {}", parent.display()), e))?;
        }
        fs::copy(&file.source_path, &dest).map_err(|e| {
            PrebuildError::io(format!("copying {}", file.source_path.display()), e)
        })?;
        match file.role {
            FileRole::FrameworkLib { .. } => summary.framework_libs += 1,
            FileRole::BundledLib => summary.bundled_libs += 1,
            FileRole::Jar => summary.jars += 1,
            FileRole::Asset { .. } => summary.assets += 1,
        }
    }
    info!(
        "Bundled {} framework libs, {} libs, {} jars, {} assets",
        summary.framework_libs, summary.bundled_libs, summary.jars, summary.assets
    );
    Ok(summary)
}

fn framework_lib_path(sdk_root: &Path, name: &str) -> PathBuf {
    sdk_root.join("lib").join(format!("lib{}.so", name))
}

/// Library name of a `lib/lib<Name>.so` entry
fn framework_dependency(relative: &str) -> Option<&str> {
    relative
        .strip_prefix("lib/lib")?
        .strip_suffix(".so")
        .filter(|name| !name.contains('/'))
}

/// A directory expands to every file beneath it. Anything else, present or
/// not, stands for itself so a missing file fails verification.
fn expand(path: &Path) -> PrebuildResult<Vec<PathBuf>> {
    if path.is_dir() {
        hash::recursive_file_list(path)
    } else {
        Ok(vec![path.to_path_buf()])
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}
