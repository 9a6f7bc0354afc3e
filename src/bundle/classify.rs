//! Packaging role of each SDK file
//!
//! Pure functions of the path relative to the SDK root, always with `/`
//! separators.

use crate::error::{PrebuildError, PrebuildResult};
use serde::Serialize;
use std::path::PathBuf;

/// Directory holding framework libraries
pub const FRAMEWORK_LIB_DIR: &str = "lib/";
/// Directory holding Java archives
pub const JAR_DIR: &str = "jar/";
/// Prefix of asset staging paths understood by the packaging step
pub const ASSET_STAGING_PREFIX: &str = "--Added-by-androiddeployqt--";

const NATIVE_LIB_SUFFIX: &str = ".so";
const FRAMEWORK_PRODUCT_PREFIX: &str = "Qt5";

/// How a file is packaged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum FileRole {
    /// Loaded by name at runtime
    FrameworkLib { product: String },
    /// Copied verbatim under a flattened name
    BundledLib,
    Jar,
    Asset { staging_path: String },
}

/// A file of the closure with its computed packaging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub source_path: PathBuf,
    pub relative_path: String,
    pub role: FileRole,
    /// Path below the role's destination directory
    pub destination_name: String,
}

/// Classify one relative path into its role and destination name
pub fn classify(relative: &str) -> PrebuildResult<(FileRole, String)> {
    if relative.ends_with(NATIVE_LIB_SUFFIX) {
        if let Some(rest) = relative.strip_prefix(FRAMEWORK_LIB_DIR) {
            let file = rest.rsplit('/').next().unwrap_or(rest);
            let product = framework_product(file).ok_or_else(|| PrebuildError::Naming {
                file: relative.to_string(),
            })?;
            return Ok((
                FileRole::FrameworkLib {
                    product: product.to_string(),
                },
                file.to_string(),
            ));
        }
        return Ok((FileRole::BundledLib, flattened_lib_name(relative)));
    }

    if let Some(rest) = relative.strip_prefix(JAR_DIR) {
        return Ok((FileRole::Jar, rest.to_string()));
    }

    Ok((
        FileRole::Asset {
            staging_path: format!("{}/{}", ASSET_STAGING_PREFIX, relative),
        },
        relative.to_string(),
    ))
}

/// Product name of `lib<Qt5...>.so`, or `None` for any other name
fn framework_product(file: &str) -> Option<&str> {
    file.strip_prefix("lib")?
        .strip_suffix(NATIVE_LIB_SUFFIX)
        .filter(|product| product.starts_with(FRAMEWORK_PRODUCT_PREFIX))
}

/// Unique flat file name for a native library outside `lib/`
pub fn flattened_lib_name(relative: &str) -> String {
    format!("lib{}", relative.replace('/', "_"))
}
