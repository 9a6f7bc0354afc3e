//! `libs.xml` resource document consumed by the Android packaging step
//!
//! Arrays list files in resolver order and are never re-sorted, so an
//! unchanged SDK yields a byte-identical document.

use crate::bundle::classify::{FileRole, ResolvedFile};
use crate::error::{PrebuildError, PrebuildResult};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub const FRAMEWORK_LIBS_ARRAY: &str = "qt_libs";
pub const BUNDLED_LIBS_ARRAY: &str = "bundled_in_lib";
pub const BUNDLED_ASSETS_ARRAY: &str = "bundled_in_assets";

/// Manifest projections of a resolved closure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BundleManifest {
    /// Framework product names
    pub framework_libs: Vec<String>,
    /// `(flattened name, relative path)`
    pub bundled_libs: Vec<(String, String)>,
    /// `(staging path, relative path)`
    pub bundled_assets: Vec<(String, String)>,
}

impl BundleManifest {
    pub fn from_files(files: &[ResolvedFile]) -> Self {
        let mut manifest = Self::default();
        for file in files {
            match &file.role {
                FileRole::FrameworkLib { product } => manifest.framework_libs.push(product.clone()),
                FileRole::BundledLib => manifest
                    .bundled_libs
                    .push((file.destination_name.clone(), file.relative_path.clone())),
                FileRole::Asset { staging_path } => manifest
                    .bundled_assets
                    .push((staging_path.clone(), file.relative_path.clone())),
                FileRole::Jar => {}
            }
        }
        manifest
    }

    /// Render the resource document
    pub fn to_xml(&self) -> PrebuildResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        emit(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
        )?;
        emit(&mut writer, Event::Start(BytesStart::new("resources")))?;

        let pairs = |items: &[(String, String)]| -> Vec<String> {
            items.iter().map(|(a, b)| format!("{}:{}", a, b)).collect()
        };
        write_array(&mut writer, FRAMEWORK_LIBS_ARRAY, &self.framework_libs)?;
        write_array(&mut writer, BUNDLED_LIBS_ARRAY, &pairs(&self.bundled_libs))?;
        write_array(&mut writer, BUNDLED_ASSETS_ARRAY, &pairs(&self.bundled_assets))?;

        emit(&mut writer, Event::End(BytesEnd::new("resources")))?;
        let mut xml = String::from_utf8(writer.into_inner())
            .map_err(|e| PrebuildError::Internal(format!("manifest is not UTF-8: {}", e)))?;
        xml.push('\n');
        Ok(xml)
    }

    /// Replace the manifest at `path` in one rename
    pub fn write(&self, path: &Path) -> PrebuildResult<()> {
        let xml = self.to_xml()?;
        let parent = path
            .parent()
            .ok_or_else(|| PrebuildError::Internal(format!("{} has no parent", path.display())))?;
        fs::create_dir_all(parent)
            .map_err(|e| PrebuildError::io(format!("creating {}", parent.display()), e))?;

        info!("Writing bundle manifest to {}", path.display());
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| PrebuildError::io("creating temporary manifest", e))?;
        tmp.write_all(xml.as_bytes())
            .map_err(|e| PrebuildError::io("writing temporary manifest", e))?;
        tmp.persist(path)
            .map_err(|e| PrebuildError::io(format!("replacing {}", path.display()), e.error))?;
        Ok(())
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> PrebuildResult<()> {
    writer
        .write_event(event)
        .map_err(|e| PrebuildError::Internal(format!("rendering manifest: {}", e)))
}

fn write_array(writer: &mut Writer<Vec<u8>>, name: &str, items: &[String]) -> PrebuildResult<()> {
    let mut array = BytesStart::new("array");
    array.push_attribute(("name", name));
    if items.is_empty() {
        return emit(writer, Event::Empty(array));
    }

    emit(writer, Event::Start(array))?;
    for item in items {
        emit(writer, Event::Start(BytesStart::new("item")))?;
        emit(writer, Event::Text(BytesText::new(item)))?;
        emit(writer, Event::End(BytesEnd::new("item")))?;
    }
    emit(writer, Event::End(BytesEnd::new("array")))
}
