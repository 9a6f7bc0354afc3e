//! Per-library Android dependency descriptors
//!
//! Each SDK library ships `lib/<Name>-android-dependencies.xml`:
//!
//! ```xml
//! <rules>
//!   <dependencies>
//!     <lib name="Qt5Quick">
//!       <depends>
//!         <lib file="lib/libQt5Qml.so"/>
//!         <bundled file="plugins/qmltooling"/>
//!         <jar bundling="1" file="jar/QtAndroid-bundled.jar"/>
//!         <permission name="android.permission.INTERNET"/>
//!       </depends>
//!     </lib>
//!   </dependencies>
//! </rules>
//! ```
//!
//! Only direct children of `dependencies/lib/depends` are edges. Unknown
//! element kinds are ignored.

use crate::error::{PrebuildError, PrebuildResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;

/// Value of the `bundling` attribute that marks a jar for packaging
pub const BUNDLE_ENABLED_MARKER: &str = "1";

const ENTRY_PARENTS: [&[u8]; 3] = [b"dependencies", b"lib", b"depends"];

/// One edge of the library dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyEntry {
    /// Library file or directory, relative to the SDK root
    Lib(String),
    /// Bundled file or directory, relative to the SDK root
    Bundled(String),
    Jar {
        path: String,
        bundling: Option<String>,
    },
    Permission(String),
    Feature(String),
}

impl DependencyEntry {
    /// Whether a jar entry must be copied into the application
    pub fn is_bundled_jar(&self) -> bool {
        matches!(self, Self::Jar { bundling: Some(flag), .. } if flag == BUNDLE_ENABLED_MARKER)
    }
}

/// Descriptor file of library `name` below the SDK root
pub fn descriptor_path(sdk_root: &Path, name: &str) -> std::path::PathBuf {
    sdk_root
        .join("lib")
        .join(format!("{}-android-dependencies.xml", name))
}

/// Read and parse a descriptor file
pub fn load(path: &Path) -> PrebuildResult<Vec<DependencyEntry>> {
    let xml = fs::read_to_string(path)
        .map_err(|e| PrebuildError::io(format!("reading {}", path.display()), e))?;
    parse(&xml, path)
}

/// Parse descriptor XML. `origin` only labels errors.
pub fn parse(xml: &str, origin: &Path) -> PrebuildResult<Vec<DependencyEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut entries = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if is_entry_position(&stack) {
                    if let Some(entry) = entry_from(&e, origin)? {
                        entries.push(entry);
                    }
                }
                stack.push(e.name().as_ref().to_vec());
            }
            Ok(Event::Empty(e)) => {
                if is_entry_position(&stack) {
                    if let Some(entry) = entry_from(&e, origin)? {
                        entries.push(entry);
                    }
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(PrebuildError::descriptor(
                    origin,
                    format!("at byte {}: {}", reader.buffer_position(), e),
                ))
            }
        }
    }

    if !stack.is_empty() {
        return Err(PrebuildError::descriptor(origin, "unexpected end of document"));
    }
    Ok(entries)
}

/// True when the next element is a child of `<root>/dependencies/lib/depends`
fn is_entry_position(stack: &[Vec<u8>]) -> bool {
    stack.len() == ENTRY_PARENTS.len() + 1
        && stack[1..]
            .iter()
            .zip(ENTRY_PARENTS)
            .all(|(name, expected)| name.as_slice() == expected)
}

fn entry_from(element: &BytesStart<'_>, origin: &Path) -> PrebuildResult<Option<DependencyEntry>> {
    let entry = match element.name().as_ref() {
        b"lib" => DependencyEntry::Lib(required(element, "file", origin)?),
        b"bundled" => DependencyEntry::Bundled(required(element, "file", origin)?),
        b"jar" => DependencyEntry::Jar {
            path: required(element, "file", origin)?,
            bundling: optional(element, "bundling", origin)?,
        },
        b"permission" => DependencyEntry::Permission(required(element, "name", origin)?),
        b"feature" => DependencyEntry::Feature(required(element, "name", origin)?),
        _ => return Ok(None),
    };
    Ok(Some(entry))
}

fn optional(element: &BytesStart<'_>, attr: &str, origin: &Path) -> PrebuildResult<Option<String>> {
    let kind = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let found = element
        .try_get_attribute(attr)
        .map_err(|e| PrebuildError::descriptor(origin, format!("<{}>: {}", kind, e)))?;
    match found {
        Some(value) => {
            let value = value
                .unescape_value()
                .map_err(|e| PrebuildError::descriptor(origin, format!("<{}>: {}", kind, e)))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

fn required(element: &BytesStart<'_>, attr: &str, origin: &Path) -> PrebuildResult<String> {
    optional(element, attr, origin)?.ok_or_else(|| {
        PrebuildError::descriptor(
            origin,
            format!(
                "<{}> is missing the '{}' attribute",
                String::from_utf8_lossy(element.name().as_ref()),
                attr
            ),
        )
    })
}
