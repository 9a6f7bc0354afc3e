//! Android application bundle assembly
//!
//! Expands the GUI toolkit's root libraries into every file the application
//! needs at runtime, classifies each file by packaging role, writes the
//! `libs.xml` manifest and copies the files into the application module.
//!
//! Nothing is written until every file of the closure has been found on
//! disk.

pub mod classify;
pub mod descriptor;
pub mod manifest;
pub mod packages;
pub mod resolver;
pub mod scanner;

pub use classify::{FileRole, ResolvedFile};
pub use descriptor::DependencyEntry;
pub use manifest::BundleManifest;
pub use resolver::{
    AppLayout, BundleSummary, LibraryDependencyResolver, Resolution, DEFAULT_ROOT_LIBRARIES,
};
