//! Prebuild - native dependency provisioning
//!
//! Provisions third-party native libraries through an external package
//! manager into a content-addressed cache, and for Android targets
//! assembles the GUI toolkit's runtime libraries into the application
//! bundle.

pub mod bundle;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod hash;
pub mod lock;
pub mod pipeline;
pub mod settings;
pub mod toolbox;
pub mod ui;

pub use error::{PrebuildError, PrebuildResult};
