//! Content-addressed dependency cache
//!
//! A cache location is named after the digest of the recipe overlay, so a
//! changed recipe lands in a new directory and an unchanged one is reused.
//! The `.id` tag inside the location records the last key that was fully
//! provisioned; a missing or different tag means the tree cannot be trusted.
//!
//! # Layout
//!
//! ```text
//! <cache base>/
//! ├── 1a2b3c4d.lock          # SingletonLock for the location
//! ├── 1a2b3c4d/              # host cache
//! │   ├── .id                # tag, "<digest>_<format version>"
//! │   ├── .vcpkg-root        # marker from the toolchain archive
//! │   ├── vcpkg              # package-manager executable
//! │   ├── ports/             # copy of the recipe overlay
//! │   └── installed/<triplet>/
//! └── android/
//!     └── 1a2b3c4d/          # Android cache, same layout plus android/<package>
//! ```

pub mod buildconfig;
pub mod key;
pub mod location;
pub mod repo;
pub mod state;

pub use buildconfig::BuildConfig;
pub use key::{CacheKey, FORMAT_VERSION};
pub use location::{CacheLocation, HostPlatform, ANDROID_TRIPLET};
pub use repo::{AssessFlags, DependencyCache};
pub use state::{CacheState, FreshReason, StaleReason, Staleness};
