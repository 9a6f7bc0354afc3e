//! Terminal presentation helpers
//!
//! Progress bars only render in interactive terminals; CI logs get plain
//! lines instead.

mod context;
mod progress;

pub use context::UiContext;
pub use progress::{url_label, DownloadProgress};
