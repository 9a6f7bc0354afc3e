//! CLI command implementations

pub mod key;
pub mod provision;
pub mod status;

pub use key::execute as key;
pub use provision::execute as provision;
pub use status::execute as status;
