// Shared utilities
pub mod error;
pub mod fs_utils;
pub mod logging;
pub mod version;
