//! Build lifecycle against the external build tool
//!
//! ```text
//! cli → build/cmake.rs → cmake (configure, build) / filesystem (cleanup)
//! ```

pub mod cmake;

#[cfg(all(test, unix))]
#[path = "../../tests/common/stub.rs"]
pub(crate) mod stub;

pub use cmake::{BuildRequest, CMakeDriver, CleanupReport};
