//! Helpers shared by the end-to-end tests

#[cfg(unix)]
pub mod stub;
