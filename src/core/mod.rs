//! Core utilities and common types for relconv.

pub mod error;

pub use error::{Error, Result};
