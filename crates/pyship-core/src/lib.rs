//! Core types and configuration for pyship.
//!
//! This crate defines the `pyship.toml` schema ([`PyshipConfig`]), the
//! dependency manifest ([`Manifest`]), the build-context snapshot
//! ([`SourceTree`]), the [`FileSystem`] capability the pipeline writes
//! through, and shared error types.

pub mod config;
pub mod error;
pub mod fs;
pub mod manifest;
pub mod source;

pub use config::{AppConfig, ImageConfig, PyshipConfig, PythonConfig};
pub use error::{Error, Result};
pub use fs::{DiskFs, FileSystem, MemoryFs};
pub use manifest::{Manifest, Requirement};
pub use source::{SourceFile, SourceTree};
