//! Source text management for rules files and timing reports.
//!
//! This crate provides the [`SourceDb`] that owns every loaded text (plain or
//! gzip-compressed), the line-indexed [`SourceFile`], and the [`FileId`] /
//! [`Location`] pair used to point diagnostics and errors back at a report line.

#![warn(missing_docs)]

pub mod location;
pub mod source_db;
pub mod source_file;

pub use location::{FileId, Location};
pub use source_db::SourceDb;
pub use source_file::SourceFile;
