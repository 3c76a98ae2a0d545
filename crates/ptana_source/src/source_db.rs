//! Central database of every text loaded during one invocation.

use crate::location::{FileId, Location};
use crate::source_file::SourceFile;
use flate2::read::GzDecoder;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Owns all loaded rules files and reports and resolves [`Location`]s for
/// diagnostics.
pub struct SourceDb {
    files: Vec<SourceFile>,
}

impl SourceDb {
    /// Creates an empty source database.
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Loads a file from disk and returns its [`FileId`].
    ///
    /// Files with a `.gz` extension are decompressed transparently.
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, io::Error> {
        let content = if path.extension().is_some_and(|ext| ext == "gz") {
            let mut text = String::new();
            GzDecoder::new(std::fs::File::open(path)?).read_to_string(&mut text)?;
            text
        } else {
            std::fs::read_to_string(path)?
        };
        Ok(self.add_source(path.to_path_buf(), content))
    }

    /// Adds a file from an in-memory string.
    ///
    /// The `name` parameter is used as the file path in diagnostics.
    pub fn add_source(&mut self, name: impl Into<PathBuf>, content: String) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        self.files.push(SourceFile::new(id, name.into(), content));
        id
    }

    /// Returns the [`SourceFile`] for the given [`FileId`].
    ///
    /// # Panics
    ///
    /// Panics if the `FileId` was not issued by this database.
    pub fn get_file(&self, id: FileId) -> &SourceFile {
        &self.files[id.as_raw() as usize]
    }

    /// Formats a location as `path:line`, or just `path` for line 0.
    ///
    /// Returns `None` for dummy locations.
    pub fn describe(&self, location: Location) -> Option<String> {
        let file = self.files.get(location.file.as_raw() as usize)?;
        if location.line == 0 {
            Some(file.path.display().to_string())
        } else {
            Some(format!("{}:{}", file.path.display(), location.line))
        }
    }

    /// Returns the text of the line a location points at.
    pub fn line_text(&self, location: Location) -> Option<&str> {
        self.files
            .get(location.file.as_raw() as usize)?
            .line(location.line)
    }
}

impl Default for SourceDb {
    fn default() -> Self {
        Self::new()
    }
}
