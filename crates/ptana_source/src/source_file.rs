//! Line-indexed text of a single rules file or timing report.

use crate::location::{FileId, Location};
use std::path::PathBuf;

/// A text loaded into the [`SourceDb`](crate::SourceDb).
///
/// Line-start offsets are computed once so that a scan can jump straight to
/// the first line of a requested range without walking the whole report.
pub struct SourceFile {
    /// The identifier of this file within its database.
    pub id: FileId,
    /// The filesystem path (or a synthetic name for in-memory text).
    pub path: PathBuf,
    /// The full decoded text.
    pub content: String,
    /// Byte offset of each line start; the first entry is always 0.
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Creates a new `SourceFile`, indexing its line starts.
    pub fn new(id: FileId, path: PathBuf, content: String) -> Self {
        let line_starts = compute_line_starts(&content);
        Self {
            id,
            path,
            content,
            line_starts,
        }
    }

    /// Returns the number of lines in the file.
    ///
    /// A trailing newline does not open an extra line.
    pub fn line_count(&self) -> usize {
        match self.line_starts.last() {
            Some(&last) if last == self.content.len() && self.line_starts.len() > 1 => {
                self.line_starts.len() - 1
            }
            Some(_) => self.line_starts.len(),
            None => 0,
        }
    }

    /// Returns the text of the 1-based line `line`, without its terminator.
    pub fn line(&self, line: usize) -> Option<&str> {
        if line == 0 || line > self.line_count() {
            return None;
        }
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map(|&next| next - 1)
            .unwrap_or(self.content.len());
        let text = &self.content[start..end];
        Some(text.strip_suffix('\r').unwrap_or(text))
    }

    /// Iterates over `(line_number, text)` pairs starting at the 1-based `first` line.
    ///
    /// A `first` of 0 is treated as 1.
    pub fn lines_from(&self, first: usize) -> impl Iterator<Item = (usize, &str)> + '_ {
        let first = first.max(1);
        (first..=self.line_count()).filter_map(move |ln| self.line(ln).map(|text| (ln, text)))
    }

    /// Returns the location of line `line` in this file.
    pub fn location(&self, line: usize) -> Location {
        Location::new(self.id, line)
    }
}

fn compute_line_starts(content: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, byte) in content.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}
