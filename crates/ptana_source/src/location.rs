//! File identifiers and line locations.

use serde::{Deserialize, Serialize};

/// Opaque identifier for a text loaded into the [`SourceDb`](crate::SourceDb).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// Identifier used for locations that do not belong to any loaded file.
    pub const DUMMY: FileId = FileId(u32::MAX);

    /// Creates a `FileId` from a raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index of this `FileId`.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// A 1-based line within a loaded file.
///
/// Reports and rules files are line oriented, so a line is the finest
/// granularity any diagnostic needs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Location {
    /// The file the line belongs to.
    pub file: FileId,
    /// 1-based line number, or 0 when the whole file is meant.
    pub line: usize,
}

impl Location {
    /// A location that points nowhere.
    pub const DUMMY: Location = Location {
        file: FileId::DUMMY,
        line: 0,
    };

    /// Creates a location at `line` of `file`.
    pub fn new(file: FileId, line: usize) -> Self {
        Self { file, line }
    }

    /// Returns `true` if this location does not refer to a loaded file.
    pub fn is_dummy(&self) -> bool {
        self.file == FileId::DUMMY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_location_is_detected() {
        assert!(Location::DUMMY.is_dummy());
        assert!(!Location::new(FileId::from_raw(0), 3).is_dummy());
    }

    #[test]
    fn location_serializes_with_line() {
        let loc = Location::new(FileId::from_raw(2), 17);
        let json = serde_json::to_string(&loc).unwrap();
        assert!(json.contains("\"line\":17"));
        let back: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(back, loc);
    }
}
