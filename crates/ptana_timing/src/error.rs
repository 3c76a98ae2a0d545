//! Error types for report scanning and path analysis.

/// Fatal problems while reading a timing report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// An I/O error occurred while reading the report.
    #[error("failed to read report: {0}")]
    Io(#[from] std::io::Error),

    /// A recognized row did not carry the value it must carry.
    #[error("report format error (ln:{line}): {reason}")]
    Format {
        /// 1-based report line.
        line: usize,
        /// What was wrong with the row.
        reason: String,
    },
}

/// Misuse of the analysis queries on a parsed report.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// The path index is out of range.
    #[error("path {pid} does not exist ({count} paths loaded)")]
    NoSuchPath {
        /// The requested index.
        pid: usize,
        /// Number of parsed paths.
        count: usize,
    },

    /// The path lacks what the query needs.
    #[error("path {pid} has no {missing}")]
    Precondition {
        /// The requested index.
        pid: usize,
        /// The missing part of the path.
        missing: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format_error() {
        let err = ReportError::Format {
            line: 42,
            reason: "missing slack value".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "report format error (ln:42): missing slack value"
        );
    }

    #[test]
    fn display_analysis_errors() {
        let err = AnalysisError::NoSuchPath { pid: 3, count: 2 };
        assert_eq!(err.to_string(), "path 3 does not exist (2 paths loaded)");
        let err = AnalysisError::Precondition {
            pid: 0,
            missing: "capture clock path",
        };
        assert_eq!(err.to_string(), "path 0 has no capture clock path");
    }
}
