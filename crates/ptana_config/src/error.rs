//! Error types for rules-file compilation.

/// Errors that can occur while loading or compiling a rules file.
///
/// A failed compilation never yields a partial [`RuleSet`](crate::RuleSet).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the rules file.
    #[error("failed to read rules file: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be compiled.
    #[error("config syntax error (ln:{line}): {reason}")]
    Syntax {
        /// 1-based line number of the offending line.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },
}

impl ConfigError {
    /// Returns the offending line for syntax errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            ConfigError::Syntax { line, .. } => Some(*line),
            ConfigError::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_syntax_error() {
        let err = ConfigError::Syntax {
            line: 12,
            reason: "unknown ckp type 'x'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "config syntax error (ln:12): unknown ckp type 'x'"
        );
        assert_eq!(err.line(), Some(12));
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::from(io_err);
        assert!(err.to_string().starts_with("failed to read rules file:"));
        assert_eq!(err.line(), None);
    }
}
