//! Full-match regular expressions.

use regex::{Captures, Regex};
use std::fmt;

/// A regular expression that only matches whole strings.
///
/// The user-written source is kept for display; the compiled form is anchored
/// at both ends so that `is_match` behaves like a full match.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    anchored: Regex,
}

impl Pattern {
    /// Compiles `source` as a full-match pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let anchored = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            anchored,
        })
    }

    /// Returns the pattern as written in the rules file.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the whole of `text` matches.
    pub fn is_full_match(&self, text: &str) -> bool {
        self.anchored.is_match(text)
    }

    /// Returns the capture groups of a full match of `text`.
    pub fn full_captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.anchored.captures(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
