//! Compiled path patterns.
//!
//! A [`Pattern`] wraps a regular expression and applies the full-span rule:
//! a path matches only when the leftmost-first match covers every byte of
//! it. `/foo` therefore never matches `/foobar`, while `/(.*)` matches any
//! path starting with a slash.

use crate::error::RouteError;
use regex::Regex;
use smallvec::SmallVec;

/// Maximum number of captures kept inline before spilling to the heap.
pub const MAX_INLINE_CAPTURES: usize = 8;

/// Positional captures extracted from a matched path, in group order.
pub type CaptureVec = SmallVec<[String; MAX_INLINE_CAPTURES]>;

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile `source` using regular expression syntax.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] when the regex does not compile.
    pub fn compile(source: &str) -> Result<Self, RouteError> {
        let regex = Regex::new(source).map_err(|source_err| RouteError::InvalidPattern {
            pattern: source.to_string(),
            source: source_err,
        })?;
        Ok(Self { regex })
    }

    /// The pattern text this matcher was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Number of capture groups, not counting the implicit whole-match group.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Whether `path` is matched in full, without extracting captures.
    #[must_use]
    pub fn is_full_match(&self, path: &str) -> bool {
        self.regex
            .find(path)
            .is_some_and(|m| m.start() == 0 && m.end() == path.len())
    }

    /// Match `path` and extract its captures.
    ///
    /// Returns `None` when the pattern does not match or when the leftmost
    /// match leaves part of the path uncovered. Groups that did not take
    /// part in the match are returned as empty strings so that positions
    /// stay stable.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<CaptureVec> {
        let caps = self.regex.captures(path)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != path.len() {
            return None;
        }
        Some(
            caps.iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |g| g.as_str().to_string()))
                .collect(),
        )
    }
}
