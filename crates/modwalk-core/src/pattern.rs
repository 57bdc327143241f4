//! Single-wildcard string patterns.
//!
//! Used for ignore lists, asset tagging (`prefetch`/`editable`/`stylesheet`)
//! and for expanding wildcard export targets against a package's files.
//! A pattern holds at most one `*`; anything else never matches.

use tracing::debug;

/// Count the `*` characters in `s`.
#[must_use]
pub fn star_count(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'*').count()
}

/// A parsed pattern with zero or one wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern<'a> {
    /// No `*`: matches only the identical string.
    Exact(&'a str),
    /// One `*`: matches `prefix`, anything, `suffix`.
    Wildcard { prefix: &'a str, suffix: &'a str },
}

impl<'a> Pattern<'a> {
    /// Parse a pattern. Returns `None` when it contains more than one `*`.
    #[must_use]
    pub fn parse(pattern: &'a str) -> Option<Self> {
        match star_count(pattern) {
            0 => Some(Self::Exact(pattern)),
            1 => {
                let (prefix, suffix) = pattern.split_once('*')?;
                Some(Self::Wildcard { prefix, suffix })
            }
            _ => None,
        }
    }

    /// Check whether `subject` matches.
    ///
    /// For wildcards the prefix and suffix may not overlap inside `subject`:
    /// `"a*a"` does not match `"a"`.
    #[must_use]
    pub fn matches(&self, subject: &str) -> bool {
        match *self {
            Self::Exact(exact) => exact == subject,
            Self::Wildcard { prefix, suffix } => {
                subject.len() >= prefix.len() + suffix.len()
                    && subject.starts_with(prefix)
                    && subject.ends_with(suffix)
            }
        }
    }

    /// Return the part of `subject` matched by the `*`.
    ///
    /// Exact patterns capture the empty string on a match.
    #[must_use]
    pub fn capture<'s>(&self, subject: &'s str) -> Option<&'s str> {
        if !self.matches(subject) {
            return None;
        }
        match *self {
            Self::Exact(_) => Some(""),
            Self::Wildcard { prefix, suffix } => {
                Some(&subject[prefix.len()..subject.len() - suffix.len()])
            }
        }
    }
}

/// Match `subject` against `pattern`.
///
/// Patterns with more than one `*` are invalid and never match.
#[must_use]
pub fn matches(pattern: &str, subject: &str) -> bool {
    if let Some(parsed) = Pattern::parse(pattern) {
        parsed.matches(subject)
    } else {
        debug!(pattern, subject, "Ignoring pattern with more than one wildcard");
        false
    }
}

/// Check whether any pattern in `patterns` matches `subject`.
#[must_use]
pub fn matches_any<S: AsRef<str>>(patterns: &[S], subject: &str) -> bool {
    patterns.iter().any(|p| matches(p.as_ref(), subject))
}
