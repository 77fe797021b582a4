//! Article identifier value object

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Store-assigned article identifier
///
/// Identifiers start at 1, increase monotonically and are never reused
/// after a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(u64);

impl ArticleId {
    /// The first identifier handed out by an empty store
    pub const FIRST: Self = Self(1);

    /// Create an identifier from a raw value
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw identifier value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The identifier that follows this one, or `None` once the range is exhausted
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

impl Default for ArticleId {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArticleId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for ArticleId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
