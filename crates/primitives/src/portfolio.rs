//! Portfolio identifier.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Identifier of a test portfolio, e.g. `SMALL LoBM` or `ME2 BM4`.
///
/// Ordering is lexicographic on the label, which is how result tables are
/// sorted.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct PortfolioId(String);

impl PortfolioId {
    /// Create a new portfolio identifier.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PortfolioId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for PortfolioId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
