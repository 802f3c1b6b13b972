//! Scope ranks of the configuration hierarchy.

use std::fmt;
use std::str::FromStr;

use super::PathError;

/// Hierarchy level a configuration value is bound to.
///
/// Scopes form a strict hierarchy of ranks: [`Scope::Default`] (rank 0) is
/// the single global level, [`Scope::Group`] (rank 1) covers a named group of
/// leaves and [`Scope::Leaf`] (rank 2) is the most specific level. Resolution
/// walks from the most specific rank down to the default.
///
/// The derived ordering follows rank order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    /// Global fallback level. Carries the fixed id 0.
    #[default]
    Default,
    /// A named group of leaves (a "website"). Carries a positive id.
    Group,
    /// A single leaf (a "store"). Carries a positive id.
    Leaf,
}

impl Scope {
    /// Numeric rank of this scope, 0 being the broadest.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Scope::Default => 0,
            Scope::Group => 1,
            Scope::Leaf => 2,
        }
    }

    /// Canonical name used in fully-qualified keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Scope::Default => "default",
            Scope::Group => "group",
            Scope::Leaf => "leaf",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = PathError;

    fn from_str(name: &str) -> Result<Self, PathError> {
        match name {
            "default" => Ok(Scope::Default),
            "group" => Ok(Scope::Group),
            "leaf" => Ok(Scope::Leaf),
            other => Err(PathError::UnknownScope(other.to_string())),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
