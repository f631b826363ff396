//! Provider-neutral instance sizes accepted in scenario files.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Instance size as written in a scenario file.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Size {
    /// Smallest shared-core size.
    Micro,
    /// One small dedicated core.
    Tiny,
    /// Two cores.
    Small,
    /// Three to four cores.
    Medium,
    /// Four or more cores.
    Large,
    /// General purpose size for heavier workloads.
    ExtraLarge,
}

/// Raised when a size label is not part of the enumerated set.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unsupported size '{0}'")]
pub struct UnknownSize(pub String);

impl Size {
    /// Every supported size in ascending order.
    pub const ALL: [Self; 6] = [
        Self::Micro,
        Self::Tiny,
        Self::Small,
        Self::Medium,
        Self::Large,
        Self::ExtraLarge,
    ];

    /// Returns the label used in scenario files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Micro => "micro",
            Self::Tiny => "tiny",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::ExtraLarge => "extra-large",
        }
    }

    /// Returns the labels of every supported size.
    pub fn labels() -> impl Iterator<Item = &'static str> {
        Self::ALL.into_iter().map(Self::as_str)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Size {
    type Err = UnknownSize;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == value)
            .ok_or_else(|| UnknownSize(value.to_owned()))
    }
}
