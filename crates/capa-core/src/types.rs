//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Row identifiers are assigned by the store and always start at 1.
    #[error("{field} must be a positive integer, got {value}")]
    InvalidId { field: &'static str, value: String },

    /// The percentage could not be parsed.
    #[error("invalid percentage: {value}")]
    InvalidPercentage { value: String },
}

/// Generates a validated integer ID newtype with common trait implementations.
macro_rules! define_row_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: i64) -> Result<Self, ValidationError> {
                if id <= 0 {
                    return Err(ValidationError::InvalidId {
                        field: $field_name,
                        value: id.to_string(),
                    });
                }
                Ok(Self(id))
            }

            /// Returns the raw row ID.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = ValidationError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let id: i64 = s.trim().parse().map_err(|_| ValidationError::InvalidId {
                    field: $field_name,
                    value: s.to_string(),
                })?;
                Self::new(id)
            }
        }
    };
}

define_row_id!(
    /// A validated resource (person) identifier.
    ResourceId, "resource ID"
);

define_row_id!(
    /// A validated allocation identifier.
    AllocationId, "allocation ID"
);

define_row_id!(
    /// A validated project identifier.
    ProjectId, "project ID"
);

define_row_id!(
    /// A validated role identifier.
    RoleId, "role ID"
);

define_row_id!(
    /// A validated vendor identifier.
    VendorId, "vendor ID"
);

/// Share of a resource's capacity committed by an allocation.
///
/// `Untracked` means the resource participates in the project but its capacity
/// is not measured (e.g. a Scrum Master). It is distinct from `Percent(0)`.
/// The engine never clamps `Percent` values; only sums are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "Option<i64>")]
pub enum Percentage {
    #[default]
    Untracked,
    Percent(i64),
}

impl Percentage {
    /// Converts the nullable storage representation.
    pub const fn from_option(value: Option<i64>) -> Self {
        match value {
            Some(n) => Self::Percent(n),
            None => Self::Untracked,
        }
    }

    /// Returns the tracked value, if any.
    pub const fn value(self) -> Option<i64> {
        match self {
            Self::Percent(n) => Some(n),
            Self::Untracked => None,
        }
    }

    /// Amount this percentage adds to a capacity sum. Untracked counts as zero.
    pub const fn contribution(self) -> i64 {
        match self {
            Self::Percent(n) => n,
            Self::Untracked => 0,
        }
    }

    pub const fn is_tracked(self) -> bool {
        matches!(self, Self::Percent(_))
    }
}

/// Sums percentages exactly and clamps the result to the `i64` range.
///
/// Callers may supply any integer, so a plain `i64` sum can overflow. A clamped
/// total keeps its sign and stays on the same side of any capacity limit.
pub(crate) fn clamped_total(values: impl IntoIterator<Item = i64>) -> i64 {
    let sum: i128 = values.into_iter().map(i128::from).sum();
    i64::try_from(sum).unwrap_or(if sum < 0 { i64::MIN } else { i64::MAX })
}

impl From<Option<i64>> for Percentage {
    fn from(value: Option<i64>) -> Self {
        Self::from_option(value)
    }
}

impl From<Percentage> for Option<i64> {
    fn from(value: Percentage) -> Self {
        value.value()
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(n) => f.pad(&format!("{n}%")),
            Self::Untracked => f.pad("untracked"),
        }
    }
}

impl std::str::FromStr for Percentage {
    type Err = ValidationError;

    /// Accepts `40`, `40%`, or `untracked`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("untracked") {
            return Ok(Self::Untracked);
        }
        trimmed
            .trim_end_matches('%')
            .parse()
            .map(Self::Percent)
            .map_err(|_| ValidationError::InvalidPercentage {
                value: s.to_string(),
            })
    }
}
