//! Errors returned by the allocation lifecycle.

use std::error::Error as StdError;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::model::OverlapPeriod;
use crate::range::DateRange;
use crate::service::FULL_CAPACITY;

/// Kind of record a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Resource,
    Allocation,
    Project,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resource => "Resource",
            Self::Allocation => "Allocation",
            Self::Project => "Project",
        };
        f.write_str(name)
    }
}

/// Which lifecycle operation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
}

/// A write that would push a resource above full capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityExceeded {
    pub operation: Operation,

    /// Percentage requested by the rejected write.
    pub requested_percentage: i64,

    /// Total the resource would reach during `window`.
    pub max_total_percentage: i64,

    /// Existing commitment during `window`, excluding the request.
    pub existing_percentage: i64,

    /// The earliest sub-period reaching `max_total_percentage`.
    pub window: DateRange,

    /// Per sub-period breakdown over the requested range.
    pub overlapping_periods: Vec<OverlapPeriod>,
}

impl CapacityExceeded {
    /// Room left during the worst window. Zero or negative when already full.
    pub const fn remaining_percentage(&self) -> i64 {
        FULL_CAPACITY.saturating_sub(self.existing_percentage)
    }
}

impl fmt::Display for CapacityExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            Operation::Create => write!(f, "Cannot allocate {}%", self.requested_percentage)?,
            Operation::Update => write!(f, "Cannot update to {}%", self.requested_percentage)?,
        }
        write!(
            f,
            ". Resource would be at {}% during overlapping period ({} - {})",
            self.max_total_percentage,
            self.window.start().format("%b %d"),
            self.window.end().format("%b %d"),
        )
    }
}

impl StdError for CapacityExceeded {}

/// Why a lifecycle operation did not complete.
///
/// Every variant except [`LifecycleError::Store`] is a deterministic rejection
/// the caller can resolve by adjusting input. No rejected operation writes.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{entity} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("End date must be after start date")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Cannot allocate. Resource contract ended on {}", .contract_end.format("%b %d, %Y"))]
    ContractEnded { contract_end: NaiveDate },

    #[error("Percentage is required for this role")]
    PercentageRequired,

    #[error(transparent)]
    CapacityExceeded(Box<CapacityExceeded>),

    /// The backing store failed.
    #[error("storage error: {0}")]
    Store(#[source] Box<dyn StdError + Send + Sync>),
}

impl LifecycleError {
    /// Wraps a store failure.
    pub fn store<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }

    pub(crate) const fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// True for domain rejections, false for storage failures.
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Store(_))
    }

    /// The capacity breakdown, when this is a capacity rejection.
    pub fn capacity_exceeded(&self) -> Option<&CapacityExceeded> {
        match self {
            Self::CapacityExceeded(details) => Some(details),
            _ => None,
        }
    }
}
