//! Materialized records the engine works with.
//!
//! The host loads these fully (roles included) before calling the engine, so
//! analysis never triggers further retrieval.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::range::DateRange;
use crate::types::{AllocationId, Percentage, ProjectId, ResourceId, RoleId, VendorId};

/// A job function. Only capacity-requiring roles are subject to percentage checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub requires_capacity: bool,
}

/// Vendor reference, by identity and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorRef {
    pub id: VendorId,
    pub name: String,
}

/// Project reference, by identity and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: ProjectId,
    pub name: String,
}

/// A person whose capacity is allocated to projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,

    /// All role assignments. May be empty.
    pub roles: Vec<Role>,

    /// Last day of the contract. No allocation may start after it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_end: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorRef>,
}

impl Resource {
    /// True when any assigned role requires capacity tracking.
    pub fn requires_capacity(&self) -> bool {
        self.roles.iter().any(|role| role.requires_capacity)
    }

    /// Role names joined for display, e.g. `"Developer, QA"`.
    pub fn role_names(&self) -> String {
        self.roles
            .iter()
            .map(|role| role.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A stored commitment of a resource to a project over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub resource_id: ResourceId,
    pub project: ProjectRef,
    pub range: DateRange,
    pub percentage: Percentage,
    pub created_at: DateTime<Utc>,
}

/// A validated allocation about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationDraft {
    pub resource_id: ResourceId,
    pub project_id: ProjectId,
    pub range: DateRange,
    pub percentage: Percentage,
}

/// A computed sub-range with the total percentage committed during it.
///
/// Produced by analysis for error breakdowns and soft warnings; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_percentage: i64,
    pub project_names: Vec<String>,
}
