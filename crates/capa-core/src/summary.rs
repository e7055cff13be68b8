//! Reporting view over a resource's allocations.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Allocation, Resource};
use crate::range::DateRange;
use crate::service::FULL_CAPACITY;
use crate::types::{AllocationId, Percentage, ProjectId, ResourceId, clamped_total};

/// One allocation line in a resource summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectAllocation {
    pub allocation_id: AllocationId,
    pub project_id: ProjectId,
    pub project_name: String,
    pub percentage: Percentage,
    pub role_names: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Aggregated allocations of one resource.
///
/// The default value is the summary of an unknown resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceAllocationSummary {
    pub resource_id: Option<ResourceId>,
    pub resource_name: String,
    pub role_names: String,
    pub requires_capacity: bool,

    /// Only allocations overlapping this window are included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<DateRange>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_name: Option<String>,

    /// Sum of tracked percentages. Always 0 when capacity is not required.
    pub total_percentage: i64,

    pub project_allocations: Vec<ProjectAllocation>,
}

impl ResourceAllocationSummary {
    /// Derived on every call so it can never disagree with the total.
    pub const fn is_over_allocated(&self) -> bool {
        self.requires_capacity && self.total_percentage > FULL_CAPACITY
    }
}

/// Builds the summary of `resource` from its allocations.
///
/// With a `window`, only allocations intersecting it (closed-interval test)
/// are kept. The total is a plain sum across the kept allocations, not a
/// per-day peak.
pub fn build_summary(
    resource: &Resource,
    allocations: &[Allocation],
    window: Option<DateRange>,
) -> ResourceAllocationSummary {
    let role_names = resource.role_names();
    let requires_capacity = resource.requires_capacity();

    let kept: Vec<&Allocation> = allocations
        .iter()
        .filter(|a| a.resource_id == resource.id)
        .filter(|a| window.is_none_or(|w| a.range.overlaps(&w)))
        .collect();

    let total_percentage = if requires_capacity {
        clamped_total(kept.iter().filter_map(|a| a.percentage.value()))
    } else {
        0
    };

    let project_allocations = kept
        .iter()
        .map(|a| ProjectAllocation {
            allocation_id: a.id,
            project_id: a.project.id,
            project_name: a.project.name.clone(),
            percentage: a.percentage,
            role_names: role_names.clone(),
            start_date: a.range.start(),
            end_date: a.range.end(),
        })
        .collect();

    ResourceAllocationSummary {
        resource_id: Some(resource.id),
        resource_name: resource.name.clone(),
        role_names,
        requires_capacity,
        window,
        period_name: None,
        total_percentage,
        project_allocations,
    }
}
