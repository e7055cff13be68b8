//! Allocation lifecycle: create, update and delete with capacity validation.
//!
//! Each mutating call runs inside [`AllocationStore::transaction`], so the
//! overlap read, the analysis and the write happen atomically. Validation
//! always completes before anything is written.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analyzer::analyze;
use crate::error::{CapacityExceeded, Entity, LifecycleError, Operation};
use crate::model::{Allocation, AllocationDraft, OverlapPeriod, Resource};
use crate::overlap::overlap_warnings;
use crate::period::Period;
use crate::range::DateRange;
use crate::store::AllocationStore;
use crate::summary::{ResourceAllocationSummary, build_summary};
use crate::types::{AllocationId, Percentage, ProjectId, ResourceId};

/// Total percentage a capacity-tracked resource may carry on any day.
pub const FULL_CAPACITY: i64 = 100;

/// Request to allocate a resource to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAllocation {
    pub resource_id: ResourceId,
    pub project_id: ProjectId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub percentage: Percentage,
}

/// Fields to change on an existing allocation. `None` keeps the current value.
///
/// `percentage: Some(Percentage::Untracked)` clears a tracked percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationChanges {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub percentage: Option<Percentage>,
}

/// A successful create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationOutcome {
    pub allocation_id: AllocationId,

    /// Peak total during the allocation when capacity is tracked, otherwise
    /// the allocation's own contribution.
    pub total_percentage: i64,

    /// Existing allocations now sharing days with this one, clipped to its range.
    pub warnings: Vec<OverlapPeriod>,
}

/// Validates and applies allocation changes against a store.
#[derive(Debug)]
pub struct AllocationService<S> {
    store: S,
}

impl<S: AllocationStore> AllocationService<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Creates an allocation after range, contract and capacity checks.
    pub fn create_allocation(
        &mut self,
        request: &NewAllocation,
    ) -> Result<AllocationOutcome, LifecycleError> {
        self.store.transaction(|store| create_in(store, request))
    }

    /// Changes an allocation's dates and/or percentage, re-validating against
    /// the resource's other allocations.
    pub fn update_allocation(
        &mut self,
        id: AllocationId,
        changes: AllocationChanges,
    ) -> Result<AllocationOutcome, LifecycleError> {
        self.store.transaction(|store| update_in(store, id, changes))
    }

    /// Deletes an allocation without validation. Missing IDs are not an error.
    pub fn delete_allocation(&mut self, id: AllocationId) -> Result<bool, LifecycleError> {
        let deleted = self.store.transaction(|store| {
            store
                .delete_allocation(id)
                .map_err(LifecycleError::store)
        })?;
        tracing::debug!(allocation_id = %id, deleted, "allocation delete");
        Ok(deleted)
    }

    /// Summarizes a resource's allocations, optionally only those overlapping
    /// `window`. An unknown resource yields an empty summary.
    pub fn resource_summary(
        &self,
        resource_id: ResourceId,
        window: Option<DateRange>,
    ) -> Result<ResourceAllocationSummary, LifecycleError> {
        let Some(resource) = self
            .store
            .resource(resource_id)
            .map_err(LifecycleError::store)?
        else {
            return Ok(ResourceAllocationSummary::default());
        };
        let allocations = self
            .store
            .resource_allocations(resource_id)
            .map_err(LifecycleError::store)?;
        Ok(build_summary(&resource, &allocations, window))
    }

    /// Summarizes a resource's allocations overlapping a named period.
    pub fn period_summary(
        &self,
        resource_id: ResourceId,
        period: &Period,
    ) -> Result<ResourceAllocationSummary, LifecycleError> {
        let mut summary = self.resource_summary(resource_id, Some(period.range))?;
        if summary.resource_id.is_some() {
            summary.period_name = Some(period.name.clone());
        }
        Ok(summary)
    }
}

fn create_in<S: AllocationStore>(
    store: &mut S,
    request: &NewAllocation,
) -> Result<AllocationOutcome, LifecycleError> {
    let resource = load_resource(store, request.resource_id)?;
    let range = validate_dates(&resource, request.start, request.end)?;

    let overlaps = store
        .overlapping_allocations(resource.id, range, None)
        .map_err(LifecycleError::store)?;
    let total_percentage = check_capacity(
        &resource,
        &overlaps,
        range,
        request.percentage,
        Operation::Create,
    )?;

    if store
        .project(request.project_id)
        .map_err(LifecycleError::store)?
        .is_none()
    {
        return Err(LifecycleError::not_found(
            Entity::Project,
            request.project_id.get(),
        ));
    }

    let allocation_id = store
        .insert_allocation(&AllocationDraft {
            resource_id: resource.id,
            project_id: request.project_id,
            range,
            percentage: request.percentage,
        })
        .map_err(LifecycleError::store)?;

    tracing::debug!(
        %allocation_id,
        resource_id = %resource.id,
        total_percentage,
        overlaps = overlaps.len(),
        "allocation created"
    );

    Ok(AllocationOutcome {
        allocation_id,
        total_percentage,
        warnings: overlap_warnings(&overlaps, range),
    })
}

fn update_in<S: AllocationStore>(
    store: &mut S,
    id: AllocationId,
    changes: AllocationChanges,
) -> Result<AllocationOutcome, LifecycleError> {
    let current: Allocation = store
        .allocation(id)
        .map_err(LifecycleError::store)?
        .ok_or_else(|| LifecycleError::not_found(Entity::Allocation, id.get()))?;
    let resource = load_resource(store, current.resource_id)?;

    let start = changes.start.unwrap_or_else(|| current.range.start());
    let end = changes.end.unwrap_or_else(|| current.range.end());
    let percentage = changes.percentage.unwrap_or(current.percentage);
    let range = validate_dates(&resource, start, end)?;

    let overlaps = store
        .overlapping_allocations(resource.id, range, Some(id))
        .map_err(LifecycleError::store)?;
    let total_percentage =
        check_capacity(&resource, &overlaps, range, percentage, Operation::Update)?;

    store
        .update_allocation(id, range, percentage)
        .map_err(LifecycleError::store)?;

    tracing::debug!(
        allocation_id = %id,
        resource_id = %resource.id,
        total_percentage,
        overlaps = overlaps.len(),
        "allocation updated"
    );

    Ok(AllocationOutcome {
        allocation_id: id,
        total_percentage,
        warnings: overlap_warnings(&overlaps, range),
    })
}

fn load_resource<S: AllocationStore>(
    store: &S,
    id: ResourceId,
) -> Result<Resource, LifecycleError> {
    store
        .resource(id)
        .map_err(LifecycleError::store)?
        .ok_or_else(|| LifecycleError::not_found(Entity::Resource, id.get()))
}

/// Checks the range ordering and the resource's contract end.
fn validate_dates(
    resource: &Resource,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<DateRange, LifecycleError> {
    let range =
        DateRange::new(start, end).map_err(|e| LifecycleError::InvalidRange {
            start: e.start,
            end: e.end,
        })?;
    if let Some(contract_end) = resource.contract_end.filter(|&last_day| start > last_day) {
        return Err(LifecycleError::ContractEnded { contract_end });
    }
    Ok(range)
}

/// Returns the resulting total, or rejects when a capacity-tracked resource
/// would exceed [`FULL_CAPACITY`].
fn check_capacity(
    resource: &Resource,
    overlaps: &[Allocation],
    range: DateRange,
    percentage: Percentage,
    operation: Operation,
) -> Result<i64, LifecycleError> {
    if !resource.requires_capacity() {
        return Ok(percentage.contribution());
    }
    let Percentage::Percent(requested) = percentage else {
        return Err(LifecycleError::PercentageRequired);
    };

    let analysis = analyze(overlaps, range, requested);
    if analysis.max_total_percentage > FULL_CAPACITY {
        tracing::debug!(
            resource_id = %resource.id,
            requested,
            max_total = analysis.max_total_percentage,
            window = %analysis.worst_period,
            "allocation rejected: capacity exceeded"
        );
        return Err(LifecycleError::CapacityExceeded(Box::new(CapacityExceeded {
            operation,
            requested_percentage: requested,
            max_total_percentage: analysis.max_total_percentage,
            existing_percentage: analysis.existing_percentage,
            window: analysis.worst_period,
            overlapping_periods: analysis.overlapping_periods,
        })));
    }
    Ok(analysis.max_total_percentage)
}
