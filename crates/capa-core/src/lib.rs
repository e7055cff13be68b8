//! Capacity allocation and overlap analysis.
//!
//! This crate contains the engine that keeps a resource from being committed
//! to more than 100% of its capacity:
//! - Overlap lookup: which existing allocations share days with a candidate
//! - Capacity analysis: sweep-line totals per sub-period and the worst one
//! - Lifecycle: create/update/delete with role, range and contract rules
//! - Summaries: per-resource reporting, optionally for a window or period
//!
//! Persistence is behind [`AllocationStore`]; hosts pass fully loaded records.

mod analyzer;
mod error;
mod model;
mod overlap;
pub mod period;
mod range;
mod result;
mod service;
mod store;
mod summary;
pub mod types;

#[cfg(test)]
mod test_support;

pub use analyzer::{CapacityAnalysis, analyze};
pub use error::{CapacityExceeded, Entity, LifecycleError, Operation};
pub use model::{
    Allocation, AllocationDraft, OverlapPeriod, ProjectRef, Resource, Role, VendorRef,
};
pub use overlap::{find_overlapping, overlap_warnings};
pub use period::{Period, PeriodKind};
pub use range::{DateRange, RangeError};
pub use result::AllocationResult;
pub use service::{
    AllocationChanges, AllocationOutcome, AllocationService, FULL_CAPACITY, NewAllocation,
};
pub use store::{AllocationStore, MemoryStore, MemoryStoreError};
pub use summary::{ProjectAllocation, ResourceAllocationSummary, build_summary};
pub use types::{
    AllocationId, Percentage, ProjectId, ResourceId, RoleId, ValidationError, VendorId,
};
