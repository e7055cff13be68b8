//! Overlap lookup over a resource's allocations.

use crate::model::{Allocation, OverlapPeriod};
use crate::range::DateRange;
use crate::types::{AllocationId, ResourceId};

/// Returns the allocations of `resource_id` that intersect `range`.
///
/// Uses the closed-interval test, so ranges sharing a single day overlap.
/// `exclude` drops one allocation (the one being updated) so it never
/// overlaps itself.
pub fn find_overlapping<'a, I>(
    allocations: I,
    resource_id: ResourceId,
    range: DateRange,
    exclude: Option<AllocationId>,
) -> Vec<Allocation>
where
    I: IntoIterator<Item = &'a Allocation>,
{
    allocations
        .into_iter()
        .filter(|a| a.resource_id == resource_id)
        .filter(|a| Some(a.id) != exclude)
        .filter(|a| a.range.overlaps(&range))
        .cloned()
        .collect()
}

/// Builds informational warnings for each overlapping allocation.
///
/// Each warning is the existing allocation clipped to the candidate range,
/// carrying that allocation's own percentage (untracked as 0) and project.
pub fn overlap_warnings(overlaps: &[Allocation], candidate: DateRange) -> Vec<OverlapPeriod> {
    overlaps
        .iter()
        .filter_map(|allocation| {
            let clipped = allocation.range.intersection(&candidate)?;
            Some(OverlapPeriod {
                start: clipped.start(),
                end: clipped.end(),
                total_percentage: allocation.percentage.contribution(),
                project_names: vec![allocation.project.name.clone()],
            })
        })
        .collect()
}
