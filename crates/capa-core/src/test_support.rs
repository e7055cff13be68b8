//! Fixtures shared by unit tests across the crate.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::model::{Allocation, ProjectRef, Resource, Role};
use crate::range::DateRange;
use crate::types::{AllocationId, Percentage, ProjectId, ResourceId, RoleId};

/// A day in 2026.
pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).expect("valid test date")
}

/// An inclusive 2026 range from `(month, day)` to `(month, day)`.
pub fn range(start: (u32, u32), end: (u32, u32)) -> DateRange {
    DateRange::new(date(start.0, start.1), date(end.0, end.1)).expect("valid test range")
}

/// Project ids are derived from the name so equal names share an id.
pub fn project(name: &str) -> ProjectRef {
    let id = name.bytes().map(i64::from).sum::<i64>().max(1);
    ProjectRef {
        id: ProjectId::new(id).expect("valid project id"),
        name: name.to_string(),
    }
}

pub fn allocation(
    id: i64,
    resource_id: i64,
    project_name: &str,
    range: DateRange,
    percentage: Percentage,
) -> Allocation {
    Allocation {
        id: AllocationId::new(id).expect("valid allocation id"),
        resource_id: ResourceId::new(resource_id).expect("valid resource id"),
        project: project(project_name),
        range,
        percentage,
        created_at: Utc
            .with_ymd_and_hms(2025, 12, 1, 9, 0, 0)
            .single()
            .expect("valid test timestamp"),
    }
}

pub fn role(id: i64, name: &str, requires_capacity: bool) -> Role {
    Role {
        id: RoleId::new(id).expect("valid role id"),
        name: name.to_string(),
        requires_capacity,
    }
}

pub fn resource(id: i64, name: &str, roles: Vec<Role>) -> Resource {
    Resource {
        id: ResourceId::new(id).expect("valid resource id"),
        name: name.to_string(),
        roles,
        contract_end: None,
        vendor: None,
    }
}

pub fn developer(id: i64, name: &str) -> Resource {
    resource(id, name, vec![role(4, "Developer", true)])
}

pub fn scrum_master(id: i64, name: &str) -> Resource {
    resource(id, name, vec![role(2, "Scrum Master", false)])
}
