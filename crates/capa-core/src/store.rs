//! Storage seam between the lifecycle service and the host's persistence.

use std::collections::BTreeMap;

use chrono::Utc;
use thiserror::Error;

use crate::error::LifecycleError;
use crate::model::{Allocation, AllocationDraft, ProjectRef, Resource};
use crate::overlap::find_overlapping;
use crate::range::DateRange;
use crate::types::{AllocationId, Percentage, ProjectId, ResourceId, ValidationError};

/// Persistence operations the lifecycle service needs.
///
/// Implementations return fully materialized records: a [`Resource`] carries
/// its roles and an [`Allocation`] its project name.
pub trait AllocationStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn resource(&self, id: ResourceId) -> Result<Option<Resource>, Self::Error>;

    fn project(&self, id: ProjectId) -> Result<Option<ProjectRef>, Self::Error>;

    fn allocation(&self, id: AllocationId) -> Result<Option<Allocation>, Self::Error>;

    /// Allocations of `resource_id` intersecting `range` (closed-interval
    /// test), optionally excluding one allocation.
    fn overlapping_allocations(
        &self,
        resource_id: ResourceId,
        range: DateRange,
        exclude: Option<AllocationId>,
    ) -> Result<Vec<Allocation>, Self::Error>;

    /// All allocations of `resource_id`, ordered by start date then ID.
    fn resource_allocations(&self, resource_id: ResourceId) -> Result<Vec<Allocation>, Self::Error>;

    fn insert_allocation(&mut self, draft: &AllocationDraft) -> Result<AllocationId, Self::Error>;

    fn update_allocation(
        &mut self,
        id: AllocationId,
        range: DateRange,
        percentage: Percentage,
    ) -> Result<(), Self::Error>;

    /// Removes an allocation. Returns `false` if it did not exist.
    fn delete_allocation(&mut self, id: AllocationId) -> Result<bool, Self::Error>;

    /// Runs `f` so that its reads and writes are atomic with respect to other
    /// writers of the same store.
    ///
    /// The default runs `f` directly, which is sufficient when the store is
    /// exclusively borrowed for the whole call. Stores shared between
    /// connections must take a write lock before `f` reads.
    fn transaction<T, F>(&mut self, f: F) -> Result<T, LifecycleError>
    where
        F: FnOnce(&mut Self) -> Result<T, LifecycleError>,
    {
        f(self)
    }
}

/// Errors from [`MemoryStore`] writes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryStoreError {
    #[error("project {0} does not exist")]
    UnknownProject(ProjectId),

    #[error(transparent)]
    InvalidId(#[from] ValidationError),
}

/// An in-process store backed by ordered maps.
///
/// Suitable for hosts that keep their records in memory and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    resources: BTreeMap<ResourceId, Resource>,
    projects: BTreeMap<ProjectId, ProjectRef>,
    allocations: BTreeMap<AllocationId, Allocation>,
    last_allocation_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a resource.
    pub fn put_resource(&mut self, resource: Resource) {
        self.resources.insert(resource.id, resource);
    }

    /// Adds or replaces a project.
    pub fn put_project(&mut self, project: ProjectRef) {
        self.projects.insert(project.id, project);
    }

    pub fn allocations(&self) -> impl Iterator<Item = &Allocation> {
        self.allocations.values()
    }
}

impl AllocationStore for MemoryStore {
    type Error = MemoryStoreError;

    fn resource(&self, id: ResourceId) -> Result<Option<Resource>, Self::Error> {
        Ok(self.resources.get(&id).cloned())
    }

    fn project(&self, id: ProjectId) -> Result<Option<ProjectRef>, Self::Error> {
        Ok(self.projects.get(&id).cloned())
    }

    fn allocation(&self, id: AllocationId) -> Result<Option<Allocation>, Self::Error> {
        Ok(self.allocations.get(&id).cloned())
    }

    fn overlapping_allocations(
        &self,
        resource_id: ResourceId,
        range: DateRange,
        exclude: Option<AllocationId>,
    ) -> Result<Vec<Allocation>, Self::Error> {
        Ok(find_overlapping(
            self.allocations.values(),
            resource_id,
            range,
            exclude,
        ))
    }

    fn resource_allocations(&self, resource_id: ResourceId) -> Result<Vec<Allocation>, Self::Error> {
        let mut allocations: Vec<Allocation> = self
            .allocations
            .values()
            .filter(|a| a.resource_id == resource_id)
            .cloned()
            .collect();
        allocations.sort_by_key(|a| (a.range.start(), a.id));
        Ok(allocations)
    }

    fn insert_allocation(&mut self, draft: &AllocationDraft) -> Result<AllocationId, Self::Error> {
        let project = self
            .projects
            .get(&draft.project_id)
            .cloned()
            .ok_or(MemoryStoreError::UnknownProject(draft.project_id))?;
        let id = AllocationId::new(self.last_allocation_id + 1)?;
        self.allocations.insert(
            id,
            Allocation {
                id,
                resource_id: draft.resource_id,
                project,
                range: draft.range,
                percentage: draft.percentage,
                created_at: Utc::now(),
            },
        );
        self.last_allocation_id = id.get();
        Ok(id)
    }

    fn update_allocation(
        &mut self,
        id: AllocationId,
        range: DateRange,
        percentage: Percentage,
    ) -> Result<(), Self::Error> {
        if let Some(allocation) = self.allocations.get_mut(&id) {
            allocation.range = range;
            allocation.percentage = percentage;
        }
        Ok(())
    }

    fn delete_allocation(&mut self, id: AllocationId) -> Result<bool, Self::Error> {
        Ok(self.allocations.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{developer, project, range};

    fn draft(store: &MemoryStore, range: DateRange, percentage: i64) -> AllocationDraft {
        let resource_id = store.resources.keys().next().copied().unwrap();
        let project_id = store.projects.keys().next().copied().unwrap();
        AllocationDraft {
            resource_id,
            project_id,
            range,
            percentage: Percentage::Percent(percentage),
        }
    }

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.put_resource(developer(1, "Priyanka"));
        store.put_project(project("Oliver"));
        store
    }

    #[test]
    fn test_insert_assigns_increasing_ids_and_project_names() {
        let mut store = seeded();
        let first = store.insert_allocation(&draft(&store, range((1, 1), (1, 31)), 40)).unwrap();
        let second = store.insert_allocation(&draft(&store, range((2, 1), (2, 28)), 40)).unwrap();

        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 2);
        assert_eq!(store.allocation(first).unwrap().unwrap().project.name, "Oliver");
    }

    #[test]
    fn test_insert_for_unknown_project_fails() {
        let mut store = seeded();
        let mut orphan = draft(&store, range((1, 1), (1, 31)), 40);
        orphan.project_id = ProjectId::new(99).unwrap();

        assert_eq!(
            store.insert_allocation(&orphan),
            Err(MemoryStoreError::UnknownProject(orphan.project_id))
        );
        assert_eq!(store.allocations().count(), 0);
        assert_eq!(
            MemoryStoreError::UnknownProject(orphan.project_id).to_string(),
            "project 99 does not exist"
        );

        // The failed insert does not consume an ID.
        let first = store.insert_allocation(&draft(&store, range((1, 1), (1, 31)), 40)).unwrap();
        assert_eq!(first.get(), 1);
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let mut store = seeded();
        let first = store.insert_allocation(&draft(&store, range((1, 1), (1, 31)), 40)).unwrap();
        assert!(store.delete_allocation(first).unwrap());
        assert!(!store.delete_allocation(first).unwrap());

        let second = store.insert_allocation(&draft(&store, range((1, 1), (1, 31)), 40)).unwrap();
        assert_eq!(second.get(), 2);
    }

    #[test]
    fn test_overlapping_and_resource_allocations() {
        let mut store = seeded();
        let late = store.insert_allocation(&draft(&store, range((3, 1), (3, 31)), 10)).unwrap();
        let early = store.insert_allocation(&draft(&store, range((1, 1), (1, 31)), 20)).unwrap();
        let resource_id = store.resources.keys().next().copied().unwrap();

        let overlapping = store
            .overlapping_allocations(resource_id, range((1, 31), (2, 5)), None)
            .unwrap();
        assert_eq!(overlapping.len(), 1);
        assert_eq!(overlapping[0].id, early);

        let ordered: Vec<AllocationId> = store
            .resource_allocations(resource_id)
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ordered, vec![early, late]);
    }

    #[test]
    fn test_update_changes_range_and_percentage() {
        let mut store = seeded();
        let id = store.insert_allocation(&draft(&store, range((1, 1), (1, 31)), 40)).unwrap();
        store
            .update_allocation(id, range((1, 5), (1, 6)), Percentage::Untracked)
            .unwrap();

        let updated = store.allocation(id).unwrap().unwrap();
        assert_eq!(updated.range, range((1, 5), (1, 6)));
        assert_eq!(updated.percentage, Percentage::Untracked);
    }
}
