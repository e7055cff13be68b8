//! [`AllocationStore`] over the SQLite schema.

use capa_core::{
    Allocation, AllocationDraft, AllocationId, AllocationStore, DateRange, LifecycleError,
    Percentage, ProjectId, ProjectRef, Resource, ResourceId,
};
use rusqlite::{OptionalExtension, Params, Row, params};

use crate::{Database, DbError, format_date, now_timestamp, parse_date, parse_timestamp};

const ALLOCATION_SELECT: &str = "
    SELECT a.id, a.resource_id, a.project_id, p.name,
           a.start_date, a.end_date, a.percentage, a.created_at
    FROM allocations a
    JOIN projects p ON p.id = a.project_id
";

/// Raw columns of an allocation row, converted after the statement finishes.
struct AllocationRow {
    id: i64,
    resource_id: i64,
    project_id: i64,
    project_name: String,
    start_date: String,
    end_date: String,
    percentage: Option<i64>,
    created_at: String,
}

impl AllocationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            resource_id: row.get(1)?,
            project_id: row.get(2)?,
            project_name: row.get(3)?,
            start_date: row.get(4)?,
            end_date: row.get(5)?,
            percentage: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_allocation(self) -> Result<Allocation, DbError> {
        let start = parse_date(&self.start_date, "allocations", self.id)?;
        let end = parse_date(&self.end_date, "allocations", self.id)?;
        let range =
            DateRange::new(start, end).map_err(|_| DbError::InvertedRange { id: self.id })?;
        Ok(Allocation {
            id: AllocationId::new(self.id)?,
            resource_id: ResourceId::new(self.resource_id)?,
            project: ProjectRef {
                id: ProjectId::new(self.project_id)?,
                name: self.project_name,
            },
            range,
            percentage: Percentage::from_option(self.percentage),
            created_at: parse_timestamp(&self.created_at, "allocations", self.id)?,
        })
    }
}

impl Database {
    fn query_allocations<P: Params>(
        &self,
        filter: &str,
        params: P,
    ) -> Result<Vec<Allocation>, DbError> {
        let sql = format!("{ALLOCATION_SELECT} {filter}");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, AllocationRow::from_row)?;
        let mut allocations = Vec::new();
        for row in rows {
            allocations.push(row?.into_allocation()?);
        }
        Ok(allocations)
    }
}

impl AllocationStore for Database {
    type Error = DbError;

    fn resource(&self, id: ResourceId) -> Result<Option<Resource>, Self::Error> {
        self.load_resource(id)
    }

    fn project(&self, id: ProjectId) -> Result<Option<ProjectRef>, Self::Error> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name FROM projects WHERE id = ?",
                [id.get()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(id, name)| {
            Ok(ProjectRef {
                id: ProjectId::new(id)?,
                name,
            })
        })
        .transpose()
    }

    fn allocation(&self, id: AllocationId) -> Result<Option<Allocation>, Self::Error> {
        Ok(self
            .query_allocations("WHERE a.id = ?", [id.get()])?
            .into_iter()
            .next())
    }

    fn overlapping_allocations(
        &self,
        resource_id: ResourceId,
        range: DateRange,
        exclude: Option<AllocationId>,
    ) -> Result<Vec<Allocation>, Self::Error> {
        self.query_allocations(
            "
            WHERE a.resource_id = ?1
              AND a.start_date <= ?3
              AND a.end_date >= ?2
              AND (?4 IS NULL OR a.id != ?4)
            ORDER BY a.start_date ASC, a.id ASC
            ",
            params![
                resource_id.get(),
                format_date(range.start()),
                format_date(range.end()),
                exclude.map(AllocationId::get),
            ],
        )
    }

    fn resource_allocations(&self, resource_id: ResourceId) -> Result<Vec<Allocation>, Self::Error> {
        self.query_allocations(
            "WHERE a.resource_id = ? ORDER BY a.start_date ASC, a.id ASC",
            [resource_id.get()],
        )
    }

    fn insert_allocation(&mut self, draft: &AllocationDraft) -> Result<AllocationId, Self::Error> {
        self.conn.execute(
            "
            INSERT INTO allocations
                (resource_id, project_id, start_date, end_date, percentage, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                draft.resource_id.get(),
                draft.project_id.get(),
                format_date(draft.range.start()),
                format_date(draft.range.end()),
                draft.percentage.value(),
                now_timestamp(),
            ],
        )?;
        Ok(AllocationId::new(self.conn.last_insert_rowid())?)
    }

    fn update_allocation(
        &mut self,
        id: AllocationId,
        range: DateRange,
        percentage: Percentage,
    ) -> Result<(), Self::Error> {
        self.conn.execute(
            "UPDATE allocations SET start_date = ?, end_date = ?, percentage = ? WHERE id = ?",
            params![
                format_date(range.start()),
                format_date(range.end()),
                percentage.value(),
                id.get(),
            ],
        )?;
        Ok(())
    }

    fn delete_allocation(&mut self, id: AllocationId) -> Result<bool, Self::Error> {
        let deleted = self
            .conn
            .execute("DELETE FROM allocations WHERE id = ?", [id.get()])?;
        Ok(deleted > 0)
    }

    /// Holds the write lock from before the overlap read until commit.
    fn transaction<T, F>(&mut self, f: F) -> Result<T, LifecycleError>
    where
        F: FnOnce(&mut Self) -> Result<T, LifecycleError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| LifecycleError::store(DbError::from(e)))?;

        match f(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|e| LifecycleError::store(DbError::from(e)))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}
