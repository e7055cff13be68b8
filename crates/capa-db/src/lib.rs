//! Storage layer for capacity allocations.
//!
//! Provides persistence for roles, vendors, projects, resources and
//! allocations using `rusqlite`, and implements [`capa_core::AllocationStore`]
//! so the lifecycle service runs directly against SQLite.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! For multi-threaded access, either:
//! - Use a `Mutex<Database>` to serialize access
//! - Use separate `Database` instances per thread
//!
//! # Atomic Check-and-Write
//!
//! Lifecycle mutations run inside `BEGIN IMMEDIATE`, which takes the database
//! write lock before the overlap read. A second connection trying to validate
//! concurrently waits (up to the busy timeout) until the first commits, so
//! two writers can never both pass validation against the same stale set of
//! allocations.
//!
//! # Schema
//!
//! ## Date Format
//!
//! Allocation and contract dates are stored as TEXT in `YYYY-MM-DD` format.
//! Lexicographic ordering matches chronological ordering, so range predicates
//! run in SQL. Creation timestamps are RFC 3339 in UTC.

mod allocations;

use std::path::Path;
use std::time::Duration;

use capa_core::{
    ProjectId, ProjectRef, Resource, ResourceId, Role, RoleId, ValidationError, VendorId,
    VendorRef,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored row ID failed validation.
    #[error("invalid row id: {0}")]
    InvalidId(#[from] ValidationError),
    /// Failed to parse a stored date.
    #[error("invalid date in {table} row {id}: {value}")]
    DateParse {
        table: &'static str,
        id: i64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp in {table} row {id}: {value}")]
    TimestampParse {
        table: &'static str,
        id: i64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored allocation ends before it starts.
    #[error("allocation {id} ends before it starts")]
    InvertedRange { id: i64 },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A resource to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource {
    pub name: String,
    pub role_ids: Vec<RoleId>,
    pub contract_end: Option<NaiveDate>,
    pub vendor_id: Option<VendorId>,
}

/// A role to create when bootstrapping an empty database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRole {
    pub name: String,
    #[serde(default)]
    pub requires_capacity: bool,
}

/// Row counts reported by `capa status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub roles: i64,
    pub projects: i64,
    pub resources: i64,
    pub allocations: i64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// How long a writer waits for another connection's write lock.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<(), DbError> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS roles (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                requires_capacity INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS vendors (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            -- end_date: last contract day (YYYY-MM-DD), NULL for open-ended contracts
            CREATE TABLE IF NOT EXISTS resources (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                vendor_id INTEGER,
                end_date TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (vendor_id) REFERENCES vendors(id) ON DELETE SET NULL
            );

            CREATE TABLE IF NOT EXISTS resource_roles (
                resource_id INTEGER NOT NULL,
                role_id INTEGER NOT NULL,
                PRIMARY KEY (resource_id, role_id),
                FOREIGN KEY (resource_id) REFERENCES resources(id) ON DELETE CASCADE,
                FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE
            );

            -- Allocations: inclusive date ranges (YYYY-MM-DD)
            -- percentage: NULL when capacity is not tracked
            CREATE TABLE IF NOT EXISTS allocations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                resource_id INTEGER NOT NULL,
                project_id INTEGER NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                percentage INTEGER,
                created_at TEXT NOT NULL,
                CHECK (end_date >= start_date),
                FOREIGN KEY (resource_id) REFERENCES resources(id) ON DELETE CASCADE,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_allocations_resource_dates
                ON allocations(resource_id, start_date, end_date);
            ",
        )?;
        Ok(())
    }

    /// Creates a role, or updates `requires_capacity` if the name exists.
    pub fn insert_role(&mut self, name: &str, requires_capacity: bool) -> Result<RoleId, DbError> {
        let id: i64 = self.conn.query_row(
            "
            INSERT INTO roles (name, requires_capacity, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET requires_capacity = excluded.requires_capacity
            RETURNING id
            ",
            params![name, requires_capacity, now_timestamp()],
            |row| row.get(0),
        )?;
        Ok(RoleId::new(id)?)
    }

    /// Lists roles ordered by ID.
    pub fn list_roles(&self) -> Result<Vec<Role>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, requires_capacity FROM roles ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
            ))
        })?;
        let mut roles = Vec::new();
        for row in rows {
            let (id, name, requires_capacity) = row?;
            roles.push(Role {
                id: RoleId::new(id)?,
                name,
                requires_capacity,
            });
        }
        Ok(roles)
    }

    /// Finds a role by exact name.
    pub fn role_by_name(&self, name: &str) -> Result<Option<Role>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, requires_capacity FROM roles WHERE name = ?",
                [name],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, bool>(2)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(id, name, requires_capacity)| {
            Ok(Role {
                id: RoleId::new(id)?,
                name,
                requires_capacity,
            })
        })
        .transpose()
    }

    /// Creates a vendor, returning the existing ID if the name is taken.
    pub fn insert_vendor(&mut self, name: &str) -> Result<VendorId, DbError> {
        let id: i64 = self.conn.query_row(
            "
            INSERT INTO vendors (name, created_at) VALUES (?, ?)
            ON CONFLICT(name) DO UPDATE SET name = excluded.name
            RETURNING id
            ",
            params![name, now_timestamp()],
            |row| row.get(0),
        )?;
        Ok(VendorId::new(id)?)
    }

    /// Creates a project, returning the existing ID if the name is taken.
    pub fn insert_project(&mut self, name: &str) -> Result<ProjectId, DbError> {
        let id: i64 = self.conn.query_row(
            "
            INSERT INTO projects (name, created_at) VALUES (?, ?)
            ON CONFLICT(name) DO UPDATE SET name = excluded.name
            RETURNING id
            ",
            params![name, now_timestamp()],
            |row| row.get(0),
        )?;
        Ok(ProjectId::new(id)?)
    }

    /// Lists projects ordered by name.
    pub fn list_projects(&self) -> Result<Vec<ProjectRef>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM projects ORDER BY name ASC, id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut projects = Vec::new();
        for row in rows {
            let (id, name) = row?;
            projects.push(ProjectRef {
                id: ProjectId::new(id)?,
                name,
            });
        }
        Ok(projects)
    }

    /// Registers a resource with its role assignments.
    pub fn insert_resource(&mut self, resource: &NewResource) -> Result<ResourceId, DbError> {
        let tx = self.conn.transaction()?;
        let id: i64 = tx.query_row(
            "
            INSERT INTO resources (name, vendor_id, end_date, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            ",
            params![
                resource.name,
                resource.vendor_id.map(VendorId::get),
                resource.contract_end.map(format_date),
                now_timestamp(),
            ],
            |row| row.get(0),
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO resource_roles (resource_id, role_id) VALUES (?, ?)",
            )?;
            for role_id in &resource.role_ids {
                stmt.execute(params![id, role_id.get()])?;
            }
        }
        tx.commit()?;
        tracing::debug!(resource_id = id, name = %resource.name, "resource registered");
        Ok(ResourceId::new(id)?)
    }

    /// Lists resources ordered by ID, with roles and vendor loaded.
    pub fn list_resources(&self) -> Result<Vec<Resource>, DbError> {
        let mut stmt = self.conn.prepare("SELECT id FROM resources ORDER BY id ASC")?;
        let ids = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut resources = Vec::new();
        for id in ids {
            if let Some(resource) = self.load_resource(ResourceId::new(id?)?)? {
                resources.push(resource);
            }
        }
        Ok(resources)
    }

    /// Seeds roles into an empty database.
    ///
    /// Does nothing if any role already exists, so it is safe to run on every
    /// start. Returns the number of roles created.
    pub fn bootstrap(&mut self, roles: &[SeedRole]) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM roles", [], |row| row.get(0))?;
        if existing > 0 {
            tracing::debug!(existing, "roles present, skipping bootstrap");
            return Ok(0);
        }
        let mut created = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO roles (name, requires_capacity, created_at)
                VALUES (?, ?, ?)
                ",
            )?;
            let created_at = now_timestamp();
            for role in roles {
                created += stmt.execute(params![role.name, role.requires_capacity, created_at])?;
            }
        }
        tx.commit()?;
        tracing::debug!(created, "bootstrapped roles");
        Ok(created)
    }

    /// Counts rows in the main tables.
    pub fn table_counts(&self) -> Result<TableCounts, DbError> {
        let count = |table: &str| -> Result<i64, DbError> {
            Ok(self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?)
        };
        Ok(TableCounts {
            roles: count("roles")?,
            projects: count("projects")?,
            resources: count("resources")?,
            allocations: count("allocations")?,
        })
    }

    fn load_resource(&self, id: ResourceId) -> Result<Option<Resource>, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT r.id, r.name, r.end_date, v.id, v.name
                FROM resources r
                LEFT JOIN vendors v ON v.id = r.vendor_id
                WHERE r.id = ?
                ",
                [id.get()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;
        let Some((raw_id, name, end_date, vendor_id, vendor_name)) = row else {
            return Ok(None);
        };

        let contract_end = end_date
            .map(|value| parse_date(&value, "resources", raw_id))
            .transpose()?;
        let vendor = match (vendor_id, vendor_name) {
            (Some(vendor_id), Some(vendor_name)) => Some(VendorRef {
                id: VendorId::new(vendor_id)?,
                name: vendor_name,
            }),
            _ => None,
        };

        Ok(Some(Resource {
            id,
            name,
            roles: self.resource_roles(id)?,
            contract_end,
            vendor,
        }))
    }

    fn resource_roles(&self, id: ResourceId) -> Result<Vec<Role>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT ro.id, ro.name, ro.requires_capacity
            FROM resource_roles rr
            JOIN roles ro ON ro.id = rr.role_id
            WHERE rr.resource_id = ?
            ORDER BY ro.id ASC
            ",
        )?;
        let rows = stmt.query_map([id.get()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
            ))
        })?;
        let mut roles = Vec::new();
        for row in rows {
            let (role_id, name, requires_capacity) = row?;
            roles.push(Role {
                id: RoleId::new(role_id)?,
                name,
                requires_capacity,
            });
        }
        Ok(roles)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, table: &'static str, id: i64) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| DbError::DateParse {
        table,
        id,
        value: value.to_string(),
        source,
    })
}

fn parse_timestamp(value: &str, table: &'static str, id: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            table,
            id,
            value: value.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}
