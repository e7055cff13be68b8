//! Command-line argument definitions.

use std::path::PathBuf;

use capa_core::{AllocationId, Percentage, Period, ProjectId, ResourceId};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::commands::util::{parse_month, parse_quarter};

/// Resource capacity allocation.
///
/// Tracks which people are committed to which projects over which dates, and
/// refuses allocations that would push anyone past 100% on any day.
#[derive(Debug, Parser)]
#[command(name = "capa", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the database location and record counts.
    Status,

    /// Create the configured roles if the database has none.
    Seed,

    /// Manage roles.
    #[command(subcommand)]
    Role(RoleAction),

    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectAction),

    /// Manage resources.
    #[command(subcommand)]
    Resource(ResourceAction),

    /// Allocate a resource to a project.
    Allocate {
        /// Resource ID.
        #[arg(long)]
        resource: ResourceId,

        /// Project ID.
        #[arg(long)]
        project: ProjectId,

        /// First day (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD).
        #[arg(long)]
        end: NaiveDate,

        /// Share of capacity, e.g. `40` or `40%`. Omit for untracked roles.
        #[arg(long)]
        percentage: Option<Percentage>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Change an allocation's dates or percentage.
    Update {
        /// Allocation ID.
        id: AllocationId,

        /// New first day (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// New last day (YYYY-MM-DD).
        #[arg(long)]
        end: Option<NaiveDate>,

        /// New percentage, or `untracked`.
        #[arg(long)]
        percentage: Option<Percentage>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete an allocation.
    Delete {
        /// Allocation ID.
        id: AllocationId,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Summarize a resource's allocations.
    Summary {
        /// Resource ID.
        resource: ResourceId,

        #[command(flatten)]
        window: WindowArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Restricts a summary to allocations overlapping a window.
#[derive(Debug, Clone, Default, Args)]
pub struct WindowArgs {
    /// Window start (YYYY-MM-DD). Requires --to.
    #[arg(long, requires = "to", conflicts_with_all = ["month", "quarter"])]
    pub from: Option<NaiveDate>,

    /// Window end (YYYY-MM-DD). Requires --from.
    #[arg(long, requires = "from", conflicts_with_all = ["month", "quarter"])]
    pub to: Option<NaiveDate>,

    /// Calendar month, e.g. 2026-02.
    #[arg(long, value_parser = parse_month, conflicts_with = "quarter")]
    pub month: Option<Period>,

    /// Calendar quarter, e.g. 2026-Q1.
    #[arg(long, value_parser = parse_quarter)]
    pub quarter: Option<Period>,
}

#[derive(Debug, Subcommand)]
pub enum RoleAction {
    /// List roles.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add a role, or change whether an existing one requires capacity.
    Add {
        /// Role name.
        name: String,

        /// Allocations for this role must state a percentage.
        #[arg(long)]
        requires_capacity: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// List projects.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add a project.
    Add {
        /// Project name.
        name: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ResourceAction {
    /// List resources with their roles.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add a resource.
    Add {
        /// Display name.
        name: String,

        /// Role name. Repeat for multiple roles.
        #[arg(long = "role")]
        roles: Vec<String>,

        /// Last contract day (YYYY-MM-DD).
        #[arg(long)]
        contract_end: Option<NaiveDate>,

        /// Vendor name. Created if missing.
        #[arg(long)]
        vendor: Option<String>,
    },
}
