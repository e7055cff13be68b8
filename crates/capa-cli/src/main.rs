use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use capa_cli::commands::{allocate, projects, resources, roles, seed, status, summary};
use capa_cli::{Cli, Commands, Config, ProjectAction, ResourceAction, RoleAction};
use capa_core::{AllocationChanges, AllocationService, NewAllocation, Percentage};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(capa_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = capa_db::Database::open(&config.database_path).context("failed to open database")?;
    db.set_busy_timeout(config.busy_timeout())
        .context("failed to set busy timeout")?;
    Ok((db, config))
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let mut out = io::stdout().lock();

    let accepted = match command {
        Commands::Status => {
            status::run(&mut out, &db, &config.database_path)?;
            true
        }
        Commands::Seed => {
            seed::run(&mut out, &mut db, &config.roles)?;
            true
        }
        Commands::Role(action) => {
            match action {
                RoleAction::List { json } => roles::list(&mut out, &db, *json)?,
                RoleAction::Add {
                    name,
                    requires_capacity,
                } => roles::add(&mut out, &mut db, name, *requires_capacity)?,
            }
            true
        }
        Commands::Project(action) => {
            match action {
                ProjectAction::List { json } => projects::list(&mut out, &db, *json)?,
                ProjectAction::Add { name } => projects::add(&mut out, &mut db, name)?,
            }
            true
        }
        Commands::Resource(action) => {
            match action {
                ResourceAction::List { json } => resources::list(&mut out, &db, *json)?,
                ResourceAction::Add {
                    name,
                    roles,
                    contract_end,
                    vendor,
                } => resources::add(
                    &mut out,
                    &mut db,
                    name,
                    roles,
                    *contract_end,
                    vendor.as_deref(),
                )?,
            }
            true
        }
        Commands::Allocate {
            resource,
            project,
            start,
            end,
            percentage,
            json,
        } => {
            let request = NewAllocation {
                resource_id: *resource,
                project_id: *project,
                start: *start,
                end: *end,
                percentage: percentage.unwrap_or(Percentage::Untracked),
            };
            let mut service = AllocationService::new(db);
            allocate::create(&mut out, &mut service, &request, *json)?
        }
        Commands::Update {
            id,
            start,
            end,
            percentage,
            json,
        } => {
            let changes = AllocationChanges {
                start: *start,
                end: *end,
                percentage: *percentage,
            };
            let mut service = AllocationService::new(db);
            allocate::update(&mut out, &mut service, *id, changes, *json)?
        }
        Commands::Delete { id, json } => {
            let mut service = AllocationService::new(db);
            allocate::delete(&mut out, &mut service, *id, *json)?;
            true
        }
        Commands::Summary {
            resource,
            window,
            json,
        } => {
            let service = AllocationService::new(db);
            summary::run(&mut out, &service, *resource, window, *json)?;
            true
        }
    };

    out.flush()?;
    Ok(if accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
