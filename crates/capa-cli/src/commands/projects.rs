//! Project commands.

use std::io::Write;

use anyhow::Result;

use capa_db::Database;

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let projects = db.list_projects()?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&projects)?)?;
        return Ok(());
    }

    if projects.is_empty() {
        writeln!(writer, "No projects.")?;
        return Ok(());
    }

    for project in projects {
        writeln!(writer, "#{:<3} {}", project.id, project.name)?;
    }
    Ok(())
}

/// Adds a project. An existing name keeps its ID.
pub fn add<W: Write>(writer: &mut W, db: &mut Database, name: &str) -> Result<()> {
    let id = db.insert_project(name)?;
    writeln!(writer, "Project '{name}' is #{id}.")?;
    Ok(())
}
