//! Resource commands.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use capa_db::{Database, NewResource};

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let resources = db.list_resources()?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&resources)?)?;
        return Ok(());
    }

    if resources.is_empty() {
        writeln!(writer, "No resources.")?;
        return Ok(());
    }

    for resource in resources {
        let roles = if resource.roles.is_empty() {
            "no roles".to_string()
        } else {
            resource.role_names()
        };
        write!(writer, "#{:<3} {} [{roles}]", resource.id, resource.name)?;
        if let Some(contract_end) = resource.contract_end {
            write!(writer, " contract ends {contract_end}")?;
        }
        if let Some(vendor) = &resource.vendor {
            write!(writer, " via {}", vendor.name)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Adds a resource, resolving role names to IDs.
pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    name: &str,
    role_names: &[String],
    contract_end: Option<NaiveDate>,
    vendor: Option<&str>,
) -> Result<()> {
    let mut role_ids = Vec::with_capacity(role_names.len());
    for role_name in role_names {
        let role = db
            .role_by_name(role_name)?
            .with_context(|| format!("unknown role '{role_name}'; see `capa role list`"))?;
        role_ids.push(role.id);
    }

    let vendor_id = vendor.map(|vendor| db.insert_vendor(vendor)).transpose()?;

    let id = db.insert_resource(&NewResource {
        name: name.to_string(),
        role_ids,
        contract_end,
        vendor_id,
    })?;
    writeln!(writer, "Added resource '{name}' (#{id}).")?;
    Ok(())
}
