//! Summary command: a resource's allocations, optionally within a window.

use std::io::Write;

use anyhow::Result;

use capa_core::{AllocationService, DateRange, ResourceAllocationSummary, ResourceId};
use capa_db::Database;

use crate::cli::WindowArgs;

pub fn run<W: Write>(
    writer: &mut W,
    service: &AllocationService<Database>,
    resource_id: ResourceId,
    window: &WindowArgs,
    json: bool,
) -> Result<()> {
    let summary = if let Some(period) = window.month.as_ref().or(window.quarter.as_ref()) {
        service.period_summary(resource_id, period)?
    } else if let (Some(from), Some(to)) = (window.from, window.to) {
        let range = DateRange::new(from, to)?;
        service.resource_summary(resource_id, Some(range))?
    } else {
        service.resource_summary(resource_id, None)?
    };

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
        return Ok(());
    }

    render(writer, resource_id, &summary)?;
    Ok(())
}

fn render<W: Write>(
    writer: &mut W,
    resource_id: ResourceId,
    summary: &ResourceAllocationSummary,
) -> std::io::Result<()> {
    if summary.resource_id.is_none() {
        writeln!(writer, "No resource #{resource_id}.")?;
        return Ok(());
    }

    if summary.role_names.is_empty() {
        writeln!(writer, "{}", summary.resource_name)?;
    } else {
        writeln!(writer, "{} ({})", summary.resource_name, summary.role_names)?;
    }

    if let Some(window) = summary.window {
        match &summary.period_name {
            Some(name) => writeln!(writer, "Period: {name} ({window})")?,
            None => writeln!(writer, "Window: {window}")?,
        }
    }

    if !summary.requires_capacity {
        writeln!(writer, "Total: not tracked")?;
    } else if summary.is_over_allocated() {
        writeln!(writer, "Total: {}% (over-allocated)", summary.total_percentage)?;
    } else {
        writeln!(writer, "Total: {}%", summary.total_percentage)?;
    }

    if summary.project_allocations.is_empty() {
        writeln!(writer, "No allocations.")?;
        return Ok(());
    }

    for line in &summary.project_allocations {
        writeln!(
            writer,
            "  #{:<3} {:<16} {:>9}  {} - {}",
            line.allocation_id,
            line.project_name,
            line.percentage,
            line.start_date,
            line.end_date
        )?;
    }
    Ok(())
}
