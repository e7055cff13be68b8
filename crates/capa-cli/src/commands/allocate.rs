//! Allocation lifecycle commands: create, update and delete.
//!
//! Domain rejections (capacity, contract, missing records) are rendered like
//! any other result and reported through the return value so `main` can set a
//! failing exit code. Storage failures propagate as errors.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use capa_core::{
    AllocationChanges, AllocationId, AllocationOutcome, AllocationResult, AllocationService,
    LifecycleError, NewAllocation,
};
use capa_db::Database;

use super::util::format_overlap;

/// Creates an allocation. Returns whether it was accepted.
pub fn create<W: Write>(
    writer: &mut W,
    service: &mut AllocationService<Database>,
    request: &NewAllocation,
    json: bool,
) -> Result<bool> {
    let result = service.create_allocation(request);
    report(writer, result, json)
}

/// Updates an allocation. Returns whether the change was accepted.
pub fn update<W: Write>(
    writer: &mut W,
    service: &mut AllocationService<Database>,
    id: AllocationId,
    changes: AllocationChanges,
    json: bool,
) -> Result<bool> {
    let result = service.update_allocation(id, changes);
    report(writer, result, json)
}

#[derive(Serialize)]
struct DeleteOutput {
    allocation_id: AllocationId,
    deleted: bool,
}

/// Deletes an allocation. A missing ID is reported but is not a failure.
pub fn delete<W: Write>(
    writer: &mut W,
    service: &mut AllocationService<Database>,
    id: AllocationId,
    json: bool,
) -> Result<()> {
    let deleted = service.delete_allocation(id)?;

    if json {
        let output = DeleteOutput {
            allocation_id: id,
            deleted,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    } else if deleted {
        writeln!(writer, "Deleted allocation #{id}.")?;
    } else {
        writeln!(writer, "Allocation #{id} does not exist; nothing deleted.")?;
    }
    Ok(())
}

fn report<W: Write>(
    writer: &mut W,
    result: Result<AllocationOutcome, LifecycleError>,
    json: bool,
) -> Result<bool> {
    let result = match result {
        Err(err) if !err.is_rejection() => {
            return Err(anyhow::Error::new(err).context("failed to save allocation"));
        }
        other => AllocationResult::from(other),
    };

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        render(writer, &result)?;
    }
    Ok(result.success)
}

fn render<W: Write>(writer: &mut W, result: &AllocationResult) -> std::io::Result<()> {
    if let Some(message) = &result.error_message {
        writeln!(writer, "Error: {message}")?;
    }
    if let Some(id) = result.allocation_id {
        writeln!(
            writer,
            "Saved allocation #{id}. Peak total: {}%",
            result.total_percentage
        )?;
    }

    if !result.warnings.is_empty() {
        writeln!(writer, "Overlapping periods:")?;
        for period in &result.warnings {
            writeln!(writer, "  {}", format_overlap(period))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use capa_core::{Percentage, ProjectId, ResourceId};
    use capa_db::NewResource;
    use chrono::NaiveDate;
    use insta::assert_snapshot;

    struct Setup {
        service: AllocationService<Database>,
        resource: ResourceId,
        project_x: ProjectId,
        project_y: ProjectId,
    }

    fn setup() -> Setup {
        let mut db = Database::open_in_memory().unwrap();
        let developer = db.insert_role("Developer", true).unwrap();
        let resource = db
            .insert_resource(&NewResource {
                name: "Shweta".to_string(),
                role_ids: vec![developer],
                contract_end: None,
                vendor_id: None,
            })
            .unwrap();
        let project_x = db.insert_project("Project X").unwrap();
        let project_y = db.insert_project("Project Y").unwrap();
        Setup {
            service: AllocationService::new(db),
            resource,
            project_x,
            project_y,
        }
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    fn request(
        resource_id: ResourceId,
        project_id: ProjectId,
        start: NaiveDate,
        end: NaiveDate,
        percentage: i64,
    ) -> NewAllocation {
        NewAllocation {
            resource_id,
            project_id,
            start,
            end,
            percentage: Percentage::Percent(percentage),
        }
    }

    #[test]
    fn create_reports_overlaps_and_rejections() {
        let mut s = setup();
        let mut output = Vec::new();

        let first = request(s.resource, s.project_x, date(1, 1), date(1, 31), 40);
        let second = request(s.resource, s.project_y, date(1, 15), date(2, 15), 50);
        let third = request(s.resource, s.project_x, date(1, 20), date(1, 25), 20);

        assert!(create(&mut output, &mut s.service, &first, false).unwrap());
        assert!(create(&mut output, &mut s.service, &second, false).unwrap());
        assert!(!create(&mut output, &mut s.service, &third, false).unwrap());

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Saved allocation #1. Peak total: 40%
        Saved allocation #2. Peak total: 90%
        Overlapping periods:
          Jan 15 - Jan 31: 40% (Project X)
        Error: Cannot allocate 20%. Resource would be at 110% during overlapping period (Jan 20 - Jan 25)
        Overlapping periods:
          Jan 20 - Jan 25: 110% (Project X, Project Y)
        ");
    }

    #[test]
    fn create_json_on_rejection() {
        let mut s = setup();
        let mut sink = Vec::new();
        let full = request(s.resource, s.project_x, date(1, 1), date(1, 31), 100);
        create(&mut sink, &mut s.service, &full, false).unwrap();

        let mut output = Vec::new();
        let more = request(s.resource, s.project_y, date(1, 31), date(2, 28), 10);
        assert!(!create(&mut output, &mut s.service, &more, true).unwrap());

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["total_percentage"], 100);
        assert_eq!(value["warnings"][0]["start"], "2026-01-31");
        assert_eq!(value["warnings"][0]["end"], "2026-01-31");
        assert!(value.get("allocation_id").is_none());
    }

    #[test]
    fn update_and_delete() {
        let mut s = setup();
        let mut output = Vec::new();
        let first = request(s.resource, s.project_x, date(1, 1), date(1, 31), 40);
        create(&mut output, &mut s.service, &first, false).unwrap();

        let id = AllocationId::new(1).unwrap();
        let changes = AllocationChanges {
            percentage: Some(Percentage::Percent(100)),
            ..AllocationChanges::default()
        };
        assert!(update(&mut output, &mut s.service, id, changes, false).unwrap());
        delete(&mut output, &mut s.service, id, false).unwrap();
        delete(&mut output, &mut s.service, id, false).unwrap();

        let missing = AllocationId::new(7).unwrap();
        assert!(!update(&mut output, &mut s.service, missing, changes, false).unwrap());

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Saved allocation #1. Peak total: 40%
        Saved allocation #1. Peak total: 100%
        Deleted allocation #1.
        Allocation #1 does not exist; nothing deleted.
        Error: Allocation not found
        ");
    }
}
