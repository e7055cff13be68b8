//! Role commands.

use std::io::Write;

use anyhow::Result;

use capa_db::Database;

/// Lists roles, marking the ones whose allocations need a percentage.
pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let roles = db.list_roles()?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&roles)?)?;
        return Ok(());
    }

    if roles.is_empty() {
        writeln!(writer, "No roles defined.")?;
        return Ok(());
    }

    for role in roles {
        let capacity = if role.requires_capacity {
            "capacity tracked"
        } else {
            "untracked"
        };
        writeln!(writer, "#{:<3} {:<16} {capacity}", role.id, role.name)?;
    }
    Ok(())
}

pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    name: &str,
    requires_capacity: bool,
) -> Result<()> {
    let id = db.insert_role(name, requires_capacity)?;
    writeln!(writer, "Saved role '{name}' (#{id}).")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn list_shows_capacity_flag() {
        let mut db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        add(&mut output, &mut db, "Scrum Master", false).unwrap();
        add(&mut output, &mut db, "Developer", true).unwrap();
        list(&mut output, &db, false).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Saved role 'Scrum Master' (#1).
        Saved role 'Developer' (#2).
        #1   Scrum Master     untracked
        #2   Developer        capacity tracked
        ");
    }

    #[test]
    fn list_json() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_role("QA", true).unwrap();
        let mut output = Vec::new();
        list(&mut output, &db, true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "id": 1, "name": "QA", "requires_capacity": true }])
        );
    }
}
