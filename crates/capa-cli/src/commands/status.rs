//! Status command for showing where data lives and how much of it there is.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use capa_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let counts = db.table_counts()?;

    writeln!(writer, "Capacity allocation status")?;
    writeln!(writer, "Database: {}", database_path.display())?;

    if counts.roles == 0 {
        writeln!(writer, "No roles defined. Run `capa seed` to create the defaults.")?;
    }

    writeln!(writer, "Roles: {}", counts.roles)?;
    writeln!(writer, "Projects: {}", counts.projects)?;
    writeln!(writer, "Resources: {}", counts.resources)?;
    writeln!(writer, "Allocations: {}", counts.allocations)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn status_on_empty_database_suggests_seed() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, Path::new("[TEMP]/capa.db")).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Capacity allocation status
        Database: [TEMP]/capa.db
        No roles defined. Run `capa seed` to create the defaults.
        Roles: 0
        Projects: 0
        Resources: 0
        Allocations: 0
        ");
    }

    #[test]
    fn status_counts_records() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_role("Developer", true).unwrap();
        db.insert_project("Oliver").unwrap();
        db.insert_project("LP").unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, Path::new("[TEMP]/capa.db")).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Capacity allocation status
        Database: [TEMP]/capa.db
        Roles: 1
        Projects: 2
        Resources: 0
        Allocations: 0
        ");
    }
}
