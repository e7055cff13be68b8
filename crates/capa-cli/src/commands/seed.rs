//! Seed command: create the configured roles on an empty database.

use std::io::Write;

use anyhow::{Context, Result};

use capa_db::{Database, SeedRole};

pub fn run<W: Write>(writer: &mut W, db: &mut Database, roles: &[SeedRole]) -> Result<()> {
    let created = db.bootstrap(roles).context("failed to seed roles")?;
    if created == 0 {
        writeln!(writer, "Roles already present; nothing to seed.")?;
    } else {
        writeln!(writer, "Created {created} roles.")?;
    }
    Ok(())
}
