//! CLI subcommand implementations.

pub mod allocate;
pub mod projects;
pub mod resources;
pub mod roles;
pub mod seed;
pub mod status;
pub mod summary;
pub mod util;
