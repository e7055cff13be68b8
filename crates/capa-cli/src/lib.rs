//! Capacity allocation CLI library.
//!
//! This crate provides the `capa` command-line interface over the allocation
//! engine and its SQLite store.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, ProjectAction, ResourceAction, RoleAction, WindowArgs};
pub use config::Config;
