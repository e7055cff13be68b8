//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use capa_db::SeedRole;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// How long a write waits for another writer's lock, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Roles created by `capa seed` on an empty database.
    pub roles: Vec<SeedRole>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .field("roles", &self.roles.len())
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("capa.db"),
            busy_timeout_ms: 5000,
            roles: default_roles(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (CAPA_*)
        figment = figment.merge(Env::prefixed("CAPA_"));

        figment.extract()
    }

    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn default_roles() -> Vec<SeedRole> {
    [
        ("Product Owner", false),
        ("Scrum Master", false),
        ("BA", false),
        ("Developer", true),
        ("QA", true),
    ]
    .into_iter()
    .map(|(name, requires_capacity)| SeedRole {
        name: name.to_string(),
        requires_capacity,
    })
    .collect()
}

/// Returns the platform-specific config directory for capa.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("capa"))
}

/// Returns the platform-specific data directory for capa.
///
/// On Linux: `~/.local/share/capa`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("capa"))
}
