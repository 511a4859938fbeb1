//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/forest/forest.toml`
//! 3. Local config: `./forest.toml`
//! 4. Environment variables: `FOREST_*` prefix, `__` between nested keys
//!    (e.g. `FOREST_DEFAULTS__ROOT_RATIO=0.3`)
//!
//! Command line flags override the loaded values in the command layer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use forest_core::EngineDefaults;

const APP_NAME: &str = "forest";
const ENV_PREFIX: &str = "FOREST";
const LOCAL_CONFIG_FILE: &str = "forest.toml";
const STORE_FILE_NAME: &str = "measurements.json";

/// Settings for the `forest` binary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Record store file
    pub store_path: Option<PathBuf>,

    /// Lock owner name
    pub user: Option<String>,

    /// Fallbacks for omitted stand parameters
    pub defaults: EngineDefaults,
}

impl CliConfig {
    /// Load from the standard locations and the process environment.
    pub fn load() -> Result<Self> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        Self::load_layers(global_config_path().as_deref(), Some(&local), None)
    }

    /// Load from explicit layers.
    ///
    /// `env` replaces the process environment when given.
    pub fn load_layers(
        global: Option<&Path>,
        local: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let defaults = EngineDefaults::default();
        let mut builder = Config::builder()
            .set_default("defaults.root_ratio", defaults.root_ratio)?
            .set_default("defaults.animal_emission_kg_day", defaults.animal_emission_kg_day)?
            .set_default("defaults.min_trees_for_plot", u64::from(defaults.min_trees_for_plot))?
            .set_default("defaults.carbon_fraction", defaults.carbon_fraction)?;

        for path in [global, local].into_iter().flatten() {
            if path.exists() {
                tracing::debug!("loading config {}", path.display());
                builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config = builder.build().context("Failed to build configuration")?;
        config.try_deserialize().context("Invalid configuration")
    }

    /// Store path from config, else the platform data directory.
    pub fn resolved_store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(default_store_path)
    }

    /// Lock owner from config, else the login name.
    pub fn resolved_user(&self) -> String {
        self.user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Global config file location, if a home directory can be determined.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join(LOCAL_CONFIG_FILE))
}

fn default_store_path() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().join(STORE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(STORE_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn test_compiled_defaults() {
        let config = CliConfig::load_layers(None, None, no_env()).unwrap();
        assert_eq!(config.defaults, EngineDefaults::default());
        assert_eq!(config.store_path, None);
        assert_eq!(config.user, None);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forest.toml");
        fs::write(
            &path,
            "store_path = \"/data/plots.json\"\n[defaults]\nroot_ratio = 0.3\nmin_trees_for_plot = 25\n",
        )
        .unwrap();

        let config = CliConfig::load_layers(None, Some(&path), no_env()).unwrap();
        assert_eq!(config.store_path, Some(PathBuf::from("/data/plots.json")));
        assert_eq!(config.defaults.root_ratio, 0.3);
        assert_eq!(config.defaults.min_trees_for_plot, 25);
        assert_eq!(config.defaults.carbon_fraction, EngineDefaults::default().carbon_fraction);
    }

    #[test]
    fn test_local_overrides_global() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        let local = dir.path().join("local.toml");
        fs::write(&global, "user = \"global\"\n[defaults]\ncarbon_fraction = 0.5\n").unwrap();
        fs::write(&local, "user = \"local\"\n").unwrap();

        let config = CliConfig::load_layers(Some(&global), Some(&local), no_env()).unwrap();
        assert_eq!(config.user.as_deref(), Some("local"));
        assert_eq!(config.defaults.carbon_fraction, 0.5);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forest.toml");
        fs::write(&path, "[defaults]\nroot_ratio = 0.3\n").unwrap();

        let env = HashMap::from([
            ("FOREST_DEFAULTS__ROOT_RATIO".to_string(), "0.35".to_string()),
            ("FOREST_USER".to_string(), "field-crew".to_string()),
        ]);
        let config = CliConfig::load_layers(None, Some(&path), Some(env)).unwrap();
        assert_eq!(config.defaults.root_ratio, 0.35);
        assert_eq!(config.user.as_deref(), Some("field-crew"));
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let missing = Path::new("/nonexistent/forest.toml");
        let config = CliConfig::load_layers(Some(missing), Some(missing), no_env()).unwrap();
        assert_eq!(config.defaults, EngineDefaults::default());
    }

    #[test]
    fn test_resolved_store_path_prefers_config() {
        let config = CliConfig {
            store_path: Some(PathBuf::from("plots.json")),
            ..Default::default()
        };
        assert_eq!(config.resolved_store_path(), PathBuf::from("plots.json"));
    }
}
