use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::search::move_ordering::OrderingWeights;

/// Everything tunable about the engine, stored as TOML.
///
/// ```toml
/// [search]
/// hash_size_mb = 64
///
/// [ordering]
/// killer_bonus = 30000
/// ```
///
/// Missing tables and keys fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: SearchConfig,
    pub ordering: OrderingWeights,
    pub eval: EvalParams,
}

impl EngineConfig {
    /// Save to TOML File
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> miette::Result<()> {
        let path = path.as_ref();
        let toml_string = toml::to_string_pretty(self).into_diagnostic()?;
        fs::write(path, toml_string)
            .into_diagnostic()
            .with_context(|| format!("Writing config to {}", path.display()))?;
        info!("Config written to {}", path.display());
        Ok(())
    }

    /// Load from a TOML File
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> miette::Result<Self> {
        let path = path.as_ref();
        let file_content = fs::read_to_string(path)
            .into_diagnostic()
            .with_context(|| format!("Reading config from {}", path.display()))?;
        Self::from_toml(&file_content)
            .with_context(|| format!("Parsing config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> miette::Result<Self> {
        let config: Self = toml::from_str(text).into_diagnostic()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> miette::Result<()> {
        let search = &self.search;
        miette::ensure!(search.hash_size_mb > 0, "hash_size_mb must be positive");
        miette::ensure!(
            search.aspiration_window >= 0,
            "aspiration_window must not be negative"
        );
        miette::ensure!(
            search.aspiration_growth >= 2,
            "aspiration_growth must be at least 2, got {}",
            search.aspiration_growth
        );
        miette::ensure!(
            self.eval.material.iter().all(|&v| v > 0),
            "material values must be positive"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_tables_override_defaults() {
        let config = EngineConfig::from_toml(
            "[search]\nhash_size_mb = 2\nzobrist_seed = 7\n\n[ordering]\nkiller_bonus = 1234\n",
        )
        .unwrap();
        assert_eq!(config.search.hash_size_mb, 2);
        assert_eq!(config.search.zobrist_seed, Some(7));
        assert!(config.search.enable_tt);
        assert_eq!(config.ordering.killer_bonus, 1234);
        assert_eq!(config.eval, EvalParams::default());
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(EngineConfig::from_toml("[search]\naspiration_growth = 1\n").is_err());
        assert!(EngineConfig::from_toml("[search]\nhash_size_mb = \"big\"\n").is_err());
        assert!(EngineConfig::from_toml("[eval]\nmaterial = [0, 1, 1, 1, 1]\n").is_err());
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("pinboard_config_{}.toml", std::process::id()));
        let mut config = EngineConfig::default();
        config.search.hash_size_mb = 8;
        config.ordering.check_bonus = 999;
        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(config, loaded);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(EngineConfig::load_from_file("/nonexistent/pinboard.toml").is_err());
    }
}
