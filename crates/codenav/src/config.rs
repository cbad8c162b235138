use crate::error::{CodeNavError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning knobs for the navigation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeNavConfig {
    /// Budget of the shared hunk cache, in hunks (0 disables caching)
    pub hunk_cache_max_cost: usize,

    /// Referencing uploads fetched per remote batch
    pub maximum_indexes_per_moniker_search: usize,

    /// Maximum number of import monikers consulted for hover
    pub moniker_limit: usize,

    /// Maximum number of definition locations searched for hover text
    pub hover_definitions_limit: usize,

    /// Keep locations that cannot be translated into the requested commit,
    /// reported at the commit they were indexed at
    pub include_fallback_locations: bool,
}

impl Default for CodeNavConfig {
    fn default() -> Self {
        Self {
            hunk_cache_max_cost: 10_000,
            maximum_indexes_per_moniker_search: 500,
            moniker_limit: 10,
            hover_definitions_limit: 100,
            include_fallback_locations: true,
        }
    }
}

impl CodeNavConfig {
    /// Small batches and a small cache, for tests and short-lived tools
    pub fn for_testing() -> Self {
        Self {
            hunk_cache_max_cost: 100,
            maximum_indexes_per_moniker_search: 2,
            ..Default::default()
        }
    }

    /// Larger cache and batches for long-running servers with many indexes
    pub fn for_large_instances() -> Self {
        Self {
            hunk_cache_max_cost: 100_000,
            maximum_indexes_per_moniker_search: 2_000,
            ..Default::default()
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|err| CodeNavError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))
            .map_err(|err| CodeNavError::InvalidConfig(format!("{err:#}")))?;
        Self::from_toml_str(&raw)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.maximum_indexes_per_moniker_search == 0 {
            return Err(CodeNavError::InvalidConfig(
                "maximum_indexes_per_moniker_search must be > 0".to_string(),
            ));
        }

        if self.hover_definitions_limit == 0 {
            return Err(CodeNavError::InvalidConfig(
                "hover_definitions_limit must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_and_presets_are_valid() {
        assert!(CodeNavConfig::default().validate().is_ok());
        assert!(CodeNavConfig::for_testing().validate().is_ok());
        assert!(CodeNavConfig::for_large_instances().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = CodeNavConfig::from_toml_str("maximum_indexes_per_moniker_search = 50\n")
            .expect("parse");
        assert_eq!(config.maximum_indexes_per_moniker_search, 50);
        assert_eq!(config.hunk_cache_max_cost, 10_000);
        assert!(config.include_fallback_locations);
    }

    #[test]
    fn rejects_zero_batch_size() {
        let err = CodeNavConfig::from_toml_str("maximum_indexes_per_moniker_search = 0\n")
            .expect_err("invalid");
        assert!(matches!(err, CodeNavError::InvalidConfig(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("codenav.toml");
        std::fs::write(&path, "hunk_cache_max_cost = 0\nmoniker_limit = 3\n")
            .expect("write config");

        let config = CodeNavConfig::from_file(&path).expect("load");
        assert_eq!(config.hunk_cache_max_cost, 0);
        assert_eq!(config.moniker_limit, 3);

        let missing = CodeNavConfig::from_file(&dir.path().join("missing.toml"))
            .expect_err("missing file");
        assert!(missing.to_string().contains("Failed to read config file"));
    }
}
