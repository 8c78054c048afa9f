use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating a [`TrainerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: u16,
    pub height: u16,
    /// Pixel size of one cell in the window front-end.
    pub cell_px: u16,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { width: 40, height: 40, cell_px: 20 }
    }
}

/// Per-agent simulation rules. Copied into every agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentRules {
    /// Moves allowed without reaching a target before the agent starves.
    pub max_steps_without_target: u32,
    /// Fitness weight of one reached target (`K` in `score * K + length`).
    pub score_weight: u64,
    /// Body length treated as 1.0 in the observation vector.
    pub length_norm: f64,
}

impl Default for AgentRules {
    fn default() -> Self {
        Self { max_steps_without_target: 300, score_weight: 300, length_norm: 100.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionParams {
    /// Share of each generation copied unchanged into the next.
    pub elite_fraction: f64,
    /// Number of top-ranked agents parents are drawn from.
    pub parent_pool: usize,
    /// Per-weight mutation probability.
    pub mutation_rate: f64,
    /// Standard deviation of the gaussian added to a mutated weight.
    pub mutation_magnitude: f64,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            elite_fraction: 0.1,
            parent_pool: 50,
            mutation_rate: 0.05,
            mutation_magnitude: 0.3,
        }
    }
}

impl EvolutionParams {
    pub fn elite_count(&self, population: usize) -> usize {
        (population as f64 * self.elite_fraction).floor() as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.elite_fraction) {
            return Err(ConfigError::InvalidConfig("elite_fraction must be in [0, 1)"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::InvalidConfig("mutation_rate must be in [0, 1]"));
        }
        if !self.mutation_magnitude.is_finite() || self.mutation_magnitude < 0.0 {
            return Err(ConfigError::InvalidConfig(
                "mutation_magnitude must be finite and non-negative",
            ));
        }
        if self.parent_pool == 0 {
            return Err(ConfigError::InvalidConfig("parent_pool must be positive"));
        }
        Ok(())
    }
}

/// Static configuration for a training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub grid: GridConfig,
    pub population_size: usize,
    pub rules: AgentRules,
    pub evolution: EvolutionParams,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
    pub save_path: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            population_size: 200,
            rules: AgentRules::default(),
            evolution: EvolutionParams::default(),
            rng_seed: None,
            save_path: PathBuf::from("best_snake.bin"),
        }
    }
}

impl TrainerConfig {
    /// Reads a JSON config; absent fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::InvalidConfig("population_size must be positive"));
        }
        if self.grid.width < 2 || self.grid.height < 2 {
            return Err(ConfigError::InvalidConfig("grid must be at least 2x2"));
        }
        if self.grid.cell_px == 0 {
            return Err(ConfigError::InvalidConfig("cell_px must be non-zero"));
        }
        if self.rules.max_steps_without_target == 0 {
            return Err(ConfigError::InvalidConfig(
                "max_steps_without_target must be positive",
            ));
        }
        if self.rules.score_weight == 0 {
            return Err(ConfigError::InvalidConfig("score_weight must be positive"));
        }
        if !self.rules.length_norm.is_finite() || self.rules.length_norm <= 0.0 {
            return Err(ConfigError::InvalidConfig("length_norm must be positive"));
        }
        self.evolution.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TrainerConfig::default();
        config.validate().expect("default config should validate");
        assert_eq!(config.evolution.elite_count(config.population_size), 20);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = TrainerConfig { population_size: 0, ..TrainerConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidConfig(_))));

        config = TrainerConfig::default();
        config.evolution.elite_fraction = 1.0;
        assert!(config.validate().is_err());

        config = TrainerConfig::default();
        config.evolution.elite_fraction = -0.1;
        assert!(config.validate().is_err());

        config = TrainerConfig::default();
        config.evolution.mutation_rate = 1.5;
        assert!(config.validate().is_err());

        config = TrainerConfig::default();
        config.evolution.mutation_rate = 1.0;
        assert!(config.validate().is_ok());

        config = TrainerConfig::default();
        config.grid.width = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TrainerConfig =
            serde_json::from_str(r#"{ "population_size": 12, "evolution": { "parent_pool": 4 } }"#)
                .expect("parse");
        assert_eq!(config.population_size, 12);
        assert_eq!(config.evolution.parent_pool, 4);
        assert_eq!(config.evolution.mutation_rate, 0.05);
        assert_eq!(config.grid, GridConfig::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = TrainerConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
