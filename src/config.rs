//! Configuration for the lattice simulation.
//!
//! Every biological constant the model depends on lives here rather than as
//! a scattered literal, so a run is fully described by its config and seed.
//! Supports YAML configuration files with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub lattice: LatticeConfig,
    pub cells: CellConfig,
    pub immune: ImmuneConfig,
    pub safety: SafetyConfig,
    pub logging: LoggingConfig,
}

/// Lattice/environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatticeConfig {
    /// Grid width in sites
    pub width: usize,
    /// Grid height in sites
    pub height: usize,
    /// Whether the seed cell placed by the runner is immortal
    pub seed_immortal: bool,
    /// Cells may relocate every Nth tick (1 = every tick, 0 = never)
    pub movement_interval: u64,
}

/// Tumor cell configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellConfig {
    /// Simulated hours per tick
    pub tick_hours: f32,
    /// Age in hours below which division is disallowed
    pub mature_age: f32,
    /// Division budget for a default finite cell
    pub division_budget: u32,
    /// Starting apoptosis probability of a finite cell
    pub base_apoptosis: f32,
    /// Probability that an immortal parent's daughter is itself immortal
    pub immortal_mutation_rate: f32,
}

/// Immune response configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImmuneConfig {
    /// Simulated hour after which immune cells spawn and attack
    pub activation_hour: f32,
    /// Apoptosis-probability increment applied to a finite target per attack
    pub pressure_finite: f32,
    /// Apoptosis-probability increment applied to an immortal target per attack
    pub pressure_immortal: f32,
}

/// Safety limits to prevent runaway simulations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Maximum ticks per run. Extinction is not mathematically guaranteed,
    /// so every run is bounded and a capped run is a distinct outcome.
    pub max_ticks: u64,
}

/// Logging and stats configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Ticks between stats history snapshots
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lattice: LatticeConfig::default(),
            cells: CellConfig::default(),
            immune: ImmuneConfig::default(),
            safety: SafetyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            seed_immortal: true,
            movement_interval: 1,
        }
    }
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            tick_hours: 1.6,
            mature_age: 24.0,
            division_budget: 10,
            base_apoptosis: 0.1,
            immortal_mutation_rate: 0.01,
        }
    }
}

impl Default for ImmuneConfig {
    fn default() -> Self {
        Self {
            activation_hour: 400.0,
            pressure_finite: 0.01,
            pressure_immortal: 0.005,
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_ticks: 1_000_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 1,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.lattice.width == 0 || self.lattice.height == 0 {
            return Err("lattice dimensions must be > 0".to_string());
        }
        if self.lattice.width > 1024 || self.lattice.height > 1024 {
            return Err("lattice dimensions must be <= 1024".to_string());
        }
        if self.cells.tick_hours <= 0.0 {
            return Err("tick_hours must be > 0".to_string());
        }
        if self.cells.mature_age < 0.0 {
            return Err("mature_age must be >= 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.cells.base_apoptosis) {
            return Err("base_apoptosis must be in [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.cells.immortal_mutation_rate) {
            return Err("immortal_mutation_rate must be in [0, 1]".to_string());
        }
        if self.immune.pressure_finite < 0.0 || self.immune.pressure_immortal < 0.0 {
            return Err("immune pressure increments must be >= 0".to_string());
        }
        if self.safety.max_ticks == 0 {
            return Err("max_ticks must be > 0".to_string());
        }
        if self.logging.stats_interval == 0 {
            return Err("stats_interval must be > 0".to_string());
        }
        Ok(())
    }
}

/// Errors that can occur while loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_constants() {
        let config = Config::default();
        assert_eq!(config.cells.tick_hours, 1.6);
        assert_eq!(config.cells.mature_age, 24.0);
        assert_eq!(config.cells.division_budget, 10);
        assert_eq!(config.immune.activation_hour, 400.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.lattice.width, loaded.lattice.width);
        assert_eq!(config.cells.division_budget, loaded.cells.division_budget);
    }

    #[test]
    fn test_invalid_dimensions_rejected() {
        let mut config = Config::default();
        config.lattice.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_apoptosis_rejected() {
        let mut config = Config::default();
        config.cells.base_apoptosis = 1.5;
        assert!(config.validate().is_err());
    }
}
