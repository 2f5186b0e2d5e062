//! Engine configuration
//!
//! Layered, lowest priority first:
//! 1. Built-in defaults
//! 2. Configuration file (TOML, JSON or YAML, by extension)
//! 3. Environment variables prefixed `STRATEGY__`, sections separated by `__`
//!    (`STRATEGY__SCENARIO__GRID_SIZE=801`)

use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{StrategyError, StrategyResult};
use crate::data::SnapshotPaths;
use crate::models::{ScenarioParams, DEFAULT_GRID_SIZE};
use crate::patterns::MatcherConfig;
use crate::risk::FeeSchedule;

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "STRATEGY";

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub data: DataConfig,
    pub scenario: ScenarioConfig,
    pub fees: FeeSchedule,
    pub portfolio: PortfolioConfig,
    pub matcher: MatcherConfig,
}

/// Input file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub snapshot: SnapshotPaths,
    /// Strategy template library
    pub templates: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            snapshot: SnapshotPaths::default(),
            templates: PathBuf::from("./data/st_template.json"),
        }
    }
}

/// Valuation scenario defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Contract multiplier used when the snapshot publishes none
    /// Default: 200
    pub multiplier: f64,

    /// Default: 0.015
    pub risk_free_rate: f64,

    /// Scale on every leg's time to expiry (1.0 = today, 0.5 = halfway)
    /// Default: 1.0
    pub time_scale: f64,

    /// Relative volatility shift in percent
    /// Default: 0.0
    pub vol_shift_pct: f64,

    /// Default: 401
    pub grid_size: usize,

    /// Centre the grid and the detection ATM here instead of the legs' strikes
    pub manual_spot: Option<f64>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            multiplier: 200.0,
            risk_free_rate: 0.015,
            time_scale: 1.0,
            vol_shift_pct: 0.0,
            grid_size: DEFAULT_GRID_SIZE,
            manual_spot: None,
        }
    }
}

impl ScenarioConfig {
    /// Scenario valued on `valuation_date`
    pub fn to_params(&self, valuation_date: NaiveDate) -> ScenarioParams {
        ScenarioParams {
            manual_spot: self.manual_spot.filter(|s| *s > 0.0),
            vol_shift_pct: self.vol_shift_pct,
            time_scale: self.time_scale,
            risk_free_rate: self.risk_free_rate,
            grid_size: self.grid_size,
            valuation_date,
        }
    }
}

/// Account settings for the solvency checks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Default: 50,000
    pub initial_balance: f64,

    /// Underlying price for the what-if estimate
    /// Default: 700
    pub estimate_price: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            initial_balance: 50_000.0,
            estimate_price: 700.0,
        }
    }
}

impl EngineConfig {
    /// Volatility up 20% with half the time left
    pub fn stressed() -> Self {
        Self {
            scenario: ScenarioConfig {
                vol_shift_pct: 20.0,
                time_scale: 0.5,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Finer grid for wide strategies
    pub fn high_resolution() -> Self {
        Self {
            scenario: ScenarioConfig {
                grid_size: 1601,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> StrategyResult<()> {
        self.scenario
            .to_params(NaiveDate::MIN)
            .validate()
            .map_err(|e| StrategyError::config(e.to_string()))?;

        if !self.scenario.multiplier.is_finite() || self.scenario.multiplier <= 0.0 {
            return Err(StrategyError::config(format!(
                "multiplier must be positive, got {}",
                self.scenario.multiplier
            )));
        }
        if [self.fees.option_fee, self.fees.future_fee]
            .iter()
            .any(|f| !f.is_finite() || *f < 0.0)
        {
            return Err(StrategyError::config("fees must be non-negative"));
        }
        if !self.portfolio.initial_balance.is_finite() || !self.portfolio.estimate_price.is_finite() {
            return Err(StrategyError::config(
                "initial balance and estimate price must be finite",
            ));
        }
        if self.matcher.max_legs == 0 || self.matcher.default_strike_step <= 0.0 {
            return Err(StrategyError::config(
                "matcher needs at least one leg and a positive strike step",
            ));
        }
        Ok(())
    }
}

/// Load configuration from an optional file and the environment
pub fn load_config(config_path: Option<&Path>) -> StrategyResult<EngineConfig> {
    let env = Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true);
    load_with_env(config_path, env)
}

fn load_with_env(config_path: Option<&Path>, env: Environment) -> StrategyResult<EngineConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if !path.exists() {
            return Err(StrategyError::config(format!(
                "config file {} not found",
                path.display()
            )));
        }
        builder = builder.add_source(File::from(path));
    }
    builder = builder.add_source(env);

    let config: EngineConfig = builder
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| StrategyError::config(e.to_string()))?;

    config.validate()?;
    tracing::debug!("Engine configuration: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(Some(source))
    }

    fn toml_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = load_with_env(None, env(&[])).unwrap();
        assert_eq!(config.scenario.multiplier, 200.0);
        assert_eq!(config.scenario.grid_size, 401);
        assert_eq!(config.fees, FeeSchedule::default());
        assert_eq!(config.portfolio.initial_balance, 50_000.0);
        assert_eq!(config.matcher.max_legs, 8);
        assert_eq!(config.data.templates, PathBuf::from("./data/st_template.json"));
    }

    #[test]
    fn test_file_then_environment() {
        let file = toml_file(
            r#"
            [scenario]
            grid_size = 801
            manual_spot = 910.0

            [fees]
            option_fee = 50.0

            [data.snapshot]
            option_market = "/tmp/options.json"
            "#,
        );

        let config = load_with_env(
            Some(file.path()),
            env(&[("STRATEGY__SCENARIO__GRID_SIZE", "1001"), ("STRATEGY__PORTFOLIO__INITIAL_BALANCE", "75000")]),
        )
        .unwrap();

        assert_eq!(config.scenario.grid_size, 1001);
        assert_eq!(config.scenario.manual_spot, Some(910.0));
        assert_eq!(config.scenario.risk_free_rate, 0.015);
        assert_eq!(config.fees.option_fee, 50.0);
        assert_eq!(config.fees.future_fee, 83.567);
        assert_eq!(config.portfolio.initial_balance, 75_000.0);
        assert_eq!(config.data.snapshot.option_market, PathBuf::from("/tmp/options.json"));
        assert!(config.data.snapshot.future_market.is_some());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let file = toml_file("[scenario]\ntime_scale = 0.0\n");
        assert!(matches!(
            load_with_env(Some(file.path()), env(&[])),
            Err(StrategyError::Config(_))
        ));

        let mut config = EngineConfig::default();
        config.scenario.grid_size = 1;
        assert!(config.validate().is_err());

        // A huge grid from the environment is refused before anything is allocated
        assert!(matches!(
            load_with_env(None, env(&[("STRATEGY__SCENARIO__GRID_SIZE", "1000000000")])),
            Err(StrategyError::Config(_))
        ));

        let mut config = EngineConfig::default();
        config.fees.future_fee = -1.0;
        assert!(config.validate().is_err());

        assert!(load_with_env(Some(Path::new("/nonexistent/engine.toml")), env(&[])).is_err());
    }

    #[test]
    fn test_presets_are_valid() {
        for config in [EngineConfig::default(), EngineConfig::stressed(), EngineConfig::high_resolution()] {
            config.validate().unwrap();
        }

        let params = EngineConfig::stressed()
            .scenario
            .to_params(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        assert_eq!(params.vol_shift_pct, 20.0);
        assert_eq!(params.time_scale, 0.5);
        assert_eq!(params.manual_spot, None);
    }
}
