//! Configuration loading and typed config structures for the Lightgrid simulation.
//!
//! The canonical configuration lives in `lightgrid-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every field has a default, so an empty file yields a runnable setup.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds unusable values.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `lightgrid-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, activity grid source).
    #[serde(default)]
    pub world: WorldConfig,

    /// Tick pacing and restart timing.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Steering heuristic parameters.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Observer API settings.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Run boundaries.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `LIGHTGRID_SEED` overrides `world.seed`
    /// - `LIGHTGRID_OBSERVER_PORT` overrides `observer.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml reads an empty document as null rather than an empty map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LIGHTGRID_SEED") {
            match val.parse() {
                Ok(seed) => self.world.seed = seed,
                Err(e) => warn!(value = %val, error = %e, "Ignoring invalid LIGHTGRID_SEED"),
            }
        }
        if let Ok(val) = std::env::var("LIGHTGRID_OBSERVER_PORT") {
            match val.parse() {
                Ok(port) => self.observer.port = port,
                Err(e) => {
                    warn!(value = %val, error = %e, "Ignoring invalid LIGHTGRID_OBSERVER_PORT");
                }
            }
        }
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clock.validate()?;
        self.policy.validate()
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for spawn headings and steering draws.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Optional path to a JSON file holding the 7x52 activity matrix.
    /// When absent the background is empty.
    #[serde(default)]
    pub activity_grid_path: Option<String>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            activity_grid_path: None,
        }
    }
}

/// Tick pacing and restart timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ClockConfig {
    /// Tick interval at the start of every round.
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    /// Fastest allowed tick interval.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// How much the interval shrinks per speed step.
    #[serde(default = "default_speed_step_ms")]
    pub speed_step_ms: u64,

    /// Round time between speed steps.
    #[serde(default = "default_speed_step_every_ms")]
    pub speed_step_every_ms: u64,

    /// Wall-clock pause between the end of a round and the next one.
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,

    /// How often the runner drives a frame.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl ClockConfig {
    /// Check that the pacing values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if any interval is zero or the
    /// minimum exceeds the initial interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_interval_ms == 0 {
            return Err(invalid("clock.min_interval_ms must be at least 1"));
        }
        if self.min_interval_ms > self.initial_interval_ms {
            return Err(invalid(
                "clock.min_interval_ms must not exceed clock.initial_interval_ms",
            ));
        }
        if self.speed_step_every_ms == 0 {
            return Err(invalid("clock.speed_step_every_ms must be at least 1"));
        }
        if self.frame_interval_ms == 0 {
            return Err(invalid("clock.frame_interval_ms must be at least 1"));
        }
        Ok(())
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_interval_ms(),
            min_interval_ms: default_min_interval_ms(),
            speed_step_ms: default_speed_step_ms(),
            speed_step_every_ms: default_speed_step_every_ms(),
            restart_delay_ms: default_restart_delay_ms(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

/// Steering heuristic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PolicyConfig {
    /// How far ahead the safety-distance feature looks.
    #[serde(default = "default_lookahead")]
    pub lookahead: u32,

    /// Softmax temperature. Lower is greedier.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Linear feature weights.
    #[serde(default)]
    pub weights: FeatureWeights,
}

impl PolicyConfig {
    /// Check that the heuristic parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the lookahead is zero, the
    /// temperature is not a positive finite number, or any weight is not
    /// finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookahead == 0 {
            return Err(invalid("policy.lookahead must be at least 1"));
        }
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(invalid("policy.temperature must be a positive finite number"));
        }
        if !self.weights.all_finite() {
            return Err(invalid("policy.weights must all be finite"));
        }
        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            lookahead: default_lookahead(),
            temperature: default_temperature(),
            weights: FeatureWeights::default(),
        }
    }
}

/// Linear weights applied to each steering feature.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FeatureWeights {
    /// Weight of the clear run ahead.
    #[serde(default = "default_w_safety_distance")]
    pub safety_distance: f64,
    /// Weight of free cells around the next cell.
    #[serde(default = "default_w_open_space")]
    pub open_space: f64,
    /// Weight of distance from the nearest border.
    #[serde(default = "default_w_edge_distance")]
    pub edge_distance: f64,
    /// Weight of moving away from recently visited cells.
    #[serde(default = "default_w_path_diversity")]
    pub path_diversity: f64,
    /// Weight of keeping the current heading.
    #[serde(default = "default_w_continuity")]
    pub continuity: f64,
    /// Weight of entering low-activity cells.
    #[serde(default = "default_w_exploration")]
    pub exploration: f64,
    /// Weight of entering a blocked cell (negative).
    #[serde(default = "default_w_avoidance")]
    pub avoidance: f64,
    /// Weight of onward moves available from the next cell.
    #[serde(default = "default_w_future_options")]
    pub future_options: f64,
}

impl FeatureWeights {
    fn all_finite(&self) -> bool {
        [
            self.safety_distance,
            self.open_space,
            self.edge_distance,
            self.path_diversity,
            self.continuity,
            self.exploration,
            self.avoidance,
            self.future_options,
        ]
        .iter()
        .all(|w| w.is_finite())
    }
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            safety_distance: default_w_safety_distance(),
            open_space: default_w_open_space(),
            edge_distance: default_w_edge_distance(),
            path_diversity: default_w_path_diversity(),
            continuity: default_w_continuity(),
            exploration: default_w_exploration(),
            avoidance: default_w_avoidance(),
            future_options: default_w_future_options(),
        }
    }
}

/// Observer API settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to start the observer server.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Run boundaries. A value of 0 means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Stop after this many rounds have ended (0 = run forever).
    #[serde(default)]
    pub max_rounds: u64,
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

fn default_world_name() -> String {
    "Lightgrid".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_initial_interval_ms() -> u64 {
    150
}

const fn default_min_interval_ms() -> u64 {
    60
}

const fn default_speed_step_ms() -> u64 {
    10
}

const fn default_speed_step_every_ms() -> u64 {
    10_000
}

const fn default_restart_delay_ms() -> u64 {
    1_000
}

const fn default_frame_interval_ms() -> u64 {
    16
}

const fn default_lookahead() -> u32 {
    10
}

const fn default_temperature() -> f64 {
    0.5
}

const fn default_w_safety_distance() -> f64 {
    15.0
}

const fn default_w_open_space() -> f64 {
    8.0
}

const fn default_w_edge_distance() -> f64 {
    5.0
}

const fn default_w_path_diversity() -> f64 {
    3.0
}

const fn default_w_continuity() -> f64 {
    2.0
}

const fn default_w_exploration() -> f64 {
    4.0
}

const fn default_w_avoidance() -> f64 {
    -20.0
}

const fn default_w_future_options() -> f64 {
    6.0
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
