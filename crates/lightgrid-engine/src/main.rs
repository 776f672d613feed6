//! Engine binary for the Lightgrid simulation.
//!
//! Wires together configuration, the activity grid, the frame loop and
//! the Observer API, then runs rounds until the operator stops the run or
//! the configured round limit is reached.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `LIGHTGRID_CONFIG` or `lightgrid-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the activity grid, if one is configured
//! 4. Create operator state from the run bounds
//! 5. Start the Observer API server
//! 6. Spawn the first round and run the frame loop
//! 7. Log the result and keep serving the final snapshot until `Ctrl-C`

mod error;
mod observer_callback;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lightgrid_core::config::{LoggingConfig, SimulationConfig};
use lightgrid_core::decision::HeuristicPolicy;
use lightgrid_core::operator::OperatorState;
use lightgrid_core::runner;
use lightgrid_core::tick::SimulationState;
use lightgrid_observer::{AppState, ServerConfig, start_server};
use lightgrid_world::ActivityGrid;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::observer_callback::ObserverCallback;

/// Config file used when `LIGHTGRID_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "lightgrid-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, the activity grid or the clock
/// settings are invalid, or if the observer server fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config_path = config_path();
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(config = %config_path.display(), "lightgrid-engine starting");
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        initial_interval_ms = config.clock.initial_interval_ms,
        min_interval_ms = config.clock.min_interval_ms,
        restart_delay_ms = config.clock.restart_delay_ms,
        lookahead = config.policy.lookahead,
        temperature = config.policy.temperature,
        "Configuration loaded"
    );

    // 3. Load the activity grid.
    let activity = match config.world.activity_grid_path.as_deref() {
        Some(path) => load_activity_grid(Path::new(path))?,
        None => {
            info!("No activity grid configured, using an empty grid");
            ActivityGrid::empty()
        }
    };

    // 4. Create operator state.
    let operator = Arc::new(OperatorState::new(
        config.clock.frame_interval_ms,
        &config.simulation,
    ));
    info!(
        max_rounds = operator.max_rounds(),
        frame_interval_ms = operator.frame_interval_ms(),
        "Operator state initialized"
    );

    // 5. Start the Observer API server.
    let app_state = Arc::new(AppState::with_operator(Arc::clone(&operator)));
    let server = if config.observer.enabled {
        let server_config = ServerConfig::from(&config.observer);
        let state = Arc::clone(&app_state);
        Some(tokio::spawn(async move {
            let result = start_server(&server_config, state).await;
            if let Err(e) = &result {
                error!(error = %e, "Observer server stopped");
            }
            result
        }))
    } else {
        info!("Observer disabled");
        None
    };

    // 6. Spawn the first round and run.
    let mut rng = SmallRng::seed_from_u64(config.world.seed);
    let mut sim = SimulationState::new(activity, config.clock, &mut rng, 0)?;
    let policy = HeuristicPolicy::new(&config.policy);
    let mut callback = ObserverCallback::new(app_state);

    let result =
        runner::run_simulation(&mut sim, &policy, &mut rng, &operator, &mut callback).await;

    // 7. Log results.
    runner::log_simulation_end(&result);
    if callback.skipped() > 0 {
        info!(
            deferred = callback.skipped(),
            "Observer snapshot updates deferred while readers held the lock"
        );
    }
    if callback.has_pending() {
        warn!("Last frames never reached the observer snapshot");
    }

    if let Some(handle) = server {
        info!("Observer keeps serving the final snapshot, press Ctrl-C to exit");
        tokio::select! {
            joined = handle => match joined {
                Ok(served) => served?,
                Err(e) => error!(error = %e, "Observer task panicked"),
            },
            _ = tokio::signal::ctrl_c() => info!("Ctrl-C received"),
        }
    }

    info!(
        end_reason = ?result.end_reason,
        rounds_completed = result.rounds_completed,
        "lightgrid-engine shutdown complete"
    );

    Ok(())
}

/// Resolve the config path from `LIGHTGRID_CONFIG`, falling back to
/// [`DEFAULT_CONFIG_PATH`] in the working directory.
fn config_path() -> PathBuf {
    std::env::var_os("LIGHTGRID_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the simulation configuration. A missing file means defaults.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        // Logging is not up yet; apply the same overrides a file would get.
        Ok(SimulationConfig::parse("")?)
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Read a 7x52 activity matrix from a JSON file.
fn load_activity_grid(path: &Path) -> Result<ActivityGrid, EngineError> {
    let contents = std::fs::read_to_string(path).map_err(|source| EngineError::ActivityGridIo {
        path: path.to_path_buf(),
        source,
    })?;
    let grid = serde_json::from_str(&contents).map_err(|source| EngineError::ActivityGridParse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Activity grid loaded");
    Ok(grid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lightgrid_types::{GRID_HEIGHT, GRID_WIDTH, Position};

    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("lightgrid-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn activity_grid_loads_from_json() {
        let mut rows = vec![vec![0_u8; GRID_WIDTH]; GRID_HEIGHT];
        if let Some(cell) = rows.get_mut(2).and_then(|r| r.get_mut(7)) {
            *cell = 3;
        }
        let path = write_temp("ok.json", &serde_json::to_string(&rows).unwrap());

        let grid = load_activity_grid(&path).unwrap();
        assert_eq!(grid.level_at(Position::new(7, 2)), 3);
        assert_eq!(grid.level_at(Position::new(0, 0)), 0);

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn malformed_activity_grid_is_a_parse_error() {
        let path = write_temp("short.json", "[[0, 1, 2]]");
        assert!(matches!(
            load_activity_grid(&path),
            Err(EngineError::ActivityGridParse { .. })
        ));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_activity_grid_is_an_io_error() {
        let path = std::env::temp_dir().join("lightgrid-does-not-exist.json");
        assert!(matches!(
            load_activity_grid(&path),
            Err(EngineError::ActivityGridIo { .. })
        ));
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = load_config(Path::new("/nonexistent/lightgrid-config.yaml")).unwrap();
        assert_eq!(config.clock, SimulationConfig::default().clock);
        assert!(config.observer.enabled);
    }
}
