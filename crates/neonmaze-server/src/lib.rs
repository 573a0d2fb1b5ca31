pub mod config;
pub mod game_loop;
pub mod health;
pub mod state;
pub mod ws;

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::task::JoinHandle;

use neonmaze_core::simulation::Simulation;

use config::ServerConfig;
use state::AppState;

/// Build the simulation from config, spawn its tick loop and wire up the
/// Axum router. Must be called inside a tokio runtime.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState, JoinHandle<()>) {
    let tuning = config.game.resolve_tuning();
    let seed = config.game.seed.unwrap_or_else(rand::random);
    let tick_interval_ms = config.game.tick_interval_ms();
    let sim = Simulation::new(tuning, seed, tick_interval_ms)
        .with_max_players(config.limits.max_players);
    tracing::info!(seed, tick_interval_ms, "Simulation ready");

    let (commands, status, loop_handle) =
        game_loop::spawn_game_loop(sim, Duration::from_millis(tick_interval_ms));
    let state = AppState::new(config, commands, status);

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health::health_check))
        .with_state(state.clone());

    (app, state, loop_handle)
}
