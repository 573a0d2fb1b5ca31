use serde::Deserialize;

use neonmaze_core::config::{GameTuning, TuningError};
use neonmaze_core::net::protocol::{DEFAULT_TICK_RATE_HZ, MAX_MESSAGE_SIZE};
use neonmaze_core::simulation::DEFAULT_MAX_PLAYERS;

/// Highest tick rate the loop will accept.
pub const MAX_TICK_RATE_HZ: u32 = 240;

/// Top-level server configuration, loaded from `neonmaze.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub limits: LimitsConfig,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            limits: LimitsConfig::default(),
            game: GameConfig::default(),
        }
    }
}

/// Infrastructure limits (connection caps, buffer sizes, rate limits).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Connections beyond this count receive `server_full` and are closed.
    pub max_players: usize,
    /// Outbound frames buffered per connection before frames are dropped.
    pub player_message_buffer: usize,
    pub ws_rate_limit_per_sec: f64,
    pub max_message_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            player_message_buffer: 256,
            ws_rate_limit_per_sec: 60.0,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

/// Simulation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tick_rate_hz: u32,
    /// Fixed RNG seed. Drawn from OS entropy when absent.
    pub seed: Option<u64>,
    /// Inline tuning table. Falls back to [`GameTuning::load`] when absent.
    pub tuning: Option<GameTuning>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            seed: None,
            tuning: None,
        }
    }
}

impl GameConfig {
    /// Milliseconds between simulation steps.
    pub fn tick_interval_ms(&self) -> u64 {
        1000 / u64::from(self.tick_rate_hz.max(1))
    }

    pub fn resolve_tuning(&self) -> GameTuning {
        self.tuning.clone().unwrap_or_else(GameTuning::load)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("listen_addr {0:?} is not a valid socket address")]
    InvalidListenAddr(String),
    #[error("game.tick_rate_hz must be between 1 and {MAX_TICK_RATE_HZ}, got {0}")]
    InvalidTickRate(u32),
    #[error("limits.max_players must be > 0")]
    ZeroMaxPlayers,
    #[error("limits.player_message_buffer must be > 0")]
    ZeroMessageBuffer,
    #[error("limits.ws_rate_limit_per_sec must be > 0")]
    InvalidRateLimit,
    #[error("limits.max_message_size must be between 1 and {MAX_MESSAGE_SIZE}")]
    InvalidMessageSize,
    #[error("game.tuning: {0}")]
    Tuning(#[from] TuningError),
}

impl ServerConfig {
    /// Check the loaded values before anything binds or spawns.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidListenAddr(self.listen_addr.clone()));
        }
        if self.game.tick_rate_hz == 0 || self.game.tick_rate_hz > MAX_TICK_RATE_HZ {
            return Err(ConfigError::InvalidTickRate(self.game.tick_rate_hz));
        }
        if self.limits.max_players == 0 {
            return Err(ConfigError::ZeroMaxPlayers);
        }
        if self.limits.player_message_buffer == 0 {
            return Err(ConfigError::ZeroMessageBuffer);
        }
        let rate = self.limits.ws_rate_limit_per_sec;
        if rate.is_nan() || rate <= 0.0 {
            return Err(ConfigError::InvalidRateLimit);
        }
        if self.limits.max_message_size == 0 || self.limits.max_message_size > MAX_MESSAGE_SIZE {
            return Err(ConfigError::InvalidMessageSize);
        }
        self.game.resolve_tuning().validate()?;
        if self.game.seed.is_some() {
            tracing::info!("Using a fixed simulation seed");
        }
        Ok(())
    }

    /// Load config from `neonmaze.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("neonmaze.toml") {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from neonmaze.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse neonmaze.toml: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No neonmaze.toml found, using defaults");
                ServerConfig::default()
            },
        };

        if let Ok(addr) = std::env::var("NEONMAZE_LISTEN_ADDR")
            && !addr.is_empty()
        {
            config.listen_addr = addr;
        }
        if let Ok(val) = std::env::var("NEONMAZE_TICK_RATE")
            && let Ok(n) = val.parse::<u32>()
        {
            config.game.tick_rate_hz = n;
        }
        if let Ok(val) = std::env::var("NEONMAZE_MAX_PLAYERS")
            && let Ok(n) = val.parse::<usize>()
        {
            config.limits.max_players = n;
        }
        if let Ok(val) = std::env::var("NEONMAZE_SEED")
            && let Ok(n) = val.parse::<u64>()
        {
            config.game.seed = Some(n);
        }
        if let Ok(val) = std::env::var("NEONMAZE_WS_RATE_LIMIT")
            && let Ok(n) = val.parse::<f64>()
        {
            config.limits.ws_rate_limit_per_sec = n;
        }

        config
    }
}
