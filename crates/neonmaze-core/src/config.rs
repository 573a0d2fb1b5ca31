use serde::{Deserialize, Serialize};

use crate::effects::EffectKind;
use crate::geometry::GameTime;

/// Per-effect durations in milliseconds. Pure lookup; never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectTable {
    pub speed_up_ms: GameTime,
    pub frozen_ms: GameTime,
    pub confused_ms: GameTime,
    pub shield_ms: GameTime,
    pub slowed_ms: GameTime,
}

impl Default for EffectTable {
    fn default() -> Self {
        Self {
            speed_up_ms: 5000,
            frozen_ms: 3000,
            confused_ms: 7000,
            shield_ms: 10_000,
            slowed_ms: 5000,
        }
    }
}

impl EffectTable {
    pub fn duration(&self, kind: EffectKind) -> GameTime {
        match kind {
            EffectKind::SpeedUp => self.speed_up_ms,
            EffectKind::Frozen => self.frozen_ms,
            EffectKind::Confused => self.confused_ms,
            EffectKind::Shield => self.shield_ms,
            EffectKind::Slowed => self.slowed_ms,
        }
    }
}

/// A tuning value the simulation cannot run with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TuningError {
    #[error("{field} must be within [0, 1], got {value}")]
    Probability { field: &'static str, value: f64 },
    #[error("min_map_{axis} ({min}) exceeds max_map_{axis} ({max})")]
    MapRange {
        axis: &'static str,
        min: u32,
        max: u32,
    },
    #[error("cell_size must be a positive number, got {0}")]
    CellSize(f32),
    #[error("rounds_per_level must be at least 1")]
    ZeroRoundsPerLevel,
}

/// Clamp a chance into [0, 1] for `random_bool`; NaN counts as never.
pub(crate) fn chance(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

/// Data-driven tuning for the arena simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameTuning {
    /// Side length of one grid cell in map units.
    pub cell_size: f32,
    /// Largest map the screen-size negotiation may produce (cells).
    pub max_map_width: u32,
    pub max_map_height: u32,
    /// Smallest map the screen-size negotiation may produce (cells).
    pub min_map_width: u32,
    pub min_map_height: u32,

    pub dot_value: u64,
    pub power_pellet_value: u64,
    pub power_pellet_count: u32,
    /// Probability that an interior cell is left without a dot at level 0.
    pub dot_empty_base: f64,
    /// Added to the empty-cell probability for every difficulty level.
    pub dot_empty_per_level: f64,
    pub base_item_count: u32,
    pub base_trap_count: u32,
    /// Bounded retry cap when looking for a free cell.
    pub placement_attempts: u32,

    /// Spike (lethal) trap probability is `spike_base_chance + level * spike_chance_per_level`.
    pub spike_base_chance: f64,
    pub spike_chance_per_level: f64,
    /// Rolls below this (and above the spike share) become slow traps; the rest teleport.
    pub slow_upper_bound: f64,
    /// Proximity warning radius in cells.
    pub trap_detection_cells: f32,

    /// Player movement in map units per tick.
    pub player_base_speed: f32,
    pub slow_multiplier: f32,
    pub speed_up_multiplier: f32,
    pub powered_duration_ms: i64,
    pub bomb_radius: f32,
    pub enemy_bounty: u64,

    pub enemy_base_speed: f32,
    pub enemy_speed_per_level: f32,
    pub enemy_decision_cooldown_ms: GameTime,
    pub chaser_accuracy: f64,
    pub wanderer_turn_chance: f64,
    pub guardian_turn_chance: f64,
    pub guardian_leash_cells: f32,

    /// Difficulty rises once every this many completed rounds.
    pub rounds_per_level: u32,
    pub item_spawn_chance_per_level: f64,
    pub item_spawn_cap_base: u32,
    pub trap_spawn_chance_per_level: f64,
    pub trap_spawn_cap_base: u32,

    pub effects: EffectTable,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            cell_size: 20.0,
            max_map_width: 40,
            max_map_height: 30,
            min_map_width: 5,
            min_map_height: 5,
            dot_value: 10,
            power_pellet_value: 50,
            power_pellet_count: 4,
            dot_empty_base: 0.3,
            dot_empty_per_level: 0.02,
            base_item_count: 3,
            base_trap_count: 1,
            placement_attempts: 20,
            spike_base_chance: 0.2,
            spike_chance_per_level: 0.05,
            slow_upper_bound: 0.6,
            trap_detection_cells: 2.0,
            player_base_speed: 5.0,
            slow_multiplier: 0.5,
            speed_up_multiplier: 1.5,
            powered_duration_ms: 10_000,
            bomb_radius: 100.0,
            enemy_bounty: 200,
            enemy_base_speed: 3.0,
            enemy_speed_per_level: 0.5,
            enemy_decision_cooldown_ms: 500,
            chaser_accuracy: 0.7,
            wanderer_turn_chance: 0.3,
            guardian_turn_chance: 0.2,
            guardian_leash_cells: 5.0,
            rounds_per_level: 3,
            item_spawn_chance_per_level: 0.003,
            item_spawn_cap_base: 5,
            trap_spawn_chance_per_level: 0.001,
            trap_spawn_cap_base: 2,
            effects: EffectTable::default(),
        }
    }
}

impl GameTuning {
    /// Load tuning from `NEONMAZE_TUNING` or `config/tuning.toml`, falling back
    /// to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("NEONMAZE_TUNING")
            && let Ok(contents) = std::fs::read_to_string(&path)
        {
            match toml::from_str::<Self>(&contents) {
                Ok(tuning) => match tuning.validate() {
                    Ok(()) => return tuning,
                    Err(e) => tracing::warn!(%path, error = %e, "Ignoring invalid tuning file"),
                },
                Err(e) => tracing::warn!(%path, error = %e, "Ignoring unparsable tuning file"),
            }
        }
        if let Ok(contents) = std::fs::read_to_string("config/tuning.toml")
            && let Ok(tuning) = toml::from_str::<Self>(&contents)
        {
            match tuning.validate() {
                Ok(()) => return tuning,
                Err(e) => tracing::warn!(error = %e, "Ignoring invalid config/tuning.toml"),
            }
        }
        Self::default()
    }

    /// Reject values that would make map generation or enemy decisions
    /// meaningless.
    pub fn validate(&self) -> Result<(), TuningError> {
        let probabilities = [
            ("dot_empty_base", self.dot_empty_base),
            ("spike_base_chance", self.spike_base_chance),
            ("slow_upper_bound", self.slow_upper_bound),
            ("chaser_accuracy", self.chaser_accuracy),
            ("wanderer_turn_chance", self.wanderer_turn_chance),
            ("guardian_turn_chance", self.guardian_turn_chance),
            ("item_spawn_chance_per_level", self.item_spawn_chance_per_level),
            ("trap_spawn_chance_per_level", self.trap_spawn_chance_per_level),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(TuningError::Probability { field, value });
            }
        }
        if self.min_map_width > self.max_map_width {
            return Err(TuningError::MapRange {
                axis: "width",
                min: self.min_map_width,
                max: self.max_map_width,
            });
        }
        if self.min_map_height > self.max_map_height {
            return Err(TuningError::MapRange {
                axis: "height",
                min: self.min_map_height,
                max: self.max_map_height,
            });
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(TuningError::CellSize(self.cell_size));
        }
        if self.rounds_per_level == 0 {
            return Err(TuningError::ZeroRoundsPerLevel);
        }
        Ok(())
    }

    /// Half of a cell: the contact threshold for point entities.
    pub fn collision_threshold(&self) -> f32 {
        self.cell_size / 2.0
    }

    pub fn trap_detection_radius(&self) -> f32 {
        self.trap_detection_cells * self.cell_size
    }

    pub fn guardian_leash_radius(&self) -> f32 {
        self.guardian_leash_cells * self.cell_size
    }

    /// Probability that a given interior cell gets no dot at `level`.
    pub fn dot_empty_chance(&self, level: u32) -> f64 {
        (self.dot_empty_base + f64::from(level) * self.dot_empty_per_level).clamp(0.0, 1.0)
    }

    pub fn item_count(&self, level: u32) -> u32 {
        self.base_item_count + level / 2
    }

    pub fn trap_count(&self, level: u32) -> u32 {
        self.base_trap_count + (f64::from(level) / 1.5).floor() as u32
    }

    pub fn enemy_count(&self, level: u32) -> u32 {
        level / 2
    }

    pub fn enemy_speed(&self, level: u32) -> f32 {
        self.enemy_base_speed + level as f32 * self.enemy_speed_per_level
    }

    /// Map a screen size in pixels to grid dimensions within the configured limits.
    pub fn grid_for_screen(&self, width: f32, height: f32) -> (u32, u32) {
        let cols = (width / self.cell_size).floor().max(0.0) as u32;
        let rows = (height / self.cell_size).floor().max(0.0) as u32;
        // max-then-min: an inverted range yields the maximum instead of panicking.
        (
            cols.max(self.min_map_width).min(self.max_map_width),
            rows.max(self.min_map_height).min(self.max_map_height),
        )
    }
}
