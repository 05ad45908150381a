/// Tunable gameplay constants.
///
/// Defaults describe an 800×600 arcade layout.  Any subset of the
/// fields can be overridden from a JSON file.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::QuizError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Easy,
    Medium,
    Hard,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Easy => "Easy",
            Level::Medium => "Medium",
            Level::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Level::Easy),
            "medium" | "med" => Some(Level::Medium),
            "hard" => Some(Level::Hard),
            _ => None,
        }
    }

    /// Multiplier applied to `GameConfig::enemy_fall_speed`.
    pub fn fall_speed_scale(&self) -> f32 {
        match self {
            Level::Easy => 0.75,
            Level::Medium => 1.0,
            Level::Hard => 1.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub world_width: f32,
    pub world_height: f32,

    pub lives: u32,
    pub win_target: u32,

    /// Delay between the question appearing and its choices spawning.
    pub reveal_delay_ms: u64,
    /// Pause between a resolved wave and the next question.
    pub transition_delay_ms: u64,

    pub player_y: f32,
    pub player_speed: f32,
    pub player_half_width: f32,

    pub projectile_speed: f32,
    /// Projectiles spawn this far above the ship's centre.
    pub muzzle_offset: f32,
    pub projectile_half_width: f32,
    pub projectile_half_height: f32,
    /// Remove projectiles once they leave the top of the world.
    pub despawn_offscreen_projectiles: bool,

    pub enemy_start_y: f32,
    /// Base fall speed, scaled by the difficulty level.
    pub enemy_fall_speed: f32,
    pub enemy_half_width: f32,
    pub enemy_half_height: f32,
    /// Enemies whose centre passes this line count as a miss.
    pub miss_line_y: f32,
    /// Gap between an enemy's centre and the bottom of its label.
    pub label_offset: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_width: 800.0,
            world_height: 600.0,
            lives: 3,
            win_target: 10,
            reveal_delay_ms: 2000,
            transition_delay_ms: 1000,
            player_y: 550.0,
            player_speed: 200.0,
            player_half_width: 16.0,
            projectile_speed: 400.0,
            muzzle_offset: 20.0,
            projectile_half_width: 4.0,
            projectile_half_height: 8.0,
            despawn_offscreen_projectiles: true,
            enemy_start_y: 200.0,
            enemy_fall_speed: 40.0,
            enemy_half_width: 24.0,
            enemy_half_height: 16.0,
            miss_line_y: 580.0,
            label_offset: 50.0,
        }
    }
}

impl GameConfig {
    /// Parse a JSON override document.  `source` names it in errors.
    pub fn from_json(json: &str, source: &Path) -> Result<Self, QuizError> {
        let config: GameConfig =
            serde_json::from_str(json).map_err(|e| QuizError::Parse {
                path: source.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, QuizError> {
        let json = fs::read_to_string(path).map_err(|e| QuizError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::from_json(&json, path)?;
        log::info!("loaded config overrides from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), QuizError> {
        if !(self.world_width > 0.0 && self.world_height > 0.0) {
            return Err(QuizError::InvalidConfig(
                "world dimensions must be positive".into(),
            ));
        }
        if self.lives == 0 {
            return Err(QuizError::InvalidConfig("lives must be at least 1".into()));
        }
        if self.win_target == 0 {
            return Err(QuizError::InvalidConfig(
                "win_target must be at least 1".into(),
            ));
        }
        if self.player_speed < 0.0 || self.projectile_speed < 0.0 || self.enemy_fall_speed < 0.0
        {
            return Err(QuizError::InvalidConfig("speeds must not be negative".into()));
        }
        if self.miss_line_y <= self.enemy_start_y {
            return Err(QuizError::InvalidConfig(
                "miss_line_y must lie below enemy_start_y".into(),
            ));
        }
        Ok(())
    }
}
