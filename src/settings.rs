//! Match settings
//!
//! The values the menu collects before a match starts. Persisted as JSON so a
//! match can be restarted with the same configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ArenaError, ArenaResult, SettingsError};

/// Match settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    // === Map ===
    /// Playable width in tiles (border excluded)
    pub map_width: u32,
    /// Playable height in tiles (border excluded)
    pub map_height: u32,
    /// Chance (0-100) that an eligible tile becomes a soft block
    pub soft_block_probability: u32,
    /// Length of each spawn arm
    pub spawn_width: u32,
    /// Force soft blocks around the spawn zones
    pub spawn_protection: bool,

    // === Gameplay ===
    /// Chance (0-100) that a destroyed soft block drops an item
    pub items_drop_rate: u32,
    /// Index into the enemy count table
    pub enemy_tier: usize,
    /// Number of human players
    pub players: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            map_width: 13,
            map_height: 11,
            soft_block_probability: 70,
            spawn_width: 2,
            spawn_protection: true,

            items_drop_rate: 25,
            enemy_tier: 1,
            players: 1,
        }
    }
}

impl Settings {
    /// Check every value against its documented range
    pub fn validate(&self, enemy_tiers: usize) -> ArenaResult<()> {
        check_range("map width", self.map_width, MIN_MAP_SIZE, MAX_MAP_SIZE)?;
        check_range("map height", self.map_height, MIN_MAP_SIZE, MAX_MAP_SIZE)?;
        check_range("soft block probability", self.soft_block_probability, 0, 100)?;
        check_range("spawn width", self.spawn_width, MIN_SPAWN_WIDTH, MAX_SPAWN_WIDTH)?;
        check_range("items drop rate", self.items_drop_rate, 0, 100)?;
        check_range("players", self.players, MIN_PLAYERS, MAX_PLAYERS)?;
        if self.enemy_tier >= enemy_tiers {
            return Err(ArenaError::InvalidConfiguration(format!(
                "enemy tier {} out of range (0..{enemy_tiers})",
                self.enemy_tier
            )));
        }
        Ok(())
    }

    /// Clamp out-of-range values the way the menu fields do
    pub fn clamped(mut self, enemy_tiers: usize) -> Self {
        self.map_width = self.map_width.clamp(MIN_MAP_SIZE, MAX_MAP_SIZE);
        self.map_height = self.map_height.clamp(MIN_MAP_SIZE, MAX_MAP_SIZE);
        self.soft_block_probability = self.soft_block_probability.min(100);
        self.spawn_width = self.spawn_width.clamp(MIN_SPAWN_WIDTH, MAX_SPAWN_WIDTH);
        self.items_drop_rate = self.items_drop_rate.min(100);
        self.players = self.players.clamp(MIN_PLAYERS, MAX_PLAYERS);
        self.enemy_tier = self.enemy_tier.min(enemy_tiers.saturating_sub(1));
        self
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults when the file is missing or broken
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Using default settings ({err})");
                Self::default()
            }
        }
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> ArenaResult<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ArenaError::InvalidConfiguration(format!(
            "{name} {value} out of range ({min}..={max})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate(3).is_ok());
    }

    #[test]
    fn test_validate_rejects_small_map() {
        let settings = Settings {
            map_width: 4,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(3),
            Err(ArenaError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_tier() {
        let settings = Settings {
            enemy_tier: 3,
            ..Default::default()
        };
        assert!(settings.validate(3).is_err());
        assert!(settings.validate(4).is_ok());
    }

    #[test]
    fn test_clamped_pulls_values_into_range() {
        let settings = Settings {
            map_width: 200,
            map_height: 1,
            soft_block_probability: 150,
            spawn_width: 0,
            spawn_protection: false,
            items_drop_rate: 101,
            enemy_tier: 9,
            players: 7,
        }
        .clamped(3);

        assert_eq!(settings.map_width, MAX_MAP_SIZE);
        assert_eq!(settings.map_height, MIN_MAP_SIZE);
        assert_eq!(settings.soft_block_probability, 100);
        assert_eq!(settings.spawn_width, MIN_SPAWN_WIDTH);
        assert_eq!(settings.items_drop_rate, 100);
        assert_eq!(settings.enemy_tier, 2);
        assert_eq!(settings.players, MAX_PLAYERS);
        assert!(settings.validate(3).is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings {
            map_width: 20,
            map_height: 14,
            soft_block_probability: 70,
            spawn_width: 3,
            spawn_protection: true,
            items_drop_rate: 25,
            enemy_tier: 1,
            players: 2,
        };
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            Settings::from_json("{ not json"),
            Err(SettingsError::Json(_))
        ));
    }
}
