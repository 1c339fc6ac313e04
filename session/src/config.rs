//! Game configuration loaded from TOML.

use std::{fs, io, path::Path, path::PathBuf};

use geocache_core::{CellGrid, GeoPoint, DEFAULT_ORIGIN, DEFAULT_TILE_DEGREES};
use geocache_system_spawning::{
    Config as SpawningConfig, DEFAULT_MAX_COINS, DEFAULT_SEED, DEFAULT_SPAWN_PROBABILITY,
};
use geocache_system_visibility::{
    Config as VisibilityConfig, DEFAULT_VISIBILITY_RADIUS, MAX_VISIBILITY_RADIUS,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read config {path}")]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid configuration TOML.
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables of a game session. Every field is optional.
///
/// ```toml
/// origin = { lat = 36.98949379578401, lng = -122.06277128548504 }
/// tile_degrees = 0.0001
/// visibility_radius = 8
/// spawn_probability = 0.1
/// max_coins = 10
/// seed = 42
/// autosave = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Anchor of cell `(0, 0)`.
    pub origin: Option<GeoPoint>,
    /// Where a fresh or reset game places the player. Defaults to the
    /// origin.
    pub start: Option<GeoPoint>,
    /// Width of a cell in degrees.
    pub tile_degrees: Option<f64>,
    /// Half-width of the visibility window in cells.
    pub visibility_radius: Option<u32>,
    /// Probability that a discovered cell hosts a cache.
    pub spawn_probability: Option<f64>,
    /// Upper bound of the initial coin count of a cache.
    pub max_coins: Option<u32>,
    /// Seed of the spawn oracle.
    pub seed: Option<u64>,
    /// Whether every state change is saved immediately.
    pub autosave: Option<bool>,
}

impl GameConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Cell grid described by `origin` and `tile_degrees`.
    #[must_use]
    pub fn grid(&self) -> CellGrid {
        let origin = valid_point("origin", self.origin).unwrap_or(DEFAULT_ORIGIN);
        let tile_degrees = match self.tile_degrees {
            Some(tile) if tile.is_finite() && tile > 0.0 => tile,
            Some(tile) => {
                log::warn!("tile_degrees {tile} is not positive; using {DEFAULT_TILE_DEGREES}");
                DEFAULT_TILE_DEGREES
            }
            None => DEFAULT_TILE_DEGREES,
        };
        CellGrid::new(origin, tile_degrees)
    }

    /// Start location of a fresh game.
    #[must_use]
    pub fn start(&self) -> GeoPoint {
        valid_point("start", self.start).unwrap_or_else(|| self.grid().origin())
    }

    /// Spawn oracle configuration.
    #[must_use]
    pub fn spawning(&self) -> SpawningConfig {
        let probability = match self.spawn_probability {
            Some(p) if (0.0..=1.0).contains(&p) => p,
            Some(p) => {
                log::warn!(
                    "spawn_probability {p} outside [0, 1]; using {DEFAULT_SPAWN_PROBABILITY}"
                );
                DEFAULT_SPAWN_PROBABILITY
            }
            None => DEFAULT_SPAWN_PROBABILITY,
        };
        let max_coins = match self.max_coins {
            Some(0) => {
                log::warn!("max_coins must be at least 1; using {DEFAULT_MAX_COINS}");
                DEFAULT_MAX_COINS
            }
            Some(max) => max,
            None => DEFAULT_MAX_COINS,
        };
        SpawningConfig::new(self.seed.unwrap_or(DEFAULT_SEED), probability, max_coins)
    }

    /// Visibility system configuration.
    #[must_use]
    pub fn visibility(&self) -> VisibilityConfig {
        match self.visibility_radius {
            Some(radius) if radius > MAX_VISIBILITY_RADIUS => {
                log::warn!(
                    "visibility_radius {radius} exceeds {MAX_VISIBILITY_RADIUS}; using {DEFAULT_VISIBILITY_RADIUS}"
                );
                VisibilityConfig::default()
            }
            Some(radius) => VisibilityConfig::new(radius),
            None => VisibilityConfig::default(),
        }
    }

    /// Whether sessions save after every change. Defaults to `true`.
    #[must_use]
    pub fn autosave(&self) -> bool {
        self.autosave.unwrap_or(true)
    }
}

fn valid_point(name: &str, point: Option<GeoPoint>) -> Option<GeoPoint> {
    let point = point?;
    let in_range =
        point.is_finite() && point.lat().abs() <= 90.0 && point.lng().abs() <= 180.0;
    if in_range {
        Some(point)
    } else {
        log::warn!("{name} {point} is not a valid coordinate; using the default");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = GameConfig::from_toml_str("").expect("empty toml");
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.grid(), CellGrid::default());
        assert_eq!(config.start(), DEFAULT_ORIGIN);
        assert_eq!(config.spawning(), SpawningConfig::default());
        assert_eq!(config.visibility(), VisibilityConfig::default());
        assert!(config.autosave());
    }

    #[test]
    fn fields_override_defaults() {
        let config = GameConfig::from_toml_str(
            r#"
            origin = { lat = 10.0, lng = 20.0 }
            tile_degrees = 0.001
            visibility_radius = 3
            spawn_probability = 0.5
            max_coins = 4
            seed = 7
            autosave = false
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.grid(), CellGrid::new(GeoPoint::new(10.0, 20.0), 0.001));
        assert_eq!(config.start(), GeoPoint::new(10.0, 20.0));
        assert_eq!(config.spawning(), SpawningConfig::new(7, 0.5, 4));
        assert_eq!(config.visibility().radius(), 3);
        assert!(!config.autosave());
    }

    #[test]
    fn out_of_range_values_fall_back() {
        let config = GameConfig {
            start: Some(GeoPoint::new(123.0, 0.0)),
            tile_degrees: Some(-1.0),
            visibility_radius: Some(MAX_VISIBILITY_RADIUS + 1),
            spawn_probability: Some(1.5),
            max_coins: Some(0),
            ..GameConfig::default()
        };

        assert_eq!(config.grid().tile_degrees(), DEFAULT_TILE_DEGREES);
        assert_eq!(config.start(), DEFAULT_ORIGIN);
        assert_eq!(config.visibility(), VisibilityConfig::default());
        assert_eq!(config.spawning(), SpawningConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            GameConfig::from_toml_str("radius = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let directory = tempfile::tempdir().expect("tempdir");
        let path = directory.path().join("missing.toml");
        match GameConfig::load(&path) {
            Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
