#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the geocache engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.
//!
//! The crate also owns the cell index: [`CellGrid`] canonicalises continuous
//! geographic coordinates into integer [`CellCoord`] values and enumerates the
//! cells inside a square radius.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Geocoin Carrier.";

/// Anchor of cell `(0, 0)` and the fixed start location for fresh games.
pub const DEFAULT_ORIGIN: GeoPoint = GeoPoint::new(36.989_493_795_784_01, -122.062_771_285_485_04);

/// Side length of a cell measured in degrees of latitude and longitude.
pub const DEFAULT_TILE_DEGREES: f64 = 0.0001;

/// Quotients closer than this to a whole tile index snap onto that index.
///
/// Decimal coordinates rarely divide exactly in binary floating point, so a
/// point that sits on a tile boundary on paper may land a hair below it.
const CELL_SNAP_EPSILON: f64 = 1e-6;

/// Largest window radius the cell index enumerates. Larger requests are
/// clamped to it.
pub const MAX_WINDOW_RADIUS: u32 = 256;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the cell grid and resets all world state to match it.
    ConfigureGrid {
        /// Grid that canonicalises coordinates from now on.
        grid: CellGrid,
        /// Location the player occupies after the reset.
        start: GeoPoint,
    },
    /// Moves the player to an absolute location, as reported by geolocation.
    MovePlayer {
        /// Destination of the move.
        to: GeoPoint,
    },
    /// Moves the player by a single tile in the provided direction.
    StepPlayer {
        /// Direction of travel.
        direction: Direction,
    },
    /// Records the one-time spawn decision for a cell.
    DiscoverCell {
        /// Cell that entered visibility for the first time.
        cell: CellCoord,
        /// Outcome of the spawn oracle for the cell.
        decision: SpawnDecision,
    },
    /// Rebuilds a dormant cache from its memento and shows it.
    RevealCache {
        /// Cell whose cache re-entered the visibility window.
        cell: CellCoord,
    },
    /// Snapshots a live cache into its memento and drops the live object.
    HideCache {
        /// Cell whose cache left the visibility window.
        cell: CellCoord,
    },
    /// Moves a coin from a visible cache into the player inventory.
    CollectCoin {
        /// Cell hosting the cache.
        cell: CellCoord,
        /// Coin requested by the player.
        coin: CoinId,
    },
    /// Moves the most recently collected coin into a visible cache.
    DepositCoin {
        /// Cell hosting the receiving cache.
        cell: CellCoord,
    },
    /// Clears every cell, the inventory and the trail.
    ResetWorld,
    /// Replaces all world state with a previously captured snapshot.
    RestoreWorld {
        /// State to install.
        snapshot: WorldSnapshot,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the world adopted a new cell grid.
    GridConfigured {
        /// Grid now in effect.
        grid: CellGrid,
    },
    /// Confirms that the player moved.
    PlayerMoved {
        /// Location before the move.
        from: GeoPoint,
        /// Location after the move.
        to: GeoPoint,
    },
    /// Confirms that a cell's spawn decision was recorded.
    CellDiscovered {
        /// Newly discovered cell.
        cell: CellCoord,
        /// Whether a cache was minted for the cell.
        spawned: bool,
    },
    /// Announces that a cache became visible and should be drawn.
    CacheShown {
        /// Cell hosting the cache.
        cell: CellCoord,
    },
    /// Announces that a cache left the visibility window.
    CacheHidden {
        /// Cell hosting the cache.
        cell: CellCoord,
    },
    /// Confirms that a coin moved from a cache into the inventory.
    CoinCollected {
        /// Cell hosting the cache.
        cell: CellCoord,
        /// Coin that moved.
        coin: CoinId,
    },
    /// Confirms that a coin moved from the inventory into a cache.
    CoinDeposited {
        /// Cell hosting the cache.
        cell: CellCoord,
        /// Coin that moved.
        coin: CoinId,
    },
    /// Reports that a collect request had no effect.
    CollectRejected {
        /// Cell named by the request.
        cell: CellCoord,
        /// Coin named by the request.
        coin: CoinId,
        /// Reason the request was refused.
        reason: CollectRejection,
    },
    /// Reports that a deposit request had no effect.
    DepositRejected {
        /// Cell named by the request.
        cell: CellCoord,
        /// Reason the request was refused.
        reason: DepositRejection,
    },
    /// Announces that all world state was cleared.
    WorldReset {
        /// Location the player occupies after the reset.
        location: GeoPoint,
    },
    /// Announces that world state was replaced from a snapshot.
    WorldRestored {
        /// Location the player occupies after the restore.
        location: GeoPoint,
    },
}

/// Reasons a collect request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectRejection {
    /// No live cache exists at the requested cell.
    CacheNotVisible,
    /// The cache does not hold the requested coin.
    MissingCoin,
}

/// Reasons a deposit request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepositRejection {
    /// The player holds no coins.
    EmptyInventory,
    /// No live cache exists at the requested cell.
    CacheNotVisible,
    /// The cache already holds the coin on top of the inventory.
    DuplicateCoin,
}

/// Outcome of the spawn oracle for a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnDecision {
    /// The cell stays empty forever.
    Empty,
    /// The cell hosts a cache seeded with the provided number of coins.
    Cache {
        /// Number of coins minted into the new cache.
        coins: u32,
    },
}

impl SpawnDecision {
    /// Reports whether the decision mints a cache.
    #[must_use]
    pub const fn spawns(&self) -> bool {
        matches!(self, Self::Cache { .. })
    }
}

/// Cardinal movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward increasing latitude.
    North,
    /// Movement toward increasing longitude.
    East,
    /// Movement toward decreasing latitude.
    South,
    /// Movement toward decreasing longitude.
    West,
}

impl Direction {
    /// Unit offset of the direction expressed as `(lat, lng)` tile steps.
    #[must_use]
    pub const fn unit_offset(self) -> (i32, i32) {
        match self {
            Self::North => (1, 0),
            Self::East => (0, 1),
            Self::South => (-1, 0),
            Self::West => (0, -1),
        }
    }
}

/// Geographic coordinate measured in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Creates a new coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// Returns the coordinate shifted by the provided deltas.
    #[must_use]
    pub fn offset(self, delta_lat: f64, delta_lng: f64) -> Self {
        Self::new(self.lat + delta_lat, self.lng + delta_lng)
    }

    /// Reports whether both components are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Location of a single grid cell expressed as integer `(i, j)` indices.
///
/// `i` counts tiles along latitude and `j` along longitude, both measured
/// from the grid origin. Cells are plain values: two cells with the same
/// indices are the same cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    i: i32,
    j: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// Tile index along latitude.
    #[must_use]
    pub const fn i(&self) -> i32 {
        self.i
    }

    /// Tile index along longitude.
    #[must_use]
    pub const fn j(&self) -> i32 {
        self.j
    }

    /// Returns the neighbouring cell in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (di, dj) = direction.unit_offset();
        Self::new(self.i.saturating_add(di), self.j.saturating_add(dj))
    }

    /// Computes the Chebyshev distance between two cells.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.i.abs_diff(other.i).max(self.j.abs_diff(other.j))
    }

    /// Reports whether `other` lies inside the square window of `radius`
    /// cells centred on `self`.
    ///
    /// This is the single distance predicate used for both spawning and
    /// visibility.
    #[must_use]
    pub fn within_radius(self, other: CellCoord, radius: u32) -> bool {
        self.chebyshev_distance(other) <= radius
    }

    /// Canonical string key for the cell.
    #[must_use]
    pub fn key(self) -> CellKey {
        CellKey::from(self)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.i, self.j)
    }
}

/// Canonical string form of a [`CellCoord`], `"i:j"`.
///
/// Only the canonical rendering is accepted when parsing, so every cell has
/// exactly one key and every key names exactly one cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellKey {
    text: String,
    cell: CellCoord,
}

impl CellKey {
    /// Borrow the textual key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Cell named by the key.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }
}

impl From<CellCoord> for CellKey {
    fn from(cell: CellCoord) -> Self {
        Self {
            text: cell.to_string(),
            cell,
        }
    }
}

impl From<CellKey> for String {
    fn from(key: CellKey) -> Self {
        key.text
    }
}

impl TryFrom<String> for CellKey {
    type Error = CellKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for CellKey {
    type Err = CellKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (i, j) = value
            .split_once(':')
            .ok_or_else(|| CellKeyError::MissingSeparator(value.to_owned()))?;
        let i = i
            .parse::<i32>()
            .map_err(|_| CellKeyError::InvalidIndex(value.to_owned()))?;
        let j = j
            .parse::<i32>()
            .map_err(|_| CellKeyError::InvalidIndex(value.to_owned()))?;

        let key = CellKey::from(CellCoord::new(i, j));
        if key.text != value {
            return Err(CellKeyError::NonCanonical(value.to_owned()));
        }
        Ok(key)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Errors produced while parsing a [`CellKey`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CellKeyError {
    /// The key did not contain the `:` separator.
    #[error("cell key '{0}' is missing the ':' separator")]
    MissingSeparator(String),
    /// One of the indices was not a 32-bit integer.
    #[error("cell key '{0}' contains an invalid index")]
    InvalidIndex(String),
    /// The key parsed but is not in canonical form.
    #[error("cell key '{0}' is not canonical")]
    NonCanonical(String),
}

/// Opaque, globally unique identifier of a single coin.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoinId(String);

impl CoinId {
    /// Wraps an existing identifier, e.g. one read back from storage.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mints the identifier of the `serial`-th coin created at `cell`.
    ///
    /// Identifiers have the shape `"i:j#serial"`; the integer cell indices
    /// make them unique across caches without a central allocator.
    #[must_use]
    pub fn minted(cell: CellCoord, serial: u32) -> Self {
        Self(format!("{cell}#{serial}"))
    }

    /// Borrow the textual identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed-width grid laid over geographic space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellGrid {
    origin: GeoPoint,
    tile_degrees: f64,
}

impl Default for CellGrid {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN, DEFAULT_TILE_DEGREES)
    }
}

impl CellGrid {
    /// Creates a grid anchored at `origin` with square tiles of
    /// `tile_degrees`.
    ///
    /// A non-finite origin or a tile width that is not a positive finite
    /// number falls back to the corresponding default.
    #[must_use]
    pub fn new(origin: GeoPoint, tile_degrees: f64) -> Self {
        let origin = if origin.is_finite() {
            origin
        } else {
            DEFAULT_ORIGIN
        };
        let tile_degrees = if tile_degrees.is_finite() && tile_degrees > 0.0 {
            tile_degrees
        } else {
            DEFAULT_TILE_DEGREES
        };
        Self {
            origin,
            tile_degrees,
        }
    }

    /// Anchor of cell `(0, 0)`.
    #[must_use]
    pub const fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// Side length of a tile in degrees.
    #[must_use]
    pub const fn tile_degrees(&self) -> f64 {
        self.tile_degrees
    }

    /// Maps a geographic point to the cell containing it.
    #[must_use]
    pub fn cell_at(&self, point: GeoPoint) -> CellCoord {
        CellCoord::new(
            axis_index(point.lat(), self.origin.lat(), self.tile_degrees),
            axis_index(point.lng(), self.origin.lng(), self.tile_degrees),
        )
    }

    /// Lower corner of the cell's tile; caches are anchored here.
    #[must_use]
    pub fn anchor(&self, cell: CellCoord) -> GeoPoint {
        self.origin.offset(
            f64::from(cell.i()) * self.tile_degrees,
            f64::from(cell.j()) * self.tile_degrees,
        )
    }

    /// Lower and upper corners of the cell's tile.
    #[must_use]
    pub fn bounds(&self, cell: CellCoord) -> (GeoPoint, GeoPoint) {
        let lower = self.anchor(cell);
        (lower, lower.offset(self.tile_degrees, self.tile_degrees))
    }

    /// Enumerates every cell within `radius` of the cell containing `point`.
    ///
    /// The window is square: `(2 * radius + 1)²` cells in ascending `(i, j)`
    /// order, matching [`CellCoord::within_radius`].
    #[must_use]
    pub fn cells_within(&self, point: GeoPoint, radius: u32) -> Vec<CellCoord> {
        cells_around(self.cell_at(point), radius)
    }
}

/// Enumerates the square window of `radius` cells around `center`.
///
/// Cells whose indices would leave the `i32` range are omitted. Radii above
/// [`MAX_WINDOW_RADIUS`] are clamped to it.
#[must_use]
pub fn cells_around(center: CellCoord, radius: u32) -> Vec<CellCoord> {
    let radius = if radius > MAX_WINDOW_RADIUS {
        log::warn!("window radius {radius} exceeds {MAX_WINDOW_RADIUS}; clamping");
        MAX_WINDOW_RADIUS
    } else {
        radius
    };
    let radius = i64::from(radius);
    let side = 2 * radius + 1;
    let mut cells = Vec::with_capacity(usize::try_from(side * side).unwrap_or(0));
    for i in i64::from(center.i()) - radius..=i64::from(center.i()) + radius {
        let Ok(i) = i32::try_from(i) else {
            continue;
        };
        for j in i64::from(center.j()) - radius..=i64::from(center.j()) + radius {
            let Ok(j) = i32::try_from(j) else {
                continue;
            };
            cells.push(CellCoord::new(i, j));
        }
    }
    cells
}

fn axis_index(value: f64, origin: f64, tile_degrees: f64) -> i32 {
    let quotient = (value - origin) / tile_degrees;
    let nearest = quotient.round();
    let index = if (quotient - nearest).abs() < CELL_SNAP_EPSILON {
        nearest
    } else {
        quotient.floor()
    };
    index.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

/// Immutable snapshot of a cache's externally significant state.
///
/// Mementos let a cache leave memory when it scrolls out of view and come
/// back later with exactly the coins the player left in it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeocacheMemento {
    cell: CellCoord,
    location: GeoPoint,
    coins: Vec<CoinId>,
}

impl GeocacheMemento {
    /// Captures a memento from its parts.
    #[must_use]
    pub fn new(cell: CellCoord, location: GeoPoint, coins: Vec<CoinId>) -> Self {
        Self {
            cell,
            location,
            coins,
        }
    }

    /// Cell hosting the cache.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Anchor location of the cache.
    #[must_use]
    pub const fn location(&self) -> GeoPoint {
        self.location
    }

    /// Coins held by the cache when the memento was taken.
    #[must_use]
    pub fn coins(&self) -> &[CoinId] {
        &self.coins
    }
}

/// Persistable state of a single cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Cell described by the record.
    pub cell: CellCoord,
    /// Whether the cell's spawn decision has been made.
    pub discovered: bool,
    /// Latest cache contents, if the cell hosts a cache.
    pub memento: Option<GeocacheMemento>,
}

/// Complete, plain-data picture of the world used for persistence.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Player location.
    pub location: GeoPoint,
    /// Player inventory; the last coin is the top of the stack.
    pub inventory: Vec<CoinId>,
    /// Every known cell in ascending cell order.
    pub cells: Vec<CellRecord>,
    /// Locations the player has visited, oldest first.
    pub history: Vec<GeoPoint>,
}

impl Default for GeoPoint {
    fn default() -> Self {
        DEFAULT_ORIGIN
    }
}
