//! Geocache entity and its memento round-trip.

use geocache_core::{CellCoord, CoinId, GeoPoint, GeocacheMemento};

/// Collectible cache anchored to a single cell.
///
/// Coin order is preserved for display; game semantics treat the coins as a
/// set, so a cache never holds the same coin twice.
#[derive(Clone, Debug, PartialEq)]
pub struct Geocache {
    cell: CellCoord,
    location: GeoPoint,
    coins: Vec<CoinId>,
    visible: bool,
}

impl Geocache {
    /// Mints a new cache at `location` holding `coin_count` fresh coins.
    #[must_use]
    pub fn create(cell: CellCoord, location: GeoPoint, coin_count: u32) -> Self {
        let coins = (0..coin_count)
            .map(|serial| CoinId::minted(cell, serial))
            .collect();
        Self {
            cell,
            location,
            coins,
            visible: false,
        }
    }

    /// Rebuilds a cache with the location and coins captured by `memento`.
    ///
    /// The restored cache starts hidden, like a freshly minted one.
    #[must_use]
    pub fn restore(memento: &GeocacheMemento) -> Self {
        Self {
            cell: memento.cell(),
            location: memento.location(),
            coins: memento.coins().to_vec(),
            visible: false,
        }
    }

    /// Captures the cache's location and coins.
    #[must_use]
    pub fn snapshot(&self) -> GeocacheMemento {
        GeocacheMemento::new(self.cell, self.location, self.coins.clone())
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

    /// Coins currently held by the cache.
    #[must_use]
    pub fn coins(&self) -> &[CoinId] {
        &self.coins
    }

    /// Reports whether the cache holds `coin`.
    #[must_use]
    pub fn contains(&self, coin: &CoinId) -> bool {
        self.coins.iter().any(|held| held == coin)
    }

    /// Removes `coin` from the cache. Returns `false` when the cache does not
    /// hold it.
    ///
    /// The caller owns moving the coin into the inventory.
    pub fn collect(&mut self, coin: &CoinId) -> bool {
        match self.coins.iter().position(|held| held == coin) {
            Some(index) => {
                let _ = self.coins.remove(index);
                true
            }
            None => false,
        }
    }

    /// Adds `coin` to the cache. Returns `false` when the cache already holds
    /// it.
    pub fn deposit(&mut self, coin: &CoinId) -> bool {
        if self.contains(coin) {
            return false;
        }
        self.coins.push(coin.clone());
        true
    }

    /// Reports whether the cache is currently rendered.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Marks the cache as rendered.
    pub fn show(&mut self) {
        self.visible = true;
    }

    /// Marks the cache as no longer rendered.
    pub fn hide(&mut self) {
        self.visible = false;
    }
}
