//! Player position and coin inventory.

use geocache_core::{CoinId, GeoPoint};

/// Location of the player and the coins they carry.
///
/// The inventory is a stack: deposits always take the most recently
/// collected coin.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    location: GeoPoint,
    inventory: Vec<CoinId>,
}

impl PlayerState {
    pub(crate) fn at(location: GeoPoint) -> Self {
        Self {
            location,
            inventory: Vec::new(),
        }
    }

    pub(crate) fn with_inventory(location: GeoPoint, inventory: Vec<CoinId>) -> Self {
        Self {
            location,
            inventory,
        }
    }

    /// Current player location.
    #[must_use]
    pub const fn location(&self) -> GeoPoint {
        self.location
    }

    /// Coins held by the player, oldest first.
    #[must_use]
    pub fn inventory(&self) -> &[CoinId] {
        &self.inventory
    }

    pub(crate) fn set_location(&mut self, location: GeoPoint) {
        self.location = location;
    }

    pub(crate) fn push_coin(&mut self, coin: CoinId) {
        self.inventory.push(coin);
    }

    pub(crate) fn pop_coin(&mut self) -> Option<CoinId> {
        self.inventory.pop()
    }
}
