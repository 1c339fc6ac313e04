//! JSON wire format of a saved game.
//!
//! The layout mirrors the record the browser build kept in local storage:
//!
//! ```text
//! {
//!   "currentLocation": { "lat": .., "lng": .. },
//!   "playerInventory": [ "i:j#n", .. ],
//!   "cellState": [
//!     [ "i:j", { "discovered": true, "cache": { "location": {..}, "coins": [..] } } ],
//!     ..
//!   ],
//!   "movementHistory": [ { "lat": .., "lng": .. }, .. ]
//! }
//! ```

use std::collections::BTreeSet;

use geocache_core::{CellKey, CellRecord, CoinId, GeoPoint, GeocacheMemento, WorldSnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameState {
    current_location: GeoPoint,
    player_inventory: Vec<CoinId>,
    cell_state: Vec<(CellKey, CellEntry)>,
    #[serde(default)]
    movement_history: Vec<GeoPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CellEntry {
    discovered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache: Option<CacheEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    location: GeoPoint,
    coins: Vec<CoinId>,
}

/// Errors produced while encoding or decoding a saved game.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The snapshot could not be rendered as JSON.
    #[error("could not encode game state: {0}")]
    Encode(#[source] serde_json::Error),
    /// The blob is not a well-formed game state record.
    #[error("could not parse game state: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The same cell appears more than once.
    #[error("cell {0} appears more than once")]
    DuplicateCell(CellKey),
    /// A cell that was never discovered claims to hold a cache.
    #[error("undiscovered cell {0} carries a cache")]
    CacheOnUndiscoveredCell(CellKey),
    /// A coin is held in two places at once.
    #[error("coin {0} is stored more than once")]
    DuplicateCoin(CoinId),
}

/// Renders `snapshot` as the JSON game state record.
pub fn encode(snapshot: &WorldSnapshot) -> Result<Vec<u8>, CodecError> {
    let state = GameState {
        current_location: snapshot.location,
        player_inventory: snapshot.inventory.clone(),
        cell_state: snapshot
            .cells
            .iter()
            .map(|record| {
                let entry = CellEntry {
                    discovered: record.discovered,
                    cache: record.memento.as_ref().map(|memento| CacheEntry {
                        location: memento.location(),
                        coins: memento.coins().to_vec(),
                    }),
                };
                (record.cell.key(), entry)
            })
            .collect(),
        movement_history: snapshot.history.clone(),
    };
    serde_json::to_vec(&state).map_err(CodecError::Encode)
}

/// Parses and validates a JSON game state record.
///
/// Beyond syntax, the record must name every cell once, keep caches on
/// discovered cells only and hold every coin in exactly one place.
pub fn decode(bytes: &[u8]) -> Result<WorldSnapshot, CodecError> {
    let state: GameState = serde_json::from_slice(bytes).map_err(CodecError::InvalidPayload)?;

    let mut seen_cells = BTreeSet::new();
    let mut seen_coins = BTreeSet::new();
    for coin in &state.player_inventory {
        if !seen_coins.insert(coin.clone()) {
            return Err(CodecError::DuplicateCoin(coin.clone()));
        }
    }

    let mut cells = Vec::with_capacity(state.cell_state.len());
    for (key, entry) in state.cell_state {
        if !seen_cells.insert(key.cell()) {
            return Err(CodecError::DuplicateCell(key));
        }

        let memento = match entry.cache {
            Some(_) if !entry.discovered => {
                return Err(CodecError::CacheOnUndiscoveredCell(key));
            }
            Some(cache) => {
                for coin in &cache.coins {
                    if !seen_coins.insert(coin.clone()) {
                        return Err(CodecError::DuplicateCoin(coin.clone()));
                    }
                }
                Some(GeocacheMemento::new(key.cell(), cache.location, cache.coins))
            }
            None => None,
        };

        cells.push(CellRecord {
            cell: key.cell(),
            discovered: entry.discovered,
            memento,
        });
    }

    Ok(WorldSnapshot {
        location: state.current_location,
        inventory: state.player_inventory,
        cells,
        history: state.movement_history,
    })
}
