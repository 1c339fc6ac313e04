#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Saving and loading the game state.
//!
//! A [`WorldSnapshot`] is rendered as a single JSON record and kept under
//! [`GAME_STATE_KEY`] in a [`KeyValueStore`]. Loading is forgiving: a
//! missing or malformed record yields `None` so callers can fall back to a
//! fresh world instead of failing to start.

mod codec;
mod store;

pub use codec::{decode, encode, CodecError};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

use geocache_core::WorldSnapshot;
use thiserror::Error;

/// Storage key under which the game state record is kept.
pub const GAME_STATE_KEY: &str = "gameState";

/// Errors produced while saving a snapshot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The snapshot could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Encodes `snapshot` and writes it under [`GAME_STATE_KEY`].
pub fn save_snapshot<S>(store: &mut S, snapshot: &WorldSnapshot) -> Result<(), PersistenceError>
where
    S: KeyValueStore + ?Sized,
{
    let bytes = encode(snapshot)?;
    store.set(GAME_STATE_KEY, &bytes)?;
    log::debug!(
        "saved game state: {} cells, {} coins in inventory",
        snapshot.cells.len(),
        snapshot.inventory.len()
    );
    Ok(())
}

/// Reads the saved snapshot, if a valid one exists.
///
/// Storage failures and malformed records are logged and reported as
/// `None`.
pub fn load_snapshot<S>(store: &S) -> Option<WorldSnapshot>
where
    S: KeyValueStore + ?Sized,
{
    let bytes = match store.get(GAME_STATE_KEY) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            log::debug!("no saved game state");
            return None;
        }
        Err(error) => {
            log::warn!("could not read saved game state: {error}");
            return None;
        }
    };

    match decode(&bytes) {
        Ok(snapshot) => Some(snapshot),
        Err(error) => {
            log::warn!("ignoring saved game state: {error}");
            None
        }
    }
}

/// Deletes the saved snapshot.
pub fn clear_snapshot<S>(store: &mut S) -> Result<(), StoreError>
where
    S: KeyValueStore + ?Sized,
{
    store.remove(GAME_STATE_KEY)
}
