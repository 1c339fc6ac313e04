//! Grid-keyed storage of per-cell discovery and cache state.

use std::collections::BTreeMap;

use geocache_core::{CellCoord, GeocacheMemento};
use thiserror::Error;

use crate::Geocache;

/// Discovery and cache status of a single cell.
///
/// An undiscovered cell never carries a cache or memento; the constructors
/// make that state unrepresentable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellState {
    discovered: bool,
    cache: Option<Geocache>,
    memento: Option<GeocacheMemento>,
}

impl CellState {
    /// State of a cell whose spawn decision has not been made.
    #[must_use]
    pub const fn undiscovered() -> Self {
        Self {
            discovered: false,
            cache: None,
            memento: None,
        }
    }

    /// State of a discovered cell that hosts no cache.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            discovered: true,
            cache: None,
            memento: None,
        }
    }

    /// State of a discovered cell with a live cache; the memento starts as a
    /// snapshot of the cache.
    #[must_use]
    pub fn live(cache: Geocache) -> Self {
        Self {
            discovered: true,
            memento: Some(cache.snapshot()),
            cache: Some(cache),
        }
    }

    /// State of a discovered cell whose cache is held only as a memento.
    #[must_use]
    pub const fn dormant(memento: GeocacheMemento) -> Self {
        Self {
            discovered: true,
            cache: None,
            memento: Some(memento),
        }
    }

    /// Whether the cell's spawn decision has been made.
    #[must_use]
    pub const fn is_discovered(&self) -> bool {
        self.discovered
    }

    /// Live cache object, present while the cache is shown.
    #[must_use]
    pub const fn cache(&self) -> Option<&Geocache> {
        self.cache.as_ref()
    }

    /// Last memento recorded for the cell's cache.
    ///
    /// While the cache is live the memento may lag behind its coins; use
    /// [`CellState::latest_memento`] for the current contents.
    #[must_use]
    pub const fn memento(&self) -> Option<&GeocacheMemento> {
        self.memento.as_ref()
    }

    /// Whether the cell hosts a cache at all, live or dormant.
    #[must_use]
    pub const fn has_cache(&self) -> bool {
        self.cache.is_some() || self.memento.is_some()
    }

    /// Whether the cell hosts a cache that is held only as a memento.
    #[must_use]
    pub const fn is_dormant(&self) -> bool {
        self.cache.is_none() && self.memento.is_some()
    }

    /// Current cache contents: a fresh snapshot of the live cache, or the
    /// stored memento when the cache is dormant.
    #[must_use]
    pub fn latest_memento(&self) -> Option<GeocacheMemento> {
        match &self.cache {
            Some(cache) => Some(cache.snapshot()),
            None => self.memento.clone(),
        }
    }
}

/// Errors raised when a cell update would break a store invariant.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CellStoreError {
    /// Discovery is permanent; a discovered cell cannot be reset.
    #[error("cell {cell} is already discovered and cannot be undiscovered")]
    Undiscover {
        /// Cell targeted by the update.
        cell: CellCoord,
    },
}

/// Authoritative map from cell to [`CellState`].
///
/// Cells are keyed by their integer indices, so distinct cells can never
/// collide. The store is the only place cell state changes.
#[derive(Clone, Debug, Default)]
pub struct CellStore {
    entries: BTreeMap<CellCoord, CellState>,
}

impl CellStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the state recorded for `cell`.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<&CellState> {
        self.entries.get(&cell)
    }

    /// Records `state` for `cell`, refusing to undiscover a discovered cell.
    pub fn set(&mut self, cell: CellCoord, state: CellState) -> Result<(), CellStoreError> {
        if !state.discovered && self.is_discovered(cell) {
            return Err(CellStoreError::Undiscover { cell });
        }
        let _ = self.entries.insert(cell, state);
        Ok(())
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether the spawn decision for `cell` has been made.
    #[must_use]
    pub fn is_discovered(&self, cell: CellCoord) -> bool {
        self.entries
            .get(&cell)
            .is_some_and(CellState::is_discovered)
    }

    /// Number of discovered cells.
    #[must_use]
    pub fn discovered_count(&self) -> usize {
        self.entries
            .values()
            .filter(|state| state.is_discovered())
            .count()
    }

    /// Iterates over all recorded cells in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &CellState)> {
        self.entries.iter().map(|(cell, state)| (*cell, state))
    }

    /// Cells whose cache is currently live, in ascending order.
    pub fn live_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.entries
            .iter()
            .filter(|(_, state)| state.cache.is_some())
            .map(|(cell, _)| *cell)
    }

    pub(crate) fn cache_mut(&mut self, cell: CellCoord) -> Option<&mut Geocache> {
        self.entries
            .get_mut(&cell)
            .and_then(|state| state.cache.as_mut())
    }

    /// Restores a dormant cache from its memento. Returns `false` when the
    /// cell has no dormant cache.
    pub(crate) fn reveal(&mut self, cell: CellCoord) -> bool {
        let Some(state) = self.entries.get_mut(&cell) else {
            return false;
        };
        if !state.is_dormant() {
            return false;
        }
        let Some(memento) = state.memento.as_ref() else {
            return false;
        };
        let mut cache = Geocache::restore(memento);
        cache.show();
        state.cache = Some(cache);
        true
    }

    /// Refreshes the memento from the live cache and drops the live object.
    /// Returns `false` when the cell has no live cache.
    pub(crate) fn hide(&mut self, cell: CellCoord) -> bool {
        let Some(state) = self.entries.get_mut(&cell) else {
            return false;
        };
        let Some(mut cache) = state.cache.take() else {
            return false;
        };
        cache.hide();
        state.memento = Some(cache.snapshot());
        true
    }
}
