#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared map view contracts for geocache adapters.
//!
//! Adapters implement [`MapView`] and hand it to a [`ViewSync`], which
//! replays world events onto the view. Whatever handle the view returns for
//! a drawn cache is kept in the sync's side table, so the domain's cache
//! entity never learns about the renderer.

use std::collections::BTreeMap;

use anyhow::Result as AnyResult;
use geocache_core::{CellCoord, CellKey, CoinId, Event, GeoPoint};
use geocache_world::{query, Geocache, World};

/// Everything a view needs to draw one cache or its popup.
#[derive(Clone, Debug, PartialEq)]
pub struct CachePresentation {
    /// Cell hosting the cache.
    pub cell: CellCoord,
    /// Canonical key of the cell, suitable for labels.
    pub key: CellKey,
    /// Location of the cache marker.
    pub location: GeoPoint,
    /// Lower and upper corners of the cell rectangle.
    pub bounds: (GeoPoint, GeoPoint),
    /// Coins currently held, in cache order.
    pub coins: Vec<CoinId>,
}

impl CachePresentation {
    /// Captures the presentation data of a live cache.
    #[must_use]
    pub fn from_cache(world: &World, cache: &Geocache) -> Self {
        let cell = cache.cell();
        Self {
            cell,
            key: cell.key(),
            location: cache.location(),
            bounds: query::grid(world).bounds(cell),
            coins: cache.coins().to_vec(),
        }
    }

    /// Looks up the live cache at `cell`, if any.
    #[must_use]
    pub fn lookup(world: &World, cell: CellCoord) -> Option<Self> {
        query::cache(world, cell).map(|cache| Self::from_cache(world, cache))
    }
}

/// Operations the game requires from a map renderer.
///
/// Popups carry no callbacks: a view turns the player's collect and deposit
/// clicks into commands submitted through the session.
pub trait MapView {
    /// Renderer-specific token identifying a drawn cache.
    type Handle;

    /// Draws a cache marker and returns its handle.
    fn draw_cache(&mut self, cache: &CachePresentation) -> AnyResult<Self::Handle>;

    /// Removes a previously drawn cache marker.
    fn remove_cache(&mut self, handle: Self::Handle) -> AnyResult<()>;

    /// Shows (or refreshes) the popup listing the coins of a cache.
    fn show_popup(&mut self, cache: &CachePresentation) -> AnyResult<()>;

    /// Moves the player marker.
    fn move_player_marker(&mut self, location: GeoPoint) -> AnyResult<()>;

    /// Draws the player's trail, oldest point first.
    fn draw_trail(&mut self, points: &[GeoPoint]) -> AnyResult<()>;
}

/// Keeps a [`MapView`] in step with the world by replaying events.
#[derive(Debug)]
pub struct ViewSync<V: MapView> {
    view: V,
    handles: BTreeMap<CellCoord, V::Handle>,
}

impl<V: MapView> ViewSync<V> {
    /// Wraps `view` with an empty handle table.
    pub fn new(view: V) -> Self {
        Self {
            view,
            handles: BTreeMap::new(),
        }
    }

    /// Read-only access to the wrapped view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access to the wrapped view.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Cells that currently have a drawn marker.
    pub fn drawn_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.handles.keys().copied()
    }

    /// Applies a batch of world events to the view.
    ///
    /// `world` must already reflect every event in the batch; markers are
    /// drawn from its current state.
    pub fn handle(&mut self, events: &[Event], world: &World) -> AnyResult<()> {
        let mut player_moved = false;

        for event in events {
            match event {
                Event::GridConfigured { .. }
                | Event::WorldReset { .. }
                | Event::WorldRestored { .. } => {
                    self.clear()?;
                    player_moved = true;
                }
                Event::PlayerMoved { .. } => player_moved = true,
                Event::CacheShown { cell } => self.draw(world, *cell)?,
                Event::CacheHidden { cell } => self.erase(*cell)?,
                Event::CoinCollected { cell, .. } | Event::CoinDeposited { cell, .. } => {
                    let _ = self.open_popup(world, *cell)?;
                }
                Event::CellDiscovered { .. }
                | Event::CollectRejected { .. }
                | Event::DepositRejected { .. } => {}
            }
        }

        if player_moved {
            self.view.move_player_marker(query::player_location(world))?;
            self.view.draw_trail(query::movement_history(world))?;
        }
        Ok(())
    }

    /// Shows the popup of the live cache at `cell`. Returns `false` when no
    /// cache is live there.
    pub fn open_popup(&mut self, world: &World, cell: CellCoord) -> AnyResult<bool> {
        match CachePresentation::lookup(world, cell) {
            Some(presentation) => {
                self.view.show_popup(&presentation)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn draw(&mut self, world: &World, cell: CellCoord) -> AnyResult<()> {
        // Later events in the same batch may already have hidden the cache.
        let Some(presentation) = CachePresentation::lookup(world, cell) else {
            return Ok(());
        };
        self.erase(cell)?;
        let handle = self.view.draw_cache(&presentation)?;
        let _ = self.handles.insert(cell, handle);
        Ok(())
    }

    fn erase(&mut self, cell: CellCoord) -> AnyResult<()> {
        if let Some(handle) = self.handles.remove(&cell) {
            self.view.remove_cache(handle)?;
        }
        Ok(())
    }

    fn clear(&mut self) -> AnyResult<()> {
        let handles = std::mem::take(&mut self.handles);
        if !handles.is_empty() {
            log::debug!("clearing {} cache markers", handles.len());
        }
        for handle in handles.into_values() {
            self.view.remove_cache(handle)?;
        }
        Ok(())
    }
}
