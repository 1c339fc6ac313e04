#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares the geocache experience.

use geocache_core::{CellGrid, GeoPoint};
use geocache_world::{query, World};

/// Produces data required to greet the player.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Exposes the cell grid configuration required for rendering.
    #[must_use]
    pub fn grid<'world>(&self, world: &'world World) -> &'world CellGrid {
        query::grid(world)
    }

    /// Location the map should be centred on.
    #[must_use]
    pub fn player_location(&self, world: &World) -> GeoPoint {
        query::player_location(world)
    }

    /// One-line summary of the loaded game, shown below the banner.
    #[must_use]
    pub fn status_line(&self, world: &World) -> String {
        format!(
            "at {} (cell {}), {} coins carried, {} cells discovered",
            query::player_location(world),
            query::player_cell(world),
            query::inventory(world).len(),
            query::discovered_count(world)
        )
    }
}
