//! Character-grid map view for the terminal.

use std::collections::BTreeMap;

use anyhow::Result as AnyResult;
use geocache_core::{CellCoord, CellGrid, GeoPoint};
use geocache_rendering::{CachePresentation, MapView};

const PLAYER: char = '@';
const CACHE: char = 'C';
const TRAIL: char = '+';
const DISCOVERED: char = '·';
const UNKNOWN: char = ' ';

/// Map view that keeps just enough state to print the area around the
/// player as text.
#[derive(Debug, Default)]
pub(crate) struct TextMap {
    caches: BTreeMap<CellCoord, usize>,
    player: Option<GeoPoint>,
    trail: Vec<GeoPoint>,
    popup: Option<String>,
}

impl TextMap {
    /// Returns the most recent popup text, if one is pending.
    pub(crate) fn take_popup(&mut self) -> Option<String> {
        self.popup.take()
    }

    /// Renders the square of cells within `radius` of the player, north up.
    pub(crate) fn render(
        &self,
        grid: &CellGrid,
        radius: u32,
        is_discovered: impl Fn(CellCoord) -> bool,
    ) -> String {
        let Some(player) = self.player else {
            return String::new();
        };
        let center = grid.cell_at(player);
        let trail: Vec<CellCoord> = self.trail.iter().map(|point| grid.cell_at(*point)).collect();
        let radius = i64::from(radius);

        let mut text = String::new();
        for di in (-radius..=radius).rev() {
            for dj in -radius..=radius {
                let cell = offset(center, di, dj);
                let glyph = match cell {
                    Some(cell) if cell == center => PLAYER,
                    Some(cell) if self.caches.contains_key(&cell) => CACHE,
                    Some(cell) if trail.contains(&cell) => TRAIL,
                    Some(cell) if is_discovered(cell) => DISCOVERED,
                    _ => UNKNOWN,
                };
                text.push(glyph);
            }
            text.push('\n');
        }
        text.push_str(&format!(
            "{PLAYER} you at {player}   {CACHE} cache ({} in view)   {TRAIL} trail ({} points)",
            self.caches.len(),
            self.trail.len()
        ));
        text
    }
}

fn offset(center: CellCoord, di: i64, dj: i64) -> Option<CellCoord> {
    let i = i32::try_from(i64::from(center.i()) + di).ok()?;
    let j = i32::try_from(i64::from(center.j()) + dj).ok()?;
    Some(CellCoord::new(i, j))
}

impl MapView for TextMap {
    type Handle = CellCoord;

    fn draw_cache(&mut self, cache: &CachePresentation) -> AnyResult<CellCoord> {
        let _ = self.caches.insert(cache.cell, cache.coins.len());
        Ok(cache.cell)
    }

    fn remove_cache(&mut self, handle: CellCoord) -> AnyResult<()> {
        let _ = self.caches.remove(&handle);
        Ok(())
    }

    fn show_popup(&mut self, cache: &CachePresentation) -> AnyResult<()> {
        let _ = self.caches.insert(cache.cell, cache.coins.len());
        let coins = if cache.coins.is_empty() {
            "(empty)".to_owned()
        } else {
            cache
                .coins
                .iter()
                .map(|coin| coin.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        };
        self.popup = Some(format!(
            "cache {} at {}: {} coins\n  {coins}",
            cache.key,
            cache.location,
            cache.coins.len()
        ));
        Ok(())
    }

    fn move_player_marker(&mut self, location: GeoPoint) -> AnyResult<()> {
        self.player = Some(location);
        Ok(())
    }

    fn draw_trail(&mut self, points: &[GeoPoint]) -> AnyResult<()> {
        self.trail = points.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocache_core::{CoinId, DEFAULT_ORIGIN};

    fn presentation(grid: &CellGrid, cell: CellCoord, coins: usize) -> CachePresentation {
        CachePresentation {
            cell,
            key: cell.key(),
            location: grid.anchor(cell),
            bounds: grid.bounds(cell),
            coins: (0..coins as u32).map(|serial| CoinId::minted(cell, serial)).collect(),
        }
    }

    #[test]
    fn renders_player_caches_and_discovery() {
        let grid = CellGrid::default();
        let mut map = TextMap::default();
        map.move_player_marker(DEFAULT_ORIGIN).expect("marker");
        let _ = map
            .draw_cache(&presentation(&grid, CellCoord::new(1, -1), 2))
            .expect("draw");

        let text = map.render(&grid, 1, |cell| cell.j() >= 0);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0], "C··");
        assert_eq!(rows[1], " @·");
        assert_eq!(rows[2], " ··");
        assert!(rows[3].contains("1 in view"));
    }

    #[test]
    fn removed_caches_disappear() {
        let grid = CellGrid::default();
        let mut map = TextMap::default();
        map.move_player_marker(DEFAULT_ORIGIN).expect("marker");
        let handle = map
            .draw_cache(&presentation(&grid, CellCoord::new(0, 1), 1))
            .expect("draw");
        map.remove_cache(handle).expect("remove");

        let text = map.render(&grid, 1, |_| true);
        assert!(!text.lines().take(3).any(|row| row.contains(CACHE)));
    }

    #[test]
    fn popup_lists_coins_once() {
        let grid = CellGrid::default();
        let mut map = TextMap::default();
        map.show_popup(&presentation(&grid, CellCoord::new(3, 4), 2))
            .expect("popup");

        let popup = map.take_popup().expect("pending popup");
        assert!(popup.starts_with("cache 3:4"));
        assert!(popup.contains("3:4#0 3:4#1"));
        assert!(map.take_popup().is_none());
    }

    #[test]
    fn nothing_renders_before_the_player_is_placed() {
        assert!(TextMap::default().render(&CellGrid::default(), 2, |_| true).is_empty());
    }
}
