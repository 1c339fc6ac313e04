use std::collections::BTreeSet;

use geocache_core::{cells_around, CellCoord, Command, Event, SpawnDecision};
use geocache_system_spawning::{Config, SpawnOracle, DEFAULT_MAX_COINS, DEFAULT_SEED};
use geocache_world::{self as world, query, World};

fn discover_window(oracle: &SpawnOracle, radius: u32) -> (World, Vec<Event>) {
    let mut world = World::new();
    let mut events = Vec::new();
    for cell in cells_around(CellCoord::new(0, 0), radius) {
        world::apply(
            &mut world,
            Command::DiscoverCell {
                cell,
                decision: oracle.decide(cell),
            },
            &mut events,
        );
    }
    (world, events)
}

#[test]
fn default_seed_populates_window_at_configured_rate() {
    let oracle = SpawnOracle::default();
    let (world, events) = discover_window(&oracle, 20);

    let spawned: Vec<CellCoord> = events
        .iter()
        .filter_map(|event| match event {
            Event::CellDiscovered {
                cell,
                spawned: true,
            } => Some(*cell),
            _ => None,
        })
        .collect();

    assert_eq!(query::discovered_count(&world), 41 * 41);
    assert_eq!(spawned.len(), 176);
    assert_eq!(query::live_cache_cells(&world), spawned);

    let mut total = 0;
    let mut coins = BTreeSet::new();
    for cell in &spawned {
        let cache = query::cache(&world, *cell).expect("spawned cell has a cache");
        let count = cache.coins().len();
        assert!((1..=DEFAULT_MAX_COINS as usize).contains(&count));
        total += count;
        for coin in cache.coins() {
            assert!(coins.insert(coin.clone()), "coin {coin} minted twice");
        }
    }
    assert_eq!(total, 958);
}

#[test]
fn decisions_match_initial_coin_counts() {
    let oracle = SpawnOracle::default();
    let (world, _) = discover_window(&oracle, 8);

    for cell in query::live_cache_cells(&world) {
        let cache = query::cache(&world, cell).expect("cache");
        let expected = oracle.initial_coin_count(cell) as usize;
        assert_eq!(cache.coins().len(), expected, "cell {cell}");
        assert_eq!(
            oracle.decide(cell),
            SpawnDecision::Cache {
                coins: expected as u32
            }
        );
    }
}

#[test]
fn seeds_produce_different_maps() {
    let default_oracle = SpawnOracle::default();
    let other = SpawnOracle::new(Config::new(1, 0.1, DEFAULT_MAX_COINS));
    let (default_world, _) = discover_window(&default_oracle, 20);
    let (other_world, _) = discover_window(&other, 20);

    assert_eq!(query::live_cache_cells(&other_world).len(), 161);
    assert_ne!(
        query::live_cache_cells(&default_world),
        query::live_cache_cells(&other_world)
    );
}

#[test]
fn replay_is_deterministic() {
    let first = discover_window(&SpawnOracle::new(Config::new(DEFAULT_SEED, 0.25, 3)), 10);
    let second = discover_window(&SpawnOracle::new(Config::new(DEFAULT_SEED, 0.25, 3)), 10);

    assert_eq!(first.1, second.1, "event streams diverged");
    assert_eq!(query::snapshot(&first.0), query::snapshot(&second.0));
}
