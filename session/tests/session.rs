use std::collections::BTreeSet;

use geocache_core::{
    CellCoord, CellGrid, CellRecord, CoinId, Direction, Event, GeoPoint, GeocacheMemento,
    WorldSnapshot, DEFAULT_ORIGIN,
};
use geocache_persistence::{
    self as persistence, FileStore, KeyValueStore, MemoryStore, GAME_STATE_KEY,
};
use geocache_session::{GameConfig, Session};
use geocache_system_spawning::SpawnOracle;
use geocache_world::query;

const CACHE_CELL: CellCoord = CellCoord::new(3, 4);

fn started(config: &GameConfig) -> Session<MemoryStore> {
    let mut session = Session::new(config, MemoryStore::new());
    let _ = session.start();
    session
}

fn cache_coins(session: &Session<MemoryStore>, cell: CellCoord) -> Vec<CoinId> {
    query::cache(session.world(), cell)
        .expect("cache is live")
        .coins()
        .to_vec()
}

fn far_north() -> GeoPoint {
    DEFAULT_ORIGIN.offset(0.003, 0.0)
}

#[test]
fn fresh_start_discovers_window_around_default_location() {
    let session = started(&GameConfig::default());
    let world = session.world();

    assert_eq!(query::player_location(world), DEFAULT_ORIGIN);
    assert_eq!(query::discovered_count(world), 17 * 17);
    assert_eq!(query::live_cache_cells(world).len(), 24);
    assert_eq!(cache_coins(&session, CACHE_CELL).len(), 4);
    assert_eq!(session.window().len(), 17 * 17);
}

#[test]
fn collected_coin_returns_on_deposit() {
    let mut session = started(&GameConfig::default());
    let coin = CoinId::minted(CACHE_CELL, 3);

    let outcome = session.collect(CACHE_CELL, coin.clone());
    assert!(outcome.accepted);
    assert_eq!(cache_coins(&session, CACHE_CELL).len(), 3);
    assert_eq!(query::inventory(session.world()), &[coin.clone()]);

    let outcome = session.deposit(CACHE_CELL);
    assert!(outcome.accepted);
    assert!(outcome.events.contains(&Event::CoinDeposited {
        cell: CACHE_CELL,
        coin: coin.clone(),
    }));
    assert_eq!(cache_coins(&session, CACHE_CELL).len(), 4);
    assert!(cache_coins(&session, CACHE_CELL).contains(&coin));
    assert!(query::inventory(session.world()).is_empty());
}

#[test]
fn invalid_transactions_are_no_ops() {
    let mut session = started(&GameConfig::default());
    let before = query::snapshot(session.world());

    assert!(!session.deposit(CACHE_CELL).accepted);
    assert!(!session.collect(CACHE_CELL, CoinId::new("3:4#99")).accepted);
    assert!(!session.collect(CellCoord::new(0, 0), CoinId::minted(CACHE_CELL, 0)).accepted);

    let coin = CoinId::minted(CACHE_CELL, 3);
    assert!(session.collect(CACHE_CELL, coin.clone()).accepted);
    assert!(!session.collect(CACHE_CELL, coin).accepted);
    assert!(session.deposit(CACHE_CELL).accepted);

    assert_eq!(query::snapshot(session.world()).cells, before.cells);
}

#[test]
fn cache_reappears_with_coins_it_left_with() {
    let mut session = started(&GameConfig::default());
    let _ = session.collect(CACHE_CELL, CoinId::minted(CACHE_CELL, 1));
    let expected = cache_coins(&session, CACHE_CELL);

    let events = session.move_to(far_north());
    assert!(events.contains(&Event::CacheHidden { cell: CACHE_CELL }));
    assert!(query::cache(session.world(), CACHE_CELL).is_none());

    let events = session.move_to(DEFAULT_ORIGIN);
    assert!(events.contains(&Event::CacheShown { cell: CACHE_CELL }));
    assert_eq!(cache_coins(&session, CACHE_CELL), expected);
    assert_eq!(expected.len(), 3);
}

#[test]
fn saved_world_with_two_cells_loads_identically() {
    let config = GameConfig {
        visibility_radius: Some(0),
        ..GameConfig::default()
    };
    let snapshot = WorldSnapshot {
        location: DEFAULT_ORIGIN,
        inventory: (0..3).map(|serial| CoinId::minted(CACHE_CELL, serial)).collect(),
        cells: vec![
            CellRecord {
                cell: CellCoord::new(0, 0),
                discovered: true,
                memento: None,
            },
            CellRecord {
                cell: CACHE_CELL,
                discovered: true,
                memento: Some(GeocacheMemento::new(
                    CACHE_CELL,
                    CellGrid::default().anchor(CACHE_CELL),
                    vec![CoinId::minted(CACHE_CELL, 3)],
                )),
            },
        ],
        history: vec![DEFAULT_ORIGIN],
    };

    let mut store = MemoryStore::new();
    persistence::save_snapshot(&mut store, &snapshot).expect("save");

    let mut session = Session::new(&config, store);
    let events = session.start();
    assert!(events.contains(&Event::WorldRestored {
        location: DEFAULT_ORIGIN
    }));
    assert_eq!(query::snapshot(session.world()), snapshot);
}

#[test]
fn autosave_resumes_where_the_player_left_off() {
    let mut session = started(&GameConfig::default());
    let _ = session.step(Direction::East);
    let _ = session.collect(CACHE_CELL, CoinId::minted(CACHE_CELL, 0));
    let expected = query::snapshot(session.world());

    let mut resumed = Session::new(&GameConfig::default(), session.store().clone());
    let _ = resumed.start();
    assert_eq!(query::snapshot(resumed.world()), expected);
    assert_eq!(query::movement_history(resumed.world()).len(), 2);
}

#[test]
fn autosave_can_be_disabled() {
    let config = GameConfig {
        autosave: Some(false),
        ..GameConfig::default()
    };
    let mut session = started(&config);
    let _ = session.step(Direction::North);
    assert!(session.store().is_empty());

    session.save().expect("explicit save");
    assert!(session.store().get(GAME_STATE_KEY).expect("get").is_some());
}

#[test]
fn load_without_saved_state_changes_nothing() {
    let config = GameConfig {
        autosave: Some(false),
        ..GameConfig::default()
    };
    let mut session = started(&config);
    let before = query::snapshot(session.world());

    assert!(session.load().is_none());
    assert_eq!(query::snapshot(session.world()), before);
}

#[test]
fn load_discards_unsaved_progress() {
    let config = GameConfig {
        autosave: Some(false),
        ..GameConfig::default()
    };
    let mut session = started(&config);
    session.save().expect("save");
    let saved = query::snapshot(session.world());

    let _ = session.collect(CACHE_CELL, CoinId::minted(CACHE_CELL, 2));
    let _ = session.move_to(far_north());
    let _ = session.load().expect("saved state");

    assert_eq!(query::snapshot(session.world()), saved);
    assert_eq!(cache_coins(&session, CACHE_CELL).len(), 4);
}

#[test]
fn malformed_save_starts_fresh() {
    let mut store = MemoryStore::new();
    store
        .set(GAME_STATE_KEY, br#"{"currentLocation":{"lat":"north"}}"#)
        .expect("set");

    let mut session = Session::new(&GameConfig::default(), store);
    let events = session.start();

    assert!(events.contains(&Event::WorldReset {
        location: DEFAULT_ORIGIN
    }));
    assert_eq!(query::discovered_count(session.world()), 17 * 17);
}

#[test]
fn reset_forgets_everything() {
    let mut session = started(&GameConfig::default());
    let _ = session.collect(CACHE_CELL, CoinId::minted(CACHE_CELL, 0));
    let _ = session.move_to(far_north());
    assert_eq!(query::discovered_count(session.world()), 2 * 17 * 17);

    let _ = session.reset();
    let world = session.world();
    assert_eq!(query::player_location(world), DEFAULT_ORIGIN);
    assert!(query::inventory(world).is_empty());
    assert_eq!(query::movement_history(world), &[DEFAULT_ORIGIN]);
    assert_eq!(query::discovered_count(world), 17 * 17);
    assert_eq!(cache_coins(&session, CACHE_CELL).len(), 4);

    let saved = persistence::load_snapshot(session.store()).expect("autosaved");
    assert!(saved.inventory.is_empty());
}

#[test]
fn coins_are_conserved_and_discovery_is_monotonic() {
    let mut session = started(&GameConfig {
        visibility_radius: Some(4),
        ..GameConfig::default()
    });
    let oracle = SpawnOracle::default();
    let path = [
        Direction::East,
        Direction::East,
        Direction::North,
        Direction::North,
        Direction::North,
        Direction::West,
        Direction::West,
        Direction::West,
        Direction::West,
        Direction::South,
        Direction::South,
        Direction::East,
    ];

    let mut discovered: BTreeSet<CellCoord> = BTreeSet::new();
    for (index, direction) in path.into_iter().enumerate() {
        let _ = session.step(direction);

        let live = query::live_cache_cells(session.world());
        if let Some(&cell) = live.first() {
            if index % 3 == 2 {
                let _ = session.deposit(cell);
            } else if let Some(coin) = cache_coins(&session, cell).first().cloned() {
                assert!(session.collect(cell, coin).accepted);
            }
        }

        let snapshot = query::snapshot(session.world());
        let now: BTreeSet<CellCoord> = snapshot
            .cells
            .iter()
            .filter(|record| record.discovered)
            .map(|record| record.cell)
            .collect();
        assert!(discovered.is_subset(&now), "a cell was forgotten");
        discovered = now;

        let mut held = BTreeSet::new();
        let placed = snapshot
            .inventory
            .iter()
            .chain(
                snapshot
                    .cells
                    .iter()
                    .filter_map(|record| record.memento.as_ref())
                    .flat_map(|memento| memento.coins()),
            );
        for coin in placed {
            assert!(held.insert(coin.clone()), "coin {coin} held twice");
        }

        let minted: BTreeSet<CoinId> = discovered
            .iter()
            .filter(|cell| oracle.should_spawn(**cell))
            .flat_map(|cell| {
                (0..oracle.initial_coin_count(*cell))
                    .map(move |serial| CoinId::minted(*cell, serial))
            })
            .collect();
        assert_eq!(held, minted, "coins lost or invented");
    }
}

#[test]
fn file_store_survives_restart() {
    let directory = tempfile::tempdir().expect("tempdir");
    let coin = CoinId::minted(CACHE_CELL, 0);

    {
        let mut session = Session::new(&GameConfig::default(), FileStore::new(directory.path()));
        let _ = session.start();
        assert!(session.collect(CACHE_CELL, coin.clone()).accepted);
    }

    let mut session = Session::new(&GameConfig::default(), FileStore::new(directory.path()));
    let _ = session.start();
    assert_eq!(query::inventory(session.world()), &[coin]);
    let cache = query::cache(session.world(), CACHE_CELL).expect("cache revived");
    assert_eq!(cache.coins().len(), 3);
}
