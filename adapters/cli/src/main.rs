#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the geocache game in a terminal.

mod input;
mod logging;
mod text_map;

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use geocache_core::{CollectRejection, DepositRejection, Event};
use geocache_persistence::FileStore;
use geocache_rendering::ViewSync;
use geocache_session::{GameConfig, Session};
use geocache_system_bootstrap::Bootstrap;
use geocache_world::query;

use crate::{
    input::{Input, HELP},
    text_map::TextMap,
};

/// Walk a grid of map cells, collecting and depositing geocoins.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with game settings
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory holding the saved game
    #[arg(long, default_value = ".geocache")]
    save_dir: PathBuf,
    /// Seed of the spawn oracle, overriding the config file
    #[arg(long)]
    seed: Option<u64>,
    /// Visibility radius in cells, overriding the config file
    #[arg(long)]
    radius: Option<u32>,
    /// Save only when asked to
    #[arg(long)]
    no_autosave: bool,
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => GameConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(radius) = self.radius {
            config.visibility_radius = Some(radius);
        }
        if self.no_autosave {
            config.autosave = Some(false);
        }
        Ok(config)
    }
}

struct Game {
    session: Session<FileStore>,
    sync: ViewSync<TextMap>,
}

impl Game {
    fn present(&mut self, events: &[Event]) -> Result<()> {
        self.sync
            .handle(events, self.session.world())
            .context("failed to update the map")?;
        for event in events {
            if let Some(message) = describe(event) {
                println!("{message}");
            }
        }
        self.print_map();
        if let Some(popup) = self.sync.view_mut().take_popup() {
            println!("{popup}");
        }
        Ok(())
    }

    fn print_map(&self) {
        let world = self.session.world();
        let cells = query::cells(world);
        println!(
            "{}",
            self.sync
                .view()
                .render(query::grid(world), self.session.radius(), |cell| {
                    cells.is_discovered(cell)
                })
        );
    }

    /// Runs one prompt command. Returns `false` once the player quits.
    fn execute(&mut self, input: Input) -> Result<bool> {
        match input {
            Input::Step(direction) => {
                let events = self.session.step(direction);
                self.present(&events)?;
            }
            Input::Goto(to) => {
                let events = self.session.move_to(to);
                self.present(&events)?;
            }
            Input::Look(cell) => {
                if self.sync.open_popup(self.session.world(), cell)? {
                    if let Some(popup) = self.sync.view_mut().take_popup() {
                        println!("{popup}");
                    }
                } else {
                    println!("no cache in view at {cell}");
                }
            }
            Input::Collect { cell, coin } => {
                let outcome = self.session.collect(cell, coin);
                self.present(&outcome.events)?;
            }
            Input::Deposit(cell) => {
                let outcome = self.session.deposit(cell);
                self.present(&outcome.events)?;
            }
            Input::Inventory => {
                let inventory = query::inventory(self.session.world());
                if inventory.is_empty() {
                    println!("you carry no coins");
                } else {
                    let coins: Vec<&str> = inventory.iter().map(|coin| coin.as_str()).collect();
                    println!("you carry {} coins (newest last): {}", coins.len(), coins.join(" "));
                }
            }
            Input::Map => self.print_map(),
            Input::Save => match self.session.save() {
                Ok(()) => println!("game saved"),
                Err(error) => {
                    log::warn!("manual save failed: {error}");
                    println!("could not save the game: {error}");
                }
            },
            Input::Load => match self.session.load() {
                Some(events) => self.present(&events)?,
                None => println!("no saved game"),
            },
            Input::Reset => {
                let events = self.session.reset();
                self.present(&events)?;
            }
            Input::Help => println!("{HELP}"),
            Input::Quit => return Ok(false),
        }
        Ok(true)
    }
}

fn describe(event: &Event) -> Option<String> {
    let message = match event {
        Event::CoinCollected { cell, coin } => format!("collected {coin} from {cell}"),
        Event::CoinDeposited { cell, coin } => format!("deposited {coin} into {cell}"),
        Event::CollectRejected { cell, coin, reason } => match reason {
            CollectRejection::CacheNotVisible => format!("no cache in view at {cell}"),
            CollectRejection::MissingCoin => format!("cache {cell} does not hold {coin}"),
        },
        Event::DepositRejected { cell, reason } => match reason {
            DepositRejection::EmptyInventory => "you have no coins to deposit".to_owned(),
            DepositRejection::CacheNotVisible => format!("no cache in view at {cell}"),
            DepositRejection::DuplicateCoin => format!("cache {cell} already holds that coin"),
        },
        Event::WorldReset { location } => format!("starting fresh at {location}"),
        Event::WorldRestored { location } => format!("resumed at {location}"),
        _ => return None,
    };
    Some(message)
}

/// Entry point for the geocache command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = args.game_config()?;
    let store = FileStore::new(&args.save_dir);
    let mut game = Game {
        session: Session::new(&config, store),
        sync: ViewSync::new(TextMap::default()),
    };

    let bootstrap = Bootstrap;
    println!("{}", bootstrap.welcome_banner(game.session.world()));
    let events = game.session.start();
    game.present(&events)?;
    println!("{}", bootstrap.status_line(game.session.world()));
    println!("type `help` for commands");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read from stdin")?;
        match line.parse::<Input>() {
            Ok(input) => {
                if !game.execute(input)? {
                    break;
                }
            }
            Err(error) => println!("{error}"),
        }
    }

    log::info!("leaving the game");
    Ok(())
}
