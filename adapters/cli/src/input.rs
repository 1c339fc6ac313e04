//! Parser for the interactive prompt.

use std::str::FromStr;

use geocache_core::{CellCoord, CellKey, CellKeyError, CoinId, Direction, GeoPoint};
use thiserror::Error;

/// Help text listing every prompt command.
pub(crate) const HELP: &str = "\
commands:
  n | s | e | w | up | down | left | right   step one cell
  goto <lat> <lng>                           jump to a location
  look <i:j>                                 list the coins of a cache
  collect <i:j> <coin>                       take a coin from a cache
  deposit <i:j>                              drop your newest coin into a cache
  inventory                                  list carried coins
  map                                        redraw the map
  save | load | reset                        manage the saved game
  help | quit";

/// One line of player input.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Input {
    /// Move one cell.
    Step(Direction),
    /// Move to an absolute location.
    Goto(GeoPoint),
    /// Show the popup of a cache.
    Look(CellCoord),
    /// Take a coin from a cache.
    Collect {
        /// Cell hosting the cache.
        cell: CellCoord,
        /// Coin to take.
        coin: CoinId,
    },
    /// Drop the newest inventory coin into a cache.
    Deposit(CellCoord),
    /// List carried coins.
    Inventory,
    /// Redraw the map.
    Map,
    /// Save the game.
    Save,
    /// Load the saved game.
    Load,
    /// Start over.
    Reset,
    /// Print the command list.
    Help,
    /// Leave the game.
    Quit,
}

/// Reasons a line could not be understood.
#[derive(Clone, Debug, PartialEq, Error)]
pub(crate) enum ParseError {
    /// The line held only whitespace.
    #[error("type a command, or `help`")]
    Empty,
    /// The first word is not a command.
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    /// A required argument is absent.
    #[error("`{command}` needs {argument}")]
    MissingArgument {
        /// Command being parsed.
        command: &'static str,
        /// Description of the missing argument.
        argument: &'static str,
    },
    /// More arguments than the command takes.
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
    /// A cell key is malformed.
    #[error("bad cell `{text}`: {source}")]
    InvalidCell {
        /// Text that failed to parse.
        text: String,
        /// Underlying error.
        source: CellKeyError,
    },
    /// A coordinate is not a finite number in range.
    #[error("bad coordinate `{0}`")]
    InvalidCoordinate(String),
}

impl FromStr for Input {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(ParseError::Empty)?;

        let input = match command.to_ascii_lowercase().as_str() {
            "n" | "north" | "up" => Self::Step(Direction::North),
            "s" | "south" | "down" => Self::Step(Direction::South),
            "e" | "east" | "right" => Self::Step(Direction::East),
            "w" | "west" | "left" => Self::Step(Direction::West),
            "goto" => {
                let lat = coordinate(&mut words, "goto", "a latitude", 90.0)?;
                let lng = coordinate(&mut words, "goto", "a longitude", 180.0)?;
                Self::Goto(GeoPoint::new(lat, lng))
            }
            "look" => Self::Look(cell(&mut words, "look")?),
            "collect" | "take" => {
                let cell = cell(&mut words, "collect")?;
                let coin = words.next().ok_or(ParseError::MissingArgument {
                    command: "collect",
                    argument: "a coin id",
                })?;
                Self::Collect {
                    cell,
                    coin: CoinId::new(coin),
                }
            }
            "deposit" | "drop" => Self::Deposit(cell(&mut words, "deposit")?),
            "inventory" | "inv" | "i" => Self::Inventory,
            "map" => Self::Map,
            "save" => Self::Save,
            "load" => Self::Load,
            "reset" => Self::Reset,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(ParseError::UnknownCommand(other.to_owned())),
        };

        match words.next() {
            Some(extra) => Err(ParseError::UnexpectedArgument(extra.to_owned())),
            None => Ok(input),
        }
    }
}

fn cell<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
) -> Result<CellCoord, ParseError> {
    let text = words.next().ok_or(ParseError::MissingArgument {
        command,
        argument: "a cell like 3:4",
    })?;
    text.parse::<CellKey>()
        .map(|key| key.cell())
        .map_err(|source| ParseError::InvalidCell {
            text: text.to_owned(),
            source,
        })
}

fn coordinate<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    argument: &'static str,
    limit: f64,
) -> Result<f64, ParseError> {
    let text = words
        .next()
        .ok_or(ParseError::MissingArgument { command, argument })?;
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() <= limit => Ok(value),
        _ => Err(ParseError::InvalidCoordinate(text.to_owned())),
    }
}
