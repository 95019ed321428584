//! HyperRoll rules engine: a deterministic, headless two-player board game
//! combining dice-mapped sign duels with property economics, character
//! passives, blessings, curses and chance cards.
//!
//! All state transitions flow through [`GameEngine`]: commands in, events
//! out. Presentation layers consume the event stream and never touch the
//! rules directly.

mod board;
pub mod cards;
mod dice;
pub mod duel;
pub mod economy;
mod game;
mod player;
mod quest;
mod rng;
mod rules;
pub mod selfplay;

pub use crate::board::*;
pub use crate::dice::{roll_for_sign, roll_free, roll_single, DiceRoll};
pub use crate::game::*;
pub use crate::player::*;
pub use crate::quest::*;
pub use crate::rng::*;
pub use crate::rules::*;
pub use crate::selfplay::{
    run_batch_selfplay, run_selfplay, AggregateMetrics, BatchSelfPlayResult, MatchMetrics,
    MatchOutcome, PlayerStats, SelfPlayConfig, SelfPlayResult,
};
