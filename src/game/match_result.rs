//! End-of-game summary
//!
//! The winner is decided on raw possession time, not on the displayed
//! scores. The side that spent less time being dominated wins: more negative
//! time means the positive side takes the game.

use serde::{Deserialize, Serialize};

use crate::game::possession::{PossessionAccumulator, Side};

/// Outcome of a finished game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Winner {
    Side(Side),
    Tie,
}

impl Winner {
    pub fn headline(&self) -> &'static str {
        match self {
            Winner::Side(Side::Positive) => "Positive side wins!",
            Winner::Side(Side::Negative) => "Negative side wins!",
            Winner::Tie => "Tie",
        }
    }
}

/// Summary emitted once when a game ends
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSummary {
    pub positive_score: u32,
    pub negative_score: u32,
    pub winner: Winner,
    pub accumulated_positive_time: f64,
    pub accumulated_negative_time: f64,
    /// False when no possession time accrued during the game
    pub time_recorded: bool,
    /// Seconds between the start event and the tick that ended the game
    pub game_duration: f64,
}

impl GameSummary {
    pub fn headline(&self) -> &'static str {
        self.winner.headline()
    }
}

/// Winner from raw possession times
pub fn determine_winner(accumulator: &PossessionAccumulator) -> Winner {
    let positive = accumulator.positive_time();
    let negative = accumulator.negative_time();

    if positive > negative {
        Winner::Side(Side::Negative)
    } else if negative > positive {
        Winner::Side(Side::Positive)
    } else {
        Winner::Tie
    }
}

/// Build the summary for a game that just ended
pub fn determine_result(accumulator: &PossessionAccumulator, game_duration: f64) -> GameSummary {
    let scores = accumulator.scores();

    GameSummary {
        positive_score: scores.positive,
        negative_score: scores.negative,
        winner: determine_winner(accumulator),
        accumulated_positive_time: accumulator.positive_time(),
        accumulated_negative_time: accumulator.negative_time(),
        time_recorded: accumulator.has_time(),
        game_duration,
    }
}
