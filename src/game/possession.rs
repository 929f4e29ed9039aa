//! Possession time accumulation and score derivation
//!
//! Every object on a side credits that side with the tick's elapsed time.
//! Displayed scores are inverted: a side's score falls as the *other* side
//! accumulates possession.

use serde::{Deserialize, Serialize};

use crate::game::constants::scoring::{EPSILON, INITIAL_SCORE, MAX_SCORE};

/// Which side of the court
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    Positive,
    Negative,
}

impl Side {
    /// Side for an axis coordinate; `None` on the boundary
    pub fn of(value: f64) -> Option<Side> {
        if value > 0.0 {
            Some(Side::Positive)
        } else if value < 0.0 {
            Some(Side::Negative)
        } else {
            None
        }
    }
}

/// Displayed scores for both sides
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scores {
    pub positive: u32,
    pub negative: u32,
}

impl Scores {
    /// Side with the higher displayed score, `None` when level
    pub fn leader(&self) -> Option<Side> {
        match self.positive.cmp(&self.negative) {
            std::cmp::Ordering::Greater => Some(Side::Positive),
            std::cmp::Ordering::Less => Some(Side::Negative),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl Default for Scores {
    fn default() -> Self {
        Self {
            positive: INITIAL_SCORE,
            negative: INITIAL_SCORE,
        }
    }
}

/// Running possession totals for one game
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PossessionAccumulator {
    positive_time: f64,
    negative_time: f64,
}

impl PossessionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero both totals
    pub fn reset(&mut self) {
        self.positive_time = 0.0;
        self.negative_time = 0.0;
    }

    /// Credit `elapsed_seconds` once per object that sits strictly on a side
    ///
    /// Negative or non-finite deltas (a clock stepping backwards) credit nothing.
    pub fn integrate<I>(&mut self, object_sides: I, elapsed_seconds: f64)
    where
        I: IntoIterator<Item = f64>,
    {
        if !elapsed_seconds.is_finite() || elapsed_seconds <= 0.0 {
            return;
        }

        for value in object_sides {
            match Side::of(value) {
                Some(Side::Positive) => self.positive_time += elapsed_seconds,
                Some(Side::Negative) => self.negative_time += elapsed_seconds,
                None => {}
            }
        }
    }

    pub fn positive_time(&self) -> f64 {
        self.positive_time
    }

    pub fn negative_time(&self) -> f64 {
        self.negative_time
    }

    /// True once any possession time has been credited
    pub fn has_time(&self) -> bool {
        self.positive_time + self.negative_time > 0.0
    }

    /// Displayed scores
    ///
    /// `negative = 100 - round(100 * negative_time / total)` and
    /// `positive = 100 - round(100 * positive_time / total)`, with
    /// `total = positive_time + negative_time + EPSILON`. Before any time has
    /// been credited both sides show 50.
    pub fn scores(&self) -> Scores {
        if !self.has_time() {
            return Scores::default();
        }

        let total = self.positive_time + self.negative_time + EPSILON;
        let max = f64::from(MAX_SCORE);
        let invert = |own: f64| -> u32 {
            let share = (max * own / total).round().clamp(0.0, max);
            MAX_SCORE - share as u32
        };

        Scores {
            positive: invert(self.positive_time),
            negative: invert(self.negative_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    fn with_times(positive: f64, negative: f64) -> PossessionAccumulator {
        let mut acc = PossessionAccumulator::new();
        acc.integrate([1.0], positive);
        acc.integrate([-1.0], negative);
        acc
    }

    #[test]
    fn test_side_of() {
        assert_eq!(Side::of(0.1), Some(Side::Positive));
        assert_eq!(Side::of(-0.1), Some(Side::Negative));
        assert_eq!(Side::of(0.0), None);
    }

    #[test]
    fn test_empty_scores_are_even() {
        let acc = PossessionAccumulator::new();
        assert_eq!(acc.scores(), Scores { positive: 50, negative: 50 });
        assert_eq!(acc.scores().leader(), None);
    }

    #[test]
    fn test_inverted_scores() {
        let acc = with_times(10.0, 0.0);
        let scores = acc.scores();
        assert_eq!(scores.negative, 100);
        assert_eq!(scores.positive, 0);
        assert_eq!(scores.leader(), Some(Side::Negative));
    }

    #[test]
    fn test_partial_scores() {
        // 3s positive, 1s negative: positive shows 100-75, negative 100-25
        let acc = with_times(3.0, 1.0);
        assert_eq!(acc.scores(), Scores { positive: 25, negative: 75 });
    }

    #[test]
    fn test_scores_round_to_nearest() {
        // 66.7% -> 67, 33.3% -> 33
        let acc = with_times(2.0, 1.0);
        assert_eq!(acc.scores(), Scores { positive: 33, negative: 67 });
    }

    #[test]
    fn test_integrate_fans_out_elapsed_time() {
        let mut acc = PossessionAccumulator::new();
        acc.integrate([5.0, 2.0, -1.0, 0.0], 0.5);
        assert_eq!(acc.positive_time(), 1.0);
        assert_eq!(acc.negative_time(), 0.5);
    }

    #[test]
    fn test_boundary_contributes_nothing() {
        let mut acc = PossessionAccumulator::new();
        acc.integrate([0.0, 0.0], 2.0);
        assert!(!acc.has_time());
        assert_eq!(acc.scores(), Scores::default());
    }

    #[test]
    fn test_backwards_clock_credits_nothing() {
        let mut acc = PossessionAccumulator::new();
        acc.integrate([1.0], -0.25);
        acc.integrate([1.0], f64::NAN);
        assert_eq!(acc.positive_time(), 0.0);
    }

    #[test]
    fn test_integrate_order_independent() {
        let sides = vec![3.0, -2.0, 7.5, -0.1, 0.0, 4.0];
        let mut reference = PossessionAccumulator::new();
        reference.integrate(sides.iter().copied(), 0.25);

        let mut split = PossessionAccumulator::new();
        split.integrate(sides[..2].iter().copied(), 0.25);
        split.integrate(sides[2..].iter().copied(), 0.25);
        assert_eq!(split, reference);

        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let mut shuffled = sides.clone();
            shuffled.shuffle(&mut rng);
            let mut acc = PossessionAccumulator::new();
            acc.integrate(shuffled, 0.25);
            assert_eq!(acc, reference);
        }
    }

    #[test]
    fn test_reset() {
        let mut acc = with_times(4.0, 2.0);
        acc.reset();
        assert_eq!(acc.positive_time(), 0.0);
        assert_eq!(acc.negative_time(), 0.0);
    }
}
