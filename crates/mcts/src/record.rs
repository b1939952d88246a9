//! Per-position statistics shared across the whole game.
//!
//! A [`PositionRecord`] aggregates every simulation that passed through a
//! position, no matter which move order reached it. Records live in the
//! [`TranspositionStore`](crate::store::TranspositionStore) and are only
//! ever addressed through it.

use uct_core::{Player, Scores};

use crate::store::RecordId;

/// Samples kept by a trend model before it starts over.
const TREND_WINDOW: u32 = 64;

/// A trend model needs more samples than this to make a forecast.
const TREND_MIN_SAMPLES: u32 = 8;

/// Incremental least-squares fit of running mean against visit index.
#[derive(Clone, Debug, Default)]
struct Trend {
    samples: u32,
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_xy: f64,
}

impl Trend {
    fn push(&mut self, x: f64, y: f64) {
        if self.samples == TREND_WINDOW {
            *self = Self::default();
        }
        self.samples += 1;
        self.sum_x += x;
        self.sum_y += y;
        self.sum_xx += x * x;
        self.sum_xy += x * y;
    }

    fn predict(&self, x: f64) -> Option<f64> {
        if self.samples <= TREND_MIN_SAMPLES {
            return None;
        }
        let n = f64::from(self.samples);
        let denominator = n * self.sum_xx - self.sum_x * self.sum_x;
        if denominator.abs() < f64::EPSILON {
            return None;
        }
        let slope = (n * self.sum_xy - self.sum_x * self.sum_y) / denominator;
        let intercept = (self.sum_y - slope * self.sum_x) / n;
        Some(intercept + slope * x)
    }
}

/// Aggregate statistics for one position, keyed by its fingerprint.
#[derive(Clone, Debug)]
pub struct PositionRecord {
    fingerprint: u64,

    /// Number of simulations folded into this record.
    visits: u32,

    /// Cumulative credit per player.
    sums: [f64; 2],

    /// The player for whom the position is a proven win.
    solved: Option<Player>,

    /// Cached static evaluation per player (implicit minimax).
    implicit: Option<[f64; 2]>,

    /// Linear trend of the mean per player; created on first tracked update.
    trend: Option<Box<[Trend; 2]>>,

    /// Store generation in which the record was last touched.
    generation: u32,

    /// Next record in the same bucket.
    pub(crate) next: Option<RecordId>,
}

impl PositionRecord {
    /// Create an empty record for `fingerprint`, touched in `generation`.
    pub fn new(fingerprint: u64, generation: u32) -> Self {
        Self {
            fingerprint,
            visits: 0,
            sums: [0.0; 2],
            solved: None,
            implicit: None,
            trend: None,
            generation,
            next: None,
        }
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn visits(&self) -> u32 {
        self.visits
    }

    /// Cumulative credit of `player` over all visits.
    pub fn sum(&self, player: Player) -> f64 {
        self.sums[player.index()]
    }

    /// The player for whom this position is proven won, if any.
    pub fn solved(&self) -> Option<Player> {
        self.solved
    }

    pub fn is_solved(&self) -> bool {
        self.solved.is_some()
    }

    /// Fold one simulation result into the record.
    ///
    /// With `track_trend` the per-player trend model is fed the new running
    /// mean; the model restarts every `TREND_WINDOW` samples.
    ///
    /// # Panics
    /// Panics if the position is already solved: proven records are frozen.
    pub fn update(&mut self, scores: Scores, track_trend: bool) {
        assert!(
            self.solved.is_none(),
            "BUG: update of position {:#018x} already solved for {:?}",
            self.fingerprint,
            self.solved
        );
        self.visits += 1;
        for player in Player::BOTH {
            self.sums[player.index()] += scores[player];
        }

        if track_trend {
            let x = f64::from(self.visits);
            let means = Player::BOTH.map(|player| self.sum(player) / x);
            let trend = self.trend.get_or_insert_with(Box::default);
            for (model, mean) in trend.iter_mut().zip(means) {
                model.push(x, mean);
            }
        }
    }

    /// Mean credit of `player`.
    ///
    /// Proven positions report `+inf` for the winner and `-inf` for the
    /// loser; unvisited positions report 0.0.
    pub fn mean(&self, player: Player) -> f64 {
        match self.solved {
            Some(winner) if winner == player => f64::INFINITY,
            Some(_) => f64::NEG_INFINITY,
            None if self.visits == 0 => 0.0,
            None => self.sum(player) / f64::from(self.visits),
        }
    }

    /// Record a proof that `winner` wins from this position.
    ///
    /// Marking the same winner again is a no-op.
    ///
    /// # Panics
    /// Panics if the position is already proven for the other player.
    pub fn mark_solved(&mut self, winner: Player) {
        match self.solved {
            None => self.solved = Some(winner),
            Some(previous) => assert_eq!(
                previous, winner,
                "BUG: position {:#018x} proven for both players",
                self.fingerprint
            ),
        }
    }

    /// Predicted mean of `player` after `steps` more visits.
    ///
    /// Returns `None` unless a trend model exists with enough samples.
    pub fn forecast(&self, steps: u32, player: Player) -> Option<f64> {
        if self.solved.is_some() {
            return None;
        }
        let trend = self.trend.as_ref()?;
        trend[player.index()].predict(f64::from(self.visits) + f64::from(steps))
    }

    /// Cached static evaluation of `player`, if one was stored.
    pub fn implicit(&self, player: Player) -> Option<f64> {
        self.implicit.map(|values| values[player.index()])
    }

    /// Both cached implicit values, indexed by player.
    pub fn implicit_values(&self) -> Option<[f64; 2]> {
        self.implicit
    }

    pub fn set_implicit(&mut self, values: [f64; 2]) {
        self.implicit = Some(values);
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub(crate) fn touch(&mut self, generation: u32) {
        self.generation = generation;
    }
}
