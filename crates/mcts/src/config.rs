//! Search configuration parameters.
//!
//! These parameters control which enhancements of the UCT search are
//! active and how strongly they weigh in. A configuration is read-only for
//! the duration of a search.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uct_core::{Result, UctError};

/// How much work a single move decision may spend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Budget {
    /// Run exactly this many simulations (unless the root is solved first).
    Simulations(u32),
    /// Run simulations until this many milliseconds of wall-clock time elapse.
    TimeMillis(u64),
}

impl Budget {
    /// Wall-clock limit, if this is a time budget.
    pub fn time_limit(self) -> Option<Duration> {
        match self {
            Budget::Simulations(_) => None,
            Budget::TimeMillis(ms) => Some(Duration::from_millis(ms)),
        }
    }
}

/// Search configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Simulation count or time limit per decision.
    pub budget: Budget,

    /// UCT exploration constant `C` in `C * sqrt(ln(N) / n)`.
    pub exploration: f64,

    /// Ask the board for playout-tuned moves during rollouts.
    pub playout_heuristics: bool,

    /// Propagate proven wins and losses up the tree.
    pub solver: bool,

    /// Rapid action value estimation (all-moves-as-first statistics kept
    /// per tree node).
    pub rave: bool,
    /// RAVE equivalence constant `k` in `sqrt(k / (3n + k))`.
    pub rave_k: f64,
    /// Per-ply decay of the weight a RAVE sample gets the further below the
    /// node the move was played.
    pub rave_depth_decay: f64,

    /// Move-average sampling technique: global per-move averages that bias
    /// rollouts (and blend into selection when RAVE is off).
    pub move_average: bool,
    /// Probability of a uniformly random rollout move when move averages
    /// are on.
    pub move_average_epsilon: f64,

    /// Blend a normalized static evaluation into the selection value.
    pub implicit_minimax: bool,
    /// Weight of the implicit minimax value.
    pub implicit_minimax_alpha: f64,

    /// Blend a linear-trend forecast of the mean into the selection value.
    pub regression: bool,
    /// Weight of the forecast.
    pub regression_alpha: f64,
    /// How many visits ahead the forecast looks.
    pub regression_horizon: u32,

    /// Stop rollouts early and score them with the static evaluation.
    pub early_termination: bool,
    /// Rollout depth at which playouts are cut off.
    pub early_termination_depth: u32,
    /// Evaluation magnitude above which a cut-off playout counts as decided.
    pub early_termination_threshold: f64,
    /// Credit awarded to the favoured side of a decided cut-off playout.
    pub early_termination_credit: f64,

    /// Records idle for this many generations are reclaimed after a real move.
    pub reclaim_idle_generations: u32,

    /// The transposition store has `2^store_bits` buckets.
    pub store_bits: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            budget: Budget::Simulations(10_000),
            exploration: 0.8,
            playout_heuristics: false,
            solver: true,
            rave: false,
            rave_k: 250.0,
            rave_depth_decay: 1.0,
            move_average: false,
            move_average_epsilon: 0.2,
            implicit_minimax: false,
            implicit_minimax_alpha: 0.3,
            regression: false,
            regression_alpha: 0.2,
            regression_horizon: 100,
            early_termination: false,
            early_termination_depth: 20,
            early_termination_threshold: 0.3,
            early_termination_credit: 0.8,
            reclaim_idle_generations: 2,
            store_bits: 16,
        }
    }
}

impl SearchConfig {
    /// Create a new config with the specified number of simulations.
    pub fn with_simulations(simulations: u32) -> Self {
        Self {
            budget: Budget::Simulations(simulations),
            ..Default::default()
        }
    }

    /// Create a new config that searches for the given wall-clock time.
    pub fn with_time(time: Duration) -> Self {
        Self {
            budget: Budget::TimeMillis(time.as_millis() as u64),
            ..Default::default()
        }
    }

    /// Plain UCT with the solver: every statistical enhancement disabled.
    pub fn plain_uct(simulations: u32) -> Self {
        Self {
            playout_heuristics: false,
            rave: false,
            move_average: false,
            implicit_minimax: false,
            regression: false,
            early_termination: false,
            ..Self::with_simulations(simulations)
        }
    }

    /// Check every magnitude for a usable range.
    ///
    /// # Errors
    /// Returns `UctError::InvalidConfig` describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        match self.budget {
            Budget::Simulations(0) => return invalid("simulation budget must be positive"),
            Budget::TimeMillis(0) => return invalid("time budget must be positive"),
            _ => {}
        }
        if !(self.exploration.is_finite() && self.exploration >= 0.0) {
            return invalid(format!("exploration {} is not a non-negative number", self.exploration));
        }
        if !(self.rave_k.is_finite() && self.rave_k > 0.0) {
            return invalid(format!("rave_k {} must be positive", self.rave_k));
        }
        for (name, value) in [
            ("rave_depth_decay", self.rave_depth_decay),
            ("move_average_epsilon", self.move_average_epsilon),
            ("implicit_minimax_alpha", self.implicit_minimax_alpha),
            ("regression_alpha", self.regression_alpha),
            ("early_termination_credit", self.early_termination_credit),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} {value} is outside [0, 1]"));
            }
        }
        if self.regression_horizon == 0 {
            return invalid("regression_horizon must be positive");
        }
        if self.early_termination_threshold.is_nan() || self.early_termination_threshold < 0.0 {
            return invalid("early_termination_threshold must be non-negative");
        }
        if self.store_bits == 0 || self.store_bits > 30 {
            return invalid(format!("store_bits {} is outside 1..=30", self.store_bits));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Result<()> {
    Err(UctError::InvalidConfig(message.into()))
}
