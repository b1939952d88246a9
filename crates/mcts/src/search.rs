//! UCT search with a shared transposition store.
//!
//! Each simulation clones the board, walks the tree from the root choosing
//! children with the UCT rule, grows the tree by one node, plays a rollout
//! from there and folds the result back into every position record on the
//! path. Proven wins and losses are propagated up the tree so solved
//! subtrees stop consuming simulations.

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, trace};
use uct_core::{Board, Player, Result, Scores, UctError};

use crate::{
    config::{Budget, SearchConfig},
    fastlog,
    heuristics::MoveAverages,
    node::{NodeId, SearchNode},
    store::TranspositionStore,
    tree::Tree,
};

/// Selection tiers, compared before any score: a proven win beats an
/// unvisited child, which beats any ordinary UCT value, which beats a
/// proven loss.
const TIER_LOST: u8 = 0;
const TIER_ORDINARY: u8 = 1;
const TIER_UNVISITED: u8 = 2;
const TIER_WON: u8 = 3;

/// Scale of the random jitter breaking selection ties.
const JITTER: f64 = 1e-6;

/// Statistics of one root child after a search.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildReport<M> {
    pub mv: M,
    pub visits: u32,
    /// Mean credit for the player to move at the root.
    pub mean: f64,
    /// Player for whom the child position is proven won.
    pub solved: Option<Player>,
}

/// Result of a search.
#[derive(Clone, Debug)]
pub struct SearchReport<M> {
    /// The recommended move.
    pub best_move: M,

    /// One row per legal move at the root, in move generation order.
    pub children: Vec<ChildReport<M>>,

    /// Simulations run from the root.
    pub simulations: u32,

    /// Wall-clock time spent.
    pub elapsed: Duration,

    /// Player for whom the root is proven won, if the search proved it.
    pub root_solved: Option<Player>,

    /// Nodes in the search tree when the search stopped.
    pub tree_size: usize,
}

/// UCT search driver for one game.
///
/// A `Searcher` is created once per game and reused for every decision:
/// the transposition store and the global move averages persist across
/// decisions, while each decision builds and discards its own tree.
///
/// Generic over:
/// - `B`: The board being searched
/// - `R`: The random number generator
pub struct Searcher<B: Board, R: Rng> {
    config: SearchConfig,
    rng: R,
    store: TranspositionStore,
    averages: MoveAverages<B::Move>,
}

impl<B, R> Searcher<B, R>
where
    B: Board,
    R: Rng,
{
    /// Create a searcher with an empty store.
    ///
    /// # Errors
    /// Returns `UctError::InvalidConfig` if the configuration fails
    /// validation.
    pub fn new(config: SearchConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let store = TranspositionStore::new(config.store_bits);
        Ok(Self {
            config,
            rng,
            store,
            averages: MoveAverages::new(),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn store(&self) -> &TranspositionStore {
        &self.store
    }

    pub fn averages(&self) -> &MoveAverages<B::Move> {
        &self.averages
    }

    /// Pick a move for the player to move on `board`.
    ///
    /// # Errors
    /// Returns `UctError::GameOver` for a finished game and
    /// `UctError::NoLegalMoves` if the board offers no move.
    pub fn decide_move(&mut self, board: &B) -> Result<B::Move> {
        self.search(board).map(|report| report.best_move)
    }

    /// Search `board` within the configured budget and report the result.
    ///
    /// Ends the current store generation: records left idle for
    /// `reclaim_idle_generations` decisions or observed moves are evicted.
    ///
    /// # Errors
    /// Returns `UctError::GameOver` for a finished game and
    /// `UctError::NoLegalMoves` if the board offers no move.
    pub fn search(&mut self, board: &B) -> Result<SearchReport<B::Move>> {
        if board.outcome().is_over() {
            return Err(UctError::GameOver);
        }

        let start = Instant::now();
        let fingerprint = board.fingerprint();
        let record = self.store.entry(fingerprint);
        let mut tree = Tree::new(SearchNode::new(None, board.current_player(), fingerprint, record));

        let _ = self.expand(&mut tree, NodeId::ROOT, board);
        let moves = tree.root().children.len();
        if moves == 0 {
            return Err(UctError::NoLegalMoves);
        }

        let mut simulations = 0;
        if moves > 1 {
            let mut trail = Vec::new();
            while !self.budget_exhausted(simulations, start) && !self.root_decided(&tree) {
                let mut scratch = board.clone();
                trail.clear();
                let _ = self.simulate(&mut tree, NodeId::ROOT, &mut scratch, &mut trail);
                simulations += 1;
            }
        }

        let report = self.report(&tree, simulations, start.elapsed());
        let reclaimed = self.store.reclaim(self.config.reclaim_idle_generations);
        debug!(
            best_move = ?report.best_move,
            simulations,
            elapsed_ms = report.elapsed.as_millis() as u64,
            root_solved = ?report.root_solved,
            tree_size = report.tree_size,
            store_records = self.store.len(),
            reclaimed,
            "search finished"
        );
        Ok(report)
    }

    /// Account for a real move made outside this searcher (e.g., by the
    /// opponent) by ending the current store generation.
    ///
    /// Returns the number of records reclaimed.
    pub fn observe_move(&mut self) -> usize {
        self.store.reclaim(self.config.reclaim_idle_generations)
    }

    /// Forget everything learned in the current game.
    pub fn new_game(&mut self) {
        self.store.clear();
        self.averages.clear();
    }

    fn budget_exhausted(&self, simulations: u32, start: Instant) -> bool {
        match self.config.budget {
            Budget::Simulations(limit) => simulations >= limit,
            Budget::TimeMillis(ms) => start.elapsed() >= Duration::from_millis(ms),
        }
    }

    /// The root is proven and a child carrying the proof is in the tree.
    fn root_decided(&self, tree: &Tree<B::Move>) -> bool {
        let root = tree.root();
        let Some(winner) = self.store.get(root.record).solved() else {
            return false;
        };
        let mut solved = root
            .children
            .iter()
            .map(|&child| self.store.get(tree.get(child).record).solved());
        if winner == root.player {
            solved.any(|proof| proof == Some(winner))
        } else {
            solved.all(|proof| proof == Some(winner))
        }
    }

    /// One descent through `id`: select, expand, roll out, back up.
    ///
    /// Returns the credit of the finished simulation.
    fn simulate(
        &mut self,
        tree: &mut Tree<B::Move>,
        id: NodeId,
        board: &mut B,
        trail: &mut Vec<(Player, B::Move)>,
    ) -> Scores {
        let winning_child = if tree.get(id).expanded {
            None
        } else {
            self.expand(tree, id, board)
        };

        let node = tree.get(id);
        let player = node.player;
        let own_record = node.record;
        let chosen = match winning_child {
            Some(child) => child,
            None if node.terminal => id,
            None => self.select(tree, id),
        };

        let scores = if chosen == id {
            self.rollout(board, trail)
        } else {
            let child = tree.get(chosen);
            let child_record = child.record;
            match self.store.get(child_record).solved() {
                Some(winner) => Scores::win(winner),
                None => {
                    let mv = child.mv.expect("BUG: non-root node without a move");
                    let expected = child.fingerprint;
                    let simulated = child.simulated;

                    board.apply_move(mv);
                    assert_eq!(
                        board.fingerprint(),
                        expected,
                        "BUG: board diverged from the tree after {mv:?}"
                    );

                    let below = trail.len();
                    trail.push((player, mv));
                    let scores = if simulated {
                        self.simulate(tree, chosen, board, trail)
                    } else {
                        tree.get_mut(chosen).simulated = true;
                        let scores = self.rollout(board, trail);
                        self.store.get_mut(child_record).update(scores, self.config.regression);
                        scores
                    };

                    if self.config.rave {
                        self.credit_siblings(tree, id, &trail[below..], scores);
                    }
                    scores
                }
            }
        };

        if !self.store.get(own_record).is_solved() {
            self.store.get_mut(own_record).update(scores, self.config.regression);
        }

        if !self.config.solver || chosen == id {
            return scores;
        }

        match self.store.get(tree.get(chosen).record).solved() {
            Some(winner) if winner == player => {
                self.store.get_mut(own_record).mark_solved(player);
                Scores::win(player)
            }
            Some(winner) => {
                let all_lost = tree
                    .get(id)
                    .children
                    .iter()
                    .all(|&child| self.store.get(tree.get(child).record).solved() == Some(winner));
                if all_lost {
                    self.store.get_mut(own_record).mark_solved(winner);
                }
                Scores::loss(player)
            }
            None => scores,
        }
    }

    /// Generate the children of `id`.
    ///
    /// Returns a child that is a proven win for the player to move at `id`,
    /// either from an earlier proof in its record or because the move ends
    /// the game in that player's favour.
    fn expand(&mut self, tree: &mut Tree<B::Move>, id: NodeId, board: &B) -> Option<NodeId> {
        let player = tree.get(id).player;
        let moves = board.legal_moves(false);
        let mut winning_child = None;
        let mut best_implicit: Option<[f64; 2]> = None;

        for mv in moves {
            let mut next = board.clone();
            next.apply_move(mv);
            let fingerprint = next.fingerprint();
            let record = self.store.entry(fingerprint);

            if self.config.solver {
                if let Some(winner) = next.outcome().winner() {
                    self.store.get_mut(record).mark_solved(winner);
                }
            }

            if self.config.implicit_minimax {
                // A known position keeps its value, which may be backed up
                let values = match self.store.get(record).implicit_values() {
                    Some(values) => values,
                    None => {
                        let values = Player::BOTH.map(|p| next.static_evaluation(p));
                        self.store.get_mut(record).set_implicit(values);
                        values
                    }
                };
                if best_implicit.map_or(true, |best| values[player.index()] > best[player.index()]) {
                    best_implicit = Some(values);
                }
            }

            let child = tree.add(SearchNode::new(Some(mv), next.current_player(), fingerprint, record));
            tree.get_mut(id).children.push(child);

            if winning_child.is_none() && self.store.get(record).solved() == Some(player) {
                trace!(?mv, %player, "expansion found a proven win");
                winning_child = Some(child);
            }
        }

        if let Some(values) = best_implicit {
            let record = tree.get(id).record;
            self.store.get_mut(record).set_implicit(values);
        }

        let node = tree.get_mut(id);
        node.expanded = true;
        node.terminal = node.children.is_empty();
        winning_child
    }

    /// Choose the child of `id` with the highest UCT score.
    fn select(&mut self, tree: &Tree<B::Move>, id: NodeId) -> NodeId {
        let node = tree.get(id);
        let player = node.player;
        let log_parent = fastlog::ln(self.store.get(node.record).visits());

        let implicit_bounds = if self.config.implicit_minimax {
            node.children
                .iter()
                .filter_map(|&child| self.store.get(tree.get(child).record).implicit(player))
                .fold(None, |bounds: Option<(f64, f64)>, value| match bounds {
                    None => Some((value, value)),
                    Some((low, high)) => Some((low.min(value), high.max(value))),
                })
                .filter(|(low, high)| high > low)
        } else {
            None
        };

        let mut best = None;
        let mut best_rank = (TIER_LOST, f64::NEG_INFINITY);

        for &child_id in &node.children {
            let child = tree.get(child_id);
            let record = self.store.get(child.record);
            let jitter = self.rng.gen::<f64>() * JITTER;

            let rank = match record.solved() {
                Some(winner) if winner == player => (TIER_WON, -jitter),
                Some(_) => (TIER_LOST, jitter),
                None if record.visits() == 0 => (TIER_UNVISITED, jitter),
                None => {
                    let visits = f64::from(record.visits());
                    let mut value = record.mean(player);

                    if self.config.regression {
                        if let Some(forecast) = record.forecast(self.config.regression_horizon, player) {
                            let alpha = self.config.regression_alpha;
                            value = (1.0 - alpha) * value + alpha * forecast.clamp(0.0, 1.0);
                        }
                    }

                    if let (Some((low, high)), Some(implicit)) = (implicit_bounds, record.implicit(player)) {
                        let alpha = self.config.implicit_minimax_alpha;
                        let normalized = (implicit - low) / (high - low);
                        value = (1.0 - alpha) * value + alpha * normalized;
                    }

                    let rapid = if self.config.rave {
                        child.amaf.mean()
                    } else if self.config.move_average {
                        child.mv.and_then(|mv| self.averages.mean(player, mv))
                    } else {
                        None
                    };
                    if let Some(rapid) = rapid {
                        let k = self.config.rave_k;
                        let beta = (k / (3.0 * visits + k)).sqrt();
                        value = (1.0 - beta) * value + beta * rapid;
                    }

                    let bonus = self.config.exploration * (log_parent / visits).sqrt();
                    (TIER_ORDINARY, value + bonus + jitter)
                }
            };

            if best.is_none() || rank > best_rank {
                best_rank = rank;
                best = Some(child_id);
            }
        }

        // INVARIANT: only called on expanded, non-terminal nodes
        best.expect("BUG: select called on a node without children")
    }

    /// Play the game out from `board` and score the result.
    ///
    /// Every rollout move is appended to `trail`.
    fn rollout(&mut self, board: &mut B, trail: &mut Vec<(Player, B::Move)>) -> Scores {
        let first = trail.len();
        let mut depth = 0;

        let scores = loop {
            if let Some(scores) = Scores::from_outcome(board.outcome()) {
                break scores;
            }
            if self.config.early_termination && depth >= self.config.early_termination_depth {
                break self.cutoff_scores(board);
            }

            let moves = board.legal_moves(self.config.playout_heuristics);
            if moves.is_empty() {
                break Scores::draw();
            }

            let player = board.current_player();
            let mv = if self.config.move_average {
                self.averages
                    .choose(player, &moves, self.config.move_average_epsilon, &mut self.rng)
            } else {
                moves[self.rng.gen_range(0..moves.len())]
            };
            board.apply_move(mv);
            trail.push((player, mv));
            depth += 1;
        };

        if self.config.move_average {
            for &(player, mv) in &trail[first..] {
                self.averages.record(player, mv, scores[player]);
            }
        }
        scores
    }

    /// Score a playout cut off before the end of the game.
    ///
    /// The evaluation is read from player one's side: above the threshold
    /// player one gets the configured credit, below its negation player
    /// two does, and anything in between is a draw.
    fn cutoff_scores(&self, board: &B) -> Scores {
        let evaluation = board.static_evaluation(Player::One);
        let threshold = self.config.early_termination_threshold;
        let credit = self.config.early_termination_credit;
        if evaluation > threshold {
            Scores::scaled_win(Player::One, credit)
        } else if evaluation < -threshold {
            Scores::scaled_win(Player::Two, credit)
        } else {
            Scores::draw()
        }
    }

    /// Credit `scores` to every child of `id` whose move the player to move
    /// at `id` played later in this simulation.
    fn credit_siblings(
        &self,
        tree: &mut Tree<B::Move>,
        id: NodeId,
        played: &[(Player, B::Move)],
        scores: Scores,
    ) {
        let player = tree.get(id).player;
        let credit = scores[player];
        let decay = self.config.rave_depth_decay;

        for index in 0..tree.get(id).children.len() {
            let child = tree.get(id).children[index];
            let Some(mv) = tree.get(child).mv else {
                continue;
            };
            if let Some(depth) = played.iter().position(|&(p, m)| p == player && m == mv) {
                let weight = decay.powi(i32::try_from(depth).unwrap_or(i32::MAX));
                tree.get_mut(child).amaf.add(credit, weight);
            }
        }
    }

    /// The move to play: a proven win if there is one, otherwise the most
    /// visited unproven child, and among proven losses the most visited.
    fn best_child(&self, tree: &Tree<B::Move>) -> NodeId {
        let root = tree.root();
        let player = root.player;
        let rank = |child: NodeId| {
            let record = self.store.get(tree.get(child).record);
            let class = match record.solved() {
                Some(winner) if winner == player => 2,
                Some(_) => 0,
                None => 1,
            };
            (class, record.visits())
        };

        let mut best = root.children[0];
        let mut best_rank = rank(best);
        for &child in &root.children[1..] {
            let child_rank = rank(child);
            if child_rank > best_rank {
                best = child;
                best_rank = child_rank;
            }
        }
        best
    }

    fn report(&self, tree: &Tree<B::Move>, simulations: u32, elapsed: Duration) -> SearchReport<B::Move> {
        let root = tree.root();
        let player = root.player;
        let children = root
            .children
            .iter()
            .map(|&child| {
                let node = tree.get(child);
                let record = self.store.get(node.record);
                ChildReport {
                    mv: node.mv.expect("BUG: root child without a move"),
                    visits: record.visits(),
                    mean: record.mean(player),
                    solved: record.solved(),
                }
            })
            .collect();

        SearchReport {
            best_move: tree
                .get(self.best_child(tree))
                .mv
                .expect("BUG: root child without a move"),
            children,
            simulations,
            elapsed,
            root_solved: self.store.get(root.record).solved(),
            tree_size: tree.len(),
        }
    }
}
