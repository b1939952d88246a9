//! Property-based tests for the search and its transposition store.
//!
//! - Record means equal cumulative credit over visits
//! - Proofs are idempotent and freeze the record
//! - Seeded searches are deterministic
//! - Reclaim keeps recent records and evicts idle ones
//! - Recommended moves are always legal

use std::collections::HashMap;

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uct_core::{Board, Player, Scores};
use uct_mcts::games::TicTacToe;
use uct_mcts::{PositionRecord, SearchConfig, Searcher, TranspositionStore};

// =============================================================================
// Strategies for generating test inputs
// =============================================================================

fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Small budgets keep the suite fast.
fn arb_simulations() -> impl Strategy<Value = u32> {
    10u32..200
}

fn arb_player() -> impl Strategy<Value = Player> {
    prop_oneof![Just(Player::One), Just(Player::Two)]
}

/// Scores for a win, a loss, a draw or a scaled win.
fn arb_scores() -> impl Strategy<Value = Scores> {
    prop_oneof![
        arb_player().prop_map(Scores::win),
        arb_player().prop_map(Scores::loss),
        Just(Scores::draw()),
        (arb_player(), 0.0f64..=1.0).prop_map(|(player, credit)| Scores::scaled_win(player, credit)),
    ]
}

/// An ongoing tic-tac-toe position reached by random moves.
fn arb_position() -> impl Strategy<Value = TicTacToe> {
    (0usize..8, arb_seed()).prop_map(|(num_moves, seed)| {
        let mut board = TicTacToe::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        for _ in 0..num_moves {
            let moves = board.legal_moves(false);
            let mv = moves[rng.gen_range(0..moves.len())];
            let mut next = board.clone();
            next.apply_move(mv);
            if next.outcome().is_over() {
                break;
            }
            board = next;
        }
        board
    })
}

fn arb_config() -> impl Strategy<Value = SearchConfig> {
    (arb_simulations(), any::<[bool; 6]>()).prop_map(|(simulations, flags)| {
        let mut config = SearchConfig::with_simulations(simulations);
        config.rave = flags[0];
        config.move_average = flags[1];
        config.implicit_minimax = flags[2];
        config.regression = flags[3];
        config.playout_heuristics = flags[4];
        config.early_termination = flags[5];
        config.early_termination_depth = 3;
        config
    })
}

// =============================================================================
// Records
// =============================================================================

proptest! {
    /// The mean of an unsolved record is its cumulative credit over visits.
    #[test]
    fn prop_record_mean_matches_sums(
        updates in prop::collection::vec(arb_scores(), 1..100),
        track_trend in any::<bool>()
    ) {
        let mut record = PositionRecord::new(7, 0);
        for scores in &updates {
            record.update(*scores, track_trend);
        }

        prop_assert_eq!(record.visits() as usize, updates.len());
        for player in Player::BOTH {
            let expected = record.sum(player) / f64::from(record.visits());
            prop_assert!((record.mean(player) - expected).abs() < 1e-12);
            prop_assert!((0.0..=1.0).contains(&record.mean(player)));
        }

        let total = record.mean(Player::One) + record.mean(Player::Two);
        prop_assert!((total - 1.0).abs() < 1e-9, "means sum to {}", total);
    }

    /// Proving a record twice for the same player changes nothing.
    #[test]
    fn prop_mark_solved_is_idempotent(
        updates in prop::collection::vec(arb_scores(), 0..20),
        winner in arb_player()
    ) {
        let mut record = PositionRecord::new(11, 0);
        for scores in &updates {
            record.update(*scores, false);
        }

        record.mark_solved(winner);
        let visits = record.visits();
        record.mark_solved(winner);

        prop_assert_eq!(record.solved(), Some(winner));
        prop_assert_eq!(record.visits(), visits);
        prop_assert_eq!(record.mean(winner), f64::INFINITY);
        prop_assert_eq!(record.mean(winner.opponent()), f64::NEG_INFINITY);
        prop_assert!(record.forecast(10, winner).is_none());
    }
}

// =============================================================================
// Transposition store
// =============================================================================

proptest! {
    /// After each reclaim, a record survives exactly when it was touched in
    /// the generation being closed or fewer than `min_idle` generations ago.
    #[test]
    fn prop_reclaim_retention(
        rounds in prop::collection::vec(prop::collection::vec(0u64..64, 0..16), 1..12),
        min_idle in 1u32..4,
        bits in 1u8..6
    ) {
        let mut store = TranspositionStore::new(bits);
        let mut last_touch: HashMap<u64, u32> = HashMap::new();

        for touched in rounds {
            let current = store.generation();
            for fingerprint in touched {
                let _ = store.entry(fingerprint);
                last_touch.insert(fingerprint, current);
            }

            store.reclaim(min_idle);
            last_touch.retain(|_, last| *last == current || current - *last < min_idle);

            prop_assert_eq!(store.generation(), current + 1);
            prop_assert_eq!(store.len(), last_touch.len());
            for fingerprint in 0..64 {
                prop_assert_eq!(
                    store.contains(fingerprint),
                    last_touch.contains_key(&fingerprint),
                    "fingerprint {} after generation {}", fingerprint, current
                );
            }
        }
    }

    /// Resolving the same fingerprint twice yields the same record.
    #[test]
    fn prop_entry_is_stable(
        fingerprints in prop::collection::vec(any::<u64>(), 1..50),
        bits in 1u8..8
    ) {
        let mut store = TranspositionStore::new(bits);
        let ids: Vec<_> = fingerprints.iter().map(|&fp| store.entry(fp)).collect();

        for (&fingerprint, &id) in fingerprints.iter().zip(&ids) {
            prop_assert_eq!(store.entry(fingerprint), id);
            prop_assert_eq!(store.get(id).fingerprint(), fingerprint);
        }

        let mut distinct = fingerprints.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(store.len(), distinct.len());
        prop_assert_eq!(store.stats().records, distinct.len());
    }
}

// =============================================================================
// Search
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Same seed, position and configuration give the same report.
    #[test]
    fn prop_search_is_deterministic(
        seed in arb_seed(),
        config in arb_config(),
        board in arb_position()
    ) {
        let mut first = Searcher::new(config.clone(), ChaCha8Rng::seed_from_u64(seed)).unwrap();
        let mut second = Searcher::new(config, ChaCha8Rng::seed_from_u64(seed)).unwrap();

        let a = first.search(&board).unwrap();
        let b = second.search(&board).unwrap();

        prop_assert_eq!(a.best_move, b.best_move);
        prop_assert_eq!(a.children, b.children);
        prop_assert_eq!(a.simulations, b.simulations);
    }

    /// The recommended move is legal and every root child is reported.
    #[test]
    fn prop_best_move_is_legal(
        seed in arb_seed(),
        config in arb_config(),
        board in arb_position()
    ) {
        let mut searcher = Searcher::new(config, ChaCha8Rng::seed_from_u64(seed)).unwrap();
        let report = searcher.search(&board).unwrap();
        let legal = board.legal_moves(false);

        prop_assert!(legal.contains(&report.best_move));
        prop_assert_eq!(report.children.len(), legal.len());
        if legal.len() > 1 {
            let visits: u32 = report.children.iter().map(|row| row.visits).sum();
            prop_assert!(visits <= report.simulations);
        }
    }

    /// A proven-won root child is always the recommendation.
    #[test]
    fn prop_prefers_proven_wins(
        seed in arb_seed(),
        simulations in arb_simulations(),
        board in arb_position()
    ) {
        let mut searcher =
            Searcher::new(SearchConfig::with_simulations(simulations), ChaCha8Rng::seed_from_u64(seed))
                .unwrap();
        let mover = board.current_player();
        let report = searcher.search(&board).unwrap();

        if report.children.iter().any(|row| row.solved == Some(mover)) {
            let best = report.children.iter().find(|row| row.mv == report.best_move).unwrap();
            prop_assert_eq!(best.solved, Some(mover));
        }
    }
}
