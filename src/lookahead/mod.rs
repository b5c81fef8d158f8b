//! Three-ply heuristic lookahead for 2048.
//!
//! Two searchers share the same surface and produce the same move:
//! - [`Lookahead`]: single-threaded.
//! - [`LookaheadParallel`]: rayon over first-move branches and wide chance fan-outs.
//!
//! The search alternates player plies and chance plies. At a player ply every
//! direction that changes the board is explored and the results are summed.
//! At a chance ply every empty cell is tried with both a 2 and a 4, and the
//! results are averaged with equal weight. Leaves are scored by the composite
//! heuristic plus the score carried down the line.
//!
//! Notes
//! - The search is deterministic. Randomness only enters through the
//!   fallback shuffle, which runs when no first-move branch has a scored
//!   continuation.
//! - Ties between first moves go to the earliest in [`Move::ALL`].
//!
//! Quick start
//! ```
//! use lookahead_2048::engine::Board;
//! use lookahead_2048::lookahead::{Lookahead, LookaheadParallel};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let mut b = Board::new(4).unwrap();
//! b.spawn_tile(&mut rng);
//! b.spawn_tile(&mut rng);
//!
//! let mut seq = Lookahead::new();
//! let m = seq.recommend(&b, 0, &mut rng);
//! assert!(m.is_some());
//!
//! let mut par = LookaheadParallel::new();
//! assert_eq!(par.recommend(&b, 0, &mut rng), m);
//! ```

use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{Board, EngineError, Move};

mod heuristic;
mod search_par;
mod search_seq;

pub use search_par::LookaheadParallel;
pub use search_seq::Lookahead;

/// Knobs for the lookahead. Defaults reproduce the reference behaviour.
///
/// - `depth`: number of player plies, counting the first move.
/// - `deadline_ms`: optional wall-clock budget per search.
/// - `parallel_min_empty`: the parallel searcher fans a chance ply out on
///   rayon only when it has at least this many empty cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub depth: u32,
    pub deadline_ms: Option<u64>,
    pub parallel_min_empty: usize,
}

impl Default for SearchConfig {
    fn default() -> Self { Self { depth: 3, deadline_ms: None, parallel_min_empty: 6 } }
}

impl SearchConfig {
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.depth == 0 {
            return Err(EngineError::InvalidConfig("depth must be at least 1".into()));
        }
        Ok(())
    }
}

/// Averaged score of one first move.
///
/// - `legal` is false when the move does not change the board.
/// - `completed` is false when a deadline cut the branch short; `ev` is then meaningless.
/// - `viable` is false when no line below the move reached a leaf. Such a
///   branch scores 0 but leads nowhere and is never picked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
    pub completed: bool,
    pub viable: bool,
}

impl BranchEval {
    fn illegal(dir: Move) -> Self { Self { dir, ev: 0.0, legal: false, completed: false, viable: false } }

    fn incomplete(dir: Move) -> Self { Self { dir, ev: 0.0, legal: true, completed: false, viable: false } }

    #[inline]
    fn eligible(&self) -> bool { self.legal && self.completed && self.viable }
}

/// Counters for a single search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub leaves: u64,
    pub peak_nodes: u64,
}

impl SearchStats {
    fn record(&mut self, count: NodeCount) {
        self.nodes = count.nodes;
        self.leaves = count.leaves;
        self.peak_nodes = self.peak_nodes.max(count.nodes);
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct NodeCount {
    nodes: u64,
    leaves: u64,
}

impl std::ops::AddAssign for NodeCount {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes += rhs.nodes;
        self.leaves += rhs.leaves;
    }
}

#[derive(Debug, Clone, Copy)]
struct Budget {
    deadline: Option<Instant>,
}

impl Budget {
    fn start(cfg: &SearchConfig) -> Self {
        Self { deadline: cfg.deadline_ms.map(|ms| Instant::now() + Duration::from_millis(ms)) }
    }

    #[inline]
    fn expired(&self) -> bool { self.deadline.is_some_and(|d| Instant::now() >= d) }
}

/// Common surface of both searchers, so callers can hold either.
pub trait Recommender {
    fn recommend_move(&mut self, board: &Board, score: u64, rng: &mut dyn RngCore) -> Option<Move>;
    fn last_stats(&self) -> SearchStats;
}

/// Strictly greatest completed, viable branch; the earliest wins a tie.
fn pick_best(branches: &[BranchEval; 4]) -> Option<Move> {
    let mut best: Option<&BranchEval> = None;
    for branch in branches.iter().filter(|b| b.eligible()) {
        if best.map_or(true, |b| branch.ev > b.ev) {
            best = Some(branch);
        }
    }
    best.map(|b| b.dir)
}

/// Shuffle the four directions and take the first that changes the board.
fn fallback_move<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<Move> {
    let mut dirs = Move::ALL;
    dirs.shuffle(rng);
    let pick = dirs.into_iter().find(|&dir| board.apply(0, dir).changed);
    debug!(?pick, "falling back to shuffled move order");
    pick
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(dir: Move, ev: f64) -> BranchEval { BranchEval { dir, ev, legal: true, completed: true, viable: true } }

    #[test]
    fn pick_best_prefers_earliest_on_tie() {
        let branches = [eval(Move::Up, 5.0), eval(Move::Down, 7.0), eval(Move::Left, 7.0), eval(Move::Right, 1.0)];
        assert_eq!(pick_best(&branches), Some(Move::Down));
    }

    #[test]
    fn pick_best_skips_illegal_and_incomplete() {
        let mut incomplete = eval(Move::Left, 100.0);
        incomplete.completed = false;
        let branches = [BranchEval::illegal(Move::Up), eval(Move::Down, -50.0), incomplete, BranchEval::illegal(Move::Right)];
        assert_eq!(pick_best(&branches), Some(Move::Down));
        let none = [BranchEval::illegal(Move::Up), BranchEval::illegal(Move::Down), incomplete, BranchEval::illegal(Move::Right)];
        assert_eq!(pick_best(&none), None);
    }

    #[test]
    fn pick_best_skips_dead_ends() {
        let mut dead_end = eval(Move::Right, 0.0);
        dead_end.viable = false;
        let branches = [eval(Move::Up, -2757.5), BranchEval::illegal(Move::Down), eval(Move::Left, -4678.0), dead_end];
        assert_eq!(pick_best(&branches), Some(Move::Up));
        let only_dead = [BranchEval::illegal(Move::Up), BranchEval::illegal(Move::Down), BranchEval::illegal(Move::Left), dead_end];
        assert_eq!(pick_best(&only_dead), None);
    }

    #[test]
    fn fallback_only_returns_changing_moves() {
        use rand::{rngs::StdRng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(11);
        let b = Board::from_rows(vec![vec![2, 4], vec![8, 0]]).unwrap();
        for _ in 0..20 {
            let m = fallback_move(&b, &mut rng).unwrap();
            assert!(matches!(m, Move::Right | Move::Down));
        }
        let stuck = Board::from_rows(vec![vec![2, 4], vec![4, 2]]).unwrap();
        assert_eq!(fallback_move(&stuck, &mut rng), None);
    }

    #[test]
    fn config_validation_and_serde() {
        assert!(SearchConfig::default().validate().is_ok());
        assert!(SearchConfig::default().with_depth(0).validate().is_err());
        let cfg = SearchConfig::default().with_depth(2).with_deadline_ms(50);
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(serde_json::from_str::<SearchConfig>(&json).unwrap(), cfg);
        let partial: SearchConfig = serde_json::from_str(r#"{"depth": 4}"#).unwrap();
        assert_eq!(partial, SearchConfig::default().with_depth(4));
    }
}
