use rand::{Rng, RngCore};
use tracing::{debug, warn};

use crate::engine::{Board, EngineError, Move};

use super::heuristic::leaf_score;
use super::{fallback_move, pick_best, BranchEval, Budget, NodeCount, Recommender, SearchConfig, SearchStats};

/// Single-threaded lookahead.
pub struct Lookahead {
    cfg: SearchConfig,
    stats: SearchStats,
}

impl Lookahead {
    pub fn new() -> Self { Self { cfg: SearchConfig::default(), stats: SearchStats::default() } }

    pub fn with_config(cfg: SearchConfig) -> Result<Self, EngineError> {
        cfg.validate()?;
        Ok(Self { cfg, stats: SearchStats::default() })
    }

    pub fn config(&self) -> &SearchConfig { &self.cfg }

    /// Best first move for `board` with running `score`, or `None` when no
    /// move changes the board.
    ///
    /// ```
    /// use lookahead_2048::engine::Board;
    /// use lookahead_2048::lookahead::Lookahead;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let stuck = Board::from_rows(vec![vec![2, 4], vec![4, 2]]).unwrap();
    /// assert_eq!(Lookahead::new().recommend(&stuck, 0, &mut rng), None);
    /// ```
    pub fn recommend<R: Rng + ?Sized>(&mut self, board: &Board, score: u64, rng: &mut R) -> Option<Move> {
        let branches = self.branch_evals(board, score);
        finish(&branches, board, rng)
    }

    /// Averaged score of each first move, in [`Move::ALL`] order.
    pub fn branch_evals(&mut self, board: &Board, score: u64) -> [BranchEval; 4] {
        let budget = Budget::start(&self.cfg);
        let mut count = NodeCount::default();
        let out = Move::ALL.map(|dir| evaluate_branch(board, score, dir, self.cfg.depth, &budget, &mut count));
        self.stats.record(count);
        out
    }

    /// Statistics from the last call to [`Self::recommend`] or [`Self::branch_evals`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }
}

impl Default for Lookahead {
    fn default() -> Self { Self::new() }
}

impl Recommender for Lookahead {
    fn recommend_move(&mut self, board: &Board, score: u64, rng: &mut dyn RngCore) -> Option<Move> {
        self.recommend(board, score, rng)
    }

    fn last_stats(&self) -> SearchStats { self.stats }
}

/// Pick the winner, or fall back to a shuffled legal move.
pub(super) fn finish<R: Rng + ?Sized>(branches: &[BranchEval; 4], board: &Board, rng: &mut R) -> Option<Move> {
    for b in branches.iter().filter(|b| b.legal && b.completed) {
        debug!(dir = %b.dir, ev = b.ev, viable = b.viable, "branch average");
    }
    if let Some(best) = pick_best(branches) {
        return Some(best);
    }
    if branches.iter().any(|b| b.legal && !b.completed) {
        warn!("deadline expired before any first move was fully scored");
    } else if branches.iter().any(|b| b.legal) {
        debug!("no first move has a continuation that reaches a leaf");
    }
    fallback_move(board, rng)
}

pub(super) fn evaluate_branch(
    board: &Board,
    score: u64,
    dir: Move,
    depth: u32,
    budget: &Budget,
    count: &mut NodeCount,
) -> BranchEval {
    let res = board.apply(score, dir);
    if !res.changed {
        return BranchEval::illegal(dir);
    }
    let leaves_before = count.leaves;
    match value_after_move(&res.board, res.score, depth - 1, budget, count) {
        Some(ev) => BranchEval { dir, ev, legal: true, completed: true, viable: count.leaves > leaves_before },
        None => BranchEval::incomplete(dir),
    }
}

/// Value of a board reached by a player move with `plies_left` moves still to play.
/// `None` when the deadline expired underneath.
pub(super) fn value_after_move(
    board: &Board,
    score: u64,
    plies_left: u32,
    budget: &Budget,
    count: &mut NodeCount,
) -> Option<f64> {
    count.nodes += 1;
    if plies_left == 0 {
        count.leaves += 1;
        return Some(leaf_score(board, score));
    }
    if budget.expired() {
        return None;
    }
    let placements = placements(board);
    if placements.is_empty() {
        return Some(0.0);
    }
    let mut total = 0.0;
    for placed in &placements {
        total += value_after_placement(placed, score, plies_left, budget, count)?;
    }
    Some(total / placements.len() as f64)
}

/// Sum over every direction that changes `placed`.
pub(super) fn value_after_placement(
    placed: &Board,
    score: u64,
    plies_left: u32,
    budget: &Budget,
    count: &mut NodeCount,
) -> Option<f64> {
    let mut total = 0.0;
    for dir in Move::ALL {
        let res = placed.apply(score, dir);
        if res.changed {
            total += value_after_move(&res.board, res.score, plies_left - 1, budget, count)?;
        }
    }
    Some(total)
}

/// Every empty cell filled with a 2, then a 4, in row-major order.
pub(super) fn placements(board: &Board) -> Vec<Board> {
    board
        .empty_cells()
        .into_iter()
        .flat_map(|(r, c)| [2, 4].map(|v| board.with_tile(r, c, v)))
        .collect()
}
