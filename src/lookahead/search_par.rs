use rand::{Rng, RngCore};
use rayon::prelude::*;

use crate::engine::{Board, EngineError, Move};

use super::search_seq::{evaluate_branch, finish, placements, value_after_placement};
use super::{BranchEval, Budget, NodeCount, Recommender, SearchConfig, SearchStats};

/// Parallel lookahead using rayon.
///
/// The four first moves run as independent tasks, and the first chance ply of
/// each fans out across placements when it is wide enough. Per-placement values
/// are gathered in enumeration order and summed sequentially, so the result is
/// bit-identical to [`super::Lookahead`] and the tie-break is unaffected by
/// scheduling.
pub struct LookaheadParallel {
    cfg: SearchConfig,
    stats: SearchStats,
}

impl LookaheadParallel {
    pub fn new() -> Self { Self { cfg: SearchConfig::default(), stats: SearchStats::default() } }

    pub fn with_config(cfg: SearchConfig) -> Result<Self, EngineError> {
        cfg.validate()?;
        Ok(Self { cfg, stats: SearchStats::default() })
    }

    pub fn config(&self) -> &SearchConfig { &self.cfg }

    #[inline]
    pub fn recommend<R: Rng + ?Sized>(&mut self, board: &Board, score: u64, rng: &mut R) -> Option<Move> {
        let branches = self.branch_evals(board, score);
        finish(&branches, board, rng)
    }

    /// Averaged score of each first move, in [`Move::ALL`] order.
    pub fn branch_evals(&mut self, board: &Board, score: u64) -> [BranchEval; 4] {
        let budget = Budget::start(&self.cfg);
        let depth = self.cfg.depth;
        let min_empty = self.cfg.parallel_min_empty;
        let results: Vec<(BranchEval, NodeCount)> = Move::ALL
            .par_iter()
            .map(|&dir| evaluate_branch_parallel(board, score, dir, depth, min_empty, &budget))
            .collect();
        let mut out = Move::ALL.map(BranchEval::illegal);
        let mut count = NodeCount::default();
        for (i, (branch, branch_count)) in results.into_iter().enumerate() {
            out[i] = branch;
            count += branch_count;
        }
        self.stats.record(count);
        out
    }

    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }
}

impl Default for LookaheadParallel {
    fn default() -> Self { Self::new() }
}

impl Recommender for LookaheadParallel {
    fn recommend_move(&mut self, board: &Board, score: u64, rng: &mut dyn RngCore) -> Option<Move> {
        self.recommend(board, score, rng)
    }

    fn last_stats(&self) -> SearchStats { self.stats }
}

fn evaluate_branch_parallel(
    board: &Board,
    score: u64,
    dir: Move,
    depth: u32,
    min_empty: usize,
    budget: &Budget,
) -> (BranchEval, NodeCount) {
    let res = board.apply(score, dir);
    let mut count = NodeCount::default();
    if !res.changed || depth == 1 || res.board.count_empty() < min_empty.max(1) {
        let branch = evaluate_branch(board, score, dir, depth, budget, &mut count);
        return (branch, count);
    }

    count.nodes += 1;
    if budget.expired() {
        return (BranchEval::incomplete(dir), count);
    }
    let plies_left = depth - 1;
    let placed = placements(&res.board);
    let values: Vec<Option<(f64, NodeCount)>> = placed
        .par_iter()
        .map(|p| {
            let mut c = NodeCount::default();
            value_after_placement(p, res.score, plies_left, budget, &mut c).map(|v| (v, c))
        })
        .collect();

    let mut total = 0.0;
    for value in values {
        match value {
            Some((v, c)) => {
                total += v;
                count += c;
            }
            None => return (BranchEval::incomplete(dir), count),
        }
    }
    let ev = total / placed.len() as f64;
    (BranchEval { dir, ev, legal: true, completed: true, viable: count.leaves > 0 }, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookahead::Lookahead;
    use rand::{rngs::StdRng, SeedableRng};

    fn random_board(rng: &mut StdRng, tiles: usize) -> Board {
        let mut b = Board::new(4).unwrap();
        for _ in 0..tiles {
            b.spawn_tile(rng);
        }
        b
    }

    #[test]
    fn matches_sequential_search() {
        let mut rng = StdRng::seed_from_u64(314);
        let mut seq = Lookahead::new();
        let mut par = LookaheadParallel::new();
        for tiles in [2, 4, 7, 11] {
            let b = random_board(&mut rng, tiles);
            let s = seq.branch_evals(&b, 40);
            let p = par.branch_evals(&b, 40);
            assert_eq!(s, p);
            assert_eq!(seq.last_stats().nodes, par.last_stats().nodes);
            assert_eq!(seq.last_stats().leaves, par.last_stats().leaves);
        }
    }

    #[test]
    fn narrow_boards_take_the_sequential_path() {
        let mut rng = StdRng::seed_from_u64(8);
        let b = random_board(&mut rng, 3);
        let cfg = SearchConfig { parallel_min_empty: usize::MAX, ..SearchConfig::default() };
        let mut par = LookaheadParallel::with_config(cfg).unwrap();
        let mut seq = Lookahead::new();
        assert_eq!(par.branch_evals(&b, 0), seq.branch_evals(&b, 0));
    }

    #[test]
    fn dead_end_first_move_is_skipped() {
        let b = Board::from_rows(vec![vec![256, 0, 128], vec![128, 512, 2], vec![2, 64, 512]]).unwrap();
        let cfg = SearchConfig { parallel_min_empty: 1, ..SearchConfig::default() };
        let mut par = LookaheadParallel::with_config(cfg).unwrap();
        let branches = par.branch_evals(&b, 0);
        assert!(!branches[3].viable);
        assert_eq!(branches, Lookahead::new().branch_evals(&b, 0));
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(par.recommend(&b, 0, &mut rng), Some(Move::Up));
    }

    #[test]
    fn terminal_board_has_no_recommendation() {
        let mut rng = StdRng::seed_from_u64(1);
        let stuck = Board::from_rows(vec![vec![2, 4], vec![4, 2]]).unwrap();
        assert_eq!(LookaheadParallel::new().recommend(&stuck, 0, &mut rng), None);
    }

    #[test]
    fn expired_deadline_marks_branches_incomplete() {
        let mut rng = StdRng::seed_from_u64(6);
        let b = random_board(&mut rng, 2);
        let mut par = LookaheadParallel::with_config(SearchConfig::default().with_deadline_ms(0)).unwrap();
        let branches = par.branch_evals(&b, 0);
        assert!(branches.iter().all(|b| !b.completed));
        let m = par.recommend(&b, 0, &mut rng).unwrap();
        assert!(b.apply(0, m).changed);
    }
}
