use crate::engine::Board;

const CORNER_WEIGHT: u64 = 2;
const EMPTY_WEIGHT: f64 = 10.0;

/// Leaf evaluation: carried score plus the four board terms.
#[inline]
pub(crate) fn leaf_score(board: &Board, score: u64) -> f64 {
    score as f64
        + calc_monotonicity(board) as f64
        + calc_clustering(board) as f64
        + calc_corner(board) as f64
        + calc_empty(board)
}

/// For each adjacent (earlier, later) pair along rows and columns, adds
/// `earlier` when it is nonzero and not smaller than `later`.
/// Increasing runs are not penalised.
pub(crate) fn calc_monotonicity(board: &Board) -> u64 {
    let n = board.size();
    let mut score = 0;
    for i in 0..n {
        for j in 0..n - 1 {
            let (earlier, later) = (board.get(i, j), board.get(i, j + 1));
            if earlier != 0 && earlier >= later {
                score += earlier;
            }
            let (earlier, later) = (board.get(j, i), board.get(j + 1, i));
            if earlier != 0 && earlier >= later {
                score += earlier;
            }
        }
    }
    score
}

/// Minus the absolute difference between every nonzero cell and each of its
/// nonzero orthogonal neighbours. Each edge is visited from both ends.
pub(crate) fn calc_clustering(board: &Board) -> i64 {
    let n = board.size();
    let mut score = 0i64;
    for r in 0..n {
        for c in 0..n {
            let v = board.get(r, c);
            if v == 0 {
                continue;
            }
            let neighbours = [
                (r.wrapping_sub(1), c),
                (r + 1, c),
                (r, c.wrapping_sub(1)),
                (r, c + 1),
            ];
            for (nr, nc) in neighbours {
                if nr >= n || nc >= n {
                    continue;
                }
                let w = board.get(nr, nc);
                if w != 0 {
                    score -= v.abs_diff(w) as i64;
                }
            }
        }
    }
    score
}

/// `2 * max` when a maximal tile sits in any corner.
pub(crate) fn calc_corner(board: &Board) -> u64 {
    let last = board.size() - 1;
    let max_tile = board.highest_tile();
    let corners = [(0, 0), (0, last), (last, 0), (last, last)];
    if corners.iter().any(|&(r, c)| board.get(r, c) == max_tile) {
        max_tile * CORNER_WEIGHT
    } else {
        0
    }
}

pub(crate) fn calc_empty(board: &Board) -> f64 { ((board.count_empty() + 1) as f64).log2() * EMPTY_WEIGHT }
