//! Offline enumeration of fixed-length move sequences.
//!
//! Every tuple of [`Move::ALL`] of the requested length is tried from a start
//! board, without spawning tiles in between. A sequence survives when each of
//! its moves changes the board and the final board still has a legal move.
//! Survivors come out in lexicographic order of `UP < DOWN < LEFT < RIGHT`.

use std::io::{self, Write};

use crate::engine::{Board, Move};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub moves: Vec<Move>,
    pub board: Board,
    pub score: u64,
}

impl SequenceRecord {
    /// `('UP', 'LEFT')`, or `('UP',)` for a single move.
    pub fn label(&self) -> String {
        let names: Vec<String> = self.moves.iter().map(|m| format!("'{}'", m.name())).collect();
        match names.len() {
            1 => format!("({},)", names[0]),
            _ => format!("({})", names.join(", ")),
        }
    }
}

/// All surviving sequences of `length` moves from `start`.
///
/// ```
/// use lookahead_2048::engine::{Board, Move};
/// use lookahead_2048::sequences::enumerate_sequences;
/// let start: Board = "2,4,0,0/4,0,0,0/0,0,0,0/0,0,0,0".parse().unwrap();
/// let one = enumerate_sequences(&start, 1);
/// let dirs: Vec<Move> = one.iter().map(|r| r.moves[0]).collect();
/// assert_eq!(dirs, vec![Move::Down, Move::Right]);
/// ```
pub fn enumerate_sequences(start: &Board, length: usize) -> Vec<SequenceRecord> {
    let mut out = Vec::new();
    let mut path = Vec::with_capacity(length);
    walk(start, 0, length, &mut path, &mut out);
    out
}

fn walk(board: &Board, score: u64, remaining: usize, path: &mut Vec<Move>, out: &mut Vec<SequenceRecord>) {
    if remaining == 0 {
        if board.has_legal_move() {
            out.push(SequenceRecord { moves: path.clone(), board: board.clone(), score });
        }
        return;
    }
    for dir in Move::ALL {
        let res = board.apply(score, dir);
        // a failed step rules out every sequence sharing this prefix
        if !res.changed {
            continue;
        }
        path.push(dir);
        walk(&res.board, res.score, remaining - 1, path, out);
        path.pop();
    }
}

/// Write records as `Sequence: (...)`, the board as tab-separated rows, then a blank line.
pub fn write_sequences<W: Write>(mut w: W, records: &[SequenceRecord]) -> io::Result<()> {
    for record in records {
        writeln!(w, "Sequence: {}", record.label())?;
        writeln!(w, "{}", record.board.to_tsv())?;
        writeln!(w)?;
    }
    w.flush()
}
