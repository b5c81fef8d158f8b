use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Fixed enumeration order. Search tie-breaks and sequence dumps follow it.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    pub fn name(self) -> &'static str {
        match self {
            Move::Up => "UP",
            Move::Down => "DOWN",
            Move::Left => "LEFT",
            Move::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Move {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "u" => Ok(Move::Up),
            "down" | "d" => Ok(Move::Down),
            "left" | "l" => Ok(Move::Left),
            "right" | "r" => Ok(Move::Right),
            other => Err(EngineError::InvalidLiteral(format!("unknown move '{other}'"))),
        }
    }
}

type Tile = u64;
type Score = u64;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("board side length must be at least 2, got {size}")]
    BoardTooSmall { size: usize },
    #[error("row {row} has {len} cells, expected {size}")]
    NotSquare { row: usize, len: usize, size: usize },
    #[error("cell ({row}, {col}) holds {value}, which is not a power of two in [2, 2^48]")]
    InvalidTile { row: usize, col: usize, value: Tile },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),
}

/// Outcome of applying one move: the new board, the running score and
/// whether any cell changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    pub board: Board,
    pub score: Score,
    pub changed: bool,
}

/// How new tiles are drawn.
///
/// The default draws 2 and 4 with equal odds. `SpawnConfig::new(0.1)` gives
/// the conventional 90/10 split. The probability is checked on construction
/// and on deserialization, so a config in hand is always usable.
///
/// ```
/// use lookahead_2048::engine::SpawnConfig;
/// assert_eq!(SpawnConfig::default().four_probability(), 0.5);
/// assert!(SpawnConfig::new(1.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpawnConfig")]
pub struct SpawnConfig {
    four_probability: f64,
}

#[derive(Deserialize)]
struct RawSpawnConfig {
    four_probability: f64,
}

impl TryFrom<RawSpawnConfig> for SpawnConfig {
    type Error = EngineError;

    fn try_from(raw: RawSpawnConfig) -> Result<Self, Self::Error> { SpawnConfig::new(raw.four_probability) }
}

impl Default for SpawnConfig {
    fn default() -> Self { Self { four_probability: 0.5 } }
}

impl SpawnConfig {
    pub fn new(four_probability: f64) -> Result<Self, EngineError> {
        if (0.0..=1.0).contains(&four_probability) {
            Ok(Self { four_probability })
        } else {
            Err(EngineError::InvalidConfig(format!("four_probability must lie in [0, 1], got {four_probability}")))
        }
    }

    #[inline]
    pub fn four_probability(&self) -> f64 { self.four_probability }
}

/// Square 2048 grid stored row-major. Zero is an empty cell.
///
/// Serializes as a list of rows. Deserialization goes through
/// [`Board::from_rows`], so malformed input is rejected there.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Tile>>", into = "Vec<Vec<Tile>>")]
pub struct Board {
    size: usize,
    cells: Vec<Tile>,
}

impl Board {
    /// Canonical side length.
    pub const DEFAULT_SIZE: usize = 4;

    /// Largest tile accepted from the outside. Leaves headroom for merges and
    /// running scores to stay within `u64`.
    pub const MAX_TILE: Tile = 1 << 48;

    /// An empty `size` x `size` board.
    ///
    /// ```
    /// use lookahead_2048::engine::{Board, EngineError};
    /// assert_eq!(Board::new(4).unwrap().count_empty(), 16);
    /// assert_eq!(Board::new(1), Err(EngineError::BoardTooSmall { size: 1 }));
    /// ```
    pub fn new(size: usize) -> Result<Self, EngineError> {
        if size < 2 {
            return Err(EngineError::BoardTooSmall { size });
        }
        Ok(Board { size, cells: vec![0; size * size] })
    }

    /// Build a board from literal rows, checking shape and tile values.
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self, EngineError> {
        let size = rows.len();
        if size < 2 {
            return Err(EngineError::BoardTooSmall { size });
        }
        let mut cells = Vec::with_capacity(size * size);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(EngineError::NotSquare { row, len: values.len(), size });
            }
            for (col, &value) in values.iter().enumerate() {
                if value != 0 && (value < 2 || value > Self::MAX_TILE || !value.is_power_of_two()) {
                    return Err(EngineError::InvalidTile { row, col, value });
                }
            }
            cells.extend(values);
        }
        Ok(Board { size, cells })
    }

    #[inline]
    pub fn size(&self) -> usize { self.size }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Tile { self.cells[row * self.size + col] }

    /// Borrow the cells in row-major order.
    #[inline]
    pub fn cells(&self) -> &[Tile] { &self.cells }

    pub fn rows(&self) -> Vec<Vec<Tile>> {
        self.cells.chunks(self.size).map(|r| r.to_vec()).collect()
    }

    #[inline]
    fn row(&self, row: usize) -> &[Tile] { &self.cells[row * self.size..(row + 1) * self.size] }

    /// Empty board of the same size.
    pub fn cleared(&self) -> Board { Board { size: self.size, cells: vec![0; self.cells.len()] } }

    /// Copy of this board with one cell overwritten.
    pub fn with_tile(&self, row: usize, col: usize, value: Tile) -> Board {
        let mut next = self.clone();
        next.cells[row * self.size + col] = value;
        next
    }

    /// Number of empty cells.
    pub fn count_empty(&self) -> usize { self.cells.iter().filter(|&&v| v == 0).count() }

    /// Coordinates of empty cells, row-major.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == 0)
            .map(|(idx, _)| (idx / self.size, idx % self.size))
            .collect()
    }

    /// Highest tile value on the board (0 for an empty board).
    pub fn highest_tile(&self) -> Tile { self.cells.iter().copied().max().unwrap_or(0) }

    /// Mirror every row.
    pub fn reverse_rows(&self) -> Board {
        let mut cells = Vec::with_capacity(self.cells.len());
        for r in 0..self.size {
            cells.extend(self.row(r).iter().rev());
        }
        Board { size: self.size, cells }
    }

    /// Rows become columns.
    pub fn transpose(&self) -> Board {
        let n = self.size;
        let mut cells = vec![0; n * n];
        for r in 0..n {
            for c in 0..n {
                cells[c * n + r] = self.cells[r * n + c];
            }
        }
        Board { size: n, cells }
    }

    /// Slide/merge tiles in `dir`, returning the new board and the merge gain.
    /// No random tile is inserted.
    pub fn shift(&self, dir: Move) -> (Board, Score) {
        match dir {
            Move::Left => self.shift_left(),
            Move::Right => {
                let (b, gain) = self.reverse_rows().shift_left();
                (b.reverse_rows(), gain)
            }
            Move::Up => {
                let (b, gain) = self.transpose().shift_left();
                (b.transpose(), gain)
            }
            Move::Down => {
                let (b, gain) = self.transpose().shift(Move::Right);
                (b.transpose(), gain)
            }
        }
    }

    fn shift_left(&self) -> (Board, Score) {
        let mut cells = Vec::with_capacity(self.cells.len());
        let mut gain = 0;
        for r in 0..self.size {
            let (row, row_gain) = slide_row(self.row(r));
            gain += row_gain;
            cells.extend(row);
        }
        (Board { size: self.size, cells }, gain)
    }

    /// Apply `dir` on top of the running `score`.
    ///
    /// ```
    /// use lookahead_2048::engine::{Board, Move};
    /// let b = Board::from_rows(vec![vec![2, 2], vec![0, 4]]).unwrap();
    /// let res = b.apply(10, Move::Left);
    /// assert!(res.changed);
    /// assert_eq!(res.score, 14);
    /// assert_eq!(res.board.rows(), vec![vec![4, 0], vec![4, 0]]);
    /// ```
    pub fn apply(&self, score: Score, dir: Move) -> MoveResult {
        let (board, gain) = self.shift(dir);
        let changed = board != *self;
        MoveResult { board, score: score + gain, changed }
    }

    /// True if some direction would change the board.
    pub fn has_legal_move(&self) -> bool { Move::ALL.iter().any(|&dir| self.shift(dir).0 != *self) }

    /// True iff no cell is empty and no two orthogonal neighbours are equal.
    pub fn is_terminal(&self) -> bool {
        let n = self.size;
        for r in 0..n {
            for c in 0..n {
                let v = self.get(r, c);
                if v == 0 {
                    return false;
                }
                if r + 1 < n && v == self.get(r + 1, c) {
                    return false;
                }
                if c + 1 < n && v == self.get(r, c + 1) {
                    return false;
                }
            }
        }
        true
    }

    /// Insert a 2 or 4 (even odds) into a uniformly chosen empty cell.
    /// Returns false and leaves the board untouched when it is full.
    ///
    /// ```
    /// use lookahead_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let mut b = Board::new(4).unwrap();
    /// assert!(b.spawn_tile(&mut rng));
    /// assert!(b.spawn_tile(&mut rng));
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    #[inline]
    pub fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.spawn_tile_with(rng, &SpawnConfig::default())
    }

    /// Like `spawn_tile` with an explicit 2/4 distribution.
    pub fn spawn_tile_with<R: Rng + ?Sized>(&mut self, rng: &mut R, cfg: &SpawnConfig) -> bool {
        let empty = self.empty_cells();
        let Some(&(r, c)) = empty.choose(rng) else {
            return false;
        };
        let value = if rng.gen_bool(cfg.four_probability()) { 4 } else { 2 };
        self.cells[r * self.size + c] = value;
        true
    }

    /// Tab-separated dump, one row per line.
    pub fn to_tsv(&self) -> String {
        self.cells
            .chunks(self.size)
            .map(|row| row.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TryFrom<Vec<Vec<Tile>>> for Board {
    type Error = EngineError;

    fn try_from(rows: Vec<Vec<Tile>>) -> Result<Self, Self::Error> { Board::from_rows(rows) }
}

impl From<Board> for Vec<Vec<Tile>> {
    fn from(board: Board) -> Self { board.rows() }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.rows())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(self.size * 8);
        writeln!(f)?;
        for (r, row) in self.cells.chunks(self.size).enumerate() {
            if r > 0 {
                writeln!(f, "{rule}")?;
            }
            let cells: Vec<String> = row.iter().map(format_val).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

/// Parses `2,4,0,0/4,0,0,0/...`: rows split by `/`, cells by `,`.
impl FromStr for Board {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s
            .split('/')
            .map(|row| {
                row.split(',')
                    .map(|cell| {
                        cell.trim()
                            .parse::<Tile>()
                            .map_err(|e| EngineError::InvalidLiteral(format!("cell '{}': {e}", cell.trim())))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Board::from_rows(rows)
    }
}

/// Free-function form of [`Board::apply`].
pub fn apply(board: &Board, score: Score, dir: Move) -> MoveResult { board.apply(score, dir) }

/// Free-function form of [`Board::spawn_tile`], returning the new board and a success flag.
pub fn spawn_tile<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> (Board, bool) {
    let mut next = board.clone();
    let ok = next.spawn_tile(rng);
    (next, ok)
}

/// Free-function form of [`Board::is_terminal`].
pub fn is_terminal(board: &Board) -> bool { board.is_terminal() }

/// Drop zeros, keep order, pad the tail with zeros.
pub fn compress_row(row: &[Tile]) -> Vec<Tile> {
    let mut out: Vec<Tile> = row.iter().copied().filter(|&v| v != 0).collect();
    out.resize(row.len(), 0);
    out
}

/// One left-to-right sweep combining equal neighbours into the left cell.
/// A cell produced by a merge is never merged again in the same sweep.
/// Returns the sum of merged values.
pub fn merge_row(row: &mut [Tile]) -> Score {
    let mut gain = 0;
    for i in 0..row.len().saturating_sub(1) {
        if row[i] != 0 && row[i] == row[i + 1] {
            row[i] *= 2;
            row[i + 1] = 0;
            gain += row[i];
        }
    }
    gain
}

/// compress, merge, compress.
pub fn slide_row(row: &[Tile]) -> (Vec<Tile>, Score) {
    let mut out = compress_row(row);
    let gain = merge_row(&mut out);
    (compress_row(&out), gain)
}

fn format_val(val: &Tile) -> String {
    match val {
        0 => String::from("       "),
        &x => format!("{x:^7}"),
    }
}
