//! A running game: board, score and the RNG that feeds tile spawns.
//!
//! `Game` is the narrow surface a front end drives. One call to
//! [`Game::step`] applies a move, spawns exactly one tile when the move
//! changed the board, and reports whether the game has reached a terminal
//! position.
//!
//! ```
//! use lookahead_2048::engine::Move;
//! use lookahead_2048::game::Game;
//! use lookahead_2048::lookahead::Lookahead;
//!
//! let mut game = Game::new(4, 123).unwrap();
//! let mut policy = Lookahead::new();
//! let mut moves = 0;
//! while !game.is_over() && moves < 3 {
//!     if game.step_with(&mut policy).is_none() {
//!         break;
//!     }
//!     moves += 1;
//! }
//! assert!(moves > 0);
//! let _ = game.step(Move::Left);
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::engine::{Board, EngineError, Move, SpawnConfig};
use crate::lookahead::Recommender;

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub changed: bool,
    pub gained: u64,
    pub spawned: bool,
    pub terminal: bool,
}

pub struct Game {
    board: Board,
    score: u64,
    moves: u64,
    rng: StdRng,
    spawn: SpawnConfig,
}

impl Game {
    /// Fresh `size` x `size` game with two starting tiles.
    pub fn new(size: usize, seed: u64) -> Result<Self, EngineError> {
        Self::with_spawn(size, seed, SpawnConfig::default())
    }

    pub fn with_spawn(size: usize, seed: u64, spawn: SpawnConfig) -> Result<Self, EngineError> {
        let mut game = Game { board: Board::new(size)?, score: 0, moves: 0, rng: StdRng::seed_from_u64(seed), spawn };
        game.place_starting_tiles();
        Ok(game)
    }

    /// Continue from an existing position. No tiles are added.
    pub fn from_board(board: Board, score: u64, seed: u64) -> Self {
        Game { board, score, moves: 0, rng: StdRng::seed_from_u64(seed), spawn: SpawnConfig::default() }
    }

    fn place_starting_tiles(&mut self) {
        self.board.spawn_tile_with(&mut self.rng, &self.spawn);
        self.board.spawn_tile_with(&mut self.rng, &self.spawn);
    }

    #[inline]
    pub fn board(&self) -> &Board { &self.board }

    #[inline]
    pub fn score(&self) -> u64 { self.score }

    /// Number of moves that changed the board.
    #[inline]
    pub fn moves(&self) -> u64 { self.moves }

    #[inline]
    pub fn is_over(&self) -> bool { self.board.is_terminal() }

    /// Apply `dir`. A no-op move leaves everything untouched, including the RNG.
    pub fn step(&mut self, dir: Move) -> StepOutcome {
        let res = self.board.apply(self.score, dir);
        if !res.changed {
            debug!(%dir, "move does not change the board");
            return StepOutcome { changed: false, gained: 0, spawned: false, terminal: self.is_over() };
        }
        let gained = res.score - self.score;
        self.board = res.board;
        self.score = res.score;
        self.moves += 1;
        let spawned = self.board.spawn_tile_with(&mut self.rng, &self.spawn);
        let terminal = self.is_over();
        if terminal {
            info!(score = self.score, moves = self.moves, highest = self.board.highest_tile(), "game over");
        }
        StepOutcome { changed: true, gained, spawned, terminal }
    }

    /// Ask `policy` for a move and play it. `None` means the policy found no
    /// move, which only happens in a terminal position.
    pub fn step_with<P: Recommender + ?Sized>(&mut self, policy: &mut P) -> Option<(Move, StepOutcome)> {
        let dir = policy.recommend_move(&self.board, self.score, &mut self.rng)?;
        Some((dir, self.step(dir)))
    }

    /// Start over on a fresh board of the same size, keeping the RNG stream.
    pub fn restart(&mut self) {
        self.board = self.board.cleared();
        self.score = 0;
        self.moves = 0;
        self.place_starting_tiles();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookahead::{Lookahead, LookaheadParallel};

    fn board(rows: &[&[u64]]) -> Board { Board::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap() }

    #[test]
    fn new_game_has_two_tiles() {
        let game = Game::new(4, 9).unwrap();
        assert_eq!(game.board().count_empty(), 14);
        assert_eq!(game.score(), 0);
        assert!(matches!(Game::new(1, 9), Err(EngineError::BoardTooSmall { size: 1 })));
        let fours = Game::with_spawn(4, 9, SpawnConfig::new(1.0).unwrap()).unwrap();
        assert!(fours.board().cells().iter().all(|&v| v == 0 || v == 4));
    }

    #[test]
    fn same_seed_same_game() {
        let a = Game::new(4, 42).unwrap();
        let b = Game::new(4, 42).unwrap();
        assert_eq!(a.board(), b.board());
    }

    #[test]
    fn changing_move_spawns_exactly_one_tile() {
        let mut game = Game::from_board(board(&[&[2, 2, 0, 0], &[0; 4], &[0; 4], &[0; 4]]), 0, 1);
        let out = game.step(Move::Left);
        assert_eq!(out, StepOutcome { changed: true, gained: 4, spawned: true, terminal: false });
        assert_eq!(game.score(), 4);
        assert_eq!(game.moves(), 1);
        // one 4 from the merge plus the spawned tile
        assert_eq!(game.board().count_empty(), 14);
    }

    #[test]
    fn noop_move_changes_nothing() {
        let start = board(&[&[2, 4, 0, 0], &[4, 0, 0, 0], &[0; 4], &[0; 4]]);
        let mut game = Game::from_board(start.clone(), 10, 1);
        let out = game.step(Move::Left);
        assert!(!out.changed && !out.spawned && !out.terminal);
        assert_eq!(game.board(), &start);
        assert_eq!(game.score(), 10);
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn reports_terminal_after_last_spawn() {
        // LEFT leaves one hole at (0, 1); a 4 there locks the board, a 2 merges
        let mut game = Game::from_board(board(&[&[0, 2], &[4, 8]]), 0, 3);
        let out = game.step(Move::Left);
        assert!(out.changed && out.spawned);
        let b = game.board();
        assert_eq!(b.get(0, 0), 2);
        assert_eq!(out.terminal, b.is_terminal());
        assert_eq!(out.terminal, b.get(0, 1) == 4);
    }

    #[test]
    fn policy_driven_steps() {
        let mut game = Game::new(4, 2024).unwrap();
        let mut policy = Lookahead::with_config(crate::lookahead::SearchConfig::default().with_depth(1)).unwrap();
        for _ in 0..20 {
            match game.step_with(&mut policy) {
                Some((_, out)) => assert!(out.changed),
                None => break,
            }
        }
        assert!(game.moves() > 0);

        let mut stuck = Game::from_board(board(&[&[2, 4], &[4, 2]]), 0, 0);
        assert!(stuck.step_with(&mut LookaheadParallel::new()).is_none());
        assert!(stuck.is_over());
    }

    #[test]
    fn restart_resets_state() {
        let mut game = Game::new(3, 5).unwrap();
        for dir in Move::ALL {
            game.step(dir);
        }
        game.restart();
        assert_eq!(game.score(), 0);
        assert_eq!(game.moves(), 0);
        assert_eq!(game.board().size(), 3);
        assert_eq!(game.board().count_empty(), 7);
    }
}
