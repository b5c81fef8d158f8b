//! lookahead-2048: a 2048 board engine + three-ply heuristic lookahead
//!
//! This crate provides:
//! - A square `Board` of any side length >= 2 with the slide/merge rules (`engine` module)
//! - A heuristic lookahead that recommends moves (`lookahead` module), single-threaded and rayon variants
//! - A `Game` session that spawns tiles and detects the end of a game (`game` module)
//! - An offline enumerator of move sequences with a tab-separated dump (`sequences` module)
//!
//! Quick start:
//! ```
//! use lookahead_2048::engine::{Board, Move};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic board initialization with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut b0 = Board::new(4).unwrap();
//! b0.spawn_tile(&mut rng);
//! b0.spawn_tile(&mut rng);
//! let res = b0.apply(0, Move::Left);
//! assert!(res.changed || res.board == b0);
//! ```
//!
//! Full loop (simplest possible)
//! ```
//! use lookahead_2048::game::Game;
//! use lookahead_2048::lookahead::Lookahead;
//!
//! // 1) Seeded game and policy
//! let mut game = Game::new(4, 123).unwrap();
//! let mut policy = Lookahead::new();
//!
//! // 2) Loop a couple of moves to demonstrate flow (keep doctests fast)
//! let mut moves = 0u32;
//! while !game.is_over() && moves < 4 {
//!     match game.step_with(&mut policy) {
//!         Some(_) => moves += 1,
//!         None => break,
//!     }
//! }
//!
//! // 3) Inspect final state
//! let _final_score = game.score();
//! assert!(moves > 0);
//! ```
//!
pub mod engine;
pub mod game;
pub mod lookahead;
pub mod sequences;
