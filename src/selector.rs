use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::board::{Color, Piece};
use crate::error::ChessError;
use crate::evaluation::Evaluator;
use crate::game::GameState;
use crate::movegen::{Move, MoveGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    /// Uniformly random legal move.
    Easy,
    /// Random, but prefers captures when there are any.
    #[default]
    Medium,
    /// Takes the most valuable piece on offer, one ply deep.
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ChessError::InvalidArgument(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectorConfig {
    pub difficulty: Difficulty,
    /// Probability that `Medium` restricts itself to captures when one exists.
    pub capture_bias: f64,
    /// Upper bound of the random tie-breaker added to `Hard` scores. Kept below
    /// the smallest gap in the value table so it only separates equal captures.
    pub jitter: f64,
    /// Fixed seed for reproducible choices; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            capture_bias: 0.7,
            jitter: 1.0,
            seed: None,
        }
    }
}

pub struct MoveSelector {
    config: SelectorConfig,
    evaluator: Evaluator,
    move_generator: MoveGenerator,
    rng: StdRng,
}

impl MoveSelector {
    /// A `capture_bias` outside `[0, 1]` is clamped. A non-finite bias or
    /// jitter falls back to the default, and a negative jitter becomes zero.
    pub fn new(mut config: SelectorConfig) -> Self {
        let defaults = SelectorConfig::default();
        config.capture_bias = if config.capture_bias.is_finite() {
            config.capture_bias.clamp(0.0, 1.0)
        } else {
            defaults.capture_bias
        };
        config.jitter = if config.jitter.is_finite() {
            config.jitter.max(0.0)
        } else {
            defaults.jitter
        };

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            evaluator: Evaluator::new(),
            move_generator: MoveGenerator::new(),
            rng,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.config.difficulty = difficulty;
    }

    /// Picks a move for `color` under the configured difficulty.
    pub fn choose_move(&mut self, state: &GameState, color: Color) -> Option<Move> {
        self.choose_move_with(state, color, self.config.difficulty)
    }

    /// Picks a legal move for `color`, or `None` when it has none. Whether
    /// that means checkmate or stalemate is for the caller to decide.
    pub fn choose_move_with(
        &mut self,
        state: &GameState,
        color: Color,
        difficulty: Difficulty,
    ) -> Option<Move> {
        let board = &state.board;
        let candidates: Vec<(Move, Option<Piece>)> = self
            .move_generator
            .all_legal_moves(board, color)
            .into_iter()
            .map(|mv| (mv, board.get_piece_at(mv.to).map(|(piece, _)| piece)))
            .collect();
        if candidates.is_empty() {
            return None;
        }

        match difficulty {
            Difficulty::Easy => self.pick_random(&candidates),
            Difficulty::Medium => {
                let captures: Vec<(Move, Option<Piece>)> = candidates
                    .iter()
                    .copied()
                    .filter(|(_, captured)| captured.is_some())
                    .collect();
                if !captures.is_empty() && self.rng.gen_bool(self.config.capture_bias) {
                    self.pick_random(&captures)
                } else {
                    self.pick_random(&candidates)
                }
            }
            Difficulty::Hard => self.pick_greedy(&candidates),
        }
    }

    fn pick_random(&mut self, candidates: &[(Move, Option<Piece>)]) -> Option<Move> {
        candidates.choose(&mut self.rng).map(|&(mv, _)| mv)
    }

    fn pick_greedy(&mut self, candidates: &[(Move, Option<Piece>)]) -> Option<Move> {
        let mut best: Option<(Move, f64)> = None;
        for &(mv, captured) in candidates {
            let value = captured.map_or(0, |piece| self.evaluator.piece_value(piece));
            let jitter = if self.config.jitter > 0.0 {
                self.rng.gen_range(0.0..self.config.jitter)
            } else {
                0.0
            };
            let score = value as f64 + jitter;
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((mv, score));
            }
        }
        best.map(|(mv, _)| mv)
    }
}
