pub mod board;
pub mod error;
pub mod evaluation;
pub mod game;
pub mod movegen;
pub mod protocol;
pub mod selector;

pub use board::{Board, Cell, Color, Piece, Position};
pub use error::ChessError;
pub use game::{Captured, GameState, MoveRecord, Status};
pub use movegen::{Move, MoveGenerator};
pub use selector::{Difficulty, MoveSelector, SelectorConfig};
