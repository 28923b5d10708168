use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Piece, Position};
use crate::error::ChessError;

/// A move request: a piece on `from` going to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
}

impl Move {
    pub fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Coordinate form, `e2e4`.
impl FromStr for Move {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 4 || !s.is_ascii() {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        Ok(Self {
            from: s[0..2].parse()?,
            to: s[2..4].parse()?,
        })
    }
}

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Destinations the piece on `from` can reach by its movement pattern,
    /// ignoring whether its own king ends up in check. Empty for an empty square.
    pub fn pseudo_moves(&self, board: &Board, from: Position) -> Vec<Position> {
        let Some((piece, color)) = board.get_piece_at(from) else {
            return Vec::new();
        };

        match piece {
            Piece::Pawn => self.pawn_moves(board, from, color),
            Piece::Rook => self.sliding_moves(board, from, color, &ROOK_DIRECTIONS),
            Piece::Bishop => self.sliding_moves(board, from, color, &BISHOP_DIRECTIONS),
            Piece::Queen => {
                let mut moves = self.sliding_moves(board, from, color, &ROOK_DIRECTIONS);
                moves.extend(self.sliding_moves(board, from, color, &BISHOP_DIRECTIONS));
                moves
            }
            Piece::Knight => self.step_moves(board, from, color, &KNIGHT_OFFSETS),
            Piece::King => self.step_moves(board, from, color, &KING_OFFSETS),
        }
    }

    fn pawn_moves(&self, board: &Board, from: Position, color: Color) -> Vec<Position> {
        let mut moves = Vec::new();
        let direction = color.pawn_direction();

        // Single push, then double push from the start row through an empty square
        if let Some(one) = from.offset(direction, 0).filter(|&p| board.is_empty_at(p)) {
            moves.push(one);
            if from.row == color.pawn_start_row() {
                if let Some(two) = one.offset(direction, 0).filter(|&p| board.is_empty_at(p)) {
                    moves.push(two);
                }
            }
        }

        for dc in [-1, 1] {
            if let Some(target) = from.offset(direction, dc) {
                if matches!(board.get_piece_at(target), Some((_, c)) if c != color) {
                    moves.push(target);
                }
            }
        }

        moves
    }

    fn sliding_moves(
        &self,
        board: &Board,
        from: Position,
        color: Color,
        directions: &[(i8, i8)],
    ) -> Vec<Position> {
        let mut moves = Vec::new();
        for &(dr, dc) in directions {
            let mut current = from;
            while let Some(target) = current.offset(dr, dc) {
                match board.get_piece_at(target) {
                    None => moves.push(target),
                    Some((_, c)) => {
                        if c != color {
                            moves.push(target);
                        }
                        break;
                    }
                }
                current = target;
            }
        }
        moves
    }

    fn step_moves(
        &self,
        board: &Board,
        from: Position,
        color: Color,
        offsets: &[(i8, i8)],
    ) -> Vec<Position> {
        offsets
            .iter()
            .filter_map(|&(dr, dc)| from.offset(dr, dc))
            .filter(|&target| !matches!(board.get_piece_at(target), Some((_, c)) if c == color))
            .collect()
    }

    /// Whether any piece of `attacker` has `square` among its pseudo-legal
    /// destinations.
    pub fn is_square_under_attack(&self, board: &Board, square: Position, attacker: Color) -> bool {
        board
            .pieces(attacker)
            .any(|(from, _)| self.pseudo_moves(board, from).contains(&square))
    }

    /// A board without a king of `color` is reported as not in check.
    pub fn is_king_in_check(&self, board: &Board, color: Color) -> bool {
        match board.find_king(color) {
            Some(king) => self.is_square_under_attack(board, king, color.opposite()),
            None => false,
        }
    }

    /// Pseudo-legal destinations of the piece on `from` that do not leave its
    /// own king in check. Each candidate is tried on a scratch copy; `board`
    /// itself is never touched.
    pub fn legal_moves(&self, board: &Board, from: Position) -> Vec<Position> {
        let Some((_, color)) = board.get_piece_at(from) else {
            return Vec::new();
        };

        self.pseudo_moves(board, from)
            .into_iter()
            .filter(|&to| {
                let mut scratch = *board;
                scratch.make_move(Move::new(from, to));
                !self.is_king_in_check(&scratch, color)
            })
            .collect()
    }

    pub fn is_move_legal(&self, board: &Board, mv: &Move) -> bool {
        self.legal_moves(board, mv.from).contains(&mv.to)
    }

    /// Every legal move of `color`, grouped by origin square, rank 8 first.
    pub fn all_legal_moves(&self, board: &Board, color: Color) -> Vec<Move> {
        board
            .pieces(color)
            .flat_map(|(from, _)| {
                self.legal_moves(board, from)
                    .into_iter()
                    .map(move |to| Move::new(from, to))
            })
            .collect()
    }

    pub fn has_legal_move(&self, board: &Board, color: Color) -> bool {
        board
            .pieces(color)
            .any(|(from, _)| !self.legal_moves(board, from).is_empty())
    }

    pub fn is_checkmate(&self, board: &Board, color: Color) -> bool {
        self.is_king_in_check(board, color) && !self.has_legal_move(board, color)
    }
}
