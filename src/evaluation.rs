use crate::board::{Board, Color, Piece};

/// Material values used by the greedy selector.
#[derive(Debug, Clone)]
pub struct Evaluator {
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,
    pub king_value: i32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            pawn_value: 10,
            knight_value: 30,
            bishop_value: 30,
            rook_value: 50,
            queen_value: 90,
            king_value: 900,
        }
    }

    pub fn piece_value(&self, piece: Piece) -> i32 {
        match piece {
            Piece::Pawn => self.pawn_value,
            Piece::Knight => self.knight_value,
            Piece::Bishop => self.bishop_value,
            Piece::Rook => self.rook_value,
            Piece::Queen => self.queen_value,
            Piece::King => self.king_value,
        }
    }

    /// Total value of `color`'s pieces on the board, king excluded.
    pub fn material(&self, board: &Board, color: Color) -> i32 {
        board
            .pieces(color)
            .filter(|&(_, piece)| piece != Piece::King)
            .map(|(_, piece)| self.piece_value(piece))
            .sum()
    }

    /// Material balance from `color`'s point of view.
    pub fn evaluate(&self, board: &Board, color: Color) -> i32 {
        self.material(board, color) - self.material(board, color.opposite())
    }
}
