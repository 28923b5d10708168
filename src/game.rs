use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Piece, Position};
use crate::error::ChessError;
use crate::movegen::{Move, MoveGenerator};

/// Outcome of the position for the side to move. Only `Checkmate` is
/// persisted, as `GameState::terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Normal,
    Check,
    /// Carries the winner.
    Checkmate(Color),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::Normal => write!(f, "Game in Progress"),
            Status::Check => write!(f, "Check!"),
            Status::Checkmate(winner) => write!(f, "Checkmate! {winner} Wins!"),
        }
    }
}

/// One executed move, with the board as it stood before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: Position,
    pub to: Position,
    pub piece: Piece,
    pub color: Color,
    pub captured_piece: Option<Piece>,
    pub promotion: bool,
    pub board_before: Board,
}

impl MoveRecord {
    /// `♙e2-e4`, or `♕d1xd8` for a capture.
    pub fn notation(&self) -> String {
        let separator = if self.captured_piece.is_some() { 'x' } else { '-' };
        format!(
            "{}{}{}{}",
            self.piece.symbol(self.color),
            self.from,
            separator,
            self.to
        )
    }
}

/// Pieces taken so far, keyed by the side that took them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captured {
    pub white: Vec<Piece>,
    pub black: Vec<Piece>,
}

impl Captured {
    pub fn by(&self, capturer: Color) -> &[Piece] {
        match capturer {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn list_mut(&mut self, capturer: Color) -> &mut Vec<Piece> {
        match capturer {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Glyphs of the pieces `capturer` has taken.
    pub fn symbols(&self, capturer: Color) -> String {
        let victim = capturer.opposite();
        self.by(capturer).iter().map(|p| p.symbol(victim)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    from: Position,
    destinations: Vec<Position>,
}

/// A single game. Each instance is independent; nothing is shared between
/// games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub side_to_move: Color,
    pub history: Vec<MoveRecord>,
    pub captured: Captured,
    pub terminal: bool,
    #[serde(skip)]
    selection: Option<Selection>,
    #[serde(skip)]
    move_generator: MoveGenerator,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            side_to_move: Color::White,
            history: Vec::new(),
            captured: Captured::default(),
            terminal: false,
            selection: None,
            move_generator: MoveGenerator::new(),
        }
    }

    /// Starts a game from an arbitrary position. The board must hold exactly
    /// one king per side.
    pub fn from_board(board: Board, side_to_move: Color) -> Result<Self, ChessError> {
        board.validate()?;
        let mut state = Self {
            board,
            side_to_move,
            ..Self::new()
        };
        state.terminal = matches!(state.status(), Status::Checkmate(_));
        Ok(state)
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn legal_moves(&self, from: Position) -> Vec<Position> {
        self.move_generator.legal_moves(&self.board, from)
    }

    pub fn all_legal_moves(&self, color: Color) -> Vec<Move> {
        self.move_generator.all_legal_moves(&self.board, color)
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        self.move_generator.is_king_in_check(&self.board, color)
    }

    pub fn has_legal_move(&self, color: Color) -> bool {
        self.move_generator.has_legal_move(&self.board, color)
    }

    /// Selects the piece on `pos` and caches its legal destinations. The piece
    /// must belong to the side to move and have at least one legal move;
    /// otherwise the selection is cleared.
    pub fn select_piece(&mut self, pos: Position) -> Result<&[Position], ChessError> {
        self.selection = None;
        match self.board.get_piece_at(pos) {
            Some((_, color)) if color == self.side_to_move => {}
            _ => return Err(ChessError::InvalidSelection(pos)),
        }

        let destinations = self.legal_moves(pos);
        if destinations.is_empty() {
            return Err(ChessError::InvalidSelection(pos));
        }

        let selection = self.selection.insert(Selection {
            from: pos,
            destinations,
        });
        Ok(selection.destinations.as_slice())
    }

    pub fn selected(&self) -> Option<Position> {
        self.selection.as_ref().map(|s| s.from)
    }

    pub fn selected_destinations(&self) -> &[Position] {
        self.selection
            .as_ref()
            .map(|s| s.destinations.as_slice())
            .unwrap_or(&[])
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Plays `mv` for the side to move. Captures, promotion to a queen, the
    /// history entry and the turn change all happen together, after the move
    /// has been checked; a rejected move changes nothing.
    pub fn execute_move(&mut self, mv: Move) -> Result<Status, ChessError> {
        let (piece, color) = match self.board.get_piece_at(mv.from) {
            Some((piece, color)) if color == self.side_to_move => (piece, color),
            _ => return Err(ChessError::InvalidSelection(mv.from)),
        };
        if !self.move_generator.is_move_legal(&self.board, &mv) {
            return Err(ChessError::IllegalDestination {
                from: mv.from,
                to: mv.to,
            });
        }

        let board_before = self.board;
        let captured_piece = self.board.make_move(mv).map(|(captured, _)| captured);
        if let Some(captured) = captured_piece {
            self.captured.list_mut(color).push(captured);
        }

        self.history.push(MoveRecord {
            from: mv.from,
            to: mv.to,
            piece,
            color,
            captured_piece,
            promotion: piece == Piece::Pawn && mv.to.row == color.promotion_row(),
            board_before,
        });
        self.side_to_move = color.opposite();
        self.selection = None;

        let status = self.status();
        if let Status::Checkmate(_) = status {
            self.terminal = true;
        }
        Ok(status)
    }

    /// Takes back the last move. Status other than `terminal` is not
    /// recomputed; call `status` afterwards if needed.
    pub fn undo(&mut self) -> Result<MoveRecord, ChessError> {
        let record = self.history.pop().ok_or(ChessError::NothingToUndo)?;
        self.board = record.board_before;
        self.side_to_move = record.color;
        if record.captured_piece.is_some() {
            self.captured.list_mut(record.color).pop();
        }
        self.terminal = false;
        self.selection = None;
        Ok(record)
    }

    /// Check status of the side to move.
    pub fn status(&self) -> Status {
        let side = self.side_to_move;
        if self.move_generator.is_checkmate(&self.board, side) {
            Status::Checkmate(side.opposite())
        } else if self.is_in_check(side) {
            Status::Check
        } else {
            Status::Normal
        }
    }

    pub fn turn_indicator(&self) -> String {
        format!("{}'s Turn", self.side_to_move)
    }

    pub fn history_notation(&self) -> Vec<String> {
        self.history.iter().map(MoveRecord::notation).collect()
    }

    pub fn to_snapshot_json(&self) -> Result<String, ChessError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Builds a game from a full-state snapshot. The board, and every board
    /// the history can undo back to, must hold one king per side, and the
    /// recorded moves must alternate colors ending with the side that just
    /// moved.
    pub fn from_snapshot_json(json: &str) -> Result<Self, ChessError> {
        let state: GameState = serde_json::from_str(json)?;
        state.validate_snapshot()?;
        Ok(state)
    }

    fn validate_snapshot(&self) -> Result<(), ChessError> {
        self.board.validate()?;
        let mut mover = self.side_to_move;
        for (index, record) in self.history.iter().enumerate().rev() {
            mover = mover.opposite();
            if record.color != mover {
                return Err(ChessError::InvalidBoard(format!(
                    "history move {} was played by {}, expected {}",
                    index + 1,
                    record.color,
                    mover
                )));
            }
            let moved = record.board_before.get_piece_at(record.from);
            if moved != Some((record.piece, record.color)) {
                return Err(ChessError::InvalidBoard(format!(
                    "history move {} has no {} {:?} on {}",
                    index + 1,
                    record.color,
                    record.piece,
                    record.from
                )));
            }
            record.board_before.validate()?;
        }
        Ok(())
    }

    /// Replaces this game wholesale with the snapshot. On error the current
    /// state is kept.
    pub fn load_snapshot(&mut self, json: &str) -> Result<(), ChessError> {
        *self = Self::from_snapshot_json(json)?;
        Ok(())
    }

    /// Applies a serialized move request `{"from":{..},"to":{..}}` exactly as a
    /// local move.
    pub fn apply_request_json(&mut self, json: &str) -> Result<Status, ChessError> {
        let mv: Move = serde_json::from_str(json)?;
        self.execute_move(mv)
    }
}
