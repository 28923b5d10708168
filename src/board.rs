use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChessError;
use crate::movegen::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    /// Unicode glyph used in move history and captured-piece lists.
    pub fn symbol(&self, color: Color) -> char {
        match (color, self) {
            (Color::White, Piece::King) => '♔',
            (Color::White, Piece::Queen) => '♕',
            (Color::White, Piece::Rook) => '♖',
            (Color::White, Piece::Bishop) => '♗',
            (Color::White, Piece::Knight) => '♘',
            (Color::White, Piece::Pawn) => '♙',
            (Color::Black, Piece::King) => '♚',
            (Color::Black, Piece::Queen) => '♛',
            (Color::Black, Piece::Rook) => '♜',
            (Color::Black, Piece::Bishop) => '♝',
            (Color::Black, Piece::Knight) => '♞',
            (Color::Black, Piece::Pawn) => '♟',
        }
    }

    /// Diagram letter: uppercase for white, lowercase for black.
    pub fn letter(&self, color: Color) -> char {
        let c = match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_letter(c: char) -> Option<(Piece, Color)> {
        let piece = match c.to_ascii_lowercase() {
            'p' => Piece::Pawn,
            'n' => Piece::Knight,
            'b' => Piece::Bishop,
            'r' => Piece::Rook,
            'q' => Piece::Queen,
            'k' => Piece::King,
            _ => return None,
        };
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some((piece, color))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a single pawn step.
    pub fn pawn_direction(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    pub fn pawn_start_row(&self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// The opponent's back rank, where this color's pawns promote.
    pub fn promotion_row(&self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

impl FromStr for Color {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            _ => Err(ChessError::InvalidArgument(s.to_string())),
        }
    }
}

/// A square on the board. Row 0 is rank 8, column 0 is file a.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

#[derive(Deserialize)]
struct RawPosition {
    row: u8,
    col: u8,
}

impl TryFrom<RawPosition> for Position {
    type Error = ChessError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Position::try_new(raw.row as i8, raw.col as i8)
            .ok_or_else(|| ChessError::InvalidSquare(format!("row {} col {}", raw.row, raw.col)))
    }
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Self {
        assert!(row < 8 && col < 8);
        Self { row, col }
    }

    pub fn try_new(row: i8, col: i8) -> Option<Self> {
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// The square `(dr, dc)` away, or `None` when that falls off the board.
    pub fn offset(&self, dr: i8, dc: i8) -> Option<Self> {
        Self::try_new(self.row as i8 + dr, self.col as i8 + dc)
    }

    pub fn all() -> impl Iterator<Item = Position> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Position { row, col }))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let file = (b'a' + self.col) as char;
        write!(f, "{}{}", file, 8 - self.row)
    }
}

impl FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        Ok(Position::new(8 - (rank - b'0'), file - b'a'))
    }
}

pub type Cell = Option<(Piece, Color)>;

const BACK_RANK: [Piece; 8] = [
    Piece::Rook,
    Piece::Knight,
    Piece::Bishop,
    Piece::Queen,
    Piece::King,
    Piece::Bishop,
    Piece::Knight,
    Piece::Rook,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub squares: [[Cell; 8]; 8],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// The standard starting position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for col in 0..8 {
            board.squares[0][col] = Some((BACK_RANK[col], Color::Black));
            board.squares[1][col] = Some((Piece::Pawn, Color::Black));
            board.squares[6][col] = Some((Piece::Pawn, Color::White));
            board.squares[7][col] = Some((BACK_RANK[col], Color::White));
        }
        board
    }

    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
        }
    }

    /// Parses a diagram of eight rows, rank 8 first, one character per square:
    /// piece letters (uppercase white, lowercase black) and `.` for empty.
    /// Whitespace inside a row is ignored, so the output of `Display` reads back.
    pub fn from_diagram(diagram: &str) -> Result<Self, ChessError> {
        let rows: Vec<&str> = diagram
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if rows.len() != 8 {
            return Err(ChessError::InvalidBoard(format!(
                "expected 8 rows, found {}",
                rows.len()
            )));
        }

        let mut board = Self::empty();
        for (row, line) in rows.iter().enumerate() {
            let cells: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if cells.len() != 8 {
                return Err(ChessError::InvalidBoard(format!(
                    "row {} has {} squares",
                    row,
                    cells.len()
                )));
            }
            for (col, c) in cells.into_iter().enumerate() {
                board.squares[row][col] = match c {
                    '.' => None,
                    c => Some(Piece::from_letter(c).ok_or_else(|| {
                        ChessError::InvalidBoard(format!("unknown piece letter {c:?}"))
                    })?),
                };
            }
        }
        Ok(board)
    }

    pub fn get_piece_at(&self, pos: Position) -> Cell {
        self.squares[pos.row as usize][pos.col as usize]
    }

    pub fn set_piece_at(&mut self, pos: Position, cell: Cell) {
        self.squares[pos.row as usize][pos.col as usize] = cell;
    }

    pub fn is_empty_at(&self, pos: Position) -> bool {
        self.get_piece_at(pos).is_none()
    }

    /// Moves whatever stands on `mv.from` to `mv.to` and returns the previous
    /// occupant of `mv.to`. A pawn landing on its promotion row becomes a queen.
    /// No legality checking happens here.
    pub fn make_move(&mut self, mv: Move) -> Cell {
        let captured = self.get_piece_at(mv.to);
        let moving = self.get_piece_at(mv.from).map(|(piece, color)| {
            if piece == Piece::Pawn && mv.to.row == color.promotion_row() {
                (Piece::Queen, color)
            } else {
                (piece, color)
            }
        });
        self.set_piece_at(mv.to, moving);
        self.set_piece_at(mv.from, None);
        captured
    }

    /// All pieces of `color` with their squares, rank 8 first.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(move |pos| match self.get_piece_at(pos) {
            Some((piece, c)) if c == color => Some((pos, piece)),
            _ => None,
        })
    }

    pub fn find_king(&self, color: Color) -> Option<Position> {
        self.pieces(color)
            .find(|&(_, piece)| piece == Piece::King)
            .map(|(pos, _)| pos)
    }

    /// Checks that each side has exactly one king, which check detection
    /// depends on.
    pub fn validate(&self) -> Result<(), ChessError> {
        for color in [Color::White, Color::Black] {
            let kings = self
                .pieces(color)
                .filter(|&(_, piece)| piece == Piece::King)
                .count();
            match kings {
                0 => return Err(ChessError::NoKingPresent(color)),
                1 => {}
                n => {
                    return Err(ChessError::InvalidBoard(format!(
                        "{color} has {n} kings"
                    )))
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in 0..8 {
            for col in 0..8 {
                let c = match self.squares[row][col] {
                    Some((piece, color)) => piece.letter(color),
                    None => '.',
                };
                write!(f, "{c}")?;
                if col < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
