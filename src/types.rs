use serde::{Deserialize, Deserializer, Serialize};

/// Board side of the reference Edison instance.
pub const EDISON_SIZE: u32 = 56;

/// Largest accepted board side. Every search frame holds its own copy of the
/// grid, so the side is capped well below what fits in memory.
pub const MAX_BOARD_SIZE: u32 = 4096;

/// Pieces of the reference Edison instance, in input order.
pub fn edison_pieces() -> Vec<Piece> {
    [
        (28, 14),
        (21, 18),
        (21, 18),
        (21, 14),
        (21, 14),
        (32, 11),
        (32, 10),
        (28, 7),
        (28, 6),
        (17, 14),
        (14, 4),
        (10, 7),
    ]
    .into_iter()
    .map(|(w, h)| Piece::new(w, h))
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub w: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub h: u32,
}

impl Piece {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    /// Whether the piece fits on a square board of side `size` in either orientation.
    pub fn fits_on(&self, size: u32) -> bool {
        self.w.max(self.h) <= size
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Cell coordinate: `x` is the column, `y` the row, both from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A committed piece: the oriented rectangle and the anchor it was placed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub piece: Piece,
    pub x: u32,
    pub y: u32,
    pub rotated: bool,
}

impl Placement {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// The piece as it appeared in the input, before any rotation.
    pub fn original(&self) -> Piece {
        if self.rotated {
            self.piece.rotated()
        } else {
            self.piece
        }
    }

    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x < other.x + other.piece.w
            && other.x < self.x + self.piece.w
            && self.y < other.y + other.piece.h
            && other.y < self.y + self.piece.h
    }
}

/// A complete tiling of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub size: u32,
    pub placements: Vec<Placement>,
    /// Pieces still remaining when the board filled up.
    pub unplaced: Vec<Piece>,
}

impl Solution {
    pub fn covered_area(&self) -> u64 {
        self.placements.iter().map(|p| p.piece.area()).sum()
    }
}

/// Result of a search: the first solution found, if any, and the number of
/// recursive search calls it took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub solution: Option<Solution>,
    pub calls: u64,
}

impl Outcome {
    pub fn is_solved(&self) -> bool {
        self.solution.is_some()
    }
}

/// Input rejected before the search starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    ZeroBoardSize,
    BoardTooLarge { size: u32, max: u32 },
    ZeroDimension { index: usize, piece: Piece },
    PieceTooLarge { index: usize, piece: Piece, size: u32 },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::ZeroBoardSize => write!(f, "board size must be non-zero"),
            InputError::BoardTooLarge { size, max } => {
                write!(f, "board size {} exceeds the maximum of {}", size, max)
            }
            InputError::ZeroDimension { index, piece } => {
                write!(f, "piece #{} ({}) has a zero dimension", index + 1, piece)
            }
            InputError::PieceTooLarge { index, piece, size } => write!(
                f,
                "piece #{} ({}) does not fit on a {}x{} board in either orientation",
                index + 1,
                piece,
                size,
                size
            ),
        }
    }
}

impl std::error::Error for InputError {}

/// Accepts integral JSON numbers written either as integers or as floats (`12.0`).
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = f64::deserialize(deserializer)?;
    if n.fract() != 0.0 || n < 0.0 || n > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {n}"
        )));
    }
    Ok(n as u32)
}
