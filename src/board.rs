use crate::types::{Piece, Position};

/// Square occupancy grid that only ever accepts pieces at its anchor, the
/// row-major-first free cell.
///
/// There is no removal operation. Backtracking works by cloning the board
/// before a tentative placement and dropping the clone on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: u32,
    // row-major, true = free
    cells: Vec<bool>,
    next_free: Position,
    space: u64,
}

impl Board {
    pub fn new(size: u32) -> Self {
        let area = size as u64 * size as u64;
        Self {
            size,
            cells: vec![true; area as usize],
            next_free: Position::default(),
            space: area,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of free cells.
    pub fn space(&self) -> u64 {
        self.space
    }

    pub fn is_full(&self) -> bool {
        self.space == 0
    }

    /// The anchor cell, or `None` once the board is full.
    pub fn next_free(&self) -> Option<Position> {
        (!self.is_full()).then_some(self.next_free)
    }

    pub fn is_free(&self, pos: Position) -> bool {
        pos.x < self.size && pos.y < self.size && self.cells[self.index(pos.x, pos.y)]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.size as usize + x as usize
    }

    fn position(&self, index: usize) -> Position {
        let size = self.size as usize;
        Position::new((index % size) as u32, (index / size) as u32)
    }

    /// Whether `piece`, with its top-left corner on the anchor, stays inside
    /// the board and covers only free cells.
    pub fn fits(&self, piece: Piece) -> bool {
        if self.is_full() {
            return false;
        }
        let Position { x, y } = self.next_free;
        if x as u64 + piece.w as u64 > self.size as u64
            || y as u64 + piece.h as u64 > self.size as u64
        {
            return false;
        }
        (y..y + piece.h).all(|row| (x..x + piece.w).all(|col| self.cells[self.index(col, row)]))
    }

    /// Occupies the footprint of `piece` at the anchor and returns the anchor used.
    ///
    /// # Panics
    ///
    /// Panics if `piece` does not fit at the anchor.
    pub fn insert(&mut self, piece: Piece) -> Position {
        assert!(
            self.fits(piece),
            "piece {} does not fit at anchor {}",
            piece,
            self.next_free
        );
        let anchor = self.next_free;

        for row in anchor.y..anchor.y + piece.h {
            let start = self.index(anchor.x, row);
            self.cells[start..start + piece.w as usize].fill(false);
        }
        self.space -= piece.area();

        // Every cell before the old anchor is already occupied.
        let from = self.index(anchor.x, anchor.y);
        if let Some(offset) = self.cells[from..].iter().position(|&free| free) {
            self.next_free = self.position(from + offset);
        }

        anchor
    }
}
