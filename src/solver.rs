use crate::board::Board;
use crate::types::{InputError, MAX_BOARD_SIZE, Outcome, Piece, Placement, Solution};

/// Receives every tentative placement made during a search.
///
/// Observers only get shared references, so they cannot steer the search.
pub trait SearchObserver {
    fn on_place(&mut self, board: &Board, placements: &[Placement]);
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl SearchObserver for NoopObserver {
    fn on_place(&mut self, _board: &Board, _placements: &[Placement]) {}
}

/// Depth-first packing search.
///
/// Pieces are only ever placed at the board's anchor (the row-major-first
/// free cell). Each level tries the remaining pieces in input order, every
/// piece first as given and then rotated, and stops at the first complete
/// tiling. Anchoring prunes the tree to one candidate position per board
/// state; it also means the search can report no solution for layouts that
/// would need the first gap filled later, and such instances are not
/// special-cased.
pub struct Solver {
    size: u32,
    pieces: Vec<Piece>,
}

impl Solver {
    /// Validates the input. The board side must lie in `1..=MAX_BOARD_SIZE`;
    /// every piece needs non-zero sides and must fit on the board in at least
    /// one orientation.
    pub fn new(size: u32, pieces: Vec<Piece>) -> Result<Self, InputError> {
        if size == 0 {
            return Err(InputError::ZeroBoardSize);
        }
        if size > MAX_BOARD_SIZE {
            return Err(InputError::BoardTooLarge {
                size,
                max: MAX_BOARD_SIZE,
            });
        }
        for (index, &piece) in pieces.iter().enumerate() {
            if piece.w == 0 || piece.h == 0 {
                return Err(InputError::ZeroDimension { index, piece });
            }
            if !piece.fits_on(size) {
                return Err(InputError::PieceTooLarge { index, piece, size });
            }
        }
        Ok(Self { size, pieces })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn solve(&self) -> Outcome {
        self.solve_with(&mut NoopObserver)
    }

    pub fn solve_with(&self, observer: &mut dyn SearchObserver) -> Outcome {
        tracing::debug!(
            size = self.size,
            pieces = self.pieces.len(),
            "starting search"
        );

        let mut search = Search { calls: 0, observer };
        let board = Board::new(self.size);
        let mut placements = Vec::with_capacity(self.pieces.len());
        let solution = search.run(&board, &self.pieces, &mut placements);

        tracing::debug!(
            solved = solution.is_some(),
            calls = search.calls,
            "search finished"
        );

        Outcome {
            solution,
            calls: search.calls,
        }
    }
}

struct Search<'a> {
    calls: u64,
    observer: &'a mut dyn SearchObserver,
}

impl Search<'_> {
    fn run(
        &mut self,
        board: &Board,
        remaining: &[Piece],
        placements: &mut Vec<Placement>,
    ) -> Option<Solution> {
        self.calls += 1;

        if board.is_full() {
            return Some(Solution {
                size: board.size(),
                placements: placements.clone(),
                unplaced: remaining.to_vec(),
            });
        }

        for (idx, &piece) in remaining.iter().enumerate() {
            for rotated in [false, true] {
                let oriented = if rotated { piece.rotated() } else { piece };
                if !board.fits(oriented) {
                    continue;
                }

                let mut next_board = board.clone();
                let mut next_remaining = remaining.to_vec();
                // Removing idx rather than the first equal piece gives the same
                // result: any earlier equal piece was already tried from this
                // board with the same multiset and failed.
                next_remaining.remove(idx);
                let anchor = next_board.insert(oriented);
                placements.push(Placement {
                    piece: oriented,
                    x: anchor.x,
                    y: anchor.y,
                    rotated,
                });

                tracing::trace!(
                    piece = %oriented,
                    at = %anchor,
                    depth = placements.len(),
                    "tentative placement"
                );
                self.observer.on_place(&next_board, placements);

                if let Some(solution) = self.run(&next_board, &next_remaining, placements) {
                    return Some(solution);
                }

                placements.pop();
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EDISON_SIZE, Position, edison_pieces};

    fn pieces(dims: &[(u32, u32)]) -> Vec<Piece> {
        dims.iter().map(|&(w, h)| Piece::new(w, h)).collect()
    }

    fn solve(size: u32, dims: &[(u32, u32)]) -> Outcome {
        Solver::new(size, pieces(dims)).unwrap().solve()
    }

    /// Validates a complete solution:
    /// 1. Every placement lies inside the board
    /// 2. No two placements overlap
    /// 3. The placements cover the whole board
    fn assert_solution_valid(sol: &Solution) {
        for (i, p) in sol.placements.iter().enumerate() {
            assert!(
                p.x + p.piece.w <= sol.size && p.y + p.piece.h <= sol.size,
                "piece {i} ({}) at ({},{}) exceeds the {}x{} board",
                p.piece,
                p.x,
                p.y,
                sol.size,
                sol.size
            );
        }

        for i in 0..sol.placements.len() {
            for j in (i + 1)..sol.placements.len() {
                let a = &sol.placements[i];
                let b = &sol.placements[j];
                assert!(
                    !a.overlaps(b),
                    "piece {i} ({} @ ({},{})) overlaps piece {j} ({} @ ({},{}))",
                    a.piece,
                    a.x,
                    a.y,
                    b.piece,
                    b.x,
                    b.y
                );
            }
        }

        assert_eq!(sol.covered_area(), sol.size as u64 * sol.size as u64);
    }

    fn at(piece: (u32, u32), pos: (u32, u32), rotated: bool) -> Placement {
        Placement {
            piece: Piece::new(piece.0, piece.1),
            x: pos.0,
            y: pos.1,
            rotated,
        }
    }

    #[test]
    fn test_single_piece_fills_board() {
        let outcome = solve(2, &[(2, 2)]);
        let sol = outcome.solution.unwrap();
        assert_eq!(sol.placements, vec![at((2, 2), (0, 0), false)]);
        assert!(sol.unplaced.is_empty());
        assert_eq!(outcome.calls, 2);
        assert_solution_valid(&sol);
    }

    #[test]
    fn test_unit_pieces_fill_row_major() {
        let outcome = solve(2, &[(1, 1), (1, 1), (1, 1), (1, 1)]);
        let sol = outcome.solution.unwrap();
        let anchors: Vec<Position> = sol.placements.iter().map(Placement::position).collect();
        assert_eq!(
            anchors,
            vec![
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(0, 1),
                Position::new(1, 1),
            ]
        );
        assert_eq!(outcome.calls, 5);
        assert_solution_valid(&sol);
    }

    #[test]
    fn test_oversized_piece_rejected() {
        let err = Solver::new(2, pieces(&[(3, 3)])).err().unwrap();
        assert_eq!(
            err,
            InputError::PieceTooLarge {
                index: 0,
                piece: Piece::new(3, 3),
                size: 2
            }
        );
    }

    #[test]
    fn test_oversized_board_rejected() {
        assert_eq!(
            Solver::new(u32::MAX, pieces(&[(1, 1)])).err(),
            Some(InputError::BoardTooLarge {
                size: u32::MAX,
                max: MAX_BOARD_SIZE
            })
        );
        assert!(Solver::new(MAX_BOARD_SIZE + 1, vec![]).is_err());
        let at_limit = Solver::new(MAX_BOARD_SIZE, pieces(&[(MAX_BOARD_SIZE, 1)])).unwrap();
        assert_eq!(at_limit.size(), MAX_BOARD_SIZE);
    }

    #[test]
    fn test_invalid_input_rejected() {
        assert_eq!(
            Solver::new(0, vec![]).err(),
            Some(InputError::ZeroBoardSize)
        );
        assert_eq!(
            Solver::new(4, pieces(&[(1, 1), (0, 2)])).err(),
            Some(InputError::ZeroDimension {
                index: 1,
                piece: Piece::new(0, 2)
            })
        );
        // too long in both orientations
        assert!(Solver::new(4, pieces(&[(5, 1)])).is_err());
    }

    #[test]
    fn test_horizontal_strips() {
        let outcome = solve(4, &[(4, 1), (4, 1), (4, 1), (4, 1)]);
        let sol = outcome.solution.unwrap();
        assert_eq!(sol.placements.len(), 4);
        assert!(sol.placements.iter().all(|p| !p.rotated));
        assert_solution_valid(&sol);
    }

    #[test]
    fn test_rotation_required() {
        // (1,2) does not fit below the first strip unless rotated
        let outcome = solve(2, &[(2, 1), (1, 2)]);
        let sol = outcome.solution.unwrap();
        assert_eq!(
            sol.placements,
            vec![at((2, 1), (0, 0), false), at((2, 1), (0, 1), true)]
        );
        assert_eq!(sol.placements[1].original(), Piece::new(1, 2));
        assert_eq!(outcome.calls, 3);
        assert_solution_valid(&sol);
    }

    #[test]
    fn test_rotated_piece_closes_board() {
        let sol = solve(3, &[(3, 2), (1, 3)]).solution.unwrap();
        assert_eq!(
            sol.placements,
            vec![at((3, 2), (0, 0), false), at((3, 1), (0, 2), true)]
        );
        assert_solution_valid(&sol);
    }

    #[test]
    fn test_no_solution_exhausts_search() {
        let outcome = solve(2, &[(1, 1), (1, 1), (1, 1)]);
        assert!(!outcome.is_solved());
        assert_eq!(outcome.calls, 79);
    }

    #[test]
    fn test_no_pieces() {
        let outcome = solve(3, &[]);
        assert!(outcome.solution.is_none());
        assert_eq!(outcome.calls, 1);
    }

    #[test]
    fn test_surplus_pieces_reported_unplaced() {
        let sol = solve(2, &[(2, 2), (1, 1)]).solution.unwrap();
        assert_eq!(sol.placements.len(), 1);
        assert_eq!(sol.unplaced, vec![Piece::new(1, 1)]);
        assert_solution_valid(&sol);
    }

    #[test]
    fn test_duplicates_removed_one_at_a_time() {
        // both copies of (1,2) must be placed independently
        let sol = solve(2, &[(1, 2), (1, 2)]).solution.unwrap();
        assert_eq!(
            sol.placements,
            vec![at((1, 2), (0, 0), false), at((1, 2), (1, 0), false)]
        );
        assert!(sol.unplaced.is_empty());
    }

    #[test]
    fn test_backtracks_past_dead_end() {
        // a unit square in the corner can never be completed, so the search
        // has to unwind back to the first level
        let outcome = solve(3, &[(1, 1), (2, 2), (1, 2), (3, 1)]);
        let sol = outcome.solution.unwrap();
        assert_eq!(
            sol.placements,
            vec![
                at((2, 2), (0, 0), false),
                at((1, 2), (2, 0), false),
                at((3, 1), (0, 2), false),
            ]
        );
        assert_eq!(sol.unplaced, vec![Piece::new(1, 1)]);
        assert_eq!(outcome.calls, 36);
        assert_solution_valid(&sol);
    }

    #[test]
    fn test_deterministic() {
        let first = Solver::new(EDISON_SIZE, edison_pieces()).unwrap().solve();
        let second = Solver::new(EDISON_SIZE, edison_pieces()).unwrap().solve();
        assert_eq!(first, second);
    }

    #[test]
    fn test_edison_instance() {
        let outcome = Solver::new(EDISON_SIZE, edison_pieces()).unwrap().solve();
        assert_eq!(outcome.calls, 1212);
        let sol = outcome.solution.unwrap();
        assert_eq!(sol.placements.len(), 12);
        assert!(sol.unplaced.is_empty());
        assert_eq!(sol.placements[0], at((28, 14), (0, 0), false));
        assert_eq!(sol.placements[11], at((32, 11), (24, 45), false));
        assert_solution_valid(&sol);
    }

    struct Recorder {
        boards: Vec<Board>,
        depths: Vec<usize>,
    }

    impl SearchObserver for Recorder {
        fn on_place(&mut self, board: &Board, placements: &[Placement]) {
            self.boards.push(board.clone());
            self.depths.push(placements.len());
        }
    }

    #[test]
    fn test_observer_sees_each_placement() {
        let solver = Solver::new(2, pieces(&[(1, 1), (1, 1), (1, 1), (1, 1)])).unwrap();
        let mut recorder = Recorder {
            boards: vec![],
            depths: vec![],
        };
        let observed = solver.solve_with(&mut recorder);
        assert_eq!(observed, solver.solve());
        assert_eq!(recorder.depths, vec![1, 2, 3, 4]);
        let spaces: Vec<u64> = recorder.boards.iter().map(Board::space).collect();
        assert_eq!(spaces, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_failed_branch_leaves_parent_untouched() {
        let mut parent = Board::new(2);
        parent.insert(Piece::new(1, 1));
        let snapshot = parent.clone();

        let mut search = Search {
            calls: 0,
            observer: &mut NoopObserver,
        };
        let mut placements = vec![at((1, 1), (0, 0), false)];
        let remaining = pieces(&[(1, 1), (1, 1)]);
        assert!(search.run(&parent, &remaining, &mut placements).is_none());

        assert_eq!(parent, snapshot);
        assert_eq!(placements, vec![at((1, 1), (0, 0), false)]);
    }
}
