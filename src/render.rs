use crate::board::Board;
use crate::types::{Placement, Position};

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

// Cycled per placement index.
const PALETTE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// One character per cell: free cells are `.`, cells of a placement carry
/// that placement's palette letter, any other occupied cell is `#`.
pub fn render_board(board: &Board, placements: &[Placement]) -> String {
    let size = board.size() as usize;
    let mut grid: Vec<Vec<char>> = (0..board.size())
        .map(|y| {
            (0..board.size())
                .map(|x| if board.is_free(Position::new(x, y)) { '.' } else { '#' })
                .collect()
        })
        .collect();

    for (i, p) in placements.iter().enumerate() {
        let ch = PALETTE[i % PALETTE.len()] as char;
        for y in p.y..p.y + p.piece.h {
            for x in p.x..p.x + p.piece.w {
                if let Some(cell) = grid
                    .get_mut(y as usize)
                    .and_then(|row| row.get_mut(x as usize))
                {
                    *cell = ch;
                }
            }
        }
    }

    let mut result = String::with_capacity(size * (size + 1));
    for row in &grid {
        result.extend(row.iter());
        result.push('\n');
    }
    result
}

/// Scaled box drawing of a finished layout, each piece labelled `WxH`.
pub fn render_solution(size: u32, placements: &[Placement]) -> String {
    // Character cells are roughly twice as tall as they are wide.
    let scale = f64::min(MAX_WIDTH / size as f64, MAX_HEIGHT * 2.0 / size as f64);
    let grid_w = (size as f64 * scale).round() as usize;
    let grid_h = (size as f64 * scale / 2.0).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }
    let x_scale = grid_w as f64 / size as f64;
    let y_scale = grid_h as f64 / size as f64;

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];

    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for p in placements {
        let sx = (p.x as f64 * x_scale).round() as usize;
        let sy = (p.y as f64 * y_scale).round() as usize;
        let ex = ((p.x + p.piece.w) as f64 * x_scale).round() as usize;
        let ey = ((p.y + p.piece.h) as f64 * y_scale).round() as usize;
        let sw = ex.saturating_sub(sx);
        let sh = ey.saturating_sub(sy);

        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        let label: Vec<char> = p.piece.to_string().chars().collect();
        if sw > label.len() && sh > 1 {
            let cy = sy + sh / 2;
            let start_x = sx + (sw - label.len()) / 2 + 1;
            for (i, &ch) in label.iter().enumerate() {
                let x = start_x + i;
                if x > sx && x < sx + sw {
                    grid[cy][x] = ch;
                }
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

fn edge(current: char, line: char) -> char {
    match current {
        '+' => '+',
        '-' | '|' if current != line => '+',
        _ => line,
    }
}

fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = grid.first().map_or(0, Vec::len);

    for i in x..=x + w {
        for j in [y, y + h] {
            if i < cols && j < rows {
                grid[j][i] = edge(grid[j][i], '-');
            }
        }
    }

    for j in y..=y + h {
        for i in [x, x + w] {
            if i < cols && j < rows {
                grid[j][i] = edge(grid[j][i], '|');
            }
        }
    }

    for cx in [x, x + w] {
        for cy in [y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}
