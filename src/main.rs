use std::time::Instant;

use clap::Parser;
use serde::Serialize;
use square_packer::board::Board;
use square_packer::render;
use square_packer::solver::{SearchObserver, Solver};
use square_packer::types::{EDISON_SIZE, Outcome, Piece, Placement, edison_pieces};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "square_packer",
    about = "Exact rectangle packing on a square board"
)]
struct Cli {
    /// Board side length
    #[arg(long, default_value_t = EDISON_SIZE)]
    size: u32,

    /// Pieces as WxH or WxH:qty (e.g. 28x14 21x18:2). Defaults to the Edison set
    #[arg(long = "pieces", num_args = 1..)]
    pieces: Vec<String>,

    /// Print every intermediate board state
    #[arg(long)]
    trace: bool,

    /// Show ASCII layout of the solution
    #[arg(long)]
    layout: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Log search progress to stderr
    #[arg(long, short)]
    verbose: bool,
}

fn parse_dimensions(s: &str) -> Result<Piece, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected WxH", s));
    }
    let w = parts[0]
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let h = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    if w == 0 || h == 0 {
        return Err(format!("dimensions must be non-zero in '{}'", s));
    }
    Ok(Piece::new(w, h))
}

/// `WxH` yields one piece, `WxH:qty` yields `qty` copies.
fn parse_pieces(s: &str) -> Result<Vec<Piece>, String> {
    let (dims, qty) = match s.split_once(':') {
        Some((dims, qty)) => {
            let qty = qty
                .parse::<usize>()
                .map_err(|_| format!("invalid quantity in '{}'", s))?;
            if qty == 0 {
                return Err(format!("quantity must be non-zero in '{}'", s));
            }
            (dims, qty)
        }
        None => (s, 1),
    };
    let piece = parse_dimensions(dims)?;
    Ok(vec![piece; qty])
}

struct TracePrinter {
    step: u64,
}

impl SearchObserver for TracePrinter {
    fn on_place(&mut self, board: &Board, placements: &[Placement]) {
        self.step += 1;
        let Some(last) = placements.last() else {
            return;
        };
        println!(
            "Step {}: {} @ ({}, {}), {} cells free",
            self.step,
            last.piece,
            last.x,
            last.y,
            board.space()
        );
        println!("{}", render::render_board(board, placements));
    }
}

#[derive(Serialize)]
struct Report<'a> {
    size: u32,
    solved: bool,
    placements: &'a [Placement],
    unplaced: &'a [Piece],
    calls: u64,
    elapsed_ms: u64,
}

fn print_text(outcome: &Outcome, elapsed_ms: u64, layout: bool) {
    println!("Time taken: {} ms", elapsed_ms);
    match &outcome.solution {
        None => println!("No solution found."),
        Some(sol) => {
            println!("Solution found:");
            for p in &sol.placements {
                let rot = if p.rotated { " [rotated]" } else { "" };
                println!("  {} @ ({}, {}){}", p.piece, p.x, p.y, rot);
            }
            if !sol.unplaced.is_empty() {
                let unplaced: Vec<String> = sol.unplaced.iter().map(Piece::to_string).collect();
                println!("Unplaced: {}", unplaced.join(" "));
            }
            if layout {
                print!("{}", render::render_solution(sol.size, &sol.placements));
            }
        }
    }
    println!("Total number of calls: {}", outcome.calls);
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let pieces = if cli.pieces.is_empty() {
        edison_pieces()
    } else {
        cli.pieces
            .iter()
            .map(|s| parse_pieces(s))
            .collect::<Result<Vec<_>, _>>()
            .map(|groups| groups.concat())
            .unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            })
    };

    let solver = Solver::new(cli.size, pieces).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let start = Instant::now();
    let outcome = if cli.trace {
        solver.solve_with(&mut TracePrinter { step: 0 })
    } else {
        solver.solve()
    };
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if cli.json {
        let report = Report {
            size: solver.size(),
            solved: outcome.is_solved(),
            placements: outcome
                .solution
                .as_ref()
                .map_or(&[][..], |s| s.placements.as_slice()),
            unplaced: outcome
                .solution
                .as_ref()
                .map_or(solver.pieces(), |s| s.unplaced.as_slice()),
            calls: outcome.calls,
            elapsed_ms,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_text(&outcome, elapsed_ms, cli.layout);
    }

    if !outcome.is_solved() {
        std::process::exit(2);
    }
}
