use std::time::Instant;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use square_packer::solver::Solver;
use square_packer::types::{Outcome, Piece, Placement, deserialize_u32_from_number};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct SolveRequest {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    size: u32,
    pieces: Vec<Piece>,
}

#[derive(Serialize, Debug, PartialEq)]
struct SolveResponse {
    solved: bool,
    placements: Vec<Placement>,
    unplaced: Vec<Piece>,
    calls: u64,
    elapsed_ms: u64,
}

impl SolveResponse {
    fn new(outcome: Outcome, pieces: &[Piece], elapsed_ms: u64) -> Self {
        match outcome.solution {
            Some(sol) => Self {
                solved: true,
                placements: sol.placements,
                unplaced: sol.unplaced,
                calls: outcome.calls,
                elapsed_ms,
            },
            None => Self {
                solved: false,
                placements: vec![],
                unplaced: pieces.to_vec(),
                calls: outcome.calls,
                elapsed_ms,
            },
        }
    }
}

async fn solve(
    Json(req): Json<SolveRequest>,
) -> Result<Json<SolveResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /solve"
    );

    let solver = Solver::new(req.size, req.pieces)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let response = tokio::task::spawn_blocking(move || {
        let start = Instant::now();
        let outcome = solver.solve();
        SolveResponse::new(outcome, solver.pieces(), start.elapsed().as_millis() as u64)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "search task failed");
        sentry::capture_error(&e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "search task failed".to_string(),
        )
    })?;

    tracing::info!(
        solved = response.solved,
        calls = response.calls,
        elapsed_ms = response.elapsed_ms,
        "search done"
    );

    Ok(Json(response))
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/solve", post(solve))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[tokio::main]
async fn main() {
    let _sentry = sentry::init((
        std::env::var("SENTRY_DSN").ok(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .unwrap_or_else(|e| {
            eprintln!("Error: failed to open development.log: {e}");
            std::process::exit(1);
        });

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    if let Err(e) = serve(&addr).await {
        tracing::error!(error = %e, "server stopped");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn serve(addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    eprintln!("Listening on {addr}");
    axum::serve(listener, app()).await
}
