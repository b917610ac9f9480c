use crate::error::{AppError, Result};
use crate::grid::{CellKind, Coord, Grid};
use crate::playback::FetchTicket;
use crate::settings::SolverConfig;
use crate::trace::AlgorithmStep;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Cell as sent to the backend: position and kind only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    pub row: usize,
    pub col: usize,
    #[serde(rename = "type")]
    pub kind: CellKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireGrid {
    pub rows: usize,
    pub cols: usize,
    pub nodes: Vec<Vec<WireNode>>,
}

/// Body of `POST /solve`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub grid: WireGrid,
    pub start: WireNode,
    pub end: WireNode,
    pub config: SolverConfig,
}

impl SolveRequest {
    /// Snapshot the grid, dropping costs, visit flags and parents
    pub fn new(grid: &Grid, start: Coord, end: Coord, config: &SolverConfig) -> Result<Self> {
        let wire = |coord: Coord| -> Result<WireNode> {
            let cell = grid.get(coord)?;
            Ok(WireNode {
                row: cell.row,
                col: cell.col,
                kind: cell.kind,
            })
        };

        let nodes = grid
            .row_slices()
            .map(|row| {
                row.iter()
                    .map(|cell| WireNode {
                        row: cell.row,
                        col: cell.col,
                        kind: cell.kind,
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            grid: WireGrid {
                rows: grid.rows(),
                cols: grid.cols(),
                nodes,
            },
            start: wire(start)?,
            end: wire(end)?,
            config: config.clone(),
        })
    }
}

/// Body returned by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub steps: Vec<AlgorithmStep>,
    #[serde(default)]
    pub path_found: bool,
}

/// Anything that can turn a grid snapshot into a trace
pub trait Solver: Send + Sync {
    fn solve(&self, request: &SolveRequest) -> Result<SolveResponse>;

    /// Short label for the status line
    fn describe(&self) -> String;
}

/// Talks to the trace backend over HTTP
#[derive(Debug)]
pub struct HttpSolver {
    client: Client,
    endpoint: String,
}

impl HttpSolver {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::solve_failed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: solve_endpoint(base_url),
        })
    }
}

fn solve_endpoint(base_url: &str) -> String {
    format!("{}/solve", base_url.trim_end_matches('/'))
}

impl Solver for HttpSolver {
    fn solve(&self, request: &SolveRequest) -> Result<SolveResponse> {
        debug!(endpoint = %self.endpoint, "posting solve request");
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| AppError::solve_failed(format!("could not reach {}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::solve_failed(format!("backend returned {status}")));
        }

        response
            .json::<SolveResponse>()
            .map_err(|e| AppError::solve_failed(format!("malformed response: {e}")))
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}

/// Replays a recorded response from disk instead of calling the backend
#[derive(Debug, Clone)]
pub struct TraceFileSolver {
    path: PathBuf,
}

impl TraceFileSolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Solver for TraceFileSolver {
    fn solve(&self, _request: &SolveRequest) -> Result<SolveResponse> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            AppError::solve_failed(format!("failed to read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            AppError::solve_failed(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    fn describe(&self) -> String {
        format!("file: {}", self.path.display())
    }
}

/// Result of one dispatched request, tagged with its generation
#[derive(Debug)]
pub struct SolveOutcome {
    pub generation: u64,
    pub result: Result<SolveResponse>,
}

/// Runs each solve on its own thread so the UI loop never blocks
pub struct SolveWorker {
    solver: Arc<dyn Solver>,
    tx: Sender<SolveOutcome>,
    rx: Receiver<SolveOutcome>,
}

impl SolveWorker {
    pub fn new(solver: Arc<dyn Solver>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { solver, tx, rx }
    }

    pub fn describe(&self) -> String {
        self.solver.describe()
    }

    /// Route later requests to `solver`. Threads already running keep the old one.
    pub fn set_solver(&mut self, solver: Arc<dyn Solver>) {
        debug!(solver = %solver.describe(), "solver replaced");
        self.solver = solver;
    }

    pub fn dispatch(&self, ticket: FetchTicket) {
        let solver = Arc::clone(&self.solver);
        let tx = self.tx.clone();
        debug!(generation = ticket.generation, "dispatching solve request");
        thread::spawn(move || {
            let result = solver.solve(&ticket.request);
            if tx
                .send(SolveOutcome {
                    generation: ticket.generation,
                    result,
                })
                .is_err()
            {
                warn!(generation = ticket.generation, "solve finished after shutdown");
            }
        });
    }

    /// Collect every response that has arrived so far
    pub fn drain(&self) -> Vec<SolveOutcome> {
        self.rx.try_iter().collect()
    }

    #[cfg(test)]
    pub fn wait(&self, timeout: Duration) -> Option<SolveOutcome> {
        self.rx.recv_timeout(timeout).ok()
    }
}
