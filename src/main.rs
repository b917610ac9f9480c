mod app;
mod config;
mod error;
mod gate;
mod grid;
mod listing;
mod logging;
mod playback;
mod projector;
mod settings;
mod solver;
mod trace;
mod ui;

use app::{App, Focus};
use clap::Parser;
use config::{AppConfig, MAX_COLS, MAX_ROWS};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use grid::Coord;
use playback::{MAX_SPEED, MIN_SPEED};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use settings::{Heuristic, TieBreaker, MAX_WEIGHT, MIN_WEIGHT};
use solver::{HttpSolver, Solver, TraceFileSolver};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "astar-trace-viewer")]
#[command(about = "Step through A* search traces on an editable grid in the terminal")]
struct Args {
    // === Grid ===
    /// Grid rows (1-100)
    #[arg(long)]
    rows: Option<usize>,

    /// Grid columns (1-150)
    #[arg(long)]
    cols: Option<usize>,

    /// Start cell as "row,col"
    #[arg(long, value_parser = parse_coord)]
    start: Option<Coord>,

    /// End cell as "row,col"
    #[arg(long, value_parser = parse_coord)]
    end: Option<Coord>,

    // === Playback ===
    /// Playback speed (1-100, higher replays faster)
    #[arg(long)]
    speed: Option<u8>,

    // === Solver ===
    /// Base URL of the trace backend
    #[arg(long)]
    backend: Option<String>,

    /// Heuristic (manhattan, euclidean, diagonal)
    #[arg(long)]
    heuristic: Option<String>,

    /// Heuristic weight (1.0-5.0)
    #[arg(long)]
    weight: Option<f32>,

    /// Tie breaker (none, cross, nudged)
    #[arg(long = "tie-breaker")]
    tie_breaker: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Replay a recorded solve response instead of calling the backend
    #[arg(long = "trace-file")]
    trace_file: Option<PathBuf>,

    // === Files ===
    /// Config file to load and save (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

fn parse_coord(s: &str) -> Result<Coord, String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"row,col\", got \"{s}\""))?;
    let row = row
        .trim()
        .parse()
        .map_err(|_| format!("invalid row \"{}\"", row.trim()))?;
    let col = col
        .trim()
        .parse()
        .map_err(|_| format!("invalid column \"{}\"", col.trim()))?;
    Ok(Coord::new(row, col))
}

fn parse_heuristic(s: &str) -> Heuristic {
    match s.to_lowercase().as_str() {
        "euclidean" | "euclid" => Heuristic::Euclidean,
        "diagonal" | "octile" | "chebyshev" => Heuristic::Diagonal,
        _ => Heuristic::Manhattan,
    }
}

fn parse_tie_breaker(s: &str) -> TieBreaker {
    match s.to_lowercase().as_str() {
        "cross" | "cross-product" => TieBreaker::Cross,
        "nudged" | "nudge" => TieBreaker::Nudged,
        _ => TieBreaker::None,
    }
}

/// Explicit `--config` must load; the default file is used only if it parses
fn load_config(path: Option<&PathBuf>) -> error::Result<AppConfig> {
    if let Some(path) = path {
        return AppConfig::load_from_file(path);
    }
    match AppConfig::default_path() {
        Some(path) if path.exists() => match AppConfig::load_from_file(&path) {
            Ok(config) => Ok(config),
            Err(err) => {
                eprintln!("Ignoring {}: {}", path.display(), err);
                Ok(AppConfig::default())
            }
        },
        _ => Ok(AppConfig::default()),
    }
}

fn apply_args(config: &mut AppConfig, args: &Args) {
    if let Some(rows) = args.rows {
        config.rows = rows.clamp(1, MAX_ROWS);
    }
    if let Some(cols) = args.cols {
        config.cols = cols.clamp(1, MAX_COLS);
    }
    if let Some(start) = args.start {
        config.start = start;
    }
    if let Some(end) = args.end {
        config.end = end;
    }
    if let Some(speed) = args.speed {
        config.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
    }
    if let Some(backend) = &args.backend {
        config.backend_url = backend.trim_end_matches('/').to_string();
    }

    // Apply solver settings
    if let Some(heuristic) = &args.heuristic {
        config.solver.heuristic = parse_heuristic(heuristic);
    }
    if let Some(weight) = args.weight {
        config.solver.weight = weight.clamp(MIN_WEIGHT, MAX_WEIGHT);
    }
    if let Some(tie_breaker) = &args.tie_breaker {
        config.solver.tie_breaker = parse_tie_breaker(tie_breaker);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        logging::init(path)?;
    }

    let mut config = load_config(args.config.as_ref())?;
    apply_args(&mut config, &args);
    config.validate()?;

    let timeout = Duration::from_secs(args.timeout.max(1));
    let solver: Arc<dyn Solver> = match &args.trace_file {
        Some(path) => Arc::new(TraceFileSolver::new(path)),
        None => Arc::new(HttpSolver::new(&config.backend_url, timeout)?),
    };
    info!(solver = %solver.describe(), rows = config.rows, cols = config.cols, "starting");

    let mut app = App::new(&config, solver, args.config.clone())?;
    if args.trace_file.is_none() {
        app = app.with_backend_timeout(timeout);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, &mut app);
    app.shutdown();

    // Cleanup
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        warn!(error = %err, "exiting on error");
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    Ok(())
}

fn handle_mouse(app: &mut App, frame_area: Rect, mouse: MouseEvent) -> error::Result<()> {
    if app.show_help {
        return Ok(());
    }
    if let MouseEventKind::Up(_) = mouse.kind {
        app.release_pointer();
        return Ok(());
    }
    let Some(coord) = ui::cell_at(frame_area, app.controller.grid(), mouse.column, mouse.row)
    else {
        return Ok(());
    };
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.press_cell(coord),
        MouseEventKind::Drag(MouseButton::Left) => app.drag_cell(coord),
        MouseEventKind::Down(MouseButton::Right) => app.place_start(coord),
        MouseEventKind::Down(MouseButton::Middle) => app.place_end(coord),
        _ => Ok(()),
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> error::Result<()> {
    // Target ~60fps so the step timer stays responsive at top speed
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        // Render current state
        terminal.draw(|frame| ui::render(frame, app))?;

        // Poll for events with timeout
        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) => {
                    // Only process Press events
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    // Handle Ctrl+C
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        // System controls
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                            app.toggle_help()
                        }
                        KeyCode::Char('o') | KeyCode::Char('O') => app.save_config(),
                        KeyCode::Char('l') | KeyCode::Char('L') => app.load_config()?,

                        // Playback
                        KeyCode::Char(' ') => app.toggle_run()?,
                        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Right => app.step()?,
                        KeyCode::Char('r') | KeyCode::Char('R') => app.reset(true)?,
                        KeyCode::Char('c') | KeyCode::Char('C') => app.reset(false)?,
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            app.increase_speed();
                            app.focus = Focus::Speed;
                        }
                        KeyCode::Char('-') | KeyCode::Char('_') => {
                            app.decrease_speed();
                            app.focus = Focus::Speed;
                        }

                        // Editing
                        KeyCode::Char('x') | KeyCode::Char('X') => app.scatter_walls()?,

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Up => {
                            if app.show_help {
                                app.scroll_help_up();
                            } else if app.focus.is_param() {
                                app.adjust_focused_up();
                            }
                        }
                        KeyCode::Down => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            } else if app.focus.is_param() {
                                app.adjust_focused_down();
                            }
                        }
                        KeyCode::Char('j') | KeyCode::Char('J') => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            }
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') => {
                            if app.show_help {
                                app.scroll_help_up();
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else if app.focus.is_param() {
                                app.focus = Focus::Controls;
                            } else {
                                app.dismiss_message();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    let frame_area = Rect::new(0, 0, size.width, size.height);
                    handle_mouse(app, frame_area, mouse)?;
                }
                // Layout is recomputed every frame
                _ => {}
            }
        }

        // Deliver solver results and advance playback
        app.tick()?;
    }
}
