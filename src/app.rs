use crate::config::AppConfig;
use crate::error::Result;
use crate::gate;
use crate::grid::{Coord, Grid};
use crate::playback::{FetchTicket, PlaybackController};
use crate::solver::{HttpSolver, SolveWorker, Solver};
use rand::rngs::ThreadRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

const SPEED_STEP: u8 = 5;
/// Chance that scatter turns an empty cell into a wall
const WALL_DENSITY: f64 = 0.25;

/// Focus state for parameter editing in the sidebar
/// Alphabetically ordered for consistent UI display
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    Heuristic,
    Speed,
    TieBreaker,
    Weight,
    // Controls box (not a param)
    Controls,
}

impl Focus {
    /// Tab cycles through parameters in alphabetical order
    pub fn next(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Heuristic,
            Focus::Heuristic => Focus::Speed,
            Focus::Speed => Focus::TieBreaker,
            Focus::TieBreaker => Focus::Weight,
            Focus::Weight => Focus::Heuristic,
        }
    }

    /// Shift+Tab cycles through parameters in reverse alphabetical order
    pub fn prev(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Weight,
            Focus::Heuristic => Focus::Weight,
            Focus::Speed => Focus::Heuristic,
            Focus::TieBreaker => Focus::Speed,
            Focus::Weight => Focus::TieBreaker,
        }
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }
}

/// Main application state
pub struct App {
    pub controller: PlaybackController,
    worker: SolveWorker,
    pub backend_url: String,
    pub config_path: Option<PathBuf>,
    pub focus: Focus,
    pub show_help: bool,
    pub help_scroll: u16,
    /// One-line feedback for local actions (config saved, ...)
    pub status: Option<String>,
    /// Set when talking to an HTTP backend; a loaded config may then move it
    backend_timeout: Option<Duration>,
    last_drag: Option<Coord>,
    rng: ThreadRng,
}

impl App {
    pub fn new(
        config: &AppConfig,
        solver: Arc<dyn Solver>,
        config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let grid = Grid::new(config.rows, config.cols, config.start, config.end)?;
        let mut controller =
            PlaybackController::new(grid, config.start, config.end, config.solver.clone())?;
        controller.set_speed(config.speed, Instant::now());

        Ok(Self {
            controller,
            worker: SolveWorker::new(solver),
            backend_url: config.backend_url.clone(),
            config_path,
            focus: Focus::Controls,
            show_help: false,
            help_scroll: 0,
            status: None,
            backend_timeout: None,
            last_drag: None,
            rng: rand::thread_rng(),
        })
    }

    /// Let `load_config` rebuild the HTTP solver when the backend URL changes
    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = Some(timeout);
        self
    }

    pub fn solver_label(&self) -> String {
        self.worker.describe()
    }

    /// Deliver finished solves, then let the playback timer catch up
    pub fn tick(&mut self) -> Result<()> {
        let now = Instant::now();
        for outcome in self.worker.drain() {
            self.controller
                .complete_fetch(outcome.generation, outcome.result, now)?;
        }
        self.controller.tick(now)
    }

    fn dispatch(&mut self, ticket: Option<FetchTicket>) {
        if let Some(ticket) = ticket {
            self.status = None;
            self.worker.dispatch(ticket);
        }
    }

    // === Playback ===

    /// Space: run, or pause when running
    pub fn toggle_run(&mut self) -> Result<()> {
        let ticket = self.controller.toggle_run(Instant::now())?;
        self.dispatch(ticket);
        Ok(())
    }

    pub fn step(&mut self) -> Result<()> {
        let ticket = self.controller.step(Instant::now())?;
        self.dispatch(ticket);
        Ok(())
    }

    pub fn reset(&mut self, clear_walls: bool) -> Result<()> {
        self.status = None;
        self.controller.reset(clear_walls)
    }

    pub fn increase_speed(&mut self) {
        let speed = self.controller.speed().saturating_add(SPEED_STEP);
        self.controller.set_speed(speed, Instant::now());
    }

    pub fn decrease_speed(&mut self) {
        let speed = self.controller.speed().saturating_sub(SPEED_STEP);
        self.controller.set_speed(speed, Instant::now());
    }

    // === Grid editing ===

    pub fn press_cell(&mut self, coord: Coord) -> Result<()> {
        self.last_drag = Some(coord);
        gate::on_cell_press(&mut self.controller, coord)?;
        Ok(())
    }

    /// Drag events repeat while the pointer stays inside a cell; only entering
    /// a new cell paints.
    pub fn drag_cell(&mut self, coord: Coord) -> Result<()> {
        if self.last_drag == Some(coord) {
            return Ok(());
        }
        self.last_drag = Some(coord);
        gate::on_cell_drag_enter(&mut self.controller, coord)?;
        Ok(())
    }

    pub fn release_pointer(&mut self) {
        self.last_drag = None;
    }

    pub fn place_start(&mut self, coord: Coord) -> Result<()> {
        if gate::on_place_start(&mut self.controller, coord)? {
            info!(%coord, "start moved");
        }
        Ok(())
    }

    pub fn place_end(&mut self, coord: Coord) -> Result<()> {
        if gate::on_place_end(&mut self.controller, coord)? {
            info!(%coord, "end moved");
        }
        Ok(())
    }

    pub fn scatter_walls(&mut self) -> Result<()> {
        gate::on_scatter_walls(&mut self.controller, WALL_DENSITY, &mut self.rng)?;
        Ok(())
    }

    // === Parameters ===

    pub fn adjust_focused_up(&mut self) {
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::Heuristic => {
                let config = self.controller.config_mut();
                config.heuristic = config.heuristic.next();
            }
            Focus::Speed => self.increase_speed(),
            Focus::TieBreaker => {
                let config = self.controller.config_mut();
                config.tie_breaker = config.tie_breaker.next();
            }
            Focus::Weight => self.controller.config_mut().adjust_weight(0.1),
        }
    }

    pub fn adjust_focused_down(&mut self) {
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::Heuristic => {
                let config = self.controller.config_mut();
                config.heuristic = config.heuristic.prev();
            }
            Focus::Speed => self.decrease_speed(),
            Focus::TieBreaker => {
                let config = self.controller.config_mut();
                config.tie_breaker = config.tie_breaker.prev();
            }
            Focus::Weight => self.controller.config_mut().adjust_weight(-0.1),
        }
    }

    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    // === Help overlay ===

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Dismiss the topmost message: notification first, then local status
    pub fn dismiss_message(&mut self) {
        if self.controller.notification().is_some() {
            self.controller.dismiss_notification();
        } else {
            self.status = None;
        }
    }

    // === Config ===

    pub fn to_config(&self) -> AppConfig {
        let grid = self.controller.grid();
        AppConfig {
            rows: grid.rows(),
            cols: grid.cols(),
            start: self.controller.start(),
            end: self.controller.end(),
            speed: self.controller.speed(),
            backend_url: self.backend_url.clone(),
            solver: self.controller.config().clone(),
            ..AppConfig::default()
        }
    }

    /// Write the current configuration; failures are reported, not fatal
    pub fn save_config(&mut self) {
        let Some(path) = self.config_path.clone().or_else(AppConfig::default_path) else {
            self.status = Some("no config directory available".to_string());
            return;
        };
        match self.to_config().save_to_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "config saved");
                self.status = Some(format!("saved {}", path.display()));
            }
            Err(err) => {
                error!(error = %err, "config save failed");
                self.status = Some(format!("save failed: {err}"));
            }
        }
    }

    /// Re-read the config file and rebuild the grid from it. Refused while
    /// playback is fetching or running; a bad file only sets the status line.
    pub fn load_config(&mut self) -> Result<()> {
        if self.controller.edits_locked() {
            self.status = Some("pause playback to load config".to_string());
            return Ok(());
        }
        let Some(path) = self.config_path.clone().or_else(AppConfig::default_path) else {
            self.status = Some("no config directory available".to_string());
            return Ok(());
        };
        let config = match AppConfig::load_from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                error!(error = %err, "config load failed");
                self.status = Some(format!("load failed: {err}"));
                return Ok(());
            }
        };

        self.controller
            .rebuild_grid(config.rows, config.cols, config.start, config.end)?;
        *self.controller.config_mut() = config.solver.clone();
        self.controller.set_speed(config.speed, Instant::now());

        // The rebuild above orphaned any in-flight request, so swapping is safe.
        if let Some(timeout) = self.backend_timeout {
            if config.backend_url != self.backend_url {
                match HttpSolver::new(&config.backend_url, timeout) {
                    Ok(solver) => self.worker.set_solver(Arc::new(solver)),
                    Err(err) => {
                        error!(error = %err, "backend switch failed");
                        self.status = Some(format!("backend unchanged: {err}"));
                        return Ok(());
                    }
                }
            }
        }
        self.backend_url = config.backend_url;
        info!(path = %path.display(), "config loaded");
        self.status = Some(format!("loaded {}", path.display()));
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }
}
