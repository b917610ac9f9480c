//! Trace playback state machine.
//!
//! The controller owns the one authoritative [`Grid`] and the [`TraceStore`].
//! Every change to either goes through here (or through the interaction gate,
//! which calls back into here), and the grid is always swapped for a fresh value.
//!
//! Fetching is split in two: `run`/`step` hand back a [`FetchTicket`] that the
//! caller executes however it likes, and the result comes back through
//! `complete_fetch`. Each ticket carries a generation; a result whose generation
//! is no longer pending is dropped.
//!
//! Auto-advance is a passive deadline checked by `tick(now)`, so there is never
//! more than one armed timer and nothing can fire after `shutdown`.

use crate::error::Result;
use crate::grid::{Coord, Grid};
use crate::projector;
use crate::settings::SolverConfig;
use crate::solver::{SolveRequest, SolveResponse};
use crate::trace::{AlgorithmStep, TraceStore};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const MIN_SPEED: u8 = 1;
pub const MAX_SPEED: u8 = 100;
pub const DEFAULT_SPEED: u8 = 50;

/// Auto-advance period: `10000 / (speed * 10)` milliseconds
pub fn interval_for_speed(speed: u8) -> Duration {
    let speed = u64::from(speed.clamp(MIN_SPEED, MAX_SPEED));
    Duration::from_micros(10_000_000 / (speed * 10))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No trace, nothing running
    #[default]
    Idle,
    /// Solve request in flight
    Fetching,
    /// Timer advancing automatically
    Playing,
    /// Cursor fixed, manual stepping allowed
    Paused,
    /// Last step shown; reset (or run) to start over
    Finished,
}

impl Phase {
    pub fn name(&self) -> &str {
        match self {
            Phase::Idle => "IDLE",
            Phase::Fetching => "FETCHING",
            Phase::Playing => "PLAYING",
            Phase::Paused => "PAUSED",
            Phase::Finished => "FINISHED",
        }
    }
}

/// Snapshot of playback flags for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_running: bool,
    pub is_finished: bool,
    /// Steps replayed so far, in `0..=trace_len`
    pub step_index: usize,
    pub trace_len: usize,
    pub speed: u8,
}

/// A solve request the caller must execute and report back
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub generation: u64,
    pub request: SolveRequest,
}

#[derive(Debug, Clone, Copy)]
struct PendingFetch {
    generation: u64,
    /// Start playing when the trace arrives (Run) rather than pausing (Step)
    autoplay: bool,
}

#[derive(Debug, Clone, Copy)]
struct StepTimer {
    period: Duration,
    next_due: Instant,
}

pub struct PlaybackController {
    grid: Grid,
    start: Coord,
    end: Coord,
    config: SolverConfig,
    trace: TraceStore,
    phase: Phase,
    speed: u8,
    timer: Option<StepTimer>,
    generation: u64,
    pending: Option<PendingFetch>,
    path_found: Option<bool>,
    notification: Option<String>,
}

impl PlaybackController {
    pub fn new(grid: Grid, start: Coord, end: Coord, config: SolverConfig) -> Result<Self> {
        let grid = grid.relocate_endpoints(start, end)?;
        Ok(Self {
            grid,
            start,
            end,
            config,
            trace: TraceStore::new(),
            phase: Phase::Idle,
            speed: DEFAULT_SPEED,
            timer: None,
            generation: 0,
            pending: None,
            path_found: None,
            notification: None,
        })
    }

    // === Accessors ===

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn end(&self) -> Coord {
        self.end
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SolverConfig {
        &mut self.config
    }

    pub fn trace(&self) -> &TraceStore {
        &self.trace
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn path_found(&self) -> Option<bool> {
        self.path_found
    }

    pub fn notification(&self) -> Option<&str> {
        self.notification.as_deref()
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    /// Period of the armed auto-advance timer, if any
    pub fn timer_period(&self) -> Option<Duration> {
        self.timer.map(|timer| timer.period)
    }

    /// The step on display; `None` until a trace has been fetched
    pub fn current_step(&self) -> Option<&AlgorithmStep> {
        if self.trace.is_empty() {
            None
        } else {
            self.trace.step_at(self.trace.cursor()).ok()
        }
    }

    pub fn state(&self) -> PlaybackState {
        let replayed = if self.trace.is_empty() {
            0
        } else {
            self.trace.cursor() + 1
        };
        PlaybackState {
            is_running: self.phase == Phase::Playing,
            is_finished: self.phase == Phase::Finished,
            step_index: replayed,
            trace_len: self.trace.len(),
            speed: self.speed,
        }
    }

    /// Wall edits are refused while a fetch is in flight or the timer is running
    pub fn edits_locked(&self) -> bool {
        matches!(self.phase, Phase::Fetching | Phase::Playing)
    }

    // === Transitions ===

    /// Start or resume playback. Returns a ticket when a trace must be fetched.
    pub fn run(&mut self, now: Instant) -> Result<Option<FetchTicket>> {
        match self.phase {
            Phase::Playing => Ok(None),
            Phase::Fetching => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.autoplay = true;
                }
                Ok(None)
            }
            Phase::Finished => {
                self.reset(false)?;
                self.begin_fetch(true).map(Some)
            }
            Phase::Idle => self.begin_fetch(true).map(Some),
            Phase::Paused => {
                if self.trace.is_empty() {
                    return self.begin_fetch(true).map(Some);
                }
                info!(cursor = self.trace.cursor(), "resuming playback");
                self.phase = Phase::Playing;
                self.arm_timer(now);
                Ok(None)
            }
        }
    }

    /// Stop the timer, keeping cursor and grid as they are
    pub fn pause(&mut self) {
        match self.phase {
            Phase::Playing => {
                self.disarm_timer();
                self.phase = Phase::Paused;
                info!(cursor = self.trace.cursor(), "paused");
            }
            Phase::Fetching => {
                // The trace will arrive paused instead of playing.
                if let Some(pending) = self.pending.as_mut() {
                    pending.autoplay = false;
                }
            }
            _ => {}
        }
    }

    pub fn toggle_run(&mut self, now: Instant) -> Result<Option<FetchTicket>> {
        let running = match self.phase {
            Phase::Playing => true,
            Phase::Fetching => self.pending.is_some_and(|pending| pending.autoplay),
            _ => false,
        };
        if running {
            self.pause();
            Ok(None)
        } else {
            self.run(now)
        }
    }

    /// Advance exactly one step. With no trace yet this starts a fetch that
    /// arrives paused: stepping never sets the running flag by itself.
    pub fn step(&mut self, now: Instant) -> Result<Option<FetchTicket>> {
        match self.phase {
            Phase::Fetching | Phase::Finished => Ok(None),
            Phase::Idle | Phase::Playing | Phase::Paused if self.trace.is_empty() => {
                self.begin_fetch(false).map(Some)
            }
            Phase::Idle | Phase::Playing | Phase::Paused => {
                self.advance()?;
                // Restart the period so the manual step is not followed by an
                // immediate timer step.
                if self.phase == Phase::Playing {
                    self.arm_timer(now);
                }
                Ok(None)
            }
        }
    }

    /// Back to a clean grid with no trace. Any in-flight fetch is orphaned.
    pub fn reset(&mut self, clear_walls: bool) -> Result<()> {
        self.disarm_timer();
        if let Some(pending) = self.pending.take() {
            debug!(generation = pending.generation, "abandoning in-flight fetch");
        }
        self.trace.clear();
        self.phase = Phase::Idle;
        self.path_found = None;
        self.notification = None;
        self.grid = self.grid.reset(self.start, self.end, clear_walls)?;
        info!(clear_walls, "reset");
        Ok(())
    }

    /// Auto-advance: apply every step whose deadline has passed.
    ///
    /// After a stall (slow frame, suspended terminal) the missed steps are all
    /// projected in order within this one call. Nothing is skipped, but several
    /// steps can appear in the same frame.
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        while self.phase == Phase::Playing {
            let Some(timer) = self.timer.as_mut() else {
                break;
            };
            if now < timer.next_due {
                break;
            }
            timer.next_due += timer.period;
            self.advance()?;
        }
        Ok(())
    }

    pub fn set_speed(&mut self, speed: u8, now: Instant) {
        let speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        if speed == self.speed {
            return;
        }
        self.speed = speed;
        if self.phase == Phase::Playing {
            self.arm_timer(now);
        }
    }

    /// Deliver the result for a ticket handed out earlier
    pub fn complete_fetch(
        &mut self,
        generation: u64,
        result: Result<SolveResponse>,
        now: Instant,
    ) -> Result<()> {
        let pending = match self.pending {
            Some(pending) if pending.generation == generation && self.phase == Phase::Fetching => {
                pending
            }
            _ => {
                debug!(generation, "discarding stale solve response");
                return Ok(());
            }
        };
        self.pending = None;

        let response = match result {
            Ok(response) => response,
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, "solve failed");
                self.phase = Phase::Idle;
                self.notification = Some(err.to_string());
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        info!(
            steps = response.steps.len(),
            path_found = response.path_found,
            "trace received"
        );

        if response.steps.is_empty() {
            self.phase = Phase::Idle;
            self.notification = Some("solver returned an empty trace".to_string());
            return Ok(());
        }

        // Stale marks from an earlier run would mix with the new trace.
        self.grid = self.grid.reset(self.start, self.end, false)?;
        self.path_found = Some(response.path_found);
        self.trace.set_trace(response.steps);
        debug!(revision = self.trace.revision(), "trace stored");
        self.project_cursor()?;

        if self.trace.is_last(0) {
            self.finish();
        } else if pending.autoplay {
            self.phase = Phase::Playing;
            self.arm_timer(now);
        } else {
            self.phase = Phase::Paused;
        }
        Ok(())
    }

    /// Dispose: no timer may fire and no pending fetch may land afterwards
    pub fn shutdown(&mut self) {
        self.disarm_timer();
        self.pending = None;
        if self.phase == Phase::Playing || self.phase == Phase::Fetching {
            self.phase = Phase::Paused;
        }
    }

    // === Grid edits (reached through the interaction gate) ===

    pub(crate) fn edit_grid<F>(&mut self, edit: F) -> Result<bool>
    where
        F: FnOnce(&Grid) -> Result<Grid>,
    {
        let next = edit(&self.grid)?;
        let changed = next != self.grid;
        self.grid = next;
        Ok(changed)
    }

    /// Move start/end; drops any trace since it no longer matches the grid
    pub fn set_endpoints(&mut self, start: Coord, end: Coord) -> Result<()> {
        let relocated = self.grid.relocate_endpoints(start, end)?;
        self.start = start;
        self.end = end;
        self.grid = relocated;
        self.reset(false)
    }

    /// Replace the grid wholesale (resize / config load)
    pub fn rebuild_grid(&mut self, rows: usize, cols: usize, start: Coord, end: Coord) -> Result<()> {
        let grid = Grid::new(rows, cols, start, end)?;
        self.start = start;
        self.end = end;
        self.grid = grid;
        self.reset(true)
    }

    // === Internals ===

    fn begin_fetch(&mut self, autoplay: bool) -> Result<FetchTicket> {
        let request = SolveRequest::new(&self.grid, self.start, self.end, &self.config)?;
        self.disarm_timer();
        self.generation += 1;
        self.pending = Some(PendingFetch {
            generation: self.generation,
            autoplay,
        });
        self.phase = Phase::Fetching;
        self.notification = None;
        info!(generation = self.generation, autoplay, "requesting trace");
        Ok(FetchTicket {
            generation: self.generation,
            request,
        })
    }

    fn advance(&mut self) -> Result<()> {
        let cursor = self.trace.cursor();
        if self.trace.is_last(cursor) {
            self.finish();
            return Ok(());
        }
        self.trace.set_cursor(cursor + 1)?;
        self.project_cursor()?;
        if self.trace.is_last(cursor + 1) {
            self.finish();
        }
        Ok(())
    }

    fn project_cursor(&mut self) -> Result<()> {
        let step = self.trace.step_at(self.trace.cursor())?;
        self.grid = projector::project(&self.grid, step);
        Ok(())
    }

    fn finish(&mut self) {
        self.disarm_timer();
        self.phase = Phase::Finished;
        info!(steps = self.trace.len(), "playback finished");
    }

    fn arm_timer(&mut self, now: Instant) {
        self.disarm_timer();
        let period = interval_for_speed(self.speed);
        self.timer = Some(StepTimer {
            period,
            next_due: now + period,
        });
        debug!(?period, "timer armed");
    }

    fn disarm_timer(&mut self) {
        if self.timer.take().is_some() {
            debug!("timer disarmed");
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::grid::CellKind;
    use crate::trace::{NodeRef, StepVariables, TARGET_REACHED};

    const START: Coord = Coord::new(0, 0);
    const END: Coord = Coord::new(2, 2);

    fn controller() -> PlaybackController {
        let grid = Grid::new(3, 3, START, END).unwrap();
        PlaybackController::new(grid, START, END, SolverConfig::default()).unwrap()
    }

    fn visit(row: usize, col: usize) -> AlgorithmStep {
        AlgorithmStep {
            code_line: 2,
            explanation: format!("Popped node ({row}, {col}) with lowest f-score."),
            variables: StepVariables {
                current: Some(NodeRef {
                    row,
                    col,
                    kind: CellKind::Empty,
                    f_cost: None,
                }),
                ..Default::default()
            },
        }
    }

    /// (0,0) -> (0,1) -> (1,2) -> (2,2), final step reaches the target
    fn four_step_trace() -> SolveResponse {
        let mut steps = vec![visit(0, 0), visit(0, 1), visit(1, 2), visit(2, 2)];
        steps[3].code_line = 3;
        steps[3].variables.message = Some(TARGET_REACHED.to_string());
        SolveResponse {
            steps,
            path_found: true,
        }
    }

    fn fetched(c: &mut PlaybackController, ticket: Option<FetchTicket>, now: Instant) {
        let ticket = ticket.expect("expected a fetch ticket");
        c.complete_fetch(ticket.generation, Ok(four_step_trace()), now)
            .unwrap();
    }

    fn visited(c: &PlaybackController, row: usize, col: usize) -> bool {
        c.grid().get(Coord::new(row, col)).unwrap().visited
    }

    #[test]
    fn test_interval_inverse_to_speed() {
        assert_eq!(interval_for_speed(1), Duration::from_millis(1000));
        assert_eq!(interval_for_speed(50), Duration::from_millis(20));
        assert_eq!(interval_for_speed(100), Duration::from_millis(10));
        // Out-of-range speeds are clamped
        assert_eq!(interval_for_speed(0), interval_for_speed(1));
        assert_eq!(interval_for_speed(255), interval_for_speed(100));
    }

    #[test]
    fn test_run_fetches_then_plays() {
        let now = Instant::now();
        let mut c = controller();
        let ticket = c.run(now).unwrap();
        assert_eq!(c.phase(), Phase::Fetching);
        assert!(c.edits_locked());

        fetched(&mut c, ticket, now);
        assert_eq!(c.phase(), Phase::Playing);
        assert_eq!(c.trace().cursor(), 0);
        assert!(visited(&c, 0, 0));
        assert_eq!(c.timer_period(), Some(interval_for_speed(DEFAULT_SPEED)));
        assert_eq!(c.path_found(), Some(true));
    }

    #[test]
    fn test_run_then_three_steps_finishes() {
        let now = Instant::now();
        let mut c = controller();
        c.edit_grid(|g| g.paint_wall(Coord::new(1, 1))).unwrap();

        let ticket = c.run(now).unwrap();
        fetched(&mut c, ticket, now);
        for _ in 0..3 {
            assert!(c.step(now).unwrap().is_none());
        }

        assert_eq!(c.trace().cursor(), 3);
        assert_eq!(c.phase(), Phase::Finished);
        assert!(c.timer_period().is_none());
        for (row, col) in [(0, 0), (0, 1), (1, 2), (2, 2)] {
            assert!(visited(&c, row, col), "({row}, {col}) not visited");
        }
        assert!(c.current_step().unwrap().reached_target());
        assert_eq!(
            c.grid().get(Coord::new(1, 1)).unwrap().kind,
            CellKind::Wall
        );
    }

    #[test]
    fn test_stepping_through_whole_trace_from_idle() {
        let now = Instant::now();
        let mut c = controller();
        let response = four_step_trace();
        let len = response.steps.len();

        // The first step call fetches; the trace arrives paused with step 0 shown.
        let ticket = c.step(now).unwrap().unwrap();
        c.complete_fetch(ticket.generation, Ok(response.clone()), now)
            .unwrap();
        assert_eq!(c.phase(), Phase::Paused);
        assert!(!c.state().is_running);

        let mut expected = Grid::new(3, 3, START, END).unwrap();
        expected = projector::project(&expected, &response.steps[0]);
        assert_eq!(c.grid(), &expected);

        for index in 1..len {
            c.step(now).unwrap();
            assert_eq!(c.trace().cursor(), index);
            expected = projector::project(&expected, &response.steps[index]);
            assert_eq!(c.grid(), &expected);
        }

        let state = c.state();
        assert!(state.is_finished);
        assert!(!state.is_running);
        assert_eq!(state.step_index, len);
        assert_eq!(state.trace_len, len);
    }

    #[test]
    fn test_step_fetch_does_not_set_running() {
        let now = Instant::now();
        let mut c = controller();
        let ticket = c.step(now).unwrap();
        assert!(ticket.is_some());
        assert_eq!(c.phase(), Phase::Fetching);
        assert!(!c.state().is_running);

        // A second step while fetching is ignored.
        assert!(c.step(now).unwrap().is_none());

        fetched(&mut c, ticket, now);
        assert_eq!(c.phase(), Phase::Paused);
        assert!(c.timer_period().is_none());
    }

    #[test]
    fn test_run_during_step_fetch_upgrades_to_play() {
        let now = Instant::now();
        let mut c = controller();
        let ticket = c.step(now).unwrap();
        assert!(c.run(now).unwrap().is_none());
        fetched(&mut c, ticket, now);
        assert_eq!(c.phase(), Phase::Playing);
    }

    #[test]
    fn test_pause_during_fetch_arrives_paused() {
        let now = Instant::now();
        let mut c = controller();
        let ticket = c.run(now).unwrap();
        c.pause();
        fetched(&mut c, ticket, now);
        assert_eq!(c.phase(), Phase::Paused);
    }

    #[test]
    fn test_timer_advances_one_step_per_period() {
        let t0 = Instant::now();
        let mut c = controller();
        c.set_speed(10, t0);
        let period = interval_for_speed(10);
        let ticket = c.run(t0).unwrap();
        fetched(&mut c, ticket, t0);

        c.tick(t0 + period / 2).unwrap();
        assert_eq!(c.trace().cursor(), 0);

        c.tick(t0 + period).unwrap();
        assert_eq!(c.trace().cursor(), 1);

        // A late tick catches up on every missed deadline.
        c.tick(t0 + period * 3).unwrap();
        assert_eq!(c.trace().cursor(), 3);
        assert_eq!(c.phase(), Phase::Finished);
        assert!(c.timer_period().is_none());

        c.tick(t0 + period * 10).unwrap();
        assert_eq!(c.trace().cursor(), 3);
    }

    #[test]
    fn test_stalled_tick_projects_each_missed_step() {
        let t0 = Instant::now();
        let mut c = controller();
        let period = interval_for_speed(DEFAULT_SPEED);
        let ticket = c.run(t0).unwrap();
        fetched(&mut c, ticket, t0);

        // Two deadlines missed: both steps land now, none skipped
        c.tick(t0 + period * 2).unwrap();
        assert_eq!(c.trace().cursor(), 2);
        assert_eq!(c.phase(), Phase::Playing);
        assert!(visited(&c, 0, 0));
        assert!(visited(&c, 0, 1));
        assert!(visited(&c, 1, 2));
        assert!(!visited(&c, 2, 2));

        // Next deadline stays on the original schedule
        c.tick(t0 + period * 2 + period / 2).unwrap();
        assert_eq!(c.trace().cursor(), 2);
        c.tick(t0 + period * 3).unwrap();
        assert_eq!(c.phase(), Phase::Finished);
        assert!(visited(&c, 2, 2));
    }

    #[test]
    fn test_pause_then_run_resumes_same_cursor() {
        let t0 = Instant::now();
        let mut c = controller();
        let period = interval_for_speed(DEFAULT_SPEED);
        let ticket = c.run(t0).unwrap();
        fetched(&mut c, ticket, t0);
        c.tick(t0 + period).unwrap();
        assert_eq!(c.trace().cursor(), 1);

        c.pause();
        assert_eq!(c.phase(), Phase::Paused);
        assert!(c.timer_period().is_none());
        let grid_at_pause = c.grid().clone();

        // Time passing while paused does nothing.
        c.tick(t0 + period * 50).unwrap();
        assert_eq!(c.trace().cursor(), 1);
        assert_eq!(c.grid(), &grid_at_pause);

        let t1 = t0 + period * 60;
        assert!(c.run(t1).unwrap().is_none(), "resume must not refetch");
        assert_eq!(c.phase(), Phase::Playing);
        c.tick(t1 + period).unwrap();
        assert_eq!(c.trace().cursor(), 2);
    }

    #[test]
    fn test_speed_change_rearms_timer() {
        let t0 = Instant::now();
        let mut c = controller();
        let ticket = c.run(t0).unwrap();
        fetched(&mut c, ticket, t0);

        c.set_speed(1, t0);
        assert_eq!(c.timer_period(), Some(Duration::from_millis(1000)));
        // The old, faster deadline no longer applies.
        c.tick(t0 + interval_for_speed(DEFAULT_SPEED)).unwrap();
        assert_eq!(c.trace().cursor(), 0);

        c.set_speed(250, t0);
        assert_eq!(c.speed(), MAX_SPEED);
    }

    #[test]
    fn test_speed_change_while_paused_keeps_timer_off() {
        let now = Instant::now();
        let mut c = controller();
        c.set_speed(80, now);
        assert!(c.timer_period().is_none());
        assert_eq!(c.state().speed, 80);
    }

    #[test]
    fn test_reset_from_any_phase() {
        let now = Instant::now();
        let mut c = controller();
        for coord in [(0, 1), (0, 2), (1, 0), (1, 1), (2, 0)] {
            c.edit_grid(|g| g.paint_wall(Coord::new(coord.0, coord.1)))
                .unwrap();
        }
        let ticket = c.step(now).unwrap();
        fetched(&mut c, ticket, now);
        c.step(now).unwrap();
        c.step(now).unwrap();
        assert_eq!(c.state().step_index, 3);

        c.reset(true).unwrap();
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.trace().cursor(), 0);
        assert!(c.trace().is_empty());
        assert!(c.current_step().is_none());
        assert!(c.timer_period().is_none());
        assert_eq!(c.grid(), &Grid::new(3, 3, START, END).unwrap());
    }

    #[test]
    fn test_reset_keeping_walls() {
        let now = Instant::now();
        let mut c = controller();
        c.edit_grid(|g| g.toggle_wall(Coord::new(1, 1))).unwrap();
        let ticket = c.run(now).unwrap();
        fetched(&mut c, ticket, now);

        c.reset(false).unwrap();
        let expected = Grid::new(3, 3, START, END)
            .unwrap()
            .toggle_wall(Coord::new(1, 1))
            .unwrap();
        assert_eq!(c.grid(), &expected);
    }

    #[test]
    fn test_stale_response_after_reset_is_ignored() {
        let now = Instant::now();
        let mut c = controller();
        let ticket = c.run(now).unwrap().unwrap();
        c.reset(false).unwrap();

        c.complete_fetch(ticket.generation, Ok(four_step_trace()), now)
            .unwrap();
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.trace().is_empty());
        assert!(!visited(&c, 0, 0));
    }

    #[test]
    fn test_only_latest_generation_lands() {
        let now = Instant::now();
        let mut c = controller();
        let first = c.run(now).unwrap().unwrap();
        c.reset(false).unwrap();
        let second = c.run(now).unwrap().unwrap();
        assert!(second.generation > first.generation);

        c.complete_fetch(first.generation, Ok(four_step_trace()), now)
            .unwrap();
        assert_eq!(c.phase(), Phase::Fetching);

        c.complete_fetch(second.generation, Ok(four_step_trace()), now)
            .unwrap();
        assert_eq!(c.phase(), Phase::Playing);
    }

    #[test]
    fn test_solve_failure_returns_to_idle_with_notice() {
        let now = Instant::now();
        let mut c = controller();
        c.edit_grid(|g| g.toggle_wall(Coord::new(1, 1))).unwrap();
        let grid_before = c.grid().clone();

        let ticket = c.run(now).unwrap().unwrap();
        c.complete_fetch(
            ticket.generation,
            Err(AppError::solve_failed("connection refused")),
            now,
        )
        .unwrap();

        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.notification().unwrap().contains("connection refused"));
        assert_eq!(c.grid(), &grid_before);
        assert!(!c.edits_locked());

        // Retry clears the notice.
        c.run(now).unwrap();
        assert!(c.notification().is_none());
    }

    #[test]
    fn test_internal_errors_propagate_from_fetch() {
        let now = Instant::now();
        let mut c = controller();
        let ticket = c.run(now).unwrap().unwrap();
        let result = c.complete_fetch(
            ticket.generation,
            Err(AppError::IndexOutOfRange { index: 1, len: 0 }),
            now,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_trace_stays_idle() {
        let now = Instant::now();
        let mut c = controller();
        let ticket = c.run(now).unwrap().unwrap();
        c.complete_fetch(ticket.generation, Ok(SolveResponse::default()), now)
            .unwrap();
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.notification().is_some());
    }

    #[test]
    fn test_single_step_trace_finishes_on_arrival() {
        let now = Instant::now();
        let mut c = controller();
        let ticket = c.run(now).unwrap().unwrap();
        let response = SolveResponse {
            steps: vec![visit(0, 0)],
            path_found: false,
        };
        c.complete_fetch(ticket.generation, Ok(response), now)
            .unwrap();
        assert_eq!(c.phase(), Phase::Finished);
        assert_eq!(c.state().step_index, 1);
    }

    #[test]
    fn test_run_when_finished_resets_and_refetches() {
        let now = Instant::now();
        let mut c = controller();
        let ticket = c.run(now).unwrap();
        fetched(&mut c, ticket, now);
        for _ in 0..3 {
            c.step(now).unwrap();
        }
        assert_eq!(c.phase(), Phase::Finished);

        let ticket = c.run(now).unwrap();
        assert!(ticket.is_some());
        assert_eq!(c.phase(), Phase::Fetching);
        assert!(!visited(&c, 0, 1));
    }

    #[test]
    fn test_step_when_finished_is_noop() {
        let now = Instant::now();
        let mut c = controller();
        let ticket = c.run(now).unwrap();
        fetched(&mut c, ticket, now);
        for _ in 0..3 {
            c.step(now).unwrap();
        }
        let grid = c.grid().clone();
        assert!(c.step(now).unwrap().is_none());
        assert_eq!(c.grid(), &grid);
        assert_eq!(c.trace().cursor(), 3);
    }

    #[test]
    fn test_manual_step_while_playing_restarts_period() {
        let t0 = Instant::now();
        let mut c = controller();
        let period = interval_for_speed(DEFAULT_SPEED);
        let ticket = c.run(t0).unwrap();
        fetched(&mut c, ticket, t0);

        let t1 = t0 + period / 2;
        c.step(t1).unwrap();
        assert_eq!(c.trace().cursor(), 1);

        // The original deadline at t0 + period was replaced by t1 + period.
        c.tick(t0 + period).unwrap();
        assert_eq!(c.trace().cursor(), 1);
        c.tick(t1 + period).unwrap();
        assert_eq!(c.trace().cursor(), 2);
    }

    #[test]
    fn test_shutdown_disarms_everything() {
        let t0 = Instant::now();
        let mut c = controller();
        let ticket = c.run(t0).unwrap();
        fetched(&mut c, ticket, t0);
        c.shutdown();
        assert!(c.timer_period().is_none());
        c.tick(t0 + Duration::from_secs(60)).unwrap();
        assert_eq!(c.trace().cursor(), 0);
    }

    #[test]
    fn test_set_endpoints_resets_and_moves() {
        let now = Instant::now();
        let mut c = controller();
        let ticket = c.run(now).unwrap();
        fetched(&mut c, ticket, now);
        c.pause();

        c.set_endpoints(Coord::new(1, 0), Coord::new(0, 2)).unwrap();
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.trace().is_empty());
        assert_eq!(c.grid().count_kind(CellKind::Start), 1);
        assert_eq!(c.grid().count_kind(CellKind::End), 1);
        assert_eq!(
            c.grid().get(Coord::new(1, 0)).unwrap().kind,
            CellKind::Start
        );

        assert!(c.set_endpoints(Coord::new(5, 5), END).is_err());
        assert_eq!(c.start(), Coord::new(1, 0));
    }

    #[test]
    fn test_rebuild_grid_changes_dimensions() {
        let mut c = controller();
        c.rebuild_grid(4, 6, Coord::new(0, 0), Coord::new(3, 5))
            .unwrap();
        assert_eq!((c.grid().rows(), c.grid().cols()), (4, 6));
        assert_eq!(c.end(), Coord::new(3, 5));
        assert!(c.rebuild_grid(0, 6, START, END).is_err());
    }
}
