use crate::error::{AppError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row/column position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// What occupies a cell. Serialized with the backend's upper-case names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CellKind {
    #[default]
    Empty,
    Wall,
    Start,
    End,
}

/// One grid position plus the search state painted onto it during playback
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub kind: CellKind,
    /// Settled (closed set)
    pub visited: bool,
    /// Discovered as a neighbor but not yet settled
    pub open: bool,
    pub on_path: bool,
    pub g_cost: f64,
    pub h_cost: f64,
    pub f_cost: f64,
    /// Back-reference by coordinate, resolved through the grid on demand
    pub parent: Option<Coord>,
}

impl Cell {
    fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            kind: CellKind::Empty,
            visited: false,
            open: false,
            on_path: false,
            g_cost: f64::INFINITY,
            h_cost: f64::INFINITY,
            f_cost: f64::INFINITY,
            parent: None,
        }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }

    fn clear_search_state(&mut self) {
        self.visited = false;
        self.open = false;
        self.on_path = false;
        self.g_cost = f64::INFINITY;
        self.h_cost = f64::INFINITY;
        self.f_cost = f64::INFINITY;
        self.parent = None;
    }
}

/// Rectangular matrix of cells stored row-major.
///
/// Every editing operation borrows the grid and hands back a new value, so a
/// previous snapshot is never aliased by the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a `rows` x `cols` grid of empty cells with the two endpoints placed
    pub fn new(rows: usize, cols: usize, start: Coord, end: Coord) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(AppError::InvalidDimensions { rows, cols });
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Cell::new(row, col));
            }
        }

        let mut grid = Self { rows, cols, cells };
        grid.check_endpoints(start, end)?;
        grid.force_endpoints(start, end);
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterate the grid one row slice at a time
    pub fn row_slices(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.cols)
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    fn index(&self, coord: Coord) -> Result<usize> {
        if self.contains(coord) {
            Ok(coord.row * self.cols + coord.col)
        } else {
            Err(AppError::OutOfBounds {
                row: coord.row,
                col: coord.col,
            })
        }
    }

    pub fn get(&self, coord: Coord) -> Result<&Cell> {
        let idx = self.index(coord)?;
        Ok(&self.cells[idx])
    }

    /// Lenient lookup for coordinates that come from outside (solver payloads)
    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        self.index(coord).ok().map(|idx| &self.cells[idx])
    }

    pub(crate) fn cell_mut(&mut self, coord: Coord) -> Option<&mut Cell> {
        match self.index(coord) {
            Ok(idx) => Some(&mut self.cells[idx]),
            Err(_) => None,
        }
    }

    pub fn count_kind(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|cell| cell.kind == kind).count()
    }

    /// Copy with all search state cleared and the endpoints re-asserted.
    /// With `clear_walls`, walls become empty as well.
    pub fn reset(&self, start: Coord, end: Coord, clear_walls: bool) -> Result<Grid> {
        self.check_endpoints(start, end)?;

        let mut next = self.clone();
        for cell in &mut next.cells {
            cell.clear_search_state();
            if clear_walls && cell.kind == CellKind::Wall {
                cell.kind = CellKind::Empty;
            }
        }
        next.force_endpoints(start, end);
        Ok(next)
    }

    /// Flip Empty <-> Wall. Endpoints are left alone.
    pub fn toggle_wall(&self, coord: Coord) -> Result<Grid> {
        let idx = self.index(coord)?;
        let mut next = self.clone();
        let cell = &mut next.cells[idx];
        cell.kind = match cell.kind {
            CellKind::Empty => CellKind::Wall,
            CellKind::Wall => CellKind::Empty,
            other => other,
        };
        Ok(next)
    }

    /// Turn an empty cell into a wall; never removes one
    pub fn paint_wall(&self, coord: Coord) -> Result<Grid> {
        let idx = self.index(coord)?;
        let mut next = self.clone();
        let cell = &mut next.cells[idx];
        if cell.kind == CellKind::Empty {
            cell.kind = CellKind::Wall;
        }
        Ok(next)
    }

    /// Move the endpoints: any Start/End cell not at its new coordinate becomes
    /// empty, then the new coordinates are forced. Always leaves exactly one of each.
    pub fn relocate_endpoints(&self, start: Coord, end: Coord) -> Result<Grid> {
        self.check_endpoints(start, end)?;

        let mut next = self.clone();
        for cell in &mut next.cells {
            let here = cell.coord();
            let stale_start = cell.kind == CellKind::Start && here != start;
            let stale_end = cell.kind == CellKind::End && here != end;
            if stale_start || stale_end {
                cell.kind = CellKind::Empty;
            }
        }
        next.force_endpoints(start, end);
        Ok(next)
    }

    /// Paint walls on empty cells, each with probability `density`
    pub fn scatter_walls<R: Rng>(&self, density: f64, rng: &mut R) -> Grid {
        let density = density.clamp(0.0, 1.0);
        let mut next = self.clone();
        for cell in &mut next.cells {
            if cell.kind == CellKind::Empty && rng.gen_bool(density) {
                cell.kind = CellKind::Wall;
            }
        }
        next
    }

    fn check_endpoints(&self, start: Coord, end: Coord) -> Result<()> {
        self.index(start)?;
        self.index(end)?;
        if start == end {
            return Err(AppError::EndpointsOverlap {
                row: start.row,
                col: start.col,
            });
        }
        Ok(())
    }

    // Callers validate both coordinates first.
    fn force_endpoints(&mut self, start: Coord, end: Coord) {
        let cols = self.cols;
        self.cells[start.row * cols + start.col].kind = CellKind::Start;
        self.cells[end.row * cols + end.col].kind = CellKind::End;
    }
}
