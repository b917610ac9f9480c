use crate::grid::{CellKind, Grid};
use crate::trace::AlgorithmStep;

/// Apply one step's effects to a copy of `grid`.
///
/// - `current` is settled: visited, no longer open, f cost copied when sent.
/// - `neighbors` not yet settled become open; the first discovery records
///   `current` as their parent.
/// - `path` (final step only) is marked on-path.
///
/// Coordinates outside the grid are skipped; the payload comes from the solver
/// and is not trusted to match local dimensions.
pub fn project(grid: &Grid, step: &AlgorithmStep) -> Grid {
    let mut next = grid.clone();
    let vars = &step.variables;

    let current = vars.current.as_ref().map(|node| node.coord());

    if let Some(node) = &vars.current {
        if let Some(cell) = next.cell_mut(node.coord()) {
            cell.visited = true;
            cell.open = false;
            if let Some(f_cost) = node.f_cost {
                cell.f_cost = f_cost;
            }
        }
    }

    for node in vars.neighbors.iter().flatten() {
        let Some(cell) = next.cell_mut(node.coord()) else {
            continue;
        };
        if cell.visited {
            continue;
        }
        cell.open = true;
        if cell.parent.is_none() && cell.kind != CellKind::Start {
            cell.parent = current;
        }
        if let Some(f_cost) = node.f_cost {
            cell.f_cost = f_cost;
        }
    }

    for node in vars.path.iter().flatten() {
        if let Some(cell) = next.cell_mut(node.coord()) {
            cell.on_path = true;
        }
    }

    next
}
