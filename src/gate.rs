//! Grid editing policy: turns pointer gestures into wall edits, and refuses
//! them while playback is fetching or running.

use crate::error::Result;
use crate::grid::Coord;
use crate::playback::PlaybackController;
use rand::Rng;
use tracing::debug;

/// Press on a cell toggles a wall. Returns whether the grid changed.
pub fn on_cell_press(controller: &mut PlaybackController, coord: Coord) -> Result<bool> {
    if controller.edits_locked() {
        debug!(%coord, "press ignored during playback");
        return Ok(false);
    }
    controller.edit_grid(|grid| grid.toggle_wall(coord))
}

/// Dragging into a cell only ever adds a wall
pub fn on_cell_drag_enter(controller: &mut PlaybackController, coord: Coord) -> Result<bool> {
    if controller.edits_locked() {
        return Ok(false);
    }
    controller.edit_grid(|grid| grid.paint_wall(coord))
}

/// Move the start cell. Refused while locked or when it would land on the end.
pub fn on_place_start(controller: &mut PlaybackController, coord: Coord) -> Result<bool> {
    if controller.edits_locked() || coord == controller.end() || coord == controller.start() {
        return Ok(false);
    }
    let end = controller.end();
    controller.set_endpoints(coord, end)?;
    Ok(true)
}

/// Move the end cell. Refused while locked or when it would land on the start.
pub fn on_place_end(controller: &mut PlaybackController, coord: Coord) -> Result<bool> {
    if controller.edits_locked() || coord == controller.start() || coord == controller.end() {
        return Ok(false);
    }
    let start = controller.start();
    controller.set_endpoints(start, coord)?;
    Ok(true)
}

/// Sprinkle random walls over empty cells
pub fn on_scatter_walls<R: Rng>(
    controller: &mut PlaybackController,
    density: f64,
    rng: &mut R,
) -> Result<bool> {
    if controller.edits_locked() {
        return Ok(false);
    }
    controller.edit_grid(|grid| Ok(grid.scatter_walls(density, rng)))
}
