//! Module placement - check-then-commit building on the station grid

use crate::components::{Module, Sign};
use crate::error::PlacementError;
use crate::state::GameState;

/// Select the building type used by the next placement, or clear the selection.
pub fn select_building_type(state: &mut GameState, type_id: Option<&str>) {
    state.selected_building_type = type_id.map(str::to_string);
}

/// Place the selected building type with its top-left corner at `(x, y)`.
///
/// Checks run in order: selection, type known and unlocked, footprint inside
/// the grid, footprint free, adjacency (waived for the first module),
/// affordability. Nothing changes unless all pass. A failure is also pushed
/// to the message log. Returns the new module id.
pub fn place_building_at(state: &mut GameState, x: i64, y: i64) -> Result<String, PlacementError> {
    let result = try_place(state, x, y);
    if let Err(err) = &result {
        state.notify(err.to_string());
    }
    result
}

fn try_place(state: &mut GameState, x: i64, y: i64) -> Result<String, PlacementError> {
    let type_id = state
        .selected_building_type
        .clone()
        .ok_or(PlacementError::NoSelection)?;
    let building = state
        .building_types
        .get(&type_id)
        .cloned()
        .ok_or_else(|| PlacementError::UnknownType(type_id.clone()))?;

    if !building.enabled {
        return Err(PlacementError::Locked(building.name));
    }

    let (width, height) = (building.size.width, building.size.height);
    let footprint = state
        .grid
        .area(x, y, width, height)
        .ok_or_else(|| PlacementError::OutOfBounds(building.name.clone()))?;

    if footprint.iter().any(|&i| state.grid.cells[i].is_occupied()) {
        return Err(PlacementError::Occupied(building.name));
    }

    if !state.modules.is_empty() && !state.grid.is_adjacent_to_occupied(x, y, width, height) {
        return Err(PlacementError::NotAdjacent(building.name));
    }

    if !state.resources.can_afford(&building.cost) {
        return Err(PlacementError::CannotAfford(building.name));
    }

    // Commit
    state.resources.apply_deltas(&building.cost, Sign::Minus);

    // area() succeeded, so both coordinates are non-negative
    let (x, y) = (x as u32, y as u32);
    let module = Module {
        id: state.module_ids.allocate(),
        type_id: building.id.clone(),
        x,
        y,
        width,
        height,
        active: building.active_by_default,
        required_qualifications: building.required_qualifications.clone(),
        bonus_qualifications: building.bonus_qualifications.clone(),
        workers: Vec::new(),
        worker_max: building.worker_max,
    };
    let module_id = module.id.clone();

    // Boundary test is against the grid as it was before the build
    let touches_edge = state.grid.touches_boundary(x, y, width, height);
    state.modules.push(module);
    state.grid.rebuild(&state.modules);

    if touches_edge {
        expand_grid(state);
        state.notify("The buildable area has been expanded.");
    }

    state.recalc_maximums();
    state.notify(format!("Built: {}", building.name));
    Ok(module_id)
}

/// Grow the grid by one ring and shift every module one cell down-right.
fn expand_grid(state: &mut GameState) {
    state.grid = state.grid.grown_by_ring();
    for module in &mut state.modules {
        module.x += 1;
        module.y += 1;
    }
    state.grid.rebuild(&state.modules);
    log::debug!(
        "grid expanded to {}x{}",
        state.grid.width,
        state.grid.height
    );
}

/// Flip a module between active and inactive. Workers stay assigned.
///
/// Returns `false` when no module has that id.
pub fn toggle_module_active(state: &mut GameState, module_id: &str) -> bool {
    let Some(module) = state.module_mut(module_id) else {
        return false;
    };
    module.active = !module.active;
    let (type_id, active) = (module.type_id.clone(), module.active);

    let name = state.building_name(&type_id);
    let status = if active { "active" } else { "inactive" };
    state.notify(format!("{} is now {}.", name, status));
    true
}
