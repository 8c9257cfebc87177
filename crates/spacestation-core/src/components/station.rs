//! Station structure: the cell grid and the modules installed on it.
//!
//! Modules are the authoritative layout. The grid is a derived view that is
//! cleared and repainted from the module list whenever the layout changes.

use serde::{Deserialize, Serialize};

/// One grid cell. Holds no state of its own beyond the painted module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub x: u32,
    pub y: u32,
    pub building_type_id: Option<String>,
    /// Top-left cell of a module footprint
    pub is_root: bool,
    pub module_id: Option<String>,
}

impl Cell {
    fn empty(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            building_type_id: None,
            is_root: false,
            module_id: None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.building_type_id.is_some()
    }

    fn clear(&mut self) {
        self.building_type_id = None;
        self.module_id = None;
        self.is_root = false;
    }
}

/// Rectangular cell grid, stored row-major (`index = y * width + x`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        let mut cells = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::empty(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// Cell count matches the dimensions and every cell sits at its own index.
    pub fn is_consistent(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.cells.len() == (self.width as usize) * (self.height as usize)
            && self.cells.iter().enumerate().all(|(i, c)| {
                (c.y as usize) * (self.width as usize) + (c.x as usize) == i
            })
    }

    /// Index of a cell, or `None` when the coordinate is outside the grid.
    pub fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some((y as usize) * (self.width as usize) + x as usize)
    }

    pub fn cell(&self, x: i64, y: i64) -> Option<&Cell> {
        self.index(x, y).and_then(|i| self.cells.get(i))
    }

    pub fn is_occupied(&self, x: i64, y: i64) -> bool {
        self.cell(x, y).map(Cell::is_occupied).unwrap_or(false)
    }

    /// Indices of a rectangular area in row-major order, or `None` if any
    /// part of it falls outside the grid.
    pub fn area(&self, x: i64, y: i64, width: u32, height: u32) -> Option<Vec<usize>> {
        let mut indices = Vec::with_capacity((width * height) as usize);
        for dy in 0..height as i64 {
            for dx in 0..width as i64 {
                indices.push(self.index(x + dx, y + dy)?);
            }
        }
        Some(indices)
    }

    /// Whether a footprint touches the outermost ring of cells.
    pub fn touches_boundary(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        x == 0 || y == 0 || x + width >= self.width || y + height >= self.height
    }

    /// Any 4-neighbour of any footprint cell is occupied. Diagonals do not count.
    pub fn is_adjacent_to_occupied(&self, x: i64, y: i64, width: u32, height: u32) -> bool {
        for dy in 0..height as i64 {
            for dx in 0..width as i64 {
                let (cx, cy) = (x + dx, y + dy);
                let neighbours = [(cx + 1, cy), (cx - 1, cy), (cx, cy + 1), (cx, cy - 1)];
                if neighbours.iter().any(|&(nx, ny)| self.is_occupied(nx, ny)) {
                    return true;
                }
            }
        }
        false
    }

    /// Clear every cell and paint all modules back in.
    ///
    /// Modules whose footprint no longer fits are skipped.
    pub fn rebuild(&mut self, modules: &[Module]) {
        for cell in &mut self.cells {
            cell.clear();
        }

        for module in modules {
            let Some(indices) = self.area(
                module.x as i64,
                module.y as i64,
                module.width,
                module.height,
            ) else {
                log::warn!("module {} does not fit the grid, skipped", module.id);
                continue;
            };
            for (n, index) in indices.into_iter().enumerate() {
                let cell = &mut self.cells[index];
                cell.building_type_id = Some(module.type_id.clone());
                cell.module_id = Some(module.id.clone());
                cell.is_root = n == 0;
            }
        }
    }

    /// A fresh grid one cell larger on every side.
    pub fn grown_by_ring(&self) -> Grid {
        Grid::new(self.width + 2, self.height + 2)
    }
}

/// An installed building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub type_id: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub active: bool,
    pub required_qualifications: Vec<String>,
    pub bonus_qualifications: Vec<String>,
    pub workers: Vec<String>,
    /// Zero means unlimited
    pub worker_max: u32,
}

impl Module {
    pub fn has_free_slot(&self) -> bool {
        self.worker_max == 0 || (self.workers.len() as u32) < self.worker_max
    }

    pub fn has_worker(&self, person_id: &str) -> bool {
        self.workers.iter().any(|w| w == person_id)
    }
}
