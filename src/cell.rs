//! Occupant entities and their local state transitions.

use crate::config::{CellConfig, ImmuneConfig};
use serde::{Deserialize, Serialize};

/// What a lattice site holds. Every site holds exactly one variant; the
/// scheduler dispatches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Occupant {
    #[default]
    Empty,
    Cell(Cell),
    Immune(ImmuneCell),
}

impl Occupant {
    /// Check if the site is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Occupant::Empty)
    }

    /// Check if the site holds a proliferating (non-immune) cell
    #[inline]
    pub fn is_cell(&self) -> bool {
        matches!(self, Occupant::Cell(_))
    }

    /// Check if the site holds an immune cell
    #[inline]
    pub fn is_immune(&self) -> bool {
        matches!(self, Occupant::Immune(_))
    }

    /// Get the proliferating cell at this site, if any
    #[inline]
    pub fn as_cell(&self) -> Option<&Cell> {
        match self {
            Occupant::Cell(cell) => Some(cell),
            _ => None,
        }
    }

    /// Mutable access to the proliferating cell at this site, if any
    #[inline]
    pub fn as_cell_mut(&mut self) -> Option<&mut Cell> {
        match self {
            Occupant::Cell(cell) => Some(cell),
            _ => None,
        }
    }

    /// Visualization class for this site.
    ///
    /// 0 empty, 1 finite cell with budget <= 5, 2 budget 6-10, 3 budget > 10,
    /// 4 immortal cell, 5 immune cell. Immune takes precedence over the
    /// cell classes.
    pub fn render_class(&self) -> u8 {
        match self {
            Occupant::Immune(_) => 5,
            Occupant::Cell(cell) if cell.infinite => 4,
            Occupant::Cell(cell) if cell.pmax > 10 => 3,
            Occupant::Cell(cell) if cell.pmax > 5 => 2,
            Occupant::Cell(_) => 1,
            Occupant::Empty => 0,
        }
    }
}

/// A proliferating tumor cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Hours since creation or last successful division
    pub age: f32,
    /// False marks the cell for removal
    pub alive: bool,
    /// Immortal lineage: unlimited division budget, no intrinsic apoptosis
    pub infinite: bool,
    /// Remaining division budget; never read for immortal cells
    pub pmax: u32,
    /// Probability of stochastic death per eligible tick; raised by
    /// immune pressure, forces death once it exceeds 1
    pub apoptosis_chance: f32,
}

impl Cell {
    /// Create a new cell with the configured starting state
    pub fn new(config: &CellConfig, infinite: bool) -> Self {
        Self {
            age: 0.0,
            alive: true,
            infinite,
            pmax: config.division_budget,
            apoptosis_chance: if infinite { 0.0 } else { config.base_apoptosis },
        }
    }

    /// Advance age by one tick. Natural exhaustion is detected here: a
    /// finite cell whose budget has run out becomes non-viable.
    pub fn age_up(&mut self, config: &CellConfig) {
        self.age += config.tick_hours;
        if !self.infinite && self.pmax == 0 {
            self.alive = false;
        }
    }

    /// Check if the cell has reached division maturity
    #[inline]
    pub fn is_mature(&self, config: &CellConfig) -> bool {
        self.age >= config.mature_age
    }

    /// Check if the cell is eligible to divide
    #[inline]
    pub fn can_divide(&self) -> bool {
        self.alive && (self.infinite || self.pmax > 0)
    }
}

/// An innate immune cell. Stateless beyond viability: immune cells never
/// age and no removal rule is exercised within the modeled window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImmuneCell {
    pub alive: bool,
}

impl ImmuneCell {
    pub fn new() -> Self {
        Self { alive: true }
    }

    /// Raise an adjacent target's apoptosis probability. Immortal lineages
    /// resist pressure and accumulate it in smaller increments.
    pub fn increase_apoptosis(&self, target: &mut Cell, config: &ImmuneConfig) {
        if target.infinite {
            target.apoptosis_chance += config.pressure_immortal;
        } else {
            target.apoptosis_chance += config.pressure_finite;
        }
    }
}

impl Default for ImmuneCell {
    fn default() -> Self {
        Self::new()
    }
}
