//! Lattice simulation engine - the per-tick update algorithm.

use crate::cell::{Cell, ImmuneCell, Occupant};
use crate::config::Config;
use crate::grid::{Grid, DIRECTIONS};
use crate::stats::{Stats, StatsHistory};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// The simulation lattice: occupancy grid, simulated clock, and the
/// stochastic update rules for every occupant variant.
pub struct Lattice {
    // Spatial state
    grid: Grid,

    // Clock
    hour: f32,
    tick: u64,

    // Immortal lineages ever created; the seed lineage counts as the first
    immortal_lineages: u32,

    // Configuration
    config: Config,

    // Statistics
    pub stats: Stats,
    pub stats_history: StatsHistory,

    // Random number generator (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,

    births_this_tick: usize,
    deaths_this_tick: usize,
}

impl Lattice {
    /// Create a new lattice with the given configuration, all sites empty
    pub fn new(config: Config) -> Self {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create a new lattice with a specific seed for reproducibility
    pub fn new_with_seed(config: Config, seed: u64) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(seed);
        let grid = Grid::new(config.lattice.width, config.lattice.height);
        let stats_history = StatsHistory::new(config.logging.stats_interval);

        Self {
            grid,
            hour: 0.0,
            tick: 0,
            immortal_lineages: 1,
            config,
            stats: Stats::new(),
            stats_history,
            rng,
            seed,
            births_this_tick: 0,
            deaths_this_tick: 0,
        }
    }

    /// Place one cell at a site, if the site is empty
    pub fn seed_cell(&mut self, x: usize, y: usize, immortal: bool) -> bool {
        if !self.grid.is_empty_site(x, y) {
            return false;
        }
        let cell = Cell::new(&self.config.cells, immortal);
        self.grid.set(x, y, Occupant::Cell(cell));
        true
    }

    /// Place an arbitrary occupant at a site, if the site is empty
    pub fn place_occupant(&mut self, x: usize, y: usize, occupant: Occupant) -> bool {
        if !self.grid.is_empty_site(x, y) {
            return false;
        }
        self.grid.set(x, y, occupant);
        true
    }

    /// Execute exactly one tick.
    ///
    /// The activation queue is a snapshot of the sites occupied at
    /// tick-start, shuffled uniformly; occupants created during the tick
    /// are not activated until the next one. Grid contents are not
    /// snapshotted: a site vacated mid-tick is a valid target for
    /// later-processed occupants.
    pub fn advance(&mut self, movement_enabled: bool) {
        self.births_this_tick = 0;
        self.deaths_this_tick = 0;

        let mut queue = self.grid.occupied_sites();
        queue.shuffle(&mut self.rng);

        for (x, y) in queue {
            match *self.grid.get(x, y) {
                Occupant::Cell(_) => self.update_cell(x, y, movement_enabled),
                Occupant::Immune(_) => self.update_immune(x, y),
                Occupant::Empty => {}
            }
        }

        self.hour += self.config.cells.tick_hours;
        self.tick += 1;
        self.update_stats();
    }

    /// One tumor cell's turn: age, die, move, then divide or succumb.
    fn update_cell(&mut self, x: usize, y: usize, movement_enabled: bool) {
        let cells = self.config.cells.clone();

        // Aging (budget exhaustion is detected inside) and forced death
        // once accumulated immune pressure exceeds certainty
        let mut died = false;
        if let Occupant::Cell(cell) = self.grid.get_mut(x, y) {
            cell.age_up(&cells);
            if cell.apoptosis_chance > 1.0 {
                cell.alive = false;
            }
            died = !cell.alive;
        }
        if died {
            self.grid.take(x, y);
            self.deaths_this_tick += 1;
            return;
        }

        // A fully enclosed cell neither moves nor divides this tick
        let Some((px, py)) = self.probe_move(x, y) else {
            return;
        };

        // Relocate only when movement is enabled this tick and the
        // destination is still empty at the write
        let (cx, cy) = if movement_enabled && self.grid.is_empty_site(px, py) {
            let occupant = self.grid.take(x, y);
            self.grid.set(px, py, occupant);
            (px, py)
        } else {
            (x, y)
        };

        // Division, or stochastic apoptosis instead of it
        let cell = match self.grid.get(cx, cy) {
            Occupant::Cell(cell) => *cell,
            _ => return,
        };
        if cell.is_mature(&cells) && cell.can_divide() {
            if !cell.infinite && self.rng.gen::<f32>() < cell.apoptosis_chance {
                self.grid.take(cx, cy);
                self.deaths_this_tick += 1;
                // Immune recruitment responds at the pre-move coordinates
                if self.hour > self.config.immune.activation_hour {
                    self.add_immune_cell(x, y);
                }
            } else {
                self.replicate_cell(cx, cy);
            }
        }
    }

    /// One immune cell's turn: attack an adjacent tumor cell, or advance
    /// one step toward the globally nearest one.
    fn update_immune(&mut self, x: usize, y: usize) {
        if let Some((tx, ty)) = self.grid.adjacent_tumor_cell(x, y) {
            if self.hour > self.config.immune.activation_hour {
                let immune_cfg = self.config.immune.clone();
                let attacker = match self.grid.get(x, y) {
                    Occupant::Immune(immune) => *immune,
                    _ => return,
                };
                if let Occupant::Cell(target) = self.grid.get_mut(tx, ty) {
                    attacker.increase_apoptosis(target, &immune_cfg);
                }
            }
        } else if let Some((tx, ty)) = self.grid.nearest_tumor_cell(x, y) {
            // Unit step toward the target, each axis normalized independently
            let dx = (tx as i32 - x as i32).signum();
            let dy = (ty as i32 - y as i32).signum();
            if let Some((nx, ny)) = self.grid.offset(x, y, dx, dy) {
                if self.grid.is_empty_site(nx, ny) {
                    let occupant = self.grid.take(x, y);
                    self.grid.set(nx, ny, occupant);
                }
            }
        }
    }

    /// Probe for a relocation target: the first empty in-bounds site in a
    /// uniformly shuffled direction order. Pure probe; occupancy is not
    /// mutated.
    pub fn probe_move(&mut self, x: usize, y: usize) -> Option<(usize, usize)> {
        let mut directions = DIRECTIONS;
        directions.shuffle(&mut self.rng);

        directions.iter().find_map(|&(dx, dy)| {
            self.grid
                .offset(x, y, dx, dy)
                .filter(|&(nx, ny)| self.grid.is_empty_site(nx, ny))
        })
    }

    /// Place a daughter cell at the first empty neighbor in a uniformly
    /// shuffled direction order. Finite parents spend one unit of budget
    /// on themselves and pass the reduced budget to the daughter; immortal
    /// parents found a new immortal lineage with small probability. On
    /// success the parent's age resets and it must re-mature.
    pub fn replicate_cell(&mut self, x: usize, y: usize) {
        let parent = match self.grid.get(x, y) {
            Occupant::Cell(cell) => *cell,
            _ => return,
        };
        if !parent.can_divide() {
            return;
        }

        let mut directions = DIRECTIONS;
        directions.shuffle(&mut self.rng);

        for (dx, dy) in directions {
            let Some((nx, ny)) = self.grid.offset(x, y, dx, dy) else {
                continue;
            };
            if !self.grid.is_empty_site(nx, ny) {
                continue;
            }

            let daughter = if parent.infinite {
                let immortal = self.rng.gen::<f32>() < self.config.cells.immortal_mutation_rate;
                if immortal {
                    self.immortal_lineages += 1;
                    log::debug!("immortal lineage {} founded at ({}, {})", self.immortal_lineages, nx, ny);
                }
                Cell::new(&self.config.cells, immortal)
            } else {
                let mut daughter = Cell::new(&self.config.cells, false);
                daughter.pmax = parent.pmax - 1;
                if let Occupant::Cell(p) = self.grid.get_mut(x, y) {
                    p.pmax -= 1;
                }
                daughter
            };

            if let Occupant::Cell(p) = self.grid.get_mut(x, y) {
                p.age = 0.0;
            }
            self.grid.set(nx, ny, Occupant::Cell(daughter));
            self.births_this_tick += 1;
            return;
        }
    }

    /// Spawn an immune cell entering from the tissue exterior.
    ///
    /// The target site is used directly when it is empty and reaches the
    /// grid boundary; otherwise the cell enters at a uniformly random
    /// boundary-connected empty site. With no such site the call is a
    /// no-op. Enclosed internal voids are never spawn targets.
    pub fn add_immune_cell(&mut self, x: usize, y: usize) {
        if self.grid.is_empty_site(x, y) && self.grid.is_connected_to_boundary(x, y) {
            self.grid.set(x, y, Occupant::Immune(ImmuneCell::new()));
            log::debug!("immune cell entered at ({}, {})", x, y);
            return;
        }

        let exterior = self.grid.exterior_empty_sites();
        if let Some(&(rx, ry)) = exterior.choose(&mut self.rng) {
            self.grid.set(rx, ry, Occupant::Immune(ImmuneCell::new()));
            log::debug!("immune cell entered at random exterior site ({}, {})", rx, ry);
        }
    }

    /// Update statistics and record history at the configured interval
    fn update_stats(&mut self) {
        self.stats.tick = self.tick;
        self.stats.hour = self.hour;
        self.stats.update(
            &self.grid,
            self.immortal_lineages,
            self.births_this_tick,
            self.deaths_this_tick,
        );

        if self.tick % self.config.logging.stats_interval == 0 {
            self.stats_history.record(self.stats.clone());
        }
    }

    /// Count of all tumor cells (immune cells excluded)
    pub fn total_cell_count(&self) -> usize {
        self.grid.count_cells()
    }

    /// Count of live non-immune cells; the run-termination signal.
    /// Counts the same sites as [`total_cell_count`](Self::total_cell_count).
    pub fn non_immune_cell_count(&self) -> usize {
        self.grid.count_cells()
    }

    /// Count of immune cells present
    pub fn immune_cell_count(&self) -> usize {
        self.grid.count_immune()
    }

    /// Visualization classes for every site, row-major. See
    /// [`Occupant::render_class`] for the class codes.
    pub fn render_state(&self) -> Vec<Vec<u8>> {
        (0..self.grid.height())
            .map(|y| {
                (0..self.grid.width())
                    .map(|x| self.grid.get(x, y).render_class())
                    .collect()
            })
            .collect()
    }

    /// The occupant at a site
    pub fn occupant_at(&self, x: usize, y: usize) -> &Occupant {
        self.grid.get(x, y)
    }

    /// The tumor cell at a site, if any
    pub fn cell_at(&self, x: usize, y: usize) -> Option<&Cell> {
        self.grid.get(x, y).as_cell()
    }

    /// Read access to the occupancy grid and its spatial oracles
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Simulated hours elapsed
    #[inline]
    pub fn hour(&self) -> f32 {
        self.hour
    }

    /// Ticks executed
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Immortal lineages created so far
    #[inline]
    pub fn immortal_lineages(&self) -> u32 {
        self.immortal_lineages
    }

    /// Check if the non-immune population is extinct
    pub fn is_extinct(&self) -> bool {
        self.non_immune_cell_count() == 0
    }

    /// Get seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(width: usize, height: usize) -> Config {
        let mut config = Config::default();
        config.lattice.width = width;
        config.lattice.height = height;
        config
    }

    fn mature_finite(pmax: u32) -> Cell {
        Cell {
            age: 25.0,
            alive: true,
            infinite: false,
            pmax,
            apoptosis_chance: 0.1,
        }
    }

    fn mature_immortal() -> Cell {
        Cell {
            age: 25.0,
            alive: true,
            infinite: true,
            pmax: 10,
            apoptosis_chance: 0.0,
        }
    }

    #[test]
    fn test_new_lattice_is_empty() {
        let lattice = Lattice::new_with_seed(test_config(10, 10), 1);

        assert_eq!(lattice.non_immune_cell_count(), 0);
        assert_eq!(lattice.total_cell_count(), 0);
        assert_eq!(lattice.hour(), 0.0);
        assert_eq!(lattice.tick(), 0);
        assert_eq!(lattice.immortal_lineages(), 1);
        assert!(lattice.is_extinct());
    }

    #[test]
    fn test_seed_cell_occupied_site_refused() {
        let mut lattice = Lattice::new_with_seed(test_config(5, 5), 1);

        assert!(lattice.seed_cell(2, 2, true));
        assert!(!lattice.seed_cell(2, 2, false));
        assert_eq!(lattice.total_cell_count(), 1);
    }

    #[test]
    fn test_single_immortal_seed_first_tick() {
        let mut lattice = Lattice::new_with_seed(test_config(5, 5), 42);
        lattice.seed_cell(2, 2, true);

        lattice.advance(false);

        assert_eq!(lattice.total_cell_count(), 1);
        let cell = lattice.cell_at(2, 2).unwrap();
        assert_eq!(cell.age, 1.6);
        assert_eq!(lattice.render_state()[2][2], 4);
        assert_eq!(lattice.hour(), 1.6);
    }

    #[test]
    fn test_no_division_before_maturity() {
        let mut lattice = Lattice::new_with_seed(test_config(9, 9), 7);
        lattice.seed_cell(4, 4, true);

        // 24 / 1.6 = 15 ticks to maturity; stop well short of it
        for _ in 0..10 {
            lattice.advance(true);
        }
        assert_eq!(lattice.total_cell_count(), 1);
    }

    #[test]
    fn test_immortal_seed_divides_after_maturity() {
        let mut lattice = Lattice::new_with_seed(test_config(9, 9), 7);
        lattice.seed_cell(4, 4, true);

        for _ in 0..16 {
            lattice.advance(false);
        }
        assert!(lattice.total_cell_count() >= 2);
    }

    #[test]
    fn test_replication_decrements_both_budgets() {
        let mut lattice = Lattice::new_with_seed(test_config(5, 5), 3);
        lattice.place_occupant(2, 2, Occupant::Cell(mature_finite(10)));

        lattice.replicate_cell(2, 2);

        let parent = lattice.cell_at(2, 2).unwrap();
        assert_eq!(parent.pmax, 9);
        assert_eq!(parent.age, 0.0);
        assert_eq!(lattice.total_cell_count(), 2);

        let daughter = lattice
            .grid()
            .neighbors(2, 2)
            .into_iter()
            .find_map(|(nx, ny)| lattice.cell_at(nx, ny).copied())
            .unwrap();
        assert_eq!(daughter.pmax, 9);
        assert!(!daughter.infinite);
        assert_eq!(daughter.age, 0.0);
    }

    #[test]
    fn test_immortal_budget_never_spent() {
        let mut lattice = Lattice::new_with_seed(test_config(5, 5), 3);
        lattice.place_occupant(2, 2, Occupant::Cell(mature_immortal()));

        lattice.replicate_cell(2, 2);

        assert_eq!(lattice.cell_at(2, 2).unwrap().pmax, 10);
        assert_eq!(lattice.total_cell_count(), 2);
    }

    #[test]
    fn test_replication_noop_without_free_neighbor() {
        let mut lattice = Lattice::new_with_seed(test_config(5, 5), 3);
        lattice.place_occupant(2, 2, Occupant::Cell(mature_finite(10)));
        for (nx, ny) in lattice.grid().neighbors(2, 2) {
            lattice.place_occupant(nx, ny, Occupant::Immune(ImmuneCell::new()));
        }

        lattice.replicate_cell(2, 2);

        assert_eq!(lattice.total_cell_count(), 1);
        assert_eq!(lattice.cell_at(2, 2).unwrap().pmax, 10);
    }

    #[test]
    fn test_probe_move_none_when_surrounded() {
        let mut lattice = Lattice::new_with_seed(test_config(5, 5), 9);
        lattice.place_occupant(2, 2, Occupant::Cell(mature_finite(10)));
        for (nx, ny) in lattice.grid().neighbors(2, 2) {
            lattice.place_occupant(nx, ny, Occupant::Immune(ImmuneCell::new()));
        }

        assert_eq!(lattice.probe_move(2, 2), None);
    }

    #[test]
    fn test_probe_move_finds_only_gap() {
        let mut lattice = Lattice::new_with_seed(test_config(5, 5), 9);
        lattice.place_occupant(2, 2, Occupant::Cell(mature_finite(10)));
        for (nx, ny) in lattice.grid().neighbors(2, 2) {
            if (nx, ny) != (3, 2) {
                lattice.place_occupant(nx, ny, Occupant::Immune(ImmuneCell::new()));
            }
        }

        assert_eq!(lattice.probe_move(2, 2), Some((3, 2)));
    }

    #[test]
    fn test_excess_apoptosis_pressure_kills() {
        let mut lattice = Lattice::new_with_seed(test_config(5, 5), 11);
        let mut cell = mature_finite(10);
        cell.apoptosis_chance = 1.5;
        lattice.place_occupant(2, 2, Occupant::Cell(cell));

        lattice.advance(false);

        assert_eq!(lattice.total_cell_count(), 0);
        assert!(lattice.occupant_at(2, 2).is_empty());
    }

    /// Ring of immune cells around the center leaves an enclosed pocket
    fn pocket_lattice(seed: u64) -> Lattice {
        let mut lattice = Lattice::new_with_seed(test_config(7, 7), seed);
        for y in 2..=4 {
            for x in 2..=4 {
                if x != 3 || y != 3 {
                    lattice.place_occupant(x, y, Occupant::Immune(ImmuneCell::new()));
                }
            }
        }
        lattice
    }

    #[test]
    fn test_immune_spawn_direct_when_exterior() {
        let mut lattice = Lattice::new_with_seed(test_config(7, 7), 5);

        lattice.add_immune_cell(0, 0);

        assert!(lattice.occupant_at(0, 0).is_immune());
        assert_eq!(lattice.immune_cell_count(), 1);
    }

    #[test]
    fn test_immune_spawn_never_in_enclosed_pocket() {
        for seed in 0..20 {
            let mut lattice = pocket_lattice(seed);

            lattice.add_immune_cell(3, 3);

            assert!(
                lattice.occupant_at(3, 3).is_empty(),
                "seed {} spawned inside the pocket",
                seed
            );
            assert_eq!(lattice.immune_cell_count(), 9);
        }
    }

    #[test]
    fn test_immune_spawn_noop_when_no_exterior() {
        let mut lattice = Lattice::new_with_seed(test_config(3, 3), 5);
        for y in 0..3 {
            for x in 0..3 {
                if x != 1 || y != 1 {
                    lattice.place_occupant(x, y, Occupant::Immune(ImmuneCell::new()));
                }
            }
        }

        // Only the enclosed center remains empty; nothing may spawn
        lattice.add_immune_cell(1, 1);

        assert!(lattice.occupant_at(1, 1).is_empty());
        assert_eq!(lattice.immune_cell_count(), 8);
    }

    #[test]
    fn test_immune_approaches_distant_target() {
        let mut lattice = Lattice::new_with_seed(test_config(8, 8), 13);
        lattice.place_occupant(0, 0, Occupant::Immune(ImmuneCell::new()));
        lattice.seed_cell(5, 5, false);

        lattice.advance(false);

        assert!(lattice.occupant_at(0, 0).is_empty());
        assert!(lattice.occupant_at(1, 1).is_immune());
        // Below the activation hour the target is untouched
        let target = lattice.cell_at(5, 5).unwrap();
        assert_eq!(target.apoptosis_chance, 0.1);
    }

    #[test]
    fn test_immune_holds_position_next_to_target() {
        let mut lattice = Lattice::new_with_seed(test_config(8, 8), 13);
        lattice.place_occupant(4, 4, Occupant::Immune(ImmuneCell::new()));
        lattice.seed_cell(5, 5, false);

        lattice.advance(false);

        assert!(lattice.occupant_at(4, 4).is_immune());
    }

    #[test]
    fn test_immune_attack_applies_pressure_after_activation() {
        let mut config = test_config(8, 8);
        config.immune.activation_hour = 0.0;
        let mut lattice = Lattice::new_with_seed(config, 17);
        lattice.place_occupant(4, 4, Occupant::Immune(ImmuneCell::new()));
        lattice.seed_cell(5, 5, false);

        // First tick: clock still at hour 0, activation gate closed
        lattice.advance(false);
        assert_eq!(lattice.cell_at(5, 5).unwrap().apoptosis_chance, 0.1);

        // Second tick: gate open, one attack lands
        lattice.advance(false);
        let chance = lattice.cell_at(5, 5).unwrap().apoptosis_chance;
        assert!((chance - 0.11).abs() < 1e-6);
    }

    #[test]
    fn test_immune_attack_immortal_smaller_increment() {
        let mut config = test_config(8, 8);
        config.immune.activation_hour = 0.0;
        let mut lattice = Lattice::new_with_seed(config, 17);
        lattice.place_occupant(4, 4, Occupant::Immune(ImmuneCell::new()));
        lattice.seed_cell(5, 5, true);

        lattice.advance(false);
        lattice.advance(false);

        let chance = lattice.cell_at(5, 5).unwrap().apoptosis_chance;
        assert!((chance - 0.005).abs() < 1e-6);
    }

    #[test]
    fn test_clock_advances_every_tick() {
        let mut lattice = Lattice::new_with_seed(test_config(5, 5), 1);

        for _ in 0..10 {
            lattice.advance(true);
        }

        assert_eq!(lattice.tick(), 10);
        assert!((lattice.hour() - 16.0).abs() < 1e-3);
    }

    #[test]
    fn test_stats_history_records_trajectory() {
        let mut lattice = Lattice::new_with_seed(test_config(9, 9), 21);
        lattice.seed_cell(4, 4, true);

        for _ in 0..5 {
            lattice.advance(false);
        }

        assert_eq!(lattice.stats_history.snapshots.len(), 5);
        assert_eq!(lattice.stats.total_cells, 1);
        let series = lattice.stats_history.cell_count_series();
        assert_eq!(series.len(), 5);
        assert!(series.iter().all(|&(_, count)| count == 1));
    }

    #[test]
    fn test_render_state_dimensions() {
        let lattice = Lattice::new_with_seed(test_config(6, 4), 1);

        let state = lattice.render_state();
        assert_eq!(state.len(), 4);
        assert_eq!(state[0].len(), 6);
        assert!(state.iter().flatten().all(|&class| class == 0));
    }
}
