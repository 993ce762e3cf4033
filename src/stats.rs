//! Statistics tracking for simulation runs.

use crate::grid::Grid;
use serde::{Deserialize, Serialize};

/// Statistics snapshot for a simulation tick
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Tick index
    pub tick: u64,
    /// Simulated hours elapsed
    pub hour: f32,
    /// Live tumor cells (immune cells excluded)
    pub total_cells: usize,
    /// Live non-immune cells; counts the same sites as `total_cells`
    pub non_immune_cells: usize,
    /// Immune cells present
    pub immune_cells: usize,
    /// Immortal lineages created so far
    pub immortal_lineages: u32,
    /// Daughter cells placed this tick
    pub births: usize,
    /// Cells removed this tick
    pub deaths: usize,
}

impl Stats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Update population counts from the current grid state
    pub fn update(&mut self, grid: &Grid, immortal_lineages: u32, births: usize, deaths: usize) {
        self.total_cells = grid.count_cells();
        self.non_immune_cells = self.total_cells;
        self.immune_cells = grid.count_immune();
        self.immortal_lineages = immortal_lineages;
        self.births = births;
        self.deaths = deaths;
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "T:{:6} | H:{:8.1} | Cells:{:6} | Immune:{:5} | Lineages:{:3} | B:{:3} D:{:3}",
            self.tick,
            self.hour,
            self.total_cells,
            self.immune_cells,
            self.immortal_lineages,
            self.births,
            self.deaths,
        )
    }
}

/// Historical statistics tracker: the population trajectory of one run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    /// All recorded stats snapshots
    pub snapshots: Vec<Stats>,
    /// Recording interval in ticks
    pub interval: u64,
}

impl StatsHistory {
    /// Create new history with recording interval
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval,
        }
    }

    /// Record a stats snapshot
    pub fn record(&mut self, stats: Stats) {
        self.snapshots.push(stats);
    }

    /// Total cell count over time
    pub fn cell_count_series(&self) -> Vec<(f32, usize)> {
        self.snapshots
            .iter()
            .map(|s| (s.hour, s.total_cells))
            .collect()
    }

    /// Non-immune cell count over time
    pub fn non_immune_series(&self) -> Vec<(f32, usize)> {
        self.snapshots
            .iter()
            .map(|s| (s.hour, s.non_immune_cells))
            .collect()
    }

    /// Immune cell count over time
    pub fn immune_series(&self) -> Vec<(f32, usize)> {
        self.snapshots
            .iter()
            .map(|s| (s.hour, s.immune_cells))
            .collect()
    }

    /// Save history to a JSON file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    /// Load history from a JSON file
    pub fn load(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
