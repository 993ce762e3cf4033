//! Run drivers: single runs to extinction and batch averaging.
//!
//! A run seeds one cell at the lattice center and advances until the
//! non-immune population reaches zero. Extinction is an emergent stopping
//! condition and is not guaranteed, so every run is also bounded by the
//! configured tick cap and reports which of the two ended it.

use crate::config::Config;
use crate::lattice::Lattice;
use crate::stats::StatsHistory;
use serde::{Deserialize, Serialize};

/// How a single run ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The non-immune population reached zero
    Extinct { ticks: u64, hours: f32 },
    /// The safety bound was hit with cells still alive
    TickLimit {
        ticks: u64,
        hours: f32,
        survivors: usize,
    },
}

impl RunOutcome {
    /// Ticks executed before the run ended
    pub fn ticks(&self) -> u64 {
        match *self {
            Self::Extinct { ticks, .. } => ticks,
            Self::TickLimit { ticks, .. } => ticks,
        }
    }

    /// Simulated hours elapsed before the run ended
    pub fn hours(&self) -> f32 {
        match *self {
            Self::Extinct { hours, .. } => hours,
            Self::TickLimit { hours, .. } => hours,
        }
    }

    /// Check if the run ended in extinction
    pub fn is_extinct(&self) -> bool {
        matches!(self, Self::Extinct { .. })
    }
}

/// Result of a single run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// RNG seed the run used
    pub seed: u64,
    pub outcome: RunOutcome,
    /// Recorded population trajectory
    pub history: StatsHistory,
    /// Immortal lineages created over the run
    pub immortal_lineages: u32,
}

/// Whether cells may relocate on the given tick, per the configured
/// movement cadence (1 = every tick, 0 = never)
pub fn movement_enabled(tick: u64, interval: u64) -> bool {
    interval != 0 && (tick + 1) % interval == 0
}

/// Run one simulation to extinction or the tick cap
pub fn run_once(config: &Config, seed: u64) -> RunReport {
    let mut lattice = Lattice::new_with_seed(config.clone(), seed);
    let x = config.lattice.width / 2;
    let y = config.lattice.height / 2;
    lattice.seed_cell(x, y, config.lattice.seed_immortal);

    let interval = config.lattice.movement_interval;
    let outcome = loop {
        if lattice.is_extinct() {
            break RunOutcome::Extinct {
                ticks: lattice.tick(),
                hours: lattice.hour(),
            };
        }
        if lattice.tick() >= config.safety.max_ticks {
            break RunOutcome::TickLimit {
                ticks: lattice.tick(),
                hours: lattice.hour(),
                survivors: lattice.non_immune_cell_count(),
            };
        }
        lattice.advance(movement_enabled(lattice.tick(), interval));
    };

    log::debug!("run with seed {} ended: {:?}", seed, outcome);

    RunReport {
        seed,
        outcome,
        history: lattice.stats_history.clone(),
        immortal_lineages: lattice.immortal_lineages(),
    }
}

/// Aggregate over a batch of runs. Extinction-time statistics cover
/// extinct runs only; capped runs are counted separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub runs: usize,
    pub extinct_runs: usize,
    pub capped_runs: usize,
    /// Outcome of every run, in seed order
    pub outcomes: Vec<RunOutcome>,
    pub mean_hours: f32,
    pub min_hours: f32,
    pub max_hours: f32,
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Batch Results ===")?;
        writeln!(f, "Runs: {}", self.runs)?;
        writeln!(f, "Extinct: {}", self.extinct_runs)?;
        writeln!(f, "Hit tick cap: {}", self.capped_runs)?;
        if self.extinct_runs > 0 {
            writeln!(f, "Mean extinction: {:.1} hours", self.mean_hours)?;
            writeln!(f, "Fastest: {:.1} hours", self.min_hours)?;
            writeln!(f, "Slowest: {:.1} hours", self.max_hours)?;
        }
        Ok(())
    }
}

/// Run the simulation `runs` times with consecutive seeds and aggregate
/// the extinction times
pub fn run_batch(config: &Config, runs: usize, base_seed: u64) -> BatchSummary {
    let mut outcomes = Vec::with_capacity(runs);

    for i in 0..runs {
        let seed = base_seed.wrapping_add(i as u64);
        let report = run_once(config, seed);
        log::info!(
            "run {}/{}: {:.1} hours ({})",
            i + 1,
            runs,
            report.outcome.hours(),
            if report.outcome.is_extinct() {
                "extinct"
            } else {
                "tick cap"
            }
        );
        outcomes.push(report.outcome);
    }

    let extinct: Vec<f32> = outcomes
        .iter()
        .filter(|o| o.is_extinct())
        .map(|o| o.hours())
        .collect();
    let extinct_runs = extinct.len();
    let mean_hours = if extinct.is_empty() {
        0.0
    } else {
        extinct.iter().sum::<f32>() / extinct.len() as f32
    };
    let min_hours = extinct.iter().copied().fold(f32::INFINITY, f32::min);
    let max_hours = extinct.iter().copied().fold(0.0, f32::max);

    BatchSummary {
        runs,
        extinct_runs,
        capped_runs: runs - extinct_runs,
        outcomes,
        mean_hours,
        min_hours: if extinct_runs > 0 { min_hours } else { 0.0 },
        max_hours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.lattice.width = 15;
        config.lattice.height = 15;
        config
    }

    #[test]
    fn test_movement_cadence() {
        assert!(movement_enabled(0, 1));
        assert!(movement_enabled(7, 1));

        assert!(!movement_enabled(0, 0));
        assert!(!movement_enabled(7, 0));

        assert!(!movement_enabled(0, 3));
        assert!(!movement_enabled(1, 3));
        assert!(movement_enabled(2, 3));
        assert!(movement_enabled(5, 3));
    }

    #[test]
    fn test_tick_limit_outcome() {
        let mut config = small_config();
        config.safety.max_ticks = 10;

        let report = run_once(&config, 42);

        match report.outcome {
            RunOutcome::TickLimit {
                ticks,
                hours,
                survivors,
            } => {
                assert_eq!(ticks, 10);
                assert!((hours - 16.0).abs() < 1e-3);
                // The immortal seed cannot die this early
                assert_eq!(survivors, 1);
            }
            RunOutcome::Extinct { .. } => panic!("immortal seed went extinct in 10 ticks"),
        }
        assert_eq!(report.seed, 42);
        assert!(!report.history.snapshots.is_empty());
    }

    #[test]
    fn test_finite_seed_goes_extinct() {
        let mut config = small_config();
        config.lattice.seed_immortal = false;
        config.safety.max_ticks = 5000;

        let report = run_once(&config, 7);

        assert!(report.outcome.is_extinct());
        assert!(report.outcome.hours() > 0.0);
        assert_eq!(report.immortal_lineages, 1);
    }

    #[test]
    fn test_batch_aggregates() {
        let mut config = small_config();
        config.lattice.seed_immortal = false;
        config.safety.max_ticks = 5000;

        let summary = run_batch(&config, 3, 100);

        assert_eq!(summary.runs, 3);
        assert_eq!(summary.outcomes.len(), 3);
        assert_eq!(summary.extinct_runs + summary.capped_runs, 3);
        assert_eq!(summary.extinct_runs, 3);
        assert!(summary.mean_hours >= summary.min_hours);
        assert!(summary.mean_hours <= summary.max_hours);
    }
}
