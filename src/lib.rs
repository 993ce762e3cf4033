//! # oncosim
//!
//! Stochastic lattice simulation of tumor growth under innate immune
//! pressure.
//!
//! A single immortal cell seeded on a discrete 2D lattice proliferates
//! into a cell mass; finite-budget descendants age, divide, migrate and
//! undergo apoptosis, and once the simulated clock passes the immune
//! activation hour each apoptotic death recruits an immune cell from the
//! tissue exterior. The quantity of interest is the time until the
//! non-immune population goes extinct.
//!
//! ## Features
//!
//! - **Deterministic**: a single seeded RNG drives every random choice,
//!   so identical configs and seeds replay identical runs
//! - **Bounded**: extinction is emergent and not guaranteed; every run
//!   carries a configurable tick cap with a distinct reported outcome
//! - **Configurable**: YAML configuration files for every model constant
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oncosim::{Config, Lattice};
//!
//! let config = Config::default();
//! let mut lattice = Lattice::new_with_seed(config, 42);
//! lattice.seed_cell(50, 50, true);
//!
//! while !lattice.is_extinct() {
//!     lattice.advance(true);
//! }
//!
//! println!("extinct after {:.1} simulated hours", lattice.hour());
//! ```
//!
//! ## Batch statistics
//!
//! ```rust,no_run
//! use oncosim::{runner, Config};
//!
//! let summary = runner::run_batch(&Config::default(), 20, 1);
//! println!("{}", summary);
//! ```

pub mod cell;
pub mod config;
pub mod grid;
pub mod lattice;
pub mod runner;
pub mod stats;

// Re-export main types
pub use cell::{Cell, ImmuneCell, Occupant};
pub use config::Config;
pub use lattice::Lattice;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
