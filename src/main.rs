//! oncosim - CLI entry point
//!
//! Tumor-growth lattice simulator with an innate immune response.

use clap::{Parser, Subcommand};
use oncosim::{runner, Config, Lattice};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "oncosim")]
#[command(version)]
#[command(about = "Stochastic lattice simulation of tumor growth under immune pressure")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single simulation to extinction or the tick cap
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Override the configured tick cap
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Output directory for the population trajectory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Ticks between console stats lines
        #[arg(long, default_value = "50")]
        report_interval: u64,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Repeat the simulation and average the extinction times
    Batch {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of runs
        #[arg(short, long, default_value = "20")]
        runs: usize,

        /// Base seed; run i uses seed + i
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Output directory for the batch summary
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            seed,
            max_ticks,
            output,
            report_interval,
            quiet,
        } => run_simulation(config, seed, max_ticks, output, report_interval, quiet),

        Commands::Batch {
            config,
            runs,
            seed,
            output,
        } => run_batch(config, runs, seed, output),

        Commands::Init { output } => generate_config(output),
    }
}

fn load_config(config_path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    if config_path.exists() {
        println!("Loading config from: {:?}", config_path);
        Ok(Config::from_file(config_path)?)
    } else {
        println!("Using default configuration");
        Ok(Config::default())
    }
}

fn run_simulation(
    config_path: PathBuf,
    seed: Option<u64>,
    max_ticks: Option<u64>,
    output: PathBuf,
    report_interval: u64,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&config_path)?;
    if let Some(ticks) = max_ticks {
        config.safety.max_ticks = ticks;
    }

    std::fs::create_dir_all(&output)?;

    let mut lattice = match seed {
        Some(s) => Lattice::new_with_seed(config.clone(), s),
        None => Lattice::new(config.clone()),
    };
    let x = config.lattice.width / 2;
    let y = config.lattice.height / 2;
    lattice.seed_cell(x, y, config.lattice.seed_immortal);

    println!("Starting simulation");
    println!("  Seed: {}", lattice.seed());
    println!(
        "  Lattice: {}x{}",
        config.lattice.width, config.lattice.height
    );
    println!("  Tick cap: {}", config.safety.max_ticks);
    println!();

    let start = Instant::now();
    let interval = config.lattice.movement_interval;
    let report_interval = report_interval.max(1);

    let capped = loop {
        if lattice.is_extinct() {
            break false;
        }
        if lattice.tick() >= config.safety.max_ticks {
            break true;
        }
        lattice.advance(runner::movement_enabled(lattice.tick(), interval));

        if !quiet && lattice.tick() % report_interval == 0 {
            println!("{}", lattice.stats.summary());
        }
    };

    let elapsed = start.elapsed();
    let ticks_per_sec = lattice.tick() as f64 / elapsed.as_secs_f64();

    println!();
    if capped {
        println!("=== Tick Cap Reached ===");
        println!("Survivors: {}", lattice.non_immune_cell_count());
    } else {
        println!("=== Extinction ===");
    }
    println!("Simulated: {:.1} hours ({} ticks)", lattice.hour(), lattice.tick());
    println!("Immune cells: {}", lattice.immune_cell_count());
    println!("Immortal lineages: {}", lattice.immortal_lineages());
    println!("Wall time: {:.2}s ({:.0} ticks/s)", elapsed.as_secs_f64(), ticks_per_sec);

    // Save population trajectory
    let stats_path = output.join("stats_history.json");
    lattice
        .stats_history
        .save(stats_path.to_str().ok_or("invalid output path")?)?;
    println!("Trajectory: {:?}", stats_path);

    Ok(())
}

fn run_batch(
    config_path: PathBuf,
    runs: usize,
    seed: u64,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;

    std::fs::create_dir_all(&output)?;

    println!("Starting batch: {} runs, base seed {}", runs, seed);
    println!();

    let start = Instant::now();
    let summary = runner::run_batch(&config, runs, seed);
    let elapsed = start.elapsed();

    println!();
    println!("{}", summary);
    println!("Wall time: {:.2}s", elapsed.as_secs_f64());

    let summary_path = output.join("batch_summary.json");
    let json = serde_json::to_string_pretty(&summary)?;
    std::fs::write(&summary_path, json)?;
    println!("Summary: {:?}", summary_path);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
