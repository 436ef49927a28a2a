//! CVRP Solver - Command Line Interface
//!
//! Presentation layer for the simulated annealing CVRP solver: loads an
//! instance, drives the annealer in batches, and reports snapshots.

use clap::{Parser, Subcommand};
use cvrp_sa::benchmark::{timestamped_path, Experiment, ExperimentConfig};
use cvrp_sa::heuristics::{Annealer, AnnealingParams};
use cvrp_sa::instance::VrpInstance;
use cvrp_sa::visualization::Visualizer;
use indicatif::{ProgressBar, ProgressStyle};

use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "cvrp-sa")]
#[command(version = "1.0")]
#[command(about = "A simulated annealing solver for the capacitated VRP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance with simulated annealing
    Solve {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Initial temperature
        #[arg(short, long, default_value = "1000.0")]
        temperature: f64,

        /// Cooling rate, in (0, 1)
        #[arg(short, long, default_value = "0.995")]
        cooling_rate: f64,

        /// Temperature floor; the search freezes at or below it
        #[arg(long, default_value = "1e-10")]
        min_temperature: f64,

        /// Iteration budget
        #[arg(long, default_value = "100000")]
        steps: u64,

        /// Steps per batch between progress updates
        #[arg(short, long, default_value = "1000")]
        batch: u64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Write an SVG rendering of the best routes next to the instance
        #[arg(long)]
        visualize: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Run repeated seeds on an instance and aggregate statistics
    Bench {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of runs
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Iteration budget per run
        #[arg(long, default_value = "100000")]
        steps: u64,

        /// Initial temperature
        #[arg(short, long, default_value = "1000.0")]
        temperature: f64,

        /// Cooling rate, in (0, 1)
        #[arg(short, long, default_value = "0.995")]
        cooling_rate: f64,

        /// Base random seed; run i uses seed + i
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output directory for CSV results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Print the aggregate statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            instance,
            temperature,
            cooling_rate,
            min_temperature,
            steps,
            batch,
            seed,
            visualize,
            verbose,
        } => {
            solve_instance(
                &instance,
                AnnealingParams {
                    initial_temperature: temperature,
                    cooling_rate,
                    min_temperature,
                    seed,
                },
                steps,
                batch,
                visualize,
                verbose,
            );
        }

        Commands::Analyze { instance } => {
            analyze_instance(&instance);
        }

        Commands::Bench {
            instance,
            runs,
            steps,
            temperature,
            cooling_rate,
            seed,
            output,
            json,
        } => {
            run_bench(
                &instance,
                ExperimentConfig {
                    num_runs: runs,
                    max_steps: steps,
                    params: AnnealingParams {
                        initial_temperature: temperature,
                        cooling_rate,
                        seed,
                        ..Default::default()
                    },
                    ..Default::default()
                },
                &output,
                json,
            );
        }
    }
}

fn load_instance(path: &PathBuf) -> VrpInstance {
    println!("Loading instance from {:?}...", path);
    match VrpInstance::from_file(path) {
        Ok(instance) => instance,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn solve_instance(
    path: &PathBuf,
    params: AnnealingParams,
    steps: u64,
    batch: u64,
    visualize: bool,
    verbose: bool,
) {
    let instance = load_instance(path);

    if verbose {
        println!("{}", instance.statistics());
    }

    let mut annealer = match Annealer::new(instance.clone(), params) {
        Ok(annealer) => annealer,
        Err(e) => {
            eprintln!("Invalid solver configuration: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Annealing for up to {} steps (T0 {}, cooling {})...",
        steps, params.initial_temperature, params.cooling_rate
    );
    let start = Instant::now();

    let mut snapshot = annealer.step(1);
    if snapshot.iteration == 0 {
        println!("Nothing to solve: the instance has no delivery points or no trucks.");
        return;
    }

    let progress = ProgressBar::new(steps);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );
    progress.set_position(snapshot.iteration);

    while !annealer.is_frozen() && snapshot.iteration < steps {
        let before = snapshot.iteration;
        let remaining = steps - snapshot.iteration;
        snapshot = annealer.step(batch.min(remaining));
        if snapshot.iteration == before {
            // no move was available in the whole batch: stop early
            break;
        }
        progress.set_position(snapshot.iteration);
        progress.set_message(format!("best {:.2}", snapshot.best_distance));
    }
    progress.finish_and_clear();

    let elapsed = start.elapsed();

    println!("\n========== Results ==========");
    println!("Iterations: {}", snapshot.iteration);
    println!("Best distance: {:.2}", snapshot.best_distance);
    println!("Current distance: {:.2}", snapshot.current_distance);
    println!("Final temperature: {:.6}", annealer.temperature());
    println!("Frozen: {}", annealer.is_frozen());
    println!("Time: {:.4}s", elapsed.as_secs_f64());
    if snapshot.unassigned > 0 {
        println!(
            "WARNING: {} delivery points could not be assigned to any truck",
            snapshot.unassigned
        );
    }

    if verbose {
        let best = annealer.best_solution();
        println!("\n{}", best);
        for (i, demand) in best.route_demands(&instance).iter().enumerate() {
            println!("  Route {} demand: {}/{}", i, demand, instance.trucks[i].capacity);
        }
    }

    if visualize {
        let svg_path = path.with_extension("svg");
        match Visualizer::new().save_svg(&instance, &snapshot, &svg_path) {
            Ok(()) => println!("\nVisualization saved to {:?}", svg_path),
            Err(e) => eprintln!("Failed to write visualization: {}", e),
        }
    }
}

fn analyze_instance(path: &PathBuf) {
    let instance = load_instance(path);
    let stats = instance.statistics();
    println!("{}", stats);

    if stats.total_demand > stats.total_capacity {
        println!(
            "Note: total demand {} exceeds fleet capacity {}; construction will drop points.",
            stats.total_demand, stats.total_capacity
        );
    }
}

fn run_bench(path: &PathBuf, config: ExperimentConfig, output: &PathBuf, json: bool) {
    let instance = load_instance(path);

    let mut experiment = Experiment::new(config);
    if let Err(e) = experiment.run_instance(&instance) {
        eprintln!("Benchmark failed: {}", e);
        std::process::exit(1);
    }

    println!("{}", experiment.generate_report());

    if json {
        let stats = experiment.compute_statistics();
        println!("{}", serde_json::to_string_pretty(&stats).unwrap());
    }

    if let Err(e) = std::fs::create_dir_all(output) {
        eprintln!("Cannot create output directory {:?}: {}", output, e);
        std::process::exit(1);
    }

    let runs_path = timestamped_path(output, "runs", "csv");
    let stats_path = timestamped_path(output, "summary", "csv");
    match experiment.export_to_csv(&runs_path) {
        Ok(()) => println!("Per-run results saved to {:?}", runs_path),
        Err(e) => eprintln!("Failed to write {:?}: {}", runs_path, e),
    }
    match experiment.export_statistics_csv(&stats_path) {
        Ok(()) => println!("Summary saved to {:?}", stats_path),
        Err(e) => eprintln!("Failed to write {:?}: {}", stats_path, e),
    }
}
