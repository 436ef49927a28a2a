//! Experimentation module for the CVRP solver.
//!
//! Runs the annealer repeatedly over different seeds, collects per-run
//! results, aggregates statistics, and exports CSV reports. Runs are fully
//! independent (one `Annealer` per seed), so they can execute in parallel
//! without sharing any solver state.

use crate::heuristics::{Annealer, AnnealingParams};
use crate::instance::VrpInstance;

use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of one annealing run on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Instance name
    pub instance: String,
    /// Seed used for this run
    pub seed: u64,
    /// Best distance found
    pub best_distance: f64,
    /// Distance of the final current solution
    pub current_distance: f64,
    /// Iterations completed
    pub iterations: u64,
    /// Delivery points construction could not place
    pub unassigned: usize,
    /// Wall-clock time in seconds
    pub time: f64,
}

/// Aggregated statistics over the runs on one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Instance name
    pub instance: String,
    /// Number of runs
    pub runs: usize,
    /// Best distance over all runs
    pub best: f64,
    /// Worst distance over all runs
    pub worst: f64,
    /// Mean best distance
    pub mean: f64,
    /// Sample standard deviation of best distances
    pub std_dev: f64,
    /// Mean wall-clock time per run
    pub mean_time: f64,
}

/// Experiment configuration
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Number of runs per instance; run i uses seed `params.seed + i`
    pub num_runs: usize,
    /// Step budget per run (construction included)
    pub max_steps: u64,
    /// Steps per `step` call
    pub batch_size: u64,
    /// Annealing parameters; the seed field is the base seed
    pub params: AnnealingParams,
    /// Run seeds in parallel
    pub parallel: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            num_runs: 10,
            max_steps: 100_000,
            batch_size: 1_000,
            params: AnnealingParams::default(),
            parallel: true,
        }
    }
}

/// Experiment engine
pub struct Experiment {
    config: ExperimentConfig,
    results: Vec<RunResult>,
}

impl Experiment {
    pub fn new(config: ExperimentConfig) -> Self {
        Experiment {
            config,
            results: Vec::new(),
        }
    }

    /// Run the configured number of seeds on an instance.
    pub fn run_instance(&mut self, instance: &VrpInstance) -> Result<(), String> {
        log::info!(
            "Running {} annealing runs on instance: {}",
            self.config.num_runs,
            instance.name
        );

        let seeds: Vec<u64> = (0..self.config.num_runs as u64)
            .map(|i| self.config.params.seed + i)
            .collect();

        let runs: Result<Vec<RunResult>, String> = if self.config.parallel {
            seeds
                .par_iter()
                .map(|&seed| Self::solve_once(instance, &self.config, seed))
                .collect()
        } else {
            seeds
                .iter()
                .map(|&seed| Self::solve_once(instance, &self.config, seed))
                .collect()
        };

        self.results.extend(runs?);
        Ok(())
    }

    /// One complete annealing run: construct, then batched steps until the
    /// temperature freezes or the step budget is exhausted.
    fn solve_once(
        instance: &VrpInstance,
        config: &ExperimentConfig,
        seed: u64,
    ) -> Result<RunResult, String> {
        let params = AnnealingParams { seed, ..config.params };
        let mut annealer = Annealer::new(instance.clone(), params)?;

        let start = Instant::now();
        let mut snapshot = annealer.step(1);
        while !annealer.is_frozen() && snapshot.iteration < config.max_steps {
            let before = snapshot.iteration;
            let remaining = config.max_steps - snapshot.iteration;
            snapshot = annealer.step(config.batch_size.min(remaining));
            if snapshot.iteration == before {
                // no move was available in the whole batch (degenerate
                // instance or single-truck fleet): the search cannot advance
                break;
            }
        }

        Ok(RunResult {
            instance: instance.name.clone(),
            seed,
            best_distance: snapshot.best_distance,
            current_distance: snapshot.current_distance,
            iterations: snapshot.iteration,
            unassigned: snapshot.unassigned,
            time: start.elapsed().as_secs_f64(),
        })
    }

    /// Aggregate per-instance statistics over all recorded runs.
    pub fn compute_statistics(&self) -> Vec<RunStatistics> {
        let mut names: Vec<String> = self.results.iter().map(|r| r.instance.clone()).collect();
        names.sort();
        names.dedup();

        let mut statistics = Vec::new();

        for name in names {
            let runs: Vec<&RunResult> = self
                .results
                .iter()
                .filter(|r| r.instance == name)
                .collect();

            let costs: Vec<f64> = runs.iter().map(|r| r.best_distance).collect();
            let times: Vec<f64> = runs.iter().map(|r| r.time).collect();

            let best = costs.iter().cloned().fold(f64::INFINITY, f64::min);
            let worst = costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mean = costs.iter().mean();
            let std_dev = if costs.len() > 1 { costs.iter().std_dev() } else { 0.0 };
            let mean_time = times.iter().mean();

            statistics.push(RunStatistics {
                instance: name,
                runs: runs.len(),
                best,
                worst,
                mean,
                std_dev,
                mean_time,
            });
        }

        statistics
    }

    /// Export per-run results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        let mut rows = self.results.clone();
        rows.sort_by_key(|r| (r.instance.clone(), OrderedFloat(r.best_distance)));

        for result in &rows {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export aggregated statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       CVRP Annealing Report\n");
        report.push_str("========================================\n\n");

        report.push_str(&format!(
            "{:<20} {:>6} {:>12} {:>12} {:>12} {:>10} {:>10}\n",
            "Instance", "Runs", "Best", "Mean", "Worst", "StdDev", "AvgTime"
        ));
        report.push_str("-".repeat(88).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<20} {:>6} {:>12.2} {:>12.2} {:>12.2} {:>10.2} {:>9.3}s\n",
                stat.instance, stat.runs, stat.best, stat.mean, stat.worst, stat.std_dev,
                stat.mean_time
            ));
        }
        report.push_str("-".repeat(88).as_str());
        report.push('\n');

        if let Some(best) = self
            .results
            .iter()
            .min_by_key(|r| OrderedFloat(r.best_distance))
        {
            report.push_str(&format!(
                "\nBest run: seed {} with distance {:.2} after {} iterations\n",
                best.seed, best.best_distance, best.iterations
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }
}

/// Timestamped output path for result files, e.g. `results/bench_20260807_143501.csv`
pub fn timestamped_path<P: AsRef<Path>>(dir: P, stem: &str, extension: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.as_ref().join(format!("{}_{}.{}", stem, stamp, extension))
}
