//! CVRP Solver Library
//!
//! A capacitated Vehicle Routing Problem solver based on simulated annealing.
//!
//! # Features
//!
//! - Randomized first-fit construction of an initial feasible solution
//! - Simulated annealing with a capacity-checked cross-route swap move
//! - Batched, synchronous stepping with snapshot reporting for presentation layers
//! - Deterministic replay via seedable RNG
//! - Multi-seed experiments and SVG visualization
//!
//! # Example
//!
//! ```no_run
//! use cvrp_sa::instance::{DeliveryPoint, Truck, VrpInstance};
//! use cvrp_sa::heuristics::{Annealer, AnnealingParams};
//!
//! let instance = VrpInstance::new(
//!     DeliveryPoint::depot(0.0, 0.0),
//!     vec![
//!         DeliveryPoint::new(10.0, 0.0, 1),
//!         DeliveryPoint::new(0.0, 10.0, 1),
//!     ],
//!     vec![Truck::new(1), Truck::new(1)],
//!     "example",
//! ).unwrap();
//!
//! let mut annealer = Annealer::new(instance, AnnealingParams::default()).unwrap();
//!
//! // first call constructs the initial solution; later calls anneal in batches
//! let mut snapshot = annealer.step(1);
//! while !annealer.is_frozen() && snapshot.iteration < 10_000 {
//!     snapshot = annealer.step(1_000);
//! }
//!
//! println!("Best distance: {:.2}", snapshot.best_distance);
//! ```

pub mod instance;
pub mod solution;
pub mod heuristics;
pub mod benchmark;
pub mod visualization;

pub use heuristics::{Annealer, AnnealingParams, Snapshot};
pub use instance::{DeliveryPoint, Truck, VrpInstance};
pub use solution::Solution;
