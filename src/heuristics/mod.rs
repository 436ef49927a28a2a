//! Heuristics module for the CVRP solver.
//!
//! This module exports the construction heuristic and the annealing engine.

pub mod construction;
pub mod annealing;

pub use construction::*;
pub use annealing::*;
