//! Solution representation and manipulation for the CVRP.
//!
//! A solution assigns delivery points to truck routes, one ordered route per
//! truck, index-aligned with the fleet. The depot is implicit at both ends of
//! every route and never stored.

use crate::instance::VrpInstance;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Represents a solution to the CVRP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// One route per truck; each route is an ordered sequence of node ids
    pub routes: Vec<Vec<usize>>,
    /// Total travel distance over all routes
    pub cost: f64,
    /// Whether every route respects its truck's capacity
    pub feasible: bool,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<u64>,
}

impl Solution {
    /// Create an empty solution with one empty route per truck
    pub fn empty(num_trucks: usize) -> Self {
        Solution {
            routes: vec![Vec::new(); num_trucks],
            cost: f64::INFINITY,
            feasible: false,
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Create a solution from a set of routes, evaluating cost and feasibility
    pub fn from_routes(instance: &VrpInstance, routes: Vec<Vec<usize>>, algorithm: &str) -> Self {
        let cost = instance.total_distance(&routes);
        let feasible = Self::routes_feasible(instance, &routes);

        Solution {
            routes,
            cost,
            feasible,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Re-evaluate cost and feasibility after the routes changed
    pub fn validate(&mut self, instance: &VrpInstance) {
        self.cost = instance.total_distance(&self.routes);
        self.feasible = Self::routes_feasible(instance, &self.routes);
    }

    /// Capacity feasibility: every route's demand within its truck's capacity.
    /// Requires one route per truck.
    pub fn routes_feasible(instance: &VrpInstance, routes: &[Vec<usize>]) -> bool {
        routes.len() == instance.num_trucks()
            && routes.iter().zip(&instance.trucks).all(|(route, truck)| {
                instance.route_demand(route) <= truck.capacity
            })
    }

    /// Per-route demand totals, index-aligned with the fleet
    pub fn route_demands(&self, instance: &VrpInstance) -> Vec<i32> {
        self.routes.iter().map(|r| instance.route_demand(r)).collect()
    }

    /// Number of delivery points assigned to some route
    pub fn num_assigned(&self) -> usize {
        self.routes.iter().map(|r| r.len()).sum()
    }

    /// Check that every delivery point appears in exactly one route
    pub fn is_complete(&self, instance: &VrpInstance) -> bool {
        if self.num_assigned() != instance.num_deliveries() {
            return false;
        }

        let unique: HashSet<usize> = self.routes.iter().flatten().cloned().collect();
        unique.len() == instance.num_deliveries() && !unique.contains(&0)
    }

    /// Delivery points left out of every route.
    /// Construction drops points no truck has room for; this surfaces them.
    pub fn unassigned(&self, instance: &VrpInstance) -> Vec<usize> {
        let assigned: HashSet<usize> = self.routes.iter().flatten().cloned().collect();
        (1..=instance.num_deliveries())
            .filter(|n| !assigned.contains(n))
            .collect()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Feasible: {}", self.feasible)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        for (i, route) in self.routes.iter().enumerate() {
            writeln!(f, "  Route {}: {:?}", i, route)?;
        }
        Ok(())
    }
}
