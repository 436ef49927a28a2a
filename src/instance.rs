//! Module for parsing and representing CVRP instances.
//!
//! This module holds the static problem data for a solve: the depot, the
//! delivery points with their demands, and the truck fleet with per-truck
//! capacities. It supports Euclidean 2D distances and a TSPLIB-style file
//! format extended with a truck section.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use serde::{Deserialize, Serialize};

/// A single delivery point in the plane.
///
/// The depot is a `DeliveryPoint` with `demand == 0`; it is stored as node 0
/// of the instance and never appears inside a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPoint {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Quantity this point requires; consumes truck capacity
    pub demand: i32,
}

impl DeliveryPoint {
    pub fn new(x: f64, y: f64, demand: i32) -> Self {
        DeliveryPoint { x, y, demand }
    }

    /// A zero-demand point, suitable as a depot.
    pub fn depot(x: f64, y: f64) -> Self {
        DeliveryPoint { x, y, demand: 0 }
    }
}

/// One truck of the fleet. The fleet is a fixed ordered sequence; routes are
/// index-aligned with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truck {
    /// Maximum total demand this truck's route may carry
    pub capacity: i32,
}

impl Truck {
    pub fn new(capacity: i32) -> Self {
        Truck { capacity }
    }
}

/// Euclidean distance between two points.
#[inline]
pub fn euclidean(a: &DeliveryPoint, b: &DeliveryPoint) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// A complete CVRP instance: depot, delivery points, and truck fleet.
///
/// Node ids index into `nodes`: node 0 is the depot, nodes `1..=n` are the
/// delivery points. All data is immutable after construction; the distance
/// matrix is computed once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VrpInstance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// All nodes; `nodes[0]` is the depot
    pub nodes: Vec<DeliveryPoint>,
    /// The truck fleet, in fixed index order
    pub trucks: Vec<Truck>,
    /// Precomputed distance matrix over node ids
    #[serde(skip)]
    pub distance_matrix: Vec<Vec<f64>>,
}

impl VrpInstance {
    /// Build an instance from its parts.
    ///
    /// Rejects a depot with non-zero demand, negative point demands, and
    /// negative truck capacities; the optimization loop itself never errors,
    /// so bad configurations are caught here.
    pub fn new(
        depot: DeliveryPoint,
        points: Vec<DeliveryPoint>,
        trucks: Vec<Truck>,
        name: &str,
    ) -> Result<Self, String> {
        if depot.demand != 0 {
            return Err(format!("Depot demand must be 0, got {}", depot.demand));
        }
        if let Some(p) = points.iter().find(|p| p.demand < 0) {
            return Err(format!("Negative demand {} at ({}, {})", p.demand, p.x, p.y));
        }
        if let Some(t) = trucks.iter().find(|t| t.capacity < 0) {
            return Err(format!("Negative truck capacity {}", t.capacity));
        }

        let mut nodes = Vec::with_capacity(points.len() + 1);
        nodes.push(depot);
        nodes.extend(points);

        let distance_matrix = Self::compute_distance_matrix(&nodes);

        Ok(VrpInstance {
            name: name.to_string(),
            comment: String::new(),
            nodes,
            trucks,
            distance_matrix,
        })
    }

    /// Parse a CVRP instance from a TSPLIB-style file.
    ///
    /// Node 1 of the file is the depot. The fleet comes from a `TRUCKS:`
    /// header combined with a uniform `CAPACITY:`, or from an explicit
    /// `TRUCK_SECTION` with one `<id> <capacity>` line per truck.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let file = File::open(&path)
            .map_err(|e| format!("Cannot open file: {}", e))?;
        let reader = BufReader::new(file);

        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension = 0usize;
        let mut capacity = 0i32;
        let mut num_trucks = 0usize;
        let mut coords: Vec<(usize, f64, f64)> = Vec::new();
        let mut demands: Vec<(usize, i32)> = Vec::new();
        let mut truck_capacities: Vec<i32> = Vec::new();

        let mut section = String::new();

        for line in reader.lines() {
            let line = line.map_err(|e| format!("Read error: {}", e))?;
            let line = line.trim();

            if line.is_empty() || line == "EOF" {
                continue;
            }

            if line.starts_with("NAME:") {
                name = line.replace("NAME:", "").trim().to_string();
                continue;
            }
            if line.starts_with("COMMENT:") {
                comment = line.replace("COMMENT:", "").trim().to_string();
                continue;
            }
            if line.starts_with("DIMENSION:") {
                dimension = line.replace("DIMENSION:", "").trim()
                    .parse().map_err(|_| "Invalid dimension")?;
                continue;
            }
            if line.starts_with("CAPACITY:") {
                capacity = line.replace("CAPACITY:", "").trim()
                    .parse().map_err(|_| "Invalid capacity")?;
                continue;
            }
            if line.starts_with("TRUCKS:") {
                num_trucks = line.replace("TRUCKS:", "").trim()
                    .parse().map_err(|_| "Invalid truck count")?;
                continue;
            }
            if line.starts_with("EDGE_WEIGHT_TYPE:") {
                continue;
            }

            if line.starts_with("NODE_COORD_SECTION") {
                section = "coords".to_string();
                continue;
            }
            if line.starts_with("DEMAND_SECTION") {
                section = "demands".to_string();
                continue;
            }
            if line.starts_with("TRUCK_SECTION") {
                section = "trucks".to_string();
                continue;
            }
            if line.starts_with("DEPOT_SECTION") {
                section = "depot".to_string();
                continue;
            }

            match section.as_str() {
                "coords" => {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    if parts.len() >= 3 {
                        let id: usize = parts[0].parse().map_err(|_| "Invalid node id")?;
                        let x: f64 = parts[1].parse().map_err(|_| "Invalid x coordinate")?;
                        let y: f64 = parts[2].parse().map_err(|_| "Invalid y coordinate")?;
                        coords.push((id, x, y));
                    }
                }
                "demands" => {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    if parts.len() >= 2 {
                        let id: usize = parts[0].parse().map_err(|_| "Invalid node id")?;
                        let demand: i32 = parts[1].parse().map_err(|_| "Invalid demand")?;
                        demands.push((id, demand));
                    }
                }
                "trucks" => {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    if parts.len() >= 2 {
                        let cap: i32 = parts[1].parse().map_err(|_| "Invalid truck capacity")?;
                        truck_capacities.push(cap);
                    }
                }
                _ => {}
            }
        }

        if coords.is_empty() {
            return Err("No node coordinates found".to_string());
        }
        if dimension == 0 {
            dimension = coords.len();
        }

        coords.sort_by_key(|&(id, _, _)| id);

        let mut points = Vec::with_capacity(dimension.saturating_sub(1));
        let mut depot = None;
        for (id, x, y) in coords.iter().take(dimension) {
            let demand = demands.iter()
                .find(|(did, _)| did == id)
                .map(|&(_, d)| d)
                .unwrap_or(0);
            if *id == 1 {
                depot = Some(DeliveryPoint::depot(*x, *y));
            } else {
                points.push(DeliveryPoint::new(*x, *y, demand));
            }
        }
        let depot = depot.ok_or("No depot (node 1) found")?;

        let trucks: Vec<Truck> = if !truck_capacities.is_empty() {
            truck_capacities.into_iter().map(Truck::new).collect()
        } else if num_trucks > 0 {
            vec![Truck::new(capacity); num_trucks]
        } else {
            return Err("No fleet: expected TRUCKS: header or TRUCK_SECTION".to_string());
        };

        let mut instance = Self::new(depot, points, trucks, &name)?;
        instance.comment = comment;
        Ok(instance)
    }

    /// Compute the Euclidean distance matrix over all nodes.
    fn compute_distance_matrix(nodes: &[DeliveryPoint]) -> Vec<Vec<f64>> {
        let n = nodes.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    matrix[i][j] = euclidean(&nodes[i], &nodes[j]);
                }
            }
        }

        matrix
    }

    /// Get the distance between two nodes
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distance_matrix[i][j]
    }

    /// Get the demand of a node
    #[inline]
    pub fn demand(&self, node: usize) -> i32 {
        self.nodes[node].demand
    }

    /// The depot (node 0)
    #[inline]
    pub fn depot(&self) -> &DeliveryPoint {
        &self.nodes[0]
    }

    /// The delivery points, excluding the depot
    pub fn delivery_points(&self) -> &[DeliveryPoint] {
        &self.nodes[1..]
    }

    /// Number of delivery points (excluding the depot)
    pub fn num_deliveries(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Number of trucks in the fleet
    pub fn num_trucks(&self) -> usize {
        self.trucks.len()
    }

    /// Total demand of all nodes visited by a route.
    pub fn route_demand(&self, route: &[usize]) -> i32 {
        route.iter().map(|&n| self.demand(n)).sum()
    }

    /// Length of one route, traversed depot -> nodes -> depot.
    /// An empty route has length 0 (the truck stays home).
    pub fn route_distance(&self, route: &[usize]) -> f64 {
        if route.is_empty() {
            return 0.0;
        }

        let mut distance = self.distance(0, route[0]);
        for i in 0..route.len() - 1 {
            distance += self.distance(route[i], route[i + 1]);
        }
        distance += self.distance(route[route.len() - 1], 0);

        distance
    }

    /// Total length of a full set of routes.
    pub fn total_distance(&self, routes: &[Vec<usize>]) -> f64 {
        routes.iter().map(|r| self.route_distance(r)).sum()
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let total_demand: i32 = self.delivery_points().iter().map(|p| p.demand).sum();
        let total_capacity: i32 = self.trucks.iter().map(|t| t.capacity).sum();

        let mut distances: Vec<f64> = Vec::new();
        for i in 0..self.nodes.len() {
            for j in i + 1..self.nodes.len() {
                distances.push(self.distance(i, j));
            }
        }
        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);

        InstanceStatistics {
            name: self.name.clone(),
            num_points: self.num_deliveries(),
            num_trucks: self.num_trucks(),
            total_demand,
            total_capacity,
            avg_distance,
            max_distance,
        }
    }
}

/// Statistics about a CVRP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_points: usize,
    pub num_trucks: usize,
    pub total_demand: i32,
    pub total_capacity: i32,
    pub avg_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Delivery points: {}", self.num_points)?;
        writeln!(f, "  Trucks: {}", self.num_trucks)?;
        writeln!(f, "  Total demand: {}", self.total_demand)?;
        writeln!(f, "  Total fleet capacity: {}", self.total_capacity)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}
