//! Simulated annealing controller for the CVRP.
//!
//! The `Annealer` owns the full search state (current and best solutions,
//! temperature, iteration counter) and advances it in bounded batches: the
//! caller asks for up to N steps, the annealer runs them synchronously and
//! returns a `Snapshot`. There is no background thread; multiple concurrent
//! solves require independent `Annealer` instances.
//!
//! The only move operator is a capacity-checked swap of one delivery point
//! between two routes. Intra-route reordering is out of scope.

use crate::heuristics::construction::{ConstructionHeuristic, RandomizedFirstFit};
use crate::instance::{DeliveryPoint, VrpInstance};
use crate::solution::Solution;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Parameters of the annealing schedule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnnealingParams {
    /// Starting temperature
    pub initial_temperature: f64,
    /// Multiplicative decay applied to the temperature each completed step
    pub cooling_rate: f64,
    /// Temperature floor; at or below it the annealer is frozen and further
    /// steps are no-ops. Also keeps the acceptance exponent finite.
    pub min_temperature: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for AnnealingParams {
    fn default() -> Self {
        AnnealingParams {
            initial_temperature: 1000.0,
            cooling_rate: 0.995,
            min_temperature: 1e-10,
            seed: 42,
        }
    }
}

/// Read-only view of the search state, handed to the presentation layer
/// after a batch of steps. Routes are materialized as point copies so the
/// consumer never touches solver internals.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Completed iterations, construction included
    pub iteration: u64,
    /// Distance of the actively explored (possibly worse) solution
    pub current_distance: f64,
    /// Distance of the best solution seen
    pub best_distance: f64,
    /// Best routes, one per truck, each an ordered point sequence
    pub best_routes: Vec<Vec<DeliveryPoint>>,
    /// Delivery points construction could not place on any truck
    pub unassigned: usize,
}

/// Simulated annealing search over route assignments.
///
/// Lifecycle: the first `step` call builds the initial solution via
/// [`RandomizedFirstFit`] and counts as exactly one iteration, with no
/// acceptance test. Every later call runs up to `count` Metropolis steps,
/// cooling the temperature geometrically, until the floor is reached.
pub struct Annealer {
    instance: VrpInstance,
    params: AnnealingParams,
    temperature: f64,
    iteration: u64,
    current_routes: Vec<Vec<usize>>,
    current_distance: f64,
    best_routes: Vec<Vec<usize>>,
    best_distance: f64,
    unassigned: usize,
    rng: ChaCha8Rng,
}

impl Annealer {
    /// Create a solver for an instance.
    ///
    /// Rejects a non-positive initial temperature, a cooling rate outside
    /// (0, 1), and a non-positive temperature floor. The step loop itself
    /// never errors; degenerate inputs degrade to no-ops.
    pub fn new(instance: VrpInstance, params: AnnealingParams) -> Result<Self, String> {
        if !(params.initial_temperature > 0.0) {
            return Err(format!(
                "Initial temperature must be > 0, got {}",
                params.initial_temperature
            ));
        }
        if !(params.cooling_rate > 0.0 && params.cooling_rate < 1.0) {
            return Err(format!(
                "Cooling rate must be in (0, 1), got {}",
                params.cooling_rate
            ));
        }
        if !(params.min_temperature > 0.0) {
            return Err(format!(
                "Minimum temperature must be > 0, got {}",
                params.min_temperature
            ));
        }

        let num_trucks = instance.num_trucks();
        Ok(Annealer {
            instance,
            temperature: params.initial_temperature,
            iteration: 0,
            current_routes: vec![Vec::new(); num_trucks],
            current_distance: f64::INFINITY,
            best_routes: vec![Vec::new(); num_trucks],
            best_distance: f64::INFINITY,
            unassigned: 0,
            rng: ChaCha8Rng::seed_from_u64(params.seed),
            params,
        })
    }

    /// Run up to `count` steps and return the latest snapshot.
    ///
    /// The very first call only constructs the initial solution, regardless
    /// of `count`. With no delivery points or no trucks the call is a no-op
    /// and the iteration counter stays at 0. Once the temperature has hit
    /// the floor, remaining steps are silently skipped.
    pub fn step(&mut self, count: u64) -> Snapshot {
        if self.instance.num_deliveries() == 0 || self.instance.num_trucks() == 0 {
            return self.snapshot();
        }

        if self.iteration == 0 {
            self.initialize();
            return self.snapshot();
        }

        for _ in 0..count {
            if self.temperature <= self.params.min_temperature {
                break;
            }

            let Some((candidate, candidate_distance)) = self.generate_neighbor() else {
                // no candidate this iteration: no cooling, no iteration cost
                continue;
            };

            let delta = candidate_distance - self.current_distance;
            let accept =
                delta < 0.0 || self.rng.gen::<f64>() < (-delta / self.temperature).exp();

            if accept {
                self.current_routes = candidate;
                self.current_distance = candidate_distance;
                if candidate_distance < self.best_distance {
                    self.best_routes = self.current_routes.clone();
                    self.best_distance = candidate_distance;
                }
            }

            self.temperature *= self.params.cooling_rate;
            self.iteration += 1;

            log::trace!(
                "iteration {}: current {:.2}, best {:.2}, temperature {:.4}",
                self.iteration,
                self.current_distance,
                self.best_distance,
                self.temperature
            );
        }

        self.snapshot()
    }

    /// Construction phase: build, evaluate, adopt as both current and best.
    fn initialize(&mut self) {
        let initial = RandomizedFirstFit::new().construct(&self.instance, &mut self.rng);
        self.unassigned = initial.unassigned(&self.instance).len();
        self.current_distance = initial.cost;
        self.current_routes = initial.routes;
        self.best_routes = self.current_routes.clone();
        self.best_distance = self.current_distance;
        self.iteration = 1;

        log::info!(
            "Initial solution: distance {:.2}, {} of {} points assigned",
            self.current_distance,
            self.instance.num_deliveries() - self.unassigned,
            self.instance.num_deliveries()
        );
    }

    /// Propose a neighbor by swapping one point between two routes.
    ///
    /// Returns `None` when no candidate exists this iteration: fewer than two
    /// routes, an empty route drawn, or a swap that would overload either
    /// truck. Point order inside each route is preserved apart from the two
    /// exchanged positions.
    fn generate_neighbor(&mut self) -> Option<(Vec<Vec<usize>>, f64)> {
        let n = self.current_routes.len();
        if n < 2 {
            return None;
        }

        let r1 = self.rng.gen_range(0..n);
        let mut r2 = self.rng.gen_range(0..n - 1);
        if r2 >= r1 {
            r2 += 1;
        }

        if self.current_routes[r1].is_empty() || self.current_routes[r2].is_empty() {
            return None;
        }

        let i1 = self.rng.gen_range(0..self.current_routes[r1].len());
        let i2 = self.rng.gen_range(0..self.current_routes[r2].len());
        let node1 = self.current_routes[r1][i1];
        let node2 = self.current_routes[r2][i2];

        let demand1 = self.instance.route_demand(&self.current_routes[r1])
            - self.instance.demand(node1)
            + self.instance.demand(node2);
        let demand2 = self.instance.route_demand(&self.current_routes[r2])
            - self.instance.demand(node2)
            + self.instance.demand(node1);

        if demand1 > self.instance.trucks[r1].capacity
            || demand2 > self.instance.trucks[r2].capacity
        {
            return None;
        }

        let mut candidate = self.current_routes.clone();
        candidate[r1][i1] = node2;
        candidate[r2][i2] = node1;
        let distance = self.instance.total_distance(&candidate);

        Some((candidate, distance))
    }

    /// Current read-only view of the search state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            iteration: self.iteration,
            current_distance: self.current_distance,
            best_distance: self.best_distance,
            best_routes: self
                .best_routes
                .iter()
                .map(|route| route.iter().map(|&n| self.instance.nodes[n]).collect())
                .collect(),
            unassigned: self.unassigned,
        }
    }

    /// The best solution found so far, as a standalone [`Solution`].
    pub fn best_solution(&self) -> Solution {
        let mut solution =
            Solution::from_routes(&self.instance, self.best_routes.clone(), "SimulatedAnnealing");
        solution.iterations = Some(self.iteration);
        solution
    }

    /// Whether the temperature has reached the floor
    pub fn is_frozen(&self) -> bool {
        self.temperature <= self.params.min_temperature
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn best_distance(&self) -> f64 {
        self.best_distance
    }

    pub fn current_distance(&self) -> f64 {
        self.current_distance
    }

    pub fn instance(&self) -> &VrpInstance {
        &self.instance
    }

    pub fn params(&self) -> &AnnealingParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Truck;

    fn two_point_instance() -> VrpInstance {
        VrpInstance::new(
            DeliveryPoint::depot(0.0, 0.0),
            vec![
                DeliveryPoint::new(10.0, 0.0, 1),
                DeliveryPoint::new(0.0, 10.0, 1),
            ],
            vec![Truck::new(2)],
            "two-points",
        )
        .unwrap()
    }

    fn clustered_instance() -> VrpInstance {
        // two clusters far apart; the optimum serves each with one truck
        let mut points = Vec::new();
        for i in 0..5 {
            points.push(DeliveryPoint::new(i as f64, 0.0, 1));
            points.push(DeliveryPoint::new(100.0 + i as f64, 0.0, 1));
        }
        VrpInstance::new(
            DeliveryPoint::depot(50.0, 0.0),
            points,
            vec![Truck::new(5), Truck::new(5)],
            "clusters",
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let instance = two_point_instance();
        for params in [
            AnnealingParams { initial_temperature: 0.0, ..Default::default() },
            AnnealingParams { initial_temperature: -5.0, ..Default::default() },
            AnnealingParams { cooling_rate: 0.0, ..Default::default() },
            AnnealingParams { cooling_rate: 1.0, ..Default::default() },
            AnnealingParams { cooling_rate: 1.5, ..Default::default() },
            AnnealingParams { min_temperature: 0.0, ..Default::default() },
        ] {
            assert!(Annealer::new(instance.clone(), params).is_err());
        }
    }

    #[test]
    fn test_first_step_constructs_once() {
        let mut annealer =
            Annealer::new(two_point_instance(), AnnealingParams::default()).unwrap();

        // requesting many steps on the first call still only constructs
        let snap = annealer.step(1000);
        assert_eq!(snap.iteration, 1);
        assert_eq!(snap.current_distance, snap.best_distance);

        // both possible visit orders form the same triangle
        let expected = 10.0 + 200.0f64.sqrt() + 10.0;
        assert!((snap.best_distance - expected).abs() < 1e-10);
        assert_eq!(snap.best_routes.len(), 1);
        assert_eq!(snap.best_routes[0].len(), 2);
        assert_eq!(snap.unassigned, 0);

        // no temperature was consumed by construction
        assert_eq!(annealer.temperature(), 1000.0);
    }

    #[test]
    fn test_best_solution_view() {
        let mut annealer = Annealer::new(
            clustered_instance(),
            AnnealingParams { seed: 2, ..Default::default() },
        )
        .unwrap();
        annealer.step(1);
        annealer.step(200);

        let best = annealer.best_solution();
        assert!(best.feasible);
        assert!(best.is_complete(annealer.instance()));
        assert_eq!(best.iterations, Some(annealer.iteration()));
        assert!((best.cost - annealer.best_distance()).abs() < 1e-10);
    }

    #[test]
    fn test_no_points_means_no_op() {
        let instance = VrpInstance::new(
            DeliveryPoint::depot(0.0, 0.0),
            vec![],
            vec![Truck::new(5), Truck::new(5)],
            "empty",
        )
        .unwrap();
        let mut annealer = Annealer::new(instance, AnnealingParams::default()).unwrap();

        for _ in 0..3 {
            let snap = annealer.step(100);
            assert_eq!(snap.iteration, 0);
            assert_eq!(snap.best_distance, f64::INFINITY);
        }
        assert_eq!(annealer.temperature(), 1000.0);
    }

    #[test]
    fn test_no_trucks_means_no_op() {
        let instance = VrpInstance::new(
            DeliveryPoint::depot(0.0, 0.0),
            vec![DeliveryPoint::new(1.0, 1.0, 1)],
            vec![],
            "no-fleet",
        )
        .unwrap();
        let mut annealer = Annealer::new(instance, AnnealingParams::default()).unwrap();

        let snap = annealer.step(100);
        assert_eq!(snap.iteration, 0);
    }

    #[test]
    fn test_single_truck_has_no_moves() {
        let mut annealer =
            Annealer::new(two_point_instance(), AnnealingParams::default()).unwrap();
        annealer.step(1);

        // with one route there is no swap partner: iteration and
        // temperature stay put however many steps are requested
        let snap = annealer.step(500);
        assert_eq!(snap.iteration, 1);
        assert_eq!(annealer.temperature(), 1000.0);
    }

    #[test]
    fn test_swap_preserves_structure() {
        let instance = VrpInstance::new(
            DeliveryPoint::depot(0.0, 0.0),
            vec![
                DeliveryPoint::new(10.0, 0.0, 1),
                DeliveryPoint::new(0.0, 10.0, 1),
            ],
            vec![Truck::new(1), Truck::new(1)],
            "one-each",
        )
        .unwrap();
        let mut annealer = Annealer::new(instance, AnnealingParams::default()).unwrap();
        annealer.step(1);

        // equal demands: the swap is always capacity-feasible and always
        // produces a structurally valid candidate
        for _ in 0..50 {
            let (candidate, _) = annealer.generate_neighbor().expect("swap always available");
            assert_eq!(candidate.len(), 2);
            assert_eq!(candidate[0].len(), 1);
            assert_eq!(candidate[1].len(), 1);
            let mut nodes: Vec<usize> = candidate.iter().flatten().cloned().collect();
            nodes.sort_unstable();
            assert_eq!(nodes, vec![1, 2]);
        }
    }

    #[test]
    fn test_swap_exchanges_positions_in_place() {
        let instance = VrpInstance::new(
            DeliveryPoint::depot(0.0, 0.0),
            (0..6)
                .map(|i| DeliveryPoint::new(i as f64, 1.0, 1))
                .collect(),
            vec![Truck::new(3), Truck::new(3)],
            "ordered",
        )
        .unwrap();
        let mut annealer = Annealer::new(instance, AnnealingParams::default()).unwrap();
        annealer.step(1);
        let before = annealer.current_routes.clone();

        for _ in 0..50 {
            let (candidate, distance) = annealer.generate_neighbor().expect("swap available");
            assert!((distance - annealer.instance.total_distance(&candidate)).abs() < 1e-10);

            // exactly one position differs per route; everything else is untouched
            for (old, new) in before.iter().zip(&candidate) {
                assert_eq!(old.len(), new.len());
                let changed = old.iter().zip(new).filter(|(a, b)| a != b).count();
                assert_eq!(changed, 1);
            }
        }
    }

    #[test]
    fn test_capacity_invariant_holds_throughout() {
        let mut annealer = Annealer::new(
            clustered_instance(),
            AnnealingParams { seed: 3, ..Default::default() },
        )
        .unwrap();
        annealer.step(1);

        for _ in 0..30 {
            annealer.step(20);
            assert!(Solution::routes_feasible(
                &annealer.instance,
                &annealer.current_routes
            ));
            assert!(Solution::routes_feasible(
                &annealer.instance,
                &annealer.best_routes
            ));
        }
    }

    #[test]
    fn test_best_distance_never_increases() {
        let mut annealer = Annealer::new(
            clustered_instance(),
            AnnealingParams { seed: 11, ..Default::default() },
        )
        .unwrap();

        let mut previous = annealer.step(1).best_distance;
        for _ in 0..40 {
            let snap = annealer.step(50);
            assert!(snap.best_distance <= previous + 1e-12);
            assert!(snap.best_distance <= snap.current_distance + 1e-12);
            previous = snap.best_distance;
        }
    }

    #[test]
    fn test_frozen_annealer_is_a_no_op() {
        let params = AnnealingParams {
            initial_temperature: 1.0,
            cooling_rate: 0.5,
            min_temperature: 0.25,
            seed: 5,
        };
        let mut annealer = Annealer::new(clustered_instance(), params).unwrap();
        annealer.step(1);

        // 1.0 -> 0.5 -> 0.25: two cooled steps reach the floor
        annealer.step(10_000);
        assert!(annealer.is_frozen());

        let frozen = annealer.snapshot();
        for _ in 0..5 {
            let snap = annealer.step(1000);
            assert_eq!(snap.iteration, frozen.iteration);
            assert_eq!(snap.current_distance, frozen.current_distance);
            assert_eq!(snap.best_distance, frozen.best_distance);
        }
    }

    #[test]
    fn test_cooling_applies_regardless_of_acceptance() {
        let mut annealer = Annealer::new(
            clustered_instance(),
            AnnealingParams { seed: 17, ..Default::default() },
        )
        .unwrap();
        annealer.step(1);
        annealer.step(10);

        // every counted step cools: temperature is initial * rate^(iteration - 1)
        let steps = annealer.iteration() - 1;
        let expected = 1000.0 * 0.995f64.powi(steps as i32);
        assert!((annealer.temperature() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_replay() {
        let params = AnnealingParams { seed: 123, ..Default::default() };
        let mut a = Annealer::new(clustered_instance(), params).unwrap();
        let mut b = Annealer::new(clustered_instance(), params).unwrap();

        for _ in 0..10 {
            let sa = a.step(100);
            let sb = b.step(100);
            assert_eq!(sa.iteration, sb.iteration);
            assert_eq!(sa.current_distance, sb.current_distance);
            assert_eq!(sa.best_distance, sb.best_distance);
        }
    }

    #[test]
    fn test_search_improves_clustered_instance() {
        let mut annealer = Annealer::new(
            clustered_instance(),
            AnnealingParams { seed: 7, ..Default::default() },
        )
        .unwrap();
        let initial = annealer.step(1).best_distance;

        let mut snap = annealer.snapshot();
        for _ in 0..100 {
            if annealer.is_frozen() {
                break;
            }
            snap = annealer.step(100);
        }

        assert!(snap.best_distance <= initial);
        assert!(Solution::routes_feasible(
            &annealer.instance,
            &annealer.best_routes
        ));
    }
}
