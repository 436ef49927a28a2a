//! Initial solution construction for the CVRP.

use crate::instance::VrpInstance;
use crate::solution::Solution;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Trait for construction heuristics. The RNG is passed in explicitly so
/// callers control seeding and replay.
pub trait ConstructionHeuristic {
    fn construct(&self, instance: &VrpInstance, rng: &mut ChaCha8Rng) -> Solution;
    fn name(&self) -> &str;
}

/// Randomized First-Fit construction.
///
/// Shuffles the delivery points into a uniformly random order, then assigns
/// each point to the first truck (in fleet index order) whose remaining
/// capacity can take its demand. A point no truck has room for is dropped
/// from the solution; this is an accepted limitation of the heuristic, not
/// an error. Different permutations yield different feasible solutions.
pub struct RandomizedFirstFit;

impl RandomizedFirstFit {
    pub fn new() -> Self {
        RandomizedFirstFit
    }
}

impl Default for RandomizedFirstFit {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for RandomizedFirstFit {
    fn construct(&self, instance: &VrpInstance, rng: &mut ChaCha8Rng) -> Solution {
        let start = std::time::Instant::now();

        let mut order: Vec<usize> = (1..=instance.num_deliveries()).collect();
        order.shuffle(rng);

        let mut routes = vec![Vec::new(); instance.num_trucks()];
        let mut used = vec![0i32; instance.num_trucks()];

        for node in order {
            let demand = instance.demand(node);
            for (i, truck) in instance.trucks.iter().enumerate() {
                if used[i] + demand <= truck.capacity {
                    routes[i].push(node);
                    used[i] += demand;
                    break;
                }
            }
        }

        let mut solution = Solution::from_routes(instance, routes, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();

        let dropped = instance.num_deliveries() - solution.num_assigned();
        if dropped > 0 {
            log::warn!(
                "Construction dropped {} of {} delivery points: no truck has room",
                dropped,
                instance.num_deliveries()
            );
        }

        solution
    }

    fn name(&self) -> &str {
        "RandomizedFirstFit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{DeliveryPoint, Truck};

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn test_assigns_all_points_when_capacity_suffices() {
        let instance = VrpInstance::new(
            DeliveryPoint::depot(0.0, 0.0),
            vec![
                DeliveryPoint::new(10.0, 0.0, 1),
                DeliveryPoint::new(0.0, 10.0, 1),
            ],
            vec![Truck::new(2)],
            "both-fit",
        )
        .unwrap();

        let solution = RandomizedFirstFit::new().construct(&instance, &mut rng(1));
        assert!(solution.is_complete(&instance));
        assert!(solution.feasible);
        assert_eq!(solution.routes[0].len(), 2);

        // both orders yield the same triangle depot -> p1 -> p2 -> depot
        let expected = 10.0 + 200.0f64.sqrt() + 10.0;
        assert!((solution.cost - expected).abs() < 1e-10);
    }

    #[test]
    fn test_first_fit_scans_trucks_in_order() {
        let instance = VrpInstance::new(
            DeliveryPoint::depot(0.0, 0.0),
            vec![DeliveryPoint::new(1.0, 0.0, 1)],
            vec![Truck::new(5), Truck::new(5)],
            "first-truck",
        )
        .unwrap();

        // single point always lands on truck 0
        for seed in 0..10 {
            let solution = RandomizedFirstFit::new().construct(&instance, &mut rng(seed));
            assert_eq!(solution.routes[0], vec![1]);
            assert!(solution.routes[1].is_empty());
        }
    }

    #[test]
    fn test_drops_points_without_room() {
        let instance = VrpInstance::new(
            DeliveryPoint::depot(0.0, 0.0),
            vec![
                DeliveryPoint::new(1.0, 0.0, 3),
                DeliveryPoint::new(2.0, 0.0, 3),
            ],
            vec![Truck::new(3)],
            "one-fits",
        )
        .unwrap();

        let solution = RandomizedFirstFit::new().construct(&instance, &mut rng(7));
        assert_eq!(solution.num_assigned(), 1);
        assert_eq!(solution.unassigned(&instance).len(), 1);
        assert!(solution.feasible);
    }

    #[test]
    fn test_never_violates_capacity() {
        let instance = VrpInstance::new(
            DeliveryPoint::depot(0.0, 0.0),
            (0..20)
                .map(|i| DeliveryPoint::new(i as f64, (i % 5) as f64, 1 + (i % 4)))
                .collect(),
            vec![Truck::new(10), Truck::new(8), Truck::new(6)],
            "tight",
        )
        .unwrap();

        for seed in 0..25 {
            let solution = RandomizedFirstFit::new().construct(&instance, &mut rng(seed));
            assert!(solution.feasible, "seed {} violated capacity", seed);
            for node in solution.routes.iter().flatten() {
                assert!(*node >= 1 && *node <= instance.num_deliveries());
            }
        }
    }

    #[test]
    fn test_deterministic_for_a_seed() {
        let instance = VrpInstance::new(
            DeliveryPoint::depot(0.0, 0.0),
            (0..10)
                .map(|i| DeliveryPoint::new(i as f64, 1.0, 1))
                .collect(),
            vec![Truck::new(4), Truck::new(4), Truck::new(4)],
            "replay",
        )
        .unwrap();

        let a = RandomizedFirstFit::new().construct(&instance, &mut rng(99));
        let b = RandomizedFirstFit::new().construct(&instance, &mut rng(99));
        assert_eq!(a.routes, b.routes);
    }
}
