//! Utility computation and iterative market-clearing price discovery
//! (spec §4.6-§4.8).
//!
//! The source's outer loop repeatedly solves a per-service LP subproblem
//! (`stage1AppSPCompactRequestedTraffic`) to decide how much of each class's
//! offered load a service accepts at the current price, then nudges the
//! price up or down depending on whether that allocation over- or
//! under-shoots capacity. Spec §9 replaces the LP call with its closed
//! form: a box-constrained linear objective accepts a class's full load
//! whenever that class's utility clears the price, and nothing otherwise.
//! The outer tâtonnement loop (decrement-until-infeasible-then-back-off,
//! bounded by `lastTurn`) is unchanged, and its per-iteration price is
//! banked into the `numFree`-indexed `vmPrices` table as capacity opens up,
//! matching the source's `updateVMPrices` band-filling.

use crate::config::PricingConfig;
use crate::error::{PricingError, PricingResult};
use crate::ports::{Services, Topology};
use crate::task::{ClassId, NodeId, ServiceId, Time};
use tracing::{debug, warn};

fn signed_pow(base: f64, exp: f64) -> f64 {
    base.signum() * base.abs().powf(exp)
}

/// Propagation delay to the spot's cloud parent: `(height - depth) *
/// link_delay` (spec §4.7).
fn propagation_delay(topology: &dyn Topology, node: NodeId) -> Time {
    let height = topology.height();
    let depth = topology.depth(node);
    height.saturating_sub(depth) as f64 * topology.link_delay()
}

/// Utility floor for class `c` at service `s` (spec §4.7):
/// `((service_max_delay - class_max_delay[c] + service_min_delay) /
/// service_max_delay)^(1/alpha) * u_max`. Zero service-wide delay collapses
/// to a zero floor rather than dividing by zero.
pub fn u_min(
    service_max_delay: Time,
    service_min_delay: Time,
    class_max_delay: Time,
    alpha: f64,
    u_max: f64,
) -> f64 {
    if service_max_delay <= 0.0 {
        return 0.0;
    }
    let ratio = (service_max_delay - class_max_delay + service_min_delay) / service_max_delay;
    signed_pow(ratio, 1.0 / alpha) * u_max
}

/// Per-class utility `u(s, c)` (spec §4.7). May be negative when the class's
/// propagation-inclusive minimum delay already exceeds its own deadline
/// budget; callers must treat a negative result as "cannot be served",
/// never clamp it to zero.
pub fn utility(
    services: &dyn Services,
    topology: &dyn Topology,
    node: NodeId,
    service: ServiceId,
    class: ClassId,
    u_max: f64,
) -> f64 {
    let alpha = services.alpha(service);
    let service_max_delay = services.service_max_delay(service);
    let service_min_delay = services.service_min_delay(service);
    let class_max_delay = topology.max_delay(class);
    let class_min_delay = topology.min_delay(class);
    let floor = u_min(service_max_delay, service_min_delay, class_max_delay, alpha, u_max);
    if service_max_delay <= 0.0 {
        return floor;
    }
    let delta = propagation_delay(topology, node);
    let ratio = (class_max_delay - (delta + class_min_delay)) / service_max_delay;
    floor + (u_max - floor) * signed_pow(ratio, 1.0 / alpha)
}

/// Utility table for every `(service, class)` pair the catalog defines.
pub fn compute_utilities(
    services: &dyn Services,
    topology: &dyn Topology,
    node: NodeId,
    u_max: f64,
) -> Vec<Vec<f64>> {
    (0..services.num_services())
        .map(|s| {
            (0..topology.num_classes())
                .map(|c| utility(services, topology, node, s, c, u_max))
                .collect()
        })
        .collect()
}

/// Closed-form substitute for the source's per-service LP subproblem:
/// admits a class's full offered load when its utility clears the posted
/// price, nothing otherwise (spec §9). Rates below `lp_epsilon` in absolute
/// value are treated as zero (spec §4.8).
fn accepted_load(utilities: &[f64], loads: &[f64], price: f64, lp_epsilon: f64) -> f64 {
    let total: f64 = utilities
        .iter()
        .zip(loads.iter())
        .map(|(&u, &load)| if u > price { load } else { 0.0 })
        .sum();
    if total.abs() < lp_epsilon {
        0.0
    } else {
        total
    }
}

/// One service's cleared output: a `numFree`-indexed price vector plus the
/// per-class and total admitted rate at the price that finally cleared
/// (spec §3's pricing state, §6's `compute_prices` contract).
pub struct ServicePricing {
    pub vm_prices: Vec<f64>,
    pub admitted_class_rate: Vec<f64>,
    pub admitted_rate: f64,
}

/// `compute_prices`'s full output (spec §6): per-service `vmPrices`, each of
/// length `num_cores` and indexed by `numFree - 1`, plus the admitted rates
/// from the final clearing.
pub struct PricingOutput {
    pub vm_prices: Vec<Vec<f64>>,
    pub admitted_service_class_rate: Vec<Vec<f64>>,
    pub admitted_service_rate: Vec<f64>,
}

/// Drives the outer price-discovery loop for every service independently.
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// Find a clearing price band per service: `loads[s][c]` is the offered
    /// load of class `c` at service `s`, `capacities[s]` the instance-hours
    /// the service can honor this epoch, `num_cores` the spot's VM count
    /// `K` that bounds the length of each service's `vmPrices` vector.
    pub fn compute_prices(
        &self,
        services: &dyn Services,
        topology: &dyn Topology,
        node: NodeId,
        loads: &[Vec<f64>],
        capacities: &[f64],
        num_cores: usize,
    ) -> PricingResult<PricingOutput> {
        let utilities = compute_utilities(services, topology, node, self.config.u_max);
        let mut vm_prices = Vec::with_capacity(loads.len());
        let mut admitted_service_class_rate = Vec::with_capacity(loads.len());
        let mut admitted_service_rate = Vec::with_capacity(loads.len());
        for s in 0..loads.len() {
            let cleared =
                self.clear_one_service(s, &utilities[s], &loads[s], capacities[s], num_cores)?;
            vm_prices.push(cleared.vm_prices);
            admitted_service_class_rate.push(cleared.admitted_class_rate);
            admitted_service_rate.push(cleared.admitted_rate);
        }
        Ok(PricingOutput {
            vm_prices,
            admitted_service_class_rate,
            admitted_service_rate,
        })
    }

    fn clear_one_service(
        &self,
        service: ServiceId,
        utilities: &[f64],
        loads: &[f64],
        capacity: f64,
        num_cores: usize,
    ) -> PricingResult<ServicePricing> {
        let mut price = self.config.initial_price;
        let mut last_turn = false;
        let mut vm_prices: Vec<f64> = Vec::with_capacity(num_cores);

        for _ in 0..self.config.max_iterations {
            let accepted = accepted_load(utilities, loads, price, self.config.lp_epsilon);
            let objective = capacity - accepted - self.config.phi;

            let requested_capacity = (accepted.floor().max(0.0) as usize).min(num_cores);
            while vm_prices.len() < requested_capacity {
                vm_prices.push(price);
            }

            if objective.abs() <= self.config.objective_epsilon {
                debug!(service, price, objective, "price cleared");
                break;
            }
            if objective < -self.config.objective_epsilon {
                price += self.config.price_decrement;
                last_turn = false;
            } else if last_turn {
                break;
            } else {
                price = (price - self.config.price_decrement).max(0.0);
                if price == 0.0 {
                    last_turn = true;
                }
            }

            if requested_capacity >= num_cores {
                break;
            }
        }

        let final_objective =
            capacity - accepted_load(utilities, loads, price, self.config.lp_epsilon) - self.config.phi;
        if vm_prices.len() < num_cores && final_objective < -self.config.objective_epsilon * 10.0 {
            warn!(service, price, "pricing loop did not converge");
            return Err(PricingError::Infeasible);
        }
        while vm_prices.len() < num_cores {
            vm_prices.push(0.0);
        }

        let last_price = vm_prices.last().copied().unwrap_or(0.0);
        let admitted_class_rate: Vec<f64> = utilities
            .iter()
            .zip(loads.iter())
            .map(|(&u, &load)| if u > last_price { load } else { 0.0 })
            .collect();
        let admitted_rate = admitted_class_rate.iter().sum();

        Ok(ServicePricing {
            vm_prices,
            admitted_class_rate,
            admitted_rate,
        })
    }
}
