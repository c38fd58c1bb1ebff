//! Poisson workload driver (spec §5).
//!
//! Grounded in the stateful-FaaS simulator's event loop: a `StdRng` seeded
//! once up front, `rand_distr::Exp` sampling per independent arrival lane,
//! and a warmup/measured request counter. Each `(service, node)` pair gets
//! its own lane, matching the source's per-service-per-edge-router
//! independence; picking the next request is a linear scan for the
//! soonest-firing lane rather than a second heap, since the lane count is
//! small and fixed for a run.

use crate::ports::{Controller, Services, Topology};
use crate::task::{ClassId, FlowId, NodeId, ReceiverId, ServiceId, Time};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};

/// One sampled arrival ready to be turned into an admission attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadRequest {
    pub node: NodeId,
    pub service: ServiceId,
    pub class: ClassId,
    pub receiver: ReceiverId,
    pub flow_id: FlowId,
    pub time: Time,
    /// Whether this request falls in the measured window (past warmup) and
    /// should count toward collected statistics.
    pub log: bool,
}

struct Lane {
    service: ServiceId,
    node: NodeId,
    exp: Exp<f64>,
    next_time: Time,
}

/// Drives independent Poisson arrival lanes per `(service, node)`, merges
/// them with a shared [`Controller`]'s future-event heap, and stops once the
/// warmup-plus-measured request budget is spent and the heap has drained.
pub struct WorkloadDriver<'a> {
    rng: StdRng,
    lanes: Vec<Lane>,
    class_cdf: Vec<Vec<f64>>,
    beta: f64,
    n_warmup: u64,
    n_measured: u64,
    req_counter: u64,
    flow_counter: FlowId,
    topology: &'a dyn Topology,
}

impl<'a> WorkloadDriver<'a> {
    /// `rates[i][s]` is the Poisson arrival rate for service `s` at
    /// `nodes[i]`; a non-positive rate means that lane is absent from this
    /// run entirely. `class_cdf[s]` is service `s`'s cumulative traffic
    /// class distribution (spec §5.2).
    pub fn new(
        seed: u64,
        topology: &'a dyn Topology,
        services: &dyn Services,
        nodes: &[NodeId],
        rates: &[Vec<Time>],
        class_cdf: Vec<Vec<f64>>,
        beta: f64,
        n_warmup: u64,
        n_measured: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut lanes = Vec::new();
        for (i, &node) in nodes.iter().enumerate() {
            for service in 0..services.num_services() {
                let rate = rates[i][service];
                if rate <= 0.0 {
                    continue;
                }
                let exp = Exp::new(rate).expect("arrival rate must be positive");
                let next_time = exp.sample(&mut rng);
                lanes.push(Lane {
                    service,
                    node,
                    exp,
                    next_time,
                });
            }
        }
        Self {
            rng,
            lanes,
            class_cdf,
            beta,
            n_warmup,
            n_measured,
            req_counter: 0,
            flow_counter: 0,
            topology,
        }
    }

    pub fn requests_issued(&self) -> u64 {
        self.req_counter
    }

    fn sample_class(&mut self, service: ServiceId) -> ClassId {
        let u: f64 = self.rng.gen();
        let cdf = &self.class_cdf[service];
        cdf.iter()
            .position(|&bound| u <= bound)
            .unwrap_or_else(|| cdf.len().saturating_sub(1))
    }

    /// Uniform among receivers when `beta == 0`; otherwise degree-ranked
    /// with a truncated Zipf-like skew toward higher-degree receivers
    /// (spec §5.2's non-uniform receiver selection).
    fn sample_receiver(&mut self, node: NodeId) -> ReceiverId {
        let receivers = self.topology.receivers(node);
        if receivers.is_empty() {
            return node;
        }
        if self.beta == 0.0 {
            let idx = self.rng.gen_range(0..receivers.len());
            return receivers[idx];
        }
        let mut ranked = receivers;
        ranked.sort_by_key(|&r| std::cmp::Reverse(self.topology.degree(r)));
        let weights: Vec<f64> = (1..=ranked.len())
            .map(|rank| 1.0 / (rank as f64).powf(self.beta))
            .collect();
        let total: f64 = weights.iter().sum();
        let mut u: f64 = self.rng.gen::<f64>() * total;
        for (i, w) in weights.iter().enumerate() {
            if u <= *w {
                return ranked[i];
            }
            u -= w;
        }
        *ranked.last().expect("receivers is non-empty")
    }

    /// Advance past any controller events strictly earlier than the next
    /// arrival, then sample it. Returns `None` once the request budget is
    /// spent and the controller's heap has drained (spec §5.2's
    /// termination rule).
    pub fn next_request<C: Controller>(&mut self, controller: &mut C) -> Option<WorkloadRequest> {
        loop {
            let lane_idx = self
                .lanes
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.next_time.partial_cmp(&b.1.next_time).unwrap())
                .map(|(i, _)| i)?;
            let arrival_time = self.lanes[lane_idx].next_time;

            if let Some(pending) = controller.peek_time() {
                if pending < arrival_time {
                    controller.pop_before(arrival_time);
                    continue;
                }
            }

            let budget_spent = self.req_counter >= self.n_warmup + self.n_measured;
            if budget_spent && controller.peek_time().is_none() {
                return None;
            }

            let service = self.lanes[lane_idx].service;
            let node = self.lanes[lane_idx].node;
            let inter_arrival = self.lanes[lane_idx].exp.sample(&mut self.rng);
            self.lanes[lane_idx].next_time += inter_arrival;

            let class = self.sample_class(service);
            let receiver = self.sample_receiver(node);
            let flow_id = self.flow_counter;
            self.flow_counter += 1;
            let log = self.req_counter >= self.n_warmup;
            self.req_counter += 1;

            return Some(WorkloadRequest {
                node,
                service,
                class,
                receiver,
                flow_id,
                time: arrival_time,
                log,
            });
        }
    }
}
