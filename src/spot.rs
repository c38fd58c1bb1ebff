//! `ComputationalSpot`: the admission, scheduling, and pricing engine for
//! one edge node (spec §3-§4), bound to a single [`Controller`] type `C`
//! rather than a `dyn Controller` (spec §9: one spot talks to exactly one
//! controller instance, so static dispatch costs nothing and keeps the
//! vtable out of the hot path).

use crate::admission::{admit_auction, admit_edf, admit_fifo};
use crate::config::SpotConfig;
use crate::cpu::CpuState;
use crate::error::SpotResult;
use crate::event::{AdmissionOutcome, SchedPolicy};
use crate::ports::{Controller, Services, Topology};
use crate::pricing::PricingEngine;
use crate::scheduler;
use crate::task::{NodeId, ServiceId, Task, Time};
use std::collections::VecDeque;
use tracing::instrument;

/// One edge computational spot: its cores, its admission queue, and the
/// VM instances currently assigned to each service.
pub struct ComputationalSpot<C: Controller> {
    node: NodeId,
    cpu: CpuState,
    queue: VecDeque<Task>,
    policy: SchedPolicy,
    is_cloud: bool,
    instances: Vec<usize>,
    /// Per-service, `numFree - 1`-indexed posted price (spec §3, §4.8).
    prices: Vec<Vec<f64>>,
    /// Per-service, per-class admitted rate from the last `compute_prices`
    /// clearing (spec §3's pricing state).
    admitted_class_rate: Vec<Vec<f64>>,
    admitted_rate: Vec<f64>,
    config: SpotConfig,
    controller: C,
}

impl<C: Controller> ComputationalSpot<C> {
    pub fn new(
        node: NodeId,
        num_cores: usize,
        num_services: usize,
        policy: SchedPolicy,
        is_cloud: bool,
        config: SpotConfig,
        controller: C,
    ) -> Self {
        Self {
            node,
            cpu: CpuState::new(num_cores),
            queue: VecDeque::new(),
            policy,
            is_cloud,
            instances: vec![0; num_services],
            prices: vec![vec![config.pricing.initial_price; num_cores]; num_services],
            admitted_class_rate: vec![Vec::new(); num_services],
            admitted_rate: vec![0.0; num_services],
            config,
            controller,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn idle_time(&self) -> Time {
        self.cpu.idle()
    }

    pub fn instances(&self, service: ServiceId) -> usize {
        self.instances[service]
    }

    /// This service's posted price at every `numFree` band, `1..=num_cores`
    /// (spec §3's `vmPrices`).
    pub fn prices(&self, service: ServiceId) -> &[f64] {
        &self.prices[service]
    }

    /// Per-class admitted rate from the last `compute_prices` clearing
    /// (spec §3's `admittedServiceClassRate`).
    pub fn admitted_class_rate(&self, service: ServiceId) -> &[f64] {
        &self.admitted_class_rate[service]
    }

    /// Total admitted rate across classes from the last clearing (spec §3's
    /// `admittedServiceRate`).
    pub fn admitted_rate(&self, service: ServiceId) -> Time {
        self.admitted_rate[service]
    }

    /// Grant `count` fresh instances of `service` (initial VM provisioning,
    /// not a reassignment from another service).
    pub fn provision(&mut self, service: ServiceId, count: usize) {
        self.instances[service] += count;
    }

    /// Admit `task` under this spot's configured FIFO or EDF policy (spec
    /// §4.3-§4.4). A cloud-sink spot short-circuits straight to an
    /// immediate `TASK_COMPLETE` (spec §4.3 step 1).
    #[instrument(skip(self, task), fields(node = self.node, service = task.service))]
    pub fn admit_task(&mut self, task: Task, now: Time) -> AdmissionOutcome {
        self.cpu.advance(now);
        match self.policy {
            SchedPolicy::Fifo => admit_fifo(
                &mut self.queue,
                &self.cpu,
                &self.instances,
                self.is_cloud,
                &mut self.controller,
                self.node,
                task,
                now,
            ),
            SchedPolicy::Edf => admit_edf(
                &mut self.queue,
                &self.cpu,
                &self.instances,
                self.is_cloud,
                &mut self.controller,
                self.node,
                task,
                now,
            ),
        }
    }

    /// Admit `task` through the price-based auction instead of the queue
    /// policy (spec §4.5).
    #[instrument(skip(self, task, services, topology), fields(node = self.node, service = task.service))]
    pub fn admit_task_auction(
        &mut self,
        task: &Task,
        services: &dyn Services,
        topology: &dyn Topology,
        now: Time,
    ) -> AdmissionOutcome {
        admit_auction(
            &mut self.cpu,
            &mut self.controller,
            self.node,
            task,
            services,
            topology,
            &self.prices[task.service],
            self.config.pricing.u_max,
            now,
        )
    }

    /// Place the next eligible queued task onto a free core (spec §4.2).
    pub fn schedule(&mut self, now: Time) -> Option<Task> {
        scheduler::schedule(
            &mut self.cpu,
            &mut self.queue,
            &self.instances,
            &mut self.controller,
            self.node,
            now,
        )
    }

    /// Move one instance from `from` to `to` (spec §4.1's VM reassignment).
    /// Fails if `from` currently has zero instances to give up.
    pub fn reassign_vm(&mut self, from: ServiceId, to: ServiceId) -> SpotResult<()> {
        if self.instances[from] == 0 {
            return Err(crate::error::SpotError::ReassignFromEmpty { service: from });
        }
        self.instances[from] -= 1;
        self.instances[to] += 1;
        Ok(())
    }

    /// Recompute this spot's posted prices and admitted rates from current
    /// offered load per service and class (spec §4.7-§4.8).
    pub fn compute_prices(
        &mut self,
        services: &dyn Services,
        topology: &dyn Topology,
        loads: &[Vec<Time>],
        capacities: &[Time],
    ) -> SpotResult<()> {
        let engine = PricingEngine::new(self.config.pricing);
        let num_cores = self.cpu.num_cores();
        match engine.compute_prices(services, topology, self.node, loads, capacities, num_cores) {
            Ok(output) => {
                self.prices = output.vm_prices;
                self.admitted_class_rate = output.admitted_service_class_rate;
                self.admitted_rate = output.admitted_service_rate;
                Ok(())
            }
            // Pricing non-convergence is numeric, not a logical-misuse
            // error (spec §7); keep the previous prices rather than abort.
            Err(_) => Ok(()),
        }
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }
}
