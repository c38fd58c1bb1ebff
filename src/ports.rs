//! External ports the engine is driven through (spec §5).
//!
//! The source reaches into a shared `NetworkModel` god-object for topology,
//! service catalog, and the event heap. Spec §9 splits that into three
//! narrow, object-safe traits, following the `Ingester` trait shape in the
//! teacher's ETL crate: small surface, `Send + Sync` so a spot can be driven
//! from a multi-threaded harness.

use crate::event::Event;
use crate::task::{ClassId, FlowId, NodeId, ServiceId, Time};

/// Per-service static parameters (spec §3's Service record, spec §6's
/// `Services` table): execution time, utility shape, and the service-level
/// delay envelope `u_min`/`utility` interpolate within.
pub trait Services: Send + Sync {
    /// Number of distinct services in the catalog.
    fn num_services(&self) -> usize;
    /// Fixed execution time for `service` on one core (`tau_s`).
    fn exec_time(&self, service: ServiceId) -> Time;
    /// Utility shape parameter `alpha_s` for `service`.
    fn alpha(&self, service: ServiceId) -> f64;
    /// Service-wide maximum tolerated delay (`maxD` in spec §4.7: the
    /// widest `max_delay[c]` this service is willing to serve at all).
    fn service_max_delay(&self, service: ServiceId) -> Time;
    /// Service-wide minimum delay offset folded into `u_min` (spec §4.7).
    fn service_min_delay(&self, service: ServiceId) -> Time;
}

/// Graph attributes the workload driver and the pricing engine need (spec
/// §6's `Topology` port): per-class delay budgets, receiver fan-out, and
/// the propagation delay to the cloud parent.
pub trait Topology: Send + Sync {
    /// Receivers reachable from `node` (e.g. the edge routers under it).
    fn receivers(&self, node: NodeId) -> Vec<NodeId>;
    /// Topological degree of `node`, used for degree-weighted receiver
    /// selection when the workload's skew parameter `beta != 0`.
    fn degree(&self, node: NodeId) -> usize;
    /// Fixed round-trip delay from `receiver` to the serving spot.
    fn rtt_delay(&self, receiver: NodeId, node: NodeId) -> Time;
    /// Number of traffic classes `n_classes` (spec §6).
    fn num_classes(&self) -> usize;
    /// Per-class deadline budget `max_delay[c]`.
    fn max_delay(&self, class: ClassId) -> Time;
    /// Per-class best-case user-to-access-router delay `min_delay[c]`.
    fn min_delay(&self, class: ClassId) -> Time;
    /// Height of the topology tree (spec §4.7's `delta` propagation term).
    fn height(&self) -> usize;
    /// Depth of `node` in the topology tree.
    fn depth(&self, node: NodeId) -> usize;
    /// Per-hop link delay used to derive `delta = (height - depth) * link_delay`.
    fn link_delay(&self) -> Time;
}

/// The shared future-event heap and execution accounting a spot and its
/// workload driver both read and write (spec §6).
pub trait Controller: Send + Sync {
    /// Push a future event onto the shared heap.
    fn schedule(&mut self, event: Event);
    /// Pop the earliest-time event strictly before `before`, if any.
    fn pop_before(&mut self, before: Time) -> Option<Event>;
    /// Peek the earliest scheduled time without removing it.
    fn peek_time(&self) -> Option<Time>;
    /// Record that `service` executed at `node` for `flow_id` (spec §6's
    /// `execute_service`), used for accounting and auction revenue.
    fn execute_service(&mut self, node: NodeId, service: ServiceId, flow_id: FlowId);
}
