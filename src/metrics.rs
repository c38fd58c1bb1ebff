//! Structured logging helpers (spec §5A ambient stack).
//!
//! The source reports admission and pricing outcomes with ad hoc `print`
//! statements. This follows the teacher crate's convention instead:
//! `tracing` events with typed fields at call sites, rather than a metrics
//! object threaded through every function.

use crate::event::{AdmissionOutcome, AdmissionReason};
use crate::task::{NodeId, ServiceId, Time};
use tracing::info;

/// Record an admission decision at `node` for `service`.
pub fn log_admission(node: NodeId, service: ServiceId, outcome: AdmissionOutcome) {
    info!(
        node,
        service,
        accepted = outcome.accepted,
        reason = reason_label(outcome.reason),
        "admission decision"
    );
}

/// Record a posted price change for `service` at `node`.
pub fn log_price_update(node: NodeId, service: ServiceId, price: Time) {
    info!(node, service, price, "price updated");
}

/// Record accumulated idle time for `node` (spec §4.1's `getIdleTime`).
pub fn log_idle_time(node: NodeId, idle: Time) {
    info!(node, idle, "idle time snapshot");
}

fn reason_label(reason: AdmissionReason) -> &'static str {
    match reason {
        AdmissionReason::DeadlineMissed => "deadline_missed",
        AdmissionReason::Congestion => "congestion",
        AdmissionReason::Success => "success",
        AdmissionReason::Cloud => "cloud",
        AdmissionReason::NoInstances => "no_instances",
    }
}
