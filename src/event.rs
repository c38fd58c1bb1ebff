//! Event tagged union and wire-stable status codes (spec §3, §6).
//!
//! Module-level integer constants from the source are replaced by an
//! enumerated tag, per spec §9's rearchitecture note, while still exposing
//! `as_u8` so callers that need the wire-stable integer (spec §6) can get it.

use crate::task::{ClassId, FlowId, NodeId, ReceiverId, ServiceId, Time};
use std::str::FromStr;

/// Wire-stable event status tag (spec §6: REQUEST=0, RESPONSE=1, TASK_COMPLETE=2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Request,
    Response,
    TaskComplete,
}

impl EventStatus {
    pub fn as_u8(self) -> u8 {
        match self {
            EventStatus::Request => 0,
            EventStatus::Response => 1,
            EventStatus::TaskComplete => 2,
        }
    }
}

/// A future event on the controller's heap, or a workload-driver request.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub time: Time,
    pub receiver: ReceiverId,
    pub service: ServiceId,
    pub node: NodeId,
    pub flow_id: FlowId,
    pub traffic_class: ClassId,
    pub rtt_delay: Time,
    pub status: EventStatus,
}

/// Min-heap ordering by `time` (earliest first). Matches the Controller's
/// future-event heap (spec §5): single-writer (the spot), single-reader
/// (the workload driver).
impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        other.time.partial_cmp(&self.time)
    }
}

impl Eq for Event {}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.partial_cmp(other)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Wire-stable admission outcome code (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionReason {
    DeadlineMissed,
    Congestion,
    Success,
    Cloud,
    NoInstances,
}

impl AdmissionReason {
    pub fn as_u8(self) -> u8 {
        match self {
            AdmissionReason::DeadlineMissed => 0,
            AdmissionReason::Congestion => 1,
            AdmissionReason::Success => 2,
            AdmissionReason::Cloud => 3,
            AdmissionReason::NoInstances => 4,
        }
    }
}

/// Result of an admission attempt: accepted or not, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionOutcome {
    pub accepted: bool,
    pub reason: AdmissionReason,
}

impl AdmissionOutcome {
    pub fn new(accepted: bool, reason: AdmissionReason) -> Self {
        Self { accepted, reason }
    }
}

/// Scheduling discipline selected by name (spec §6: `"EDF"` / `"FIFO"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedPolicy {
    Edf,
    Fifo,
}

impl FromStr for SchedPolicy {
    type Err = crate::error::SpotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EDF" => Ok(SchedPolicy::Edf),
            "FIFO" => Ok(SchedPolicy::Fifo),
            other => Err(crate::error::SpotError::InvalidPolicy(other.to_string())),
        }
    }
}
