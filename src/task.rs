//! Value types for admitted work (spec §3, §9 "dynamic attribute access on
//! Task" rearchitecture: a fixed-field struct instead of duck-typed
//! attributes, with `finish_time` starting at `None` instead of a sentinel).

/// Index of a service in the external `Services` table.
pub type ServiceId = usize;
/// Index of a traffic class in `[0, C)`.
pub type ClassId = usize;
/// Identifier of a node (computational spot) in the topology.
pub type NodeId = usize;
/// Identifier of a receiver.
pub type ReceiverId = usize;
/// Unique-per-request flow identifier.
pub type FlowId = u64;
/// Simulated time, in seconds.
pub type Time = f64;

/// A unit of admitted work queued or running at a computational spot.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Arrival time.
    pub arrival: Time,
    /// Absolute deadline (`max_delay[c] + arrival` on the EDF/FIFO path).
    pub deadline: Time,
    /// Round-trip delay budget already consumed getting here.
    pub rtt_delay: Time,
    /// The spot this task is queued at.
    pub node: NodeId,
    /// Requested service.
    pub service: ServiceId,
    /// Service's fixed execution time (`tau_s`).
    pub exec_time: Time,
    /// Unique flow identifier for this request.
    pub flow_id: FlowId,
    /// Requesting receiver.
    pub receiver: ReceiverId,
    /// Traffic class of the originating request, carried through for
    /// auction pricing and rate accounting (spec §3, §4.5).
    pub class: ClassId,
    /// Projected finish time, set once the task is placed by the dry-run
    /// simulation or by `schedule`. `None` until then.
    pub finish_time: Option<Time>,
}

impl Task {
    pub fn new(
        arrival: Time,
        deadline: Time,
        rtt_delay: Time,
        node: NodeId,
        service: ServiceId,
        exec_time: Time,
        flow_id: FlowId,
        receiver: ReceiverId,
        class: ClassId,
    ) -> Self {
        Self {
            arrival,
            deadline,
            rtt_delay,
            node,
            service,
            exec_time,
            flow_id,
            receiver,
            class,
            finish_time: None,
        }
    }

    /// Invariant checked on admission (spec §3): `d - rtt >= f`.
    pub fn is_feasible(&self) -> bool {
        match self.finish_time {
            Some(f) => self.deadline - self.rtt_delay >= f,
            None => false,
        }
    }
}
