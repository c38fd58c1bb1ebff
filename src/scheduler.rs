//! Dry-run finish-time simulation shared by FIFO and EDF admission, and the
//! real placement step once a task has been admitted (spec §4.2-§4.4).
//!
//! The source's `simulate_execution` does a `copy.deepcopy` of the whole
//! `CpuInfo`, replays the queue onto it, and reads back projected finish
//! times to test deadline feasibility before committing. `CpuState` being
//! `Clone` makes that the same one-line snapshot here.

use crate::cpu::CpuState;
use crate::event::{Event, EventStatus};
use crate::ports::Controller;
use crate::task::{NodeId, ServiceId, Task, Time};
use std::collections::VecDeque;

/// Project a finish time for every task in `tasks`, in the order given,
/// without mutating `cpu`. Each task is placed on the earliest-available
/// core provided the number of VMs of its service already running in the
/// simulation is strictly less than `instance_caps[service]` (spec §4.2's
/// "VM availability" constraint); once that cap is saturated, the task
/// instead waits for the occupant of that service closest to freeing up.
/// A `0` cap is the "service replacement transition" hole (spec §4.2, §9):
/// the task is treated as immediately placeable rather than blocked.
pub fn simulate_finish_times(
    cpu: &CpuState,
    tasks: &[Task],
    now: Time,
    instance_caps: &[usize],
) -> Vec<Time> {
    let mut sim = cpu.clone();
    sim.advance(now);
    let mut finishes = Vec::with_capacity(tasks.len());
    for task in tasks {
        let cap = instance_caps.get(task.service).copied().unwrap_or(0);
        let (core, start) = if cap == 0 || sim.count_running(task.service) < cap {
            let core = sim.next_available_core();
            let start = sim.finish_time(core).max(now);
            (core, start)
        } else {
            let (core, finish) = sim
                .earliest_core_running(task.service)
                .expect("VM availability cap saturated implies an existing occupant");
            (core, finish.max(now))
        };
        let finish = start + task.exec_time;
        sim.assign(core, finish, task.service)
            .expect("simulated core is always free no later than `start`");
        finishes.push(finish);
    }
    finishes
}

/// Place the first queued task whose service has an available VM instance
/// (or is already running on a core) onto the earliest-free core of the
/// real `cpu` state. Returns the placed task with `finish_time` set, or
/// `None` if no core is free or no queued task can be placed right now. On
/// placement, records the execution and emits the task's `TASK_COMPLETE`
/// event through `controller` (spec §2, §6).
pub fn schedule<C: Controller>(
    cpu: &mut CpuState,
    queue: &mut VecDeque<Task>,
    instance_caps: &[usize],
    controller: &mut C,
    node: NodeId,
    now: Time,
) -> Option<Task> {
    let (core, num_free) = cpu.earliest_core(now);
    let core = core?;
    if num_free == 0 {
        return None;
    }
    let idx = queue.iter().position(|task| {
        let cap = instance_caps.get(task.service).copied().unwrap_or(0);
        cpu.count_running(task.service) < cap || cpu.core_running(task.service) == Some(core)
    })?;
    let mut task = queue.remove(idx)?;
    let finish = now + task.exec_time;
    cpu.assign(core, finish, task.service).ok()?;
    task.finish_time = Some(finish);
    controller.execute_service(node, task.service, task.flow_id);
    controller.schedule(Event {
        time: finish,
        receiver: task.receiver,
        service: task.service,
        node,
        flow_id: task.flow_id,
        traffic_class: task.class,
        rtt_delay: task.rtt_delay,
        status: EventStatus::TaskComplete,
    });
    Some(task)
}
