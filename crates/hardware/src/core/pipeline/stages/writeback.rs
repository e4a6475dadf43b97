//! Writeback Stage: broadcast the common data bus.
//!
//! All forwarding for a broadcast happens before its producer station is released, so no consumer
//! can observe a released station whose value it has not received.

use tracing::debug;

use crate::core::Cpu;
use crate::core::pipeline::cdb::CdbEntry;

/// Executes the writeback stage. Returns the broadcast that was drained, if any.
///
/// # Panics
///
/// Panics if the broadcast's producer is not the only station holding its ROB index, or if the
/// ROB entry was already written back.
pub fn writeback_stage(cpu: &mut Cpu) -> Option<CdbEntry> {
    let entry = *cpu.cdb.data()?;

    cpu.stations
        .forward(entry.rs_index, entry.rob_index, entry.result);

    let producer = cpu.stations.find_producer(entry.rob_index);
    assert_eq!(
        producer,
        Some(entry.rs_index),
        "broadcast of rob{} from rs{} does not match its producer station",
        entry.rob_index,
        entry.rs_index
    );
    let rd = cpu.stations.get(entry.rs_index).inst.rd;
    cpu.stations.release(entry.rs_index);
    let _ = cpu.rst.clear_if_match(rd, entry.rs_index);

    match entry.fault {
        Some(fault) => cpu.rob.fault(entry.rob_index, fault),
        None => cpu.rob.complete(entry.rob_index, entry.result),
    }

    let _ = cpu.cdb.pop();
    cpu.stats.cdb_broadcasts += 1;
    debug!(
        rob = entry.rob_index,
        rs = entry.rs_index,
        result = entry.result,
        "writeback"
    );
    Some(entry)
}
