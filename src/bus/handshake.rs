//! Handshake waiting.

use crate::kernel::{Signal, SimHandle};

/// Waits until `line` is observed high at a settle point.
///
/// Samples at the next settle point; while the line is low, advances one
/// edge and samples again. Returns with the line high and the caller still
/// inside that settle point, so the handshake completes on the following
/// edge.
///
/// # Returns
///
/// The number of extra cycles spent waiting (0 if the line was already high).
pub async fn wait_for_high(sim: &SimHandle, line: &Signal) -> u64 {
    sim.settle().await;
    let mut stalls = 0;
    while !line.is_high() {
        sim.next_edge().await;
        sim.settle().await;
        stalls += 1;
    }
    stalls
}
