//! Bus activity statistics collection and reporting.
//!
//! Tracks transaction counts, stream traffic, handshake stalls and reported
//! response codes for every engine attached to one simulation run.

use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// Statistics shared by the engines of one simulation run.
pub type SharedStats = Rc<RefCell<BusStats>>;

/// Bus activity counters.
///
/// Engines update these as transactions complete; the CLI prints them at the
/// end of a run and can emit them as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct BusStats {
    #[serde(skip)]
    start_time: Instant,
    pub cycles: u64,

    pub register_reads: u64,
    pub register_writes: u64,
    pub notable_responses: u64,

    pub transfers_sent: u64,
    pub transfers_received: u64,
    pub words_sent: u64,
    pub words_received: u64,

    /// Cycles spent waiting for a ready/valid partner, across all engines.
    pub handshake_stalls: u64,
}

impl Default for BusStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            register_reads: 0,
            register_writes: 0,
            notable_responses: 0,
            transfers_sent: 0,
            transfers_received: 0,
            words_sent: 0,
            words_received: 0,
            handshake_stalls: 0,
        }
    }
}

impl BusStats {
    /// Creates a fresh shared counter set.
    pub fn shared() -> SharedStats {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Serialises the counters as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Prints a formatted summary of the counters.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let cyc = if self.cycles == 0 { 1 } else { self.cycles };
        let khz = (self.cycles as f64 / seconds) / 1000.0;
        let transactions = self.register_reads + self.register_writes;

        println!("\n==========================================================");
        println!("BUS SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_cycles               {}", self.cycles);
        println!("sim_freq                 {:.2} kHz", khz);
        println!("----------------------------------------------------------");
        println!("REGISTER ACCESS");
        println!("  reg.reads              {}", self.register_reads);
        println!("  reg.writes             {}", self.register_writes);
        println!(
            "  reg.notable_responses  {} of {}",
            self.notable_responses, transactions
        );
        println!("----------------------------------------------------------");
        println!("STREAM TRAFFIC");
        println!(
            "  stream.sent            {} words in {} transfers",
            self.words_sent, self.transfers_sent
        );
        println!(
            "  stream.received        {} words in {} transfers",
            self.words_received, self.transfers_received
        );
        println!(
            "  handshake.stalls       {} ({:.2}%)",
            self.handshake_stalls,
            (self.handshake_stalls as f64 / cyc as f64) * 100.0
        );
        println!("==========================================================");
    }
}
