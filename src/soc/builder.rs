//! System Builder.
//!
//! This module defines the `System` structure, the container for one
//! simulation bench: the clocked kernel, the device model, the reset
//! sequencer and the bus engines that drive the device. It handles the
//! wiring of all of them from a [`Config`].

use crate::bus::interface::{AxiLiteBus, AxiStreamBus};
use crate::bus::{Direction, Dma, Mmio, ResetSequencer, StreamChannel};
use crate::common::{BindError, SimError};
use crate::config::{ChannelConfig, Config};
use crate::kernel::Simulator;
use crate::soc::poly::PolyEval;
use crate::stats::{BusStats, SharedStats};

/// A complete bench ready to run.
pub struct System {
    /// Kernel that owns the clock, the signals and the device model.
    pub sim: Simulator,
    /// Sequencer gating every engine on device reset.
    pub reset: ResetSequencer,
    /// Register engine bound to the device's control port.
    pub mmio: Mmio,
    /// DMA engine bound to the device's stream ports.
    pub dma: Dma,
    /// Counters shared by every engine.
    pub stats: SharedStats,
}

impl System {
    /// Builds a system from `config`.
    ///
    /// Attaches a [`PolyEval`] device model, binds the register engine and
    /// the enabled DMA channels to its ports, and starts the reset sequence
    /// unless `reset.on_init` is disabled.
    ///
    /// # Arguments
    ///
    /// * `config` - Bench configuration.
    ///
    /// # Returns
    ///
    /// The wired system, with no simulated time elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Bind`] if a configured port or the reset line
    /// names a signal the device does not have.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        let mut sim = Simulator::new(config.simulation.period_steps);
        sim.set_watchdog(config.simulation.max_cycles);
        if config.simulation.trace {
            sim.enable_trace();
        }

        let dut = PolyEval::new(&mut sim, config.reset.active_low, config.dut.fifo_depth);
        sim.add_peripheral(Box::new(dut));

        let handle = sim.handle();
        let rst = handle
            .lookup(&config.reset.signal)
            .ok_or_else(|| BindError::UnknownSignal {
                interface: "reset".to_string(),
                line: "RST",
                signal: config.reset.signal.clone(),
            })?;
        let reset = ResetSequencer::new(handle.clone(), rst, config.reset.active_low);
        let stats = BusStats::shared();

        let ctrl = AxiLiteBus::bind(&handle, "mmio", &config.mmio.port_map())?;
        let mmio = Mmio::new(handle.clone(), ctrl, reset.clone())
            .with_range(config.mmio.base_addr_val(), config.mmio.range_val())
            .with_policy(config.simulation.response_policy)
            .with_stats(stats.clone());

        let channel = |name: &str,
                       cfg: &ChannelConfig,
                       direction: Direction|
         -> Result<Option<StreamChannel>, BindError> {
            if !cfg.enabled {
                return Ok(None);
            }
            let bus = AxiStreamBus::bind(&handle, name, &cfg.port_map())?;
            Ok(Some(StreamChannel::with_stats(
                handle.clone(),
                bus,
                direction,
                reset.clone(),
                stats.clone(),
            )))
        };
        let dma = Dma {
            send_channel: channel("dma.send", &config.dma.send, Direction::Transmit)?,
            recv_channel: channel("dma.recv", &config.dma.recv, Direction::Receive)?,
        };

        if config.reset.on_init {
            reset.start(config.reset.assert_cycles, config.reset.settle_cycles);
        } else {
            log::info!("reset on init disabled, engines wait for an explicit reset");
        }

        Ok(Self {
            sim,
            reset,
            mmio,
            dma,
            stats,
        })
    }

    /// Returns a snapshot of the statistics with the cycle count filled in.
    pub fn snapshot(&self) -> BusStats {
        let mut stats = self.stats.borrow().clone();
        stats.cycles = self.sim.cycle();
        stats
    }
}
