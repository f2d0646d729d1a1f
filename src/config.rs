use crate::bus::interface::{prefixed_ports, AxiLiteBus, AxiStreamBus, PortMap};
use crate::bus::reset::{DEFAULT_ASSERT_CYCLES, DEFAULT_SETTLE_CYCLES};
use crate::bus::ResponsePolicy;
use crate::common::SimError;
use crate::kernel::{DEFAULT_MAX_CYCLES, DEFAULT_PERIOD_STEPS};
use crate::soc::poly::{
    CONTROL_PREFIX, DEFAULT_FIFO_DEPTH, INPUT_PREFIX, OUTPUT_PREFIX, RESET_SIGNAL,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const MMIO_BASE: u64 = 0x43c1_0000;
const MMIO_RANGE: u64 = 0x1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub reset: ResetConfig,
    #[serde(default)]
    pub dut: DutConfig,
    #[serde(default)]
    pub mmio: MmioConfig,
    #[serde(default)]
    pub dma: DmaConfig,
}

impl Config {
    /// Parses a configuration from TOML text.
    ///
    /// Missing sections and keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the text is not valid TOML or a key
    /// has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, SimError> {
        toml::from_str(text).map_err(|e| SimError::Config(e.to_string()))
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_period_steps")]
    pub period_steps: u64,

    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,

    #[serde(default)]
    pub trace: bool,

    #[serde(default)]
    pub response_policy: ResponsePolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            period_steps: default_period_steps(),
            max_cycles: default_max_cycles(),
            trace: false,
            response_policy: ResponsePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetConfig {
    #[serde(default = "default_reset_signal")]
    pub signal: String,

    #[serde(default = "default_true")]
    pub active_low: bool,

    #[serde(default = "default_assert_cycles")]
    pub assert_cycles: u64,

    #[serde(default = "default_settle_cycles")]
    pub settle_cycles: u64,

    /// Run the reset sequence as soon as the system is built.
    #[serde(default = "default_true")]
    pub on_init: bool,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            signal: default_reset_signal(),
            active_low: true,
            assert_cycles: default_assert_cycles(),
            settle_cycles: default_settle_cycles(),
            on_init: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DutConfig {
    #[serde(default = "default_fifo_depth")]
    pub fifo_depth: usize,
}

impl Default for DutConfig {
    fn default() -> Self {
        Self {
            fifo_depth: default_fifo_depth(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MmioConfig {
    #[serde(default = "default_mmio_base")]
    pub base_addr: String,

    #[serde(default = "default_mmio_range")]
    pub range: String,

    /// Physical signal names are `<prefix>_<LINE>` unless overridden in `ports`.
    #[serde(default = "default_control_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub ports: PortMap,
}

impl MmioConfig {
    pub fn base_addr_val(&self) -> u64 {
        parse_hex(&self.base_addr, MMIO_BASE)
    }

    pub fn range_val(&self) -> u64 {
        parse_hex(&self.range, MMIO_RANGE)
    }

    pub fn port_map(&self) -> PortMap {
        overlay(prefixed_ports(&self.prefix, &AxiLiteBus::LINES), &self.ports)
    }
}

impl Default for MmioConfig {
    fn default() -> Self {
        Self {
            base_addr: default_mmio_base(),
            range: default_mmio_range(),
            prefix: default_control_prefix(),
            ports: PortMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DmaConfig {
    #[serde(default = "default_send")]
    pub send: ChannelConfig,

    #[serde(default = "default_recv")]
    pub recv: ChannelConfig,
}

impl Default for DmaConfig {
    fn default() -> Self {
        Self {
            send: default_send(),
            recv: default_recv(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Required whenever the channel's table is present.
    pub prefix: String,

    #[serde(default)]
    pub ports: PortMap,
}

impl ChannelConfig {
    pub fn port_map(&self) -> PortMap {
        overlay(prefixed_ports(&self.prefix, &AxiStreamBus::LINES), &self.ports)
    }
}

fn overlay(mut base: PortMap, overrides: &PortMap) -> PortMap {
    for (line, physical) in overrides {
        base.insert(line.to_uppercase(), physical.clone());
    }
    base
}

fn parse_hex(s: &str, default: u64) -> u64 {
    let s = s.trim_start_matches("0x");
    u64::from_str_radix(s, 16).unwrap_or(default)
}

fn default_period_steps() -> u64 {
    DEFAULT_PERIOD_STEPS
}

fn default_max_cycles() -> u64 {
    DEFAULT_MAX_CYCLES
}

fn default_true() -> bool {
    true
}

fn default_reset_signal() -> String {
    RESET_SIGNAL.to_string()
}

fn default_assert_cycles() -> u64 {
    DEFAULT_ASSERT_CYCLES
}

fn default_settle_cycles() -> u64 {
    DEFAULT_SETTLE_CYCLES
}

fn default_fifo_depth() -> usize {
    DEFAULT_FIFO_DEPTH
}

fn default_mmio_base() -> String {
    format!("{:#x}", MMIO_BASE)
}

fn default_mmio_range() -> String {
    format!("{:#x}", MMIO_RANGE)
}

fn default_control_prefix() -> String {
    CONTROL_PREFIX.to_string()
}

fn default_send() -> ChannelConfig {
    ChannelConfig {
        enabled: true,
        prefix: INPUT_PREFIX.to_string(),
        ports: PortMap::new(),
    }
}

fn default_recv() -> ChannelConfig {
    ChannelConfig {
        enabled: true,
        prefix: OUTPUT_PREFIX.to_string(),
        ports: PortMap::new(),
    }
}
