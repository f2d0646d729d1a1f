//! Bus Bench CLI.
//!
//! Builds a bench from a configuration file, runs a step script against it
//! and reports bus statistics.
//!
//! # Usage
//!
//! Without `--script` the built-in polynomial demonstration runs: the
//! coefficients are loaded over the register port and five words are
//! streamed through the evaluator.

use clap::Parser;
use std::process;

use plsim::common::SimError;
use plsim::config::Config;
use plsim::sim::{Outcome, Script};
use plsim::soc::System;

/// Command-line arguments for the bench runner.
#[derive(Parser, Debug)]
#[command(author, version, about = "Cycle-Accurate Bus Bench")]
struct Args {
    /// Bench configuration (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Step script (TOML). Runs the polynomial demo when omitted.
    #[arg(short, long)]
    script: Option<String>,

    /// Writes the waveform trace to this JSON file.
    #[arg(long)]
    trace: Option<String>,

    /// Overrides the watchdog limit, in cycles.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Prints the statistics as JSON instead of the text report.
    #[arg(long)]
    json: bool,
}

fn load(args: &Args) -> Result<(Config, Script), SimError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(limit) = args.max_cycles {
        config.simulation.max_cycles = limit;
    }
    if args.trace.is_some() {
        config.simulation.trace = true;
    }
    let script = match &args.script {
        Some(path) => Script::load(path)?,
        None => Script::poly_demo(),
    };
    Ok((config, script))
}

fn print_banner(config: &Config, script: &Script) {
    println!("Bench Configuration");
    println!("-------------------");
    println!("Simulation:");
    println!("  Period:             {} steps", config.simulation.period_steps);
    println!("  Watchdog:           {} cycles", config.simulation.max_cycles);
    println!("  Response Policy:    {:?}", config.simulation.response_policy);
    println!("Reset:");
    println!(
        "  Signal:             {} (active {})",
        config.reset.signal,
        if config.reset.active_low { "low" } else { "high" }
    );
    println!(
        "  Assert/Settle:      {}/{} cycles",
        config.reset.assert_cycles, config.reset.settle_cycles
    );
    println!("Register Port:");
    println!("  Base:               {:#x}", config.mmio.base_addr_val());
    println!("  Range:              {:#x}", config.mmio.range_val());
    println!("DMA:");
    println!(
        "  Send:               {}",
        if config.dma.send.enabled { "Enabled" } else { "Disabled" }
    );
    println!(
        "  Receive:            {}",
        if config.dma.recv.enabled { "Enabled" } else { "Disabled" }
    );
    println!("Script:               {} steps", script.steps.len());
    println!("-------------------");
}

/// Main entry point for the bench runner.
///
/// # Behavior
///
/// 1. **Configuration**: Loads the configuration and the step script.
/// 2. **Initialization**: Builds the `System` (device model, reset, engines).
/// 3. **Run**: Executes every step, stopping at the first failure.
/// 4. **Teardown**: Prints statistics, writes the trace if requested, and
///    exits non-zero on failure.
fn main() {
    env_logger::init();
    let args = Args::parse();

    let (config, script) = load(&args).unwrap_or_else(|e| {
        eprintln!("[!] FATAL: {}", e);
        process::exit(1);
    });
    print_banner(&config, &script);

    let mut system = System::new(&config).unwrap_or_else(|e| {
        eprintln!("[!] FATAL: {}", e);
        process::exit(1);
    });

    let result = script.run(&mut system);
    match &result {
        Ok(outcomes) => {
            for (i, outcome) in outcomes.iter().enumerate() {
                match outcome {
                    Outcome::Wrote { offset } => println!("[{}] write @ {:#x}", i, offset),
                    Outcome::Read { offset, value } => {
                        println!("[{}] read  @ {:#x} = {:#x}", i, offset, value)
                    }
                    Outcome::Streamed { received } => println!("[{}] stream -> {:?}", i, received),
                }
            }
        }
        Err(e) => eprintln!("\n[!] FAILED: {}", e),
    }

    let stats = system.snapshot();
    if args.json {
        match stats.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("[!] could not serialise statistics: {}", e),
        }
    } else {
        stats.print();
    }

    if let (Some(path), Some(trace)) = (&args.trace, system.sim.trace()) {
        match trace.write_json(path) {
            Ok(()) => println!("[*] Trace written to {}", path),
            Err(e) => eprintln!("[!] could not write trace to {}: {}", path, e),
        }
    }

    if result.is_err() {
        process::exit(1);
    }
}
