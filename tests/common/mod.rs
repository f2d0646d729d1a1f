//! Shared bench helpers for the integration tests.

#![allow(dead_code)]

use plsim::config::Config;
use plsim::soc::System;

/// Builds a bench from `config`, with test logging enabled.
pub fn bench(config: &Config) -> System {
    let _ = env_logger::builder().is_test(true).try_init();
    System::new(config).expect("bench should build")
}

/// Builds a bench and runs it until the device has come out of reset.
pub fn ready_bench(config: &Config) -> System {
    let mut system = bench(config);
    let reset = system.reset.clone();
    system
        .sim
        .run_until(async move { reset.await_ready().await })
        .expect("reset should complete");
    system
}

/// Default configuration with tracing switched on.
pub fn traced_config() -> Config {
    let mut config = Config::default();
    config.simulation.trace = true;
    config
}
