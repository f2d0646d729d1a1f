//! Integration tests for the register transaction engine.

mod common;

use common::{bench, ready_bench, traced_config};
use futures::join;
use plsim::bus::response::{RESP_OKAY, RESP_SLVERR};
use plsim::bus::{Mmio, ResponsePolicy};
use plsim::common::{BusError, WordOrder};
use plsim::config::Config;
use plsim::soc::poly::{REG_A, REG_B, REG_C};
use test_case::test_case;

fn config_with_policy(policy: ResponsePolicy) -> Config {
    let mut config = Config::default();
    config.simulation.response_policy = policy;
    config
}

/// Tests that a written word reads back unchanged.
#[test]
fn test_write_then_read_word() {
    let mut system = bench(&Config::default());
    let mmio = &system.mmio;
    let value = system
        .sim
        .run_until(async {
            mmio.write(0x0, 0xDEAD_BEEFu32).await?;
            mmio.read_word(0x0).await
        })
        .unwrap()
        .unwrap();
    assert_eq!(value, 0xDEAD_BEEF);
}

/// Tests that the coefficient registers hold independent values.
#[test]
fn test_coefficient_registers() {
    let mut system = bench(&Config::default());
    let mmio = &system.mmio;
    let values = system
        .sim
        .run_until(async {
            mmio.write(REG_A, 7u32).await?;
            mmio.write(REG_B, 8u32).await?;
            mmio.write(REG_C, 9u32).await?;
            Ok::<_, BusError>((
                mmio.read_word(REG_A).await?,
                mmio.read_word(REG_B).await?,
                mmio.read_word(REG_C).await?,
            ))
        })
        .unwrap()
        .unwrap();
    assert_eq!(values, (7, 8, 9));
}

/// Tests 8-byte reads combine two words in the requested order.
#[test_case(WordOrder::Little, 0x2222_2222_1111_1111 ; "little endian")]
#[test_case(WordOrder::Big, 0x1111_1111_2222_2222 ; "big endian")]
fn test_double_read_word_order(order: WordOrder, expected: u64) {
    let mut system = bench(&Config::default());
    let mmio = &system.mmio;
    let value = system
        .sim
        .run_until(async {
            mmio.write(0x8, 0x1111_1111u32).await?;
            mmio.write(0xC, 0x2222_2222u32).await?;
            mmio.read(0x8, 8, order).await
        })
        .unwrap()
        .unwrap();
    assert_eq!(value, expected);
}

/// Tests narrow reads mask the word down to the requested width.
#[test_case(1, 0xEF)]
#[test_case(2, 0xBEEF)]
#[test_case(4, 0xDEAD_BEEF)]
fn test_narrow_read_masks(length: usize, expected: u64) {
    let mut system = bench(&Config::default());
    let mmio = &system.mmio;
    let value = system
        .sim
        .run_until(async {
            mmio.write(0x4, 0xDEAD_BEEFu32).await?;
            mmio.read(0x4, length, WordOrder::Little).await
        })
        .unwrap()
        .unwrap();
    assert_eq!(value, expected);
}

/// Tests unsupported read widths are rejected.
#[test_case(0)]
#[test_case(3)]
#[test_case(16)]
fn test_unsupported_read_size(length: usize) {
    let mut system = bench(&Config::default());
    let mmio = &system.mmio;
    let err = system
        .sim
        .run_until(mmio.read(0x0, length, WordOrder::Little))
        .unwrap()
        .unwrap_err();
    assert_eq!(err, BusError::UnsupportedSize(length));
}

/// Tests misaligned offsets are rejected before any line is driven.
#[test_case(0x1)]
#[test_case(0x2)]
#[test_case(0x3)]
fn test_misaligned_offset_rejected(offset: u64) {
    let mut system = bench(&traced_config());
    let mmio = &system.mmio;
    let write_err = system
        .sim
        .run_until(mmio.write(offset, 1u32))
        .unwrap()
        .unwrap_err();
    let read_err = system
        .sim
        .run_until(mmio.read(offset, 4, WordOrder::Little))
        .unwrap()
        .unwrap_err();
    assert!(matches!(write_err, BusError::Alignment { value, .. } if value == offset));
    assert!(matches!(read_err, BusError::Alignment { value, .. } if value == offset));

    system.sim.run_cycles(20).unwrap();
    let trace = system.sim.trace().unwrap();
    assert!(!trace.values("s_axi_control_AWVALID").contains(&1));
    assert!(!trace.values("s_axi_control_ARVALID").contains(&1));
}

/// Tests a misaligned read fails immediately, without waiting for reset.
#[test]
fn test_rejection_does_not_wait_for_reset() {
    let mut system = bench(&Config::default());
    let mmio = &system.mmio;
    let result = system.sim.run_until(mmio.read(0x2, 4, WordOrder::Little)).unwrap();
    assert!(result.is_err());
    assert_eq!(system.sim.cycle(), 0);
}

/// Tests accesses whose word addresses overflow or exceed the address lines.
#[test_case(u64::MAX - 3, 8 ; "second word overflows")]
#[test_case(u64::MAX - 3, 4 ; "offset beyond 64-bit span")]
#[test_case(0xFFFF_FFFC, 8 ; "second word past 32 bits")]
#[test_case(0x1_0000_0010, 4 ; "offset past 32 bits")]
fn test_read_address_range(offset: u64, length: usize) {
    let mut system = bench(&traced_config());
    let mmio = &system.mmio;
    let err = system
        .sim
        .run_until(mmio.read(offset, length, WordOrder::Little))
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, BusError::AddressRange { width: 32, .. }));

    system.sim.run_cycles(10).unwrap();
    let trace = system.sim.trace().unwrap();
    assert!(!trace.values("s_axi_control_ARVALID").contains(&1));
    assert_eq!(system.stats.borrow().register_reads, 0);
}

/// Tests a write above the 32-bit address space does not alias a low register.
#[test]
fn test_write_address_range() {
    let mut system = bench(&Config::default());
    let mmio = &system.mmio;
    let (wide, block, a) = system
        .sim
        .run_until(async {
            mmio.write(REG_A, 7u32).await?;
            let wide = mmio.write(0x1_0000_0000 + REG_A, 99u32).await;
            let block = mmio.write(0xFFFF_FFFC, vec![0u8; 8]).await;
            Ok::<_, BusError>((wide, block, mmio.read_word(REG_A).await?))
        })
        .unwrap()
        .unwrap();

    assert!(matches!(wide, Err(BusError::AddressRange { words: 1, .. })));
    assert!(matches!(block, Err(BusError::AddressRange { words: 2, .. })));
    assert_eq!(a, 7);
    assert_eq!(system.stats.borrow().register_writes, 1);
}

/// Tests a byte block is written as consecutive little-endian words.
#[test]
fn test_byte_block_write() {
    let mut system = bench(&Config::default());
    let mmio = &system.mmio;
    let words = system
        .sim
        .run_until(async {
            mmio.write(REG_A, vec![1u8, 0, 0, 0, 0x78, 0x56, 0x34, 0x12])
                .await?;
            Ok::<_, BusError>((
                mmio.read_word(REG_A).await?,
                mmio.read_word(REG_A + 4).await?,
            ))
        })
        .unwrap()
        .unwrap();
    assert_eq!(words, (1, 0x1234_5678));
}

/// Tests a byte block whose length is not a multiple of 4 is rejected.
#[test]
fn test_ragged_byte_block_rejected() {
    let mut system = bench(&Config::default());
    let mmio = &system.mmio;
    let err = system
        .sim
        .run_until(mmio.write(0x0, vec![1u8, 2, 3, 4, 5]))
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, BusError::Alignment { value: 5, .. }));
    assert_eq!(system.stats.borrow().register_writes, 0);
}

/// Tests a write takes three cycles and a read two against a ready device.
#[test]
fn test_transaction_cycle_counts() {
    let mut system = ready_bench(&Config::default());
    let mmio = &system.mmio;
    let start = system.sim.cycle();
    system.sim.run_until(mmio.write(0x0, 5u32)).unwrap().unwrap();
    let after_write = system.sim.cycle();
    system.sim.run_until(mmio.read_word(0x0)).unwrap().unwrap();
    let after_read = system.sim.cycle();

    assert_eq!(after_write - start, 3);
    assert_eq!(after_read - after_write, 2);
}

/// Tests the write strobe is full during the data phase and cleared after.
#[test]
fn test_write_strobe_pattern() {
    let mut system = ready_bench(&traced_config());
    let mmio = &system.mmio;
    system.sim.run_until(mmio.write(0x0, 1u32)).unwrap().unwrap();
    system.sim.run_cycles(2).unwrap();

    let trace = system.sim.trace().unwrap();
    assert_eq!(trace.values("s_axi_control_WSTRB"), vec![0xF, 0]);
    assert_eq!(trace.values("s_axi_control_AWVALID"), vec![1, 0]);
    assert_eq!(trace.values("s_axi_control_BREADY"), vec![1, 0]);
}

/// Tests one read and one write may run concurrently on the same engine.
#[test]
fn test_concurrent_read_and_write() {
    let mut system = bench(&Config::default());
    let mmio = &system.mmio;
    let (written, read) = system
        .sim
        .run_until(async { join!(mmio.write(0x0, 5u32), mmio.read_word(0x4)) })
        .unwrap();
    assert_eq!(written, Ok(()));
    assert_eq!(read, Ok(0));
    let stats = system.stats.borrow();
    assert_eq!(stats.register_writes, 1);
    assert_eq!(stats.register_reads, 1);
}

/// Tests the default policy reports OKAY responses and not faults.
#[test]
fn test_default_policy_reports_okay() {
    let mut system = bench(&Config::default());
    let mmio = &system.mmio;
    system
        .sim
        .run_until(async {
            mmio.write(0x0, 1u32).await?;
            mmio.write(0x100, 1u32).await
        })
        .unwrap()
        .unwrap();
    assert_eq!(system.stats.borrow().notable_responses, 1);
}

/// Tests the fault policy reports SLVERR and still completes the call.
#[test]
fn test_fault_policy_reports_slverr() {
    let mut system = bench(&config_with_policy(ResponsePolicy::FaultIsNotable));
    let mmio = &system.mmio;
    let value = system
        .sim
        .run_until(async {
            mmio.write(0x0, 1u32).await?;
            mmio.write(0x100, 1u32).await?;
            mmio.read_word(0x100).await
        })
        .unwrap()
        .unwrap();
    assert_eq!(value, 0);
    assert_eq!(system.stats.borrow().notable_responses, 2);
}

fn only_okay(resp: u64) -> bool {
    resp == RESP_OKAY
}

fn only_slverr(resp: u64) -> bool {
    resp == RESP_SLVERR
}

/// Tests a custom predicate decides which responses are reported.
#[test_case(only_okay, 2 ; "okay predicate")]
#[test_case(only_slverr, 1 ; "slverr predicate")]
fn test_custom_policy(predicate: fn(u64) -> bool, expected: u64) {
    let mut system = bench(&Config::default());
    let mmio = Mmio::new(
        system.sim.handle(),
        system.mmio.bus().clone(),
        system.reset.clone(),
    )
    .with_policy(ResponsePolicy::Custom(predicate))
    .with_stats(system.stats.clone());
    system
        .sim
        .run_until(async {
            mmio.write(0x0, 1u32).await?;
            mmio.write(0x4, 1u32).await?;
            mmio.write(0x200, 1u32).await
        })
        .unwrap()
        .unwrap();
    assert_eq!(system.stats.borrow().notable_responses, expected);
}

/// Tests the engine reports the range it was mapped at.
#[test]
fn test_mapped_range() {
    let system = bench(&Config::default());
    assert_eq!(system.mmio.base_addr(), 0x43c1_0000);
    assert_eq!(system.mmio.length(), 0x1000);
}
