mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use common::Rig;
use jarline_core::error::CellError;
use jarline_core::runner::run;
use jarline_core::{Command, MachineState, RunParams, StopReason};
use jarline_traits::{Clock, ManualClock};

fn params(max_ms: Option<u64>) -> RunParams {
    RunParams {
        tick: Duration::from_millis(1),
        max_duration: max_ms.map(Duration::from_millis),
    }
}

#[test]
fn stops_after_max_duration_and_shuts_down() {
    let mut rig = Rig::new();
    let clock = ManualClock::new();
    rig.cell.command(Command::Start, clock.now());
    let shutdown = AtomicBool::new(false);

    let mut seen = 0;
    let (reason, stats) = run(&mut rig.cell, &clock, &params(Some(100)), &shutdown, |_| {
        seen += 1
    })
    .expect("run");

    assert_eq!(reason, StopReason::DurationElapsed);
    assert_eq!(stats.ticks, 100);
    assert_eq!(seen, 100);
    assert_eq!(stats.overruns, 0);
    assert_eq!(stats.elapsed, Duration::from_millis(100));
    assert_eq!(rig.cell.state(), MachineState::Stopped);
    assert!(!rig.conveyor_enabled());
    assert!(!rig.aux_on());
}

#[test]
fn shutdown_flag_ends_loop() {
    let mut rig = Rig::new();
    let clock = ManualClock::new();
    let shutdown = AtomicBool::new(false);
    let mut n = 0;
    let (reason, stats) = run(&mut rig.cell, &clock, &params(None), &shutdown, |_| {
        n += 1;
        if n == 5 {
            shutdown.store(true, Ordering::Relaxed);
        }
    })
    .expect("run");
    assert_eq!(reason, StopReason::Shutdown);
    assert_eq!(stats.ticks, 5);
}

#[test]
fn input_fault_aborts_with_safe_outputs() {
    let mut rig = Rig::new();
    let clock = ManualClock::new();
    rig.cell.command(Command::Start, clock.now());
    assert!(rig.aux_on());
    let shutdown = AtomicBool::new(false);

    let tap = rig.cap_sensor.clone();
    let mut n = 0;
    let err = run(&mut rig.cell, &clock, &params(Some(1000)), &shutdown, |_| {
        n += 1;
        if n == 20 {
            tap.set_fault(true);
        }
    })
    .expect_err("fault must abort");

    assert!(matches!(
        err.downcast_ref::<CellError>(),
        Some(CellError::HardwareFault(_))
    ));
    assert!(format!("{err}").contains("cap_sensor"));
    assert_eq!(rig.cell.state(), MachineState::Stopped);
    assert!(!rig.conveyor_enabled());
    assert!(!rig.aux_on());
}
