mod common;

use common::{Button, Rig};
use jarline_core::{CapState, MachineState, PaintState, ProcessCfg};

fn running_rig(process: ProcessCfg) -> Rig {
    let mut rig = Rig::with_process(process);
    rig.run_ms(20);
    rig.press(Button::Start);
    assert_eq!(rig.cell.state(), MachineState::Running);
    rig
}

/// Present a jar at the paint sensor until the station reacts.
fn paint_jar(rig: &mut Rig) {
    rig.jar_at_paint(true);
    assert!(rig.run_until(200, |s| s.paint == PaintState::Creep));
    rig.jar_at_paint(false);
}

#[test]
fn idle_cell_shows_stopped() {
    let mut rig = Rig::new();
    let s = rig.run_ms(50);
    assert_eq!(s.machine, MachineState::Stopped);
    assert_eq!(s.paint, PaintState::Idle);
    assert!(!s.conveyor_running);
    assert!(rig.led_idle.level());
    assert!(!rig.led_running.level());
    assert!(!rig.machine_active.level());
    assert!(!rig.aux_on());
    assert!(!rig.conveyor_enabled());
}

#[test]
fn start_runs_conveyor_and_pulses_aux() {
    let mut rig = Rig::new();
    rig.run_ms(20);
    rig.press(Button::Start);
    let s = rig.cell.status();
    assert_eq!(s.machine, MachineState::Running);
    assert_eq!(s.paint, PaintState::WaitForSensor);
    assert_eq!(s.cap, CapState::WaitForSensor);
    assert!(s.conveyor_running);
    assert!(rig.conveyor_enabled());
    assert!(rig.signal.level());
    assert!(rig.aux_on());
    assert!(rig.machine_active.level());
    assert!(rig.led_running.level());
    assert!(!rig.led_idle.level());
    assert!(rig.step.rising_edges() > 0);

    // Aux pulse is 1400 ms from launch.
    rig.run_ms(1300);
    assert!(!rig.aux_on());
}

#[test]
fn paint_cycle_creeps_dispenses_and_resumes_belt() {
    let mut rig = running_rig(ProcessCfg::default());
    rig.run_ms(1500);

    rig.jar_at_paint(true);
    assert!(rig.run_until(200, |s| s.paint == PaintState::Creep));
    let before = rig.cell.motion().pulses_emitted();
    assert_eq!(rig.cell.motion().creep_remaining(), Some(320));
    rig.jar_at_paint(false);

    assert!(rig.run_until(400, |s| s.paint == PaintState::Dispense));
    assert_eq!(rig.cell.motion().pulses_emitted() - before, 320);
    assert!(rig.piston_on());
    assert!(!rig.conveyor_enabled());
    assert!(!rig.signal.level());

    assert!(rig.run_until(1100, |s| s.paint == PaintState::PostDelay));
    assert!(!rig.piston_on());
    assert!(!rig.conveyor_enabled());

    let s = rig.run_until(100, |s| s.paint == PaintState::WaitForSensor);
    assert!(s);
    let s = rig.last.expect("status");
    assert_eq!(s.paint_ignore, 5);
    assert_eq!(s.paint_cycles, 1);
    assert!(s.conveyor_running);
    assert!(rig.aux_on());
}

#[test]
fn paint_skips_rest_of_batch_then_processes_next() {
    let process = ProcessCfg {
        batch_size: 3,
        ..ProcessCfg::default()
    };
    let mut rig = running_rig(process);
    paint_jar(&mut rig);
    assert!(rig.run_until(2000, |s| s.paint == PaintState::WaitForSensor));
    assert_eq!(rig.cell.paint().ignore_count(), 2);

    for remaining in [1, 0] {
        rig.jar_at_paint(true);
        rig.run_ms(100);
        rig.jar_at_paint(false);
        rig.run_ms(100);
        assert_eq!(rig.cell.paint().state(), PaintState::WaitForSensor);
        assert_eq!(rig.cell.paint().ignore_count(), remaining);
        assert!(rig.cell.motion().is_running());
    }

    paint_jar(&mut rig);
    assert_eq!(rig.cell.paint().state(), PaintState::Creep);
}

#[test]
fn cap_cycle_holds_belt_until_screw_releases() {
    let mut rig = running_rig(ProcessCfg::default());

    rig.jar_at_cap(true);
    assert!(rig.run_until(200, |s| s.cap == CapState::ScrewOn));
    assert!(!rig.conveyor_enabled());
    assert!(rig.screw.level());
    rig.jar_at_cap(false);

    assert!(rig.run_until(400, |s| s.cap == CapState::Close));
    assert!(rig.close.level());
    assert!(rig.screw.level());
    assert!(!rig.conveyor_enabled());

    assert!(rig.run_until(900, |s| s.cap == CapState::ClosePause));
    assert!(!rig.close.level());

    assert!(rig.run_until(400, |s| s.cap == CapState::WaitForSensor));
    assert!(!rig.screw.level());
    assert!(rig.conveyor_enabled());
    assert_eq!(rig.cell.cap().ignore_count(), 5);
    assert_eq!(rig.cell.cap().cycles(), 1);
}

#[test]
fn pause_freezes_dispense_and_resume_keeps_remaining_time() {
    let mut rig = running_rig(ProcessCfg::default());
    paint_jar(&mut rig);
    assert!(rig.run_until(400, |s| s.paint == PaintState::Dispense));
    let dispense_started = rig.now;
    rig.run_ms(200);

    rig.press(Button::Stop);
    assert_eq!(rig.cell.state(), MachineState::Paused);
    assert!(!rig.cell.motion().is_running());
    assert!(!rig.machine_active.level());
    assert!(rig.led_idle.level());

    rig.run_ms(3000);
    assert!(rig.piston_on());
    assert_eq!(rig.cell.paint().state(), PaintState::Dispense);

    let resume_pressed = rig.now;
    rig.press(Button::Start);
    assert_eq!(rig.cell.state(), MachineState::Running);
    assert!(rig.piston_on());
    assert!(!rig.conveyor_enabled());

    assert!(rig.run_until(1000, |s| s.paint == PaintState::PostDelay));
    // Piston was on for 1000 ms of running time in total.
    let paused = resume_pressed - dispense_started - std::time::Duration::from_millis(200);
    let on_time = rig.now - dispense_started - paused;
    assert!(on_time.as_millis() >= 990, "on for {on_time:?}");
    assert!(on_time.as_millis() <= 1200, "on for {on_time:?}");
}

#[test]
fn pause_mid_creep_finishes_the_same_distance() {
    let mut rig = running_rig(ProcessCfg::default());
    rig.jar_at_paint(true);
    assert!(rig.run_until(200, |s| s.paint == PaintState::Creep));
    let before = rig.cell.motion().pulses_emitted();
    rig.jar_at_paint(false);
    rig.run_ms(20);

    rig.stop.drive(false);
    assert!(rig.run_until(200, |s| s.machine == MachineState::Paused));
    rig.stop.drive(true);
    assert!(!rig.cell.motion().is_running());
    assert!(!rig.conveyor_enabled());
    let at_pause = rig.cell.motion().pulses_emitted();
    assert!(at_pause - before < 320);

    rig.run_ms(500);
    assert_eq!(rig.cell.motion().pulses_emitted(), at_pause);

    rig.press(Button::Start);
    assert!(rig.run_until(400, |s| s.paint == PaintState::Dispense));
    assert_eq!(rig.cell.motion().pulses_emitted() - before, 320);
}

#[test]
fn second_stop_halts_everything() {
    let mut rig = running_rig(ProcessCfg::default());
    paint_jar(&mut rig);
    assert!(rig.run_until(400, |s| s.paint == PaintState::Dispense));

    rig.press(Button::Stop);
    rig.press(Button::Stop);
    let s = rig.cell.status();
    assert_eq!(s.machine, MachineState::Stopped);
    assert_eq!(s.paint, PaintState::Idle);
    assert_eq!(s.cap, CapState::Idle);
    assert!(!rig.piston_on());
    assert!(!rig.aux_on());
    assert!(!rig.screw.level());
    assert!(!rig.close.level());
    assert!(!rig.conveyor_enabled());
    assert!(rig.led_idle.level());

    // Stopped machine ignores jars.
    rig.jar_at_paint(true);
    rig.run_ms(200);
    assert_eq!(rig.cell.paint().state(), PaintState::Idle);
}

#[test]
fn restart_clears_batch_counters() {
    let mut rig = running_rig(ProcessCfg::default());
    paint_jar(&mut rig);
    assert!(rig.run_until(2000, |s| s.paint == PaintState::WaitForSensor));
    assert_eq!(rig.cell.paint().ignore_count(), 5);

    rig.press(Button::Stop);
    rig.press(Button::Stop);
    rig.press(Button::Start);
    assert_eq!(rig.cell.paint().ignore_count(), 0);
    assert_eq!(rig.cell.paint().state(), PaintState::WaitForSensor);
}

#[test]
fn start_while_running_is_ignored() {
    let mut rig = running_rig(ProcessCfg::default());
    rig.press(Button::Start);
    assert_eq!(rig.cell.state(), MachineState::Running);
    assert!(rig.cell.motion().is_running());
}

#[test]
fn default_batch_paints_every_sixth_jar() {
    let mut rig = running_rig(ProcessCfg::default());
    paint_jar(&mut rig);
    assert!(rig.run_until(2000, |s| s.paint == PaintState::WaitForSensor));
    assert_eq!(rig.cell.paint().ignore_count(), 5);

    for remaining in (0..5).rev() {
        rig.jar_at_paint(true);
        rig.run_ms(100);
        rig.jar_at_paint(false);
        rig.run_ms(100);
        assert_eq!(rig.cell.paint().state(), PaintState::WaitForSensor);
        assert_eq!(rig.cell.paint().ignore_count(), remaining);
    }
    assert_eq!(rig.cell.paint().cycles(), 1);

    paint_jar(&mut rig);
    assert_eq!(rig.cell.paint().state(), PaintState::Creep);
}

#[test]
fn cap_skips_rest_of_batch_then_closes_next() {
    let mut rig = running_rig(ProcessCfg::default());
    rig.jar_at_cap(true);
    assert!(rig.run_until(200, |s| s.cap == CapState::ScrewOn));
    rig.jar_at_cap(false);
    assert!(rig.run_until(2000, |s| s.cap == CapState::WaitForSensor));
    assert_eq!(rig.cell.cap().ignore_count(), 5);

    for remaining in (0..5).rev() {
        rig.jar_at_cap(true);
        rig.run_ms(100);
        rig.jar_at_cap(false);
        rig.run_ms(100);
        assert_eq!(rig.cell.cap().state(), CapState::WaitForSensor);
        assert_eq!(rig.cell.cap().ignore_count(), remaining);
        assert!(rig.cell.motion().is_running());
    }

    rig.jar_at_cap(true);
    assert!(rig.run_until(200, |s| s.cap == CapState::ScrewOn));
    assert_eq!(rig.cell.cap().cycles(), 1);
}

#[test]
fn pause_in_screw_pause_keeps_running_time() {
    let mut rig = running_rig(ProcessCfg::default());
    rig.jar_at_cap(true);
    assert!(rig.run_until(200, |s| s.cap == CapState::ScrewPause));
    let entered = rig.now;
    rig.jar_at_cap(false);
    rig.run_ms(100);

    rig.stop.drive(false);
    assert!(rig.run_until(200, |s| s.machine == MachineState::Paused));
    rig.stop.drive(true);
    let paused_at = rig.now;

    rig.run_ms(2000);
    assert_eq!(rig.cell.cap().state(), CapState::ScrewPause);

    rig.start.drive(false);
    assert!(rig.run_until(200, |s| s.machine == MachineState::Running));
    rig.start.drive(true);
    let resumed_at = rig.now;
    assert_eq!(rig.cell.cap().state(), CapState::ScrewPause);

    assert!(rig.run_until(400, |s| s.cap == CapState::Close));
    let running = (paused_at - entered) + (rig.now - resumed_at);
    assert!(running.as_millis() >= 290, "ran for {running:?}");
    assert!(running.as_millis() <= 320, "ran for {running:?}");
}
