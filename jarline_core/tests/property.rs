mod common;

use std::time::{Duration, Instant};

use common::Rig;
use jarline_core::arbiter::{MotionCommand, arbitrate};
use jarline_core::debounce::{DebouncedSensor, Debouncer};
use jarline_core::{CapState, Command, MachineState, PaintState, TimedActuator};
use jarline_hardware::sim::SimPin;
use proptest::prelude::*;

const WINDOW: Duration = Duration::from_millis(50);

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Any command sequence follows the transition table, and the outputs
    // agree with the resulting state.
    #[test]
    fn supervisor_follows_table(cmds in prop::collection::vec(any::<bool>(), 0..30)) {
        let mut rig = Rig::new();
        let mut model = MachineState::Stopped;
        for is_start in cmds {
            let cmd = if is_start { Command::Start } else { Command::Stop };
            let expected = model.next(cmd).unwrap_or(model);
            let now = rig.now;
            rig.cell.command(cmd, now);
            rig.run_ms(5);
            prop_assert_eq!(rig.cell.state(), expected);
            model = expected;
            match model {
                MachineState::Stopped => {
                    prop_assert!(!rig.conveyor_enabled());
                    prop_assert!(!rig.aux_on());
                    prop_assert!(!rig.machine_active.level());
                }
                MachineState::Paused => {
                    prop_assert!(!rig.cell.motion().is_running());
                    prop_assert!(!rig.machine_active.level());
                }
                MachineState::Running => {
                    prop_assert!(rig.cell.motion().is_running());
                    prop_assert!(rig.machine_active.level());
                }
            }
        }
    }

    // Chatter faster than the window never changes the accepted level.
    #[test]
    fn chatter_is_rejected(period_ms in 1u64..=50, samples in 10usize..400) {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW);
        let mut level = false;
        for i in 0..samples {
            let ms = i as u64;
            if ms % period_ms == 0 {
                level = !level;
            }
            prop_assert_eq!(d.sample(level, t0 + Duration::from_millis(ms)), None);
        }
        prop_assert!(!d.level());
    }

    // A level held past the window yields exactly one edge.
    #[test]
    fn held_level_yields_one_edge(hold_ms in 61u64..2000, poll_ms in 1u64..=10) {
        let t0 = Instant::now();
        let mut s = DebouncedSensor::new(WINDOW);
        let mut edges = 0;
        let mut ms = 0;
        while ms <= hold_ms {
            s.sample(true, t0 + Duration::from_millis(ms));
            if s.consume_rising_edge() {
                edges += 1;
            }
            ms += poll_ms;
        }
        prop_assert_eq!(edges, 1);
        prop_assert!(s.is_active());
    }

    // Shifting a deadline by the pause length preserves the remaining time.
    #[test]
    fn shift_preserves_remaining(
        dur_ms in 1u64..5000,
        at_frac in 0.0f64..1.0,
        pause_ms in 0u64..60_000,
    ) {
        let t0 = Instant::now();
        let mut a = TimedActuator::new("piston", SimPin::new(false), false);
        a.on_for(Duration::from_millis(dur_ms), t0);
        let paused_at = t0 + Duration::from_millis((dur_ms as f64 * at_frac) as u64);
        let before = a.remaining(paused_at);
        a.shift(Duration::from_millis(pause_ms));
        let resumed_at = paused_at + Duration::from_millis(pause_ms);
        prop_assert_eq!(a.remaining(resumed_at), before);
        prop_assert!(a.is_on());
    }
}

#[test]
fn arbiter_matches_station_needs() {
    for p in PaintState::ALL {
        for c in CapState::ALL {
            let blocked = p.requires_stop() || c.requires_stop();
            for running in [false, true] {
                let cmd = arbitrate(p, c, running, false);
                let expected = match (blocked, running) {
                    (false, false) => Some(MotionCommand::Start),
                    (true, true) => Some(MotionCommand::Stop),
                    _ => None,
                };
                assert_eq!(cmd, expected, "{p:?} {c:?} running={running}");
            }
        }
    }
}
