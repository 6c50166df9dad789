//! `run` and `simulate` subcommands.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use jarline_config::Config;
use jarline_core::runner::run;
use jarline_core::util::{as_micros_u64, as_millis_u64};
use jarline_core::{CellStatus, RunParams, RunStats, StopReason};
use jarline_traits::{Clock, ManualClock, MonotonicClock};

use crate::backend::{SimBench, hold_button, sim_bench};

/// How long a scripted button press is held.
const PRESS: Duration = Duration::from_millis(100);
/// When the scripted start press begins.
const START_AT: Duration = Duration::from_millis(100);
/// Batches on the belt for a sim-mode `run`.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
const SIM_BATCHES: u32 = 2;

pub struct RunOpts {
    pub duration_s: Option<u64>,
    pub stats: bool,
    pub json: bool,
}

pub struct SimOpts {
    pub seconds: f64,
    pub batches: u32,
    pub pause: Option<(f64, f64)>,
    pub stats: bool,
    pub json: bool,
}

fn params(cfg: &Config, max: Option<Duration>) -> RunParams {
    RunParams {
        tick: Duration::from_micros(cfg.runner.tick_us),
        max_duration: max,
    }
}

fn secs(name: &str, v: f64) -> eyre::Result<Duration> {
    Duration::try_from_secs_f64(v)
        .map_err(|e| eyre::eyre!("{name} must be a finite, non-negative number of seconds ({e})"))
}

fn log_transition(status: &CellStatus) {
    if let Some(t) = status.transition {
        tracing::info!(transition = ?t, state = status.machine.as_str(), "machine state changed");
    }
}

fn print_stats(stats: &RunStats) {
    eprintln!(
        "stats: ticks={} overruns={} max_tick_us={} elapsed_ms={}",
        stats.ticks,
        stats.overruns,
        as_micros_u64(stats.max_tick),
        as_millis_u64(stats.elapsed)
    );
}

fn install_ctrlc() -> eyre::Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .map_err(|e| eyre::eyre!("install Ctrl-C handler: {e}"))?;
    Ok(shutdown)
}

/// Drive the cell in real time until Ctrl-C or `--duration-s`.
pub fn run_cell(cfg: &Config, opts: &RunOpts) -> eyre::Result<()> {
    let shutdown = install_ctrlc()?;
    let params = params(cfg, opts.duration_s.map(Duration::from_secs));
    let clock = MonotonicClock::new();

    #[cfg(all(feature = "hardware", target_os = "linux"))]
    let (reason, stats) = {
        let mut cell = crate::backend::hardware_cell(cfg)?;
        tracing::info!("GPIO claimed; waiting for the start button");
        run(&mut cell, &clock, &params, &shutdown, log_transition)?
    };

    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    let (reason, stats) = {
        let SimBench {
            mut cell, mut line, ..
        } = sim_bench(cfg, SIM_BATCHES)?;
        tracing::info!("no GPIO backend; running against the simulated line");
        cell.command(jarline_core::Command::Start, clock.now());
        run(&mut cell, &clock, &params, &shutdown, |status| {
            line.update();
            log_transition(status);
        })?
    };

    if opts.json {
        println!(
            "{}",
            serde_json::json!({
                "reason": format!("{reason:?}"),
                "ticks": stats.ticks,
                "overruns": stats.overruns,
                "elapsed_ms": as_millis_u64(stats.elapsed),
            })
        );
    } else if reason == StopReason::Shutdown {
        println!("stopped by signal after {} ticks", stats.ticks);
    } else {
        println!("run finished after {} ticks", stats.ticks);
    }
    if opts.stats {
        print_stats(&stats);
    }
    Ok(())
}

/// Scripted press window on one button.
struct Press {
    start_button: bool,
    from: Duration,
}

impl Press {
    fn held_at(&self, t: Duration) -> bool {
        t >= self.from && t < self.from + PRESS
    }
}

/// Run the cell against the simulated line on a virtual clock.
pub fn simulate(cfg: &Config, opts: &SimOpts) -> eyre::Result<()> {
    let total = secs("--seconds", opts.seconds)?;
    if total.is_zero() {
        eyre::bail!("--seconds must be > 0");
    }
    let mut script = vec![Press {
        start_button: true,
        from: START_AT,
    }];
    if let Some((at, dur)) = opts.pause {
        let at = secs("--pause-at-s", at)?;
        let dur = secs("--pause-for-s", dur)?;
        if at <= START_AT + PRESS {
            eyre::bail!(
                "--pause-at-s must be later than the start press ({} ms)",
                (START_AT + PRESS).as_millis()
            );
        }
        if dur < PRESS {
            eyre::bail!("--pause-for-s must be at least {} ms", PRESS.as_millis());
        }
        script.push(Press {
            start_button: false,
            from: at,
        });
        script.push(Press {
            start_button: true,
            from: at + dur,
        });
    }

    let SimBench {
        mut cell,
        mut line,
        start,
        stop,
        button_active_low,
    } = sim_bench(cfg, opts.batches)?;
    let clock = ManualClock::new();
    let origin = clock.origin();
    let shutdown = AtomicBool::new(false);
    let mut last = cell.status();

    let (_, stats) = run(&mut cell, &clock, &params(cfg, Some(total)), &shutdown, |status| {
        line.update();
        let t = clock.now().saturating_duration_since(origin);
        let held = |on_start: bool| {
            script
                .iter()
                .any(|p| p.start_button == on_start && p.held_at(t))
        };
        hold_button(&start, held(true), button_active_low);
        hold_button(&stop, held(false), button_active_low);
        log_transition(status);
        last = *status;
    })?;

    let delivered = line.jars_delivered();
    if opts.json {
        println!(
            "{}",
            serde_json::json!({
                "seconds": opts.seconds,
                "paint_cycles": last.paint_cycles,
                "cap_cycles": last.cap_cycles,
                "jars": line.jar_count(),
                "jars_delivered": delivered,
                "travel_mm": line.travel_mm(),
                "ticks": stats.ticks,
                "final_state": last.machine.as_str(),
            })
        );
    } else {
        println!("paint cycles: {}", last.paint_cycles);
        println!("cap cycles: {}", last.cap_cycles);
        println!("jars delivered: {delivered}/{}", line.jar_count());
        println!("belt travel: {:.1} mm", line.travel_mm());
        println!("state at end: {}", last.machine.as_str());
    }
    if opts.stats {
        print_stats(&stats);
    }
    Ok(())
}
