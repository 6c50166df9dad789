//! Fixed-period control loop around `WorkCell::tick`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use jarline_traits::{Clock, DigitalInput, DigitalOutput};

use crate::cell::WorkCell;
use crate::error::Result;
use crate::status::CellStatus;
use crate::util::{as_micros_u64, elapsed};

#[derive(Debug, Clone)]
pub struct RunParams {
    /// Loop period.
    pub tick: Duration,
    /// Stop after this long; `None` runs until shutdown is requested.
    pub max_duration: Option<Duration>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            tick: Duration::from_micros(50),
            max_duration: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    /// Iterations whose work took longer than the period.
    pub overruns: u64,
    pub max_tick: Duration,
    pub elapsed: Duration,
}

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    DurationElapsed,
}

/// Run the cell until `shutdown` is set or `max_duration` passes.
///
/// `observe` is called after every tick with the fresh status. The cell is
/// always left shut down, including when a tick fails.
pub fn run<I, O, C>(
    cell: &mut WorkCell<I, O>,
    clock: &C,
    params: &RunParams,
    shutdown: &AtomicBool,
    mut observe: impl FnMut(&CellStatus),
) -> Result<(StopReason, RunStats)>
where
    I: DigitalInput,
    O: DigitalOutput,
    C: Clock,
{
    let started = clock.now();
    let mut stats = RunStats::default();
    tracing::info!(tick_us = as_micros_u64(params.tick), "control loop started");

    let reason = loop {
        if shutdown.load(Ordering::Relaxed) {
            break StopReason::Shutdown;
        }
        let t0 = clock.now();
        if let Some(max) = params.max_duration
            && elapsed(t0, started) >= max
        {
            break StopReason::DurationElapsed;
        }

        let status = match cell.tick(t0) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "control tick failed");
                cell.shutdown();
                return Err(e);
            }
        };
        observe(&status);
        stats.ticks += 1;

        let spent = elapsed(clock.now(), t0);
        stats.max_tick = stats.max_tick.max(spent);
        if spent > params.tick {
            stats.overruns += 1;
        } else {
            clock.sleep(params.tick - spent);
        }
    };

    cell.shutdown();
    stats.elapsed = elapsed(clock.now(), started);
    tracing::info!(
        ?reason,
        ticks = stats.ticks,
        overruns = stats.overruns,
        max_tick_us = as_micros_u64(stats.max_tick),
        "control loop finished"
    );
    Ok((reason, stats))
}
