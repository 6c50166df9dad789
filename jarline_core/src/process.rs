//! Paint-fill and cap-close station sequences.
//!
//! Both stations react only to the first jar of each batch: after a cycle
//! they arm an ignore count of `batch_size - 1` and let that many detections
//! pass. Each `step` performs at most one transition.

use std::time::{Duration, Instant};

use jarline_traits::DigitalOutput;

use crate::actuator::TimedActuator;
use crate::config::ProcessCfg;
use crate::debounce::DebouncedSensor;
use crate::motion::MotionUnit;
use crate::util::elapsed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaintState {
    Idle,
    WaitForSensor,
    /// Belt travelling the centering distance.
    Creep,
    /// Piston held out.
    Dispense,
    /// Settle time after the piston retracts.
    PostDelay,
}

impl PaintState {
    pub const ALL: [Self; 5] = [
        Self::Idle,
        Self::WaitForSensor,
        Self::Creep,
        Self::Dispense,
        Self::PostDelay,
    ];

    /// The belt must stand still in this state.
    pub fn requires_stop(self) -> bool {
        matches!(self, Self::Creep | Self::Dispense | Self::PostDelay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapState {
    Idle,
    WaitForSensor,
    /// Screw valve just energised.
    ScrewOn,
    ScrewPause,
    /// Close valve pulsing.
    Close,
    ClosePause,
}

impl CapState {
    pub const ALL: [Self; 6] = [
        Self::Idle,
        Self::WaitForSensor,
        Self::ScrewOn,
        Self::ScrewPause,
        Self::Close,
        Self::ClosePause,
    ];

    /// The belt must stand still in this state.
    pub fn requires_stop(self) -> bool {
        matches!(
            self,
            Self::ScrewOn | Self::ScrewPause | Self::Close | Self::ClosePause
        )
    }
}

/// Everything the paint station touches during one step.
pub struct PaintStation<'a, O: DigitalOutput> {
    pub sensor: &'a mut DebouncedSensor,
    pub motion: &'a mut MotionUnit<O>,
    pub piston: &'a mut TimedActuator<O>,
    pub aux: &'a mut TimedActuator<O>,
}

/// Everything the cap station touches during one step.
pub struct CapStation<'a, O: DigitalOutput> {
    pub sensor: &'a mut DebouncedSensor,
    pub motion: &'a mut MotionUnit<O>,
    pub screw: &'a mut TimedActuator<O>,
    pub close: &'a mut TimedActuator<O>,
}

/// Skip counter shared by both stations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BatchGate {
    ignore: u32,
}

impl BatchGate {
    /// True when this detection should be processed; otherwise counts it off.
    fn admit(&mut self) -> bool {
        if self.ignore == 0 {
            return true;
        }
        self.ignore -= 1;
        false
    }
}

#[derive(Debug, Clone)]
pub struct PaintFill {
    state: PaintState,
    gate: BatchGate,
    phase_start: Option<Instant>,
    cycles: u64,
}

impl Default for PaintFill {
    fn default() -> Self {
        Self::new()
    }
}

impl PaintFill {
    pub fn new() -> Self {
        Self {
            state: PaintState::Idle,
            gate: BatchGate::default(),
            phase_start: None,
            cycles: 0,
        }
    }

    pub fn state(&self) -> PaintState {
        self.state
    }

    pub fn ignore_count(&self) -> u32 {
        self.gate.ignore
    }

    /// Completed fill cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn phase_start(&self) -> Option<Instant> {
        self.phase_start
    }

    /// Back to Idle with a fresh batch.
    pub fn reset(&mut self) {
        self.set_state(PaintState::Idle);
        self.gate = BatchGate::default();
        self.phase_start = None;
    }

    /// Move the phase timestamp later by `delta`.
    pub fn shift(&mut self, delta: Duration) {
        if let Some(t) = self.phase_start.as_mut() {
            *t += delta;
        }
    }

    pub fn step<O: DigitalOutput>(
        &mut self,
        io: PaintStation<'_, O>,
        cfg: &ProcessCfg,
        now: Instant,
    ) {
        match self.state {
            PaintState::Idle => self.set_state(PaintState::WaitForSensor),
            PaintState::WaitForSensor => {
                if !io.sensor.consume_rising_edge() {
                    return;
                }
                if self.gate.admit() {
                    io.motion.stop_after_distance(cfg.centering_mm);
                    self.set_state(PaintState::Creep);
                } else {
                    tracing::trace!(remaining = self.gate.ignore, "paint: jar skipped");
                }
            }
            PaintState::Creep => {
                if !io.motion.is_running() {
                    io.piston.on_for(cfg.paint_piston_hold, now);
                    self.set_state(PaintState::Dispense);
                }
            }
            PaintState::Dispense => {
                if !io.piston.is_armed() {
                    self.phase_start = Some(now);
                    self.set_state(PaintState::PostDelay);
                }
            }
            PaintState::PostDelay => {
                if self.phase_elapsed(now) >= cfg.paint_settle {
                    self.gate.ignore = cfg.jars_to_skip();
                    io.aux.on_for(cfg.aux_pulse, now);
                    self.cycles += 1;
                    self.set_state(PaintState::WaitForSensor);
                }
            }
        }
    }

    fn phase_elapsed(&self, now: Instant) -> Duration {
        self.phase_start.map_or(Duration::ZERO, |t| elapsed(now, t))
    }

    fn set_state(&mut self, next: PaintState) {
        if next != self.state {
            tracing::debug!(from = ?self.state, to = ?next, "paint-fill");
            self.state = next;
        }
    }
}

#[derive(Debug, Clone)]
pub struct CapClose {
    state: CapState,
    gate: BatchGate,
    phase_start: Option<Instant>,
    cycles: u64,
}

impl Default for CapClose {
    fn default() -> Self {
        Self::new()
    }
}

impl CapClose {
    pub fn new() -> Self {
        Self {
            state: CapState::Idle,
            gate: BatchGate::default(),
            phase_start: None,
            cycles: 0,
        }
    }

    pub fn state(&self) -> CapState {
        self.state
    }

    pub fn ignore_count(&self) -> u32 {
        self.gate.ignore
    }

    /// Completed capping cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn phase_start(&self) -> Option<Instant> {
        self.phase_start
    }

    pub fn reset(&mut self) {
        self.set_state(CapState::Idle);
        self.gate = BatchGate::default();
        self.phase_start = None;
    }

    pub fn shift(&mut self, delta: Duration) {
        if let Some(t) = self.phase_start.as_mut() {
            *t += delta;
        }
    }

    pub fn step<O: DigitalOutput>(&mut self, io: CapStation<'_, O>, cfg: &ProcessCfg, now: Instant) {
        match self.state {
            CapState::Idle => self.set_state(CapState::WaitForSensor),
            CapState::WaitForSensor => {
                if !io.sensor.consume_rising_edge() {
                    return;
                }
                if self.gate.admit() {
                    // A paint creep in progress owns the belt; it stops on its own.
                    if !io.motion.is_creeping() {
                        io.motion.stop();
                    }
                    io.screw.set_on();
                    self.set_state(CapState::ScrewOn);
                } else {
                    tracing::trace!(remaining = self.gate.ignore, "cap: jar skipped");
                }
            }
            CapState::ScrewOn => {
                self.phase_start = Some(now);
                self.set_state(CapState::ScrewPause);
            }
            CapState::ScrewPause => {
                if self.phase_elapsed(now) >= cfg.cap_screw_pause {
                    io.close.on_for(cfg.cap_close_hold, now);
                    self.set_state(CapState::Close);
                }
            }
            CapState::Close => {
                if !io.close.is_armed() {
                    self.phase_start = Some(now);
                    self.set_state(CapState::ClosePause);
                }
            }
            CapState::ClosePause => {
                if self.phase_elapsed(now) >= cfg.cap_close_pause {
                    io.screw.set_off();
                    self.gate.ignore = cfg.jars_to_skip();
                    self.cycles += 1;
                    self.set_state(CapState::WaitForSensor);
                }
            }
        }
    }

    fn phase_elapsed(&self, now: Instant) -> Duration {
        self.phase_start.map_or(Duration::ZERO, |t| elapsed(now, t))
    }

    fn set_state(&mut self, next: CapState) {
        if next != self.state {
            tracing::debug!(from = ?self.state, to = ?next, "cap-close");
            self.state = next;
        }
    }
}
