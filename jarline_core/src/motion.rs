//! Stepper-driven conveyor: continuous run, stop, and creep-to-stop.
//!
//! Pulses are generated cooperatively from `tick`; nothing here blocks.
//! A creep emits a fixed number of pulses and then disables the driver,
//! which is how a jar is centred under the paint nozzle.

use std::time::{Duration, Instant};

use jarline_traits::DigitalOutput;

use crate::config::BeltCfg;
use crate::util::{MICROS_PER_SEC, elapsed};

/// Belt geometry reduced to what the pulse generator needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    steps_per_mm: f32,
    step_interval: Duration,
    pulse_width: Duration,
}

impl Kinematics {
    /// Derive pulse timing from belt pitch, pulley, microstepping and speed.
    /// Callers validate that all inputs are positive.
    pub fn from_belt(b: &BeltCfg) -> Self {
        let steps_per_mm = (b.motor_steps_per_rev as f32 * b.microsteps as f32)
            / (b.pitch_mm * b.pulley_teeth as f32);
        let steps_per_s = f64::from(steps_per_mm) * f64::from(b.speed_mm_per_s);
        let step_interval = Duration::from_micros((MICROS_PER_SEC / steps_per_s) as u64);
        Self {
            steps_per_mm,
            step_interval,
            pulse_width: b.pulse_width,
        }
    }

    pub fn steps_per_mm(&self) -> f32 {
        self.steps_per_mm
    }

    pub fn step_interval(&self) -> Duration {
        self.step_interval
    }

    pub fn pulse_width(&self) -> Duration {
        self.pulse_width
    }

    /// Whole pulses for a distance; fractions are dropped.
    pub fn pulses_for(&self, mm: f32) -> u32 {
        if mm.is_nan() || mm <= 0.0 {
            return 0;
        }
        (mm * self.steps_per_mm) as u32
    }
}

/// Driver lines of the conveyor stepper.
pub struct ConveyorPins<O> {
    pub step: O,
    pub dir: O,
    pub enable: O,
    /// High while the conveyor is commanded to move.
    pub moving_signal: Option<O>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Creep {
    target: u32,
    done: u32,
}

pub struct MotionUnit<O: DigitalOutput> {
    kin: Kinematics,
    pins: ConveyorPins<O>,
    enable_active_low: bool,
    enabled: bool,
    continuous: bool,
    creep: Option<Creep>,
    pulse_high: bool,
    last_assert: Option<Instant>,
    /// Scheduled time of the next rising edge.
    next_assert: Option<Instant>,
    pulses_emitted: u64,
}

impl<O: DigitalOutput> core::fmt::Debug for MotionUnit<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotionUnit")
            .field("kin", &self.kin)
            .field("enabled", &self.enabled)
            .field("continuous", &self.continuous)
            .field("creep", &self.creep)
            .field("pulses_emitted", &self.pulses_emitted)
            .finish()
    }
}

impl<O: DigitalOutput> MotionUnit<O> {
    /// Takes the driver lines, sets direction and leaves the driver disabled.
    pub fn new(kin: Kinematics, pins: ConveyorPins<O>, belt: &BeltCfg) -> Self {
        let mut m = Self {
            kin,
            pins,
            enable_active_low: belt.enable_active_low,
            enabled: false,
            continuous: false,
            creep: None,
            pulse_high: false,
            last_assert: None,
            next_assert: None,
            pulses_emitted: 0,
        };
        write_pin(&mut m.pins.dir, belt.direction_high, "conveyor_dir");
        write_pin(&mut m.pins.step, false, "conveyor_step");
        m.apply_enable(false);
        m
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kin
    }

    /// Run continuously until told otherwise. Cancels any creep.
    pub fn start(&mut self) {
        self.creep = None;
        self.continuous = true;
        self.apply_enable(true);
        tracing::debug!("conveyor start");
    }

    /// Stop immediately and disable the driver. Cancels any creep.
    pub fn stop(&mut self) {
        self.continuous = false;
        self.creep = None;
        self.end_pulse();
        self.apply_enable(false);
        tracing::debug!("conveyor stop");
    }

    /// Travel `mm` further, then stop. Non-positive distances stop at once.
    pub fn stop_after_distance(&mut self, mm: f32) {
        let pulses = self.kin.pulses_for(mm);
        tracing::debug!(mm, pulses, "creep to stop");
        self.creep_pulses(pulses);
    }

    /// Emit exactly `pulses` more pulses, then stop.
    pub fn creep_pulses(&mut self, pulses: u32) {
        if pulses == 0 {
            self.stop();
            return;
        }
        self.continuous = false;
        self.creep = Some(Creep {
            target: pulses,
            done: 0,
        });
        self.apply_enable(true);
    }

    /// Stop and return the pulses an interrupted creep still owed.
    pub fn suspend(&mut self) -> Option<u32> {
        let owed = self.creep_remaining();
        self.stop();
        owed
    }

    pub fn is_running(&self) -> bool {
        self.continuous || self.creep.is_some()
    }

    pub fn is_creeping(&self) -> bool {
        self.creep.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn creep_remaining(&self) -> Option<u32> {
        self.creep.map(|c| c.target.saturating_sub(c.done))
    }

    /// Completed pulses since construction.
    pub fn pulses_emitted(&self) -> u64 {
        self.pulses_emitted
    }

    /// Advance the pulse generator. Call every control tick.
    pub fn tick(&mut self, now: Instant) {
        if !self.is_running() {
            return;
        }
        if !self.pulse_high {
            if self.next_assert.is_none_or(|due| now >= due) {
                write_pin(&mut self.pins.step, true, "conveyor_step");
                self.pulse_high = true;
                self.last_assert = Some(now);
                self.next_assert = Some(self.next_slot(now));
            }
            return;
        }
        let asserted_at = self.last_assert.unwrap_or(now);
        if elapsed(now, asserted_at) < self.kin.pulse_width {
            return;
        }
        self.end_pulse();
        self.pulses_emitted += 1;
        if let Some(creep) = self.creep.as_mut() {
            creep.done += 1;
            if creep.done >= creep.target {
                tracing::debug!(pulses = creep.target, "creep complete");
                self.creep = None;
                self.continuous = false;
                self.apply_enable(false);
            }
        }
    }

    /// Edges are spaced from the schedule rather than from the tick that
    /// emitted them, so a coarse tick does not slow the belt. A backlog of a
    /// whole interval or more (after a stop) is dropped.
    fn next_slot(&self, now: Instant) -> Instant {
        let interval = self.kin.step_interval;
        match self.next_assert {
            Some(due) if elapsed(now, due) < interval => due + interval,
            _ => now + interval,
        }
    }

    fn end_pulse(&mut self) {
        if self.pulse_high {
            write_pin(&mut self.pins.step, false, "conveyor_step");
            self.pulse_high = false;
        }
    }

    fn apply_enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        write_pin(
            &mut self.pins.enable,
            enabled != self.enable_active_low,
            "conveyor_enable",
        );
        let moving = self.is_running();
        if let Some(sig) = self.pins.moving_signal.as_mut() {
            write_pin(sig, moving, "conveyor_signal");
        }
    }
}

pub(crate) fn write_pin<O: DigitalOutput>(pin: &mut O, high: bool, name: &'static str) {
    if let Err(e) = pin.set_level(high) {
        tracing::warn!(pin = name, error = %e, "output write failed");
    }
}
