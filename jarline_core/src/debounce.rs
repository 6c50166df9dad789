//! Time-based debouncing for buttons and jar sensors.
//!
//! A raw level is accepted only after it has held for strictly longer than
//! the debounce window. Levels passed in here are already logical
//! (`true` = pressed / jar present); pin polarity is handled by the caller.

use std::time::{Duration, Instant};

use crate::config::{ButtonCfg, ButtonMode};
use crate::util::elapsed;

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    raw: bool,
    stable: bool,
    last_change: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            raw: false,
            stable: false,
            last_change: None,
        }
    }

    /// Feed one raw sample. Returns the new stable level when it changes.
    pub fn sample(&mut self, raw: bool, now: Instant) -> Option<bool> {
        if raw != self.raw || self.last_change.is_none() {
            self.last_change = Some(now);
        }
        self.raw = raw;
        let held = self.last_change.map_or(Duration::ZERO, |t| elapsed(now, t));
        if held > self.window && raw != self.stable {
            self.stable = raw;
            return Some(raw);
        }
        None
    }

    /// Accepted level.
    pub fn level(&self) -> bool {
        self.stable
    }

    /// No change is pending acceptance.
    pub fn is_stable(&self) -> bool {
        self.raw == self.stable
    }
}

/// Start/stop button. Momentary presses latch until consumed.
#[derive(Debug, Clone)]
pub struct DebouncedButton {
    debouncer: Debouncer,
    cfg: ButtonCfg,
    press_pending: bool,
    toggle_ref: bool,
}

impl DebouncedButton {
    pub fn new(window: Duration, cfg: ButtonCfg) -> Self {
        Self {
            debouncer: Debouncer::new(window),
            cfg,
            press_pending: false,
            // Reference starts at the released level so an untouched switch reports nothing.
            toggle_ref: cfg.invert,
        }
    }

    pub fn sample(&mut self, pressed: bool, now: Instant) {
        if self.debouncer.sample(pressed, now) == Some(true) {
            self.press_pending = true;
        }
    }

    /// Debounced pressed level.
    pub fn is_pressed(&self) -> bool {
        self.debouncer.level()
    }

    pub fn is_stable(&self) -> bool {
        self.debouncer.is_stable()
    }

    /// Returns true once per accepted press.
    pub fn consume_momentary_press(&mut self) -> bool {
        std::mem::take(&mut self.press_pending)
    }

    /// Returns true once per change of the logical switch level.
    pub fn consume_toggle_change(&mut self) -> bool {
        let logical = self.toggle_state();
        let changed = logical != self.toggle_ref;
        self.toggle_ref = logical;
        changed
    }

    /// Logical switch level with inversion applied.
    pub fn toggle_state(&self) -> bool {
        self.debouncer.level() != self.cfg.invert
    }

    /// Consume a command according to the configured mode.
    pub fn take_command(&mut self) -> bool {
        match self.cfg.mode {
            ButtonMode::Momentary => self.consume_momentary_press(),
            ButtonMode::Toggle => self.consume_toggle_change(),
        }
    }
}

/// Jar presence sensor. A rising edge stays pending until it is consumed
/// or the next sample is taken.
#[derive(Debug, Clone)]
pub struct DebouncedSensor {
    debouncer: Debouncer,
    previous: bool,
    rising_pending: bool,
}

impl DebouncedSensor {
    pub fn new(window: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(window),
            previous: false,
            rising_pending: false,
        }
    }

    pub fn sample(&mut self, present: bool, now: Instant) {
        self.previous = self.debouncer.level();
        let accepted = self.debouncer.sample(present, now);
        self.rising_pending = accepted == Some(true) && !self.previous;
    }

    /// Debounced presence.
    pub fn is_active(&self) -> bool {
        self.debouncer.level()
    }

    pub fn is_stable(&self) -> bool {
        self.debouncer.is_stable()
    }

    /// Returns true at most once per rising edge.
    pub fn consume_rising_edge(&mut self) -> bool {
        std::mem::take(&mut self.rising_pending)
    }
}
