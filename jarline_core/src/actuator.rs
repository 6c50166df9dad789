//! Timed on/off outputs (valves and pistons).

use std::time::{Duration, Instant};

use jarline_traits::DigitalOutput;

/// What an armed actuator does when its deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    TurnOn,
    TurnOff,
}

/// A digital output with one optional scheduled switch.
///
/// An inverted actuator is energised by driving its pin low. Write failures
/// are logged and otherwise ignored; the logical state always follows the
/// last command.
pub struct TimedActuator<O: DigitalOutput> {
    name: &'static str,
    output: O,
    inverted: bool,
    on: bool,
    armed: Option<(Instant, PendingAction)>,
}

impl<O: DigitalOutput> core::fmt::Debug for TimedActuator<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimedActuator")
            .field("name", &self.name)
            .field("on", &self.on)
            .field("armed", &self.armed)
            .finish()
    }
}

impl<O: DigitalOutput> TimedActuator<O> {
    /// Takes ownership of the pin and drives it to the off level.
    pub fn new(name: &'static str, output: O, inverted: bool) -> Self {
        let mut a = Self {
            name,
            output,
            inverted,
            on: false,
            armed: None,
        };
        a.write();
        a
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Energise now and cancel any scheduled switch.
    pub fn set_on(&mut self) {
        self.armed = None;
        self.drive(true);
    }

    /// De-energise now and cancel any scheduled switch.
    pub fn set_off(&mut self) {
        self.armed = None;
        self.drive(false);
    }

    /// Energise for `dur`, then switch off on a later `tick`.
    pub fn on_for(&mut self, dur: Duration, now: Instant) {
        self.drive(true);
        self.armed = Some((now + dur, PendingAction::TurnOff));
    }

    /// De-energise for `dur`, then switch on on a later `tick`.
    pub fn off_for(&mut self, dur: Duration, now: Instant) {
        self.drive(false);
        self.armed = Some((now + dur, PendingAction::TurnOn));
    }

    /// Apply the scheduled switch once its deadline has passed.
    /// Returns true when it fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.armed {
            Some((deadline, action)) if now >= deadline => {
                self.armed = None;
                self.drive(action == PendingAction::TurnOn);
                tracing::trace!(actuator = self.name, on = self.on, "scheduled switch");
                true
            }
            _ => false,
        }
    }

    /// Move the deadline later by `delta`. Used when resuming from pause.
    pub fn shift(&mut self, delta: Duration) {
        if let Some((deadline, _)) = self.armed.as_mut() {
            *deadline += delta;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn pending(&self) -> Option<PendingAction> {
        self.armed.map(|(_, a)| a)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|(d, _)| d)
    }

    /// Time left until the scheduled switch, if armed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.armed.map(|(d, _)| d.saturating_duration_since(now))
    }

    fn drive(&mut self, on: bool) {
        self.on = on;
        self.write();
    }

    fn write(&mut self) {
        let level = self.on != self.inverted;
        if let Err(e) = self.output.set_level(level) {
            tracing::warn!(actuator = self.name, error = %e, "output write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarline_hardware::sim::SimPin;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn new_drives_off_level() {
        let pin = SimPin::new(false);
        let _a = TimedActuator::new("aux", pin.clone(), true);
        assert!(pin.level());
        let pin = SimPin::new(true);
        let _b = TimedActuator::new("screw", pin.clone(), false);
        assert!(!pin.level());
    }

    #[test]
    fn on_for_switches_off_at_deadline() {
        let pin = SimPin::new(false);
        let mut a = TimedActuator::new("piston", pin.clone(), false);
        let t0 = Instant::now();
        a.on_for(1000 * MS, t0);
        assert!(a.is_on() && pin.level());
        assert_eq!(a.pending(), Some(PendingAction::TurnOff));
        assert!(!a.tick(t0 + 999 * MS));
        assert!(a.tick(t0 + 1000 * MS));
        assert!(!a.is_on() && !pin.level());
        assert!(!a.is_armed());
    }

    #[test]
    fn off_for_switches_back_on() {
        let pin = SimPin::new(false);
        let mut a = TimedActuator::new("aux", pin.clone(), true);
        let t0 = Instant::now();
        a.set_on();
        a.off_for(200 * MS, t0);
        assert!(!a.is_on());
        assert!(a.tick(t0 + 200 * MS));
        assert!(a.is_on());
        // Inverted: energised means low.
        assert!(!pin.level());
    }

    #[test]
    fn immediate_commands_cancel_schedule() {
        let mut a = TimedActuator::new("close", SimPin::new(false), false);
        let t0 = Instant::now();
        a.on_for(100 * MS, t0);
        a.set_on();
        assert!(!a.is_armed());
        assert!(!a.tick(t0 + 500 * MS));
        assert!(a.is_on());
    }

    #[test]
    fn shift_preserves_remaining_time() {
        let mut a = TimedActuator::new("piston", SimPin::new(false), false);
        let t0 = Instant::now();
        a.on_for(1000 * MS, t0);
        let before = a.remaining(t0 + 400 * MS);
        a.shift(5000 * MS);
        assert_eq!(a.remaining(t0 + 5400 * MS), before);
        assert!(!a.tick(t0 + 5999 * MS));
        assert!(a.tick(t0 + 6000 * MS));
    }

    #[test]
    fn write_failure_keeps_logical_state() {
        let pin = SimPin::new(false);
        let mut a = TimedActuator::new("screw", pin.clone(), false);
        pin.set_fault(true);
        a.set_on();
        assert!(a.is_on());
        assert!(!pin.level());
    }
}
