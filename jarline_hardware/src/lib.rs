pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod sim;

use jarline_traits::{DigitalInput, DigitalOutput, PinError};
use std::cell::Cell;
use std::rc::Rc;

use crate::error::HwError;

#[derive(Debug, Default)]
struct SimPinState {
    level: Cell<bool>,
    rising_edges: Cell<u64>,
    writes: Cell<u64>,
    fault: Cell<bool>,
}

/// Simulated digital pin.
///
/// Clones share one line, so the control loop can own one end while a test or
/// the simulated belt drives or observes the other.
#[derive(Debug, Clone, Default)]
pub struct SimPin {
    state: Rc<SimPinState>,
}

impl SimPin {
    pub fn new(level: bool) -> Self {
        let pin = Self::default();
        pin.state.level.set(level);
        pin
    }

    /// Current electrical level.
    pub fn level(&self) -> bool {
        self.state.level.get()
    }

    /// Drive the line from the outside (simulated switch or sensor).
    pub fn drive(&self, high: bool) {
        self.state.level.set(high);
    }

    /// Number of low-to-high transitions written through `DigitalOutput`.
    pub fn rising_edges(&self) -> u64 {
        self.state.rising_edges.get()
    }

    /// Number of writes through `DigitalOutput`, including repeated levels.
    pub fn writes(&self) -> u64 {
        self.state.writes.get()
    }

    /// Make every subsequent read and write fail until cleared.
    pub fn set_fault(&self, fault: bool) {
        self.state.fault.set(fault);
    }
}

impl DigitalInput for SimPin {
    fn is_high(&mut self) -> Result<bool, PinError> {
        if self.state.fault.get() {
            return Err(Box::new(HwError::SimFault));
        }
        Ok(self.state.level.get())
    }
}

impl DigitalOutput for SimPin {
    fn set_level(&mut self, high: bool) -> Result<(), PinError> {
        if self.state.fault.get() {
            return Err(Box::new(HwError::SimFault));
        }
        let was = self.state.level.replace(high);
        if high && !was {
            self.state.rising_edges.set(self.state.rising_edges.get() + 1);
        }
        self.state.writes.set(self.state.writes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_level() {
        let pin = SimPin::new(true);
        let mut reader = pin.clone();
        assert!(reader.is_high().unwrap());
        pin.drive(false);
        assert!(!reader.is_high().unwrap());
    }

    #[test]
    fn output_counts_rising_edges() {
        let tap = SimPin::new(false);
        let mut out = tap.clone();
        out.set_level(true).unwrap();
        out.set_level(true).unwrap();
        out.set_level(false).unwrap();
        out.set_level(true).unwrap();
        assert_eq!(tap.rising_edges(), 2);
        assert_eq!(tap.writes(), 4);
        assert!(tap.level());
    }

    #[test]
    fn injected_fault_fails_reads() {
        let tap = SimPin::new(false);
        let mut pin = tap.clone();
        tap.set_fault(true);
        assert!(pin.is_high().is_err());
        tap.set_fault(false);
        assert!(pin.is_high().is_ok());
    }
}
