pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Boxed error used at every hardware boundary.
pub type PinError = Box<dyn std::error::Error + Send + Sync>;

/// One digital input line (button, proximity sensor).
///
/// Implementations report the electrical level; polarity is resolved by the core.
pub trait DigitalInput {
    fn is_high(&mut self) -> Result<bool, PinError>;
}

/// One digital output line (valve, LED, stepper STEP/DIR/EN, signal line).
pub trait DigitalOutput {
    fn set_level(&mut self, high: bool) -> Result<(), PinError>;
}

impl<T: DigitalInput + ?Sized> DigitalInput for Box<T> {
    fn is_high(&mut self) -> Result<bool, PinError> {
        (**self).is_high()
    }
}

impl<T: DigitalOutput + ?Sized> DigitalOutput for Box<T> {
    fn set_level(&mut self, high: bool) -> Result<(), PinError> {
        (**self).set_level(high)
    }
}
