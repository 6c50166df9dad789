//! Stand-in pins for optional lines that are not wired.

use jarline_traits::{DigitalInput, DigitalOutput, PinError};

/// Output that accepts and discards every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl DigitalOutput for NullOutput {
    fn set_level(&mut self, _high: bool) -> Result<(), PinError> {
        Ok(())
    }
}

/// Input fixed at one level.
#[derive(Debug, Clone, Copy)]
pub struct FixedInput(pub bool);

impl DigitalInput for FixedInput {
    fn is_high(&mut self) -> Result<bool, PinError> {
        Ok(self.0)
    }
}
