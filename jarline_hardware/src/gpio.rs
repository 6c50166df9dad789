//! Raspberry Pi GPIO backend (rppal). BCM pin numbering.

use jarline_traits::{DigitalInput, DigitalOutput, PinError};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use tracing::debug;

use crate::error::{HwError, Result};

pub struct GpioInput {
    pin: InputPin,
}

pub struct GpioOutput {
    pin: OutputPin,
}

/// Owns the GPIO peripheral handle and hands out pins.
pub struct GpioBank {
    gpio: Gpio,
}

impl GpioBank {
    pub fn open() -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))?;
        Ok(Self { gpio })
    }

    /// Claim an input with the internal pull-up enabled (switches and NPN sensors pull low).
    pub fn input_pullup(&self, bcm: u8) -> Result<GpioInput> {
        let pin = self
            .gpio
            .get(bcm)
            .map_err(|e| HwError::Gpio(format!("input pin {bcm}: {e}")))?
            .into_input_pullup();
        debug!(bcm, "input claimed");
        Ok(GpioInput { pin })
    }

    /// Claim an output, starting at `initial_high`.
    pub fn output(&self, bcm: u8, initial_high: bool) -> Result<GpioOutput> {
        let raw = self
            .gpio
            .get(bcm)
            .map_err(|e| HwError::Gpio(format!("output pin {bcm}: {e}")))?;
        let pin = if initial_high {
            raw.into_output_high()
        } else {
            raw.into_output_low()
        };
        debug!(bcm, initial_high, "output claimed");
        Ok(GpioOutput { pin })
    }
}

impl DigitalInput for GpioInput {
    fn is_high(&mut self) -> std::result::Result<bool, PinError> {
        Ok(self.pin.is_high())
    }
}

impl DigitalOutput for GpioOutput {
    fn set_level(&mut self, high: bool) -> std::result::Result<(), PinError> {
        if high {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}
