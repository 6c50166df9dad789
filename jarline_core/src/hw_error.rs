//! Maps `Box<dyn Error>` from trait boundaries to typed `CellError`.
//!
//! The pin traits in `jarline_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `jarline_hardware::HwError` downcasting.

use crate::error::CellError;

/// Map a trait-boundary error to a typed `CellError`.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> CellError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<jarline_hardware::error::HwError>() {
            return match hw {
                jarline_hardware::error::HwError::Io(io) => CellError::Hardware(io.to_string()),
                other => CellError::HardwareFault(other.to_string()),
            };
        }
    }

    CellError::Hardware(e.to_string())
}
