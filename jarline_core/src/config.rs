//! Configuration types for the work-cell.
//!
//! These are the runtime configuration structs used by `WorkCell`.
//! They are separate from the TOML-deserialized config in `jarline_config`.

use std::time::Duration;

/// How a button's debounced level is turned into commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ButtonMode {
    /// One command per accepted press.
    #[default]
    Momentary,
    /// One command per accepted change of a maintained switch.
    Toggle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonCfg {
    pub mode: ButtonMode,
    /// Invert the logical level before toggle comparison.
    pub invert: bool,
}

/// Input sampling and polarity.
#[derive(Debug, Clone)]
pub struct InputCfg {
    /// Raw level must hold strictly longer than this to be accepted.
    pub debounce: Duration,
    /// Inputs are sampled at most once per poll interval.
    pub poll: Duration,
    pub sensor_active_low: bool,
    pub button_active_low: bool,
    pub start: ButtonCfg,
    pub stop: ButtonCfg,
}

impl Default for InputCfg {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(50),
            poll: Duration::from_millis(10),
            sensor_active_low: true,
            button_active_low: true,
            start: ButtonCfg::default(),
            stop: ButtonCfg::default(),
        }
    }
}

/// Which valves are energised by driving their pin low.
#[derive(Debug, Clone, Copy)]
pub struct ValvePolarity {
    pub aux_inverted: bool,
    pub paint_piston_inverted: bool,
    pub screw_inverted: bool,
    pub close_inverted: bool,
}

impl Default for ValvePolarity {
    fn default() -> Self {
        Self {
            aux_inverted: true,
            paint_piston_inverted: true,
            screw_inverted: false,
            close_inverted: false,
        }
    }
}

/// Phase timings and batching for the two process stations.
#[derive(Debug, Clone)]
pub struct ProcessCfg {
    pub paint_piston_hold: Duration,
    pub paint_settle: Duration,
    /// Full auxiliary valve pulse (on time plus extra hold).
    pub aux_pulse: Duration,
    pub cap_screw_pause: Duration,
    pub cap_close_hold: Duration,
    pub cap_close_pause: Duration,
    /// Jars per batch; only the first jar of each batch is processed.
    pub batch_size: u32,
    /// Travel after a paint detection before the jar sits under the nozzle.
    pub centering_mm: f32,
}

impl Default for ProcessCfg {
    fn default() -> Self {
        Self {
            paint_piston_hold: Duration::from_millis(1000),
            paint_settle: Duration::from_millis(50),
            aux_pulse: Duration::from_millis(1400),
            cap_screw_pause: Duration::from_millis(300),
            cap_close_hold: Duration::from_millis(800),
            cap_close_pause: Duration::from_millis(300),
            batch_size: 6,
            centering_mm: 8.0,
        }
    }
}

impl ProcessCfg {
    /// Jars skipped after each processed one.
    pub fn jars_to_skip(&self) -> u32 {
        self.batch_size.saturating_sub(1)
    }
}

/// Belt drive geometry and driver polarity.
#[derive(Debug, Clone)]
pub struct BeltCfg {
    pub pitch_mm: f32,
    pub pulley_teeth: u32,
    pub microsteps: u32,
    pub motor_steps_per_rev: u32,
    pub speed_mm_per_s: f32,
    pub pulse_width: Duration,
    pub direction_high: bool,
    pub enable_active_low: bool,
}

impl Default for BeltCfg {
    fn default() -> Self {
        Self {
            pitch_mm: 2.0,
            pulley_teeth: 20,
            microsteps: 8,
            motor_steps_per_rev: 200,
            speed_mm_per_s: 50.0,
            pulse_width: Duration::from_micros(10),
            direction_high: false,
            enable_active_low: true,
        }
    }
}
