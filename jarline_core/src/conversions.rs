//! `From` implementations bridging `jarline_config` types to `jarline_core` types.

use std::time::Duration;

use crate::config::{BeltCfg, ButtonCfg, ButtonMode, InputCfg, ProcessCfg, ValvePolarity};

// ── Inputs ───────────────────────────────────────────────────────────────────

impl From<jarline_config::ButtonMode> for ButtonMode {
    fn from(m: jarline_config::ButtonMode) -> Self {
        match m {
            jarline_config::ButtonMode::Momentary => Self::Momentary,
            jarline_config::ButtonMode::Toggle => Self::Toggle,
        }
    }
}

impl From<&jarline_config::InputsCfg> for InputCfg {
    fn from(c: &jarline_config::InputsCfg) -> Self {
        Self {
            debounce: Duration::from_millis(c.debounce_ms),
            poll: Duration::from_millis(c.poll_ms),
            sensor_active_low: c.sensor_active_low,
            button_active_low: c.button_active_low,
            start: ButtonCfg {
                mode: c.start_mode.into(),
                invert: c.invert_start,
            },
            stop: ButtonCfg {
                mode: c.stop_mode.into(),
                invert: c.invert_stop,
            },
        }
    }
}

// ── Valves ───────────────────────────────────────────────────────────────────

impl From<&jarline_config::ValvesCfg> for ValvePolarity {
    fn from(c: &jarline_config::ValvesCfg) -> Self {
        Self {
            aux_inverted: c.aux_inverted,
            paint_piston_inverted: c.paint_piston_inverted,
            screw_inverted: c.screw_inverted,
            close_inverted: c.close_inverted,
        }
    }
}

// ── Processes ────────────────────────────────────────────────────────────────

/// Timings, batch size and centering distance live in three config sections.
impl From<&jarline_config::Config> for ProcessCfg {
    fn from(c: &jarline_config::Config) -> Self {
        let t = &c.timing;
        Self {
            paint_piston_hold: Duration::from_millis(t.paint_piston_hold_ms),
            paint_settle: Duration::from_millis(t.paint_settle_ms),
            aux_pulse: Duration::from_millis(t.aux_on_ms.saturating_add(t.aux_hold_ms)),
            cap_screw_pause: Duration::from_millis(t.cap_screw_pause_ms),
            cap_close_hold: Duration::from_millis(t.cap_close_hold_ms),
            cap_close_pause: Duration::from_millis(t.cap_close_pause_ms),
            batch_size: c.batch.size,
            centering_mm: c.belt.centering_mm,
        }
    }
}

// ── Belt ─────────────────────────────────────────────────────────────────────

impl From<&jarline_config::BeltCfg> for BeltCfg {
    fn from(c: &jarline_config::BeltCfg) -> Self {
        Self {
            pitch_mm: c.pitch_mm,
            pulley_teeth: c.pulley_teeth,
            microsteps: c.microsteps,
            motor_steps_per_rev: c.motor_steps_per_rev,
            speed_mm_per_s: c.speed_mm_per_s,
            pulse_width: Duration::from_micros(c.pulse_width_us),
            direction_high: c.direction_high,
            enable_active_low: c.enable_active_low,
        }
    }
}
