#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the jar line work-cell.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section except `[pins]` defaults to the values the cell was
//!   commissioned with, so a config file only needs to list what differs.
//! - The config is read once at start-up; nothing in the stack mutates it.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// BCM pin numbers for every line the controller touches.
#[derive(Debug, Deserialize, Clone)]
pub struct Pins {
    pub start_button: u8,
    pub stop_button: u8,
    /// Proximity sensor under the paint nozzle.
    pub paint_sensor: u8,
    /// Proximity sensor under the capping press.
    pub cap_sensor: u8,
    /// Auxiliary valve pulsed on start and after every paint cycle.
    pub aux_valve: u8,
    pub paint_piston: u8,
    /// Cap screw-on valve, held while a cap is being closed.
    pub screw_valve: u8,
    /// Cap close valve, pulsed while the screw valve is held.
    pub close_valve: u8,
    pub conveyor_step: u8,
    pub conveyor_dir: u8,
    pub conveyor_enable: u8,
    /// Optional "conveyor moving" line for neighbouring controllers.
    pub conveyor_signal: Option<u8>,
    /// Optional "machine active" line for the downstream packaging controller.
    pub machine_active: Option<u8>,
    pub led_running: Option<u8>,
    pub led_idle: Option<u8>,
}

impl Pins {
    fn named(&self) -> Vec<(&'static str, u8)> {
        let mut v = vec![
            ("start_button", self.start_button),
            ("stop_button", self.stop_button),
            ("paint_sensor", self.paint_sensor),
            ("cap_sensor", self.cap_sensor),
            ("aux_valve", self.aux_valve),
            ("paint_piston", self.paint_piston),
            ("screw_valve", self.screw_valve),
            ("close_valve", self.close_valve),
            ("conveyor_step", self.conveyor_step),
            ("conveyor_dir", self.conveyor_dir),
            ("conveyor_enable", self.conveyor_enable),
        ];
        let optional = [
            ("conveyor_signal", self.conveyor_signal),
            ("machine_active", self.machine_active),
            ("led_running", self.led_running),
            ("led_idle", self.led_idle),
        ];
        v.extend(optional.into_iter().filter_map(|(n, p)| p.map(|p| (n, p))));
        v
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ButtonMode {
    /// One event per press.
    #[default]
    Momentary,
    /// Maintained switch; one event per level change.
    Toggle,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputsCfg {
    /// Raw level must hold longer than this before it is accepted.
    pub debounce_ms: u64,
    /// Sampling interval for buttons and sensors.
    pub poll_ms: u64,
    /// Sensors pull the line low when a jar is present.
    pub sensor_active_low: bool,
    /// Buttons pull the line low when pressed.
    pub button_active_low: bool,
    pub start_mode: ButtonMode,
    pub stop_mode: ButtonMode,
    /// Invert the logical level of the start switch (toggle mode only).
    pub invert_start: bool,
    /// Invert the logical level of the stop switch (toggle mode only).
    pub invert_stop: bool,
}

impl Default for InputsCfg {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            poll_ms: 10,
            sensor_active_low: true,
            button_active_low: true,
            start_mode: ButtonMode::Momentary,
            stop_mode: ButtonMode::Momentary,
            invert_start: false,
            invert_stop: false,
        }
    }
}

/// Valve polarity. An inverted valve is energised by driving its pin low.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ValvesCfg {
    pub aux_inverted: bool,
    pub paint_piston_inverted: bool,
    pub screw_inverted: bool,
    pub close_inverted: bool,
}

impl Default for ValvesCfg {
    fn default() -> Self {
        Self {
            aux_inverted: true,
            paint_piston_inverted: true,
            screw_inverted: false,
            close_inverted: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimingCfg {
    pub paint_piston_hold_ms: u64,
    /// Settle time after the piston retracts before the belt may move.
    pub paint_settle_ms: u64,
    /// Auxiliary valve pulse = on time + extra hold.
    pub aux_on_ms: u64,
    pub aux_hold_ms: u64,
    /// Pause between screw-on and the close pulse.
    pub cap_screw_pause_ms: u64,
    pub cap_close_hold_ms: u64,
    /// Pause after the close pulse before the screw valve releases.
    pub cap_close_pause_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            paint_piston_hold_ms: 1000,
            paint_settle_ms: 50,
            aux_on_ms: 1000,
            aux_hold_ms: 400,
            cap_screw_pause_ms: 300,
            cap_close_hold_ms: 800,
            cap_close_pause_ms: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BatchCfg {
    /// Jars travelling together; only the first of each batch is processed.
    pub size: u32,
}

impl Default for BatchCfg {
    fn default() -> Self {
        Self { size: 6 }
    }
}

/// Belt and stepper kinematics.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BeltCfg {
    /// Belt tooth pitch (GT2 = 2 mm).
    pub pitch_mm: f32,
    pub pulley_teeth: u32,
    pub microsteps: u32,
    pub motor_steps_per_rev: u32,
    pub speed_mm_per_s: f32,
    /// STEP high time.
    pub pulse_width_us: u64,
    /// Extra travel after the paint sensor fires, to centre the jar under the nozzle.
    pub centering_mm: f32,
    /// Level written to DIR.
    pub direction_high: bool,
    /// Driver is enabled while EN is low.
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
            pulse_width_us: 10,
            centering_mm: 8.0,
            direction_high: false,
            enable_active_low: true,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunnerCfg {
    /// Control loop period in microseconds.
    pub tick_us: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self { tick_us: 50 }
    }
}

/// Geometry of the simulated line used by `jarline simulate` and sim-mode `run`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimCfg {
    pub jar_pitch_mm: f32,
    pub jar_width_mm: f32,
    pub batch_gap_mm: f32,
    pub lead_in_mm: f32,
    /// Distance from the paint sensor to the cap sensor.
    pub cap_sensor_mm: f32,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            jar_pitch_mm: 50.0,
            jar_width_mm: 40.0,
            batch_gap_mm: 100.0,
            lead_in_mm: 20.0,
            cap_sensor_mm: 430.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub inputs: InputsCfg,
    #[serde(default)]
    pub valves: ValvesCfg,
    #[serde(default)]
    pub timing: TimingCfg,
    #[serde(default)]
    pub batch: BatchCfg,
    #[serde(default)]
    pub belt: BeltCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub sim: SimCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_path(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {}", path.display(), e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        let mut seen: HashMap<u8, &'static str> = HashMap::new();
        for (name, pin) in self.pins.named() {
            if let Some(prev) = seen.insert(pin, name) {
                eyre::bail!("pins.{name} reuses pin {pin} already assigned to pins.{prev}");
            }
        }

        // Inputs
        if self.inputs.debounce_ms == 0 {
            eyre::bail!("inputs.debounce_ms must be >= 1");
        }
        if self.inputs.poll_ms == 0 {
            eyre::bail!("inputs.poll_ms must be >= 1");
        }
        if self.inputs.poll_ms > self.inputs.debounce_ms {
            eyre::bail!("inputs.poll_ms must not exceed inputs.debounce_ms");
        }

        // Batch
        if self.batch.size == 0 {
            eyre::bail!("batch.size must be >= 1");
        }

        // Belt
        let b = &self.belt;
        if !(b.pitch_mm.is_finite() && b.pitch_mm > 0.0) {
            eyre::bail!("belt.pitch_mm must be > 0");
        }
        if b.pulley_teeth == 0 {
            eyre::bail!("belt.pulley_teeth must be > 0");
        }
        if b.microsteps == 0 {
            eyre::bail!("belt.microsteps must be > 0");
        }
        if b.motor_steps_per_rev == 0 {
            eyre::bail!("belt.motor_steps_per_rev must be > 0");
        }
        if !(b.speed_mm_per_s.is_finite() && b.speed_mm_per_s > 0.0) {
            eyre::bail!("belt.speed_mm_per_s must be > 0");
        }
        if b.pulse_width_us == 0 {
            eyre::bail!("belt.pulse_width_us must be >= 1");
        }
        if !b.centering_mm.is_finite() || b.centering_mm < 0.0 {
            eyre::bail!("belt.centering_mm must be finite and >= 0");
        }
        let steps_per_mm = (b.motor_steps_per_rev as f32 * b.microsteps as f32)
            / (b.pitch_mm * b.pulley_teeth as f32);
        let step_interval_us = 1_000_000.0 / (steps_per_mm * b.speed_mm_per_s);
        if (b.pulse_width_us as f32) >= step_interval_us {
            eyre::bail!(
                "belt.pulse_width_us ({}) must be shorter than the step interval ({:.1} us)",
                b.pulse_width_us,
                step_interval_us
            );
        }

        // Runner
        if self.runner.tick_us == 0 {
            eyre::bail!("runner.tick_us must be >= 1");
        }
        // A step needs one tick high and one tick low.
        if self.runner.tick_us.saturating_mul(2) as f32 > step_interval_us {
            eyre::bail!(
                "runner.tick_us ({}) must be at most half the step interval ({:.1} us)",
                self.runner.tick_us,
                step_interval_us
            );
        }

        // Sim
        let s = &self.sim;
        if !(s.jar_width_mm > 0.0 && s.jar_width_mm < s.jar_pitch_mm) {
            eyre::bail!("sim.jar_width_mm must be > 0 and < sim.jar_pitch_mm");
        }
        if s.batch_gap_mm < 0.0 || s.lead_in_mm < 0.0 || s.cap_sensor_mm <= 0.0 {
            eyre::bail!("sim distances must be >= 0 (cap_sensor_mm > 0)");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[pins]
start_button = 5
stop_button = 6
paint_sensor = 13
cap_sensor = 19
aux_valve = 17
paint_piston = 27
screw_valve = 22
close_valve = 23
conveyor_step = 24
conveyor_dir = 25
conveyor_enable = 12
"#;

    #[test]
    fn minimal_config_takes_commissioned_defaults() {
        let cfg = load_toml(MINIMAL).expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(cfg.batch.size, 6);
        assert_eq!(cfg.timing.paint_piston_hold_ms, 1000);
        assert_eq!(cfg.timing.aux_on_ms + cfg.timing.aux_hold_ms, 1400);
        assert_eq!(cfg.inputs.debounce_ms, 50);
        assert!(cfg.valves.aux_inverted);
        assert!(!cfg.valves.screw_inverted);
        assert_eq!(cfg.inputs.start_mode, ButtonMode::Momentary);
    }

    #[test]
    fn duplicate_pin_is_rejected() {
        let toml = MINIMAL.replace("close_valve = 23", "close_valve = 22");
        let cfg = load_toml(&toml).expect("parse");
        let err = cfg.validate().expect_err("duplicate pin");
        assert!(format!("{err}").contains("reuses pin 22"));
    }
}
