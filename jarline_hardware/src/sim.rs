//! Simulated belt line.
//!
//! Jars ride the belt in batches. Belt travel is derived from the STEP pulses
//! the controller writes while the driver is enabled, and the two proximity
//! sensors are driven to their active level whenever a jar body sits in front
//! of them. Positions are in millimetres along the belt; the paint sensor sits
//! at `paint_sensor_mm`, jars start upstream of it.

pub use crate::SimPin;

#[derive(Debug, Clone)]
pub struct SimLineCfg {
    /// STEP pulses per millimetre of belt travel.
    pub pulses_per_mm: f64,
    /// Front-to-front spacing of jars inside one batch.
    pub jar_pitch_mm: f64,
    /// Length of a jar along the belt; must be shorter than the pitch.
    pub jar_width_mm: f64,
    pub batch_size: u32,
    /// Extra spacing between the last jar of one batch and the first of the next.
    pub batch_gap_mm: f64,
    pub batches: u32,
    /// Distance from the first jar's front to the paint sensor at start.
    pub lead_in_mm: f64,
    pub paint_sensor_mm: f64,
    pub cap_sensor_mm: f64,
    /// Sensors pull the line low when a jar is present.
    pub sensor_active_low: bool,
    /// Stepper driver is enabled while EN is low.
    pub enable_active_low: bool,
}

impl Default for SimLineCfg {
    fn default() -> Self {
        Self {
            pulses_per_mm: 40.0,
            jar_pitch_mm: 50.0,
            jar_width_mm: 40.0,
            batch_size: 6,
            batch_gap_mm: 100.0,
            batches: 2,
            lead_in_mm: 20.0,
            paint_sensor_mm: 0.0,
            cap_sensor_mm: 430.0,
            sensor_active_low: true,
            enable_active_low: true,
        }
    }
}

/// Pins shared between the simulated line and the controller.
#[derive(Debug, Clone, Default)]
pub struct SimLinePins {
    pub step: SimPin,
    pub enable: SimPin,
    pub paint_sensor: SimPin,
    pub cap_sensor: SimPin,
}

#[derive(Debug)]
pub struct SimLine {
    cfg: SimLineCfg,
    pins: SimLinePins,
    travel_mm: f64,
    seen_pulses: u64,
}

impl SimLine {
    pub fn new(cfg: SimLineCfg, pins: SimLinePins) -> Self {
        let mut line = Self {
            cfg,
            seen_pulses: pins.step.rising_edges(),
            pins,
            travel_mm: 0.0,
        };
        line.drive_sensors();
        line
    }

    /// Account for pulses written since the last call and refresh the sensor lines.
    pub fn update(&mut self) {
        let pulses = self.pins.step.rising_edges();
        let fresh = pulses.saturating_sub(self.seen_pulses);
        self.seen_pulses = pulses;
        if self.driver_enabled() && self.cfg.pulses_per_mm > 0.0 {
            self.travel_mm += fresh as f64 / self.cfg.pulses_per_mm;
        }
        self.drive_sensors();
    }

    pub fn travel_mm(&self) -> f64 {
        self.travel_mm
    }

    pub fn jar_count(&self) -> u32 {
        self.cfg.batch_size.saturating_mul(self.cfg.batches)
    }

    /// Jars whose rear edge has fully passed the cap sensor.
    pub fn jars_delivered(&self) -> u32 {
        (0..self.jar_count())
            .filter(|&i| self.jar_front(i) - self.cfg.jar_width_mm >= self.cfg.cap_sensor_mm)
            .count() as u32
    }

    pub fn paint_sensor_covered(&self) -> bool {
        self.covered(self.cfg.paint_sensor_mm)
    }

    pub fn cap_sensor_covered(&self) -> bool {
        self.covered(self.cfg.cap_sensor_mm)
    }

    fn driver_enabled(&self) -> bool {
        self.pins.enable.level() != self.cfg.enable_active_low
    }

    fn jar_front(&self, index: u32) -> f64 {
        let batch_size = self.cfg.batch_size.max(1);
        let batch = f64::from(index / batch_size);
        let slot = f64::from(index % batch_size);
        let batch_len = f64::from(batch_size) * self.cfg.jar_pitch_mm + self.cfg.batch_gap_mm;
        let start = self.cfg.paint_sensor_mm
            - self.cfg.lead_in_mm
            - batch * batch_len
            - slot * self.cfg.jar_pitch_mm;
        start + self.travel_mm
    }

    fn covered(&self, sensor_mm: f64) -> bool {
        (0..self.jar_count()).any(|i| {
            let front = self.jar_front(i);
            front >= sensor_mm && front - self.cfg.jar_width_mm < sensor_mm
        })
    }

    fn drive_sensors(&mut self) {
        let active_level = !self.cfg.sensor_active_low;
        let paint = self.paint_sensor_covered();
        let cap = self.cap_sensor_covered();
        self.pins
            .paint_sensor
            .drive(if paint { active_level } else { !active_level });
        self.pins
            .cap_sensor
            .drive(if cap { active_level } else { !active_level });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarline_traits::DigitalOutput;

    fn pulse(step: &mut SimPin, n: u32) {
        for _ in 0..n {
            step.set_level(true).unwrap();
            step.set_level(false).unwrap();
        }
    }

    #[test]
    fn sensors_idle_high_before_first_jar() {
        let pins = SimLinePins::default();
        let line = SimLine::new(SimLineCfg::default(), pins.clone());
        assert!(!line.paint_sensor_covered());
        assert!(pins.paint_sensor.level());
        assert!(pins.cap_sensor.level());
    }

    #[test]
    fn travel_only_counts_while_enabled() {
        let pins = SimLinePins::default();
        let mut step = pins.step.clone();
        let mut line = SimLine::new(SimLineCfg::default(), pins.clone());

        // EN high = driver disabled
        pins.enable.drive(true);
        pulse(&mut step, 40);
        line.update();
        assert_eq!(line.travel_mm(), 0.0);

        pins.enable.drive(false);
        pulse(&mut step, 40);
        line.update();
        assert!((line.travel_mm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn first_jar_pulls_paint_sensor_low() {
        let pins = SimLinePins::default();
        let mut step = pins.step.clone();
        pins.enable.drive(false);
        let mut line = SimLine::new(SimLineCfg::default(), pins.clone());

        // lead-in is 20 mm at 40 pulses/mm
        pulse(&mut step, 20 * 40);
        line.update();
        assert!(line.paint_sensor_covered());
        assert!(!pins.paint_sensor.level());
    }
}
