#![allow(dead_code)]

use std::time::{Duration, Instant};

use jarline_core::{BoxedWorkCell, CellStatus, ProcessCfg};
use jarline_hardware::sim::SimPin;

pub const TICK: Duration = Duration::from_micros(100);

/// A work-cell wired to simulated pins, with a tap on every line.
/// Buttons and sensors are active-low and idle high.
pub struct Rig {
    pub cell: BoxedWorkCell,
    pub start: SimPin,
    pub stop: SimPin,
    pub paint_sensor: SimPin,
    pub cap_sensor: SimPin,
    pub aux: SimPin,
    pub piston: SimPin,
    pub screw: SimPin,
    pub close: SimPin,
    pub step: SimPin,
    pub enable: SimPin,
    pub signal: SimPin,
    pub machine_active: SimPin,
    pub led_running: SimPin,
    pub led_idle: SimPin,
    pub now: Instant,
    pub last: Option<CellStatus>,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_process(ProcessCfg::default())
    }

    pub fn with_process(process: ProcessCfg) -> Self {
        let high = || SimPin::new(true);
        let low = || SimPin::new(false);
        let (start, stop, paint_sensor, cap_sensor) = (high(), high(), high(), high());
        let (aux, piston, screw, close) = (low(), low(), low(), low());
        let (step, enable, signal) = (low(), low(), low());
        let (machine_active, led_running, led_idle) = (low(), low(), low());

        let cell = BoxedWorkCell::builder()
            .with_start_button(start.clone())
            .with_stop_button(stop.clone())
            .with_paint_sensor(paint_sensor.clone())
            .with_cap_sensor(cap_sensor.clone())
            .with_aux_valve(aux.clone())
            .with_paint_piston(piston.clone())
            .with_screw_valve(screw.clone())
            .with_close_valve(close.clone())
            .with_conveyor_step(step.clone())
            .with_conveyor_dir(low())
            .with_conveyor_enable(enable.clone())
            .with_conveyor_signal(signal.clone())
            .with_machine_active(machine_active.clone())
            .with_led_running(led_running.clone())
            .with_led_idle(led_idle.clone())
            .with_process(process)
            .try_build()
            .expect("build cell");

        Self {
            cell,
            start,
            stop,
            paint_sensor,
            cap_sensor,
            aux,
            piston,
            screw,
            close,
            step,
            enable,
            signal,
            machine_active,
            led_running,
            led_idle,
            now: Instant::now(),
            last: None,
        }
    }

    pub fn tick(&mut self) -> CellStatus {
        let s = self.cell.tick(self.now).expect("tick");
        self.now += TICK;
        self.last = Some(s);
        s
    }

    pub fn run_ms(&mut self, ms: u64) -> CellStatus {
        let end = self.now + Duration::from_millis(ms);
        let mut s = self.cell.status();
        while self.now < end {
            s = self.tick();
        }
        s
    }

    /// Tick until `done` holds or `limit_ms` passes. Returns whether it held.
    pub fn run_until(&mut self, limit_ms: u64, mut done: impl FnMut(&CellStatus) -> bool) -> bool {
        let end = self.now + Duration::from_millis(limit_ms);
        while self.now < end {
            if done(&self.tick()) {
                return true;
            }
        }
        false
    }

    /// Hold a button for 100 ms, then release it for 100 ms.
    pub fn press(&mut self, which: Button) {
        let pin = match which {
            Button::Start => self.start.clone(),
            Button::Stop => self.stop.clone(),
        };
        pin.drive(false);
        self.run_ms(100);
        pin.drive(true);
        self.run_ms(100);
    }

    pub fn jar_at_paint(&self, present: bool) {
        self.paint_sensor.drive(!present);
    }

    pub fn jar_at_cap(&self, present: bool) {
        self.cap_sensor.drive(!present);
    }

    /// Valve energised, for the default polarity (aux and piston inverted).
    pub fn aux_on(&self) -> bool {
        !self.aux.level()
    }

    pub fn piston_on(&self) -> bool {
        !self.piston.level()
    }

    pub fn conveyor_enabled(&self) -> bool {
        !self.enable.level()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Button {
    Start,
    Stop,
}
