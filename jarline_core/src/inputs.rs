//! Polled input bank: two buttons and two jar sensors.

use std::time::Instant;

use eyre::WrapErr;
use jarline_traits::DigitalInput;

use crate::config::InputCfg;
use crate::debounce::{DebouncedButton, DebouncedSensor};
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::util::period_elapsed;

pub struct InputPins<I> {
    pub start_button: I,
    pub stop_button: I,
    pub paint_sensor: I,
    pub cap_sensor: I,
}

pub struct InputBank<I: DigitalInput> {
    pins: InputPins<I>,
    cfg: InputCfg,
    last_poll: Option<Instant>,
    pub(crate) start: DebouncedButton,
    pub(crate) stop: DebouncedButton,
    pub(crate) paint: DebouncedSensor,
    pub(crate) cap: DebouncedSensor,
}

impl<I: DigitalInput> InputBank<I> {
    pub fn new(pins: InputPins<I>, cfg: InputCfg) -> Self {
        Self {
            start: DebouncedButton::new(cfg.debounce, cfg.start),
            stop: DebouncedButton::new(cfg.debounce, cfg.stop),
            paint: DebouncedSensor::new(cfg.debounce),
            cap: DebouncedSensor::new(cfg.debounce),
            pins,
            cfg,
            last_poll: None,
        }
    }

    /// Sample every input if the poll interval has passed.
    /// Returns whether a sample was taken.
    pub fn refresh(&mut self, now: Instant) -> Result<bool> {
        if !period_elapsed(now, self.last_poll, self.cfg.poll) {
            return Ok(false);
        }
        self.last_poll = Some(now);

        let start = read(&mut self.pins.start_button, "start_button")?;
        let stop = read(&mut self.pins.stop_button, "stop_button")?;
        let paint = read(&mut self.pins.paint_sensor, "paint_sensor")?;
        let cap = read(&mut self.pins.cap_sensor, "cap_sensor")?;

        let b_low = self.cfg.button_active_low;
        let s_low = self.cfg.sensor_active_low;
        self.start.sample(start != b_low, now);
        self.stop.sample(stop != b_low, now);
        self.paint.sample(paint != s_low, now);
        self.cap.sample(cap != s_low, now);
        Ok(true)
    }

    pub fn take_start(&mut self) -> bool {
        self.start.take_command()
    }

    pub fn take_stop(&mut self) -> bool {
        self.stop.take_command()
    }

    pub fn paint_sensor(&self) -> &DebouncedSensor {
        &self.paint
    }

    pub fn cap_sensor(&self) -> &DebouncedSensor {
        &self.cap
    }

    pub fn start_button(&self) -> &DebouncedButton {
        &self.start
    }

    pub fn stop_button(&self) -> &DebouncedButton {
        &self.stop
    }
}

fn read<I: DigitalInput>(pin: &mut I, name: &'static str) -> Result<bool> {
    pin.is_high()
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err_with(|| format!("reading {name}"))
}
