//! Pin backends: the simulated belt line and, with `--features hardware`, Raspberry Pi GPIO.

use jarline_config::Config;
use jarline_core::{BoxedWorkCell, Kinematics};
use jarline_hardware::sim::{SimLine, SimLineCfg, SimLinePins, SimPin};

/// A work-cell wired to a simulated belt, plus handles on its buttons.
pub struct SimBench {
    pub cell: BoxedWorkCell,
    pub line: SimLine,
    pub start: SimPin,
    pub stop: SimPin,
    pub button_active_low: bool,
}

/// Hold or release a simulated button.
pub fn hold_button(button: &SimPin, pressed: bool, active_low: bool) {
    button.drive(pressed != active_low);
}

pub fn sim_line_cfg(cfg: &Config, batches: u32) -> SimLineCfg {
    let kin = Kinematics::from_belt(&jarline_core::BeltCfg::from(&cfg.belt));
    SimLineCfg {
        pulses_per_mm: f64::from(kin.steps_per_mm()),
        jar_pitch_mm: f64::from(cfg.sim.jar_pitch_mm),
        jar_width_mm: f64::from(cfg.sim.jar_width_mm),
        batch_size: cfg.batch.size,
        batch_gap_mm: f64::from(cfg.sim.batch_gap_mm),
        batches,
        lead_in_mm: f64::from(cfg.sim.lead_in_mm),
        paint_sensor_mm: 0.0,
        cap_sensor_mm: f64::from(cfg.sim.cap_sensor_mm),
        sensor_active_low: cfg.inputs.sensor_active_low,
        enable_active_low: cfg.belt.enable_active_low,
    }
}

pub fn sim_bench(cfg: &Config, batches: u32) -> eyre::Result<SimBench> {
    let released = cfg.inputs.button_active_low;
    let start = SimPin::new(released);
    let stop = SimPin::new(released);
    let pins = SimLinePins {
        step: SimPin::new(false),
        enable: SimPin::new(cfg.belt.enable_active_low),
        paint_sensor: SimPin::default(),
        cap_sensor: SimPin::default(),
    };
    // Sensors must carry their idle level before the debouncers take their first sample.
    let line = SimLine::new(sim_line_cfg(cfg, batches), pins.clone());

    let cell = BoxedWorkCell::builder()
        .with_start_button(start.clone())
        .with_stop_button(stop.clone())
        .with_paint_sensor(pins.paint_sensor.clone())
        .with_cap_sensor(pins.cap_sensor.clone())
        .with_aux_valve(SimPin::default())
        .with_paint_piston(SimPin::default())
        .with_screw_valve(SimPin::default())
        .with_close_valve(SimPin::default())
        .with_conveyor_step(pins.step.clone())
        .with_conveyor_dir(SimPin::default())
        .with_conveyor_enable(pins.enable.clone())
        .apply_config(cfg)
        .try_build()?;

    Ok(SimBench {
        cell,
        line,
        start,
        stop,
        button_active_low: cfg.inputs.button_active_low,
    })
}

/// Claim every configured GPIO line and build the cell on top of them.
///
/// Outputs are claimed at their de-energised level so nothing twitches between
/// claiming the pin and the builder driving it.
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn hardware_cell(cfg: &Config) -> eyre::Result<BoxedWorkCell> {
    use jarline_core::hw_error::map_hw_error;
    use jarline_hardware::gpio::GpioBank;

    let hw = |e: jarline_hardware::error::HwError| eyre::Report::new(map_hw_error(&e));
    let bank = GpioBank::open().map_err(hw)?;
    let p = &cfg.pins;
    let v = &cfg.valves;

    let input = |bcm: u8| bank.input_pullup(bcm).map_err(hw);
    let output = |bcm: u8, initial_high: bool| bank.output(bcm, initial_high).map_err(hw);

    let mut builder = BoxedWorkCell::builder()
        .with_start_button(input(p.start_button)?)
        .with_stop_button(input(p.stop_button)?)
        .with_paint_sensor(input(p.paint_sensor)?)
        .with_cap_sensor(input(p.cap_sensor)?)
        .with_aux_valve(output(p.aux_valve, v.aux_inverted)?)
        .with_paint_piston(output(p.paint_piston, v.paint_piston_inverted)?)
        .with_screw_valve(output(p.screw_valve, v.screw_inverted)?)
        .with_close_valve(output(p.close_valve, v.close_inverted)?)
        .with_conveyor_step(output(p.conveyor_step, false)?)
        .with_conveyor_dir(output(p.conveyor_dir, cfg.belt.direction_high)?)
        .with_conveyor_enable(output(p.conveyor_enable, cfg.belt.enable_active_low)?);

    if let Some(bcm) = p.conveyor_signal {
        builder = builder.with_conveyor_signal(output(bcm, false)?);
    }
    if let Some(bcm) = p.machine_active {
        builder = builder.with_machine_active(output(bcm, false)?);
    }
    if let Some(bcm) = p.led_running {
        builder = builder.with_led_running(output(bcm, false)?);
    }
    if let Some(bcm) = p.led_idle {
        builder = builder.with_led_idle(output(bcm, false)?);
    }

    builder.apply_config(cfg).try_build()
}
