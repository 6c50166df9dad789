//! Builder for `WorkCell` with boxed pins.
//!
//! Every required line must be supplied before `try_build()` succeeds; the
//! optional status lines fall back to `NullOutput`.

use jarline_traits::{DigitalInput, DigitalOutput};

use crate::actuator::TimedActuator;
use crate::cell::{BoxedWorkCell, StatusLines, Valves, WorkCell};
use crate::config::{BeltCfg, InputCfg, ProcessCfg, ValvePolarity};
use crate::error::{BuildError, Result};
use crate::inputs::{InputBank, InputPins};
use crate::mocks::NullOutput;
use crate::motion::{ConveyorPins, Kinematics, MotionUnit};
use crate::util::as_micros_u64;

type In = Box<dyn DigitalInput>;
type Out = Box<dyn DigitalOutput>;

#[derive(Default)]
pub struct WorkCellBuilder {
    start_button: Option<In>,
    stop_button: Option<In>,
    paint_sensor: Option<In>,
    cap_sensor: Option<In>,
    aux_valve: Option<Out>,
    paint_piston: Option<Out>,
    screw_valve: Option<Out>,
    close_valve: Option<Out>,
    conveyor_step: Option<Out>,
    conveyor_dir: Option<Out>,
    conveyor_enable: Option<Out>,
    conveyor_signal: Option<Out>,
    machine_active: Option<Out>,
    led_running: Option<Out>,
    led_idle: Option<Out>,
    inputs: Option<InputCfg>,
    valves: Option<ValvePolarity>,
    process: Option<ProcessCfg>,
    belt: Option<BeltCfg>,
}

impl BoxedWorkCell {
    /// Start building a work-cell.
    pub fn builder() -> WorkCellBuilder {
        WorkCellBuilder::default()
    }
}

macro_rules! input_setters {
    ($($method:ident => $field:ident),* $(,)?) => {
        $(
            pub fn $method(mut self, pin: impl DigitalInput + 'static) -> Self {
                self.$field = Some(Box::new(pin));
                self
            }
        )*
    };
}

macro_rules! output_setters {
    ($($method:ident => $field:ident),* $(,)?) => {
        $(
            pub fn $method(mut self, pin: impl DigitalOutput + 'static) -> Self {
                self.$field = Some(Box::new(pin));
                self
            }
        )*
    };
}

impl WorkCellBuilder {
    input_setters! {
        with_start_button => start_button,
        with_stop_button => stop_button,
        with_paint_sensor => paint_sensor,
        with_cap_sensor => cap_sensor,
    }

    output_setters! {
        with_aux_valve => aux_valve,
        with_paint_piston => paint_piston,
        with_screw_valve => screw_valve,
        with_close_valve => close_valve,
        with_conveyor_step => conveyor_step,
        with_conveyor_dir => conveyor_dir,
        with_conveyor_enable => conveyor_enable,
        with_conveyor_signal => conveyor_signal,
        with_machine_active => machine_active,
        with_led_running => led_running,
        with_led_idle => led_idle,
    }

    pub fn with_inputs(mut self, cfg: InputCfg) -> Self {
        self.inputs = Some(cfg);
        self
    }

    pub fn with_valves(mut self, polarity: ValvePolarity) -> Self {
        self.valves = Some(polarity);
        self
    }

    pub fn with_process(mut self, cfg: ProcessCfg) -> Self {
        self.process = Some(cfg);
        self
    }

    pub fn with_belt(mut self, cfg: BeltCfg) -> Self {
        self.belt = Some(cfg);
        self
    }

    /// Take every tunable from a loaded config file.
    pub fn apply_config(self, cfg: &jarline_config::Config) -> Self {
        self.with_inputs(InputCfg::from(&cfg.inputs))
            .with_valves(ValvePolarity::from(&cfg.valves))
            .with_process(ProcessCfg::from(cfg))
            .with_belt(BeltCfg::from(&cfg.belt))
    }

    /// Validate and construct. Drives every output to its safe level.
    pub fn try_build(self) -> Result<BoxedWorkCell> {
        let inputs_cfg = self.inputs.unwrap_or_default();
        let polarity = self.valves.unwrap_or_default();
        let process = self.process.unwrap_or_default();
        let belt = self.belt.unwrap_or_default();
        validate(&inputs_cfg, &process, &belt)?;

        let pins = InputPins {
            start_button: self
                .start_button
                .ok_or(BuildError::MissingInput("start_button"))?,
            stop_button: self
                .stop_button
                .ok_or(BuildError::MissingInput("stop_button"))?,
            paint_sensor: self
                .paint_sensor
                .ok_or(BuildError::MissingInput("paint_sensor"))?,
            cap_sensor: self
                .cap_sensor
                .ok_or(BuildError::MissingInput("cap_sensor"))?,
        };

        let aux = self.aux_valve.ok_or(BuildError::MissingOutput("aux_valve"))?;
        let piston = self
            .paint_piston
            .ok_or(BuildError::MissingOutput("paint_piston"))?;
        let screw = self
            .screw_valve
            .ok_or(BuildError::MissingOutput("screw_valve"))?;
        let close = self
            .close_valve
            .ok_or(BuildError::MissingOutput("close_valve"))?;
        let conveyor = ConveyorPins {
            step: self
                .conveyor_step
                .ok_or(BuildError::MissingOutput("conveyor_step"))?,
            dir: self
                .conveyor_dir
                .ok_or(BuildError::MissingOutput("conveyor_dir"))?,
            enable: self
                .conveyor_enable
                .ok_or(BuildError::MissingOutput("conveyor_enable"))?,
            moving_signal: self.conveyor_signal,
        };

        let valves = Valves {
            aux: TimedActuator::new("aux_valve", aux, polarity.aux_inverted),
            paint_piston: TimedActuator::new("paint_piston", piston, polarity.paint_piston_inverted),
            screw: TimedActuator::new("screw_valve", screw, polarity.screw_inverted),
            close: TimedActuator::new("close_valve", close, polarity.close_inverted),
        };
        let lines = StatusLines {
            machine_active: self.machine_active.unwrap_or_else(null_output),
            led_running: self.led_running.unwrap_or_else(null_output),
            led_idle: self.led_idle.unwrap_or_else(null_output),
        };

        let kin = Kinematics::from_belt(&belt);
        tracing::debug!(
            steps_per_mm = kin.steps_per_mm(),
            step_interval_us = as_micros_u64(kin.step_interval()),
            "belt kinematics"
        );
        let motion = MotionUnit::new(kin, conveyor, &belt);
        let inputs = InputBank::new(pins, inputs_cfg);
        Ok(WorkCell::assemble(inputs, motion, valves, lines, process))
    }
}

fn null_output() -> Out {
    Box::new(NullOutput)
}

fn validate(inputs: &InputCfg, process: &ProcessCfg, belt: &BeltCfg) -> Result<()> {
    if inputs.debounce.is_zero() {
        return Err(BuildError::InvalidConfig("debounce must be > 0").into());
    }
    if inputs.poll.is_zero() {
        return Err(BuildError::InvalidConfig("poll interval must be > 0").into());
    }
    if process.batch_size == 0 {
        return Err(BuildError::InvalidConfig("batch_size must be >= 1").into());
    }
    if !process.centering_mm.is_finite() || process.centering_mm < 0.0 {
        return Err(BuildError::InvalidConfig("centering_mm must be finite and >= 0").into());
    }
    if !(belt.pitch_mm.is_finite() && belt.pitch_mm > 0.0)
        || !(belt.speed_mm_per_s.is_finite() && belt.speed_mm_per_s > 0.0)
        || belt.pulley_teeth == 0
        || belt.microsteps == 0
        || belt.motor_steps_per_rev == 0
    {
        return Err(BuildError::InvalidConfig("belt geometry must be positive").into());
    }
    let kin = Kinematics::from_belt(belt);
    if belt.pulse_width.is_zero() || belt.pulse_width >= kin.step_interval() {
        return Err(
            BuildError::InvalidConfig("pulse width must be > 0 and shorter than the step interval")
                .into(),
        );
    }
    Ok(())
}
