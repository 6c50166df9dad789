//! The work-cell aggregate and its control tick.
//!
//! One `tick` runs, in order: input sampling, actuator deadlines, the pulse
//! generator, button commands, the two stations and the belt arbiter, then
//! the status lines. Actuator deadlines are frozen while paused so that a
//! resumed cycle finishes with its remaining time intact.

use std::time::Instant;

use jarline_traits::{DigitalInput, DigitalOutput};

use crate::actuator::TimedActuator;
use crate::arbiter::{MotionCommand, arbitrate};
use crate::config::ProcessCfg;
use crate::error::Result;
use crate::inputs::InputBank;
use crate::motion::{MotionUnit, write_pin};
use crate::process::{CapClose, CapStation, PaintFill, PaintStation};
use crate::status::CellStatus;
use crate::supervisor::{Command, MachineState, Supervisor, Transition};
use crate::util::as_millis_u64;

/// The four process valves.
pub struct Valves<O: DigitalOutput> {
    pub aux: TimedActuator<O>,
    pub paint_piston: TimedActuator<O>,
    pub screw: TimedActuator<O>,
    pub close: TimedActuator<O>,
}

impl<O: DigitalOutput> Valves<O> {
    fn tick(&mut self, now: Instant) {
        self.aux.tick(now);
        self.paint_piston.tick(now);
        self.screw.tick(now);
        self.close.tick(now);
    }

    fn shift(&mut self, delta: std::time::Duration) {
        self.aux.shift(delta);
        self.paint_piston.shift(delta);
        self.screw.shift(delta);
        self.close.shift(delta);
    }

    fn all_off(&mut self) {
        self.aux.set_off();
        self.paint_piston.set_off();
        self.screw.set_off();
        self.close.set_off();
    }
}

/// Machine status lines for the operator and the downstream controller.
pub struct StatusLines<O> {
    pub machine_active: O,
    pub led_running: O,
    pub led_idle: O,
}

pub struct WorkCell<I: DigitalInput, O: DigitalOutput> {
    pub(crate) inputs: InputBank<I>,
    pub(crate) motion: MotionUnit<O>,
    pub(crate) valves: Valves<O>,
    pub(crate) lines: StatusLines<O>,
    pub(crate) process_cfg: ProcessCfg,
    paint: PaintFill,
    cap: CapClose,
    supervisor: Supervisor,
    suspended_creep: Option<u32>,
    shown: Option<MachineState>,
    ticks: u64,
}

/// The cell as built from configuration, with boxed pins.
pub type BoxedWorkCell = WorkCell<Box<dyn DigitalInput>, Box<dyn DigitalOutput>>;

impl<I: DigitalInput, O: DigitalOutput> core::fmt::Debug for WorkCell<I, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkCell")
            .field("machine", &self.supervisor.state())
            .field("paint", &self.paint.state())
            .field("cap", &self.cap.state())
            .field("motion", &self.motion)
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl<I: DigitalInput, O: DigitalOutput> WorkCell<I, O> {
    pub(crate) fn assemble(
        inputs: InputBank<I>,
        motion: MotionUnit<O>,
        valves: Valves<O>,
        lines: StatusLines<O>,
        process_cfg: ProcessCfg,
    ) -> Self {
        let mut cell = Self {
            inputs,
            motion,
            valves,
            lines,
            process_cfg,
            paint: PaintFill::new(),
            cap: CapClose::new(),
            supervisor: Supervisor::new(),
            suspended_creep: None,
            shown: None,
            ticks: 0,
        };
        cell.show_state();
        cell
    }

    /// One control iteration. Input read failures are returned; the caller
    /// should `shutdown` the cell.
    pub fn tick(&mut self, now: Instant) -> Result<CellStatus> {
        self.ticks += 1;
        self.inputs.refresh(now)?;

        if self.supervisor.state() != MachineState::Paused {
            self.valves.tick(now);
        }
        self.motion.tick(now);

        let mut transition = None;
        if self.inputs.take_start() {
            transition = self.command(Command::Start, now).or(transition);
        }
        if self.inputs.take_stop() {
            transition = self.command(Command::Stop, now).or(transition);
        }

        if self.supervisor.state() == MachineState::Running {
            self.step_processes(now);
            self.arbitrate();
        }

        self.show_state();
        Ok(self.status_with(transition))
    }

    /// Apply a supervisor command directly, as if its button had been pressed.
    pub fn command(&mut self, cmd: Command, now: Instant) -> Option<Transition> {
        let t = self.supervisor.handle(cmd, now)?;
        match t {
            Transition::Launch => {
                self.paint.reset();
                self.cap.reset();
                self.suspended_creep = None;
                self.motion.start();
                self.valves.aux.on_for(self.process_cfg.aux_pulse, now);
            }
            Transition::Pause => {
                self.suspended_creep = self.motion.suspend();
                tracing::info!(creep_owed = ?self.suspended_creep, "paused");
            }
            Transition::Resume { paused_for } => {
                self.valves.shift(paused_for);
                self.paint.shift(paused_for);
                self.cap.shift(paused_for);
                if let Some(pulses) = self.suspended_creep.take() {
                    self.motion.creep_pulses(pulses);
                }
                tracing::info!(paused_ms = as_millis_u64(paused_for), "resumed");
            }
            Transition::Halt => self.safe_state(),
        }
        self.show_state();
        Some(t)
    }

    /// Force the cell to Stopped with the belt halted and every valve off.
    pub fn shutdown(&mut self) {
        self.supervisor.force_stop();
        self.safe_state();
        self.show_state();
        tracing::info!("cell shut down");
    }

    pub fn state(&self) -> MachineState {
        self.supervisor.state()
    }

    pub fn paint(&self) -> &PaintFill {
        &self.paint
    }

    pub fn cap(&self) -> &CapClose {
        &self.cap
    }

    pub fn motion(&self) -> &MotionUnit<O> {
        &self.motion
    }

    pub fn valves(&self) -> &Valves<O> {
        &self.valves
    }

    pub fn inputs(&self) -> &InputBank<I> {
        &self.inputs
    }

    pub fn process_cfg(&self) -> &ProcessCfg {
        &self.process_cfg
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn status(&self) -> CellStatus {
        self.status_with(None)
    }

    fn status_with(&self, transition: Option<Transition>) -> CellStatus {
        CellStatus {
            machine: self.supervisor.state(),
            paint: self.paint.state(),
            cap: self.cap.state(),
            paint_ignore: self.paint.ignore_count(),
            cap_ignore: self.cap.ignore_count(),
            conveyor_running: self.motion.is_running(),
            creeping: self.motion.is_creeping(),
            paint_cycles: self.paint.cycles(),
            cap_cycles: self.cap.cycles(),
            transition,
        }
    }

    fn step_processes(&mut self, now: Instant) {
        let cfg = &self.process_cfg;
        self.paint.step(
            PaintStation {
                sensor: &mut self.inputs.paint,
                motion: &mut self.motion,
                piston: &mut self.valves.paint_piston,
                aux: &mut self.valves.aux,
            },
            cfg,
            now,
        );
        self.cap.step(
            CapStation {
                sensor: &mut self.inputs.cap,
                motion: &mut self.motion,
                screw: &mut self.valves.screw,
                close: &mut self.valves.close,
            },
            cfg,
            now,
        );
    }

    fn arbitrate(&mut self) {
        let cmd = arbitrate(
            self.paint.state(),
            self.cap.state(),
            self.motion.is_running(),
            self.motion.is_creeping(),
        );
        match cmd {
            Some(MotionCommand::Start) => self.motion.start(),
            Some(MotionCommand::Stop) => self.motion.stop(),
            None => {}
        }
    }

    fn safe_state(&mut self) {
        self.motion.stop();
        self.valves.all_off();
        self.paint.reset();
        self.cap.reset();
        self.suspended_creep = None;
    }

    fn show_state(&mut self) {
        let state = self.supervisor.state();
        if self.shown == Some(state) {
            return;
        }
        self.shown = Some(state);
        let running = state == MachineState::Running;
        write_pin(&mut self.lines.machine_active, running, "machine_active");
        write_pin(&mut self.lines.led_running, running, "led_running");
        write_pin(&mut self.lines.led_idle, !running, "led_idle");
    }
}
