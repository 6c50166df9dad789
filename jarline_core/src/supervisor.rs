//! Machine-level run state driven by the start and stop buttons.
//!
//! Stop is two-stage: the first press pauses, a second press stops.
//! Start launches a stopped machine or resumes a paused one.

use std::time::{Duration, Instant};

use crate::util::elapsed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineState {
    Stopped,
    Running,
    Paused,
}

impl MachineState {
    pub const ALL: [Self; 3] = [Self::Stopped, Self::Running, Self::Paused];

    /// Next state for a command; `None` when the command is ignored here.
    pub fn next(self, cmd: Command) -> Option<Self> {
        use Command::*;
        use MachineState::*;

        match (self, cmd) {
            (Stopped, Start) => Some(Running),
            (Paused, Start) => Some(Running),
            (Running, Stop) => Some(Paused),
            (Paused, Stop) => Some(Stopped),
            (Running, Start) | (Stopped, Stop) => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
}

/// Side effect the cell must carry out for an accepted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Stopped -> Running: fresh start.
    Launch,
    /// Running -> Paused.
    Pause,
    /// Paused -> Running; timers move later by `paused_for`.
    Resume { paused_for: Duration },
    /// Paused -> Stopped.
    Halt,
}

#[derive(Debug, Clone)]
pub struct Supervisor {
    state: MachineState,
    paused_at: Option<Instant>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            state: MachineState::Stopped,
            paused_at: None,
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    /// When the current pause began.
    pub fn paused_at(&self) -> Option<Instant> {
        self.paused_at
    }

    /// Apply a command. Returns the transition taken, if any.
    pub fn handle(&mut self, cmd: Command, now: Instant) -> Option<Transition> {
        let next = self.state.next(cmd)?;
        let t = match (self.state, next) {
            (MachineState::Stopped, MachineState::Running) => Transition::Launch,
            (MachineState::Running, MachineState::Paused) => {
                self.paused_at = Some(now);
                Transition::Pause
            }
            (MachineState::Paused, MachineState::Running) => Transition::Resume {
                paused_for: self
                    .paused_at
                    .take()
                    .map_or(Duration::ZERO, |t| elapsed(now, t)),
            },
            (MachineState::Paused, MachineState::Stopped) => {
                self.paused_at = None;
                Transition::Halt
            }
            (from, to) => {
                tracing::error!(?from, ?to, "unexpected supervisor transition");
                return None;
            }
        };
        tracing::info!(from = self.state.as_str(), to = next.as_str(), "machine state");
        self.state = next;
        Some(t)
    }

    /// Drop to Stopped regardless of the current state.
    pub fn force_stop(&mut self) {
        self.state = MachineState::Stopped;
        self.paused_at = None;
    }
}
