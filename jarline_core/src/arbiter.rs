//! Decides whether the conveyor should run, given both station states.
//!
//! The belt runs only when neither station needs it stopped. While a creep is
//! in progress the motion unit owns the belt and no command is issued.

use crate::process::{CapState, PaintState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionCommand {
    Start,
    Stop,
}

/// True when neither station needs the belt stopped.
pub fn conveyor_should_run(paint: PaintState, cap: CapState) -> bool {
    !(paint.requires_stop() || cap.requires_stop())
}

/// Command needed to bring the conveyor to the desired state, if any.
pub fn arbitrate(
    paint: PaintState,
    cap: CapState,
    running: bool,
    creeping: bool,
) -> Option<MotionCommand> {
    if creeping {
        return None;
    }
    match (conveyor_should_run(paint, cap), running) {
        (true, false) => Some(MotionCommand::Start),
        (false, true) => Some(MotionCommand::Stop),
        _ => None,
    }
}
