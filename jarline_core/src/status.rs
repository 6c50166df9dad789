//! Snapshot of the cell returned from each control tick.

use crate::process::{CapState, PaintState};
use crate::supervisor::{MachineState, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStatus {
    pub machine: MachineState,
    pub paint: PaintState,
    pub cap: CapState,
    pub paint_ignore: u32,
    pub cap_ignore: u32,
    pub conveyor_running: bool,
    pub creeping: bool,
    pub paint_cycles: u64,
    pub cap_cycles: u64,
    /// Last supervisor transition taken during this tick.
    pub transition: Option<Transition>,
}
