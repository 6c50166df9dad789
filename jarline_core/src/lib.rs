#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Coordination core for the jar line work-cell (hardware-agnostic).
//!
//! All hardware interactions go through `jarline_traits::DigitalInput` and
//! `jarline_traits::DigitalOutput`. Nothing here blocks; the cell advances
//! one cooperative `tick` at a time against a caller-supplied `Instant`.
//!
//! ## Architecture
//!
//! - **Inputs**: polled, time-debounced buttons and jar sensors (`debounce`, `inputs`)
//! - **Actuators**: valves with one scheduled switch each (`actuator`)
//! - **Motion**: stepper pulse generation, stop and creep-to-stop (`motion`)
//! - **Stations**: paint-fill and cap-close sequences (`process`)
//! - **Arbitration**: belt run/stop from both station states (`arbiter`)
//! - **Supervision**: Stopped/Running/Paused with timer shifting on resume (`supervisor`)

pub mod actuator;
pub mod arbiter;
pub mod builder;
pub mod cell;
pub mod config;
pub mod conversions;
pub mod debounce;
pub mod error;
pub mod hw_error;
pub mod inputs;
pub mod mocks;
pub mod motion;
pub mod process;
pub mod runner;
pub mod status;
pub mod supervisor;
pub mod util;

pub use actuator::{PendingAction, TimedActuator};
pub use builder::WorkCellBuilder;
pub use cell::{BoxedWorkCell, WorkCell};
pub use config::{BeltCfg, ButtonCfg, ButtonMode, InputCfg, ProcessCfg, ValvePolarity};
pub use error::{BuildError, CellError, Result};
pub use motion::Kinematics;
pub use process::{CapState, PaintState};
pub use runner::{RunParams, RunStats, StopReason};
pub use status::CellStatus;
pub use supervisor::{Command, MachineState, Transition};
