//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "jarline", version, about = "Jar line work-cell controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/jarline.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty; also switches reports to JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

impl RtLock {
    #[inline]
    pub fn os_default() -> Self {
        if cfg!(target_os = "linux") {
            RtLock::Current
        } else {
            RtLock::None
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop (GPIO with --features hardware, simulated line otherwise)
    Run {
        /// Stop after this many seconds; runs until Ctrl-C when omitted
        #[arg(long, value_name = "SECS")]
        duration_s: Option<u64>,
        /// Enable real-time mode (SCHED_FIFO, affinity, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on supported OSes.\n\nLinux: attempts SCHED_FIFO priority, pins to one CPU and locks memory. Step pulse timing depends on loop latency, so this reduces jitter on the conveyor. May require CAP_SYS_NICE / CAP_IPC_LOCK or root.\n\nOther OSes: only memory locking is attempted."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO on Linux (1..=max)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Memory locking mode for --rt: none, current, or all
        #[arg(long, value_enum, value_name = "MODE")]
        rt_lock: Option<RtLock>,
        /// CPU index to pin the process to (Linux only, default 0)
        #[arg(long, value_name = "CPU")]
        rt_cpu: Option<usize>,
        /// Print control loop stats on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Run the cell against the simulated belt on a virtual clock
    Simulate {
        /// Virtual seconds to simulate
        #[arg(long, value_name = "SECS", default_value_t = 30.0)]
        seconds: f64,
        /// Batches of jars on the belt
        #[arg(long, value_name = "N", default_value_t = 2)]
        batches: u32,
        /// Press stop at this virtual time
        #[arg(long, value_name = "SECS", requires = "pause_for_s")]
        pause_at_s: Option<f64>,
        /// Press start again this long after the pause began
        #[arg(long, value_name = "SECS", requires = "pause_at_s")]
        pause_for_s: Option<f64>,
        /// Print control loop stats on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Validate the config and report derived belt kinematics
    SelfCheck,
}
