#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! jarline CLI: load config, set up logging, then run, simulate or self-check the cell.

mod backend;
mod cli;
mod error_fmt;
mod logging;
mod rt;
mod run;

use clap::Parser;
use jarline_core::error::CellError;
use jarline_core::util::as_micros_u64;
use jarline_core::{BeltCfg, Kinematics};

use crate::cli::{Cli, Commands, JSON_MODE, RtLock};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::run::{RunOpts, SimOpts};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        tracing::error!(error = %format!("{e:#}"), "exiting with error");
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = jarline_config::load_path(&cli.config)
        .map_err(|e| eyre::Report::new(CellError::Config(format!("{e:#}"))))?;
    logging::init(&cli.log_level, cli.json, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run {
            duration_s,
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
            stats,
        } => {
            rt::setup_rt_once(
                rt,
                rt_prio,
                rt_lock.unwrap_or_else(RtLock::os_default),
                rt_cpu,
            );
            run::run_cell(
                &cfg,
                &RunOpts {
                    duration_s,
                    stats,
                    json: cli.json,
                },
            )
        }
        Commands::Simulate {
            seconds,
            batches,
            pause_at_s,
            pause_for_s,
            stats,
        } => run::simulate(
            &cfg,
            &SimOpts {
                seconds,
                batches,
                pause: pause_at_s.zip(pause_for_s),
                stats,
                json: cli.json,
            },
        ),
        Commands::SelfCheck => self_check(&cfg, cli.json),
    }
}

fn self_check(cfg: &jarline_config::Config, json: bool) -> eyre::Result<()> {
    let belt = BeltCfg::from(&cfg.belt);
    let kin = Kinematics::from_belt(&belt);
    let centering = kin.pulses_for(cfg.belt.centering_mm);

    // Building the cell runs the same validation the controller applies at start-up.
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    let backend = {
        let mut cell = backend::hardware_cell(cfg)?;
        cell.shutdown();
        "gpio"
    };
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    let backend = {
        backend::sim_bench(cfg, 1)?;
        "sim"
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "backend": backend,
                "steps_per_mm": kin.steps_per_mm(),
                "step_interval_us": as_micros_u64(kin.step_interval()),
                "centering_pulses": centering,
                "batch_size": cfg.batch.size,
            })
        );
    } else {
        println!("backend: {backend}");
        println!("steps/mm: {:.3}", kin.steps_per_mm());
        println!("step interval: {} us", kin.step_interval().as_micros());
        println!(
            "centering: {} mm = {centering} pulses",
            cfg.belt.centering_mm
        );
        println!("self-check ok");
    }
    Ok(())
}
