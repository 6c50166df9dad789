//! Human-readable error descriptions and structured JSON error formatting.

use jarline_core::error::{BuildError, CellError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingInput(name) => format!(
                "What happened: Input '{name}' was not wired into the cell.\nLikely causes: The backend did not claim this pin.\nHow to fix: Check [pins].{name} in the config and the hardware backend."
            ),
            BuildError::MissingOutput(name) => format!(
                "What happened: Output '{name}' was not wired into the cell.\nLikely causes: The backend did not claim this pin.\nHow to fix: Check [pins].{name} in the config and the hardware backend."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun `jarline self-check`."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<CellError>() {
        return match ce {
            CellError::HardwareFault(_) | CellError::Hardware(_) => format!(
                "What happened: {err}.\nLikely causes: Wiring fault, missing GPIO permissions, or a pin claimed by another process.\nHow to fix: Check the wiring and [pins], then restart. The cell was stopped with all valves off."
            ),
            CellError::Config(msg) => format!(
                "What happened: Configuration could not be loaded.\nDetails: {msg}\nHow to fix: Fix the TOML (see etc/jarline.toml for a complete example) and rerun."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open gpio") || lower.contains("input pin") || lower.contains("output pin") {
        return "What happened: Failed to initialize GPIO pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process can access /dev/gpiomem.".to_string();
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes; anything unclassified returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(ce) = err.downcast_ref::<CellError>() {
        return match ce {
            CellError::Config(_) => 3,
            CellError::Hardware(_) | CellError::HardwareFault(_) => 4,
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return 5;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(ce) = err.downcast_ref::<CellError>() {
        return match ce {
            CellError::Config(_) => "Config",
            CellError::Hardware(_) => "Hardware",
            CellError::HardwareFault(_) => "HardwareFault",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
