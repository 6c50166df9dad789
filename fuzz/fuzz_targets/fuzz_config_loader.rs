#![no_main]
use jarline_core::{BeltCfg, Kinematics};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    let Ok(cfg) = jarline_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        let kin = Kinematics::from_belt(&BeltCfg::from(&cfg.belt));
        let _ = kin.pulses_for(cfg.belt.centering_mm);
        let _ = kin.step_interval();
    }
});
