#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = tumbler_config::load_toml(data) {
        if cfg.validate().is_ok() {
            let _ = cfg.warnings();
            let _ = tumbler_core::CycleCfg::from(&cfg.timing);
            let _ = tumbler_core::MotionCfg::from(&cfg.motion);
        }
    }
});
