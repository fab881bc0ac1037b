use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const CFG: &str = r#"
[motion]
backend = "stepper"
step_pin = 13
dir_pin = 19
flip_steps = 100
step_delay_us = 500

[light]
pin = 23
active_low = true

[sensor]
gain = "low"
integration_ms = 300

[timing]
tumble_s = 0.5
sample_s = 2.0
settle_s = 1.0
lamp_s = 0.5
end_forward = false

[output]
datafile = "unused.csv"
"#;

#[rstest]
#[case("measure")]
#[case("run")]
fn sensor_timeout_bubbles_to_cli(#[case] sub: &str) {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, CFG).unwrap();
    let out = dir.path().join("t.csv");

    let mut cmd = Command::cargo_bin("tumbler").unwrap();
    cmd.env("TUMBLER_SIM_FAST", "1")
        .env("TUMBLER_TEST_SIM_TIMEOUT", "1")
        .arg("--config")
        .arg(&cfg)
        .arg(sub)
        .arg("--output")
        .arg(&out);
    cmd.assert().code(4).stderr(predicate::str::contains(
        "What happened: Light sensor read timed out",
    ));
}
