//! Human-readable error descriptions and structured JSON error formatting.

use tumbler_core::{BuildError, DissociationError};

/// First error of type `E` in the report, checking the top-level object and
/// then every cause.
fn find<E: std::error::Error + Send + Sync + 'static>(err: &eyre::Report) -> Option<&E> {
    err.downcast_ref::<E>()
        .or_else(|| err.chain().find_map(|c| c.downcast_ref::<E>()))
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::MissingActuator => {
                "What happened: No chamber actuator was provided to the controller.\nLikely causes: The servo or stepper failed to initialize or was not wired into the builder.\nHow to fix: Check the [motion] section and pass the actuator via with_actuator(...).".to_string()
            }
            BuildError::MissingLight => {
                "What happened: No lamp was provided to the controller.\nLikely causes: The lamp GPIO failed to initialize.\nHow to fix: Check light.pin in the config and pass the lamp via with_light(...).".to_string()
            }
            BuildError::MissingSensor => {
                "What happened: No light sensor was provided to the controller.\nLikely causes: The I2C sensor failed to initialize.\nHow to fix: Check sensor.i2c_bus and sensor.address and pass the sensor via with_sensor(...).".to_string()
            }
            BuildError::MissingRecorder => {
                "What happened: No data recorder was provided to the controller.\nLikely causes: The output path was not set.\nHow to fix: Pass --output or set output.datafile in the config.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the [timing] table.\nHow to fix: Edit the config file, then rerun. See etc/tumbler.toml for a sample."
            ),
        };
    }

    if let Some(de) = find::<DissociationError>(err) {
        return match de {
            DissociationError::Timeout => {
                "What happened: Light sensor read timed out.\nLikely causes: TSL2591 not wired correctly, wrong I2C bus or address, or no power.\nHow to fix: Verify SDA/SCL wiring and power, and check sensor.i2c_bus and sensor.address in the config.".to_string()
            }
            DissociationError::OutputExists(path) => format!(
                "What happened: Output file {} already exists.\nLikely causes: A previous measurement used the same name.\nHow to fix: Choose a new --output path or move the old file away.",
                path.display()
            ),
            DissociationError::Config(msg) => format!(
                "What happened: Configuration is invalid or incomplete.\nDetails: {msg}\nHow to fix: Edit the TOML config and try again. See etc/tumbler.toml for a sample."
            ),
            DissociationError::Hardware(msg) | DissociationError::HardwareFault(msg) => format!(
                "What happened: A hardware operation failed ({msg}).\nLikely causes: Incorrect pin numbers, loose wiring, or insufficient GPIO/I2C permissions.\nHow to fix: Check the [motion], [light] and [sensor] sections; ensure the process may access GPIO and I2C."
            ),
            DissociationError::Io(msg) => format!(
                "What happened: Could not write the data file ({msg}).\nLikely causes: Missing directory, full disk, or no write permission.\nHow to fix: Check the output path and its permissions."
            ),
        };
    }

    let msg = format!("{err:#}");
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 config, 3 output exists, 4 sensor timeout, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(BuildError::InvalidConfig(_)) = find::<BuildError>(err) {
        return 2;
    }
    match find::<DissociationError>(err) {
        Some(DissociationError::Config(_)) => 2,
        Some(DissociationError::OutputExists(_)) => 3,
        Some(DissociationError::Timeout) => 4,
        _ => 1,
    }
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::InvalidConfig(_) => "InvalidConfig",
            _ => "MissingCollaborator",
        };
    }
    match find::<DissociationError>(err) {
        Some(DissociationError::Timeout) => "Timeout",
        Some(DissociationError::OutputExists(_)) => "OutputExists",
        Some(DissociationError::Config(_)) => "InvalidConfig",
        Some(DissociationError::Hardware(_) | DissociationError::HardwareFault(_)) => "Hardware",
        Some(DissociationError::Io(_)) => "Io",
        None => "Error",
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    fn wrapped(e: DissociationError) -> eyre::Report {
        Err::<(), _>(eyre::Report::new(e))
            .wrap_err("sample light sensor")
            .unwrap_err()
    }

    #[test]
    fn timeout_maps_through_context() {
        let err = wrapped(DissociationError::Timeout);
        assert_eq!(exit_code_for_error(&err), 4);
        assert!(humanize(&err).contains("timed out"));
        assert_eq!(reason_name(&err), "Timeout");
    }

    #[test]
    fn config_and_output_codes() {
        assert_eq!(
            exit_code_for_error(&eyre::Report::new(DissociationError::Config("x".into()))),
            2
        );
        assert_eq!(
            exit_code_for_error(&eyre::Report::new(BuildError::InvalidConfig("y"))),
            2
        );
        assert_eq!(
            exit_code_for_error(&wrapped(DissociationError::OutputExists("a.csv".into()))),
            3
        );
        assert_eq!(exit_code_for_error(&eyre::eyre!("boom")), 1);
    }

    #[test]
    fn every_error_variant_has_a_specific_reason() {
        let cases = [
            (DissociationError::Hardware("x".into()), "Hardware"),
            (DissociationError::HardwareFault("x".into()), "Hardware"),
            (DissociationError::Config("x".into()), "InvalidConfig"),
            (DissociationError::Timeout, "Timeout"),
            (DissociationError::OutputExists("a.csv".into()), "OutputExists"),
            (DissociationError::Io("disk full".into()), "Io"),
        ];
        for (e, reason) in cases {
            let err = wrapped(e);
            assert_eq!(reason_name(&err), reason);
            assert!(!humanize(&err).starts_with("Something went wrong"));
        }
    }

    #[test]
    fn json_has_reason_and_message() {
        let err = wrapped(DissociationError::Hardware("jammed".into()));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Hardware");
        assert_eq!(v["exit_code"], 1);
        assert!(v["message"].as_str().unwrap().contains("jammed"));
    }
}
