#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod cli;
mod commands;
mod error_fmt;
mod hw;
mod logging;

use clap::Parser;
use tumbler_core::DissociationError;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::commands::Ctx;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    // Only the panic/report hooks; errors are rendered by error_fmt.
    let _ = color_eyre::install();

    if let Err(e) = real_main(cli) {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            println!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        tracing::error!(error = %format!("{e:#}"), "command failed");
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = tumbler_config::load_file(&cli.config)
        .map_err(|e| eyre::Report::new(DissociationError::Config(format!("{e:#}"))))?;

    let level = cli
        .log_level
        .clone()
        .or_else(|| cfg.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());
    logging::init(cli.json, &level, &cfg.logging)?;

    for w in cfg.warnings() {
        tracing::warn!("{w}");
    }
    tracing::info!(
        config = %cli.config.display(),
        backend = hw::backend_name(&cfg.motion),
        "tumbler starting"
    );

    let ctx = Ctx {
        cfg,
        json: cli.json,
        clock: hw::make_clock(),
    };

    match cli.cmd {
        Commands::Run {
            output,
            max_samples,
        } => commands::run(&ctx, output, max_samples),
        Commands::SelfTest { rotations } => commands::self_test(&ctx, rotations),
        Commands::Load => commands::load(&ctx),
        Commands::Eject => commands::eject(&ctx),
        Commands::Manual { output } => commands::manual(&ctx, &output),
        Commands::Measure { output } => commands::measure(&ctx, &output),
        Commands::SelfCheck => commands::self_check(&ctx),
    }
}
