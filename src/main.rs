use anyhow::{Context, Result};
use cli::Cli;
use compiler::Compiler;
use document::MintedDocument;
use pipeline::Pipeline;
use std::process::ExitCode;

mod cli;
mod compiler;
mod config;
mod document;
mod error;
mod output;
mod pipeline;
mod sandbox;
mod staging;

fn main() -> ExitCode {
    use clap::Parser;
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    if let Err(e) = try_main(&cli) {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::from(error::exit_code_of(&e))
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main(cli: &Cli) -> Result<()> {
    let configuration = cli.configuration()?;
    if cli.print_config {
        print!("{}", configuration.to_toml()?);
        return Ok(());
    }

    let config = cli.build_config(configuration)?;
    config.first_input()?;
    let origin = std::env::current_dir()
        .with_context(|| "Failed to determine the current directory")?;
    staging::check_inputs(&origin, &config.inputs)?;
    log::debug!("{config:?}");

    let compiler = Compiler::locate(&config.compiler, config.quiet)?;
    let stdout = std::io::stdout().lock();
    let target = Pipeline::new(&MintedDocument, &compiler)
        .run(&config, stdout)
        .with_context(|| "Failed to render PDF")?;
    log::debug!("Finished writing to {target}");

    Ok(())
}
