use anyhow::Result;
use clap::Parser;
use fb_core::config::LinkConfig;

pub mod acquire;
pub mod cli;
pub mod output;
pub mod simulate;
pub mod transport;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config
    let config = resolve_config(&cli)?;

    // 4. Exécuter la commande
    match cli.command {
        cli::Command::Read(ref args) => acquire::run_read(args, config),
        cli::Command::Simulate(ref args) => simulate::run_simulate(args, &config),
    }
}

/// Load `--config`, falling back to defaults when the file is absent.
fn resolve_config(cli: &cli::Cli) -> Result<LinkConfig> {
    if cli.config.exists() {
        fb_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(LinkConfig::default())
    }
}
