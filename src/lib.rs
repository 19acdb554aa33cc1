pub mod cli;
pub mod core;
pub mod providers;

use anyhow::Result;
use tracing::{debug, info};

use crate::core::config::AppConfig;
use crate::core::conversion::Converter;
use crate::providers::ExchangeRateApiProvider;

pub enum AppCommand {
    Convert {
        amount: String,
        from: Option<String>,
        to: Option<String>,
    },
    Rates {
        base: Option<String>,
    },
    Form,
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxconv starting...");

    let config = load_config(config_path)?;
    let provider = ExchangeRateApiProvider::from_config(&config.provider)?;
    let converter = Converter::new(provider);
    let defaults = &config.defaults;

    match command {
        AppCommand::Convert { amount, from, to } => {
            let from = from.unwrap_or_else(|| defaults.source.to_string());
            let to = to.unwrap_or_else(|| defaults.target.to_string());
            cli::convert::run(&converter, &amount, &from, &to).await?;
        }
        AppCommand::Rates { base } => {
            let base = base.unwrap_or_else(|| defaults.source.to_string());
            cli::rates::run(&converter, &base).await?;
        }
        AppCommand::Form => {
            let stdin = std::io::stdin();
            cli::form::run(&converter, defaults, stdin.lock(), std::io::stdout()).await?;
        }
    }
    Ok(())
}
