pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "critterbase")]
#[command(about = "Critterbase operator CLI - database and server management")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Check database connectivity")]
    Health,

    #[command(about = "Print the effective configuration (secrets omitted)")]
    Config,

    #[command(about = "Run the HTTP server")]
    Serve,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::config();

    match cli.command {
        Commands::Migrate => commands::database::migrate(config, output_format).await,
        Commands::Health => commands::database::health(config, output_format).await,
        Commands::Config => commands::config::show(config, output_format),
        Commands::Serve => commands::serve::run(config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands_and_global_flag() {
        let cli = Cli::try_parse_from(["critterbase", "health", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Health));
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));

        let cli = Cli::try_parse_from(["critterbase", "migrate"]).unwrap();
        assert!(matches!(cli.command, Commands::Migrate));
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Text));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["critterbase", "seed"]).is_err());
    }
}
