use crate::cli::OutputFormat;
use crate::config::AppConfig;

/// Print the effective configuration. The database URL is never serialized.
pub fn show(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string(config)?),
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}
