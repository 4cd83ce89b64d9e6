//! Eisenstein CLI binary.
//!
//! This binary provides command-line access to the storyboard pipeline:
//! - Correct, extract, validate and sanitize model output
//! - Replay a scripted director conversation offline

use clap::Parser;
use eisenstein::{ObservabilityConfig, init_observability};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{
        Cli, Commands, correct, direct, extract, load_config, read_input, sanitize, validate,
    };

    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    init_observability(
        &ObservabilityConfig::default()
            .with_log_level(log_level.to_string())
            .with_json_logs(cli.json_logs),
    )?;

    let config = load_config(cli.config.as_deref())?;

    // Execute the requested command
    let output = match cli.command {
        Commands::Correct { input } => correct(&read_input(&input)?, &config)?,
        Commands::Extract { input, metrics } => extract(&read_input(&input)?, &config, metrics)?,
        Commands::Validate { input } => validate(&read_input(&input)?, &config)?,
        Commands::Sanitize { input } => sanitize(&read_input(&input)?, &config)?,
        Commands::Direct { script, task } => direct(&script, &task, &config).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
