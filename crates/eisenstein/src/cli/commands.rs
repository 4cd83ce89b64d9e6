//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Eisenstein - turn LLM storyboard output into trusted scene prompts
#[derive(Parser, Debug)]
#[command(name = "eisenstein")]
#[command(about = "Turn LLM storyboard output into validated, sanitized scene prompts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file to use instead of the layered defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands. Every `<FILE>` may be `-` to read stdin.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply format corrections to model output and show what changed
    Correct {
        /// Model output file
        input: PathBuf,
    },

    /// Run the full pipeline: extract, validate, repair, sanitize, fall back
    Extract {
        /// Model output file
        input: PathBuf,

        /// Include extraction metrics in the output
        #[arg(long)]
        metrics: bool,
    },

    /// Validate a JSON storyboard and attempt repairs when it is invalid
    Validate {
        /// Storyboard JSON file
        input: PathBuf,
    },

    /// Sanitize JSON or plain text
    Sanitize {
        /// JSON or text file
        input: PathBuf,
    },

    /// Run the director loop against a scripted transcript
    Direct {
        /// TOML transcript of model turns and tool outputs
        #[arg(long)]
        script: PathBuf,

        /// Task given to the model
        #[arg(long)]
        task: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract_with_globals() {
        let cli = Cli::parse_from(["eisenstein", "extract", "-", "--metrics", "--verbose"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Extract { input, metrics } => {
                assert_eq!(input, PathBuf::from("-"));
                assert!(metrics);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_direct() {
        let cli = Cli::parse_from([
            "eisenstein",
            "--config",
            "custom.toml",
            "direct",
            "--script",
            "demos/rainy_city.toml",
            "--task",
            "A rainy city",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::Direct { ref task, .. } if task == "A rainy city"));
    }
}
