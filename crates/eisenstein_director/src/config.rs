//! Director settings and layered workspace configuration.
//!
//! Sources, later overriding earlier:
//! 1. Bundled defaults (`eisenstein.toml` shipped with the library)
//! 2. `~/.config/eisenstein/eisenstein.toml`
//! 3. `./eisenstein.toml`

use config::{Config, File, FileFormat};
use eisenstein_error::{ConfigError, DirectorError, DirectorErrorKind, EisensteinResult};
use eisenstein_extract::{CorrectorConfig, ValidatorConfig};
use eisenstein_fallback::FallbackConfig;
use eisenstein_security::SanitizerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../../../eisenstein.toml");

/// Orchestration loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct DirectorConfig {
    /// Model rounds plus evaluate-without-result passes allowed per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Critique score in `[0, 1]` at which a storyboard is accepted
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,

    /// System persona sent ahead of the task
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Tools whose output is a storyboard
    #[serde(default = "default_storyboard_tools")]
    pub storyboard_tools: Vec<String>,

    /// Tools whose output is a quality critique
    #[serde(default = "default_critique_tools")]
    pub critique_tools: Vec<String>,

    /// Sent when no storyboard exists after a model turn without tool calls
    #[serde(default = "default_missing_storyboard_prompt")]
    pub missing_storyboard_prompt: String,

    /// Sent when the storyboard scored below threshold; `{score}` and
    /// `{threshold}` are substituted
    #[serde(default = "default_refinement_prompt")]
    pub refinement_prompt: String,
}

fn default_max_iterations() -> u32 {
    8
}

fn default_quality_threshold() -> f64 {
    0.75
}

fn default_persona() -> String {
    "You are a film director planning a visual storyboard. Use the storyboard tool to \
     draft scenes, the critique tool to judge them, and answer without tool calls when \
     the storyboard is final."
        .to_string()
}

fn default_storyboard_tools() -> Vec<String> {
    vec![
        "generate_storyboard".to_string(),
        "create_storyboard".to_string(),
        "refine_storyboard".to_string(),
    ]
}

fn default_critique_tools() -> Vec<String> {
    vec![
        "critique_storyboard".to_string(),
        "evaluate_storyboard".to_string(),
    ]
}

fn default_missing_storyboard_prompt() -> String {
    "No usable storyboard has been produced yet. Call a storyboard tool.".to_string()
}

fn default_refinement_prompt() -> String {
    "The storyboard scored {score}, below the target of {threshold}. Revise it with the \
     storyboard tool, then critique it again."
        .to_string()
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            quality_threshold: default_quality_threshold(),
            persona: default_persona(),
            storyboard_tools: default_storyboard_tools(),
            critique_tools: default_critique_tools(),
            missing_storyboard_prompt: default_missing_storyboard_prompt(),
            refinement_prompt: default_refinement_prompt(),
        }
    }
}

impl DirectorConfig {
    /// Reject budgets and thresholds the loop cannot run with.
    pub fn validate(&self) -> EisensteinResult<()> {
        if self.max_iterations == 0 {
            return Err(DirectorError::new(DirectorErrorKind::InvalidConfiguration(
                "max_iterations must be at least 1".to_string(),
            ))
            .into());
        }
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(DirectorError::new(DirectorErrorKind::InvalidConfiguration(format!(
                "quality_threshold must lie in [0, 1], got {}",
                self.quality_threshold
            )))
            .into());
        }
        Ok(())
    }

    /// True when the named tool produces storyboards.
    pub fn is_storyboard_tool(&self, name: &str) -> bool {
        self.storyboard_tools.iter().any(|t| t.eq_ignore_ascii_case(name))
    }

    /// True when the named tool produces critiques.
    pub fn is_critique_tool(&self, name: &str) -> bool {
        self.critique_tools.iter().any(|t| t.eq_ignore_ascii_case(name))
    }

    /// Refinement request for a storyboard scoring `score`.
    pub fn refinement_message(&self, score: f64) -> String {
        self.refinement_prompt
            .replace("{score}", &format!("{score:.2}"))
            .replace("{threshold}", &format!("{:.2}", self.quality_threshold))
    }
}

/// Configuration for every stage of the pipeline.
///
/// # Example
///
/// ```no_run
/// use eisenstein_director::EisensteinConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = EisensteinConfig::load()?;
/// println!("Budget: {}", config.director.max_iterations);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EisensteinConfig {
    /// Orchestration loop
    #[serde(default)]
    pub director: DirectorConfig,
    /// Format corrector
    #[serde(default)]
    pub corrector: CorrectorConfig,
    /// Storyboard validator
    #[serde(default)]
    pub validator: ValidatorConfig,
    /// Content sanitizer
    #[serde(default)]
    pub sanitizer: SanitizerConfig,
    /// Fallback miner
    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl EisensteinConfig {
    /// Load configuration from one file, with built-in defaults for anything it omits.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> EisensteinResult<Self> {
        let path = path.as_ref();
        let config = Config::builder()
            .add_source(File::from(path))
            .build()
            .map_err(|e| {
                ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.display(),
                    e
                ))
            })?
            .try_deserialize::<Self>()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        config.director.validate()?;
        Ok(config)
    }

    /// Load bundled defaults overlaid with the optional user files.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be parsed or the result is unusable.
    pub fn load() -> EisensteinResult<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/eisenstein/eisenstein.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("eisenstein").required(false));

        let config = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize::<Self>()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        config.director.validate()?;
        tracing::debug!(
            max_iterations = config.director.max_iterations,
            quality_threshold = config.director.quality_threshold,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse the bundled defaults alone.
    pub fn bundled() -> EisensteinResult<Self> {
        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)).into())
    }
}
