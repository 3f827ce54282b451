//! Configuration management for coursebrief.
//!
//! Configuration is layered, lowest precedence first:
//! - Built-in defaults
//! - YAML config file (`--config`, `<course>/.coursebrief.yaml`, or `./.coursebrief.yaml`)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-course / per-directory config file.
pub const CONFIG_FILE_NAME: &str = ".coursebrief.yaml";

/// Smallest chunk size the chunker accepts.
pub const MIN_CHUNK_SIZE: usize = 100;

/// Providers the factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 3] = ["ollama", "openai", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Output directory override (default: `resume_<course name>`)
    pub output_dir: Option<PathBuf>,

    /// Generation provider ("ollama", "openai", "mock")
    pub provider: String,

    /// Model identifier used for summaries
    pub model: String,

    /// Custom provider endpoint
    pub endpoint: Option<String>,

    /// Explicit API key (takes precedence over `api_key_env`)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Sampling temperature for summaries
    pub temperature: f32,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Chunking and retry settings
    pub summarization: SummarizationConfig,

    /// Image description settings for markup documents
    pub images: ImageConfig,

    /// Directory with prompt overrides (`<kind>.yml`)
    pub prompts_dir: Option<PathBuf>,

    /// Where call records are sent
    pub tracking: TrackingConfig,
}

/// Map-reduce and retry budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizationConfig {
    /// Estimated-token budget of a single request
    pub token_budget: usize,

    /// Maximum characters per chunk
    pub chunk_size: usize,

    /// Characters shared by adjacent chunks
    pub chunk_overlap: usize,

    /// Fixed delay between attempts, in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            token_budget: 4000,
            chunk_size: 3800,
            chunk_overlap: 150,
            retry_delay_ms: 2000,
        }
    }
}

/// Image description settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Describe images found in markup documents
    pub enabled: bool,

    /// Vision-capable model (falls back to the summary model)
    pub model: Option<String>,
}

/// Tracking sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingSink {
    /// Records are dropped
    None,
    /// Records become tracing events
    #[default]
    Log,
    /// Records are appended to a JSON Lines file
    Jsonl,
}

impl TrackingSink {
    /// Parse a sink name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Some(Self::None),
            "log" => Some(Self::Log),
            "jsonl" | "json" => Some(Self::Jsonl),
            _ => None,
        }
    }
}

/// Tracking configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    pub sink: TrackingSink,

    /// Path of the JSON Lines file (default: `<output>/.coursebrief/events.jsonl`)
    pub path: Option<PathBuf>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    summarization: Option<SummarizationSection>,
    images: Option<ImagesSection>,
    prompts: Option<PromptsSection>,
    tracking: Option<TrackingSection>,
    logging: Option<LoggingSection>,
    output: Option<OutputSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SummarizationSection {
    #[serde(rename = "tokenBudget")]
    token_budget: Option<usize>,
    #[serde(rename = "chunkSize")]
    chunk_size: Option<usize>,
    #[serde(rename = "chunkOverlap")]
    chunk_overlap: Option<usize>,
    #[serde(rename = "retryDelayMs")]
    retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ImagesSection {
    enabled: Option<bool>,
    model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PromptsSection {
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TrackingSection {
    sink: Option<String>,
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OutputSection {
    dir: Option<PathBuf>,
}

/// Command-line overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_dir: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
    pub describe_images: bool,
    pub tracking: Option<String>,
    pub retry_delay_ms: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            output_dir: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.5,
            log_level: None,
            verbose: false,
            no_color: false,
            summarization: SummarizationConfig::default(),
            images: ImageConfig::default(),
            prompts_dir: None,
            tracking: TrackingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, a YAML file and environment variables.
    ///
    /// The YAML file is `config_file` when given, otherwise the first of
    /// `<course_dir>/.coursebrief.yaml` and `./.coursebrief.yaml` that exists.
    ///
    /// Environment variables:
    /// - `COURSEBRIEF_CONFIG`: Path to config file (when `config_file` is `None`)
    /// - `COURSEBRIEF_PROVIDER`: Generation provider
    /// - `COURSEBRIEF_MODEL`: Model identifier
    /// - `COURSEBRIEF_ENDPOINT`: Provider endpoint
    /// - `COURSEBRIEF_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load(config_file: Option<&Path>, course_dir: Option<&Path>) -> AppResult<Self> {
        let mut config = Self::default();

        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("COURSEBRIEF_CONFIG").ok().map(PathBuf::from));

        let config_path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                Some(path)
            }
            None => course_dir
                .map(|dir| dir.join(CONFIG_FILE_NAME))
                .into_iter()
                .chain(std::iter::once(PathBuf::from(CONFIG_FILE_NAME)))
                .find(|p| p.exists()),
        };

        if let Some(path) = config_path {
            config = config.merge_yaml(&path)?;
            config.config_file = Some(path);
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("COURSEBRIEF_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("COURSEBRIEF_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("COURSEBRIEF_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }

        if let Ok(key) = std::env::var("COURSEBRIEF_API_KEY") {
            config.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if llm.endpoint.is_some() {
                result.endpoint = llm.endpoint;
            }
            if let Some(env) = llm.api_key_env {
                result.api_key_env = env;
            }
            if let Some(temperature) = llm.temperature {
                result.temperature = temperature;
            }
        }

        if let Some(s) = file.summarization {
            let target = &mut result.summarization;
            if let Some(v) = s.token_budget {
                target.token_budget = v;
            }
            if let Some(v) = s.chunk_size {
                target.chunk_size = v;
            }
            if let Some(v) = s.chunk_overlap {
                target.chunk_overlap = v;
            }
            if let Some(v) = s.retry_delay_ms {
                target.retry_delay_ms = v;
            }
        }

        if let Some(images) = file.images {
            if let Some(enabled) = images.enabled {
                result.images.enabled = enabled;
            }
            if images.model.is_some() {
                result.images.model = images.model;
            }
        }

        if let Some(prompts) = file.prompts {
            if prompts.dir.is_some() {
                result.prompts_dir = prompts.dir;
            }
        }

        if let Some(tracking) = file.tracking {
            if let Some(sink) = tracking.sink {
                result.tracking.sink = TrackingSink::parse(&sink).ok_or_else(|| {
                    AppError::Config(format!("Unknown tracking sink: {}", sink))
                })?;
            }
            if tracking.path.is_some() {
                result.tracking.path = tracking.path;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(output) = file.output {
            if output.dir.is_some() {
                result.output_dir = output.dir;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> AppResult<Self> {
        if let Some(output_dir) = overrides.output_dir {
            self.output_dir = Some(output_dir);
        }

        if let Some(provider) = overrides.provider {
            self.provider = provider;
        }

        if let Some(model) = overrides.model {
            self.model = model;
        }

        if let Some(endpoint) = overrides.endpoint {
            self.endpoint = Some(endpoint);
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        if overrides.describe_images {
            self.images.enabled = true;
        }

        if let Some(sink) = overrides.tracking {
            self.tracking.sink = TrackingSink::parse(&sink)
                .ok_or_else(|| AppError::Config(format!("Unknown tracking sink: {}", sink)))?;
        }

        if let Some(delay) = overrides.retry_delay_ms {
            self.summarization.retry_delay_ms = delay;
        }

        Ok(self)
    }

    /// Output directory for a course, defaulting to `resume_<course name>`.
    pub fn resolve_output_dir(&self, course_dir: &Path) -> PathBuf {
        if let Some(ref dir) = self.output_dir {
            return dir.clone();
        }

        let course_name = course_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "course".to_string());
        PathBuf::from(format!("resume_{}", course_name))
    }

    /// Model used for image descriptions.
    pub fn image_model(&self) -> &str {
        self.images.model.as_deref().unwrap_or(&self.model)
    }

    /// Resolve the API key from the explicit setting or its environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }

    /// Validate configuration before a run.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        let s = &self.summarization;
        if s.chunk_size < MIN_CHUNK_SIZE {
            return Err(AppError::Config(format!(
                "Chunk size {} is too small; must be at least {}",
                s.chunk_size, MIN_CHUNK_SIZE
            )));
        }

        if s.chunk_overlap >= s.chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap {} must be smaller than chunk size {}",
                s.chunk_overlap, s.chunk_size
            )));
        }

        if s.token_budget == 0 {
            return Err(AppError::Config("Token budget must be positive".to_string()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "Temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }

        if provider == "openai" && self.resolve_api_key().is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.api_key_env
            )));
        }

        Ok(())
    }
}

/// Short SHA-256 fingerprint of a secret, safe to log.
pub fn fingerprint_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let hex = format!("{:x}", digest);
    hex[..8].to_string()
}
