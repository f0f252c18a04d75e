use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_CONFIG_PATH: &str = "VERIFACT_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const ENV_MODEL_DIR: &str = "VERIFACT_MODEL_DIR";
const ENV_PROJECT_ROOT: &str = "VERIFACT_PROJECT_ROOT";
const DEFAULT_MODEL_DIR: &str = "models/Mistral-7B-Instruct-v0.3";

/// Search provider tuning
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Upper bound on retrieved result snippets per question
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Timeout for a single search request
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// Inference backend tuning shared by both providers
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Timeout for a single generation call (remote or local)
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,
    /// Cap on tokens produced by the local model per call
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            generation_timeout_secs: default_generation_timeout(),
            max_new_tokens: default_max_new_tokens(),
        }
    }
}

/// Limits for a single statement check
#[derive(Debug, Clone, Deserialize)]
pub struct CheckLimits {
    /// Bound on concurrently classified questions
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_questions: usize,
    /// Timeout for one question (retrieval + classification)
    #[serde(default = "default_question_timeout")]
    pub question_timeout_secs: u64,
    /// Deadline for the whole check; exceeding it yields an incomplete verdict
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,
}

impl Default for CheckLimits {
    fn default() -> Self {
        Self {
            max_concurrent_questions: default_max_concurrent(),
            question_timeout_secs: default_question_timeout(),
            check_timeout_secs: default_check_timeout(),
        }
    }
}

fn default_max_results() -> usize {
    5
}

fn default_search_timeout() -> u64 {
    10
}

fn default_generation_timeout() -> u64 {
    120
}

fn default_max_new_tokens() -> usize {
    300
}

fn default_max_concurrent() -> usize {
    4
}

fn default_question_timeout() -> u64 {
    90
}

fn default_check_timeout() -> u64 {
    600
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub limits: CheckLimits,
    /// Local model directory; relative paths resolve against the project root
    #[serde(default)]
    pub model_dir: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub search: SearchConfig,
    pub backend: BackendConfig,
    pub limits: CheckLimits,
    /// Absolute path of the local model directory
    pub model_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            search: SearchConfig::default(),
            backend: BackendConfig::default(),
            limits: CheckLimits::default(),
            model_dir: resolve_model_dir(DEFAULT_MODEL_DIR),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path).unwrap_or_default();

        // Env var wins over the config file for the model location
        let model_dir = std::env::var(ENV_MODEL_DIR)
            .ok()
            .or(file.model_dir)
            .unwrap_or_else(|| DEFAULT_MODEL_DIR.to_string());

        Self {
            host,
            port,
            search: file.search,
            backend: file.backend,
            limits: file.limits,
            model_dir: resolve_model_dir(&model_dir),
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                // Handle empty file
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded configuration from file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Resolve the model directory to an absolute path, independent of the
/// current working directory. Relative paths are anchored at the project
/// root (`VERIFACT_PROJECT_ROOT`, or the crate manifest directory).
fn resolve_model_dir(dir: &str) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        return path;
    }

    let root = std::env::var(ENV_PROJECT_ROOT)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")));

    root.join(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.limits.max_concurrent_questions, 4);
        assert!(config.model_dir.is_absolute());
    }

    #[test]
    fn test_parse_config_file() {
        let yaml = r#"
search:
  max_results: 3
limits:
  max_concurrent_questions: 8
model_dir: /opt/models/mistral
"#;
        let file: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.search.max_results, 3);
        // Unset fields keep their defaults
        assert_eq!(file.search.timeout_secs, 10);
        assert_eq!(file.limits.max_concurrent_questions, 8);
        assert_eq!(file.limits.question_timeout_secs, 90);
        assert_eq!(file.model_dir.as_deref(), Some("/opt/models/mistral"));
    }

    #[test]
    fn test_parse_empty_sections() {
        let file: ConfigFile = serde_yaml::from_str("search: {}").unwrap();
        assert_eq!(file.search.max_results, 5);
        assert!(file.model_dir.is_none());
    }

    #[test]
    fn test_resolve_model_dir_absolute_passthrough() {
        let resolved = resolve_model_dir("/opt/models/mistral");
        assert_eq!(resolved, PathBuf::from("/opt/models/mistral"));
    }

    #[test]
    fn test_resolve_model_dir_relative_is_anchored() {
        let resolved = resolve_model_dir("models/test");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("models/test"));
    }
}
