use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::VigilError;

/// Top-level configuration loaded from `.vigil.toml`.
///
/// Supports layered resolution: env vars > local config > defaults.
/// Secrets (API keys, tokens) are usually supplied via environment
/// variables rather than the config file.
///
/// # Examples
///
/// ```
/// use vigil_core::VigilConfig;
///
/// let config = VigilConfig::default();
/// assert_eq!(config.review.prompt_token_limit, 4000);
/// assert_eq!(config.review.pacing_secs, 30);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VigilConfig {
    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// GitHub API settings.
    #[serde(default)]
    pub github: GithubConfig,
    /// Review behavior settings.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Webhook server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

impl VigilConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Io`] if the file cannot be read, or
    /// [`VigilError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vigil_core::VigilConfig;
    /// use std::path::Path;
    ///
    /// let config = VigilConfig::from_file(Path::new(".vigil.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, VigilError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::VigilConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// prompt_token_limit = 8000
    /// "#;
    /// let config = VigilConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.prompt_token_limit, 8000);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, VigilError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Layer environment variables over the loaded configuration.
    ///
    /// `OPENAI_API_KEY` and `GITHUB_TOKEN` fill in missing secrets;
    /// `VIGIL_PROMPT_TOKEN_LIMIT` overrides the token budget.
    pub fn apply_env(mut self) -> Self {
        if self.llm.api_key.is_none() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                self.llm.api_key = Some(key);
            }
        }
        if self.github.token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                self.github.token = Some(token);
            }
        }
        if let Ok(limit) = std::env::var("VIGIL_PROMPT_TOKEN_LIMIT") {
            if let Ok(limit) = limit.parse() {
                self.review.prompt_token_limit = limit;
            }
        }
        self
    }
}

/// LLM provider configuration.
///
/// # Examples
///
/// ```
/// use vigil_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-4o-mini");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for OpenAI-compatible API requests.
    pub base_url: Option<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

/// GitHub API configuration.
///
/// # Examples
///
/// ```
/// use vigil_core::GithubConfig;
///
/// let config = GithubConfig::default();
/// assert_eq!(config.api_base, "https://api.github.com");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Personal access token. Falls back to the `GITHUB_TOKEN` env var.
    pub token: Option<String>,
    /// API base URL, overridable for GitHub Enterprise.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    "https://api.github.com".into()
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_api_base(),
        }
    }
}

/// Review behavior configuration.
///
/// # Examples
///
/// ```
/// use vigil_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.prompt_token_limit, 4000);
/// assert_eq!(config.pacing_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Token budget for prompt + per-file diff block (default: 4000).
    #[serde(default = "default_prompt_token_limit")]
    pub prompt_token_limit: usize,
    /// Seconds to pause before each generation call (default: 30).
    #[serde(default = "default_pacing_secs")]
    pub pacing_secs: u64,
}

fn default_prompt_token_limit() -> usize {
    4000
}

fn default_pacing_secs() -> u64 {
    30
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            prompt_token_limit: default_prompt_token_limit(),
            pacing_secs: default_pacing_secs(),
        }
    }
}

/// Webhook server configuration.
///
/// # Examples
///
/// ```
/// use vigil_core::ServerConfig;
///
/// let config = ServerConfig::default();
/// assert_eq!(config.port, 8080);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind (default: `127.0.0.1`).
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Port to listen on (default: 8080).
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = VigilConfig::default();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.github.api_base, "https://api.github.com");
        assert_eq!(config.review.prompt_token_limit, 4000);
        assert_eq!(config.review.pacing_secs, 30);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[review]
prompt_token_limit = 6000
pacing_secs = 5
"#;
        let config = VigilConfig::from_toml(toml).unwrap();
        assert_eq!(config.review.prompt_token_limit, 6000);
        assert_eq!(config.review.pacing_secs, 5);
        // Untouched sections keep their defaults.
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[llm]
model = "gpt-4o"
base_url = "http://localhost:11434"

[github]
api_base = "https://github.example.com/api/v3"

[review]
prompt_token_limit = 12000

[server]
bind = "0.0.0.0"
port = 9090
"#;
        let config = VigilConfig::from_toml(toml).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.github.api_base, "https://github.example.com/api/v3");
        assert_eq!(config.review.prompt_token_limit, 12000);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = VigilConfig::from_toml("").unwrap();
        assert_eq!(config.review.prompt_token_limit, 4000);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = VigilConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }
}
