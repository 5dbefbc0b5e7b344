/// Errors that can occur across the Vigil bot.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette::Report` at the boundary.
///
/// Only [`VigilError::Fetch`], [`VigilError::Generation`], and
/// [`VigilError::Parse`] abort a review session. Per-comment failures
/// (an unresolvable line, a failed comment post) are handled where they
/// occur and never reach the caller as errors.
///
/// # Examples
///
/// ```
/// use vigil_core::VigilError;
///
/// let err = VigilError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    /// Filesystem or network I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Listing the changed files of a pull request failed.
    #[error("failed to fetch pull request files: {0}")]
    Fetch(String),

    /// The text-generation API call failed.
    #[error("review generation failed: {0}")]
    Generation(String),

    /// The generation response was not valid structured review data.
    #[error("failed to parse review response: {0}")]
    Parse(String),

    /// Posting a single review comment failed.
    #[error("failed to post review comment: {0}")]
    Post(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl VigilError {
    /// Whether this error aborts a whole review session.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::VigilError;
    ///
    /// assert!(VigilError::Fetch("timeout".into()).is_session_fatal());
    /// assert!(!VigilError::Post("409".into()).is_session_fatal());
    /// ```
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            VigilError::Fetch(_) | VigilError::Generation(_) | VigilError::Parse(_)
        )
    }
}
