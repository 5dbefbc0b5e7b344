use async_trait::async_trait;
use tracing::debug;

use vigil_core::{DiffFile, GithubConfig, ReviewSession, VigilError};

use crate::pipeline::{ChangeLister, CommentSink};

/// GitHub client for listing pull request files and posting review comments.
///
/// Uses plain reqwest for the files listing (the response maps straight
/// onto [`DiffFile`]) and octocrab for the authenticated comment POST.
#[derive(Clone, Debug)]
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl GitHubClient {
    /// Create a client from configuration, falling back to the
    /// `GITHUB_TOKEN` environment variable for the token.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Config`] if no token is available, the
    /// API base is not a valid URI, or the client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vigil_core::GithubConfig;
    /// use vigil_review::github::GitHubClient;
    ///
    /// let config = GithubConfig {
    ///     token: Some("ghp_xxxx".into()),
    ///     ..GithubConfig::default()
    /// };
    /// let client = GitHubClient::new(&config).unwrap();
    /// ```
    pub fn new(config: &GithubConfig) -> Result<Self, VigilError> {
        let token = match &config.token {
            Some(t) => t.clone(),
            None => std::env::var("GITHUB_TOKEN").map_err(|_| {
                VigilError::Config(
                    "GITHUB_TOKEN not set. Set github.token in .vigil.toml or the GITHUB_TOKEN env var".into(),
                )
            })?,
        };

        // Both halves of the client must honor the configured API base,
        // or Enterprise installs would post comments to github.com.
        let octocrab = octocrab::Octocrab::builder()
            .base_uri(config.api_base.as_str())
            .map_err(|e| {
                VigilError::Config(format!(
                    "invalid GitHub API base '{}': {e}",
                    config.api_base
                ))
            })?
            .personal_token(token.clone())
            .build()
            .map_err(|e| VigilError::Config(format!("failed to create GitHub client: {e}")))?;

        Ok(Self {
            octocrab,
            http: reqwest::Client::new(),
            token,
            api_base: config.api_base.clone(),
        })
    }

    fn files_url(&self, session: &ReviewSession) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.api_base, session.owner, session.repo, session.pull_number
        )
    }

    /// Fetch the changed files of a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Fetch`] on network or API errors.
    pub async fn list_pull_request_files(
        &self,
        session: &ReviewSession,
    ) -> Result<Vec<DiffFile>, VigilError> {
        let url = self.files_url(session);
        debug!(%session, "fetching pull request files");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "vigil")
            .send()
            .await
            .map_err(|e| VigilError::Fetch(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VigilError::Fetch(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| VigilError::Fetch(format!("failed to decode files response: {e}")))
    }

    /// Post one review comment at a diff position on the session's head
    /// commit.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Post`] on API errors. Failures are
    /// independent per comment; the caller decides what to do with them.
    pub async fn post_review_comment(
        &self,
        session: &ReviewSession,
        body: &str,
        path: &str,
        position: u32,
    ) -> Result<(), VigilError> {
        let route = format!(
            "/repos/{}/{}/pulls/{}/comments",
            session.owner, session.repo, session.pull_number
        );
        let payload = serde_json::json!({
            "body": body,
            "commit_id": session.commit_sha,
            "path": path,
            "position": position,
        });

        let _response: serde_json::Value = self
            .octocrab
            .post(route, Some(&payload))
            .await
            .map_err(|e| VigilError::Post(format!("{path} at position {position}: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl ChangeLister for GitHubClient {
    async fn list_changed_files(
        &self,
        session: &ReviewSession,
    ) -> Result<Vec<DiffFile>, VigilError> {
        self.list_pull_request_files(session).await
    }
}

#[async_trait]
impl CommentSink for GitHubClient {
    async fn create_review_comment(
        &self,
        session: &ReviewSession,
        body: &str,
        path: &str,
        position: u32,
    ) -> Result<(), VigilError> {
        self.post_review_comment(session, body, path, position).await
    }
}

/// Parse a PR reference string (`owner/repo#number`) into its components.
///
/// # Errors
///
/// Returns [`VigilError::Config`] if the format is invalid.
///
/// # Examples
///
/// ```
/// use vigil_review::github::parse_pr_reference;
///
/// let (owner, repo, num) = parse_pr_reference("octocat/hello-world#42").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "hello-world");
/// assert_eq!(num, 42);
/// ```
pub fn parse_pr_reference(pr_ref: &str) -> Result<(String, String, u64), VigilError> {
    let Some((owner_repo, number_str)) = pr_ref.split_once('#') else {
        return Err(VigilError::Config(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        )));
    };
    let Some((owner, repo)) = owner_repo.split_once('/') else {
        return Err(VigilError::Config(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        )));
    };
    let number: u64 = number_str
        .parse()
        .map_err(|_| VigilError::Config(format!("invalid PR number: {number_str}")))?;
    Ok((owner.to_string(), repo.to_string(), number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_pr_reference() {
        let (owner, repo, num) = parse_pr_reference("rust-lang/rust#12345").unwrap();
        assert_eq!(owner, "rust-lang");
        assert_eq!(repo, "rust");
        assert_eq!(num, 12345);
    }

    #[test]
    fn parse_pr_reference_missing_hash() {
        assert!(parse_pr_reference("owner/repo").is_err());
    }

    #[test]
    fn parse_pr_reference_missing_slash() {
        assert!(parse_pr_reference("repo#123").is_err());
    }

    #[test]
    fn parse_pr_reference_invalid_number() {
        assert!(parse_pr_reference("owner/repo#abc").is_err());
    }

    fn enterprise_config() -> GithubConfig {
        GithubConfig {
            token: Some("test-token".into()),
            api_base: "https://github.example.com/api/v3".into(),
        }
    }

    #[tokio::test]
    async fn enterprise_api_base_is_used_for_file_listing() {
        let client = GitHubClient::new(&enterprise_config()).unwrap();
        let session = ReviewSession {
            owner: "octocat".into(),
            repo: "hello".into(),
            pull_number: 7,
            commit_sha: "abc123".into(),
        };
        assert_eq!(
            client.files_url(&session),
            "https://github.example.com/api/v3/repos/octocat/hello/pulls/7/files"
        );
    }

    #[test]
    fn invalid_api_base_is_a_config_error() {
        let config = GithubConfig {
            api_base: "not a uri".into(),
            ..enterprise_config()
        };
        let err = GitHubClient::new(&config).unwrap_err();
        assert!(matches!(err, VigilError::Config(_)));
        assert!(err.to_string().contains("invalid GitHub API base"));
    }
}
