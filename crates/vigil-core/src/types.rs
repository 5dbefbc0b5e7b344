use std::fmt;

use serde::{Deserialize, Serialize};

/// A changed file in a pull request, as returned by the GitHub
/// `pulls/{n}/files` API.
///
/// # Examples
///
/// ```
/// use vigil_core::DiffFile;
///
/// let file = DiffFile {
///     filename: "src/main.rs".into(),
///     patch: Some("@@ -1 +1 @@\n-old\n+new".into()),
///     additions: 1,
///     deletions: 1,
///     changes: 2,
/// };
/// assert_eq!(file.patch_text(), "@@ -1 +1 @@\n-old\n+new");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffFile {
    /// Path of the file within the repository.
    pub filename: String,
    /// Unified diff text. Absent for binary files and some renames.
    #[serde(default)]
    pub patch: Option<String>,
    /// Number of added lines.
    #[serde(default)]
    pub additions: u32,
    /// Number of deleted lines.
    #[serde(default)]
    pub deletions: u32,
    /// Total changed lines.
    #[serde(default)]
    pub changes: u32,
}

impl DiffFile {
    /// The patch text, with a missing patch read as empty.
    pub fn patch_text(&self) -> &str {
        self.patch.as_deref().unwrap_or("")
    }
}

/// A single review comment produced by the generation model.
///
/// `line_no` is a 1-based line number in the *new* version of the file;
/// it still has to be resolved to a diff position before posting.
///
/// # Examples
///
/// ```
/// use vigil_core::ReviewComment;
///
/// let json = r#"{"file":"a.ts","comment":"fix this","lineNo":5}"#;
/// let comment: ReviewComment = serde_json::from_str(json).unwrap();
/// assert_eq!(comment.line_no, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewComment {
    /// Path of the file the comment addresses.
    pub file: String,
    /// The review comment body.
    pub comment: String,
    /// 1-based line number in the new version of the file.
    pub line_no: u32,
}

/// The structured payload the generation model is asked to return.
///
/// # Examples
///
/// ```
/// use vigil_core::ReviewResponse;
///
/// let response: ReviewResponse = serde_json::from_str(r#"{"comments":[]}"#).unwrap();
/// assert!(response.comments.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResponse {
    /// Zero or more comments for the reviewed file.
    pub comments: Vec<ReviewComment>,
}

/// A review comment whose line number has been mapped onto a diff position.
///
/// The position is only valid relative to the exact patch string it was
/// derived from; it must never be reused against a different patch snapshot.
#[derive(Debug, Clone)]
pub struct ResolvedComment {
    /// The underlying comment.
    pub comment: ReviewComment,
    /// Zero-based position within the file's unified diff.
    pub position: u32,
}

/// The subset of a GitHub `pull_request` webhook payload Vigil consumes.
///
/// # Examples
///
/// ```
/// use vigil_core::PullRequestEvent;
///
/// let json = r#"{
///     "action": "opened",
///     "pull_request": { "number": 7, "head": { "sha": "abc123" } },
///     "repository": { "name": "vigil", "owner": { "login": "acme" } }
/// }"#;
/// let event: PullRequestEvent = serde_json::from_str(json).unwrap();
/// assert!(event.triggers_review());
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    /// Lifecycle action, e.g. `"opened"`, `"reopened"`, `"closed"`.
    pub action: String,
    /// The pull request the event concerns.
    pub pull_request: PullRequestInfo,
    /// The repository the pull request belongs to.
    pub repository: RepositoryInfo,
}

impl PullRequestEvent {
    /// Whether this event starts a review session.
    ///
    /// Only `opened` and `reopened` trigger a review; every other action is
    /// a successful no-op.
    pub fn triggers_review(&self) -> bool {
        matches!(self.action.as_str(), "opened" | "reopened")
    }
}

/// Pull request metadata carried by the webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestInfo {
    /// Pull request number.
    pub number: u64,
    /// Head commit of the pull request branch.
    pub head: CommitRef,
}

/// A commit reference within a webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitRef {
    /// Commit SHA.
    pub sha: String,
}

/// Repository metadata carried by the webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryInfo {
    /// Repository name.
    pub name: String,
    /// Repository owner.
    pub owner: OwnerInfo,
}

/// Repository owner metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerInfo {
    /// Owner login name.
    pub login: String,
}

/// The scope of one review run: which pull request, at which head commit.
///
/// Created at webhook receipt and discarded when the run completes; nothing
/// derived from it (diff positions in particular) survives the session.
///
/// # Examples
///
/// ```
/// use vigil_core::ReviewSession;
///
/// let session = ReviewSession {
///     owner: "acme".into(),
///     repo: "vigil".into(),
///     pull_number: 7,
///     commit_sha: "abc123".into(),
/// };
/// assert_eq!(session.to_string(), "acme/vigil#7");
/// ```
#[derive(Debug, Clone)]
pub struct ReviewSession {
    /// Repository owner login.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number.
    pub pull_number: u64,
    /// Head commit SHA the review comments are anchored on.
    pub commit_sha: String,
}

impl ReviewSession {
    /// Build a session from an inbound pull request event.
    pub fn from_event(event: &PullRequestEvent) -> Self {
        Self {
            owner: event.repository.owner.login.clone(),
            repo: event.repository.name.clone(),
            pull_number: event.pull_request.number,
            commit_sha: event.pull_request.head.sha.clone(),
        }
    }
}

impl fmt::Display for ReviewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.pull_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_file_deserializes_from_github_payload() {
        // Extra fields from the files API must be ignored.
        let json = r#"{
            "sha": "abc",
            "filename": "src/lib.rs",
            "status": "modified",
            "additions": 3,
            "deletions": 1,
            "changes": 4,
            "blob_url": "https://example.com",
            "patch": "@@ -1,2 +1,4 @@\n context\n+added"
        }"#;
        let file: DiffFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.filename, "src/lib.rs");
        assert_eq!(file.additions, 3);
        assert!(file.patch_text().starts_with("@@"));
    }

    #[test]
    fn diff_file_missing_patch_reads_empty() {
        let json = r#"{"filename":"logo.png"}"#;
        let file: DiffFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.patch_text(), "");
    }

    #[test]
    fn review_comment_uses_camel_case_line_no() {
        let comment = ReviewComment {
            file: "a.rs".into(),
            comment: "check this".into(),
            line_no: 12,
        };
        let json = serde_json::to_value(&comment).unwrap();
        assert!(json.get("lineNo").is_some());
        assert!(json.get("line_no").is_none());
    }

    #[test]
    fn event_action_gating() {
        let mut event: PullRequestEvent = serde_json::from_str(
            r#"{
                "action": "opened",
                "pull_request": { "number": 1, "head": { "sha": "deadbeef" } },
                "repository": { "name": "repo", "owner": { "login": "owner" } }
            }"#,
        )
        .unwrap();
        assert!(event.triggers_review());

        event.action = "reopened".into();
        assert!(event.triggers_review());

        event.action = "closed".into();
        assert!(!event.triggers_review());

        event.action = "synchronize".into();
        assert!(!event.triggers_review());
    }

    #[test]
    fn session_from_event_copies_coordinates() {
        let event: PullRequestEvent = serde_json::from_str(
            r#"{
                "action": "opened",
                "pull_request": { "number": 42, "head": { "sha": "f00" } },
                "repository": { "name": "hello", "owner": { "login": "octocat" } }
            }"#,
        )
        .unwrap();
        let session = ReviewSession::from_event(&event);
        assert_eq!(session.owner, "octocat");
        assert_eq!(session.repo, "hello");
        assert_eq!(session.pull_number, 42);
        assert_eq!(session.commit_sha, "f00");
        assert_eq!(session.to_string(), "octocat/hello#42");
    }
}
