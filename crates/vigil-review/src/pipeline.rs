use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use vigil_core::{
    DiffFile, PullRequestEvent, ResolvedComment, ReviewComment, ReviewResponse, ReviewSession,
    VigilError,
};

use crate::budget::{self, TokenEstimator};
use crate::position;
use crate::prompt;

/// Lists the changed files of a pull request.
#[async_trait]
pub trait ChangeLister: Send + Sync {
    /// Fetch all changed files for the session's pull request.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Fetch`], which is fatal to the session.
    async fn list_changed_files(
        &self,
        session: &ReviewSession,
    ) -> Result<Vec<DiffFile>, VigilError>;
}

/// Generates a review for one file's diff.
#[async_trait]
pub trait ReviewGenerator: Send + Sync {
    /// Ask the model to review `input` under `instructions`.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Generation`], which is fatal to the session.
    async fn generate_review(
        &self,
        instructions: &str,
        input: &str,
    ) -> Result<ReviewOutput, VigilError>;
}

/// Delivers a single resolved review comment.
#[async_trait]
pub trait CommentSink: Send + Sync {
    /// Create one review comment at a diff position on the session's
    /// head commit.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Post`]; failures are isolated per comment.
    async fn create_review_comment(
        &self,
        session: &ReviewSession,
        body: &str,
        path: &str,
        position: u32,
    ) -> Result<(), VigilError>;
}

/// What a generation collaborator hands back.
///
/// Some backends return raw text that still needs JSON parsing, others
/// produce structured output directly; the pipeline accepts both.
#[derive(Debug, Clone)]
pub enum ReviewOutput {
    /// Raw text, parsed as JSON by the pipeline. A parse failure aborts
    /// the session.
    Text(String),
    /// Already-structured review data, used as-is.
    Structured(ReviewResponse),
}

/// Fixed delay applied before each generation call.
///
/// The per-file loop is strictly sequential by contract; this policy is
/// what bounds the outbound request rate to the generation API.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use vigil_review::pipeline::PacingPolicy;
///
/// let pacing = PacingPolicy::new(Duration::from_secs(30));
/// assert_eq!(pacing.interval(), Duration::from_secs(30));
/// assert_eq!(PacingPolicy::none().interval(), Duration::ZERO);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PacingPolicy {
    interval: Duration,
}

impl PacingPolicy {
    /// Pace calls with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// No pacing, for tests and one-shot local runs.
    pub fn none() -> Self {
        Self {
            interval: Duration::ZERO,
        }
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Suspend for one pacing interval.
    pub async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Counters describing one completed review session.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    /// Files the pull request changed.
    pub files_fetched: usize,
    /// Files that fit the prompt token budget.
    pub files_selected: usize,
    /// Files a generation call completed for.
    pub files_reviewed: usize,
    /// Comments the model produced across all files.
    pub comments_generated: usize,
    /// Comments delivered successfully.
    pub comments_posted: usize,
    /// Comments dropped because their line had no diff position.
    pub comments_unresolved: usize,
    /// Comments whose delivery failed.
    pub post_failures: usize,
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "files: {}/{} reviewed ({} fetched) | comments: {} posted, {} unresolved, {} failed",
            self.files_reviewed,
            self.files_selected,
            self.files_fetched,
            self.comments_posted,
            self.comments_unresolved,
            self.post_failures,
        )
    }
}

/// Terminal result of handling one inbound event.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// The event's action does not trigger a review; nothing was done.
    Skipped,
    /// A full session ran to completion.
    Completed(SessionReport),
}

/// Handles inbound pull request events.
///
/// Implemented by [`ReviewPipeline`]; the webhook server depends on this
/// trait so tests can stand in a stub.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Run a review session for the event, or skip it.
    async fn handle_event(&self, event: &PullRequestEvent)
        -> Result<SessionOutcome, VigilError>;
}

/// Orchestrates one review session end to end.
///
/// Fetches the pull request's changed files, filters them under the
/// prompt token budget, reviews each file strictly sequentially with a
/// pacing pause before every generation call, resolves comment lines to
/// diff positions, and fans out comment delivery with per-comment
/// failure isolation.
///
/// Collaborators are injected instances; the pipeline holds no global
/// state and nothing survives a session.
pub struct ReviewPipeline<L, G, S> {
    lister: L,
    generator: G,
    sink: S,
    estimator: Box<dyn TokenEstimator>,
    pacing: PacingPolicy,
    token_limit: usize,
}

impl<L, G, S> std::fmt::Debug for ReviewPipeline<L, G, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewPipeline").finish_non_exhaustive()
    }
}

impl<L, G, S> ReviewPipeline<L, G, S>
where
    L: ChangeLister,
    G: ReviewGenerator,
    S: CommentSink,
{
    /// Assemble a pipeline from its collaborators.
    pub fn new(
        lister: L,
        generator: G,
        sink: S,
        estimator: Box<dyn TokenEstimator>,
        pacing: PacingPolicy,
        token_limit: usize,
    ) -> Self {
        Self {
            lister,
            generator,
            sink,
            estimator,
            pacing,
            token_limit,
        }
    }

    /// Handle one inbound pull request event.
    ///
    /// Only `opened` and `reopened` actions start a session; anything
    /// else is a successful no-op.
    ///
    /// # Errors
    ///
    /// Returns the first session-fatal error: [`VigilError::Fetch`],
    /// [`VigilError::Generation`], or [`VigilError::Parse`].
    pub async fn handle_event(
        &self,
        event: &PullRequestEvent,
    ) -> Result<SessionOutcome, VigilError> {
        if !event.triggers_review() {
            info!(action = %event.action, "ignoring pull request event");
            return Ok(SessionOutcome::Skipped);
        }
        let session = ReviewSession::from_event(event);
        let report = self.run_session(&session).await?;
        Ok(SessionOutcome::Completed(report))
    }

    /// Run a full review session for an already-scoped pull request.
    ///
    /// # Errors
    ///
    /// Same fatal errors as [`ReviewPipeline::handle_event`].
    pub async fn run_session(&self, session: &ReviewSession) -> Result<SessionReport, VigilError> {
        info!(%session, "starting review session");

        let files = self.lister.list_changed_files(session).await?;
        let instructions = prompt::review_instructions();
        let selected = budget::select_fitting_files(
            &instructions,
            &files,
            self.estimator.as_ref(),
            self.token_limit,
        );

        let mut report = SessionReport {
            files_fetched: files.len(),
            files_selected: selected.len(),
            ..SessionReport::default()
        };

        for file in &selected {
            // Strictly sequential: the pause before each call bounds the
            // request rate to the generation API.
            self.pacing.pause().await;
            info!(file = %file.filename, "requesting review");

            let output = self
                .generator
                .generate_review(&instructions, &prompt::render_file_block(file))
                .await?;
            let response = match output {
                ReviewOutput::Structured(response) => response,
                ReviewOutput::Text(text) => prompt::parse_review_response(&text)?,
            };
            report.files_reviewed += 1;

            if response.comments.is_empty() {
                info!(file = %file.filename, "no review comments generated");
                continue;
            }
            report.comments_generated += response.comments.len();

            self.post_comments(session, &selected, response.comments, &mut report)
                .await;
        }

        info!(%session, %report, "review session complete");
        Ok(report)
    }

    /// Resolve comment lines against their file's own patch and dispatch
    /// the survivors concurrently. Per-comment failures are logged, never
    /// escalated; returns once every dispatch has settled.
    async fn post_comments(
        &self,
        session: &ReviewSession,
        files: &[DiffFile],
        comments: Vec<ReviewComment>,
        report: &mut SessionReport,
    ) {
        let mut resolved: Vec<ResolvedComment> = Vec::new();
        for comment in comments {
            let Some(file) = files.iter().find(|f| f.filename == comment.file) else {
                warn!(file = %comment.file, "comment references a file outside the diff");
                report.comments_unresolved += 1;
                continue;
            };
            match position::resolve_position(file.patch_text(), comment.line_no) {
                Some(position) => resolved.push(ResolvedComment { comment, position }),
                None => {
                    warn!(
                        file = %comment.file,
                        line = comment.line_no,
                        "no diff position for comment line, dropping"
                    );
                    report.comments_unresolved += 1;
                }
            }
        }

        let dispatches = resolved.into_iter().map(|rc| {
            let sink = &self.sink;
            async move {
                let outcome = sink
                    .create_review_comment(session, &rc.comment.comment, &rc.comment.file, rc.position)
                    .await;
                (rc, outcome)
            }
        });

        for (rc, outcome) in futures::future::join_all(dispatches).await {
            match outcome {
                Ok(()) => report.comments_posted += 1,
                Err(e) => {
                    warn!(
                        file = %rc.comment.file,
                        position = rc.position,
                        error = %e,
                        "failed to post review comment"
                    );
                    report.post_failures += 1;
                }
            }
        }
    }
}

#[async_trait]
impl<L, G, S> EventHandler for ReviewPipeline<L, G, S>
where
    L: ChangeLister,
    G: ReviewGenerator,
    S: CommentSink,
{
    async fn handle_event(
        &self,
        event: &PullRequestEvent,
    ) -> Result<SessionOutcome, VigilError> {
        ReviewPipeline::handle_event(self, event).await
    }
}
