use vigil_core::{DiffFile, ReviewResponse, VigilError};

const REVIEW_INSTRUCTIONS: &str = "\
You are a world-class senior software engineer reviewing a GitHub pull \
request diff.

Focus on:
- Code readability
- Performance
- Bug risks
- Security concerns
- Adherence to best practices
- Maintainability and design

Respond ONLY with a valid JSON object in this format (no markdown, no \
explanation):

{
  \"comments\": [
    {
      \"file\": \"<file path as it appears in the diff>\",
      \"comment\": \"<the review comment>\",
      \"lineNo\": <line number in the new version of the file>
    }
  ]
}

If the diff warrants no comments, return: { \"comments\": [] }";

/// The fixed instruction prefix sent with every generation call.
///
/// Stable for the duration of a session; also used as the prefix when
/// budgeting which files fit.
///
/// # Examples
///
/// ```
/// use vigil_review::prompt::review_instructions;
///
/// let instructions = review_instructions();
/// assert!(instructions.contains("lineNo"));
/// ```
pub fn review_instructions() -> String {
    REVIEW_INSTRUCTIONS.to_string()
}

/// Render one file's diff as the fenced block the model reviews.
///
/// # Examples
///
/// ```
/// use vigil_core::DiffFile;
/// use vigil_review::prompt::render_file_block;
///
/// let file = DiffFile {
///     filename: "src/app.ts".into(),
///     patch: Some("+added".into()),
///     additions: 1,
///     deletions: 0,
///     changes: 1,
/// };
/// let block = render_file_block(&file);
/// assert!(block.contains("### File: src/app.ts"));
/// assert!(block.contains("```diff"));
/// ```
pub fn render_file_block(file: &DiffFile) -> String {
    format!(
        "\n---\n### File: {}\n```diff\n{}\n```",
        file.filename,
        file.patch_text()
    )
}

/// Parse the model's response into a [`ReviewResponse`].
///
/// Tolerates markdown code fences around the JSON, nothing else: a
/// response that does not parse is a [`VigilError::Parse`], which aborts
/// the whole session rather than skipping the file.
///
/// # Examples
///
/// ```
/// use vigil_review::prompt::parse_review_response;
///
/// let response = parse_review_response(r#"{"comments":[]}"#).unwrap();
/// assert!(response.comments.is_empty());
///
/// assert!(parse_review_response("not json").is_err());
/// ```
pub fn parse_review_response(response: &str) -> Result<ReviewResponse, VigilError> {
    let cleaned = strip_code_fences(response);
    serde_json::from_str(cleaned)
        .map_err(|e| VigilError::Parse(format!("invalid review response: {e}")))
}

fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}
