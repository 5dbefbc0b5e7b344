//! Mapping new-file line numbers onto unified-diff positions.
//!
//! GitHub's review-comment API addresses comments by *position*: the
//! zero-based index of a line within the diff itself, restarting at each
//! hunk header. The generation model reports plain new-file line numbers,
//! so every comment has to go through this translation before posting.

/// Resolve a 1-based new-file line number to its diff position.
///
/// Walks the patch top to bottom keeping two cursors: the position within
/// the current hunk (reset to 0 at every `@@` header) and the new-file
/// line number the next non-deleted line corresponds to. Deleted lines
/// advance the position only; added and context lines are compared against
/// the target before advancing both cursors. The first match wins.
///
/// Returns `None` when the target never maps onto an added or context
/// line — in particular for lines inside pure-deletion runs and for
/// patches with no hunk header at all.
///
/// # Examples
///
/// ```
/// use vigil_review::position::resolve_position;
///
/// let patch = "@@ -1,3 +1,4 @@\n context\n-old\n+new1\n+new2\n context2";
/// assert_eq!(resolve_position(patch, 1), Some(0));
/// assert_eq!(resolve_position(patch, 2), Some(2));
/// assert_eq!(resolve_position(patch, 99), None);
/// ```
pub fn resolve_position(patch: &str, target_new_line: u32) -> Option<u32> {
    let mut position: u32 = 0;
    let mut new_line: u32 = 0;
    let mut in_hunk = false;

    for line in patch.lines() {
        if line.starts_with("@@") {
            // Headers must be re-parsed on every occurrence; the position
            // counter never carries across hunks.
            if let Some(start) = parse_hunk_new_start(line) {
                new_line = start;
                position = 0;
                in_hunk = true;
            }
            continue;
        }
        if !in_hunk {
            continue;
        }
        if line.starts_with('-') {
            // Deleted line: occupies a diff position but no new-file line.
            position += 1;
            continue;
        }
        // Added and context lines both occupy a new-file line.
        if new_line == target_new_line {
            return Some(position);
        }
        new_line += 1;
        position += 1;
    }

    None
}

/// Parse the new-file starting line out of a `@@ -a,b +c,d @@` header.
fn parse_hunk_new_start(header: &str) -> Option<u32> {
    let new_range = header
        .split_whitespace()
        .find(|token| token.starts_with('+'))?;
    new_range[1..].split(',').next()?.parse().ok()
}
