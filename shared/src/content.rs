//! Outgoing content hygiene for workspace blocks.

/// Notion rejects rich text over 2000 characters; keep headroom for the marker.
pub const CONTENT_CHAR_LIMIT: usize = 1950;

pub const ELLIPSIS: &str = "...";

/// Remove control characters (keeping newlines and tabs), normalise line
/// endings, drop replacement characters left by lossy decoding, and cap the
/// length at [`CONTENT_CHAR_LIMIT`] characters plus [`ELLIPSIS`].
pub fn sanitize(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");

    let cleaned: String = normalized
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .filter(|c| *c != '\u{FFFD}')
        .collect();

    let cleaned = cleaned.trim().to_string();
    truncate(&cleaned, CONTENT_CHAR_LIMIT)
}

/// Cut `text` to at most `limit` characters, appending [`ELLIPSIS`] when cut.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let mut cut: String = text.chars().take(limit).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str(ELLIPSIS);
    cut
}
