//! Minimal markdown subset: `**text**` becomes a bold run, everything else is plain.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub content: String,
    pub bold: bool,
}

impl TextRun {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bold: false,
        }
    }

    pub fn bold(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bold: true,
        }
    }
}

fn bold_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"))
}

/// Split text into plain and bold runs. Unpaired `**` stays literal.
pub fn parse_runs(text: &str) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut cursor = 0;

    for caps in bold_pattern().captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > cursor {
            runs.push(TextRun::plain(&text[cursor..whole.start()]));
        }
        runs.push(TextRun::bold(inner.as_str()));
        cursor = whole.end();
    }

    if cursor < text.len() {
        runs.push(TextRun::plain(&text[cursor..]));
    }

    runs
}
