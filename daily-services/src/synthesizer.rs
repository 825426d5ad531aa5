//! Prompt-to-text with a guaranteed answer: generated text when the model
//! cooperates, the caller's fallback otherwise.

use regex::Regex;
use std::sync::OnceLock;

use crate::openai::{GenerationRequest, TextGenerator};

/// Phrases that mark a refusal or a meta answer rather than content
const FAILURE_PHRASES: &[&str] = &["i'm sorry", "i cannot", "as an ai"];

const QUOTE_CHARS: &[char] = &['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '`'];

fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^\s*#{1,6}\s*").expect("valid heading regex"))
}

/// Cleanup applied to generated text before it is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostProcess {
    /// Remove quote characters wrapping the whole answer
    pub strip_quotes: bool,
    /// Remove markdown heading markers and backticks
    pub strip_markdown: bool,
    /// Rough ceiling, cut back to the last sentence end that fits
    pub max_chars: Option<usize>,
    /// Treat refusals ("I'm sorry", "As an AI") as failures
    pub reject_failure_phrases: bool,
}

impl PostProcess {
    pub fn none() -> Self {
        Self::default()
    }

    /// Everything on; used for short single-line outputs.
    pub fn strict(max_chars: usize) -> Self {
        Self {
            strip_quotes: true,
            strip_markdown: true,
            max_chars: Some(max_chars),
            reject_failure_phrases: true,
        }
    }

    /// Returns `None` when the text should be replaced by the fallback.
    pub fn apply(&self, text: &str) -> Option<String> {
        let mut out = text.trim().to_string();

        if self.reject_failure_phrases {
            let lower = out.to_lowercase();
            if let Some(phrase) = FAILURE_PHRASES.iter().find(|p| lower.contains(*p)) {
                tracing::warn!("Generated text contains {:?}, discarding", phrase);
                return None;
            }
        }

        if self.strip_markdown {
            out = heading_pattern().replace_all(&out, "").replace('`', "");
        }

        if self.strip_quotes {
            out = out.trim().trim_matches(QUOTE_CHARS).trim().to_string();
        }

        if let Some(limit) = self.max_chars {
            out = cut_at_sentence(&out, limit);
        }

        let out = out.trim().to_string();
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

/// Keep whole sentences up to `limit` characters; fall back to a hard cut
/// when not even the first sentence fits.
pub fn cut_at_sentence(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let head: String = text.chars().take(limit).collect();
    match head.rfind(['.', '!', '?']) {
        Some(end) => head[..=end].to_string(),
        None => shared::content::truncate(text, limit),
    }
}

pub struct Synthesizer<'a, G> {
    generator: &'a G,
}

impl<'a, G: TextGenerator> Synthesizer<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    /// Generate text for `request`, or return `fallback` on any failure.
    pub async fn synthesize(&self, request: &GenerationRequest, fallback: &str) -> String {
        self.synthesize_with(request, fallback, &PostProcess::none())
            .await
    }

    pub async fn synthesize_with(
        &self,
        request: &GenerationRequest,
        fallback: &str,
        post: &PostProcess,
    ) -> String {
        match self.generator.generate(request).await {
            Ok(text) => match post.apply(&text) {
                Some(accepted) => {
                    tracing::info!("Generated {} characters", accepted.chars().count());
                    accepted
                }
                None => {
                    tracing::warn!("Generated text unusable, using fallback");
                    fallback.to_string()
                }
            },
            Err(e) => {
                tracing::error!("Generation error: {} - using fallback", e);
                fallback.to_string()
            }
        }
    }
}
