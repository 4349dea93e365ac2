use crate::compact::to_compact_string;
use crate::error::Result;
use log::debug;
use serde::Serialize;
use vaultrag_retrieval::{RagConfig, SearchResult};

/// Appended when the context is cut to fit the token budget
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

/// Sentence-aware cuts must keep more than this share of the cap
const SENTENCE_BREAK_RATIO: f64 = 0.7;

/// Rough token count: one token per four characters
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Cap `content` at `max_chars` characters, preferring to end on a sentence
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }

    let cut: Vec<char> = content.chars().take(max_chars).collect();
    let last_break = cut.iter().rposition(|c| matches!(c, '.' | '!' | '?'));

    match last_break {
        Some(pos) if pos as f64 > max_chars as f64 * SENTENCE_BREAK_RATIO => {
            cut[..=pos].iter().collect()
        }
        _ => {
            let mut truncated: String = cut.into_iter().collect();
            truncated.push_str("...");
            truncated
        }
    }
}

/// Assembled context text
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    pub text: String,
    pub estimated_tokens: usize,
    pub truncated: bool,
}

#[derive(Debug, Serialize)]
struct ContextRecord<'a> {
    rank: usize,
    path: &'a str,
    score: f64,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
struct ContextPayload<'a> {
    query: &'a str,
    documents: Vec<ContextRecord<'a>>,
}

/// Renders ranked documents into a token-budgeted text block
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    compact_format: bool,
    include_metadata: bool,
    max_context_tokens: usize,
    max_content_chars: usize,
}

impl ContextAssembler {
    pub fn new(config: &RagConfig) -> Self {
        Self {
            compact_format: config.compact_format,
            include_metadata: config.include_metadata,
            max_context_tokens: config.max_context_tokens,
            max_content_chars: config.max_content_chars,
        }
    }

    pub fn assemble(&self, query: &str, results: &[SearchResult]) -> Result<AssembledContext> {
        let records = self.records(results);
        let text = if self.compact_format {
            to_compact_string(&ContextPayload {
                query,
                documents: records,
            })?
        } else {
            verbose(query, &records)
        };

        let (text, truncated) = self.fit_budget(text);
        let estimated_tokens = estimate_tokens(&text);
        debug!(
            "Assembled context for {} documents: ~{estimated_tokens} tokens",
            results.len()
        );

        Ok(AssembledContext {
            text,
            estimated_tokens,
            truncated,
        })
    }

    fn records<'a>(&self, results: &'a [SearchResult]) -> Vec<ContextRecord<'a>> {
        results
            .iter()
            .enumerate()
            .map(|(i, result)| {
                let metadata = &result.document.metadata;
                ContextRecord {
                    rank: i + 1,
                    path: &result.document.path,
                    score: round_score(result.score),
                    content: truncate_content(&result.document.content, self.max_content_chars),
                    tags: self
                        .include_metadata
                        .then(|| metadata.tags.iter().map(String::as_str).collect()),
                    links: self.include_metadata.then_some(metadata.links.as_slice()),
                }
            })
            .collect()
    }

    /// Hard-cut to the token budget, never exceeding `max_context_tokens * 4` chars
    fn fit_budget(&self, text: String) -> (String, bool) {
        let estimate = estimate_tokens(&text);
        if estimate <= self.max_context_tokens {
            return (text, false);
        }

        let limit = self.max_context_tokens * 4;
        let target = text.chars().count() * self.max_context_tokens / estimate;
        let keep = target.min(limit.saturating_sub(TRUNCATION_MARKER.chars().count()));

        let truncated: String = text
            .chars()
            .take(keep)
            .chain(TRUNCATION_MARKER.chars())
            .take(limit)
            .collect();
        (truncated, true)
    }
}

fn verbose(query: &str, records: &[ContextRecord<'_>]) -> String {
    let mut parts = vec![format!("Query: {query}\n\nRelevant Documents:\n")];
    parts.extend(records.iter().map(|record| {
        format!(
            "\n[{}] {} (score: {})\n{}\n",
            record.rank,
            record.path,
            format_score(record.score),
            record.content
        )
    }));
    parts.join("\n")
}

fn round_score(score: f32) -> f64 {
    (f64::from(score) * 1000.0).round() / 1000.0
}

/// Same rendering the compact format uses, so `1.0` stays `1.0`
fn format_score(score: f64) -> String {
    serde_json::Value::from(score).to_string()
}
