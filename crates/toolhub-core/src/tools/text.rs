//! Text analysis tools.
//!
//! Tools: text_stats

use super::{ToolResult, get_string_arg};
use crate::ToolError;
use crate::schema;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};
use std::collections::HashSet;
use toolhub_types::ToolDef;

pub(super) const TEXT_STATS: &str = "text_stats";

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

const WORD_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Basic statistics of a non-blank text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStats {
    /// Unicode scalar values, including whitespace.
    pub characters: usize,
    /// Characters other than the space character.
    pub characters_no_spaces: usize,
    pub words: usize,
    pub lines: usize,
    /// Non-blank segments between runs of `.`, `!` and `?`.
    pub sentences: usize,
    /// Distinct words, lowercased and stripped of surrounding punctuation.
    pub unique_words: usize,
    /// First of the longest whitespace-separated words.
    pub longest_word: String,
    /// `characters_no_spaces / words`, rounded to 2 decimal places.
    pub average_word_length: f64,
}

pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        TEXT_STATS,
        "Compute basic statistics of a text: characters, words, lines, \
         sentences, unique words, longest word and average word length.",
        schema!(object {
            required: { "text": string }
        }),
    )]
}

pub fn dispatch(name: &str, args: Map<String, JsonValue>) -> ToolResult<JsonValue> {
    match name {
        TEXT_STATS => {
            let text = get_string_arg(&args, "text")?;
            match text_stats(&text) {
                Some(stats) => {
                    serde_json::to_value(stats).map_err(|e| ToolError::Failed(e.to_string()))
                }
                None => Ok(json!({
                    "error": "Empty or blank text",
                    "characters": 0,
                    "words": 0,
                    "lines": 0,
                    "sentences": 0
                })),
            }
        }
        _ => Err(ToolError::UnknownTool(name.to_string())),
    }
}

/// Statistics of `text`, or `None` when it is empty or only whitespace.
pub fn text_stats(text: &str) -> Option<TextStats> {
    if text.trim().is_empty() {
        return None;
    }

    let characters = text.chars().count();
    let characters_no_spaces = text.chars().filter(|c| *c != ' ').count();
    let words: Vec<&str> = text.split_whitespace().collect();

    let unique_words = words
        .iter()
        .map(|w| w.to_lowercase().trim_matches(WORD_PUNCTUATION).to_string())
        .collect::<HashSet<_>>()
        .len();

    let longest_word = words.iter().fold("", |longest, w| {
        if w.chars().count() > longest.chars().count() {
            *w
        } else {
            longest
        }
    });

    let average_word_length = if words.is_empty() {
        0.0
    } else {
        (characters_no_spaces as f64 / words.len() as f64 * 100.0).round() / 100.0
    };

    Some(TextStats {
        characters,
        characters_no_spaces,
        words: words.len(),
        lines: text.lines().count(),
        sentences: SENTENCE_END
            .split(text)
            .filter(|s| !s.trim().is_empty())
            .count(),
        unique_words,
        longest_word: longest_word.to_string(),
        average_word_length,
    })
}
