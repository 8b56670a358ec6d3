//! Prompt splitting.
//!
//! Prompts arrive either as one `;`-delimited string (each piece may span
//! several lines) or as a single prompt repeated a fixed number of times.

use crate::config::ConfigError;

/// Prompt delimiter for the list form.
pub const PROMPT_DELIMITER: char = ';';

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Where the ordered prompt list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    /// `p1; p2; p3`
    Delimited(String),
    /// One prompt used for `count` frames.
    Repeated { prompt: String, count: usize },
}

impl PromptSource {
    /// Produce the ordered, non-empty prompt list.
    ///
    /// # Errors
    ///
    /// `ConfigError::NoPrompts` when nothing usable remains.
    pub fn resolve(&self) -> Result<Vec<String>, ConfigError> {
        let prompts = match self {
            PromptSource::Delimited(text) => split_prompts(text),
            PromptSource::Repeated { prompt, count } => {
                if prompt.trim().is_empty() {
                    Vec::new()
                } else {
                    repeat_prompt(prompt, *count)
                }
            }
        };

        if prompts.is_empty() {
            return Err(ConfigError::NoPrompts);
        }
        Ok(prompts)
    }
}

/// Split a `;`-delimited string into trimmed, non-empty prompts.
///
/// Line endings are normalized to `\n` and byte-order marks at either end are
/// dropped; newlines inside a prompt are kept.
pub fn split_prompts(text: &str) -> Vec<String> {
    let normalized = text
        .trim_matches(BYTE_ORDER_MARK)
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    normalized
        .split(PROMPT_DELIMITER)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// The same prompt `count` times, verbatim.
pub fn repeat_prompt(prompt: &str, count: usize) -> Vec<String> {
    vec![prompt.to_string(); count]
}
