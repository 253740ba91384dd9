use std::future::Future;

use itertools::Itertools;

use crate::error::ProviderError;

const SUMMARIZE_ONE_PROMPT: &str = include_str!("./prompts/summarize_one.txt");
const SUMMARIZE_PART_PROMPT: &str = include_str!("./prompts/summarize_part.txt");
const REDUCE_PROMPT: &str = include_str!("./prompts/reduce.txt");

/// Model and token ceilings a single backend is driven with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderBudget {
    pub model: String,
    /// Largest estimated token count accepted as input for one call
    pub max_input_tokens: usize,
    pub max_output_tokens: u32,
}

impl ProviderBudget {
    pub fn new(model: impl Into<String>, max_input_tokens: usize, max_output_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_input_tokens,
            max_output_tokens,
        }
    }
}

/// A summarization backend.
///
/// Implementors only issue raw completions; the summary, partial summary and
/// reduce requests are built on top of [`Summarizer::complete`] so every
/// backend sends the same instructions.
pub trait Summarizer {
    /// Roughly half of the backend's context window, leaving room for the
    /// prompt and the response
    const CONTEXT_WINDOW_LIMIT: usize;
    const SUMMARIZER_MODEL: &'static str;
    const MAX_OUTPUT_TOKENS: u32 = 4_000;

    fn budget(&self) -> &ProviderBudget;

    fn complete(
        &self,
        prompt: String,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;

    fn summarize_one(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send {
        self.complete(SUMMARIZE_ONE_PROMPT.replace("{transcript}", text))
    }

    /// `part` is 1-based
    fn summarize_part(
        &self,
        text: &str,
        part: usize,
        total: usize,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send {
        self.complete(part_prompt(text, part, total))
    }

    fn reduce(
        &self,
        partials: &[String],
    ) -> impl Future<Output = Result<String, ProviderError>> + Send {
        self.complete(reduce_prompt(partials))
    }
}

fn part_prompt(text: &str, part: usize, total: usize) -> String {
    SUMMARIZE_PART_PROMPT
        .replace("{part}", &part.to_string())
        .replace("{total}", &total.to_string())
        .replace("{transcript}", text)
}

fn reduce_prompt(partials: &[String]) -> String {
    let parts = partials
        .iter()
        .enumerate()
        .map(|(idx, summary)| format!("Part {}:\n{summary}", idx + 1))
        .join("\n\n");

    REDUCE_PROMPT
        .replace("{count}", &partials.len().to_string())
        .replace("{parts}", &parts)
}
