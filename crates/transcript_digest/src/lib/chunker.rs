//! # Transcript chunking
//!
//! Splits a transcript into ordered chunks that each fit a provider's token
//! budget. Splitting is hierarchical: timestamp segments first, then sentences
//! for segments that are too large on their own, then words for sentences that
//! are still too large. A single word larger than the budget becomes its own
//! oversized chunk.

use std::sync::LazyLock;

use regex::Regex;

use crate::tokens::estimate_tokens;

/// Inline timestamp markers such as `[12:34]`, including trailing whitespace
static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+:\d+\]\s*").unwrap());

/// A run of text ending in sentence punctuation, or trailing text without any
static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]*[.!?]+|[^.!?]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Segment,
    Sentence,
    Word,
}

impl Tier {
    fn finer(self) -> Option<Tier> {
        match self {
            Tier::Segment => Some(Tier::Sentence),
            Tier::Sentence => Some(Tier::Word),
            Tier::Word => None,
        }
    }

    fn split(self, text: &str) -> Vec<&str> {
        match self {
            Tier::Segment => TIMESTAMP_RE
                .split(text)
                .filter(|segment| !segment.trim().is_empty())
                .collect(),
            Tier::Sentence => SENTENCE_RE.find_iter(text).map(|m| m.as_str()).collect(),
            Tier::Word => text.split_whitespace().collect(),
        }
    }

    /// Words are re-joined with a trailing space, which counts against the budget
    fn estimate(self, unit: &str) -> usize {
        match self {
            Tier::Word => estimate_tokens(&format!("{unit} ")),
            _ => estimate_tokens(unit),
        }
    }
}

struct ChunkAccumulator {
    max_tokens: usize,
    chunks: Vec<String>,
    current: String,
    current_tokens: usize,
}

impl ChunkAccumulator {
    fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            chunks: Vec::new(),
            current: String::new(),
            current_tokens: 0,
        }
    }

    fn push(&mut self, tier: Tier, unit: &str, tokens: usize) {
        if self.current_tokens + tokens > self.max_tokens {
            self.flush();
        }

        self.current.push_str(unit);
        if tier == Tier::Word {
            self.current.push(' ');
        }
        self.current_tokens += tokens;
    }

    fn flush(&mut self) {
        let trimmed = self.current.trim();
        if !trimmed.is_empty() {
            self.chunks.push(trimmed.to_string());
        }
        self.current.clear();
        self.current_tokens = 0;
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

/// Splits `text` into chunks whose estimated token count stays within `max_tokens`.
///
/// Timestamp markers are dropped and chunk edges are trimmed; otherwise the
/// chunks reproduce the transcript's content in order. The result depends only
/// on the inputs.
#[tracing::instrument(skip(text), fields(text_len = text.len()))]
pub fn split_into_chunks(text: &str, max_tokens: usize) -> Vec<String> {
    let mut acc = ChunkAccumulator::new(max_tokens);

    // kept in reverse so that popping yields units in transcript order
    let mut pending: Vec<(Tier, &str)> = Tier::Segment
        .split(text)
        .into_iter()
        .rev()
        .map(|segment| (Tier::Segment, segment))
        .collect();

    while let Some((tier, unit)) = pending.pop() {
        let tokens = tier.estimate(unit);

        match tier.finer() {
            Some(finer) if tokens > max_tokens => {
                pending.extend(finer.split(unit).into_iter().rev().map(|u| (finer, u)));
            }
            _ => acc.push(tier, unit, tokens),
        }
    }

    let chunks = acc.finish();
    tracing::debug!(count = chunks.len(), "Split transcript into chunks");
    chunks
}
