/// Characters per token used by the budget heuristic
pub const CHARS_PER_TOKEN: usize = 4;

/// Rough token count estimation (4 characters ≈ 1 token, rounded up).
///
/// This is a fixed heuristic rather than a tokenizer, so budget decisions are
/// reproducible regardless of which backend ends up receiving the text.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}
