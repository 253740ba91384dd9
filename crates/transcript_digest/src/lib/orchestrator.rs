use std::fmt;

use futures::{future::try_join_all, TryFutureExt};
use serde::Serialize;

use crate::{
    chunker::split_into_chunks,
    error::{ErrorKind, ProviderError, SummarizeError},
    tokens::estimate_tokens,
    Summarizer,
};

/// Which of the two configured backends produced a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    Primary,
    Secondary,
}

impl ProviderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderRole::Primary => "primary",
            ProviderRole::Secondary => "secondary",
        }
    }
}

impl fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    pub summary: String,
    pub provider: ProviderRole,
}

/// Drives a transcript through the primary summarizer, handing it to the
/// secondary one only when the primary rejects the request outright.
#[derive(Debug, Clone)]
pub struct SummarizationOrchestrator<P, S>
where
    P: Summarizer + Send + Sync,
    S: Summarizer + Send + Sync,
{
    primary: P,
    secondary: S,
}

impl<P, S> SummarizationOrchestrator<P, S>
where
    P: Summarizer + Send + Sync,
    S: Summarizer + Send + Sync,
{
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    #[tracing::instrument(skip_all, fields(transcript_len = transcript.len()))]
    pub async fn summarize(&self, transcript: &str) -> Result<SummaryResult, SummarizeError> {
        let primary_err = match summarize_with(&self.primary, ProviderRole::Primary, transcript)
            .await
        {
            Ok(summary) => {
                return Ok(SummaryResult {
                    summary,
                    provider: ProviderRole::Primary,
                })
            }
            Err(e) if e.triggers_fallback() => e,
            Err(e) => {
                tracing::error!(error = %e, kind = %e.kind, "Primary summarizer failed");
                return Err(e.into());
            }
        };

        tracing::warn!(
            error = %primary_err,
            "Primary summarizer rejected the request, falling back to secondary"
        );

        match summarize_with(&self.secondary, ProviderRole::Secondary, transcript).await {
            Ok(summary) => Ok(SummaryResult {
                summary,
                provider: ProviderRole::Secondary,
            }),
            Err(secondary_err) => {
                tracing::error!(
                    error = %secondary_err,
                    kind = %secondary_err.kind,
                    "Secondary summarizer also failed"
                );
                Err(SummarizeError::Combined {
                    primary: primary_err,
                    secondary: secondary_err,
                })
            }
        }
    }
}

/// One complete attempt against a single backend: a direct summary when the
/// transcript fits its budget, otherwise chunk, summarize parts concurrently,
/// and reduce.
#[tracing::instrument(skip_all, fields(provider = %role, model = %summarizer.budget().model))]
async fn summarize_with<T>(
    summarizer: &T,
    role: ProviderRole,
    transcript: &str,
) -> Result<String, ProviderError>
where
    T: Summarizer + Send + Sync,
{
    let max_tokens = summarizer.budget().max_input_tokens;
    let token_count = estimate_tokens(transcript);
    tracing::info!(token_count, max_tokens, "Summarizing transcript");

    if token_count <= max_tokens {
        return summarizer.summarize_one(transcript).await;
    }

    let chunks = split_into_chunks(transcript, max_tokens);
    let total = chunks.len();
    tracing::info!(chunks = total, "Split transcript into chunks");

    // try_join_all yields results in input order and stops at the first failure
    let mut partials = try_join_all(chunks.iter().enumerate().map(|(idx, chunk)| {
        summarizer
            .summarize_part(chunk, idx + 1, total)
            .inspect_ok(move |_| tracing::debug!(part = idx + 1, "Completed chunk summary"))
            .map_err(move |e| {
                e.with_context(format!("Failed to summarize chunk {} of {total}", idx + 1))
            })
    }))
    .await?;

    match partials.len() {
        0 => Err(ProviderError::new(
            ErrorKind::Unknown,
            "Transcript contains no summarizable content",
        )),
        1 => Ok(partials.swap_remove(0)),
        _ => summarizer
            .reduce(&partials)
            .await
            .map_err(|e| e.with_context("Failed to combine summaries")),
    }
}
