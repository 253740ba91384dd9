pub mod builder;

use chrono::Utc;
use digest_store::{
    CachedSummary, DataStore, InsufficientCredits, RequestLog, RequestStatus, UsageTransaction,
};
use serde::Serialize;

use crate::{
    error::SummarizeError,
    orchestrator::{SummarizationOrchestrator, SummaryResult},
    Summarizer,
};

#[derive(Debug, Clone)]
pub struct TranscriptRequest {
    pub user_id: String,
    /// External video identifier; also the summary cache key
    pub video_id: String,
    pub transcript: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutcome {
    pub summary: String,
    pub provider: String,
    pub credits_remaining: i64,
    pub cache_hit: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Invalid request: {0}")]
    InvalidRequest(&'static str),
    #[error("No credits available")]
    NoCredits,
    #[error(transparent)]
    Summarize(#[from] SummarizeError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ProcessError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::InvalidRequest(_) => "bad-request",
            ProcessError::NoCredits => "no-credits",
            ProcessError::Summarize(e) => e.kind().as_str(),
            ProcessError::Store(_) => "store-failure",
        }
    }
}

/// Wraps the summarization core with the credit check, the per-video summary
/// cache, credit deduction and the request log.
#[derive(Debug)]
pub struct TranscriptProcessor<D, P, S>
where
    D: DataStore + Send + Sync + 'static,
    P: Summarizer + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    store: D,
    orchestrator: SummarizationOrchestrator<P, S>,
}

impl<D, P, S> TranscriptProcessor<D, P, S>
where
    D: DataStore + Send + Sync + 'static,
    P: Summarizer + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    pub fn new(store: D, orchestrator: SummarizationOrchestrator<P, S>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    #[tracing::instrument(
        skip(self, request),
        fields(user_id = %request.user_id, video_id = %request.video_id)
    )]
    pub async fn process(
        &self,
        request: &TranscriptRequest,
    ) -> Result<ProcessOutcome, ProcessError> {
        if request.transcript.trim().is_empty() {
            return Err(ProcessError::InvalidRequest("No transcript provided"));
        }
        if request.video_id.trim().is_empty() {
            return Err(ProcessError::InvalidRequest("No videoId provided"));
        }

        let credits = self
            .store
            .get_credits(&request.user_id)
            .await?
            .unwrap_or_default();
        if credits < 1 {
            tracing::info!("User has no credits available");
            return Err(ProcessError::NoCredits);
        }

        let result = self.summarize_or_reuse(request, credits).await;
        self.log_request(request, &result).await;

        result
    }

    async fn summarize_or_reuse(
        &self,
        request: &TranscriptRequest,
        credits: i64,
    ) -> Result<ProcessOutcome, ProcessError> {
        if let Some(cached) = self.store.get_cached_summary(&request.video_id).await? {
            tracing::info!(provider = %cached.provider, "Serving cached summary");
            return Ok(ProcessOutcome {
                summary: cached.summary,
                provider: cached.provider,
                credits_remaining: credits,
                cache_hit: true,
            });
        }

        let SummaryResult { summary, provider } = self
            .orchestrator
            .summarize(&request.transcript)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, kind = %e.kind(), "Summarization failed")
            })?;

        let now = Utc::now();
        let transcript_length = request.transcript.chars().count() as i64;

        self.store
            .cache_summary(&CachedSummary {
                video_id: request.video_id.clone(),
                summary: summary.clone(),
                provider: provider.to_string(),
                transcript_length,
                created_at: now,
            })
            .await?;

        let credits_remaining = self
            .store
            .deduct_credit(&UsageTransaction {
                user_id: request.user_id.clone(),
                video_id: request.video_id.clone(),
                provider: provider.to_string(),
                transcript_length,
                date: now,
            })
            .await
            .map_err(|e| {
                // another request spent the last credit; the cached summary stays
                if e.is::<InsufficientCredits>() {
                    ProcessError::NoCredits
                } else {
                    ProcessError::Store(e)
                }
            })?;

        Ok(ProcessOutcome {
            summary,
            provider: provider.to_string(),
            credits_remaining,
            cache_hit: false,
        })
    }

    /// Request logging is best effort and never changes the outcome
    async fn log_request(
        &self,
        request: &TranscriptRequest,
        result: &Result<ProcessOutcome, ProcessError>,
    ) {
        let mut log = RequestLog {
            user_id: request.user_id.clone(),
            video_id: Some(request.video_id.clone()),
            transcript_length: request.transcript.chars().count() as i64,
            status: RequestStatus::Completed,
            cache_hit: false,
            provider: None,
            error_kind: None,
            error_message: None,
            created_at: Utc::now(),
        };

        match result {
            Ok(outcome) => {
                log.cache_hit = outcome.cache_hit;
                log.provider = Some(outcome.provider.clone());
            }
            Err(e) => {
                log.status = RequestStatus::Error;
                log.error_kind = Some(e.kind().to_string());
                log.error_message = Some(e.to_string());
            }
        }

        if let Err(e) = self.store.record_request(&log).await {
            tracing::warn!(error = ?e, "Failed to record request log");
        }
    }
}
