pub mod chunker;
pub mod error;
mod llm;
pub mod orchestrator;
mod processor;
pub mod tokens;
pub mod tracing;

pub use error::{ErrorKind, ProviderError, SummarizeError};
pub use llm::{anthropic, openai};
pub use llm::summarizer::{ProviderBudget, Summarizer};
pub use orchestrator::{ProviderRole, SummarizationOrchestrator, SummaryResult};
pub use processor::{
    builder::TranscriptProcessorBuilder, ProcessError, ProcessOutcome, TranscriptProcessor,
    TranscriptRequest,
};
