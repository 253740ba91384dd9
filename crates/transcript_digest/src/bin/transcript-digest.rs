use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use digest_store::PgDataStore;
use tokio::io::AsyncReadExt;
use transcript_digest::{
    anthropic::AnthropicClient, openai::OpenAIClient, tracing::init_tracing_subscriber,
    SummarizationOrchestrator, TranscriptProcessorBuilder, TranscriptRequest,
};

#[derive(Parser)]
#[command(
    name = "transcript-digest",
    about = "Summarizes video transcripts with Anthropic, falling back to OpenAI"
)]
struct Cli {
    #[command(flatten)]
    providers: ProviderArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct ProviderArgs {
    /// Anthropic API key (primary summarizer)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_key: String,

    #[arg(long, env = "ANTHROPIC_MODEL")]
    anthropic_model: Option<String>,

    /// Token budget for a single Anthropic request
    #[arg(long, env = "ANTHROPIC_MAX_INPUT_TOKENS")]
    anthropic_max_input_tokens: Option<usize>,

    #[arg(long, env = "ANTHROPIC_BASE_URL")]
    anthropic_base_url: Option<String>,

    /// Per-request timeout for Anthropic calls, in seconds
    #[arg(long, env = "ANTHROPIC_TIMEOUT_SECS")]
    anthropic_timeout_secs: Option<u64>,

    /// OpenAI API key (secondary summarizer)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_key: String,

    #[arg(long, env = "OPENAI_MODEL")]
    openai_model: Option<String>,

    /// Token budget for a single OpenAI request
    #[arg(long, env = "OPENAI_MAX_INPUT_TOKENS")]
    openai_max_input_tokens: Option<usize>,

    #[arg(long, env = "OPENAI_BASE_URL")]
    openai_base_url: Option<String>,

    /// Per-request timeout for OpenAI calls, in seconds
    #[arg(long, env = "OPENAI_TIMEOUT_SECS")]
    openai_timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a transcript and print the result
    Summarize {
        /// Transcript file, or `-` for stdin
        #[arg(long, default_value = "-")]
        input: PathBuf,
    },
    /// Run a metered request: credit check, cache lookup, summarize, deduct
    Process {
        /// Database connection URL
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,

        #[arg(long)]
        user_id: String,

        #[arg(long)]
        video_id: String,

        /// Transcript file, or `-` for stdin
        #[arg(long, default_value = "-")]
        input: PathBuf,
    },
}

impl ProviderArgs {
    fn anthropic(&self) -> AnthropicClient {
        let mut client = AnthropicClient::new(&self.anthropic_key);
        if let Some(model) = &self.anthropic_model {
            client = client.with_model(model);
        }
        if let Some(max_tokens) = self.anthropic_max_input_tokens {
            client = client.with_max_input_tokens(max_tokens);
        }
        if let Some(url) = &self.anthropic_base_url {
            client = client.with_base_url(url);
        }
        if let Some(secs) = self.anthropic_timeout_secs {
            client = client.with_timeout(Duration::from_secs(secs));
        }
        client
    }

    fn openai(&self) -> OpenAIClient {
        let mut client = OpenAIClient::new(&self.openai_key);
        if let Some(model) = &self.openai_model {
            client = client.with_model(model);
        }
        if let Some(max_tokens) = self.openai_max_input_tokens {
            client = client.with_max_input_tokens(max_tokens);
        }
        if let Some(url) = &self.openai_base_url {
            client = client.with_base_url(url);
        }
        if let Some(secs) = self.openai_timeout_secs {
            client = client.with_timeout(Duration::from_secs(secs));
        }
        client
    }
}

async fn read_transcript(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        let mut transcript = String::new();
        tokio::io::stdin()
            .read_to_string(&mut transcript)
            .await
            .context("Failed to read transcript from stdin")?;
        return Ok(transcript);
    }

    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read transcript from {}", input.display()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    match cli.command {
        Command::Summarize { input } => {
            let transcript = read_transcript(&input).await?;
            let orchestrator =
                SummarizationOrchestrator::new(cli.providers.anthropic(), cli.providers.openai());

            let result = orchestrator
                .summarize(&transcript)
                .await
                .inspect_err(|e| {
                    tracing::error!(kind = %e.kind(), error = %e, "Summarization failed")
                })?;

            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Process {
            database_url,
            user_id,
            video_id,
            input,
        } => {
            let transcript = read_transcript(&input).await?;
            let store = PgDataStore::init(&database_url).await?;

            let processor = TranscriptProcessorBuilder::new()
                .store(store)
                .primary(cli.providers.anthropic())
                .secondary(cli.providers.openai())
                .build();

            let outcome = processor
                .process(&TranscriptRequest {
                    user_id,
                    video_id,
                    transcript,
                })
                .await
                .inspect_err(|e| {
                    tracing::error!(kind = e.kind(), error = %e, "Request failed")
                })?;

            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
