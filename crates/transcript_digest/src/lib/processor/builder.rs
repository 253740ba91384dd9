use digest_store::DataStore;

use crate::{orchestrator::SummarizationOrchestrator, Summarizer, TranscriptProcessor};

pub struct TranscriptProcessorBuilder<D = (), P = (), S = ()> {
    store: D,
    primary: P,
    secondary: S,
}

impl TranscriptProcessorBuilder {
    pub fn new() -> Self {
        Self {
            store: (),
            primary: (),
            secondary: (),
        }
    }
}

impl Default for TranscriptProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, P, S> TranscriptProcessorBuilder<D, P, S> {
    pub fn store<D2: DataStore + Send + Sync + 'static>(
        self,
        store: D2,
    ) -> TranscriptProcessorBuilder<D2, P, S> {
        TranscriptProcessorBuilder {
            store,
            primary: self.primary,
            secondary: self.secondary,
        }
    }

    pub fn primary<P2: Summarizer + Send + Sync + 'static>(
        self,
        primary: P2,
    ) -> TranscriptProcessorBuilder<D, P2, S> {
        TranscriptProcessorBuilder {
            store: self.store,
            primary,
            secondary: self.secondary,
        }
    }

    pub fn secondary<S2: Summarizer + Send + Sync + 'static>(
        self,
        secondary: S2,
    ) -> TranscriptProcessorBuilder<D, P, S2> {
        TranscriptProcessorBuilder {
            store: self.store,
            primary: self.primary,
            secondary,
        }
    }
}

impl<D, P, S> TranscriptProcessorBuilder<D, P, S>
where
    D: DataStore + Send + Sync + 'static,
    P: Summarizer + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    pub fn build(self) -> TranscriptProcessor<D, P, S> {
        TranscriptProcessor::new(
            self.store,
            SummarizationOrchestrator::new(self.primary, self.secondary),
        )
    }
}
