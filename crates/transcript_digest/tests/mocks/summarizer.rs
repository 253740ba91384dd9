use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use transcript_digest::{ErrorKind, ProviderBudget, ProviderError, Summarizer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Complete(String),
    One(String),
    Part {
        part: usize,
        total: usize,
        text: String,
    },
    Reduce(Vec<String>),
}

#[derive(Clone)]
pub struct MockSummarizer {
    pub name: String,
    pub budget: ProviderBudget,
    pub calls: Arc<Mutex<Vec<MockCall>>>,
    pub fail_with: Option<ProviderError>,
    pub fail_on_part: Option<usize>,
    /// Later parts finish first when set
    pub reverse_completion: bool,
}

impl MockSummarizer {
    pub fn new(name: &str, max_input_tokens: usize) -> Self {
        Self {
            name: name.to_string(),
            budget: ProviderBudget::new("mock-model", max_input_tokens, 4_000),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            fail_on_part: None,
            reverse_completion: false,
        }
    }

    pub fn failing(name: &str, max_input_tokens: usize, kind: ErrorKind, msg: &str) -> Self {
        Self {
            fail_with: Some(ProviderError::new(kind, msg)),
            ..Self::new(name, max_input_tokens)
        }
    }

    pub fn failing_on_part(mut self, part: usize, kind: ErrorKind, msg: &str) -> Self {
        self.fail_on_part = Some(part);
        self.fail_with = Some(ProviderError::new(kind, msg));
        self
    }

    pub fn with_reverse_completion(mut self) -> Self {
        self.reverse_completion = true;
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn part_calls(&self) -> Vec<(usize, usize, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Part { part, total, text } => Some((part, total, text)),
                _ => None,
            })
            .collect()
    }

    pub fn reduce_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Reduce(partials) => Some(partials),
                _ => None,
            })
            .collect()
    }

    fn respond(&self, call: MockCall, output: String) -> Result<String, ProviderError> {
        let fails = match (&call, self.fail_on_part) {
            (MockCall::Part { part, .. }, Some(failing_part)) => *part == failing_part,
            (_, Some(_)) => false,
            (_, None) => self.fail_with.is_some(),
        };
        self.calls.lock().unwrap().push(call);

        match &self.fail_with {
            Some(err) if fails => Err(err.clone()),
            _ => Ok(output),
        }
    }
}

impl Summarizer for MockSummarizer {
    const CONTEXT_WINDOW_LIMIT: usize = 12_500;
    const SUMMARIZER_MODEL: &'static str = "mock-model";

    fn budget(&self) -> &ProviderBudget {
        &self.budget
    }

    async fn complete(&self, prompt: String) -> Result<String, ProviderError> {
        let output = format!("{} completion", self.name);
        self.respond(MockCall::Complete(prompt), output)
    }

    async fn summarize_one(&self, text: &str) -> Result<String, ProviderError> {
        let output = format!("{} summary", self.name);
        self.respond(MockCall::One(text.to_string()), output)
    }

    async fn summarize_part(
        &self,
        text: &str,
        part: usize,
        total: usize,
    ) -> Result<String, ProviderError> {
        if self.reverse_completion {
            let delay = (total - part) as u64 * 50;
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let output = format!("{} part {part}", self.name);
        self.respond(
            MockCall::Part {
                part,
                total,
                text: text.to_string(),
            },
            output,
        )
    }

    async fn reduce(&self, partials: &[String]) -> Result<String, ProviderError> {
        let output = format!("{} reduced", self.name);
        self.respond(MockCall::Reduce(partials.to_vec()), output)
    }
}

/// Implements only the raw completion, so every request goes through the
/// trait's own prompt templates
#[derive(Clone)]
pub struct PromptRecorder {
    pub budget: ProviderBudget,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl PromptRecorder {
    pub fn new(max_input_tokens: usize) -> Self {
        Self {
            budget: ProviderBudget::new("recorder-model", max_input_tokens, 4_000),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Summarizer for PromptRecorder {
    const CONTEXT_WINDOW_LIMIT: usize = 12_500;
    const SUMMARIZER_MODEL: &'static str = "recorder-model";

    fn budget(&self) -> &ProviderBudget {
        &self.budget
    }

    async fn complete(&self, prompt: String) -> Result<String, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt);
        Ok(format!("completion {}", prompts.len()))
    }
}
