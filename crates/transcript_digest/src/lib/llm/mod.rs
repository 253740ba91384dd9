pub mod anthropic;
pub mod openai;
pub mod summarizer;
