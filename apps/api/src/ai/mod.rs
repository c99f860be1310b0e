// All AI backend access lives here. No other module talks to the Anthropic
// API directly — the pipeline and handlers go through `CandidateAnalyzer`.

pub mod analyzer;
pub mod client;
pub mod prompts;

pub use analyzer::{CandidateAnalyzer, LlmAnalyzer};
pub use client::LlmClient;
