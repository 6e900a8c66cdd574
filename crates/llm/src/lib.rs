pub mod generator;
pub mod pipeline;
pub mod provider;
pub mod providers;
pub mod summary;

pub use generator::{GenerationError, RuleGenerator};
pub use pipeline::{QueryOutcome, QueryPipeline};
pub use provider::{LlmProvider, Message, Role, SamplingParams};
pub use summary::Summarizer;
