//! Turns raw module results into a customer-facing [`NarrativeReport`].
//!
//! A [`TextGenerator`] writes the prose; this crate builds the prompt,
//! pulls the JSON object out of whatever the generator returned, and
//! repairs the report so it covers exactly the purchased modules.
//!
//! [`NarrativeReport`]: siteaudit_core::NarrativeReport

pub mod error;
pub mod generator;
pub mod openai;
pub mod synthesizer;

mod extract;
mod prompt;
mod repair;

pub use error::{GenerationError, SynthesisError};
pub use generator::{ChatMessage, GenerationRequest, MessageRole, TextGenerator};
pub use openai::OpenAiTextGenerator;
pub use repair::{repair_report, RepairOutcome};
pub use synthesizer::{NarrativeSynthesizer, SynthesisInput};
