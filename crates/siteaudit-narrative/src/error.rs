use thiserror::Error;

/// Failure talking to the text-generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("text generation API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("text generation response was malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("text generation did not finish within {secs}s")]
    Timeout { secs: u64 },

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("no JSON report could be extracted from the generated text")]
    Unparsable,

    #[error("report modules do not match the purchase (missing: {missing:?}, unexpected: {unexpected:?})")]
    Incomplete {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}
