//! Errors surfaced by the registry, the validator chain, and the pipeline.

use thiserror::Error;

/// A normalizer's own failure, preserved verbatim as the pipeline's
/// `normalization_failed` cause (§4.H step 2).
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The payload didn't decode to the shape this normalizer expects.
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// A field required by this OCSF class was missing from the payload.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// A validator's rejection of an otherwise-normalized event.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A required field was empty, zero, or otherwise unset.
    #[error("{0} is required")]
    Required(&'static str),
}

/// The typed outcome of [`crate::Pipeline::process`]. Each variant carries the
/// stable reason (§7) the worker needs to route the failure to DLQ and fail
/// the ack.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No normalizer in the registry matched `(format, source_type)`. Never
    /// retried — retrying without a new normalizer can't succeed.
    #[error("no normalizer for format={format:?} source_type={source_type:?}")]
    NoNormalizer {
        /// Envelope format that failed to match.
        format: String,
        /// Envelope source type that failed to match.
        source_type: String,
    },
    /// The matched normalizer returned an error.
    #[error("normalization failed: {0}")]
    NormalizationFailed(#[from] NormalizeError),
    /// The validator chain rejected the normalized event.
    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

impl PipelineError {
    /// The stable DLQ/metrics reason for this failure (§7).
    pub fn reason(&self) -> ingest_types::Reason {
        match self {
            PipelineError::NoNormalizer { .. } => ingest_types::Reason::NoNormalizer,
            PipelineError::NormalizationFailed(_) => ingest_types::Reason::NormalizationFailed,
            PipelineError::ValidationFailed(_) => ingest_types::Reason::ValidationFailed,
        }
    }
}
