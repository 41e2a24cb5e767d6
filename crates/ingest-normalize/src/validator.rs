//! The Validator Chain (§4.G): an ordered sequence of validators, each
//! scoped to the classes it knows about. The chain aborts at the first
//! failure so a caller always gets exactly one actionable error.

use ingest_types::CanonicalEvent;

use crate::error::ValidationError;

/// A single validator: applies to some subset of classes and checks the
/// fields that subset requires.
pub trait Validator: Send + Sync {
    /// Whether this validator has an opinion about `class`.
    fn supports(&self, class: &str) -> bool;

    /// Check `event`, returning the first violated requirement.
    fn validate(&self, event: &CanonicalEvent) -> Result<(), ValidationError>;
}

/// An ordered list of validators run in sequence against a normalized event.
pub struct ValidatorChain {
    entries: Vec<Box<dyn Validator>>,
}

impl ValidatorChain {
    /// An empty chain.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append a validator. Order fixes execution order.
    pub fn register(mut self, validator: Box<dyn Validator>) -> Self {
        self.entries.push(validator);
        self
    }

    /// Run every validator that applies to `event.class`, in order, aborting
    /// on the first failure.
    pub fn validate(&self, event: &CanonicalEvent) -> Result<(), ValidationError> {
        for validator in &self.entries {
            if validator.supports(&event.class) {
                validator.validate(event)?;
            }
        }
        Ok(())
    }
}

impl Default for ValidatorChain {
    fn default() -> Self {
        Self::new()
    }
}
