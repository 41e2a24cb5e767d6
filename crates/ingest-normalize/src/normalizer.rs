//! The Normalizer Registry (§4.F).
//!
//! Grounded on the teacher's kernel opcode registry (`toka-kernel::registry`):
//! an ordered collection of handlers, first-match dispatch, a `supports`
//! predicate ahead of the actual handling call. The teacher keeps its
//! registry behind a global `Lazy<RwLock<HashMap>>` so any crate can register
//! a handler from its own `init()`. That's exactly the hidden global state
//! this system's design notes call out to avoid: this registry is instead an
//! explicit, ordered `Vec` owned by whoever builds the [`Pipeline`], built
//! once at startup from a fixed list of normalizers.
//!
//! [`Pipeline`]: crate::Pipeline

use ingest_types::{CanonicalEvent, RawEnvelope};

use crate::error::NormalizeError;

/// A single normalizer: claims envelopes by format/source-type pattern and
/// turns a claimed envelope into a canonical event.
pub trait Normalizer: Send + Sync {
    /// A short name for logging and the registry's `find` trace.
    fn name(&self) -> &'static str;

    /// Whether this normalizer claims envelopes with this format/source-type.
    fn supports(&self, format: &str, source_type: &str) -> bool;

    /// Produce a canonical event from a claimed envelope.
    fn normalize(&self, envelope: &RawEnvelope) -> Result<CanonicalEvent, NormalizeError>;
}

/// An ordered list of normalizers. `find` returns the first entry whose
/// `supports` predicate matches; ties (two normalizers that would both claim
/// an envelope) are broken by insertion order, so registration order is
/// priority order (§4.F).
pub struct NormalizerRegistry {
    entries: Vec<Box<dyn Normalizer>>,
}

impl NormalizerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append a normalizer. Order of calls fixes dispatch priority.
    pub fn register(mut self, normalizer: Box<dyn Normalizer>) -> Self {
        self.entries.push(normalizer);
        self
    }

    /// The first normalizer claiming `(format, source_type)`, if any.
    pub fn find(&self, format: &str, source_type: &str) -> Option<&dyn Normalizer> {
        self.entries.iter().find(|n| n.supports(format, source_type)).map(AsRef::as_ref)
    }
}

impl Default for NormalizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizers::{HecFallbackNormalizer, OcsfPassthroughNormalizer};

    #[test]
    fn first_match_wins_over_later_registrations() {
        let registry = NormalizerRegistry::new()
            .register(Box::new(OcsfPassthroughNormalizer))
            .register(Box::new(HecFallbackNormalizer));

        let found = registry.find("json", "ocsf:authentication").unwrap();
        assert_eq!(found.name(), "ocsf_passthrough");
    }

    #[test]
    fn fallback_catches_unmatched_json() {
        let registry =
            NormalizerRegistry::new().register(Box::new(OcsfPassthroughNormalizer)).register(Box::new(HecFallbackNormalizer));

        let found = registry.find("json", "myapp:custom").unwrap();
        assert_eq!(found.name(), "hec_fallback");
    }

    #[test]
    fn no_match_returns_none() {
        let registry = NormalizerRegistry::new().register(Box::new(OcsfPassthroughNormalizer));
        assert!(registry.find("xml", "myapp:custom").is_none());
    }
}
