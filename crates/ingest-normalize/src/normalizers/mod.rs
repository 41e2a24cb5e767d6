//! Concrete [`crate::Normalizer`] implementations (§4.F).

mod classes;
mod hec_fallback;
mod ocsf_passthrough;
mod support;

pub use classes::{
    AuthenticationNormalizer, DnsActivityNormalizer, FileActivityNormalizer, NetworkActivityNormalizer,
    ProcessActivityNormalizer,
};
pub use hec_fallback::HecFallbackNormalizer;
pub use ocsf_passthrough::OcsfPassthroughNormalizer;

use crate::normalizer::NormalizerRegistry;

/// Build the registry in priority order: OCSF passthrough, then the
/// class-specific normalizers, then the HEC fallback last (§4.F).
pub fn default_registry() -> NormalizerRegistry {
    NormalizerRegistry::new()
        .register(Box::new(OcsfPassthroughNormalizer))
        .register(Box::new(AuthenticationNormalizer))
        .register(Box::new(NetworkActivityNormalizer))
        .register(Box::new(DnsActivityNormalizer))
        .register(Box::new(FileActivityNormalizer))
        .register(Box::new(ProcessActivityNormalizer))
        .register(Box::new(HecFallbackNormalizer))
}
