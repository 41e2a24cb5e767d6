//! Concrete [`crate::Validator`] implementations (§4.G).

mod base;
mod classes;

pub use base::BaseValidator;
pub use classes::{
    AuthenticationValidator, DnsActivityValidator, FileActivityValidator, NetworkActivityValidator,
    ProcessActivityValidator,
};

use crate::validator::ValidatorChain;

/// Build the chain: the basic validator first, then each class-specific
/// validator. Order among the class validators doesn't matter since each
/// only runs for its own class, but the basic validator must run first so a
/// structurally broken event is rejected before a class validator has to
/// reason about it.
pub fn default_chain() -> ValidatorChain {
    ValidatorChain::new()
        .register(Box::new(BaseValidator))
        .register(Box::new(AuthenticationValidator))
        .register(Box::new(NetworkActivityValidator))
        .register(Box::new(DnsActivityValidator))
        .register(Box::new(FileActivityValidator))
        .register(Box::new(ProcessActivityValidator))
}
