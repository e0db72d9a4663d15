//! CMAC handler (spec §4.6.d). Reuses [`crate::handlers::hmac::MacTc`] and
//! [`crate::handlers::hmac::HmacHandler`]'s run loop verbatim — CMAC and
//! HMAC differ only in the operator callback registered against the
//! algorithm, not in test-case shape or MAC-truncation handling.

pub use crate::handlers::hmac::{HmacHandler as CmacHandler, MacTc};
