//! Crate root: public surface of the AMVP vector-set processing engine.
//!
//! This module is the single canonical entry point for downstream users.
//! An embedding application constructs an [`engine::Engine`], registers its
//! capabilities against `engine::Engine::registry_mut`, serializes the
//! registration message once with `registration_json`, then calls
//! `process_vector_set` once per downloaded vector set for the lifetime of
//! the session.
//!
//! ## Invariants
//!
//! - Single-threaded, synchronous; no internal suspension points. An
//!   embedder driving several sessions concurrently gives each its own
//!   [`engine::Engine`] (and therefore its own [`registry::Registry`]
//!   snapshot) rather than sharing one across threads.
//! - The capability registry is append-only until sealed; sealing happens
//!   automatically the first time the registration message is serialized.
//! - Every hex-decoded buffer is bounded by a family-specific maximum
//!   before allocation (`codec::hex_to_bytes`), so a hostile or malformed
//!   length field cannot force an unbounded allocation.
//! - We forbid unsafe throughout the crate.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

/// Hex/base64 codec utilities and constant-time buffer comparison.
pub mod codec;
/// Algorithm/mode/curve/hash string catalog.
pub mod catalog;
/// Vector-set dispatcher: resolves `(algorithm, mode)` to a family handler.
pub mod dispatch;
/// Crate-wide error taxonomy.
pub mod error;
/// Facade: `Engine`, the crate's single entry point.
pub mod engine;
/// Per-family test-case handlers.
pub mod handlers;
/// Capability registry and registration-message serializer.
pub mod registry;
/// Response envelope assembler.
pub mod response;

pub use engine::{Engine, Transport};
pub use error::{AmvpError, Result};
pub use registry::{CryptoCallback, Registry};
