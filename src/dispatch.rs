//! Vector-set dispatcher (spec §4.5): selects the [`TestGroupHandler`] for
//! an incoming vector set's `(algorithm, mode)` pair and hands it the
//! matched [`Capability`].
//!
//! Grounded on `scheduler.rs`'s orchestration role in the teacher crate —
//! here the "stages" are algorithm families rather than proving phases,
//! but the shape (one lookup table, one dispatch call per unit of work)
//! is the same.

use crate::catalog::{resolve_algorithm_id, AlgorithmId};
use crate::error::{AmvpError, Result};
use crate::handlers::{self, TestGroupHandler};
use crate::registry::Registry;
use serde_json::Value;

/// Maps every registered [`AlgorithmId`] to its family handler.
pub struct Dispatcher {
    handlers: std::collections::HashMap<AlgorithmId, Box<dyn TestGroupHandler>>,
}

impl Dispatcher {
    /// Build the full handler table. Every [`AlgorithmId`] variant must be
    /// present; a lookup miss at dispatch time means this table is out of
    /// sync with [`crate::catalog::AlgorithmId`], which is a programming
    /// error, not a protocol one.
    pub fn new() -> Self {
        use AlgorithmId::*;
        let mut handlers: std::collections::HashMap<AlgorithmId, Box<dyn TestGroupHandler>> = std::collections::HashMap::new();

        for alg_id in [
            AesEcb, AesCbc, AesCbcCs1, AesCbcCs2, AesCbcCs3, AesCfb1, AesCfb8, AesCfb128, AesOfb, AesCtr, AesXts,
            TdesEcb, TdesCbc, TdesCfb1, TdesCfb8, TdesCfb64, TdesOfb,
        ] {
            handlers.insert(alg_id, Box::new(handlers::sym::SymCipherHandler { alg_id }));
        }
        for alg_id in [AesGcm, AesCcm] {
            handlers.insert(alg_id, Box::new(handlers::aead::AeadHandler { alg_id }));
        }
        for alg_id in [AesKw, AesKwp] {
            handlers.insert(alg_id, Box::new(handlers::keywrap::KeyWrapHandler { alg_id }));
        }
        for alg_id in [HmacSha1, HmacSha2_224, HmacSha2_256, HmacSha2_384, HmacSha2_512] {
            handlers.insert(alg_id, Box::new(handlers::hmac::HmacHandler { alg_id }));
        }
        for alg_id in [CmacAes, CmacTdes] {
            handlers.insert(alg_id, Box::new(handlers::cmac::CmacHandler { alg_id }));
        }
        handlers.insert(RsaKeyGen, Box::new(handlers::rsa_keygen::RsaKeyGenHandler));
        handlers.insert(EcdsaKeyGen, Box::new(handlers::ecdsa::EcdsaHandler { op: handlers::ecdsa::EcdsaOp::KeyGen }));
        handlers.insert(EcdsaSigGen, Box::new(handlers::ecdsa::EcdsaHandler { op: handlers::ecdsa::EcdsaOp::SigGen }));
        handlers.insert(EcdsaSigVer, Box::new(handlers::ecdsa::EcdsaHandler { op: handlers::ecdsa::EcdsaOp::SigVer }));
        for alg_id in [KdaHkdf, KdaOneStep, KdaTwoStep] {
            handlers.insert(alg_id, Box::new(handlers::kda::KdaHandler { alg_id }));
        }
        handlers.insert(KasFfcSsc, Box::new(handlers::kas::KasHandler { alg_id: KasFfcSsc }));
        handlers.insert(KasEccSsc, Box::new(handlers::kas::KasHandler { alg_id: KasEccSsc }));
        handlers.insert(Kdf108, Box::new(handlers::kdf108::Kdf108Handler));

        Dispatcher { handlers }
    }

    /// Resolve the `(algorithm, mode)` wrapper fields, confirm a capability
    /// is registered, and run its handler over `testGroups`.
    pub fn dispatch(&self, registry: &Registry, vector_set: &Value) -> Result<Vec<Value>> {
        let algorithm = vector_set
            .get("algorithm")
            .and_then(Value::as_str)
            .ok_or_else(|| AmvpError::MalformedJson("vector set missing `algorithm`".into()))?;
        let mode = vector_set.get("mode").and_then(Value::as_str);
        // spec §4.5 step 1: missing or unknown (algorithm, mode) is a
        // malformed vector set, not an invalid-argument from a known one.
        let alg_id = resolve_algorithm_id(algorithm, mode)
            .map_err(|_| AmvpError::MalformedJson(format!("unknown algorithm/mode pair ({algorithm}, {mode:?})")))?;

        let capability = registry.lookup(alg_id).ok_or_else(|| AmvpError::NoCap(alg_id.to_string()))?;
        let groups = vector_set
            .get("testGroups")
            .and_then(Value::as_array)
            .ok_or_else(|| AmvpError::MalformedJson("vector set missing `testGroups`".into()))?;

        let handler = self
            .handlers
            .get(&alg_id)
            .ok_or_else(|| AmvpError::UnsupportedOp(format!("no handler registered for {alg_id}")))?;

        handler.run(capability, groups)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new()
    }
}
