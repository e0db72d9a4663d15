//! Crate facade (spec §6): `Engine` is the single entry point an embedding
//! application constructs once at startup, registers capabilities against,
//! then drives with one `process_vector_set` call per downloaded vector
//! set — replacing the source's `amvp_create_test_session`/`amvp_free_test_session`
//! pair with ordinary construction and `Drop`, the way `api.rs`'s
//! `ProverBuilder`/`VerifierBuilder` wrap the teacher's lower-level
//! proving/verifying primitives behind an ergonomic facade.

use crate::catalog::resolve_algorithm_id;
use crate::dispatch::Dispatcher;
use crate::error::{AmvpError, Result};
use crate::registry::Registry;
use crate::response::ResponseBuilder;
use serde_json::Value;

/// The upload/download round trip an embedder drives to exchange vector
/// sets with a server. The core engine never implements this itself —
/// kept as a seam the way `scheduler::Prover` stays decoupled from the
/// binary that calls it over HTTP.
pub trait Transport {
    fn download_vector_set(&self, vs_id: u64) -> Result<String>;
    fn upload_response(&self, vs_id: u64, response: &str) -> Result<()>;
}

/// The crate's facade: owns the capability registry and the algorithm
/// dispatch table.
pub struct Engine {
    registry: Registry,
    dispatcher: Dispatcher,
}

impl Engine {
    pub fn new() -> Self {
        Engine { registry: Registry::new(), dispatcher: Dispatcher::new() }
    }

    /// Mutable access to the registry for capability registration. Once
    /// [`Engine::registration_json`] has been called the registry is
    /// sealed and further mutation fails (spec §5).
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Serialize the registration message, sealing the registry against
    /// further mutation as a side effect (spec §4.3, §5).
    pub fn registration_json(&mut self) -> Result<String> {
        self.registry.seal();
        let json = crate::registry::serialize::to_registration_json(&self.registry);
        serde_json::to_string(&json).map_err(|e| AmvpError::MalformedJson(e.to_string()))
    }

    /// Parse one downloaded vector set, dispatch every test group to its
    /// family handler, and serialize the response envelope.
    pub fn process_vector_set(&self, input: &str) -> Result<String> {
        let vector_set: Value = serde_json::from_str(input).map_err(|e| AmvpError::MalformedJson(e.to_string()))?;
        let algorithm = vector_set
            .get("algorithm")
            .and_then(Value::as_str)
            .ok_or_else(|| AmvpError::MalformedJson("vector set missing `algorithm`".into()))?;
        let mode = vector_set.get("mode").and_then(Value::as_str);
        // spec §4.5 step 1: missing or unknown (algorithm, mode) is a
        // malformed vector set, not an invalid-argument from a known one.
        let alg_id = resolve_algorithm_id(algorithm, mode)
            .map_err(|_| AmvpError::MalformedJson(format!("unknown algorithm/mode pair ({algorithm}, {mode:?})")))?;

        let groups = self.dispatcher.dispatch(&self.registry, &vector_set)?;
        let mut builder = ResponseBuilder::new(alg_id);
        builder.extend(groups);

        serde_json::to_string(&builder.finish()).map_err(|e| AmvpError::MalformedJson(e.to_string()))
    }

    /// Release any in-flight Monte-Carlo state. A no-op today — every MCT
    /// chain's [`crate::handlers::sym::mct::McrState`] is scoped to a single
    /// `run_mct` call rather than stored on `Engine` — kept as an explicit
    /// lifecycle hook mirroring `app_aes_cleanup()` for embedders that
    /// expect to call it between vector sets regardless.
    pub fn mct_cleanup(&mut self) {}
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AlgorithmId;
    use crate::handlers::{TcField, TestCaseIo};
    use crate::registry::CryptoCallback;
    use std::sync::Arc;

    struct Echo;
    impl CryptoCallback for Echo {
        fn invoke(&self, tc: &mut dyn TestCaseIo) -> crate::error::Result<()> {
            if let Some(pt) = tc.get_bytes(TcField::Pt) {
                let ct = pt.to_vec();
                tc.set_bytes(TcField::Ct, ct);
            }
            Ok(())
        }
    }

    #[test]
    fn process_vector_set_round_trip() {
        let mut engine = Engine::new();
        engine.registry_mut().enable(AlgorithmId::AesEcb, Arc::new(Echo)).unwrap();

        let input = serde_json::json!({
            "algorithm": "AES",
            "mode": "ECB",
            "testGroups": [{
                "tgId": 1,
                "direction": "encrypt",
                "tests": [{ "tcId": 1, "key": "00".repeat(16), "pt": "deadbeef" }],
            }],
        })
        .to_string();

        let output = engine.process_vector_set(&input).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["testGroups"][0]["tests"][0]["ct"], Value::String("deadbeef".into()));
    }

    #[test]
    fn registration_json_seals_registry() {
        let mut engine = Engine::new();
        engine.registry_mut().enable(AlgorithmId::AesGcm, Arc::new(Echo)).unwrap();
        engine.registration_json().unwrap();
        let err = engine.registry_mut().enable(AlgorithmId::AesCcm, Arc::new(Echo)).unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn unregistered_algorithm_is_no_cap() {
        let engine = Engine::new();
        let input = serde_json::json!({ "algorithm": "AES", "mode": "GCM", "testGroups": [] }).to_string();
        let err = engine.process_vector_set(&input).unwrap_err();
        assert!(matches!(err, AmvpError::NoCap(_)));
    }
}
