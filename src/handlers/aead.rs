//! AES-GCM/CCM handler (spec §4.6.b).
//!
//! `app_aes.c` explicitly rejects GCM/CCM/XPN/GMAC from its plain-cipher
//! switch, which is read here as confirmation that AEAD belongs in a
//! separate family from [`crate::handlers::sym`] rather than as more modes
//! on the same handler.

use crate::catalog::AlgorithmId;
use crate::codec::bytes_to_hex;
use crate::error::{AmvpError, Result};
use crate::handlers::{optional_hex, require_hex, require_id, require_str, Direction, IvGenSource, TcField, TestCase, TestCaseIo, TestGroupHandler, MAX_BUF_LEN};
use crate::registry::Capability;
use rand::RngCore;
use serde_json::{json, Value};

/// One AEAD test case (spec §3 "TestCase::Aead").
#[derive(Default)]
pub struct AeadTc {
    pub direction: Option<Direction>,
    pub key: Vec<u8>,
    pub iv: Vec<u8>,
    pub aad: Vec<u8>,
    pub pt: Vec<u8>,
    pub ct: Vec<u8>,
    pub tag: Vec<u8>,
    /// Decrypt-direction outcome: `None` until the callback reports it.
    /// `Some(false)` means authentication failed (spec §4.6.b: a failed
    /// decrypt is reported as `testPassed: false`, not as an engine error).
    pub auth_ok: Option<bool>,
}

impl TestCaseIo for AeadTc {
    fn get_bytes(&self, field: TcField) -> Option<&[u8]> {
        match field {
            TcField::Key => Some(&self.key),
            TcField::Iv => Some(&self.iv),
            TcField::Aad => Some(&self.aad),
            TcField::Pt => Some(&self.pt),
            TcField::Ct => Some(&self.ct),
            TcField::Tag => Some(&self.tag),
            _ => None,
        }
    }

    fn set_bytes(&mut self, field: TcField, value: Vec<u8>) {
        match field {
            TcField::Pt => self.pt = value,
            TcField::Ct => self.ct = value,
            TcField::Tag => self.tag = value,
            TcField::Iv => self.iv = value,
            _ => {}
        }
    }

    fn get_int(&self, _field: TcField) -> Option<i64> {
        None
    }

    fn set_int(&mut self, _field: TcField, _value: i64) {}

    fn get_bool(&self, field: TcField) -> Option<bool> {
        match field {
            TcField::Success => self.auth_ok,
            _ => None,
        }
    }

    fn set_bool(&mut self, field: TcField, value: bool) {
        if field == TcField::Success {
            self.auth_ok = Some(value);
        }
    }
}

/// Handler for [`Capability::Aead`] (AES-GCM, AES-CCM).
pub struct AeadHandler {
    pub alg_id: AlgorithmId,
}

impl TestGroupHandler for AeadHandler {
    fn run(&self, capability: &Capability, groups: &[Value]) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            let tg_id = require_id(group, "tgId")?;
            let direction = Direction::from_str(require_str(group, "direction")?)?;
            let ivgen = match group.get("ivGen").and_then(Value::as_str) {
                Some(s) => Some(IvGenSource::from_str(s)?),
                None => None,
            };
            let iv_len_bits = group.get("ivLen").and_then(Value::as_i64);

            let cases = group
                .get("tests")
                .and_then(Value::as_array)
                .ok_or_else(|| AmvpError::MalformedJson("test group missing `tests` array".into()))?;

            // AEAD AAD must be fed before the ciphertext for GCM, and CCM
            // requires the total plaintext length announced up front (spec
            // §4.6.b "Ordering") — both are operator-callback concerns, not
            // observable from this handler's JSON-in/JSON-out boundary, so
            // the ordering invariant is documented here rather than enforced.
            let mut tc_results = Vec::with_capacity(cases.len());
            for case in cases {
                let tc_id = require_id(case, "tcId")?;
                let key = require_hex(case, "key", MAX_BUF_LEN)?;
                let aad = optional_hex(case, "aad", MAX_BUF_LEN)?;

                // Internal IV generation only applies to the encrypt
                // direction (spec §4.6.b); decrypt always consumes the IV
                // the server already generated.
                let internal_gen = direction == Direction::Encrypt && ivgen == Some(IvGenSource::Internal);
                let iv = if internal_gen {
                    let iv_len_bytes = (iv_len_bits.unwrap_or(96) as usize) / 8;
                    let mut buf = vec![0u8; iv_len_bytes];
                    rand::thread_rng().fill_bytes(&mut buf);
                    buf
                } else {
                    require_hex(case, "iv", MAX_BUF_LEN)?
                };

                let mut tc = AeadTc { direction: Some(direction), key, iv, aad, ..Default::default() };
                match direction {
                    Direction::Encrypt => tc.pt = require_hex(case, "pt", MAX_BUF_LEN)?,
                    Direction::Decrypt => {
                        tc.ct = require_hex(case, "ct", MAX_BUF_LEN)?;
                        tc.tag = require_hex(case, "tag", MAX_BUF_LEN)?;
                    }
                }

                let mut wrapped = TestCase::Aead(tc);
                capability
                    .data()
                    .callback
                    .invoke(&mut wrapped)
                    .map_err(|e| AmvpError::CryptoModuleFail(e.to_string()))?;
                let TestCase::Aead(tc) = wrapped else { unreachable!() };

                let out = match direction {
                    Direction::Encrypt if internal_gen => json!({
                        "tcId": tc_id,
                        "iv": bytes_to_hex(&tc.iv),
                        "ct": bytes_to_hex(&tc.ct),
                        "tag": bytes_to_hex(&tc.tag),
                    }),
                    Direction::Encrypt => {
                        json!({ "tcId": tc_id, "ct": bytes_to_hex(&tc.ct), "tag": bytes_to_hex(&tc.tag) })
                    }
                    Direction::Decrypt => {
                        if tc.auth_ok.unwrap_or(false) {
                            json!({ "tcId": tc_id, "pt": bytes_to_hex(&tc.pt) })
                        } else {
                            json!({ "tcId": tc_id, "testPassed": false })
                        }
                    }
                };
                tc_results.push(out);
            }

            out.push(json!({ "tgId": tg_id, "tests": tc_results }));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CryptoCallback, Registry};
    use std::sync::Arc;

    struct FakeGcm;
    impl CryptoCallback for FakeGcm {
        fn invoke(&self, tc: &mut dyn TestCaseIo) -> Result<()> {
            match tc.get_bytes(TcField::Pt) {
                Some(pt) => {
                    let ct = pt.to_vec();
                    tc.set_bytes(TcField::Ct, ct);
                    tc.set_bytes(TcField::Tag, vec![0xaa; 16]);
                }
                None => {
                    tc.set_bytes(TcField::Pt, vec![0x41, 0x42]);
                    tc.set_bool(TcField::Success, true);
                }
            }
            Ok(())
        }
    }

    #[test]
    fn decrypt_failure_reports_test_passed_false() {
        struct AlwaysFail;
        impl CryptoCallback for AlwaysFail {
            fn invoke(&self, tc: &mut dyn TestCaseIo) -> Result<()> {
                tc.set_bool(TcField::Success, false);
                Ok(())
            }
        }
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::AesGcm, Arc::new(AlwaysFail)).unwrap();
        let cap = reg.lookup(AlgorithmId::AesGcm).unwrap();
        let handler = AeadHandler { alg_id: AlgorithmId::AesGcm };
        let groups = vec![json!({
            "tgId": 1,
            "direction": "decrypt",
            "tests": [{ "tcId": 1, "key": "00".repeat(16), "iv": "00".repeat(12), "ct": "deadbeef", "tag": "aa".repeat(16) }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        assert_eq!(out[0]["tests"][0]["testPassed"], json!(false));
    }

    #[test]
    fn encrypt_emits_ct_and_tag() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::AesGcm, Arc::new(FakeGcm)).unwrap();
        let cap = reg.lookup(AlgorithmId::AesGcm).unwrap();
        let handler = AeadHandler { alg_id: AlgorithmId::AesGcm };
        let groups = vec![json!({
            "tgId": 1,
            "direction": "encrypt",
            "tests": [{ "tcId": 1, "key": "00".repeat(16), "iv": "00".repeat(12), "pt": "deadbeef" }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        assert_eq!(out[0]["tests"][0]["ct"], json!("deadbeef"));
        assert_eq!(out[0]["tests"][0]["tag"], json!("aa".repeat(16)));
    }

    #[test]
    fn internal_iv_gen_emits_generated_iv_without_requiring_one_on_input() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::AesGcm, Arc::new(FakeGcm)).unwrap();
        let cap = reg.lookup(AlgorithmId::AesGcm).unwrap();
        let handler = AeadHandler { alg_id: AlgorithmId::AesGcm };
        let groups = vec![json!({
            "tgId": 1,
            "direction": "encrypt",
            "ivGen": "internal",
            "ivLen": 96,
            "tests": [{ "tcId": 1, "key": "00".repeat(16), "pt": "deadbeef" }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        let iv = out[0]["tests"][0]["iv"].as_str().unwrap();
        assert_eq!(iv.len(), 24);
        assert_eq!(out[0]["tests"][0]["ct"], json!("deadbeef"));
    }

    #[test]
    fn external_iv_gen_requires_iv_on_input_and_does_not_echo_it() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::AesGcm, Arc::new(FakeGcm)).unwrap();
        let cap = reg.lookup(AlgorithmId::AesGcm).unwrap();
        let handler = AeadHandler { alg_id: AlgorithmId::AesGcm };
        let groups = vec![json!({
            "tgId": 1,
            "direction": "encrypt",
            "ivGen": "external",
            "tests": [{ "tcId": 1, "key": "00".repeat(16), "iv": "00".repeat(12), "pt": "deadbeef" }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        assert!(out[0]["tests"][0].get("iv").is_none());
    }
}
