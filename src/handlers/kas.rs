//! KAS-FFC-SSC / KAS-ECC-SSC handler (supplemental family, grounded on
//! `test_amvp_kas_ffc.c`'s capability registration shape — shared-secret
//! computation only, no key-confirmation wrapping).

use crate::catalog::{hash_from_str, AlgorithmId};
use crate::codec::bytes_to_hex;
use crate::error::{AmvpError, Result};
use crate::handlers::{require_hex, require_id, require_str, TcField, TestCase, TestCaseIo, TestGroupHandler, MAX_BUF_LEN};
use crate::registry::Capability;
use serde_json::{json, Value};

/// One KAS shared-secret-computation test case (spec §3 "TestCase::Kas").
#[derive(Default)]
pub struct KasTc {
    pub ephemeral_private: Vec<u8>,
    pub peer_public: Vec<u8>,
    pub z: Vec<u8>,
}

impl TestCaseIo for KasTc {
    fn get_bytes(&self, field: TcField) -> Option<&[u8]> {
        match field {
            TcField::D => Some(&self.ephemeral_private),
            TcField::QX => Some(&self.peer_public),
            TcField::Z => Some(&self.z),
            _ => None,
        }
    }

    fn set_bytes(&mut self, field: TcField, value: Vec<u8>) {
        if field == TcField::Z {
            self.z = value;
        }
    }

    fn get_int(&self, _field: TcField) -> Option<i64> {
        None
    }

    fn set_int(&mut self, _field: TcField, _value: i64) {}

    fn get_bool(&self, _field: TcField) -> Option<bool> {
        None
    }

    fn set_bool(&mut self, _field: TcField, _value: bool) {}
}

pub struct KasHandler {
    pub alg_id: AlgorithmId,
}

impl TestGroupHandler for KasHandler {
    fn run(&self, capability: &Capability, groups: &[Value]) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            let tg_id = require_id(group, "tgId")?;
            let _hash = match group.get("hashAlg").and_then(Value::as_str) {
                Some(s) => Some(hash_from_str(s)?),
                None => None,
            };

            let cases = group
                .get("tests")
                .and_then(Value::as_array)
                .ok_or_else(|| AmvpError::MalformedJson("test group missing `tests` array".into()))?;

            let mut tc_results = Vec::with_capacity(cases.len());
            for case in cases {
                let tc_id = require_id(case, "tcId")?;
                let ephemeral_private = require_hex(case, "ephemeralPrivate", MAX_BUF_LEN)?;
                let peer_public = require_hex(case, "peerPublic", MAX_BUF_LEN)?;

                let tc = KasTc { ephemeral_private, peer_public, z: Vec::new() };
                let mut wrapped = TestCase::Kas(tc);
                capability
                    .data()
                    .callback
                    .invoke(&mut wrapped)
                    .map_err(|e| AmvpError::CryptoModuleFail(e.to_string()))?;
                let TestCase::Kas(tc) = wrapped else { unreachable!() };

                tc_results.push(json!({ "tcId": tc_id, "z": bytes_to_hex(&tc.z) }));
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

    struct FixedZ;
    impl CryptoCallback for FixedZ {
        fn invoke(&self, tc: &mut dyn TestCaseIo) -> Result<()> {
            tc.set_bytes(TcField::Z, vec![0x5a; 32]);
            Ok(())
        }
    }

    #[test]
    fn computes_shared_secret() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::KasFfcSsc, Arc::new(FixedZ)).unwrap();
        let cap = reg.lookup(AlgorithmId::KasFfcSsc).unwrap();
        let handler = KasHandler { alg_id: AlgorithmId::KasFfcSsc };
        let groups = vec![json!({
            "tgId": 1,
            "tests": [{ "tcId": 1, "ephemeralPrivate": "00", "peerPublic": "00" }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        assert_eq!(out[0]["tests"][0]["z"], json!("5a".repeat(32)));
    }
}
