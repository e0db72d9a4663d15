//! ECDSA KeyGen/SigGen/SigVer handler (supplemental family, SPEC_FULL §4.6.g
//! — not present in `amvp_rsa_keygen.c` directly, but following the same
//! keygen/siggen/sigver three-way split that RSA and FFC/ECC KAS both use
//! in the original source's capability tables).

use crate::catalog::{curve_from_str, hash_from_str, AlgorithmId};
use crate::codec::bytes_to_hex;
use crate::error::{AmvpError, Result};
use crate::handlers::{optional_hex, require_hex, require_id, require_str, TcField, TestCase, TestCaseIo, TestGroupHandler, MAX_BUF_LEN};
use crate::registry::Capability;
use serde_json::{json, Value};

/// One ECDSA test case, covering all three operations; unused fields are
/// left empty for a given `op`.
#[derive(Default)]
pub struct EcdsaTc {
    pub op: EcdsaOp,
    pub message: Vec<u8>,
    pub qx: Vec<u8>,
    pub qy: Vec<u8>,
    pub d: Vec<u8>,
    pub r: Vec<u8>,
    pub s: Vec<u8>,
    pub sig_valid: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EcdsaOp {
    #[default]
    KeyGen,
    SigGen,
    SigVer,
}

impl TestCaseIo for EcdsaTc {
    fn get_bytes(&self, field: TcField) -> Option<&[u8]> {
        match field {
            TcField::Msg => Some(&self.message),
            TcField::QX => Some(&self.qx),
            TcField::QY => Some(&self.qy),
            TcField::D => Some(&self.d),
            TcField::R => Some(&self.r),
            TcField::S => Some(&self.s),
            _ => None,
        }
    }

    fn set_bytes(&mut self, field: TcField, value: Vec<u8>) {
        match field {
            TcField::QX => self.qx = value,
            TcField::QY => self.qy = value,
            TcField::D => self.d = value,
            TcField::R => self.r = value,
            TcField::S => self.s = value,
            _ => {}
        }
    }

    fn get_int(&self, _field: TcField) -> Option<i64> {
        None
    }

    fn set_int(&mut self, _field: TcField, _value: i64) {}

    fn get_bool(&self, field: TcField) -> Option<bool> {
        match field {
            TcField::Success => self.sig_valid,
            _ => None,
        }
    }

    fn set_bool(&mut self, field: TcField, value: bool) {
        if field == TcField::Success {
            self.sig_valid = Some(value);
        }
    }
}

pub struct EcdsaHandler {
    pub op: EcdsaOp,
}

impl TestGroupHandler for EcdsaHandler {
    fn run(&self, capability: &Capability, groups: &[Value]) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            let tg_id = require_id(group, "tgId")?;
            let _curve = curve_from_str(require_str(group, "curve")?)?;
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
                let mut tc = EcdsaTc { op: self.op, ..Default::default() };

                match self.op {
                    EcdsaOp::KeyGen => {}
                    EcdsaOp::SigGen => {
                        tc.message = require_hex(case, "message", MAX_BUF_LEN)?;
                    }
                    EcdsaOp::SigVer => {
                        tc.message = require_hex(case, "message", MAX_BUF_LEN)?;
                        tc.qx = require_hex(case, "qx", MAX_BUF_LEN)?;
                        tc.qy = require_hex(case, "qy", MAX_BUF_LEN)?;
                        tc.r = require_hex(case, "r", MAX_BUF_LEN)?;
                        tc.s = require_hex(case, "s", MAX_BUF_LEN)?;
                    }
                }
                let _ = optional_hex(case, "d", MAX_BUF_LEN)?; // unused by KeyGen/SigVer but tolerated if present

                let mut wrapped = TestCase::Ecdsa(tc);
                capability
                    .data()
                    .callback
                    .invoke(&mut wrapped)
                    .map_err(|e| AmvpError::CryptoModuleFail(e.to_string()))?;
                let TestCase::Ecdsa(tc) = wrapped else { unreachable!() };

                let out = match self.op {
                    EcdsaOp::KeyGen => json!({
                        "tcId": tc_id,
                        "qx": bytes_to_hex(&tc.qx),
                        "qy": bytes_to_hex(&tc.qy),
                        "d": bytes_to_hex(&tc.d),
                    }),
                    EcdsaOp::SigGen => json!({
                        "tcId": tc_id,
                        "r": bytes_to_hex(&tc.r),
                        "s": bytes_to_hex(&tc.s),
                    }),
                    EcdsaOp::SigVer => json!({ "tcId": tc_id, "testPassed": tc.sig_valid.unwrap_or(false) }),
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

    struct FixedVerify;
    impl CryptoCallback for FixedVerify {
        fn invoke(&self, tc: &mut dyn TestCaseIo) -> Result<()> {
            tc.set_bool(TcField::Success, true);
            Ok(())
        }
    }

    #[test]
    fn sig_ver_reports_test_passed() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::EcdsaSigVer, Arc::new(FixedVerify)).unwrap();
        let cap = reg.lookup(AlgorithmId::EcdsaSigVer).unwrap();
        let handler = EcdsaHandler { op: EcdsaOp::SigVer };
        let groups = vec![json!({
            "tgId": 1,
            "curve": "P-256",
            "hashAlg": "SHA2-256",
            "tests": [{ "tcId": 1, "message": "00", "qx": "00", "qy": "00", "r": "00", "s": "00" }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        assert_eq!(out[0]["tests"][0]["testPassed"], json!(true));
    }
}
