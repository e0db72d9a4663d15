//! AES-KW/KWP handler (spec §4.6.c): deterministic authenticated key wrap,
//! no IV on the wire (KW uses the fixed default, KWP derives its own).

use crate::catalog::AlgorithmId;
use crate::codec::bytes_to_hex;
use crate::error::{AmvpError, Result};
use crate::handlers::{require_hex, require_id, require_str, Direction, TcField, TestCase, TestCaseIo, TestGroupHandler, MAX_BUF_LEN};
use crate::registry::Capability;
use serde_json::{json, Value};

/// One AES key-wrap test case (spec §3 "TestCase::KeyWrap").
#[derive(Default)]
pub struct KeyWrapTc {
    pub direction: Option<Direction>,
    pub kek: Vec<u8>,
    pub pt: Vec<u8>,
    pub ct: Vec<u8>,
    /// Unwrap-direction integrity-check outcome.
    pub integrity_ok: Option<bool>,
}

impl TestCaseIo for KeyWrapTc {
    fn get_bytes(&self, field: TcField) -> Option<&[u8]> {
        match field {
            TcField::Key => Some(&self.kek),
            TcField::Pt => Some(&self.pt),
            TcField::Ct => Some(&self.ct),
            _ => None,
        }
    }

    fn set_bytes(&mut self, field: TcField, value: Vec<u8>) {
        match field {
            TcField::Pt => self.pt = value,
            TcField::Ct => self.ct = value,
            _ => {}
        }
    }

    fn get_int(&self, _field: TcField) -> Option<i64> {
        None
    }

    fn set_int(&mut self, _field: TcField, _value: i64) {}

    fn get_bool(&self, field: TcField) -> Option<bool> {
        match field {
            TcField::Success => self.integrity_ok,
            _ => None,
        }
    }

    fn set_bool(&mut self, field: TcField, value: bool) {
        if field == TcField::Success {
            self.integrity_ok = Some(value);
        }
    }
}

pub struct KeyWrapHandler {
    pub alg_id: AlgorithmId,
}

impl TestGroupHandler for KeyWrapHandler {
    fn run(&self, capability: &Capability, groups: &[Value]) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            let tg_id = require_id(group, "tgId")?;
            let direction = Direction::from_str(require_str(group, "direction")?)?;

            let cases = group
                .get("tests")
                .and_then(Value::as_array)
                .ok_or_else(|| AmvpError::MalformedJson("test group missing `tests` array".into()))?;

            let mut tc_results = Vec::with_capacity(cases.len());
            for case in cases {
                let tc_id = require_id(case, "tcId")?;
                let kek = require_hex(case, "key", MAX_BUF_LEN)?;

                let mut tc = KeyWrapTc { direction: Some(direction), kek, ..Default::default() };
                match direction {
                    Direction::Encrypt => tc.pt = require_hex(case, "pt", MAX_BUF_LEN)?,
                    Direction::Decrypt => tc.ct = require_hex(case, "ct", MAX_BUF_LEN)?,
                }

                let mut wrapped = TestCase::KeyWrap(tc);
                capability
                    .data()
                    .callback
                    .invoke(&mut wrapped)
                    .map_err(|e| AmvpError::CryptoModuleFail(e.to_string()))?;
                let TestCase::KeyWrap(tc) = wrapped else { unreachable!() };

                let out = match direction {
                    Direction::Encrypt => json!({ "tcId": tc_id, "ct": bytes_to_hex(&tc.ct) }),
                    Direction::Decrypt => {
                        if tc.integrity_ok.unwrap_or(true) {
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
