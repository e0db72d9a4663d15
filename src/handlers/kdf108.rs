//! KDF108 handler (supplemental family): counter, feedback, and
//! double-pipeline-iteration constructions over a MAC primitive.

use crate::catalog::{counter_location_from_str, kdf108_mode_from_str, mac_mode_from_str, AlgorithmId};
use crate::codec::bytes_to_hex;
use crate::error::{AmvpError, Result};
use crate::handlers::{optional_hex, require_hex, require_id, require_int, TcField, TestCase, TestCaseIo, TestGroupHandler, MAX_BUF_LEN};
use crate::registry::Capability;
use serde_json::{json, Value};

/// One KDF108 test case (spec §3 "TestCase::Kdf108").
#[derive(Default)]
pub struct Kdf108Tc {
    pub key_in: Vec<u8>,
    pub fixed_data: Vec<u8>,
    pub iv: Vec<u8>,
    pub key_out_len_bits: i64,
    pub key_out: Vec<u8>,
}

impl TestCaseIo for Kdf108Tc {
    fn get_bytes(&self, field: TcField) -> Option<&[u8]> {
        match field {
            TcField::KeyIn => Some(&self.key_in),
            TcField::FixedData => Some(&self.fixed_data),
            TcField::Iv => Some(&self.iv),
            TcField::KeyOut => Some(&self.key_out),
            _ => None,
        }
    }

    fn set_bytes(&mut self, field: TcField, value: Vec<u8>) {
        if field == TcField::KeyOut {
            self.key_out = value;
        }
    }

    fn get_int(&self, field: TcField) -> Option<i64> {
        match field {
            TcField::L => Some(self.key_out_len_bits),
            _ => None,
        }
    }

    fn set_int(&mut self, _field: TcField, _value: i64) {}

    fn get_bool(&self, _field: TcField) -> Option<bool> {
        None
    }

    fn set_bool(&mut self, _field: TcField, _value: bool) {}
}

pub struct Kdf108Handler;

impl TestGroupHandler for Kdf108Handler {
    fn run(&self, capability: &Capability, groups: &[Value]) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            let tg_id = require_id(group, "tgId")?;
            let _mode = kdf108_mode_from_str(crate::handlers::require_str(group, "kdfMode")?)?;
            let _mac_mode = mac_mode_from_str(crate::handlers::require_str(group, "macMode")?)?;
            let _counter_location = counter_location_from_str(crate::handlers::require_str(group, "counterLocation")?)?;

            let cases = group
                .get("tests")
                .and_then(Value::as_array)
                .ok_or_else(|| AmvpError::MalformedJson("test group missing `tests` array".into()))?;

            let mut tc_results = Vec::with_capacity(cases.len());
            for case in cases {
                let tc_id = require_id(case, "tcId")?;
                let key_in = require_hex(case, "keyIn", MAX_BUF_LEN)?;
                let fixed_data = optional_hex(case, "fixedData", MAX_BUF_LEN)?;
                let iv = optional_hex(case, "iv", MAX_BUF_LEN)?;
                let key_out_len_bits = require_int(case, "keyOutLength")?;

                let tc = Kdf108Tc { key_in, fixed_data, iv, key_out_len_bits, key_out: Vec::new() };
                let mut wrapped = TestCase::Kdf108(tc);
                capability
                    .data()
                    .callback
                    .invoke(&mut wrapped)
                    .map_err(|e| AmvpError::CryptoModuleFail(e.to_string()))?;
                let TestCase::Kdf108(tc) = wrapped else { unreachable!() };

                tc_results.push(json!({ "tcId": tc_id, "keyOut": bytes_to_hex(&tc.key_out) }));
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

    struct FixedKdf;
    impl CryptoCallback for FixedKdf {
        fn invoke(&self, tc: &mut dyn TestCaseIo) -> Result<()> {
            tc.set_bytes(TcField::KeyOut, vec![0x11; 16]);
            Ok(())
        }
    }

    #[test]
    fn derives_key_material() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::Kdf108, Arc::new(FixedKdf)).unwrap();
        let cap = reg.lookup(AlgorithmId::Kdf108).unwrap();
        let handler = Kdf108Handler;
        let groups = vec![json!({
            "tgId": 1,
            "kdfMode": "counter",
            "macMode": "HMAC-SHA2-256",
            "counterLocation": "before fixed data",
            "tests": [{ "tcId": 1, "keyIn": "00".repeat(32), "fixedData": "00", "keyOutLength": 128 }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        assert_eq!(out[0]["tests"][0]["keyOut"], json!("11".repeat(16)));
    }
}
