//! AES/TDES block-cipher handler (spec §4.6.a): ECB, CBC (plus ciphertext-
//! stealing variants CS1/CS2/CS3), CFB1/CFB8/CFB128, OFB, CTR, and XTS,
//! for both AFT/AAT single-block tests and MCT chains.
//!
//! Grounded on `app_aes.c`: the source derives a cipher name from keylen
//! and mode string (`"AES-128-CBC"` etc.) and passes it to one
//! `EVP_CipherInit_ex`/`EVP_CipherUpdate`/`EVP_CipherFinal_ex` sequence;
//! here the mode and key length are instead carried directly on
//! [`SymCipherTc`] and left to the operator callback to interpret, since
//! this crate has no OpenSSL binding of its own (spec §6 operator
//! callback ABI).

use crate::catalog::AlgorithmId;
use crate::codec::bytes_to_hex;
use crate::error::{AmvpError, Result};
use crate::handlers::sym::mct::{McrGuard, McrState, MCT_INNER_ITERATIONS};
use crate::handlers::{require_hex, require_id, require_str, Direction, TcField, TestCase, TestCaseIo, TestGroupHandler, MAX_BUF_LEN};
use crate::registry::{Capability, ParamId};
use serde_json::{json, Value};

pub mod mct;

/// One symmetric block-cipher test case (spec §3 "TestCase::SymCipher").
#[derive(Default)]
pub struct SymCipherTc {
    pub direction: Option<Direction>,
    pub key: Vec<u8>,
    pub iv: Vec<u8>,
    pub tweak: Vec<u8>,
    pub pt: Vec<u8>,
    pub ct: Vec<u8>,
}

impl TestCaseIo for SymCipherTc {
    fn get_bytes(&self, field: TcField) -> Option<&[u8]> {
        match field {
            TcField::Key => Some(&self.key),
            TcField::Iv => Some(&self.iv),
            TcField::Tweak => Some(&self.tweak),
            TcField::Pt => Some(&self.pt),
            TcField::Ct => Some(&self.ct),
            _ => None,
        }
    }

    fn set_bytes(&mut self, field: TcField, value: Vec<u8>) {
        match field {
            TcField::Pt => self.pt = value,
            TcField::Ct => self.ct = value,
            TcField::Iv => self.iv = value,
            _ => {}
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

/// Handler for every registered [`Capability::SymCipher`] algorithm.
pub struct SymCipherHandler {
    pub alg_id: AlgorithmId,
}

impl TestGroupHandler for SymCipherHandler {
    fn run(&self, capability: &Capability, groups: &[Value]) -> Result<Vec<Value>> {
        let data = capability.data();
        let mut out = Vec::with_capacity(groups.len());

        for group in groups {
            let tg_id = require_id(group, "tgId")?;
            let direction = Direction::from_str(require_str(group, "direction")?)?;
            let key_len = group.get("keyLen").and_then(Value::as_i64);
            if let Some(kl) = key_len {
                if !data.permits(ParamId::KeyLen, kl) {
                    return Err(AmvpError::tc_invalid("keyLen", format!("{kl} not registered for {}", self.alg_id)));
                }
            }

            let cases = group
                .get("tests")
                .and_then(Value::as_array)
                .ok_or_else(|| AmvpError::MalformedJson("test group missing `tests` array".into()))?;

            let test_type = group.get("testType").and_then(Value::as_str).unwrap_or("AFT");
            let tc_results = if test_type == "MCT" {
                self.run_mct(capability, direction, cases)?
            } else {
                self.run_aft(capability, direction, cases)?
            };

            out.push(json!({ "tgId": tg_id, "tests": tc_results }));
        }

        Ok(out)
    }
}

impl SymCipherHandler {
    /// No padding is ever applied (spec §4.6.a: "Output length equals input
    /// length"), so the callback's reported output length must match the
    /// input it was given — except CFB1, whose bit-level granularity lets
    /// the byte-rounded length differ by up to 7 bits (spec §9 open
    /// question, resolved in SPEC_FULL.md §10 by making the mismatch
    /// observable rather than silently assumed).
    fn check_output_len(&self, input_len: usize, output_len: usize) -> Result<()> {
        let tolerance = match self.alg_id {
            AlgorithmId::AesCfb1 | AlgorithmId::TdesCfb1 => 1,
            _ => 0,
        };
        if input_len.abs_diff(output_len) > tolerance {
            return Err(AmvpError::tc_invalid(
                "ct/pt",
                format!("callback output length {output_len} does not match input length {input_len}"),
            ));
        }
        Ok(())
    }

    fn run_aft(&self, capability: &Capability, direction: Direction, cases: &[Value]) -> Result<Vec<Value>> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            let tc_id = require_id(case, "tcId")?;
            let key = require_hex(case, "key", MAX_BUF_LEN)?;
            let iv = match self.alg_id {
                AlgorithmId::AesEcb | AlgorithmId::TdesEcb => Vec::new(),
                _ => crate::handlers::optional_hex(case, "iv", MAX_BUF_LEN)?,
            };
            let tweak = crate::handlers::optional_hex(case, "tweak", MAX_BUF_LEN)?;

            let mut tc = SymCipherTc { direction: Some(direction), key, iv, tweak, pt: Vec::new(), ct: Vec::new() };
            let input_len = match direction {
                Direction::Encrypt => {
                    tc.pt = require_hex(case, "pt", MAX_BUF_LEN)?;
                    tc.pt.len()
                }
                Direction::Decrypt => {
                    tc.ct = require_hex(case, "ct", MAX_BUF_LEN)?;
                    tc.ct.len()
                }
            };

            let mut wrapped = TestCase::SymCipher(tc);
            capability
                .data()
                .callback
                .invoke(&mut wrapped)
                .map_err(|e| AmvpError::CryptoModuleFail(e.to_string()))?;
            let TestCase::SymCipher(tc) = wrapped else { unreachable!() };

            let output_len = match direction {
                Direction::Encrypt => tc.ct.len(),
                Direction::Decrypt => tc.pt.len(),
            };
            self.check_output_len(input_len, output_len)?;

            let out = match direction {
                Direction::Encrypt => json!({ "tcId": tc_id, "ct": bytes_to_hex(&tc.ct) }),
                Direction::Decrypt => json!({ "tcId": tc_id, "pt": bytes_to_hex(&tc.pt) }),
            };
            results.push(out);
        }
        Ok(results)
    }

    /// Monte-Carlo chain (spec §4.7): one preserved cipher context spans
    /// [`MCT_INNER_ITERATIONS`] inner iterations per outer test case, only
    /// the per-100-iteration checkpoint values are reported back.
    fn run_mct(&self, capability: &Capability, direction: Direction, cases: &[Value]) -> Result<Vec<Value>> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            let tc_id = require_id(case, "tcId")?;
            let key = require_hex(case, "key", MAX_BUF_LEN)?;
            let iv = crate::handlers::optional_hex(case, "iv", MAX_BUF_LEN)?;
            let seed = match direction {
                Direction::Encrypt => require_hex(case, "pt", MAX_BUF_LEN)?,
                Direction::Decrypt => require_hex(case, "ct", MAX_BUF_LEN)?,
            };

            let mut state = McrState::new();
            state.init(key.clone(), iv.clone())?;

            let mut running = seed;

            for i in 0..MCT_INNER_ITERATIONS {
                let guard = McrGuard::new(&mut state);

                let mut tc = SymCipherTc {
                    direction: Some(direction),
                    key: key.clone(),
                    iv: iv.clone(),
                    tweak: Vec::new(),
                    pt: Vec::new(),
                    ct: Vec::new(),
                };
                match direction {
                    Direction::Encrypt => tc.pt = running,
                    Direction::Decrypt => tc.ct = running,
                }

                let mut wrapped = TestCase::SymCipher(tc);
                let invoke_result = capability.data().callback.invoke(&mut wrapped);
                if let Err(e) = invoke_result {
                    return Err(AmvpError::CryptoModuleFail(e.to_string()));
                }
                let TestCase::SymCipher(tc) = wrapped else { unreachable!() };

                running = match direction {
                    Direction::Encrypt => tc.ct,
                    Direction::Decrypt => tc.pt,
                };

                if i == MCT_INNER_ITERATIONS - 1 {
                    guard.release();
                } else {
                    guard.disarm();
                }
            }

            let mut out = serde_json::Map::new();
            out.insert("tcId".into(), json!(tc_id));
            out.insert("key".into(), json!(bytes_to_hex(&key)));
            let output_field = match direction {
                Direction::Encrypt => "ct",
                Direction::Decrypt => "pt",
            };
            out.insert(output_field.into(), json!(bytes_to_hex(&running)));
            results.push(Value::Object(out));
        }
        Ok(results)
    }
}
