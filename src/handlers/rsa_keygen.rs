//! RSA KeyGen handler (spec §4.6.e).
//!
//! Grounded on `amvp_rsa_keygen.c`'s `amvp_rsa_output_tc`: for
//! `randPQ == B.3.3` (probable primes) under a `KAT` test type the source
//! emits only `testPassed` and returns before writing `p`/`q`/`n`/`d`/`e` —
//! reproduced here as the `Kat`/`Val` branch of [`RsaKeyGenHandler::run`].
//! `VAL` (scenario: server-supplied `p`/`q` checked against `primeTest`)
//! shares that same short-circuit: both subtypes compare a server-asserted
//! value against the module's answer and report only `testPassed`.

use crate::catalog::{rand_pq_from_str, AlgorithmId, RandPq};
use crate::codec::bytes_to_hex;
use crate::error::{AmvpError, Result};
use crate::handlers::{optional_hex, require_hex, require_id, require_str, TcField, TestCase, TestCaseIo, TestGroupHandler, TestType, MAX_BUF_LEN};
use crate::registry::Capability;
use serde_json::{json, Value};

/// One RSA key-generation test case (spec §3 "TestCase::RsaKeyGen").
#[derive(Default)]
pub struct RsaKeyGenTc {
    pub modulo: i64,
    pub seed: Vec<u8>,
    pub p: Vec<u8>,
    pub q: Vec<u8>,
    pub n: Vec<u8>,
    pub d: Vec<u8>,
    pub e: Vec<u8>,
    pub xp: Vec<u8>,
    pub xp1: Vec<u8>,
    pub xp2: Vec<u8>,
    pub xq: Vec<u8>,
    pub xq1: Vec<u8>,
    pub xq2: Vec<u8>,
    pub test_passed: Option<bool>,
}

impl TestCaseIo for RsaKeyGenTc {
    fn get_bytes(&self, field: TcField) -> Option<&[u8]> {
        match field {
            TcField::Seed => Some(&self.seed),
            TcField::P => Some(&self.p),
            TcField::Q => Some(&self.q),
            TcField::N => Some(&self.n),
            TcField::D => Some(&self.d),
            TcField::E => Some(&self.e),
            TcField::XP => Some(&self.xp),
            TcField::XP1 => Some(&self.xp1),
            TcField::XP2 => Some(&self.xp2),
            TcField::XQ => Some(&self.xq),
            TcField::XQ1 => Some(&self.xq1),
            TcField::XQ2 => Some(&self.xq2),
            _ => None,
        }
    }

    fn set_bytes(&mut self, field: TcField, value: Vec<u8>) {
        match field {
            TcField::P => self.p = value,
            TcField::Q => self.q = value,
            TcField::N => self.n = value,
            TcField::D => self.d = value,
            TcField::E => self.e = value,
            TcField::Seed => self.seed = value,
            TcField::XP => self.xp = value,
            TcField::XP1 => self.xp1 = value,
            TcField::XP2 => self.xp2 = value,
            TcField::XQ => self.xq = value,
            TcField::XQ1 => self.xq1 = value,
            TcField::XQ2 => self.xq2 = value,
            _ => {}
        }
    }

    fn get_int(&self, field: TcField) -> Option<i64> {
        match field {
            TcField::Modulo => Some(self.modulo),
            _ => None,
        }
    }

    fn set_int(&mut self, _field: TcField, _value: i64) {}

    fn get_bool(&self, field: TcField) -> Option<bool> {
        match field {
            TcField::Success => self.test_passed,
            _ => None,
        }
    }

    fn set_bool(&mut self, field: TcField, value: bool) {
        if field == TcField::Success {
            self.test_passed = Some(value);
        }
    }
}

/// Whether `primeTest` is a required group field for this `randPQ` (spec
/// §4.6.e: "only for B.3.3/5/6").
fn requires_prime_test(rand_pq: RandPq) -> bool {
    matches!(rand_pq, RandPq::B33 | RandPq::B35 | RandPq::B36)
}

/// Whether this `randPQ` consumes a server-supplied `seed` when
/// `infoGeneratedByServer` is set (spec §4.6.e: "for `randPQ ∈
/// {B.3.2,4,5}` a `seed`").
fn consumes_seed(rand_pq: RandPq) -> bool {
    matches!(rand_pq, RandPq::B32 | RandPq::B34 | RandPq::B35)
}

pub struct RsaKeyGenHandler;

impl TestGroupHandler for RsaKeyGenHandler {
    fn run(&self, capability: &Capability, groups: &[Value]) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            let tg_id = require_id(group, "tgId")?;
            let modulo = group
                .get("modulo")
                .and_then(Value::as_i64)
                .ok_or_else(|| AmvpError::missing_arg("modulo"))?;
            let rand_pq = rand_pq_from_str(require_str(group, "randPQ")?)?;
            let test_type = TestType::from_str(group.get("testType").and_then(Value::as_str).unwrap_or("GDT"))?;

            let pub_exp_mode = group.get("pubExpMode").and_then(Value::as_str).unwrap_or("fixed");
            if !matches!(pub_exp_mode, "fixed" | "random") {
                return Err(AmvpError::invalid_arg("pubExpMode", format!("unknown pubExpMode `{pub_exp_mode}`")));
            }
            let key_format = group.get("keyFormat").and_then(Value::as_str).unwrap_or("standard");
            if !matches!(key_format, "standard" | "CRT") {
                return Err(AmvpError::invalid_arg("keyFormat", format!("unknown keyFormat `{key_format}`")));
            }
            if requires_prime_test(rand_pq) && group.get("primeTest").and_then(Value::as_str).is_none() {
                return Err(AmvpError::missing_arg("primeTest"));
            }
            let info_generated_by_server = group.get("infoGeneratedByServer").and_then(Value::as_bool).unwrap_or(false);

            let cases = group
                .get("tests")
                .and_then(Value::as_array)
                .ok_or_else(|| AmvpError::MalformedJson("test group missing `tests` array".into()))?;

            let mut tc_results = Vec::with_capacity(cases.len());
            for case in cases {
                let tc_id = require_id(case, "tcId")?;

                let mut tc = RsaKeyGenTc { modulo, ..Default::default() };

                if info_generated_by_server {
                    // spec §4.6.e: server-supplied `bitlens` always
                    // accompanies server-generated info; validated for
                    // shape here; the individual lengths are an operator
                    // callback concern (no wire-visible output depends on
                    // them).
                    let bitlens = case
                        .get("bitlens")
                        .and_then(Value::as_array)
                        .ok_or_else(|| AmvpError::missing_arg("bitlens"))?;
                    if bitlens.len() != 4 || !bitlens.iter().all(|v| v.as_i64().is_some_and(|n| n > 0)) {
                        return Err(AmvpError::invalid_arg("bitlens", "must be an array of 4 positive integers"));
                    }
                    if consumes_seed(rand_pq) {
                        tc.seed = require_hex(case, "seed", MAX_BUF_LEN)?;
                    }
                }

                if matches!(rand_pq, RandPq::B36) {
                    tc.xp = require_hex(case, "xP", MAX_BUF_LEN)?;
                    tc.xp1 = require_hex(case, "xP1", MAX_BUF_LEN)?;
                    tc.xp2 = require_hex(case, "xP2", MAX_BUF_LEN)?;
                    tc.xq = require_hex(case, "xQ", MAX_BUF_LEN)?;
                    tc.xq1 = require_hex(case, "xQ1", MAX_BUF_LEN)?;
                    tc.xq2 = require_hex(case, "xQ2", MAX_BUF_LEN)?;
                }

                if matches!(test_type, TestType::Val) {
                    // VAL: server asserts a `(p, q)` pair; the module
                    // reports whether it accepts them, nothing else.
                    tc.p = require_hex(case, "p", MAX_BUF_LEN)?;
                    tc.q = require_hex(case, "q", MAX_BUF_LEN)?;
                } else {
                    tc.p = optional_hex(case, "p", MAX_BUF_LEN)?;
                    tc.q = optional_hex(case, "q", MAX_BUF_LEN)?;
                }

                let mut wrapped = TestCase::RsaKeyGen(tc);
                capability
                    .data()
                    .callback
                    .invoke(&mut wrapped)
                    .map_err(|e| AmvpError::CryptoModuleFail(e.to_string()))?;
                let TestCase::RsaKeyGen(tc) = wrapped else { unreachable!() };

                let out = if matches!(test_type, TestType::Kat | TestType::Val) {
                    json!({ "tcId": tc_id, "testPassed": tc.test_passed.unwrap_or(false) })
                } else {
                    let mut obj = json!({
                        "tcId": tc_id,
                        "p": bytes_to_hex(&tc.p),
                        "q": bytes_to_hex(&tc.q),
                        "n": bytes_to_hex(&tc.n),
                        "d": bytes_to_hex(&tc.d),
                        "e": bytes_to_hex(&tc.e),
                    });
                    let map = obj.as_object_mut().expect("object literal");
                    if key_format == "CRT" {
                        map.insert("xP".into(), json!(bytes_to_hex(&tc.xp)));
                        map.insert("xP1".into(), json!(bytes_to_hex(&tc.xp1)));
                        map.insert("xP2".into(), json!(bytes_to_hex(&tc.xp2)));
                        map.insert("xQ".into(), json!(bytes_to_hex(&tc.xq)));
                        map.insert("xQ1".into(), json!(bytes_to_hex(&tc.xq1)));
                        map.insert("xQ2".into(), json!(bytes_to_hex(&tc.xq2)));
                    }
                    if !info_generated_by_server {
                        map.insert("seed".into(), json!(bytes_to_hex(&tc.seed)));
                    }
                    obj
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

    struct FixedKey;
    impl CryptoCallback for FixedKey {
        fn invoke(&self, tc: &mut dyn TestCaseIo) -> Result<()> {
            tc.set_bytes(TcField::P, vec![1]);
            tc.set_bytes(TcField::Q, vec![2]);
            tc.set_bytes(TcField::N, vec![3]);
            tc.set_bytes(TcField::D, vec![4]);
            tc.set_bytes(TcField::E, vec![5]);
            tc.set_bytes(TcField::Seed, vec![9]);
            tc.set_bool(TcField::Success, true);
            Ok(())
        }
    }

    #[test]
    fn kat_b33_emits_only_test_passed() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::RsaKeyGen, Arc::new(FixedKey)).unwrap();
        let cap = reg.lookup(AlgorithmId::RsaKeyGen).unwrap();
        let handler = RsaKeyGenHandler;
        let groups = vec![json!({
            "tgId": 1,
            "modulo": 2048,
            "randPQ": "probable",
            "primeTest": "tblC2",
            "testType": "KAT",
            "tests": [{ "tcId": 1 }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        let tc = &out[0]["tests"][0];
        assert_eq!(tc["testPassed"], json!(true));
        assert!(tc.get("n").is_none());
    }

    #[test]
    fn val_b33_requires_p_and_q_and_emits_only_test_passed() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::RsaKeyGen, Arc::new(FixedKey)).unwrap();
        let cap = reg.lookup(AlgorithmId::RsaKeyGen).unwrap();
        let handler = RsaKeyGenHandler;
        let groups = vec![json!({
            "tgId": 1,
            "modulo": 2048,
            "randPQ": "probable",
            "primeTest": "tblC2",
            "testType": "VAL",
            "tests": [{ "tcId": 1, "p": "11", "q": "22" }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        let tc = &out[0]["tests"][0];
        assert_eq!(tc["testPassed"], json!(true));
        assert!(tc.get("n").is_none());

        let missing_pq = vec![json!({
            "tgId": 1,
            "modulo": 2048,
            "randPQ": "probable",
            "primeTest": "tblC2",
            "testType": "VAL",
            "tests": [{ "tcId": 1 }],
        })];
        let err = handler.run(cap, &missing_pq).unwrap_err();
        assert!(matches!(err, AmvpError::MissingArg { .. }));
    }

    #[test]
    fn missing_prime_test_is_fatal_for_b33() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::RsaKeyGen, Arc::new(FixedKey)).unwrap();
        let cap = reg.lookup(AlgorithmId::RsaKeyGen).unwrap();
        let handler = RsaKeyGenHandler;
        let groups = vec![json!({
            "tgId": 1,
            "modulo": 2048,
            "randPQ": "probable",
            "testType": "KAT",
            "tests": [{ "tcId": 1 }],
        })];
        let err = handler.run(cap, &groups).unwrap_err();
        assert!(matches!(err, AmvpError::MissingArg { .. }));
    }

    #[test]
    fn gdt_emits_full_key_material_and_seed_when_client_generated() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::RsaKeyGen, Arc::new(FixedKey)).unwrap();
        let cap = reg.lookup(AlgorithmId::RsaKeyGen).unwrap();
        let handler = RsaKeyGenHandler;
        let groups = vec![json!({
            "tgId": 1,
            "modulo": 2048,
            "randPQ": "provable",
            "testType": "GDT",
            "tests": [{ "tcId": 1 }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        assert_eq!(out[0]["tests"][0]["n"], json!("03"));
        assert_eq!(out[0]["tests"][0]["seed"], json!("09"));
    }

    #[test]
    fn crt_format_emits_x_fields() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::RsaKeyGen, Arc::new(FixedKey)).unwrap();
        let cap = reg.lookup(AlgorithmId::RsaKeyGen).unwrap();
        let handler = RsaKeyGenHandler;
        let groups = vec![json!({
            "tgId": 1,
            "modulo": 2048,
            "randPQ": "provable",
            "keyFormat": "CRT",
            "testType": "GDT",
            "tests": [{ "tcId": 1 }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        assert!(out[0]["tests"][0].get("xP").is_some());
    }

    #[test]
    fn b36_requires_aux_primes() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::RsaKeyGen, Arc::new(FixedKey)).unwrap();
        let cap = reg.lookup(AlgorithmId::RsaKeyGen).unwrap();
        let handler = RsaKeyGenHandler;
        let groups = vec![json!({
            "tgId": 1,
            "modulo": 2048,
            "randPQ": "probableWithProvableAux",
            "primeTest": "tblC2",
            "testType": "GDT",
            "tests": [{ "tcId": 1 }],
        })];
        let err = handler.run(cap, &groups).unwrap_err();
        assert!(matches!(err, AmvpError::MissingArg { .. }));
    }
}
