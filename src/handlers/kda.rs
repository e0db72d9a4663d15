//! KDA (HKDF/OneStep/TwoStep) handler (spec §4.6.f).
//!
//! The `fixedInfoPattern` tokenizer is grounded on `amvp_kda.c`: the source
//! splits the pattern string on `||` (`strtok_s(cpy, &len, "||", &tmp)`),
//! and for any token that looks like `literal[...]` re-splits it on `[`/`]`
//! to pull out and hex-decode the literal payload. [`parse_fixed_info_pattern`]
//! reproduces that two-level tokenization without the C string-buffer
//! bookkeeping.

use crate::catalog::{hash_from_str, salt_method_from_str, AlgorithmId, SaltMethod};
use crate::codec::bytes_to_hex;
use crate::error::{AmvpError, Result};
use crate::handlers::{optional_hex, require_hex, require_id, require_int, require_str, PatternToken, TcField, TestCase, TestCaseIo, TestGroupHandler, MAX_BUF_LEN};
use crate::registry::{Capability, ParamId};
use serde_json::{json, Value};

/// Largest output length this handler accepts, in bits (spec §4.6.f: `l`
/// is "bits, multiple of 8, ≤ 2048·8").
const MAX_L_BITS: i64 = 2048 * 8;

/// Parse a `fixedInfoPattern` string into its ordered tokens (spec §3
/// "Pattern array"). Requires at least one `uPartyInfo` and one
/// `vPartyInfo` token to be present anywhere in the pattern.
pub fn parse_fixed_info_pattern(pattern: &str) -> Result<Vec<PatternToken>> {
    let mut tokens = Vec::new();
    let mut saw_u = false;
    let mut saw_v = false;

    for raw in pattern.split("||") {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AmvpError::invalid_arg("fixedInfoPattern", "empty token between `||` separators"));
        }
        let token = if let Some(inner) = raw.strip_prefix("literal[").and_then(|s| s.strip_suffix(']')) {
            let bytes = crate::codec::hex_to_bytes(inner, MAX_BUF_LEN)?;
            PatternToken::Literal(bytes)
        } else {
            match raw {
                "uPartyInfo" => {
                    saw_u = true;
                    PatternToken::UPartyInfo
                }
                "vPartyInfo" => {
                    saw_v = true;
                    PatternToken::VPartyInfo
                }
                "context" => PatternToken::Context,
                "algorithmId" => PatternToken::AlgorithmIdBytes,
                "label" => PatternToken::Label,
                "l" => PatternToken::LBytes,
                "t" => PatternToken::T,
                other => {
                    return Err(AmvpError::invalid_arg("fixedInfoPattern", format!("unknown token `{other}`")))
                }
            }
        };
        tokens.push(token);
    }

    if tokens.is_empty() {
        return Err(AmvpError::invalid_arg("fixedInfoPattern", "pattern must contain at least one token"));
    }
    if !saw_u || !saw_v {
        return Err(AmvpError::invalid_arg(
            "fixedInfoPattern",
            "pattern must include both uPartyInfo and vPartyInfo",
        ));
    }
    Ok(tokens)
}

/// The per-case bytes an assembled `fixedInfoPattern` token can draw from
/// (spec §4.6.f).
struct FixedInfoParts<'a> {
    u_party_id: &'a [u8],
    v_party_id: &'a [u8],
    label: &'a [u8],
    context: &'a [u8],
    algorithm_id: &'a [u8],
}

/// Assemble the `FixedInfo` byte string from its tokens and the per-case
/// party identifiers (spec §4.6.f).
fn assemble_fixed_info(tokens: &[PatternToken], parts: &FixedInfoParts) -> Vec<u8> {
    let mut out = Vec::new();
    for tok in tokens {
        match tok {
            PatternToken::UPartyInfo => out.extend_from_slice(parts.u_party_id),
            PatternToken::VPartyInfo => out.extend_from_slice(parts.v_party_id),
            PatternToken::Label => out.extend_from_slice(parts.label),
            PatternToken::Context => out.extend_from_slice(parts.context),
            PatternToken::AlgorithmIdBytes => out.extend_from_slice(parts.algorithm_id),
            PatternToken::Literal(bytes) => out.extend_from_slice(bytes),
            // LBytes/T (the output-length and counter tokens) have no
            // per-case field in spec §4.6.f's wire format; no AMVP KDA
            // vector set exercises them.
            PatternToken::LBytes | PatternToken::T => {}
        }
    }
    out
}

/// One KDA test case (spec §3 "TestCase::Kda").
#[derive(Default)]
pub struct KdaTc {
    pub z: Vec<u8>,
    pub fixed_info: Vec<u8>,
    pub salt: Vec<u8>,
    pub l_bits: i64,
    pub label: Vec<u8>,
    pub context: Vec<u8>,
    pub algorithm_id: Vec<u8>,
    pub dkm: Vec<u8>,
}

impl TestCaseIo for KdaTc {
    fn get_bytes(&self, field: TcField) -> Option<&[u8]> {
        match field {
            TcField::Z => Some(&self.z),
            TcField::FixedData => Some(&self.fixed_info),
            TcField::Salt => Some(&self.salt),
            TcField::Label => Some(&self.label),
            TcField::Context => Some(&self.context),
            TcField::AlgorithmIdBytes => Some(&self.algorithm_id),
            TcField::Dkm => Some(&self.dkm),
            _ => None,
        }
    }

    fn set_bytes(&mut self, field: TcField, value: Vec<u8>) {
        if field == TcField::Dkm {
            self.dkm = value;
        }
    }

    fn get_int(&self, field: TcField) -> Option<i64> {
        match field {
            TcField::L => Some(self.l_bits),
            _ => None,
        }
    }

    fn set_int(&mut self, _field: TcField, _value: i64) {}

    fn get_bool(&self, _field: TcField) -> Option<bool> {
        None
    }

    fn set_bool(&mut self, _field: TcField, _value: bool) {}
}

pub struct KdaHandler {
    pub alg_id: AlgorithmId,
}

impl TestGroupHandler for KdaHandler {
    fn run(&self, capability: &Capability, groups: &[Value]) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            let tg_id = require_id(group, "tgId")?;
            let _hash = hash_from_str(require_str(group, "hashAlg")?)?;
            let pattern = require_str(group, "fixedInfoPattern")?;
            let tokens = parse_fixed_info_pattern(pattern)?;
            let l_bits = require_int(group, "l")?;
            // spec §8 negative property: "l not a multiple of 8 => MalformedJson".
            if l_bits <= 0 || l_bits % 8 != 0 {
                return Err(AmvpError::MalformedJson(format!("`l` must be a positive multiple of 8, got {l_bits}")));
            }
            if l_bits > MAX_L_BITS {
                return Err(AmvpError::invalid_arg("l", format!("{l_bits} exceeds maximum {MAX_L_BITS}")));
            }
            let data = capability.data();
            if data.params.contains_key(&ParamId::L) && !data.permits(ParamId::L, l_bits) {
                return Err(AmvpError::tc_invalid("l", format!("{l_bits} not registered for {}", self.alg_id)));
            }
            let salt_method = match group.get("saltMethod").and_then(Value::as_str) {
                Some(s) => salt_method_from_str(s)?,
                None => SaltMethod::Default,
            };

            let cases = group
                .get("tests")
                .and_then(Value::as_array)
                .ok_or_else(|| AmvpError::MalformedJson("test group missing `tests` array".into()))?;

            let mut tc_results = Vec::with_capacity(cases.len());
            for case in cases {
                let tc_id = require_id(case, "tcId")?;
                let z = require_hex(case, "z", MAX_BUF_LEN)?;
                // spec §10 open-question decision: an absent `salt` is
                // treated identically to an empty one; `saltMethod: random`
                // requires the server to have actually supplied a nonempty
                // one, since a random method can never legitimately yield
                // zero bytes.
                let salt = optional_hex(case, "salt", MAX_BUF_LEN)?;
                if salt_method == SaltMethod::Random && salt.is_empty() {
                    return Err(AmvpError::invalid_arg("salt", "saltMethod `random` requires a nonempty salt"));
                }
                let u_party_id = optional_hex(case, "uPartyId", MAX_BUF_LEN)?;
                let v_party_id = optional_hex(case, "vPartyId", MAX_BUF_LEN)?;
                let label = optional_hex(case, "label", MAX_BUF_LEN)?;
                let context = optional_hex(case, "context", MAX_BUF_LEN)?;
                let algorithm_id = optional_hex(case, "algorithmId", MAX_BUF_LEN)?;
                let fixed_info = assemble_fixed_info(
                    &tokens,
                    &FixedInfoParts {
                        u_party_id: &u_party_id,
                        v_party_id: &v_party_id,
                        label: &label,
                        context: &context,
                        algorithm_id: &algorithm_id,
                    },
                );

                let tc = KdaTc { z, fixed_info, salt, l_bits, label, context, algorithm_id, dkm: Vec::new() };
                let mut wrapped = TestCase::Kda(tc);
                capability
                    .data()
                    .callback
                    .invoke(&mut wrapped)
                    .map_err(|e| AmvpError::CryptoModuleFail(e.to_string()))?;
                let TestCase::Kda(tc) = wrapped else { unreachable!() };

                tc_results.push(json!({ "tcId": tc_id, "dkm": bytes_to_hex(&tc.dkm) }));
            }

            out.push(json!({ "tgId": tg_id, "tests": tc_results }));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_salt_method_rejects_empty_salt() {
        use crate::registry::{CryptoCallback, Registry};
        use std::sync::Arc;

        struct FixedDkm;
        impl CryptoCallback for FixedDkm {
            fn invoke(&self, tc: &mut dyn TestCaseIo) -> Result<()> {
                tc.set_bytes(TcField::Dkm, vec![0u8; 32]);
                Ok(())
            }
        }

        let mut reg = Registry::new();
        reg.enable(AlgorithmId::KdaHkdf, Arc::new(FixedDkm)).unwrap();
        let cap = reg.lookup(AlgorithmId::KdaHkdf).unwrap();
        let handler = KdaHandler { alg_id: AlgorithmId::KdaHkdf };
        let groups = vec![json!({
            "tgId": 1,
            "hashAlg": "SHA2-256",
            "fixedInfoPattern": "uPartyInfo||vPartyInfo",
            "saltMethod": "random",
            "l": 256,
            "tests": [{ "tcId": 1, "z": "00", "uPartyId": "01", "vPartyId": "02" }],
        })];
        let err = handler.run(cap, &groups).unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn pattern_requires_both_parties() {
        let err = parse_fixed_info_pattern("uPartyInfo||literal[deadbeef]").unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn pattern_parses_literal_and_parties() {
        let tokens = parse_fixed_info_pattern("uPartyInfo||literal[deadbeef]||vPartyInfo").unwrap();
        assert_eq!(
            tokens,
            vec![
                PatternToken::UPartyInfo,
                PatternToken::Literal(vec![0xde, 0xad, 0xbe, 0xef]),
                PatternToken::VPartyInfo,
            ]
        );
    }

    #[test]
    fn assemble_concatenates_in_order() {
        let tokens = vec![PatternToken::UPartyInfo, PatternToken::Literal(vec![0xff]), PatternToken::VPartyInfo];
        let parts = FixedInfoParts {
            u_party_id: &[1, 2],
            v_party_id: &[3, 4],
            label: &[],
            context: &[],
            algorithm_id: &[],
        };
        let out = assemble_fixed_info(&tokens, &parts);
        assert_eq!(out, vec![1, 2, 0xff, 3, 4]);
    }

    #[test]
    fn assemble_includes_label_context_and_algorithm_id() {
        let tokens = vec![
            PatternToken::UPartyInfo,
            PatternToken::VPartyInfo,
            PatternToken::Label,
            PatternToken::Context,
            PatternToken::AlgorithmIdBytes,
        ];
        let parts = FixedInfoParts {
            u_party_id: &[1],
            v_party_id: &[2],
            label: &[0xaa],
            context: &[0xbb],
            algorithm_id: &[0xcc],
        };
        let out = assemble_fixed_info(&tokens, &parts);
        assert_eq!(out, vec![1, 2, 0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn label_token_is_threaded_from_case_field_through_run() {
        use crate::registry::{CryptoCallback, Registry};
        use std::sync::Arc;

        struct CapturingDkm;
        impl CryptoCallback for CapturingDkm {
            fn invoke(&self, tc: &mut dyn TestCaseIo) -> Result<()> {
                let fixed_info = tc.get_bytes(TcField::FixedData).unwrap().to_vec();
                tc.set_bytes(TcField::Dkm, fixed_info);
                Ok(())
            }
        }

        let mut reg = Registry::new();
        reg.enable(AlgorithmId::KdaHkdf, Arc::new(CapturingDkm)).unwrap();
        let cap = reg.lookup(AlgorithmId::KdaHkdf).unwrap();
        let handler = KdaHandler { alg_id: AlgorithmId::KdaHkdf };
        let groups = vec![json!({
            "tgId": 1,
            "hashAlg": "SHA2-256",
            "fixedInfoPattern": "uPartyInfo||vPartyInfo||label",
            "l": 256,
            "tests": [{ "tcId": 1, "z": "00", "uPartyId": "01", "vPartyId": "02", "label": "deadbeef" }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        assert_eq!(out[0]["tests"][0]["dkm"], json!("0102deadbeef"));
    }

    #[test]
    fn empty_token_between_separators_rejected() {
        let err = parse_fixed_info_pattern("uPartyInfo||||vPartyInfo").unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn l_not_multiple_of_eight_is_malformed() {
        use crate::registry::{CryptoCallback, Registry};
        use std::sync::Arc;

        struct FixedDkm;
        impl CryptoCallback for FixedDkm {
            fn invoke(&self, tc: &mut dyn TestCaseIo) -> Result<()> {
                tc.set_bytes(TcField::Dkm, vec![0u8; 32]);
                Ok(())
            }
        }

        let mut reg = Registry::new();
        reg.enable(AlgorithmId::KdaHkdf, Arc::new(FixedDkm)).unwrap();
        let cap = reg.lookup(AlgorithmId::KdaHkdf).unwrap();
        let handler = KdaHandler { alg_id: AlgorithmId::KdaHkdf };
        let groups = vec![json!({
            "tgId": 1,
            "hashAlg": "SHA2-256",
            "fixedInfoPattern": "uPartyInfo||vPartyInfo",
            "l": 255,
            "tests": [{ "tcId": 1, "z": "00", "uPartyId": "01", "vPartyId": "02" }],
        })];
        let err = handler.run(cap, &groups).unwrap_err();
        assert!(matches!(err, AmvpError::MalformedJson(_)));
    }

    #[test]
    fn well_formed_l_produces_dkm() {
        use crate::registry::{CryptoCallback, Registry};
        use std::sync::Arc;

        struct FixedDkm;
        impl CryptoCallback for FixedDkm {
            fn invoke(&self, tc: &mut dyn TestCaseIo) -> Result<()> {
                tc.set_bytes(TcField::Dkm, vec![0u8; 32]);
                Ok(())
            }
        }

        let mut reg = Registry::new();
        reg.enable(AlgorithmId::KdaHkdf, Arc::new(FixedDkm)).unwrap();
        let cap = reg.lookup(AlgorithmId::KdaHkdf).unwrap();
        let handler = KdaHandler { alg_id: AlgorithmId::KdaHkdf };
        let groups = vec![json!({
            "tgId": 1,
            "hashAlg": "SHA2-256",
            "fixedInfoPattern": "uPartyInfo||vPartyInfo",
            "l": 256,
            "tests": [{ "tcId": 1, "z": "00", "uPartyId": "01", "vPartyId": "02" }],
        })];
        let out = handler.run(cap, &groups).unwrap();
        assert_eq!(out[0]["tests"][0]["dkm"].as_str().unwrap().len(), 64);
    }
}
