//! Registration serializer (spec §4.4): walks each registered [`Capability`]
//! and emits the schema's JSON object, in registration order.

use super::{Capability, ParamId, ParamSlot, ParamValue, Registry};
use serde_json::{json, Value};

/// Emit the full registration message: one JSON object per registered
/// capability, in the order `enable` was called.
pub fn to_registration_json(registry: &Registry) -> Vec<Value> {
    registry
        .registration_order()
        .iter()
        .map(|alg_id| {
            let cap = registry.lookup(*alg_id).expect("registration_order is consistent with caps");
            capability_to_json(*alg_id, cap)
        })
        .collect()
}

fn capability_to_json(alg_id: crate::catalog::AlgorithmId, cap: &Capability) -> Value {
    let (algorithm, mode) = alg_id.as_strs();
    let mut obj = serde_json::Map::new();
    obj.insert("algorithm".into(), json!(algorithm));
    if let Some(m) = mode {
        obj.insert("mode".into(), json!(m));
    }

    let data = cap.data();
    for param_id in cap.allowed_params() {
        if let Some(slot) = data.params.get(param_id) {
            obj.insert(param_json_key(*param_id).into(), param_slot_to_json(slot));
        }
    }

    if !data.prereqs.is_empty() {
        let prereqs: Vec<Value> = data
            .prereqs
            .iter()
            .map(|p| json!({ "algorithm": p.required_alg, "valValue": p.validation_value }))
            .collect();
        obj.insert("prereqVals".into(), Value::Array(prereqs));
    }

    Value::Object(obj)
}

fn param_slot_to_json(slot: &ParamSlot) -> Value {
    match slot {
        ParamSlot::Domain(d) => json!({ "min": d.min, "max": d.max, "increment": d.step }),
        ParamSlot::Values(vs) => Value::Array(vs.iter().map(param_value_to_json).collect()),
    }
}

fn param_value_to_json(v: &ParamValue) -> Value {
    match v {
        ParamValue::Int(i) => json!(i),
        ParamValue::Bool(b) => json!(b),
        ParamValue::Str(s) => json!(s),
    }
}

/// The registration schema's field name for a given internal [`ParamId`].
fn param_json_key(id: ParamId) -> &'static str {
    match id {
        ParamId::Direction => "direction",
        ParamId::KeyLen => "keyLen",
        ParamId::TagLen => "tagLen",
        ParamId::IvLen => "ivLen",
        ParamId::PtLen => "ptLen",
        ParamId::AadLen => "aadLen",
        ParamId::IvGenSource => "ivGen",
        ParamId::Conformance => "conformance",
        ParamId::MacLen => "macLen",
        ParamId::L => "l",
        ParamId::HashAlg => "hashAlg",
        ParamId::MacMode => "macMode",
        ParamId::KdfMode => "kdfMode",
        ParamId::CounterLocation => "counterLocation",
        ParamId::CounterLen => "counterLen",
        ParamId::SaltMethod => "saltMethod",
        ParamId::Modulo => "modulo",
        ParamId::RandPq => "randPQ",
        ParamId::PubExpMode => "pubExpMode",
        ParamId::KeyFormat => "keyFormat",
        ParamId::PrimeTest => "primeTest",
        ParamId::Curve => "curve",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AlgorithmId;
    use crate::handlers::TestCaseIo;
    use std::sync::Arc;

    struct NoopCallback;
    impl crate::registry::CryptoCallback for NoopCallback {
        fn invoke(&self, _tc: &mut dyn TestCaseIo) -> crate::error::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn domain_emits_min_max_increment() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::AesCbcCs2, Arc::new(NoopCallback)).unwrap();
        reg.set_domain(AlgorithmId::AesCbcCs2, ParamId::PtLen, 0, 1024, 8).unwrap();
        let json = to_registration_json(&reg);
        assert_eq!(json[0]["ptLen"], json!({ "min": 0, "max": 1024, "increment": 8 }));
    }

    #[test]
    fn singleton_values_emit_as_array() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::AesGcm, Arc::new(NoopCallback)).unwrap();
        reg.set_parm(AlgorithmId::AesGcm, ParamId::KeyLen, ParamValue::Int(256)).unwrap();
        let json = to_registration_json(&reg);
        assert_eq!(json[0]["keyLen"], json!([256]));
        assert_eq!(json[0]["algorithm"], json!("AES"));
        assert_eq!(json[0]["mode"], json!("GCM"));
    }

    #[test]
    fn prereqs_emit_as_pair_list() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::EcdsaSigVer, Arc::new(NoopCallback)).unwrap();
        reg.set_prereq(AlgorithmId::EcdsaSigVer, "SHA", "1234").unwrap();
        let json = to_registration_json(&reg);
        assert_eq!(json[0]["prereqVals"], json!([{ "algorithm": "SHA", "valValue": "1234" }]));
    }
}
