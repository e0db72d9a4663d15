//! Response assembler (spec §4.8): wraps a dispatched handler's
//! `testGroups` array back into the `{algorithm, mode, testGroups}`
//! envelope the server expects.

use crate::catalog::AlgorithmId;
use serde_json::{json, Value};

/// Accumulates one vector set's response in input order.
pub struct ResponseBuilder {
    alg_id: AlgorithmId,
    test_groups: Vec<Value>,
}

impl ResponseBuilder {
    pub fn new(alg_id: AlgorithmId) -> Self {
        ResponseBuilder { alg_id, test_groups: Vec::new() }
    }

    /// Append a handler's returned `testGroups` array, in order.
    pub fn extend(&mut self, groups: Vec<Value>) {
        self.test_groups.extend(groups);
    }

    /// Serialize the final envelope.
    pub fn finish(self) -> Value {
        let (algorithm, mode) = self.alg_id.as_strs();
        let mut obj = serde_json::Map::new();
        obj.insert("algorithm".into(), json!(algorithm));
        if let Some(m) = mode {
            obj.insert("mode".into(), json!(m));
        }
        obj.insert("testGroups".into(), Value::Array(self.test_groups));
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_envelope_in_order() {
        let mut builder = ResponseBuilder::new(AlgorithmId::AesGcm);
        builder.extend(vec![json!({ "tgId": 1, "tests": [] })]);
        builder.extend(vec![json!({ "tgId": 2, "tests": [] })]);
        let out = builder.finish();
        assert_eq!(out["algorithm"], json!("AES"));
        assert_eq!(out["mode"], json!("GCM"));
        assert_eq!(out["testGroups"][0]["tgId"], json!(1));
        assert_eq!(out["testGroups"][1]["tgId"], json!(2));
    }
}
