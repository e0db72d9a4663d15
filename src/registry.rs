//! Capability registry (spec §4.3): a typed, append-only store of
//! registered algorithms plus their parameter sets, domains, and
//! prerequisite links.
//!
//! The registry is created once at startup, grows monotonically until the
//! registration message is serialized (`seal`), then is read-only. Mutation
//! after sealing returns [`AmvpError::InvalidArg`] rather than silently
//! corrupting a registry another thread may be reading concurrently (the
//! multi-thread allowance of spec §5 — "each thread owns its own
//! capability-registry snapshot" — only holds if sealing is enforced).

pub mod serialize;

use crate::catalog::AlgorithmId;
use crate::error::{AmvpError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// A closed integer interval with a step, describing a set of supported
/// lengths (spec §3 "Domain").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

impl Domain {
    /// Build a domain, validating `min <= max`, `step >= 1`, and
    /// `step | (max - min)` except when `step == 1` (spec §4.3).
    pub fn new(min: i64, max: i64, step: i64) -> Result<Self> {
        if min > max {
            return Err(AmvpError::invalid_arg("domain", format!("min {min} > max {max}")));
        }
        if step < 1 {
            return Err(AmvpError::invalid_arg("domain", format!("step {step} must be >= 1")));
        }
        if step != 1 && (max - min) % step != 0 {
            return Err(AmvpError::invalid_arg(
                "domain",
                format!("step {step} does not evenly divide range [{min}, {max}]"),
            ));
        }
        Ok(Domain { min, max, step })
    }

    /// `min <= v <= max && (v - min) % step == 0` (spec §8 universal invariant).
    pub fn contains(&self, v: i64) -> bool {
        v >= self.min && v <= self.max && (v - self.min) % self.step == 0
    }
}

/// A reference stating this capability depends on another, separately
/// validated implementation (spec §3 "prerequisite").
#[derive(Debug, Clone)]
pub struct Prerequisite {
    pub required_alg: String,
    pub validation_value: String,
}

/// A single registered parameter: either a set of discrete values (emitted
/// as a JSON array, possibly of one element) or a domain.
#[derive(Debug, Clone)]
pub enum ParamSlot {
    Values(Vec<ParamValue>),
    Domain(Domain),
}

/// The value type carried by a scalar parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Family-scoped parameter identifiers. A flat enum (rather than one type
/// per family) keeps [`Registry::set_parm`]/[`Registry::set_domain`]
/// monomorphic; each family's allow-list (see [`allowed_params`]) is what
/// actually enforces family-scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ParamId {
    Direction,
    KeyLen,
    TagLen,
    IvLen,
    PtLen,
    AadLen,
    IvGenSource,
    Conformance,
    MacLen,
    L,
    HashAlg,
    MacMode,
    KdfMode,
    CounterLocation,
    CounterLen,
    SaltMethod,
    Modulo,
    RandPq,
    PubExpMode,
    KeyFormat,
    PrimeTest,
    Curve,
}

/// The operator-supplied crypto callback slot (spec §6 "Operator callback
/// ABI"). Implementations read input fields and write output fields on the
/// [`crate::handlers::TestCaseIo`] view passed to `invoke`.
pub trait CryptoCallback: Send + Sync {
    fn invoke(&self, tc: &mut dyn crate::handlers::TestCaseIo) -> Result<()>;
}

/// Shared storage behind every [`Capability`] variant.
pub struct CapData {
    pub params: HashMap<ParamId, ParamSlot>,
    pub prereqs: Vec<Prerequisite>,
    pub callback: Arc<dyn CryptoCallback>,
}

impl CapData {
    fn new(callback: Arc<dyn CryptoCallback>) -> Self {
        CapData { params: HashMap::new(), prereqs: Vec::new(), callback }
    }

    /// Fetch a singleton/set scalar parameter as an owned `Vec<i64>`.
    pub fn int_values(&self, id: ParamId) -> Vec<i64> {
        match self.params.get(&id) {
            Some(ParamSlot::Values(vs)) => vs.iter().filter_map(ParamValue::as_int).collect(),
            _ => Vec::new(),
        }
    }

    /// Fetch a domain parameter, if registered as one.
    pub fn domain(&self, id: ParamId) -> Option<Domain> {
        match self.params.get(&id) {
            Some(ParamSlot::Domain(d)) => Some(*d),
            _ => None,
        }
    }

    /// True if `v` satisfies either the registered domain or one of the
    /// registered singleton values for `id` (spec §8 universal invariant).
    pub fn permits(&self, id: ParamId, v: i64) -> bool {
        match self.params.get(&id) {
            Some(ParamSlot::Domain(d)) => d.contains(v),
            Some(ParamSlot::Values(vs)) => vs.iter().any(|p| p.as_int() == Some(v)),
            None => false,
        }
    }
}

/// The registered record for one [`AlgorithmId`] (spec §3 "Capability").
pub enum Capability {
    SymCipher(CapData),
    Aead(CapData),
    KeyWrap(CapData),
    Hmac(CapData),
    Cmac(CapData),
    RsaKeyGen(CapData),
    EcdsaKeyGen(CapData),
    EcdsaSigGen(CapData),
    EcdsaSigVer(CapData),
    Kda(CapData),
    KasFfcSsc(CapData),
    KasEccSsc(CapData),
    Kdf108(CapData),
}

impl Capability {
    pub fn data(&self) -> &CapData {
        match self {
            Capability::SymCipher(d)
            | Capability::Aead(d)
            | Capability::KeyWrap(d)
            | Capability::Hmac(d)
            | Capability::Cmac(d)
            | Capability::RsaKeyGen(d)
            | Capability::EcdsaKeyGen(d)
            | Capability::EcdsaSigGen(d)
            | Capability::EcdsaSigVer(d)
            | Capability::Kda(d)
            | Capability::KasFfcSsc(d)
            | Capability::KasEccSsc(d)
            | Capability::Kdf108(d) => d,
        }
    }

    pub fn data_mut(&mut self) -> &mut CapData {
        match self {
            Capability::SymCipher(d)
            | Capability::Aead(d)
            | Capability::KeyWrap(d)
            | Capability::Hmac(d)
            | Capability::Cmac(d)
            | Capability::RsaKeyGen(d)
            | Capability::EcdsaKeyGen(d)
            | Capability::EcdsaSigGen(d)
            | Capability::EcdsaSigVer(d)
            | Capability::Kda(d)
            | Capability::KasFfcSsc(d)
            | Capability::KasEccSsc(d)
            | Capability::Kdf108(d) => d,
        }
    }

    fn new_for(alg_id: AlgorithmId, callback: Arc<dyn CryptoCallback>) -> Self {
        use AlgorithmId::*;
        let data = CapData::new(callback);
        match alg_id {
            AesEcb | AesCbc | AesCbcCs1 | AesCbcCs2 | AesCbcCs3 | AesCfb1 | AesCfb8 | AesCfb128
            | AesOfb | AesCtr | AesXts | TdesEcb | TdesCbc | TdesCfb1 | TdesCfb8 | TdesCfb64
            | TdesOfb => Capability::SymCipher(data),
            AesGcm | AesCcm => Capability::Aead(data),
            AesKw | AesKwp => Capability::KeyWrap(data),
            HmacSha1 | HmacSha2_224 | HmacSha2_256 | HmacSha2_384 | HmacSha2_512 => {
                Capability::Hmac(data)
            }
            CmacAes | CmacTdes => Capability::Cmac(data),
            RsaKeyGen => Capability::RsaKeyGen(data),
            EcdsaKeyGen => Capability::EcdsaKeyGen(data),
            EcdsaSigGen => Capability::EcdsaSigGen(data),
            EcdsaSigVer => Capability::EcdsaSigVer(data),
            KdaHkdf | KdaOneStep | KdaTwoStep => Capability::Kda(data),
            KasFfcSsc => Capability::KasFfcSsc(data),
            KasEccSsc => Capability::KasEccSsc(data),
            Kdf108 => Capability::Kdf108(data),
        }
    }

    /// The parameters legal for this capability's family. Setting a
    /// parameter outside this list is `InvalidArg`.
    pub fn allowed_params(&self) -> &'static [ParamId] {
        use ParamId::*;
        match self {
            Capability::SymCipher(_) => &[Direction, KeyLen, PtLen, Conformance],
            Capability::Aead(_) => {
                &[Direction, KeyLen, TagLen, IvLen, PtLen, AadLen, IvGenSource]
            }
            Capability::KeyWrap(_) => &[Direction, KeyLen, PtLen],
            Capability::Hmac(_) | Capability::Cmac(_) => &[KeyLen, MacLen],
            Capability::RsaKeyGen(_) => {
                &[Modulo, RandPq, PubExpMode, KeyFormat, PrimeTest]
            }
            Capability::EcdsaKeyGen(_) | Capability::EcdsaSigGen(_) | Capability::EcdsaSigVer(_) => {
                &[Curve, HashAlg]
            }
            Capability::Kda(_) => &[L, HashAlg, MacMode, KdfMode, CounterLocation, CounterLen, SaltMethod],
            Capability::KasFfcSsc(_) | Capability::KasEccSsc(_) => &[Curve, HashAlg],
            Capability::Kdf108(_) => &[KdfMode, CounterLocation, CounterLen, MacMode],
        }
    }
}

/// The typed, append-only capability store (spec §4.3).
#[derive(Default)]
pub struct Registry {
    order: Vec<AlgorithmId>,
    caps: HashMap<AlgorithmId, Capability>,
    sealed: bool,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// First registration of `alg_id` creates an empty family-typed record.
    /// Re-enabling the same algorithm returns [`AmvpError::Duplicate`].
    pub fn enable(&mut self, alg_id: AlgorithmId, callback: Arc<dyn CryptoCallback>) -> Result<()> {
        self.reject_if_sealed()?;
        if self.caps.contains_key(&alg_id) {
            return Err(AmvpError::Duplicate(alg_id.to_string()));
        }
        self.caps.insert(alg_id, Capability::new_for(alg_id, callback));
        self.order.push(alg_id);
        Ok(())
    }

    /// Register a singleton scalar value for `param_id` on `alg_id`.
    /// Fails if a domain is already registered for the same parameter, or
    /// the parameter is outside the family's allow-list, or `alg_id` has no
    /// capability.
    pub fn set_parm(&mut self, alg_id: AlgorithmId, param_id: ParamId, value: ParamValue) -> Result<()> {
        self.reject_if_sealed()?;
        let cap = self.caps.get_mut(&alg_id).ok_or_else(|| AmvpError::NoCap(alg_id.to_string()))?;
        if !cap.allowed_params().contains(&param_id) {
            return Err(AmvpError::invalid_arg(
                "param_id",
                format!("{param_id:?} is not valid for {alg_id}"),
            ));
        }
        let data = cap.data_mut();
        match data.params.get_mut(&param_id) {
            Some(ParamSlot::Domain(_)) => {
                return Err(AmvpError::invalid_arg(
                    "param_id",
                    format!("{param_id:?} already has a domain registered"),
                ))
            }
            Some(ParamSlot::Values(vs)) => {
                if !vs.contains(&value) {
                    vs.push(value);
                }
            }
            None => {
                data.params.insert(param_id, ParamSlot::Values(vec![value]));
            }
        }
        Ok(())
    }

    /// Register a domain (length range + step) for `param_id` on `alg_id`.
    /// Fails if a singleton value is already registered for the same
    /// parameter (spec §4.3: domains and singleton values are mutually
    /// exclusive per parameter).
    pub fn set_domain(&mut self, alg_id: AlgorithmId, param_id: ParamId, min: i64, max: i64, step: i64) -> Result<()> {
        self.reject_if_sealed()?;
        let domain = Domain::new(min, max, step)?;
        let cap = self.caps.get_mut(&alg_id).ok_or_else(|| AmvpError::NoCap(alg_id.to_string()))?;
        if !cap.allowed_params().contains(&param_id) {
            return Err(AmvpError::invalid_arg(
                "param_id",
                format!("{param_id:?} is not valid for {alg_id}"),
            ));
        }
        let data = cap.data_mut();
        if matches!(data.params.get(&param_id), Some(ParamSlot::Values(_))) {
            return Err(AmvpError::invalid_arg(
                "param_id",
                format!("{param_id:?} already has a singleton value registered"),
            ));
        }
        data.params.insert(param_id, ParamSlot::Domain(domain));
        Ok(())
    }

    /// Register a prerequisite: this capability depends on a separately
    /// validated implementation of `required_alg`. `value` must be nonempty.
    pub fn set_prereq(&mut self, alg_id: AlgorithmId, required_alg: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.reject_if_sealed()?;
        let value = value.into();
        if value.is_empty() {
            return Err(AmvpError::invalid_arg("validation_value", "prerequisite value must be nonempty"));
        }
        let cap = self.caps.get_mut(&alg_id).ok_or_else(|| AmvpError::NoCap(alg_id.to_string()))?;
        cap.data_mut().prereqs.push(Prerequisite { required_alg: required_alg.into(), validation_value: value });
        Ok(())
    }

    /// Read-only lookup.
    pub fn lookup(&self, alg_id: AlgorithmId) -> Option<&Capability> {
        self.caps.get(&alg_id)
    }

    /// Registration order, oldest first — the order the registration
    /// serializer and registration JSON must preserve (spec §4.3 decision:
    /// "this keeps the registration JSON deterministic").
    pub fn registration_order(&self) -> &[AlgorithmId] {
        &self.order
    }

    /// Seal the registry against further mutation. Idempotent.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn reject_if_sealed(&self) -> Result<()> {
        if self.sealed {
            return Err(AmvpError::invalid_arg("registry", "registry is sealed; no further registration allowed"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::TestCaseIo;

    struct NoopCallback;
    impl CryptoCallback for NoopCallback {
        fn invoke(&self, _tc: &mut dyn TestCaseIo) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn enable_then_duplicate_fails() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::AesGcm, Arc::new(NoopCallback)).unwrap();
        let err = reg.enable(AlgorithmId::AesGcm, Arc::new(NoopCallback)).unwrap_err();
        assert!(matches!(err, AmvpError::Duplicate(_)));
    }

    #[test]
    fn set_parm_before_enable_is_no_cap() {
        let mut reg = Registry::new();
        let err = reg.set_parm(AlgorithmId::AesGcm, ParamId::KeyLen, ParamValue::Int(256)).unwrap_err();
        assert!(matches!(err, AmvpError::NoCap(_)));
    }

    #[test]
    fn domain_and_singleton_are_mutually_exclusive() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::AesCbcCs2, Arc::new(NoopCallback)).unwrap();
        reg.set_domain(AlgorithmId::AesCbcCs2, ParamId::KeyLen, 128, 256, 64).unwrap();
        let err = reg
            .set_parm(AlgorithmId::AesCbcCs2, ParamId::KeyLen, ParamValue::Int(128))
            .unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn domain_rejects_bad_step() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::AesCbcCs3, Arc::new(NoopCallback)).unwrap();
        let err = reg.set_domain(AlgorithmId::AesCbcCs3, ParamId::PtLen, 0, 127, 8).unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn disallowed_param_for_family_is_rejected() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::HmacSha2_256, Arc::new(NoopCallback)).unwrap();
        let err = reg
            .set_parm(AlgorithmId::HmacSha2_256, ParamId::IvLen, ParamValue::Int(96))
            .unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn empty_prereq_value_rejected() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::EcdsaSigVer, Arc::new(NoopCallback)).unwrap();
        let err = reg.set_prereq(AlgorithmId::EcdsaSigVer, "SHA", "").unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn sealed_registry_rejects_mutation() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::AesGcm, Arc::new(NoopCallback)).unwrap();
        reg.seal();
        let err = reg.enable(AlgorithmId::AesCcm, Arc::new(NoopCallback)).unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut reg = Registry::new();
        reg.enable(AlgorithmId::AesCcm, Arc::new(NoopCallback)).unwrap();
        reg.enable(AlgorithmId::AesGcm, Arc::new(NoopCallback)).unwrap();
        reg.enable(AlgorithmId::HmacSha2_256, Arc::new(NoopCallback)).unwrap();
        assert_eq!(
            reg.registration_order(),
            &[AlgorithmId::AesCcm, AlgorithmId::AesGcm, AlgorithmId::HmacSha2_256]
        );
    }
}
