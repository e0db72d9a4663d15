//! Test-case handlers (spec §4.6): one module per algorithm family, each
//! following the same five-phase pattern —
//!
//! 1. parse group-level parameters, verify against the capability, append a
//!    response-group skeleton with `tgId`;
//! 2. parse per-case fields, length-checking every hex string against
//!    family maxima before decoding;
//! 3. construct a typed [`TestCase`], call the operator callback;
//! 4. format outputs (produced-value fields for AFT/GDT, `testPassed` only
//!    for VAL);
//! 5. release the [`TestCase`] (its buffers are dropped with it).
//!
//! A handler is selected from the incoming vector-set's `(algorithm, mode)`
//! pair by [`crate::dispatch::Dispatcher`].

pub mod aead;
pub mod cmac;
pub mod ecdsa;
pub mod hmac;
pub mod kas;
pub mod kda;
pub mod kdf108;
pub mod keywrap;
pub mod rsa_keygen;
pub mod sym;

use crate::registry::Capability;
use serde_json::Value;

/// The kind of test requested for one group (spec §3 "TestType").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestType {
    /// Algorithm-functional test: generate a value.
    Aft,
    /// Validate a value supplied by the server.
    Val,
    /// Monte-Carlo stateful chain.
    Mct,
    /// Generated-data test (RSA domain-parameter variant).
    Gdt,
    /// Known-answer test (RSA variant).
    Kat,
}

impl TestType {
    pub fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "AFT" => Ok(TestType::Aft),
            "VAL" => Ok(TestType::Val),
            "MCT" => Ok(TestType::Mct),
            "GDT" => Ok(TestType::Gdt),
            "KAT" => Ok(TestType::Kat),
            other => Err(crate::error::AmvpError::invalid_arg(
                "testType",
                format!("unknown test type {other}"),
            )),
        }
    }
}

/// Cipher/signature direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    pub fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "encrypt" => Ok(Direction::Encrypt),
            "decrypt" => Ok(Direction::Decrypt),
            other => Err(crate::error::AmvpError::invalid_arg("direction", format!("unknown direction {other}"))),
        }
    }
}

/// AEAD IV generation source (spec §4.6.b).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IvGenSource {
    Internal,
    External,
}

impl IvGenSource {
    pub fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "internal" => Ok(IvGenSource::Internal),
            "external" => Ok(IvGenSource::External),
            other => Err(crate::error::AmvpError::invalid_arg("ivGen", format!("unknown ivGen source {other}"))),
        }
    }
}

/// A single tagged token in a KDA `fixedInfoPattern` (spec §3 "Pattern array").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternToken {
    UPartyInfo,
    VPartyInfo,
    Context,
    AlgorithmIdBytes,
    Label,
    LBytes,
    T,
    Literal(Vec<u8>),
}

/// Family-specific test-case payloads (spec §3 "TestCase" — a tagged
/// union, one variant per family). Every variant owns its byte-buffers by
/// value; they are released (dropped) when the handler returns.
pub enum TestCase {
    SymCipher(sym::SymCipherTc),
    Aead(aead::AeadTc),
    KeyWrap(keywrap::KeyWrapTc),
    Mac(hmac::MacTc),
    RsaKeyGen(rsa_keygen::RsaKeyGenTc),
    Ecdsa(ecdsa::EcdsaTc),
    Kda(kda::KdaTc),
    Kas(kas::KasTc),
    Kdf108(kdf108::Kdf108Tc),
}

/// The operator callback's view into one in-flight test case (spec §6
/// "Operator callback ABI"). A single trait, implemented once for the
/// [`TestCase`] enum (rather than one impl per variant) keeps the callback
/// signature monomorphic; each accessor simply returns `None`/no-ops for
/// fields that don't apply to the active variant.
pub trait TestCaseIo {
    fn get_bytes(&self, field: TcField) -> Option<&[u8]>;
    fn set_bytes(&mut self, field: TcField, value: Vec<u8>);
    fn get_int(&self, field: TcField) -> Option<i64>;
    fn set_int(&mut self, field: TcField, value: i64);
    fn get_bool(&self, field: TcField) -> Option<bool>;
    fn set_bool(&mut self, field: TcField, value: bool);
}

/// Names of the byte/int/bool fields a callback may read or write, shared
/// across all families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TcField {
    Key,
    Iv,
    Tweak,
    Msg,
    Aad,
    Pt,
    Ct,
    Tag,
    Mac,
    Z,
    T,
    Salt,
    UPartyId,
    VPartyId,
    Label,
    Context,
    AlgorithmIdBytes,
    Dkm,
    P,
    Q,
    N,
    D,
    E,
    XP,
    XP1,
    XP2,
    XQ,
    XQ1,
    XQ2,
    Seed,
    QX,
    QY,
    R,
    S,
    KeyIn,
    KeyOut,
    FixedData,
    Success,
    Modulo,
    L,
}

impl TestCaseIo for TestCase {
    fn get_bytes(&self, field: TcField) -> Option<&[u8]> {
        match self {
            TestCase::SymCipher(tc) => tc.get_bytes(field),
            TestCase::Aead(tc) => tc.get_bytes(field),
            TestCase::KeyWrap(tc) => tc.get_bytes(field),
            TestCase::Mac(tc) => tc.get_bytes(field),
            TestCase::RsaKeyGen(tc) => tc.get_bytes(field),
            TestCase::Ecdsa(tc) => tc.get_bytes(field),
            TestCase::Kda(tc) => tc.get_bytes(field),
            TestCase::Kas(tc) => tc.get_bytes(field),
            TestCase::Kdf108(tc) => tc.get_bytes(field),
        }
    }

    fn set_bytes(&mut self, field: TcField, value: Vec<u8>) {
        match self {
            TestCase::SymCipher(tc) => tc.set_bytes(field, value),
            TestCase::Aead(tc) => tc.set_bytes(field, value),
            TestCase::KeyWrap(tc) => tc.set_bytes(field, value),
            TestCase::Mac(tc) => tc.set_bytes(field, value),
            TestCase::RsaKeyGen(tc) => tc.set_bytes(field, value),
            TestCase::Ecdsa(tc) => tc.set_bytes(field, value),
            TestCase::Kda(tc) => tc.set_bytes(field, value),
            TestCase::Kas(tc) => tc.set_bytes(field, value),
            TestCase::Kdf108(tc) => tc.set_bytes(field, value),
        }
    }

    fn get_int(&self, field: TcField) -> Option<i64> {
        match self {
            TestCase::SymCipher(tc) => tc.get_int(field),
            TestCase::Aead(tc) => tc.get_int(field),
            TestCase::KeyWrap(tc) => tc.get_int(field),
            TestCase::Mac(tc) => tc.get_int(field),
            TestCase::RsaKeyGen(tc) => tc.get_int(field),
            TestCase::Ecdsa(tc) => tc.get_int(field),
            TestCase::Kda(tc) => tc.get_int(field),
            TestCase::Kas(tc) => tc.get_int(field),
            TestCase::Kdf108(tc) => tc.get_int(field),
        }
    }

    fn set_int(&mut self, field: TcField, value: i64) {
        match self {
            TestCase::SymCipher(tc) => tc.set_int(field, value),
            TestCase::Aead(tc) => tc.set_int(field, value),
            TestCase::KeyWrap(tc) => tc.set_int(field, value),
            TestCase::Mac(tc) => tc.set_int(field, value),
            TestCase::RsaKeyGen(tc) => tc.set_int(field, value),
            TestCase::Ecdsa(tc) => tc.set_int(field, value),
            TestCase::Kda(tc) => tc.set_int(field, value),
            TestCase::Kas(tc) => tc.set_int(field, value),
            TestCase::Kdf108(tc) => tc.set_int(field, value),
        }
    }

    fn get_bool(&self, field: TcField) -> Option<bool> {
        match self {
            TestCase::SymCipher(tc) => tc.get_bool(field),
            TestCase::Aead(tc) => tc.get_bool(field),
            TestCase::KeyWrap(tc) => tc.get_bool(field),
            TestCase::Mac(tc) => tc.get_bool(field),
            TestCase::RsaKeyGen(tc) => tc.get_bool(field),
            TestCase::Ecdsa(tc) => tc.get_bool(field),
            TestCase::Kda(tc) => tc.get_bool(field),
            TestCase::Kas(tc) => tc.get_bool(field),
            TestCase::Kdf108(tc) => tc.get_bool(field),
        }
    }

    fn set_bool(&mut self, field: TcField, value: bool) {
        match self {
            TestCase::SymCipher(tc) => tc.set_bool(field, value),
            TestCase::Aead(tc) => tc.set_bool(field, value),
            TestCase::KeyWrap(tc) => tc.set_bool(field, value),
            TestCase::Mac(tc) => tc.set_bool(field, value),
            TestCase::RsaKeyGen(tc) => tc.set_bool(field, value),
            TestCase::Ecdsa(tc) => tc.set_bool(field, value),
            TestCase::Kda(tc) => tc.set_bool(field, value),
            TestCase::Kas(tc) => tc.set_bool(field, value),
            TestCase::Kdf108(tc) => tc.set_bool(field, value),
        }
    }
}

/// A handler for one algorithm family, selected by [`crate::dispatch::Dispatcher`]
/// from the (algorithm, mode) pair named in the incoming vector set.
pub trait TestGroupHandler: Send + Sync {
    /// Process every test group in `groups` against `capability`, returning
    /// the `testGroups` array of the response (spec §4.6 phase flow).
    fn run(&self, capability: &Capability, groups: &[Value]) -> crate::error::Result<Vec<Value>>;
}

/// Upper bound on any single hex-decoded buffer a handler will accept, used
/// as the `max_len` argument to [`require_hex`]/[`optional_hex`] unless a
/// family registers a tighter one (spec §9 hex-decode length contract).
pub(crate) const MAX_BUF_LEN: usize = 1 << 20;

/// Shared helper: read a required positive-integer `tgId`/`tcId` field.
pub(crate) fn require_id(obj: &Value, field: &'static str) -> crate::error::Result<i64> {
    obj.get(field)
        .and_then(Value::as_i64)
        .filter(|v| *v > 0)
        .ok_or_else(|| crate::error::AmvpError::MalformedJson(format!("missing or invalid `{field}`")))
}

/// Shared helper: read a required string field.
pub(crate) fn require_str<'a>(obj: &'a Value, field: &'static str) -> crate::error::Result<&'a str> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| crate::error::AmvpError::missing_arg(field))
}

/// Shared helper: read a required hex string field and decode it, bounded
/// by `max_len` bytes.
pub(crate) fn require_hex(obj: &Value, field: &'static str, max_len: usize) -> crate::error::Result<Vec<u8>> {
    let s = require_str(obj, field)?;
    crate::codec::hex_to_bytes(s, max_len)
}

/// Shared helper: read an optional hex string field, defaulting to an empty
/// buffer when absent.
pub(crate) fn optional_hex(obj: &Value, field: &'static str, max_len: usize) -> crate::error::Result<Vec<u8>> {
    match obj.get(field).and_then(Value::as_str) {
        Some(s) => crate::codec::hex_to_bytes(s, max_len),
        None => Ok(Vec::new()),
    }
}

/// Shared helper: read a required integer field.
pub(crate) fn require_int(obj: &Value, field: &'static str) -> crate::error::Result<i64> {
    obj.get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| crate::error::AmvpError::missing_arg(field))
}
