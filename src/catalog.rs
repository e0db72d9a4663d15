//! Algorithm catalog: string <-> enum tables for algorithms, modes, curves,
//! hashes, MAC modes, RSA `randPQ` tokens, KDF108 modes, counter locations,
//! salt methods, and encodings (spec §4.2).
//!
//! Every lookup returns [`AmvpError::InvalidArg`] on failure; callers treat
//! that as a malformed-message error per spec §4.2.

use crate::error::{AmvpError, Result};
use std::fmt;

/// A closed enumeration identifying one (algorithm, mode) pair. Every
/// handler and [`crate::registry::Capability`] is keyed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AlgorithmId {
    AesEcb,
    AesCbc,
    AesCbcCs1,
    AesCbcCs2,
    AesCbcCs3,
    AesCfb1,
    AesCfb8,
    AesCfb128,
    AesOfb,
    AesCtr,
    AesXts,
    AesGcm,
    AesCcm,
    AesKw,
    AesKwp,
    TdesEcb,
    TdesCbc,
    TdesCfb1,
    TdesCfb8,
    TdesCfb64,
    TdesOfb,
    HmacSha1,
    HmacSha2_224,
    HmacSha2_256,
    HmacSha2_384,
    HmacSha2_512,
    CmacAes,
    CmacTdes,
    RsaKeyGen,
    EcdsaKeyGen,
    EcdsaSigGen,
    EcdsaSigVer,
    KdaHkdf,
    KdaOneStep,
    KdaTwoStep,
    KasFfcSsc,
    KasEccSsc,
    Kdf108,
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (alg, mode) = self.as_strs();
        match mode {
            Some(m) => write!(f, "{alg}/{m}"),
            None => write!(f, "{alg}"),
        }
    }
}

impl AlgorithmId {
    /// The `(algorithm, mode)` string pair the registration serializer and
    /// error messages use to name this id.
    pub fn as_strs(&self) -> (&'static str, Option<&'static str>) {
        use AlgorithmId::*;
        match self {
            AesEcb => ("AES", Some("ECB")),
            AesCbc => ("AES", Some("CBC")),
            AesCbcCs1 => ("AES", Some("CBC-CS1")),
            AesCbcCs2 => ("AES", Some("CBC-CS2")),
            AesCbcCs3 => ("AES", Some("CBC-CS3")),
            AesCfb1 => ("AES", Some("CFB1")),
            AesCfb8 => ("AES", Some("CFB8")),
            AesCfb128 => ("AES", Some("CFB128")),
            AesOfb => ("AES", Some("OFB")),
            AesCtr => ("AES", Some("CTR")),
            AesXts => ("AES", Some("XTS")),
            AesGcm => ("AES", Some("GCM")),
            AesCcm => ("AES", Some("CCM")),
            AesKw => ("AES", Some("KW")),
            AesKwp => ("AES", Some("KWP")),
            TdesEcb => ("TDES", Some("ECB")),
            TdesCbc => ("TDES", Some("CBC")),
            TdesCfb1 => ("TDES", Some("CFB1")),
            TdesCfb8 => ("TDES", Some("CFB8")),
            TdesCfb64 => ("TDES", Some("CFB64")),
            TdesOfb => ("TDES", Some("OFB")),
            HmacSha1 => ("HMAC", Some("SHA-1")),
            HmacSha2_224 => ("HMAC", Some("SHA2-224")),
            HmacSha2_256 => ("HMAC", Some("SHA2-256")),
            HmacSha2_384 => ("HMAC", Some("SHA2-384")),
            HmacSha2_512 => ("HMAC", Some("SHA2-512")),
            CmacAes => ("CMAC", Some("AES")),
            CmacTdes => ("CMAC", Some("TDES")),
            RsaKeyGen => ("RSA", Some("KeyGen")),
            EcdsaKeyGen => ("ECDSA", Some("KeyGen")),
            EcdsaSigGen => ("ECDSA", Some("SigGen")),
            EcdsaSigVer => ("ECDSA", Some("SigVer")),
            KdaHkdf => ("KDA", Some("HKDF")),
            KdaOneStep => ("KDA", Some("OneStep")),
            KdaTwoStep => ("KDA", Some("TwoStep")),
            KasFfcSsc => ("KAS-FFC-SSC", None),
            KasEccSsc => ("KAS-ECC-SSC", None),
            Kdf108 => ("KDF108", None),
        }
    }
}

/// Resolve a wire `(algorithm, mode)` pair into an [`AlgorithmId`].
pub fn resolve_algorithm_id(algorithm: &str, mode: Option<&str>) -> Result<AlgorithmId> {
    use AlgorithmId::*;
    let id = match (algorithm, mode) {
        ("AES", Some("ECB")) => AesEcb,
        ("AES", Some("CBC")) => AesCbc,
        ("AES", Some("CBC-CS1")) => AesCbcCs1,
        ("AES", Some("CBC-CS2")) => AesCbcCs2,
        ("AES", Some("CBC-CS3")) => AesCbcCs3,
        ("AES", Some("CFB1")) => AesCfb1,
        ("AES", Some("CFB8")) => AesCfb8,
        ("AES", Some("CFB128")) => AesCfb128,
        ("AES", Some("OFB")) => AesOfb,
        ("AES", Some("CTR")) => AesCtr,
        ("AES", Some("XTS")) => AesXts,
        ("AES", Some("GCM")) => AesGcm,
        ("AES", Some("CCM")) => AesCcm,
        ("AES", Some("KW")) => AesKw,
        ("AES", Some("KWP")) => AesKwp,
        ("TDES", Some("ECB")) => TdesEcb,
        ("TDES", Some("CBC")) => TdesCbc,
        ("TDES", Some("CFB1")) => TdesCfb1,
        ("TDES", Some("CFB8")) => TdesCfb8,
        ("TDES", Some("CFB64")) => TdesCfb64,
        ("TDES", Some("OFB")) => TdesOfb,
        ("HMAC", Some("SHA-1")) => HmacSha1,
        ("HMAC", Some("SHA2-224")) => HmacSha2_224,
        ("HMAC", Some("SHA2-256")) => HmacSha2_256,
        ("HMAC", Some("SHA2-384")) => HmacSha2_384,
        ("HMAC", Some("SHA2-512")) => HmacSha2_512,
        ("CMAC", Some("AES")) => CmacAes,
        ("CMAC", Some("TDES")) => CmacTdes,
        ("RSA", Some("KeyGen") | None) => RsaKeyGen,
        ("ECDSA", Some("KeyGen")) => EcdsaKeyGen,
        ("ECDSA", Some("SigGen")) => EcdsaSigGen,
        ("ECDSA", Some("SigVer")) => EcdsaSigVer,
        ("KDA", Some("HKDF")) => KdaHkdf,
        ("KDA", Some("OneStep")) => KdaOneStep,
        ("KDA", Some("TwoStep")) => KdaTwoStep,
        ("KAS-FFC-SSC", _) => KasFfcSsc,
        ("KAS-ECC-SSC", _) => KasEccSsc,
        ("KDF108", _) => Kdf108,
        _ => {
            return Err(AmvpError::invalid_arg(
                "algorithm",
                format!("unknown algorithm/mode pair ({algorithm}, {mode:?})"),
            ))
        }
    };
    Ok(id)
}

/// Named elliptic curves supported by ECDSA/KAS-ECC handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    P224,
    P256,
    P384,
    P521,
}

pub fn curve_from_str(s: &str) -> Result<Curve> {
    match s {
        "P-224" => Ok(Curve::P224),
        "P-256" => Ok(Curve::P256),
        "P-384" => Ok(Curve::P384),
        "P-521" => Ok(Curve::P521),
        other => Err(AmvpError::invalid_arg("curve", format!("unknown curve {other}"))),
    }
}

/// Hash algorithms used across MAC, KDA, and signature families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlg {
    Sha1,
    Sha2_224,
    Sha2_256,
    Sha2_384,
    Sha2_512,
}

pub fn hash_from_str(s: &str) -> Result<HashAlg> {
    match s {
        "SHA-1" => Ok(HashAlg::Sha1),
        "SHA2-224" => Ok(HashAlg::Sha2_224),
        "SHA2-256" => Ok(HashAlg::Sha2_256),
        "SHA2-384" => Ok(HashAlg::Sha2_384),
        "SHA2-512" => Ok(HashAlg::Sha2_512),
        other => Err(AmvpError::invalid_arg("hashAlg", format!("unknown hash {other}"))),
    }
}

/// MAC mode used by KDA's TwoStep construction (HMAC or CMAC family).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacMode {
    HmacSha2_256,
    HmacSha2_384,
    HmacSha2_512,
    CmacAes,
}

pub fn mac_mode_from_str(s: &str) -> Result<MacMode> {
    match s {
        "HMAC-SHA2-256" => Ok(MacMode::HmacSha2_256),
        "HMAC-SHA2-384" => Ok(MacMode::HmacSha2_384),
        "HMAC-SHA2-512" => Ok(MacMode::HmacSha2_512),
        "CMAC-AES" => Ok(MacMode::CmacAes),
        other => Err(AmvpError::invalid_arg("macMode", format!("unknown MAC mode {other}"))),
    }
}

/// RSA `randPQ` generation method tokens (FIPS 186-5 appendix B.3.2..B.3.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RandPq {
    B32,
    B33,
    B34,
    B35,
    B36,
}

pub fn rand_pq_from_str(s: &str) -> Result<RandPq> {
    match s {
        "provable" | "B.3.2" => Ok(RandPq::B32),
        "probable" | "B.3.3" => Ok(RandPq::B33),
        "provableWithProvableAux" | "B.3.4" => Ok(RandPq::B34),
        "provableWithProbableAux" | "B.3.5" => Ok(RandPq::B35),
        "probableWithProvableAux" | "B.3.6" => Ok(RandPq::B36),
        other => Err(AmvpError::invalid_arg("randPQ", format!("unknown randPQ token {other}"))),
    }
}

/// KDF108 construction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kdf108Mode {
    Counter,
    Feedback,
    DoublePipeline,
}

pub fn kdf108_mode_from_str(s: &str) -> Result<Kdf108Mode> {
    match s {
        "counter" => Ok(Kdf108Mode::Counter),
        "feedback" => Ok(Kdf108Mode::Feedback),
        "DPI" => Ok(Kdf108Mode::DoublePipeline),
        other => Err(AmvpError::invalid_arg("kdfMode", format!("unknown KDF108 mode {other}"))),
    }
}

/// Placement of the counter word in a KDF108 fixed-input-data stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterLocation {
    BeforeFixedData,
    AfterFixedData,
    MiddleFixedData,
}

pub fn counter_location_from_str(s: &str) -> Result<CounterLocation> {
    match s {
        "before fixed data" => Ok(CounterLocation::BeforeFixedData),
        "after fixed data" => Ok(CounterLocation::AfterFixedData),
        "middle fixed data" => Ok(CounterLocation::MiddleFixedData),
        other => Err(AmvpError::invalid_arg(
            "counterLocation",
            format!("unknown counter location {other}"),
        )),
    }
}

/// KDA salt generation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaltMethod {
    Default,
    Random,
}

pub fn salt_method_from_str(s: &str) -> Result<SaltMethod> {
    match s {
        "default" => Ok(SaltMethod::Default),
        "random" => Ok(SaltMethod::Random),
        other => Err(AmvpError::invalid_arg("saltMethod", format!("unknown salt method {other}"))),
    }
}

/// KDA fixedInfo encoding (the protocol names exactly one today).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Concatenation,
}

pub fn encoding_from_str(s: &str) -> Result<Encoding> {
    match s {
        "concatenation" => Ok(Encoding::Concatenation),
        other => Err(AmvpError::invalid_arg("encoding", format!("unknown encoding {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_pairs() {
        assert_eq!(resolve_algorithm_id("AES", Some("GCM")).unwrap(), AlgorithmId::AesGcm);
        assert_eq!(resolve_algorithm_id("KDA", Some("HKDF")).unwrap(), AlgorithmId::KdaHkdf);
        assert_eq!(resolve_algorithm_id("KAS-FFC-SSC", None).unwrap(), AlgorithmId::KasFfcSsc);
    }

    #[test]
    fn unknown_pair_is_invalid_arg() {
        let err = resolve_algorithm_id("AES", Some("NOPE")).unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn display_matches_wire_strings() {
        assert_eq!(AlgorithmId::AesGcm.to_string(), "AES/GCM");
        assert_eq!(AlgorithmId::KasFfcSsc.to_string(), "KAS-FFC-SSC");
    }
}
