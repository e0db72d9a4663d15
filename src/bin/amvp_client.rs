//! Minimal CLI demo client.
//!
//! Registers a handful of AES/HMAC capabilities with a toy crypto callback,
//! prints the registration message, then feeds one vector set (from a file
//! or stdin) through `Engine::process_vector_set` and prints the response.
//! This crate ships no [`amvp_engine::Transport`] implementation of its own
//! — fetching real vector sets from a server is left to the embedder.

#![forbid(unsafe_code)]

use amvp_engine::catalog::AlgorithmId;
use amvp_engine::handlers::{TcField, TestCaseIo};
use amvp_engine::registry::{CryptoCallback, ParamValue};
use amvp_engine::{AmvpError, Engine};
use std::io::Read;
use std::sync::Arc;

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

/// A toy callback that echoes plaintext back as ciphertext. Stands in for a
/// real module-under-test binding, which this crate deliberately does not
/// provide (spec §6).
struct EchoCallback;

impl CryptoCallback for EchoCallback {
    fn invoke(&self, tc: &mut dyn TestCaseIo) -> Result<(), AmvpError> {
        if let Some(pt) = tc.get_bytes(TcField::Pt) {
            let ct = pt.to_vec();
            tc.set_bytes(TcField::Ct, ct);
        }
        if let Some(msg) = tc.get_bytes(TcField::Msg) {
            let mac = msg.to_vec();
            tc.set_bytes(TcField::Mac, mac);
        }
        Ok(())
    }
}

fn build_engine() -> anyhow::Result<Engine> {
    let mut engine = Engine::new();
    {
        let registry = engine.registry_mut();
        registry.enable(AlgorithmId::AesEcb, Arc::new(EchoCallback))?;
        registry.set_domain(AlgorithmId::AesEcb, amvp_engine::registry::ParamId::KeyLen, 128, 256, 64)?;
        registry.enable(AlgorithmId::HmacSha2_256, Arc::new(EchoCallback))?;
        registry.set_parm(
            AlgorithmId::HmacSha2_256,
            amvp_engine::registry::ParamId::MacLen,
            ParamValue::Int(256),
        )?;
    }
    Ok(engine)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let mut engine = build_engine()?;

    if parse_flag(&args, "--registration").is_some() {
        println!("{}", engine.registration_json()?);
        return Ok(());
    }

    let input = match parse_flag(&args, "--vector-set") {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let response = engine.process_vector_set(&input)?;
    println!("{response}");
    Ok(())
}
