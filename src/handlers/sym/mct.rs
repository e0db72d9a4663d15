//! Symmetric Monte-Carlo driver (spec §4.7): preserves one cipher context
//! across the inner iterations of an MCT group.
//!
//! The source keeps this context in a module-level global
//! (`glb_cipher_ctx` in `app_aes.c`), freed only by an explicit
//! `app_aes_cleanup`. That is the REDESIGN FLAG spec §9 calls out — here
//! the context is a field on [`McrState`], owned by the symmetric handler,
//! and an RAII guard ensures it is released on every error path without a
//! `goto err` label.

use crate::error::{AmvpError, Result};

/// Number of inner iterations in a standard AES/TDES Monte-Carlo chain.
pub const MCT_INNER_ITERATIONS: usize = 1000;

/// Opaque per-chain cipher state. The handler never inspects its contents;
/// it only asks the operator callback to create one (index 0), step it
/// (every index), and finalize/release it (last index).
pub struct CipherContext {
    pub key: Vec<u8>,
    pub iv: Vec<u8>,
    pub live: bool,
}

/// The single preserved context for the life of one outer MCT case.
#[derive(Default)]
pub struct McrState {
    ctx: Option<CipherContext>,
}

impl McrState {
    pub fn new() -> Self {
        McrState { ctx: None }
    }

    /// True if a context is currently live (spec §8 scenario 3: "non-null
    /// preserved cipher context whose lifetime spans the entire group").
    pub fn is_live(&self) -> bool {
        self.ctx.as_ref().is_some_and(|c| c.live)
    }

    /// Initialize the context at `mct_index == 0`.
    pub fn init(&mut self, key: Vec<u8>, iv: Vec<u8>) -> Result<()> {
        if self.ctx.is_some() {
            return Err(AmvpError::invalid_arg("mct_index", "context already initialized"));
        }
        self.ctx = Some(CipherContext { key, iv, live: true });
        Ok(())
    }

    /// Borrow the live context, failing if none exists (an `update`/`finalize`
    /// call at `mct_index > 0` with no prior `init`).
    pub fn context(&self) -> Result<&CipherContext> {
        self.ctx
            .as_ref()
            .filter(|c| c.live)
            .ok_or_else(|| AmvpError::invalid_arg("mct_index", "no live cipher context"))
    }

    /// Release the context, at `mct_index == N - 1` or on any error path
    /// that would otherwise abandon a live chain.
    pub fn cleanup(&mut self) {
        self.ctx = None;
    }
}

/// RAII guard: releases the state's context on drop unless [`disarm`] was
/// called, replacing the source's `goto err; app_aes_cleanup();` pattern.
///
/// [`disarm`]: McrGuard::disarm
pub struct McrGuard<'a> {
    state: &'a mut McrState,
    armed: bool,
}

impl<'a> McrGuard<'a> {
    pub fn new(state: &'a mut McrState) -> Self {
        McrGuard { state, armed: true }
    }

    /// Call once the step completed without error and the context should
    /// remain live for the next iteration (or was already finalized and
    /// released on purpose).
    pub fn disarm(mut self) {
        self.armed = false;
    }

    /// Release the context now (the step that just ran was the chain's
    /// last) and disarm, so `Drop` does not double-release.
    pub fn release(mut self) {
        self.state.cleanup();
        self.armed = false;
    }
}

impl Drop for McrGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_chain_lifecycle() {
        let mut state = McrState::new();
        for i in 0..MCT_INNER_ITERATIONS {
            if i == 0 {
                state.init(vec![0u8; 16], vec![0u8; 16]).unwrap();
            }
            let guard = McrGuard::new(&mut state);
            assert!(guard.state.is_live());
            if i == MCT_INNER_ITERATIONS - 1 {
                guard.release();
            } else {
                guard.disarm();
            }
        }
        assert!(!state.is_live());
    }

    #[test]
    fn guard_releases_context_on_early_drop() {
        let mut state = McrState::new();
        state.init(vec![0u8; 16], vec![0u8; 16]).unwrap();
        {
            let _guard = McrGuard::new(&mut state);
            // simulate an error return without calling disarm()
        }
        assert!(!state.is_live());
    }

    #[test]
    fn double_init_rejected() {
        let mut state = McrState::new();
        state.init(vec![0u8; 16], vec![]).unwrap();
        assert!(state.init(vec![0u8; 16], vec![]).is_err());
    }
}
