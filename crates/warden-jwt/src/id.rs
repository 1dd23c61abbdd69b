//! Token identifier (`jti`) generation.

use crate::error::TokenError;
use rand::TryRngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use uuid::{Builder, Uuid};

/// A source of unique token identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh identifier.
    fn generate(&self) -> Result<String, TokenError>;
}

impl<G: IdGenerator + ?Sized> IdGenerator for Arc<G> {
    fn generate(&self) -> Result<String, TokenError> {
        (**self).generate()
    }
}

/// Random (v4) UUIDs drawn from the operating system RNG.
///
/// Unlike `Uuid::new_v4`, an RNG failure surfaces as
/// [`TokenError::IdGenerationFailed`] instead of a panic.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUuid;

impl RandomUuid {
    fn next_uuid(&self) -> Result<Uuid, TokenError> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| TokenError::IdGenerationFailed(e.to_string()))?;
        Ok(Builder::from_random_bytes(bytes).into_uuid())
    }
}

impl IdGenerator for RandomUuid {
    fn generate(&self) -> Result<String, TokenError> {
        Ok(self.next_uuid()?.hyphenated().to_string())
    }
}
