//! Signing keys for issued tokens.
//!
//! The active key signs; retired keys are kept so tokens issued before a
//! rotation still verify until the key is dropped.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use jsonwebtoken::{DecodingKey, EncodingKey};
use tracing::info;

use super::errors::AuthError;

/// HMAC secret plus the id written to the token's `kid` header.
#[derive(Clone)]
pub struct SigningKey {
    id: String,
    secret: Vec<u8>,
}

impl SigningKey {
    pub fn new(id: impl Into<String>, secret: impl AsRef<[u8]>) -> Self {
        Self { id: id.into(), secret: secret.as_ref().to_vec() }
    }

    pub fn id(&self) -> &str { &self.id }

    pub fn encoding_key(&self) -> EncodingKey { EncodingKey::from_secret(&self.secret) }

    pub fn decoding_key(&self) -> DecodingKey { DecodingKey::from_secret(&self.secret) }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").field("id", &self.id).field("secret", &"<redacted>").finish()
    }
}

/// Source of signing and verification keys.
pub trait KeyProvider: Send + Sync {
    /// Key used to sign new tokens.
    fn active(&self) -> Arc<SigningKey>;
    /// Any key still accepted for verification, active or retired.
    fn find(&self, kid: &str) -> Option<Arc<SigningKey>>;
}

struct KeySet {
    active: Arc<SigningKey>,
    retired: Vec<Arc<SigningKey>>,
}

/// Key provider built from configuration at startup.
///
/// Readers never block: rotation swaps in a whole new key set.
pub struct StaticKeyProvider {
    keys: ArcSwap<KeySet>,
}

impl StaticKeyProvider {
    pub fn new(active: SigningKey, retired: Vec<SigningKey>) -> Self {
        let set = KeySet {
            active: Arc::new(active),
            retired: retired.into_iter().map(Arc::new).collect(),
        };
        Self { keys: ArcSwap::from_pointee(set) }
    }

    /// Build from `[auth]` settings; the secret must already be validated.
    pub fn from_settings(settings: &configs::AuthSettings) -> Result<Self, AuthError> {
        if settings.jwt_secret.is_empty() {
            return Err(AuthError::Validation("auth.jwt_secret is empty".into()));
        }
        let active = SigningKey::new(settings.key_id.clone(), settings.jwt_secret.as_bytes());
        let retired = settings
            .retired_keys
            .iter()
            .map(|k| SigningKey::new(k.id.clone(), k.secret.as_bytes()))
            .collect();
        Ok(Self::new(active, retired))
    }

    /// Make `next` the signing key. The previous active key is retired, not dropped.
    pub fn rotate(&self, next: SigningKey) {
        let next = Arc::new(next);
        self.keys.rcu(|set| {
            let mut retired: Vec<Arc<SigningKey>> = Vec::with_capacity(set.retired.len() + 1);
            retired.push(set.active.clone());
            retired.extend(set.retired.iter().cloned());
            retired.retain(|k| k.id != next.id);
            KeySet { active: next.clone(), retired }
        });
        info!(kid = %next.id, "signing key rotated");
    }

    /// Stop accepting tokens signed with retired key `kid`. The active key cannot be dropped.
    pub fn drop_retired(&self, kid: &str) -> bool {
        let mut dropped = false;
        self.keys.rcu(|set| {
            let retired: Vec<Arc<SigningKey>> = set.retired.iter().filter(|k| k.id != kid).cloned().collect();
            dropped = retired.len() != set.retired.len();
            KeySet { active: set.active.clone(), retired }
        });
        dropped
    }
}

impl KeyProvider for StaticKeyProvider {
    fn active(&self) -> Arc<SigningKey> {
        self.keys.load().active.clone()
    }

    fn find(&self, kid: &str) -> Option<Arc<SigningKey>> {
        let set = self.keys.load();
        if set.active.id == kid {
            return Some(set.active.clone());
        }
        set.retired.iter().find(|k| k.id == kid).cloned()
    }
}
