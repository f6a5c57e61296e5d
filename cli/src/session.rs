use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use rand::Rng;
use sha2::{Digest, Sha256};

/// How long a token stays valid after login.
pub(crate) const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct Session {
    user_id: String,
    expires_at: Instant,
}

/// In-memory bearer sessions. Tokens are handed out once and only their
/// SHA-256 digest is kept, mapped to the user id they authenticate. Tokens
/// expire after a fixed lifetime; expired ones are dropped on the next login.
pub(crate) struct Sessions {
    ttl: Duration,
    by_digest: RwLock<HashMap<String, Session>>,
}

impl Default for Sessions {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl Sessions {
    pub(crate) fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            by_digest: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn issue(&self, user_id: &str) -> String {
        let bytes: [u8; 32] = rand::rng().random();
        let token = to_hex(&bytes);
        let now = Instant::now();

        let mut sessions = self
            .by_digest
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            digest(&token),
            Session {
                user_id: user_id.to_string(),
                expires_at: now + self.ttl,
            },
        );
        token
    }

    pub(crate) fn resolve(&self, token: &str) -> Option<String> {
        self.by_digest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&digest(token))
            .filter(|s| s.expires_at > Instant::now())
            .map(|s| s.user_id.clone())
    }

    pub(crate) fn revoke(&self, token: &str) -> bool {
        self.by_digest
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&digest(token))
            .is_some()
    }
}

fn digest(token: &str) -> String {
    to_hex(&Sha256::digest(token.as_bytes()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        })
}
