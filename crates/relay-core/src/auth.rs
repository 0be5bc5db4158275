//! Per-session auth token and side-channel header suffix.
//!
//! The relay expects a `mediaAuth` cookie credential plus the client's
//! User-Agent, carried behind a `|` delimiter appended to the playable URL.
//! The host player understands the delimiter and turns the suffix into
//! request headers; intermediate HTTP layers never see it as a query
//! parameter, so it is not logged or cached along the way.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

/// Side-channel delimiter separating the playable URL from its header suffix.
pub const HEADER_DELIMITER: char = '|';

type HmacSha256 = Hmac<Sha256>;

/// Header suffix carrying the session credential and client identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSuffix(String);

impl AuthSuffix {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append this suffix to a resolved URL behind the side-channel delimiter.
    pub fn apply(&self, url: &str) -> String {
        format!("{url}{HEADER_DELIMITER}{}", self.0)
    }
}

/// Builds a fresh salted token per playback session.
///
/// Tokens live for a single session and are never cached or reused across
/// requests: each `build_suffix` call draws a new random salt and signs it
/// under the session key.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    session_key: Vec<u8>,
    user_agent: String,
}

impl SessionAuth {
    pub fn new(session_key: impl Into<Vec<u8>>, user_agent: impl Into<String>) -> Self {
        Self {
            session_key: session_key.into(),
            user_agent: user_agent.into(),
        }
    }

    /// New session with a randomly drawn key.
    pub fn generate(user_agent: impl Into<String>) -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self::new(key.to_vec(), user_agent)
    }

    /// Derive the signed token for a given salt. Hex-encoded HMAC-SHA256.
    fn sign(&self, salt: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.session_key)
            .expect("HMAC accepts keys of any length");
        mac.update(salt);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Build the header suffix with a fresh random salt.
    pub fn build_suffix(&self) -> AuthSuffix {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        self.build_suffix_with_salt(&salt)
    }

    /// Deterministic variant, split out for tests.
    pub fn build_suffix_with_salt(&self, salt: &[u8]) -> AuthSuffix {
        let token = self.sign(salt);
        let agent = urlencoding::encode(&self.user_agent);
        AuthSuffix(format!(
            "cookie=mediaAuth%3D%22{token}%22&user-agent={agent}"
        ))
    }
}
