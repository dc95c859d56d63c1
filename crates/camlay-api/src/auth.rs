// HTTP Digest authentication for the camera endpoint.
//
// The camera challenges every unauthenticated request with a 401 and a
// `WWW-Authenticate: Digest ...` header. The last challenge is cached so
// later requests can answer preemptively; a stale nonce simply produces a
// fresh 401 that replaces the cached challenge.

use std::sync::{Mutex, MutexGuard, PoisonError};

use digest_auth::{AuthContext, WwwAuthenticateHeader};
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};

use crate::error::Error;

/// Username/password pair applied to every request for the process lifetime.
#[derive(Debug, Clone)]
pub struct DigestCredentials {
    pub username: String,
    pub password: SecretString,
}

impl DigestCredentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Credentials plus the most recent server challenge.
pub(crate) struct DigestSession {
    credentials: DigestCredentials,
    challenge: Mutex<Option<WwwAuthenticateHeader>>,
}

impl DigestSession {
    pub(crate) fn new(credentials: DigestCredentials) -> Self {
        Self {
            credentials,
            challenge: Mutex::new(None),
        }
    }

    pub(crate) fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Answer the cached challenge for `uri`, if a challenge has been seen.
    pub(crate) fn authorization(&self, uri: &str) -> Result<Option<String>, Error> {
        let mut guard = self.cached_challenge();
        match guard.as_mut() {
            Some(challenge) => {
                trace!("answering cached digest challenge");
                self.respond(challenge, uri).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Parse a fresh `WWW-Authenticate` header, cache it, and answer it.
    pub(crate) fn accept_challenge(&self, header: &HeaderValue, uri: &str) -> Result<String, Error> {
        let raw = header.to_str().map_err(|e| Error::Authentication {
            message: format!("unreadable digest challenge: {e}"),
        })?;
        let mut challenge = digest_auth::parse(raw).map_err(|e| Error::Authentication {
            message: format!("unsupported authentication challenge: {e}"),
        })?;
        debug!(realm = %challenge.realm, "received digest challenge");

        let answer = self.respond(&mut challenge, uri)?;
        *self.cached_challenge() = Some(challenge);
        Ok(answer)
    }

    // Writes replace the whole challenge, so a poisoned value is still whole.
    fn cached_challenge(&self) -> MutexGuard<'_, Option<WwwAuthenticateHeader>> {
        self.challenge.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respond(&self, challenge: &mut WwwAuthenticateHeader, uri: &str) -> Result<String, Error> {
        let context = AuthContext::new(
            self.credentials.username.as_str(),
            self.credentials.password.expose_secret(),
            uri,
        );
        challenge
            .respond(&context)
            .map(|header| header.to_header_string())
            .map_err(|e| Error::Authentication {
                message: format!("failed to answer digest challenge: {e}"),
            })
    }
}
