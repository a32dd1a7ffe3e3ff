//! Bearer credential sources consulted before every gateway call.
//!
//! A source is asked again on each request; nothing here caches a token on
//! behalf of the gateway. Returning `None` means "send the request
//! unauthenticated", not an error.

use std::env;
use std::sync::{Arc, RwLock};

/// Supplies the bearer credential for the current principal, if any.
pub trait CredentialSource: Send + Sync {
    fn credential(&self) -> Option<String>;
}

impl<F> CredentialSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn credential(&self) -> Option<String> {
        self()
    }
}

/// Always unauthenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredential;

impl CredentialSource for NoCredential {
    fn credential(&self) -> Option<String> {
        None
    }
}

/// Fixed token, mostly useful for tests and scripts.
#[derive(Debug, Clone)]
pub struct StaticCredential(Option<String>);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredential {
    fn credential(&self) -> Option<String> {
        self.0.as_deref().and_then(non_blank)
    }
}

/// Reads the token from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl CredentialSource for EnvCredential {
    fn credential(&self) -> Option<String> {
        env::var(&self.var).ok().as_deref().and_then(non_blank)
    }
}

/// Updatable token slot shared between a session provider and the gateway.
///
/// Clones share the same slot: a sign-in or refresh through one handle is
/// visible to the next request made with any other.
#[derive(Debug, Clone, Default)]
pub struct SharedCredential {
    slot: Arc<RwLock<Option<String>>>,
}

impl SharedCredential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.write() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.write() = None;
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<String>> {
        match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CredentialSource for SharedCredential {
    fn credential(&self) -> Option<String> {
        let slot = match self.slot.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.as_deref().and_then(non_blank)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
