use std::fmt::Debug;

use cdp_common::Secret;

/// Decides which credential a [`super::SupabaseDatabase`] presents as its bearer token.
pub trait Capability: Clone + Debug {
    fn bearer<'a>(&'a self, anon_key: &'a Secret<String>, caller_token: Option<&'a Secret<String>>) -> &'a str;

    fn is_privileged(&self) -> bool;
}

/// Full access with the service role key. Row-level security is bypassed, so the engine's own checks are the only
/// guard.
#[derive(Clone, Debug)]
pub struct ServiceRole {
    key: Secret<String>,
}

impl ServiceRole {
    pub fn new(key: Secret<String>) -> Self {
        Self { key }
    }
}

impl Capability for ServiceRole {
    fn bearer<'a>(&'a self, _anon_key: &'a Secret<String>, _caller_token: Option<&'a Secret<String>>) -> &'a str {
        self.key.reveal()
    }

    fn is_privileged(&self) -> bool {
        true
    }
}

/// The public anon key, or the caller's own access token once scoped to a session. Everything is subject to the
/// database's row-level security policies.
#[derive(Clone, Debug, Default)]
pub struct Anonymous;

impl Capability for Anonymous {
    fn bearer<'a>(&'a self, anon_key: &'a Secret<String>, caller_token: Option<&'a Secret<String>>) -> &'a str {
        caller_token.unwrap_or(anon_key).reveal()
    }

    fn is_privileged(&self) -> bool {
        false
    }
}
