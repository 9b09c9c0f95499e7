use std::collections::BTreeMap;

/// Request environment handed to the auth gate: headers, cookies and the
/// like, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestEnv {
    vars: BTreeMap<String, String>,
}

impl RequestEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthDecision {
    pub authorized: bool,
    /// Response headers the gate wants set, such as cookies.
    pub headers: Vec<(String, String)>,
    /// Appearance stored with the session; takes precedence over the token.
    pub theme: Option<usize>,
}

impl AuthDecision {
    pub fn allow() -> Self {
        Self {
            authorized: true,
            ..Self::default()
        }
    }

    pub fn deny() -> Self {
        Self::default()
    }
}

pub trait AuthGate: Send + Sync {
    fn check(&self, env: &RequestEnv) -> AuthDecision;
}

/// Lets every request through.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenGate;

impl AuthGate for OpenGate {
    fn check(&self, _env: &RequestEnv) -> AuthDecision {
        AuthDecision::allow()
    }
}
