//! Bearer credential providers.
//!
//! A provider is consulted on every request, so a token that appears or
//! changes while a session is polling is picked up on the next tick.

use std::fmt;

/// Source of the bearer token attached to requests.
///
/// Returning `None` sends the request without an `Authorization` header,
/// which is valid for public books.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn bearer_token(&self) -> Option<String> {
        self()
    }
}

/// No credential at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CredentialProvider for Anonymous {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// A fixed token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(****)")
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        non_blank(&self.0)
    }
}

/// Reads the token from an environment variable on every request.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    /// Variable consulted by [`EnvToken::default`].
    pub const DEFAULT_VAR: &'static str = "BOOKIFY_AUTH_TOKEN";

    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

impl CredentialProvider for EnvToken {
    fn bearer_token(&self) -> Option<String> {
        std::env::var(&self.var).ok().and_then(|token| non_blank(&token))
    }
}

fn non_blank(token: &str) -> Option<String> {
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_has_no_token() {
        assert_eq!(Anonymous.bearer_token(), None);
    }

    #[test]
    fn test_static_token() {
        assert_eq!(StaticToken::new("abc").bearer_token(), Some("abc".to_string()));
        assert_eq!(StaticToken::new("  ").bearer_token(), None);
        assert_eq!(format!("{:?}", StaticToken::new("secret")), "StaticToken(****)");
    }

    #[test]
    fn test_closure_provider() {
        let provider = || Some("from-closure".to_string());
        assert_eq!(provider.bearer_token(), Some("from-closure".to_string()));
    }

    #[test]
    fn test_env_token_reads_each_call() {
        let provider = EnvToken::new("BOOKIFY_TEST_TOKEN_READS_EACH_CALL");
        std::env::remove_var(provider.var());
        assert_eq!(provider.bearer_token(), None);

        std::env::set_var(provider.var(), "t1");
        assert_eq!(provider.bearer_token(), Some("t1".to_string()));

        std::env::set_var(provider.var(), "");
        assert_eq!(provider.bearer_token(), None);
        std::env::remove_var(provider.var());
    }
}
