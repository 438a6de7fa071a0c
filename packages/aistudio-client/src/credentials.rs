//! API key and base URL.
//!
//! Uses the `secrecy` crate so the API key never ends up in logs, debug
//! output or error messages.

use std::fmt;

use secrecy::{ExposeSecret, SecretBox};

use crate::error::{AiStudioError, Result};

/// Default AI Studio API base URL.
pub const DEFAULT_API_URL: &str = "https://api-aistudio.oxylabs.io";

const REDACTED: &str = "[REDACTED]";

/// An AI Studio API key. Never printed; only the transport reads it.
pub struct ApiKey(SecretBox<str>);

impl ApiKey {
    /// Surrounding whitespace is dropped; a blank key is a config error.
    pub fn parse(raw: &str) -> Result<Self> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(AiStudioError::Config("API key is empty".into()));
        }
        Ok(Self(SecretBox::new(Box::from(key))))
    }

    /// Value for the `x-api-key` header.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for ApiKey {
    fn clone(&self) -> Self {
        Self(SecretBox::new(Box::from(self.expose())))
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// API key plus base URL, fixed for the lifetime of a client.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: ApiKey,
    api_url: String,
}

impl Credentials {
    /// Credentials against the default API URL.
    pub fn new(api_key: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            api_key: ApiKey::parse(api_key.as_ref())?,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Override the base URL. Trailing slashes are dropped.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Result<Self> {
        let api_url = api_url.into();
        url::Url::parse(&api_url)
            .map_err(|e| AiStudioError::Config(format!("invalid API URL {}: {}", api_url, e)))?;
        self.api_url = api_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Read `AISTUDIO_API_KEY` and the optional `AISTUDIO_API_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("AISTUDIO_API_KEY")
            .map_err(|_| AiStudioError::Config("AISTUDIO_API_KEY not set".into()))?;
        let credentials = Self::new(api_key)?;

        match std::env::var("AISTUDIO_API_URL") {
            Ok(api_url) if !api_url.trim().is_empty() => credentials.with_api_url(api_url),
            _ => Ok(credentials),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_in_debug() {
        let secret = ApiKey::parse("ak-super-secret-key").unwrap();
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("ak-super"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_key_not_in_display() {
        let secret = ApiKey::parse("ak-super-secret-key").unwrap();
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(secret.expose(), "ak-super-secret-key");
    }

    #[test]
    fn test_credentials_debug_redacts_key() {
        let creds = Credentials::new("ak-super-secret-key").unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("ak-super"));
        assert!(debug.contains(DEFAULT_API_URL));
    }

    #[test]
    fn test_api_url_trailing_slash_trimmed() {
        let creds = Credentials::new("key")
            .unwrap()
            .with_api_url("https://staging.example.com/")
            .unwrap();
        assert_eq!(creds.api_url(), "https://staging.example.com");
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let err = Credentials::new("key")
            .unwrap()
            .with_api_url("not a url")
            .unwrap_err();
        assert!(matches!(err, AiStudioError::Config(_)));
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            Credentials::new(""),
            Err(AiStudioError::Config(_))
        ));
        assert!(matches!(
            Credentials::new("   "),
            Err(AiStudioError::Config(_))
        ));
    }

    #[test]
    fn test_key_whitespace_trimmed() {
        let creds = Credentials::new("  ak-key\n").unwrap();
        assert_eq!(creds.api_key.expose(), "ak-key");
    }
}
