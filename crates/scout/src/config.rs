//! Startup configuration read from the environment.

use std::env;

use scout_openai_model::{DEFAULT_BASE_URL, DEFAULT_MODEL};

use crate::Credential;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";
/// Environment variable overriding the endpoint base URL.
pub const BASE_URL_VAR: &str = "SCOUT_BASE_URL";
/// Environment variable overriding the model name.
pub const MODEL_VAR: &str = "SCOUT_MODEL";

/// Settings for a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The initial API key. It may be absent and supplied later.
    pub credential: Credential,
    /// Base URL of the OpenAI-compatible endpoint.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// Call [`dotenvy::dotenv`] first to pick up a `.env` file.
    #[inline]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`. Unset or blank variables
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        Self {
            credential: Credential::new(non_blank(API_KEY_VAR)),
            base_url: non_blank(BASE_URL_VAR)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            model: non_blank(MODEL_VAR)
                .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.credential.is_present());
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.model, "llama3-8b-8192");
    }

    #[test]
    fn test_from_lookup() {
        let vars = HashMap::from([
            (API_KEY_VAR, "gsk_test_key_123"),
            (BASE_URL_VAR, "http://localhost:8080/v1"),
            (MODEL_VAR, "   "),
        ]);
        let config =
            Config::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.credential.get(), Some("gsk_test_key_123"));
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, DEFAULT_MODEL);
    }
}
