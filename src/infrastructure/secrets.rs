//! Server-held API keys read from the environment.
//!
//! Keys never leave the server: `Debug` redacts them and handlers only ever
//! report whether a key is present.

use crate::error::ProxyError;
use std::env;
use std::fmt;

pub const BOK_API_KEY: &str = "BOK_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const APP_SHARED_KEY: &str = "APP_SHARED_KEY";

#[derive(Clone, Default)]
pub struct Secrets {
    bok_api_key: Option<String>,
    openai_api_key: Option<String>,
    app_shared_key: Option<String>,
}

impl Secrets {
    pub fn new(
        bok_api_key: Option<String>,
        openai_api_key: Option<String>,
        app_shared_key: Option<String>,
    ) -> Self {
        Self {
            bok_api_key: non_empty(bok_api_key),
            openai_api_key: non_empty(openai_api_key),
            app_shared_key: non_empty(app_shared_key),
        }
    }

    /// Read every key from the process environment. Empty values count as unset.
    pub fn from_env() -> Self {
        Self::new(
            env::var(BOK_API_KEY).ok(),
            env::var(OPENAI_API_KEY).ok(),
            env::var(APP_SHARED_KEY).ok(),
        )
    }

    pub fn bok_api_key(&self) -> Result<&str, ProxyError> {
        self.bok_api_key
            .as_deref()
            .ok_or(ProxyError::MissingSecret(BOK_API_KEY))
    }

    pub fn openai_api_key(&self) -> Result<&str, ProxyError> {
        self.openai_api_key
            .as_deref()
            .ok_or(ProxyError::MissingSecret(OPENAI_API_KEY))
    }

    pub fn has_bok_api_key(&self) -> bool {
        self.bok_api_key.is_some()
    }

    pub fn has_openai_api_key(&self) -> bool {
        self.openai_api_key.is_some()
    }

    /// Check a caller-supplied shared key.
    pub fn verify_app_key(&self, presented: Option<&str>) -> Result<(), ProxyError> {
        let expected = self
            .app_shared_key
            .as_deref()
            .ok_or(ProxyError::MissingSecret(APP_SHARED_KEY))?;
        match presented {
            Some(key) if key == expected => Ok(()),
            _ => Err(ProxyError::Unauthorized),
        }
    }

    pub fn log_status(&self) {
        for (name, present) in [
            (BOK_API_KEY, self.bok_api_key.is_some()),
            (OPENAI_API_KEY, self.openai_api_key.is_some()),
            (APP_SHARED_KEY, self.app_shared_key.is_some()),
        ] {
            if present {
                tracing::info!("{} found", name);
            } else {
                tracing::warn!("{} not set - routes that need it will answer 500", name);
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "***" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("bok_api_key", &mask(&self.bok_api_key))
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("app_shared_key", &mask(&self.app_shared_key))
            .finish()
    }
}
