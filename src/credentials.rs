//! Named settings lookup and delivery token resolution.
//!
//! Settings come from an INI file (keys at the top level or in an
//! `[appSettings]` section) and from process environment variables, with the
//! environment taking precedence.

use std::{collections::BTreeMap, env, fmt, path::Path};

use ini::Ini;
use uuid::Uuid;

use crate::error::{ConfigError, CredentialError};

/// Settings key holding the delivery token.
pub const TOKEN_KEY: &str = "LOGENTRIES_TOKEN";
/// Settings key enabling diagnostic output.
pub const DEBUG_KEY: &str = "LOGENTRIES_DEBUG";
/// Settings key selecting the TLS endpoint.
pub const TLS_KEY: &str = "LOGENTRIES_TLS";

const KNOWN_KEYS: [&str; 3] = [TOKEN_KEY, DEBUG_KEY, TLS_KEY];
const APP_SETTINGS_SECTION: &str = "appSettings";

/// Key/value application settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppSettings {
    values: BTreeMap<String, String>,
}

impl AppSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings taken only from the process environment.
    pub fn from_env() -> Self {
        Self::new().with_env_overrides()
    }

    /// Load settings from an INI file.
    pub fn from_ini_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Settings {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_ini(&ini))
    }

    /// Parse settings from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|err| ConfigError::Settings {
            path: "<inline>".into(),
            source: ini::Error::Parse(err),
        })?;
        Ok(Self::from_ini(&ini))
    }

    fn from_ini(ini: &Ini) -> Self {
        let mut values = BTreeMap::new();
        for (section, props) in ini.iter() {
            let wanted = match section {
                None => true,
                Some(name) => name.eq_ignore_ascii_case(APP_SETTINGS_SECTION),
            };
            if !wanted {
                continue;
            }
            for (key, value) in props.iter() {
                values.insert(key.to_string(), value.to_string());
            }
        }
        Self { values }
    }

    /// Overlay known keys present in the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        for key in KNOWN_KEYS {
            if let Ok(value) = env::var(key) {
                self.values.insert(key.to_string(), value);
            }
        }
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Read a boolean flag; `None` when the key is unset.
    pub fn get_flag(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(ConfigError::InvalidConfig(format!(
                "{key} must be true or false, got {other:?}"
            ))),
        }
    }
}

/// Validated delivery token prefixed to every payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Validate `raw` as a GUID-shaped token.
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Empty(TOKEN_KEY));
        }
        Uuid::parse_str(trimmed).map_err(|_| CredentialError::Malformed {
            key: TOKEN_KEY,
            value: raw.to_string(),
        })?;
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}

/// Look up and validate the delivery token.
pub fn resolve_token(settings: &AppSettings) -> Result<Token, CredentialError> {
    let raw = settings
        .get(TOKEN_KEY)
        .ok_or(CredentialError::Missing(TOKEN_KEY))?;
    Token::parse(raw)
}
