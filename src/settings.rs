use std::{fmt, sync::Arc};

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    SyncError, keys,
    storage::KvStore,
    validation::{lenient_bool, lenient_string},
};

/// Port the injection service's API listens on by default
pub const DEFAULT_PORT: u16 = 9096;

/// Normalised base URL of the injection service, without a trailing `/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    /// Parse a user-supplied endpoint
    ///
    /// Accepts a bare port (`9096`), `host:port`, or an `http`/`https` base URL.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidEndpoint` for empty input, a numeric value that is not a
    /// port in `1..=65535`, or anything that is not an http(s) URL with a host.
    pub fn parse(raw: &str) -> Result<Self, SyncError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SyncError::InvalidEndpoint(raw.to_owned()));
        }

        let digits = raw.strip_prefix('-').unwrap_or(raw);
        if digits.bytes().all(|b| b.is_ascii_digit()) {
            return match raw.parse::<u16>() {
                Ok(port) if port != 0 => Ok(Self::localhost(port)),
                _ => Err(SyncError::InvalidEndpoint(raw.to_owned())),
            };
        }

        let candidate = if raw.contains("://") {
            raw.to_owned()
        } else {
            format!("http://{raw}")
        };

        let url = Url::parse(&candidate).map_err(|_| SyncError::InvalidEndpoint(raw.to_owned()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(SyncError::InvalidEndpoint(raw.to_owned()));
        }

        Ok(Self(candidate.trim_end_matches('/').to_owned()))
    }

    /// Parse, falling back to the default endpoint on invalid input
    pub fn parse_or_default(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|e| {
            warn!(error = %e, fallback = %Self::default(), "using default endpoint");
            Self::default()
        })
    }

    #[must_use]
    pub fn localhost(port: u16) -> Self {
        Self(format!("http://localhost:{port}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append an absolute path such as `/rules`
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}{path}", self.0)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::localhost(DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage key a deployment treats as canonical for the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointKey {
    /// `port`, holding a bare port number
    #[default]
    Port,
    /// `apiBaseURL`, holding a full base URL
    ApiBaseUrl,
}

impl EndpointKey {
    #[must_use]
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Port => keys::PORT,
            Self::ApiBaseUrl => keys::API_BASE_URL,
        }
    }

    fn legacy(self) -> Self {
        match self {
            Self::Port => Self::ApiBaseUrl,
            Self::ApiBaseUrl => Self::Port,
        }
    }
}

/// Persisted user configuration
///
/// Every setter writes through to storage immediately; nothing here is debounced.
#[derive(Clone)]
pub struct Settings {
    storage: Arc<dyn KvStore>,
    endpoint_key: EndpointKey,
}

impl Settings {
    pub fn new(storage: Arc<dyn KvStore>, endpoint_key: EndpointKey) -> Self {
        Self {
            storage,
            endpoint_key,
        }
    }

    #[must_use]
    pub fn endpoint_key(&self) -> EndpointKey {
        self.endpoint_key
    }

    /// Endpoint text as the user last entered it
    ///
    /// Reads the canonical key first, then the other legacy key. Empty values count as unset.
    #[must_use]
    pub fn raw_endpoint(&self) -> Option<String> {
        [self.endpoint_key, self.endpoint_key.legacy()]
            .into_iter()
            .filter_map(|key| self.storage.get(key.storage_key()))
            .filter_map(|value| lenient_string(&value))
            .find(|value| !value.trim().is_empty())
    }

    /// Effective endpoint, the default when unset or invalid
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        match self.raw_endpoint() {
            Some(raw) => Endpoint::parse_or_default(&raw),
            None => Endpoint::default(),
        }
    }

    /// Persist the endpoint text under the canonical key
    ///
    /// The text is stored as typed; validation happens when it is read back.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the store write fails.
    pub fn set_endpoint(&self, raw: &str) -> Result<(), SyncError> {
        debug!(key = self.endpoint_key.storage_key(), raw, "endpoint change");
        self.storage
            .set(self.endpoint_key.storage_key(), Value::String(raw.to_owned()))
    }

    /// Enabled state for newly added rules, `false` unless set
    #[must_use]
    pub fn default_enabled(&self) -> bool {
        self.storage
            .get(keys::DEFAULT_CHECKED)
            .and_then(|value| lenient_bool(&value))
            .unwrap_or(false)
    }

    /// # Errors
    ///
    /// Returns `SyncError` if the store write fails.
    pub fn set_default_enabled(&self, enabled: bool) -> Result<(), SyncError> {
        debug!(enabled, "default enabled change");
        self.storage
            .set(keys::DEFAULT_CHECKED, Value::String(enabled.to_string()))
    }
}
