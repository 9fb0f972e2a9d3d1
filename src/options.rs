//! Transport configuration for reaching the job server.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Url;

use crate::client::GenerationError;

/// Path of the event stream endpoint; `{job_id}` is replaced per request.
pub const DEFAULT_STREAM_PATH: &str = "/api/generations/{job_id}/stream";

pub const ENV_BASE_URL: &str = "GENSTREAM_BASE_URL";
pub const ENV_API_KEY: &str = "GENSTREAM_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "GENSTREAM_TIMEOUT_SECS";

/// A secret string type for sensitive data like API keys.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// HTTP transport options for the job server.
///
/// # Example
/// ```rust
/// use genstream::options::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::new("https://jobs.example.com")
///     .with_api_key("token")
///     .with_timeout(Duration::from_secs(600))
///     .with_header("X-Workspace".to_string(), "blog".to_string());
///
/// assert_eq!(
///     options.stream_url("job-1").unwrap().as_str(),
///     "https://jobs.example.com/api/generations/job-1/stream"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Scheme and host of the job server, optionally with a path prefix
    pub base_url: String,

    /// Bearer token sent with every request
    pub api_key: Option<SecretString>,

    /// Whole-request timeout. Generation streams are long-lived, so leave
    /// this unset unless jobs have a known upper bound.
    pub timeout: Option<Duration>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,

    /// Stream endpoint path template
    pub stream_path: String,
}

impl TransportOptions {
    /// Create options for the given server with everything else defaulted.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: None,
            proxy: None,
            extra_headers: None,
            stream_path: DEFAULT_STREAM_PATH.to_string(),
        }
    }

    /// Read options from `GENSTREAM_BASE_URL` (required),
    /// `GENSTREAM_API_KEY` and `GENSTREAM_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, GenerationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GenerationError> {
        let base_url = lookup(ENV_BASE_URL)
            .ok_or_else(|| GenerationError::Config(format!("{} is required", ENV_BASE_URL)))?;

        let mut options = Self::new(base_url);

        if let Some(api_key) = lookup(ENV_API_KEY) {
            options = options.with_api_key(api_key);
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                GenerationError::Config(format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))
            })?;
            options = options.with_timeout(Duration::from_secs(secs));
        }

        Ok(options)
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set extra headers.
    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }

    /// Set the stream endpoint path template.
    pub fn with_stream_path(mut self, stream_path: impl Into<String>) -> Self {
        self.stream_path = stream_path.into();
        self
    }

    /// Full URL of the event stream for `job_id`.
    ///
    /// The job id is percent-encoded as a single path segment; `.` and `..`
    /// are rejected.
    pub fn stream_url(&self, job_id: &str) -> Result<Url, GenerationError> {
        if job_id.is_empty() || job_id == "." || job_id == ".." {
            return Err(GenerationError::Config(format!("invalid job id: {:?}", job_id)));
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| {
            GenerationError::Config(format!("invalid base url {}: {}", self.base_url, e))
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                GenerationError::Config(format!("base url cannot have a path: {}", self.base_url))
            })?;
            segments.pop_if_empty();

            for segment in self.stream_path.split('/').filter(|s| !s.is_empty()) {
                if segment == "{job_id}" {
                    segments.push(job_id);
                } else {
                    segments.push(segment);
                }
            }
        }

        Ok(url)
    }
}
