//! HTTP transport for generation streams.
//!
//! Builds the `reqwest` client from [`TransportOptions`] and implements
//! [`GenerationClient`] on top of it.

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;
use tracing::debug;

use crate::client::{ByteStream, GenerationClient, GenerationError};
use crate::options::TransportOptions;

pub const EVENT_STREAM: &str = "text/event-stream";

/// Build a configured HTTP client from transport options.
///
/// This applies common configuration like timeouts and proxies.
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, GenerationError> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| GenerationError::Config(format!("invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Add extra headers to a request if specified in transport options.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// [`GenerationClient`] that reads job streams over HTTP.
///
/// # Example
/// ```no_run
/// use genstream::client::GenerationClient;
/// use genstream::dispatch::HandlerSet;
/// use genstream::http::HttpGenerationClient;
/// use genstream::options::TransportOptions;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), genstream::GenerationError> {
/// let client = HttpGenerationClient::new(TransportOptions::new("https://jobs.example.com"))?;
/// let handlers = HandlerSet::new().on_post(|e| println!("{:?}", e.post.status));
///
/// let report = client.watch("job-1", handlers, &CancellationToken::new()).await;
/// println!("{:?}", report.outcome);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    http: Client,
    options: TransportOptions,
}

impl HttpGenerationClient {
    pub fn new(options: TransportOptions) -> Result<Self, GenerationError> {
        let http = build_http_client(&options)?;
        Ok(Self { http, options })
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn open_stream(&self, job_id: &str) -> Result<ByteStream, GenerationError> {
        let url = self.options.stream_url(job_id)?;

        let mut req = self.http.get(url.clone()).header(ACCEPT, EVENT_STREAM);
        if let Some(api_key) = &self.options.api_key {
            req = req.header(AUTHORIZATION, format!("Bearer {}", api_key.expose_secret()));
        }
        req = add_extra_headers(req, &self.options.extra_headers);

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        debug!(%url, %status, "connected to generation stream");
        Ok(Box::pin(response.bytes_stream().map_err(GenerationError::from)))
    }
}
