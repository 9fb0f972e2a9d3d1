//! Core client trait and error types.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::dispatch::HandlerSet;
use crate::stream::{StreamDriver, StreamOutcome, StreamReport, StreamStats};

/// Errors that can occur while opening or reading a generation stream.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Malformed `{event}` event: {source}")]
    MalformedEvent {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GenerationError {
    /// The stream itself failed; no further events will arrive.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GenerationError::Http(_) | GenerationError::Io(_) | GenerationError::Status { .. }
        )
    }

    /// A single frame could not be decoded; the stream carries on.
    pub fn is_malformed_event(&self) -> bool {
        matches!(self, GenerationError::MalformedEvent { .. })
    }
}

/// Body of a generation stream as delivered by the transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, GenerationError>> + Send>>;

/// Source of generation streams for background jobs.
///
/// Implement `open_stream` to plug in a transport; `watch` drives the
/// returned body through the event pipeline.
///
/// # Example
/// ```rust,ignore
/// struct Replay(&'static str);
///
/// #[async_trait]
/// impl GenerationClient for Replay {
///     async fn open_stream(&self, _job_id: &str) -> Result<ByteStream, GenerationError> {
///         let body = Bytes::from_static(self.0.as_bytes());
///         Ok(Box::pin(futures::stream::iter([Ok(body)])))
///     }
/// }
/// ```
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Open the event stream of the given job.
    async fn open_stream(&self, job_id: &str) -> Result<ByteStream, GenerationError>;

    /// Open the job's stream and dispatch its events until it ends, fails
    /// or `cancel` fires.
    ///
    /// Failing to open the stream is reported through `on_error` like any
    /// other transport error; cancellation never is.
    async fn watch(
        &self,
        job_id: &str,
        mut handlers: HandlerSet<'_>,
        cancel: &CancellationToken,
    ) -> StreamReport {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = self.open_stream(job_id) => Some(opened),
        };

        match opened {
            Some(Ok(stream)) => {
                debug!(job_id, "generation stream opened");
                StreamDriver::new(handlers).run(stream, cancel).await
            }
            Some(Err(e)) if !cancel.is_cancelled() => {
                handlers.report_error(&e);
                StreamReport {
                    outcome: StreamOutcome::Failed(e),
                    stats: StreamStats::default(),
                }
            }
            _ => {
                debug!(job_id, "cancelled before the stream opened");
                StreamReport {
                    outcome: StreamOutcome::Cancelled,
                    stats: StreamStats::default(),
                }
            }
        }
    }
}
