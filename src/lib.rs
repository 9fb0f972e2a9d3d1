//! # genstream - generation stream client
//!
//! Incremental, cancellable client for the `text/event-stream` body a job
//! server sends while a background generation job runs.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Chunk-boundary independent: lines and multi-byte characters may be
//!   split anywhere by the network
//! - Typed payloads for `post`, `result` and `title` events
//! - Cooperative cancellation through [`CancellationToken`]
//! - Malformed events are reported and skipped without ending the stream
//!
//! ## Architecture
//!
//! Bytes flow through a fixed pipeline, one chunk at a time:
//!
//! 1. [`decode::Utf8Decoder`] turns bytes into text
//! 2. [`sse::LineFramer`] splits text into complete lines
//! 3. [`sse::PendingFrame`] assembles lines into frames
//! 4. [`dispatch::dispatch`] parses each frame and calls the matching handler
//!
//! [`stream::StreamDriver`] runs the pipeline as a pull loop and
//! [`client::GenerationClient`] opens streams for job ids.
//!
//! ## Example
//! ```no_run
//! use genstream::client::GenerationClient;
//! use genstream::dispatch::HandlerSet;
//! use genstream::http::HttpGenerationClient;
//! use genstream::options::TransportOptions;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = TransportOptions::new("https://jobs.example.com").with_api_key("token");
//!     let client = HttpGenerationClient::new(options)?;
//!
//!     let handlers = HandlerSet::new()
//!         .on_post(|e| println!("post {} is {:?}", e.post.id, e.post.status))
//!         .on_title(|e| println!("title: {}", e.title))
//!         .on_result(|e| println!("done, version: {:?}", e.version.map(|v| v.id)))
//!         .on_error(|e| eprintln!("error: {}", e));
//!
//!     let cancel = CancellationToken::new();
//!     let report = client.watch("job-123", handlers, &cancel).await;
//!     println!("{:?} after {} events", report.outcome, report.stats.delivered);
//!     Ok(())
//! }
//! ```
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod client;
pub mod decode;
pub mod dispatch;
pub mod http;
pub mod model;
pub mod options;
pub mod sse;
pub mod stream;

// Re-exports for convenience
pub use client::{GenerationClient, GenerationError};
pub use dispatch::HandlerSet;
pub use http::HttpGenerationClient;
pub use model::{GenerationEvent, Post, PostEvent, ResultEvent, TitleEvent, Version};
pub use stream::{StreamDriver, StreamOutcome, StreamReport, StreamStats};
