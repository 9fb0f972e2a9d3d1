//! The pull loop that turns a byte stream into dispatched events.
//!
//! [`StreamDriver`] owns every piece of per-stream state: the UTF-8 decoder,
//! the line buffer, the pending frame and the byte stream itself. Each loop
//! iteration checks for cancellation, awaits exactly one chunk and pushes it
//! through decode → framing → assembly → dispatch before the next read.

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::GenerationError;
use crate::decode::Utf8Decoder;
use crate::dispatch::{dispatch, Dispatch, HandlerSet};
use crate::sse::{Frame, LineFramer, PendingFrame};

/// How a stream ended.
#[derive(Debug)]
pub enum StreamOutcome {
    /// The server closed the stream.
    Completed,
    /// The caller cancelled; not an error.
    Cancelled,
    /// The transport failed. The error was also passed to `on_error`.
    Failed(GenerationError),
}

impl StreamOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StreamOutcome::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamOutcome::Cancelled)
    }
}

/// Counters collected while driving a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub bytes: usize,
    pub delivered: usize,
    pub malformed: usize,
    pub unrouted: usize,
}

impl StreamStats {
    fn record(&mut self, dispatched: Dispatch) {
        match dispatched {
            Dispatch::Delivered(_) => self.delivered += 1,
            Dispatch::Malformed => self.malformed += 1,
            Dispatch::Unrouted => self.unrouted += 1,
            Dispatch::Empty => {}
        }
    }
}

/// Final result of [`StreamDriver::run`].
#[derive(Debug)]
pub struct StreamReport {
    pub outcome: StreamOutcome,
    pub stats: StreamStats,
}

#[derive(Debug)]
enum DriverState {
    Reading,
    Cancelling,
    Draining,
    Closed(StreamOutcome),
}

// Result of one read attempt.
enum Read<B, E> {
    Chunk(B),
    End,
    Aborted,
    Failed(E),
}

/// Drives one generation stream to completion.
///
/// # Example
/// ```
/// use futures::stream;
/// use genstream::dispatch::HandlerSet;
/// use genstream::stream::StreamDriver;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let body = stream::iter(vec![
///     Ok::<_, std::io::Error>("event: title\ndata: {\"postId\":\"a\",".as_bytes()),
///     Ok("\"title\":\"Hi\"}\n\n".as_bytes()),
/// ]);
///
/// let handlers = HandlerSet::new().on_title(|e| assert_eq!(e.title, "Hi"));
/// let report = StreamDriver::new(handlers)
///     .run(body, &CancellationToken::new())
///     .await;
///
/// assert!(report.outcome.is_completed());
/// assert_eq!(report.stats.delivered, 1);
/// # }
/// ```
#[derive(Debug)]
pub struct StreamDriver<'a> {
    handlers: HandlerSet<'a>,
    decoder: Utf8Decoder,
    framer: LineFramer,
    pending: PendingFrame,
    stats: StreamStats,
}

impl<'a> StreamDriver<'a> {
    pub fn new(handlers: HandlerSet<'a>) -> Self {
        Self {
            handlers,
            decoder: Utf8Decoder::new(),
            framer: LineFramer::new(),
            pending: PendingFrame::new(),
            stats: StreamStats::default(),
        }
    }

    /// Consume `stream` until it ends, fails or `cancel` fires.
    ///
    /// Cancellation is checked before every read, and a read in flight when
    /// the token fires is abandoned. A frame still pending when the stream
    /// ends or is cancelled is dispatched once. The stream is dropped before
    /// this returns, whichever way it ended.
    pub async fn run<S, B, E>(mut self, stream: S, cancel: &CancellationToken) -> StreamReport
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<GenerationError>,
    {
        let mut stream = Box::pin(stream);
        let mut state = DriverState::Reading;

        let outcome = loop {
            state = match state {
                DriverState::Reading if cancel.is_cancelled() => DriverState::Cancelling,
                DriverState::Reading => {
                    // Cancellation is polled first: a chunk that is already
                    // ready when the token fires is dropped without being fed.
                    let read = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Read::Aborted,
                        item = stream.next() => match item {
                            Some(Ok(chunk)) => Read::Chunk(chunk),
                            Some(Err(e)) => Read::Failed(e),
                            None => Read::End,
                        },
                    };

                    match read {
                        Read::Chunk(chunk) => {
                            self.feed(chunk.as_ref());
                            DriverState::Reading
                        }
                        Read::End => DriverState::Draining,
                        Read::Aborted => DriverState::Cancelling,
                        // The transport may fail as a consequence of cancellation
                        Read::Failed(_) if cancel.is_cancelled() => DriverState::Cancelling,
                        Read::Failed(e) => {
                            let error: GenerationError = e.into();
                            warn!(error = %error, "generation stream failed");
                            self.handlers.report_error(&error);
                            DriverState::Closed(StreamOutcome::Failed(error))
                        }
                    }
                }
                DriverState::Draining => {
                    let tail = self.decoder.finish();
                    self.feed_text(&tail);
                    if let Some(line) = self.framer.finish() {
                        self.feed_line(&line);
                    }
                    self.flush_pending();
                    DriverState::Closed(StreamOutcome::Completed)
                }
                DriverState::Cancelling => {
                    self.flush_pending();
                    DriverState::Closed(StreamOutcome::Cancelled)
                }
                DriverState::Closed(outcome) => break outcome,
            };
        };

        drop(stream);
        debug!("generation stream released");

        info!(
            outcome = ?outcome,
            bytes = self.stats.bytes,
            delivered = self.stats.delivered,
            malformed = self.stats.malformed,
            unrouted = self.stats.unrouted,
            "generation stream closed"
        );

        StreamReport {
            outcome,
            stats: self.stats,
        }
    }

    fn feed(&mut self, chunk: &[u8]) {
        self.stats.bytes += chunk.len();
        let text = self.decoder.decode(chunk);
        self.feed_text(&text);
    }

    fn feed_text(&mut self, text: &str) {
        for line in self.framer.push(text) {
            self.feed_line(&line);
        }
    }

    fn feed_line(&mut self, line: &str) {
        if let Some(frame) = self.pending.feed_line(line) {
            self.dispatch(frame);
        }
    }

    fn flush_pending(&mut self) {
        if let Some(frame) = self.pending.take() {
            debug!(event = %frame.event, "flushing final frame");
            self.dispatch(frame);
        }
    }

    fn dispatch(&mut self, frame: Frame) {
        let dispatched = dispatch(frame, &mut self.handlers);
        self.stats.record(dispatched);
    }
}
