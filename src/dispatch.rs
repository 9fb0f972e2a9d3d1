//! Routing of completed frames to caller-supplied handlers.

use itertools::Itertools;
use tracing::{debug, warn};

use crate::client::GenerationError;
use crate::model::{GenerationEvent, PostEvent, ResultEvent, TitleEvent};
use crate::sse::Frame;

type Callback<'a, T> = Box<dyn FnMut(T) + Send + 'a>;
type ErrorCallback<'a> = Box<dyn FnMut(&GenerationError) + Send + 'a>;

/// Optional callbacks invoked as events arrive.
///
/// Handlers run synchronously on the task driving the stream, in the order
/// frames complete. An event whose handler is not set is dropped.
///
/// # Example
/// ```
/// use genstream::dispatch::HandlerSet;
///
/// let handlers = HandlerSet::new()
///     .on_post(|event| println!("post {} updated", event.post.id))
///     .on_title(|event| println!("{} is now titled {:?}", event.post_id, event.title))
///     .on_error(|error| eprintln!("stream error: {}", error));
/// ```
#[derive(Default)]
pub struct HandlerSet<'a> {
    on_post: Option<Callback<'a, PostEvent>>,
    on_result: Option<Callback<'a, ResultEvent>>,
    on_title: Option<Callback<'a, TitleEvent>>,
    on_error: Option<ErrorCallback<'a>>,
}

impl<'a> HandlerSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handler for `post` events.
    pub fn on_post(mut self, handler: impl FnMut(PostEvent) + Send + 'a) -> Self {
        self.on_post = Some(Box::new(handler));
        self
    }

    /// Set the handler for `result` events.
    pub fn on_result(mut self, handler: impl FnMut(ResultEvent) + Send + 'a) -> Self {
        self.on_result = Some(Box::new(handler));
        self
    }

    /// Set the handler for `title` events.
    pub fn on_title(mut self, handler: impl FnMut(TitleEvent) + Send + 'a) -> Self {
        self.on_title = Some(Box::new(handler));
        self
    }

    /// Set the handler for malformed events and transport failures.
    pub fn on_error(mut self, handler: impl FnMut(&GenerationError) + Send + 'a) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Pass an error to the error handler, if one is set.
    pub fn report_error(&mut self, error: &GenerationError) {
        if let Some(on_error) = self.on_error.as_mut() {
            on_error(error);
        }
    }

    fn deliver(&mut self, event: GenerationEvent) {
        match event {
            GenerationEvent::Post(event) => {
                if let Some(on_post) = self.on_post.as_mut() {
                    on_post(event);
                }
            }
            GenerationEvent::Result(event) => {
                if let Some(on_result) = self.on_result.as_mut() {
                    on_result(event);
                }
            }
            GenerationEvent::Title(event) => {
                if let Some(on_title) = self.on_title.as_mut() {
                    on_title(event);
                }
            }
        }
    }
}

impl std::fmt::Debug for HandlerSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSet")
            .field("on_post", &self.on_post.is_some())
            .field("on_result", &self.on_result.is_some())
            .field("on_title", &self.on_title.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// What happened to a dispatched frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Decoded and passed to the routing table.
    Delivered(&'static str),
    /// Valid JSON under an event name with no route.
    Unrouted,
    /// Payload failed to decode; reported to `on_error`.
    Malformed,
    /// Data lines joined to an empty string.
    Empty,
}

/// Decode a completed frame and route it to its handler.
///
/// Data lines are joined with `\n` and parsed as JSON. Parse failures go to
/// `on_error` and never abort the stream. Only `post`, `result` and `title`
/// are routed; any other name, `message` included, is dropped.
pub fn dispatch(frame: Frame, handlers: &mut HandlerSet<'_>) -> Dispatch {
    let Frame { event, data } = frame;
    let payload = data.iter().join("\n");
    if payload.is_empty() {
        return Dispatch::Empty;
    }

    let decoded = serde_json::from_str::<serde_json::Value>(&payload)
        .and_then(|value| GenerationEvent::from_value(&event, value));

    match decoded {
        Ok(Some(decoded)) => {
            let name = decoded.name();
            debug!(event = name, "dispatching event");
            handlers.deliver(decoded);
            Dispatch::Delivered(name)
        }
        Ok(None) => {
            debug!(event = %event, "no route for event, dropping");
            Dispatch::Unrouted
        }
        Err(source) => {
            warn!(event = %event, error = %source, "malformed event payload");
            handlers.report_error(&GenerationError::MalformedEvent { event, source });
            Dispatch::Malformed
        }
    }
}
