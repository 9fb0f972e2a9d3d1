//! Server-Sent Events (SSE) line framing and event assembly.
//!
//! SSE format as sent by the job server:
//! ```text
//! : keep-alive comment
//! event: post
//! data: {"post": {"id": "a"}}
//!
//! event: title
//! data: {"postId": "a", "title": "Hi"}
//!
//! ```
//!
//! Decoded text is split into lines by [`LineFramer`], and each line is fed
//! to a [`PendingFrame`], which yields a completed [`Frame`] when a blank line
//! closes a frame that carries data.

use nonempty::NonEmpty;

/// Event name a frame carries when no `event:` line sets one.
pub const DEFAULT_EVENT: &str = "message";

/// Classification of one complete SSE line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// Empty line: frame boundary.
    Blank,
    /// `:` prefixed line.
    Comment,
    /// `event:` line with the trimmed name.
    Event(&'a str),
    /// `data:` line with the trimmed value.
    Data(&'a str),
    /// Any other field (`id:`, `retry:`, garbage). Not supported, ignored.
    Other,
}

/// Classify a single line (without its terminator).
///
/// # Example
/// ```
/// use genstream::sse::{parse_sse_line, SseLine};
///
/// assert_eq!(parse_sse_line("data: {\"key\": 1}"), SseLine::Data("{\"key\": 1}"));
/// assert_eq!(parse_sse_line("event:post"), SseLine::Event("post"));
/// assert_eq!(parse_sse_line(": ping"), SseLine::Comment);
/// assert_eq!(parse_sse_line(""), SseLine::Blank);
/// assert_eq!(parse_sse_line("id: 7"), SseLine::Other);
/// ```
pub fn parse_sse_line(line: &str) -> SseLine<'_> {
    if line.is_empty() {
        SseLine::Blank
    } else if line.starts_with(':') {
        SseLine::Comment
    } else if let Some(name) = line.strip_prefix("event:") {
        SseLine::Event(name.trim())
    } else if let Some(data) = line.strip_prefix("data:") {
        SseLine::Data(data.trim())
    } else {
        SseLine::Other
    }
}

/// Accumulates decoded text and splits it into complete lines.
///
/// Lines end at `\n` or `\r\n`. Text after the last terminator stays
/// buffered until more text arrives or [`LineFramer::finish`] is called.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: String,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and return every line it completes, terminators stripped.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buffer[start..].find('\n') {
            let end = start + pos;
            let line = &self.buffer[start..end];
            lines.push(line.strip_suffix('\r').unwrap_or(line).to_string());
            start = end + 1;
        }
        self.buffer.drain(..start);

        lines
    }

    /// Flush the unterminated trailing line at end of stream, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }

        let mut line = std::mem::take(&mut self.buffer);
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    /// Text received after the last line terminator.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }
}

/// A completed frame, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event: String,
    pub data: NonEmpty<String>,
}

/// The frame currently being assembled.
///
/// Owned by whoever drives the stream and threaded through each line
/// explicitly; it is reset to defaults every time a frame closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFrame {
    event: String,
    data: Vec<String>,
}

impl Default for PendingFrame {
    fn default() -> Self {
        Self {
            event: DEFAULT_EVENT.to_string(),
            data: Vec::new(),
        }
    }
}

impl PendingFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one complete line. Returns the finished frame when a blank line
    /// closes a frame that has at least one data line.
    pub fn feed_line(&mut self, line: &str) -> Option<Frame> {
        match parse_sse_line(line) {
            SseLine::Blank => self.take(),
            SseLine::Event(name) => {
                self.event = name.to_string();
                None
            }
            SseLine::Data(data) => {
                self.data.push(data.to_string());
                None
            }
            SseLine::Comment | SseLine::Other => None,
        }
    }

    /// Take the frame if it holds data, resetting to defaults either way.
    pub fn take(&mut self) -> Option<Frame> {
        let PendingFrame { event, data } = std::mem::take(self);
        NonEmpty::from_vec(data).map(|data| Frame { event, data })
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(lines: &[&str]) -> Vec<Frame> {
        let mut pending = PendingFrame::new();
        lines
            .iter()
            .filter_map(|line| pending.feed_line(line))
            .collect()
    }

    #[test]
    fn test_parse_sse_line() {
        assert_eq!(parse_sse_line("data: hello"), SseLine::Data("hello"));
        assert_eq!(parse_sse_line("data:   spaces  "), SseLine::Data("spaces"));
        assert_eq!(parse_sse_line("data:"), SseLine::Data(""));
        assert_eq!(parse_sse_line("event:  result "), SseLine::Event("result"));
        assert_eq!(parse_sse_line(":"), SseLine::Comment);
        assert_eq!(parse_sse_line(":event: post"), SseLine::Comment);
        assert_eq!(parse_sse_line("retry: 1000"), SseLine::Other);
        assert_eq!(parse_sse_line("invalid"), SseLine::Other);
        assert_eq!(parse_sse_line(" data: x"), SseLine::Other);
    }

    #[test]
    fn test_framer_splits_lf_and_crlf() {
        let mut framer = LineFramer::new();
        let lines = framer.push("event: post\r\ndata: 1\n\r\npartial");
        assert_eq!(lines, vec!["event: post", "data: 1", ""]);
        assert_eq!(framer.remainder(), "partial");
    }

    #[test]
    fn test_framer_keeps_fragment_until_terminated() {
        let mut framer = LineFramer::new();
        assert!(framer.push("data: ab").is_empty());
        assert!(framer.push("c").is_empty());
        assert_eq!(framer.push("d\n"), vec!["data: abcd"]);
        assert_eq!(framer.remainder(), "");
    }

    #[test]
    fn test_framer_crlf_split_across_pushes() {
        let mut framer = LineFramer::new();
        assert!(framer.push("data: x\r").is_empty());
        assert_eq!(framer.push("\n"), vec!["data: x"]);
    }

    #[test]
    fn test_framer_finish() {
        let mut framer = LineFramer::new();
        framer.push("data: 1\ndata: tail\r");
        assert_eq!(framer.finish(), Some("data: tail".to_string()));
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn test_frame_with_event_and_multiple_data_lines() {
        let frames = frames(&["event: post", "data: {\"a\":", "data: 1}", ""]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "post");
        assert_eq!(
            frames[0].data,
            NonEmpty {
                head: "{\"a\":".to_string(),
                tail: vec!["1}".to_string()],
            }
        );
    }

    #[test]
    fn test_blank_without_data_resets_name() {
        let frames = frames(&["event: post", "", "data: 1", ""]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, DEFAULT_EVENT);
    }

    #[test]
    fn test_name_resets_after_dispatch() {
        let frames = frames(&["event: title", "data: 1", "", "data: 2", ""]);
        assert_eq!(frames[0].event, "title");
        assert_eq!(frames[1].event, DEFAULT_EVENT);
    }

    #[test]
    fn test_comments_and_unknown_fields_are_ignored() {
        let mut pending = PendingFrame::new();
        pending.feed_line("event: result");
        pending.feed_line(": still generating");
        pending.feed_line("id: 42");
        assert_eq!(pending.event(), "result");
        assert!(!pending.has_data());
    }

    #[test]
    fn test_take_flushes_pending_data() {
        let mut pending = PendingFrame::new();
        pending.feed_line("event: post");
        pending.feed_line("data: {}");

        let frame = pending.take().expect("pending frame");
        assert_eq!(frame.event, "post");
        assert_eq!(pending, PendingFrame::default());
        assert!(pending.take().is_none());
    }
}
