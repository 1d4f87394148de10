//! Server-sent event parsing.
//!
//! Chunks from the wire do not align with event boundaries, so the parser
//! buffers input and yields complete events as they close. Only `data:`
//! fields matter for the providers here; comments and other fields are
//! skipped.

/// One complete server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The joined `data:` payload.
    pub data: String,
}

/// Incremental SSE parser.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
}

impl SseParser {
    /// Create an empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every event completed by it.
    ///
    /// Invalid UTF-8 at a chunk boundary is tolerated by replacing the
    /// offending bytes; provider payloads are JSON and stay ASCII-heavy.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        let mut events = Vec::new();
        while let Some(boundary) = self.find_event_boundary() {
            let raw: String = self.buffer.drain(..boundary.end).collect();
            if let Some(event) = parse_event(&raw[..boundary.body]) {
                events.push(event);
            }
        }
        events
    }

    fn find_event_boundary(&self) -> Option<EventBoundary> {
        let lf = self.buffer.find("\n\n").map(|i| EventBoundary {
            body: i,
            end: i + 2,
        });
        let crlf = self.buffer.find("\r\n\r\n").map(|i| EventBoundary {
            body: i,
            end: i + 4,
        });
        match (lf, crlf) {
            (Some(a), Some(b)) => Some(if a.body <= b.body { a } else { b }),
            (a, b) => a.or(b),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct EventBoundary {
    body: usize,
    end: usize,
}

fn parse_event(raw: &str) -> Option<SseEvent> {
    let mut data_lines = Vec::new();
    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if data_lines.is_empty() {
        return None;
    }
    Some(SseEvent {
        data: data_lines.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_event() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: {\"x\":1}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{\"x\":1}");
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: {\"x\"").is_empty());
        let events = parser.feed(b":1}\n\n");
        assert_eq!(events[0].data, "{\"x\":1}");
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: a\n\ndata: b\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "a");
        assert_eq!(events[1].data, "b");
    }

    #[test]
    fn test_crlf_boundaries() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: a\r\n\r\n");
        assert_eq!(events[0].data, "a");
    }

    #[test]
    fn test_comments_and_other_fields_skipped() {
        let mut parser = SseParser::new();
        let events = parser.feed(b": keepalive\n\nevent: ping\n\ndata: real\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "real");
    }

    #[test]
    fn test_multi_line_data_joined() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: line1\ndata: line2\n\n");
        assert_eq!(events[0].data, "line1\nline2");
    }
}
