//! Incremental `text/event-stream` decoder.
//!
//! Bytes arrive in arbitrary chunks; lines are assembled across chunk
//! boundaries before any UTF-8 decoding so multi-byte characters split by
//! the transport survive intact. An event is dispatched on a blank line.

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    data: Vec<String>,
    event: Option<String>,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Bytes received but not yet part of a complete line. An event still
    /// pending at end of stream is never dispatched.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty() || !self.data.is_empty()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            // `retry` and unknown fields carry nothing we act on.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event,
            data,
            id: self.id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_event() {
        let mut d = SseDecoder::new();
        let events = d.push(b"data: {\"a\":1}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{\"a\":1}");
        assert!(!d.has_partial());
    }

    #[test]
    fn event_split_across_chunks() {
        let mut d = SseDecoder::new();
        assert!(d.push(b"da").is_empty());
        assert!(d.push(b"ta: hel").is_empty());
        assert!(d.push(b"lo\n").is_empty());
        assert!(d.has_partial());
        let events = d.push(b"\ndata: next\n\n");
        let data: Vec<&str> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, vec!["hello", "next"]);
    }

    #[test]
    fn multibyte_char_split_between_chunks() {
        let mut d = SseDecoder::new();
        let bytes = "data: ✓ done\n\n".as_bytes();
        // Split inside the three-byte check mark.
        assert!(d.push(&bytes[..7]).is_empty());
        let events = d.push(&bytes[7..]);
        assert_eq!(events[0].data, "✓ done");
    }

    #[test]
    fn crlf_multiline_and_fields() {
        let mut d = SseDecoder::new();
        let events = d.push(b"event: status\r\nid: 7\r\ndata: line one\r\ndata: line two\r\n\r\n");
        assert_eq!(
            events,
            vec![SseEvent {
                event: Some("status".into()),
                data: "line one\nline two".into(),
                id: Some("7".into()),
            }]
        );
    }

    #[test]
    fn comments_and_empty_events_are_ignored() {
        let mut d = SseDecoder::new();
        let events = d.push(b": keep-alive\n\nevent: ping\n\ndata:x\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
        assert_eq!(events[0].event, None);
    }
}
