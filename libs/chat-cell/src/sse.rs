//! Incremental decoder for `text/event-stream` bodies.

use thiserror::Error;

const DEFAULT_EVENT: &str = "message";

/// Longest line the decoder will hold while waiting for its terminator.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SseError {
    #[error("Event stream line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Accepts body chunks as they arrive and yields complete events.
///
/// Chunks may split lines or UTF-8 sequences anywhere; incomplete input is
/// held until the rest arrives. Lines end in `\n` or `\r\n`. A line longer
/// than `MAX_LINE_BYTES` is an error; the stream cannot be resynchronised
/// after it.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    last_id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, SseError> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.iter().position(|byte| *byte == b'\n') {
            if end > MAX_LINE_BYTES {
                return Err(self.overflow());
            }
            let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        if self.buffer.len() > MAX_LINE_BYTES {
            return Err(self.overflow());
        }
        Ok(events)
    }

    fn overflow(&mut self) -> SseError {
        self.buffer.clear();
        self.data.clear();
        self.event = None;
        SseError::LineTooLong {
            limit: MAX_LINE_BYTES,
        }
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        // comment / keep-alive
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => self.last_id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();

        Some(SseEvent {
            event: event
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
            id: self.last_id.clone(),
        })
    }
}
