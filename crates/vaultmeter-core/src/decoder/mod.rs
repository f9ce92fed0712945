//! Chunked record decoder for Vault backup streams.
//!
//! A backup file is a sequence of loosely delimited JSON fragments, each a
//! flat `{key, value}` object, interleaved with arbitrary whitespace and
//! punctuation. The decoder consumes the file in fixed-size byte chunks and
//! yields one [`Record`] per fragment without ever holding the whole file
//! in memory: at most one chunk plus one pending partial fragment.

use std::io::{self, Read};

use serde_json::Value;
use tracing::debug;

/// Default read size, matching the backup tooling's 1 KiB chunks.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// How much of an offending fragment to include in error messages.
const SNIPPET_MAX: usize = 120;

/// One decoded backup record.
///
/// `value_size` is the byte length of the serialized value payload: the
/// UTF-8 length for a string value, the compact JSON length otherwise.
/// The value's content is never inspected beyond that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// `/`-separated hierarchical key, always with a leading slash.
    pub key_path: String,
    /// Serialized byte length of the value payload.
    pub value_size: u64,
}

/// Fatal decoding failure. Any of these aborts the run.
#[derive(Debug)]
pub enum DecodeError {
    /// Reading the underlying stream failed.
    Io(io::Error),
    /// A bracket-delimited fragment is not a valid flat JSON object.
    InvalidFragment { snippet: String, reason: String },
    /// Neither `key` nor `Key` field is present in the fragment.
    MissingKeyField { snippet: String },
    /// The key field is present but the paired value field is not.
    MissingValueField { snippet: String },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Io(e) => write!(f, "backup read error: {}", e),
            DecodeError::InvalidFragment { snippet, reason } => {
                write!(f, "invalid record fragment '{}': {}", snippet, reason)
            }
            DecodeError::MissingKeyField { snippet } => {
                write!(f, "record fragment '{}' has no key field", snippet)
            }
            DecodeError::MissingValueField { snippet } => {
                write!(f, "record fragment '{}' has no value field", snippet)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<io::Error> for DecodeError {
    fn from(e: io::Error) -> Self {
        DecodeError::Io(e)
    }
}

/// Lazy iterator of records over a chunked byte stream.
///
/// Fragment extraction is a single-level brace scan: find the first `{`,
/// discard anything before it, then take everything up to the first `}`.
/// This is only correct because backup value payloads never contain literal
/// braces at the top level (they are scalar or already-escaped). If that
/// assumption is ever broken, this scan must be replaced with an
/// incremental JSON tokenizer.
///
/// An unmatched `{` left in the buffer at end of stream is dropped without
/// error; truncated backups lose their trailing partial record by contract.
pub struct RecordStream<R: Read> {
    source: R,
    chunk_size: usize,
    buffer: Vec<u8>,
    eof: bool,
}

impl<R: Read> RecordStream<R> {
    /// Create a stream with the default chunk size.
    pub fn new(source: R) -> Self {
        Self::with_chunk_size(source, DEFAULT_CHUNK_SIZE)
    }

    /// Create a stream reading `chunk_size` bytes at a time.
    /// A `chunk_size` of 0 is treated as 1.
    pub fn with_chunk_size(source: R, chunk_size: usize) -> Self {
        Self {
            source,
            chunk_size: chunk_size.max(1),
            buffer: Vec::new(),
            eof: false,
        }
    }

    /// Read one chunk from the source and append it to the scan buffer.
    /// Returns the number of bytes read (0 at end of stream).
    fn fill(&mut self) -> io::Result<usize> {
        let mut chunk = vec![0u8; self.chunk_size];
        let n = self.source.read(&mut chunk)?;
        self.buffer.extend_from_slice(&chunk[..n]);
        Ok(n)
    }

    /// Extract the next complete `{...}` span from the buffer, if any.
    ///
    /// Bytes before the first `{` are discarded. If no closing `}` has
    /// arrived yet, the buffer is kept (including the open brace) until
    /// more input shows up.
    fn scan_fragment(&mut self) -> Option<Vec<u8>> {
        let start = match self.buffer.iter().position(|&b| b == b'{') {
            Some(pos) => pos,
            None => {
                // Nothing but filler so far.
                self.buffer.clear();
                return None;
            }
        };
        if start > 0 {
            self.buffer.drain(..start);
        }

        let end = self.buffer.iter().position(|&b| b == b'}')?;
        let fragment: Vec<u8> = self.buffer.drain(..=end).collect();
        Some(fragment)
    }
}

impl<R: Read> Iterator for RecordStream<R> {
    type Item = Result<Record, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(fragment) = self.scan_fragment() {
                return Some(parse_fragment(&fragment));
            }
            if self.eof {
                if !self.buffer.is_empty() {
                    debug!(
                        dropped_bytes = self.buffer.len(),
                        "unterminated trailing fragment dropped at end of stream"
                    );
                    self.buffer.clear();
                }
                return None;
            }
            match self.fill() {
                Ok(0) => self.eof = true,
                Ok(_) => {}
                Err(e) => {
                    self.eof = true;
                    return Some(Err(DecodeError::Io(e)));
                }
            }
        }
    }
}

/// Parse one bracketed fragment into a [`Record`].
///
/// Accepts either case spelling of the field pair (`key`/`value` or
/// `Key`/`Value`); lowercase wins if both are present, matching the
/// original tooling.
fn parse_fragment(fragment: &[u8]) -> Result<Record, DecodeError> {
    let value: Value = serde_json::from_slice(fragment).map_err(|e| {
        DecodeError::InvalidFragment {
            snippet: snippet(fragment),
            reason: e.to_string(),
        }
    })?;

    let object = value
        .as_object()
        .ok_or_else(|| DecodeError::InvalidFragment {
            snippet: snippet(fragment),
            reason: "not a JSON object".to_string(),
        })?;

    let (key_field, value_field) = if object.contains_key("key") {
        ("key", "value")
    } else if object.contains_key("Key") {
        ("Key", "Value")
    } else {
        return Err(DecodeError::MissingKeyField {
            snippet: snippet(fragment),
        });
    };

    let key_path = object
        .get(key_field)
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::InvalidFragment {
            snippet: snippet(fragment),
            reason: format!("'{}' field is not a string", key_field),
        })?
        .to_string();

    let payload = object
        .get(value_field)
        .ok_or_else(|| DecodeError::MissingValueField {
            snippet: snippet(fragment),
        })?;

    Ok(Record {
        key_path,
        value_size: payload_size(payload),
    })
}

/// Serialized byte length of a value payload.
fn payload_size(payload: &Value) -> u64 {
    match payload {
        Value::String(s) => s.len() as u64,
        other => other.to_string().len() as u64,
    }
}

/// Lossy, truncated rendering of a fragment for error messages.
fn snippet(fragment: &[u8]) -> String {
    let text = String::from_utf8_lossy(fragment);
    if text.chars().count() > SNIPPET_MAX {
        let cut: String = text.chars().take(SNIPPET_MAX).collect();
        format!("{}...", cut)
    } else {
        text.into_owned()
    }
}
