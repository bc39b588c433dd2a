use std::io::BufRead;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use super::error::{BatchError, BatchResult};

// `Ok(None)` marks end of input. A successful read is never replayed.
pub trait ItemReader<R> {
    fn read(&mut self) -> BatchResult<Option<R>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub line_number: usize,
    pub text: String,
}

pub struct FlatFileItemReader<B> {
    source: B,
    line_number: usize,
    lines_to_skip: usize,
    comment_prefixes: Vec<String>,
}

impl<B: BufRead> FlatFileItemReader<B> {
    pub fn new(source: B) -> Self {
        Self {
            source,
            line_number: 0,
            lines_to_skip: 0,
            comment_prefixes: vec!["#".to_string()],
        }
    }

    pub fn with_lines_to_skip(mut self, lines_to_skip: usize) -> Self {
        self.lines_to_skip = lines_to_skip;
        self
    }

    pub fn with_comment_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.comment_prefixes = prefixes;
        self
    }

    fn is_comment(&self, text: &str) -> bool {
        self.comment_prefixes
            .iter()
            .any(|prefix| text.starts_with(prefix.as_str()))
    }
}

impl<B: BufRead> ItemReader<RawLine> for FlatFileItemReader<B> {
    fn read(&mut self) -> BatchResult<Option<RawLine>> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.source.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            if self.line_number <= self.lines_to_skip {
                continue;
            }

            let text = buf.trim_end_matches(['\r', '\n']);
            if text.trim().is_empty() || self.is_comment(text) {
                continue;
            }

            return Ok(Some(RawLine {
                line_number: self.line_number,
                text: text.to_string(),
            }));
        }
    }
}

// Elements are cut out of the byte stream one at a time and deserialized on
// read, so only the current element is held in memory.
pub struct JsonArrayItemReader<S, T> {
    source: S,
    index: usize,
    finished: bool,
    _item: PhantomData<fn() -> T>,
}

impl<S: BufRead, T: DeserializeOwned> JsonArrayItemReader<S, T> {
    pub fn from_reader(mut source: S) -> BatchResult<Self> {
        match next_significant_byte(&mut source)? {
            Some(b'[') => Ok(Self {
                source,
                index: 0,
                finished: false,
                _item: PhantomData,
            }),
            _ => Err(json_error("expected `[` at start of input")),
        }
    }

    fn element_bytes(&mut self, first: u8) -> BatchResult<Vec<u8>> {
        let mut raw = vec![first];

        if !matches!(first, b'{' | b'[' | b'"') {
            loop {
                let Some(&byte) = self.source.fill_buf()?.first() else {
                    return Err(json_error("unterminated JSON array"));
                };
                if byte == b',' || byte == b']' || byte.is_ascii_whitespace() {
                    return Ok(raw);
                }
                self.source.consume(1);
                raw.push(byte);
            }
        }

        let mut depth = usize::from(first != b'"');
        let mut in_string = first == b'"';
        let mut escaped = false;
        loop {
            let Some(&byte) = self.source.fill_buf()?.first() else {
                return Err(json_error("unterminated JSON array"));
            };
            self.source.consume(1);
            raw.push(byte);

            if in_string {
                if escaped {
                    escaped = false;
                } else if byte == b'\\' {
                    escaped = true;
                } else if byte == b'"' {
                    in_string = false;
                }
            } else {
                match byte {
                    b'"' => in_string = true,
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }

            if depth == 0 && !in_string {
                return Ok(raw);
            }
        }
    }
}

impl<S: BufRead, T: DeserializeOwned> ItemReader<T> for JsonArrayItemReader<S, T> {
    fn read(&mut self) -> BatchResult<Option<T>> {
        if self.finished {
            return Ok(None);
        }

        let mut next = next_significant_byte(&mut self.source)?;
        if self.index > 0 {
            match next {
                Some(b',') => {
                    next = next_significant_byte(&mut self.source)?;
                    if next == Some(b']') {
                        self.finished = true;
                        return Err(json_error("trailing comma in JSON array"));
                    }
                }
                Some(b']') => {
                    self.finished = true;
                    return Ok(None);
                }
                None => return Err(json_error("unterminated JSON array")),
                Some(_) => return Err(json_error("expected `,` or `]` between array elements")),
            }
        }

        let first = match next {
            None => return Err(json_error("unterminated JSON array")),
            Some(b']') => {
                self.finished = true;
                return Ok(None);
            }
            Some(byte) => byte,
        };

        let raw = self.element_bytes(first)?;
        let index = self.index;
        self.index += 1;
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| BatchError::InvalidJsonElement { index, source })
    }
}

fn next_significant_byte<S: BufRead>(source: &mut S) -> BatchResult<Option<u8>> {
    loop {
        let Some(&byte) = source.fill_buf()?.first() else {
            return Ok(None);
        };
        source.consume(1);
        if !byte.is_ascii_whitespace() {
            return Ok(Some(byte));
        }
    }
}

fn json_error(message: &str) -> BatchError {
    BatchError::InvalidJson(<serde_json::Error as serde::de::Error>::custom(message))
}
