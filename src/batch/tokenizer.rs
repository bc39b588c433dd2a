use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{BatchError, BatchResult};
use super::field_set::FieldSet;
use super::reader::RawLine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub pattern: String,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_quote")]
    pub quote: char,
    pub layouts: Vec<LayoutConfig>,
}

fn default_delimiter() -> char {
    ','
}

fn default_quote() -> char {
    '"'
}

impl TokenizerConfig {
    pub fn delimited(layouts: Vec<LayoutConfig>) -> Self {
        Self {
            delimiter: default_delimiter(),
            quote: default_quote(),
            layouts,
        }
    }
}

#[derive(Debug)]
struct CompiledLayout {
    pattern: String,
    matcher: Regex,
    names: Arc<[String]>,
}

#[derive(Debug)]
pub struct PatternMatchingTokenizer {
    delimiter: char,
    quote: char,
    layouts: Vec<CompiledLayout>,
}

impl PatternMatchingTokenizer {
    pub fn new(config: &TokenizerConfig) -> BatchResult<Self> {
        if config.delimiter == config.quote {
            return Err(BatchError::InvalidConfig(format!(
                "delimiter and quote character must differ (both {:?})",
                config.delimiter
            )));
        }
        if config.layouts.is_empty() {
            return Err(BatchError::InvalidConfig(
                "at least one record layout is required".to_string(),
            ));
        }

        let mut layouts = Vec::with_capacity(config.layouts.len());
        for layout in &config.layouts {
            if layout.pattern.is_empty() {
                return Err(BatchError::InvalidConfig(
                    "layout pattern must not be empty".to_string(),
                ));
            }
            if layout.names.is_empty() {
                return Err(BatchError::InvalidConfig(format!(
                    "layout {:?} declares no field names",
                    layout.pattern
                )));
            }
            let mut seen = HashSet::new();
            if let Some(duplicate) = layout.names.iter().find(|name| !seen.insert(*name)) {
                return Err(BatchError::InvalidConfig(format!(
                    "layout {:?} declares field {duplicate:?} twice",
                    layout.pattern
                )));
            }

            let matcher = Regex::new(&glob_to_regex(&layout.pattern)).map_err(|err| {
                BatchError::InvalidConfig(format!("bad pattern {:?}: {err}", layout.pattern))
            })?;
            layouts.push(CompiledLayout {
                pattern: layout.pattern.clone(),
                matcher,
                names: layout.names.iter().cloned().collect(),
            });
        }

        Ok(Self {
            delimiter: config.delimiter,
            quote: config.quote,
            layouts,
        })
    }

    pub fn tokenize(&self, line: &RawLine) -> BatchResult<FieldSet> {
        let layout = self
            .layouts
            .iter()
            .find(|layout| layout.matcher.is_match(&line.text))
            .ok_or_else(|| BatchError::UnrecognizedRecordType {
                record: format!("line {}: {:?}", line.line_number, line.text),
            })?;

        let tokens = split_delimited(&line.text, self.delimiter, self.quote);
        if tokens.len() != layout.names.len() {
            return Err(BatchError::IncorrectTokenCount {
                pattern: layout.pattern.clone(),
                line_number: line.line_number,
                expected: layout.names.len(),
                actual: tokens.len(),
            });
        }

        Ok(FieldSet::new(&layout.pattern, layout.names.clone(), tokens))
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::from("(?s)^");
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '*' | '?' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}

fn split_delimited(line: &str, delimiter: char, quote: char) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == quote {
                if chars.peek() == Some(&quote) {
                    current.push(quote);
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == delimiter {
            tokens.push(std::mem::take(&mut current));
        } else if ch == quote && current.trim().is_empty() {
            current.clear();
            in_quotes = true;
        } else {
            current.push(ch);
        }
    }
    tokens.push(current);

    tokens
}
