use std::sync::Arc;

use super::error::{BatchError, BatchResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    pattern: String,
    names: Arc<[String]>,
    values: Vec<String>,
}

impl FieldSet {
    pub(crate) fn new(pattern: &str, names: Arc<[String]>, values: Vec<String>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self {
            pattern: pattern.to_string(),
            names,
            values,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn discriminator(&self) -> &str {
        self.values.first().map(|value| value.trim()).unwrap_or("")
    }

    pub fn read_raw(&self, name: &str) -> BatchResult<&str> {
        let index = self
            .names
            .iter()
            .position(|candidate| candidate == name)
            .ok_or_else(|| BatchError::MissingField {
                field: name.to_string(),
                pattern: self.pattern.clone(),
            })?;
        Ok(&self.values[index])
    }

    pub fn read_optional_string(&self, name: &str) -> BatchResult<Option<String>> {
        let raw = self.read_raw(name)?.trim();
        if raw.is_empty() {
            Ok(None)
        } else {
            Ok(Some(raw.to_string()))
        }
    }

    pub fn read_i64(&self, name: &str) -> BatchResult<i64> {
        let raw = self.read_raw(name)?;
        raw.trim()
            .parse::<i64>()
            .map_err(|err| BatchError::malformed(name, raw, err))
    }

    pub fn read_i32(&self, name: &str) -> BatchResult<i32> {
        let raw = self.read_raw(name)?;
        raw.trim()
            .parse::<i32>()
            .map_err(|err| BatchError::malformed(name, raw, err))
    }

    pub fn read_optional_i32(&self, name: &str) -> BatchResult<Option<i32>> {
        let raw = self.read_raw(name)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        raw.trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|err| BatchError::malformed(name, raw, err))
    }
}
