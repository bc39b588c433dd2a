use super::error::BatchResult;
use super::field_set::FieldSet;
use super::reader::RawLine;
use super::tokenizer::PatternMatchingTokenizer;

pub trait ItemMapper<R, T> {
    fn map(&self, raw: R) -> BatchResult<T>;
}

impl<R, T, F> ItemMapper<R, T> for F
where
    F: Fn(R) -> BatchResult<T>,
{
    fn map(&self, raw: R) -> BatchResult<T> {
        self(raw)
    }
}

pub struct LineMapper<T> {
    tokenizer: PatternMatchingTokenizer,
    field_set_mapper: fn(&FieldSet) -> BatchResult<T>,
}

impl<T> LineMapper<T> {
    pub fn new(
        tokenizer: PatternMatchingTokenizer,
        field_set_mapper: fn(&FieldSet) -> BatchResult<T>,
    ) -> Self {
        Self {
            tokenizer,
            field_set_mapper,
        }
    }
}

impl<T> ItemMapper<RawLine, T> for LineMapper<T> {
    fn map(&self, raw: RawLine) -> BatchResult<T> {
        let fields = self.tokenizer.tokenize(&raw)?;
        (self.field_set_mapper)(&fields)
    }
}
