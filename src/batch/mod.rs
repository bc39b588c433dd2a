mod error;
mod field_set;
mod listener;
mod mapper;
mod reader;
pub mod repository;
mod step;
mod tokenizer;
mod validator;
mod writer;

pub use error::{BatchError, BatchResult};
pub use field_set::FieldSet;
pub use listener::{ChunkListener, ChunkProgress, LoggingChunkListener};
pub use mapper::{ItemMapper, LineMapper};
pub use reader::{FlatFileItemReader, ItemReader, JsonArrayItemReader, RawLine};
pub use step::{ChunkState, ChunkStep, StepExecution, StepFailed, StepStatus};
pub use tokenizer::{LayoutConfig, PatternMatchingTokenizer, TokenizerConfig};
pub use validator::{ExistenceValidator, ItemValidator};
pub use writer::{
    Classified, ClassifierCompositeWriter, DenormalizingWriter, ItemWriter, SqlBatchWriter,
};
