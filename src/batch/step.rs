use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::error::{BatchError, BatchResult};
use super::listener::{ChunkListener, ChunkProgress};
use super::mapper::ItemMapper;
use super::reader::ItemReader;
use super::validator::ItemValidator;
use super::writer::ItemWriter;

const MAX_PREALLOCATED_ITEMS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkState {
    Idle,
    Reading,
    Mapping,
    Validating,
    Writing,
    Committing,
    ChunkDone,
    ChunkFailed,
    JobDone,
    JobFailed,
}

impl ChunkState {
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkState::Idle => "idle",
            ChunkState::Reading => "reading",
            ChunkState::Mapping => "mapping",
            ChunkState::Validating => "validating",
            ChunkState::Writing => "writing",
            ChunkState::Committing => "committing",
            ChunkState::ChunkDone => "chunk_done",
            ChunkState::ChunkFailed => "chunk_failed",
            ChunkState::JobDone => "job_done",
            ChunkState::JobFailed => "job_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Started,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Started => "started",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepExecution {
    pub step_name: String,
    pub status: StepStatus,
    pub state: ChunkState,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub chunk_count: usize,
    pub read_count: usize,
    pub write_count: usize,
    pub filter_count: usize,
    pub rows_affected: usize,
    pub commit_count: usize,
    pub rollback_count: usize,
    pub failure: Option<String>,
}

impl StepExecution {
    fn start(step_name: &str) -> Self {
        Self {
            step_name: step_name.to_string(),
            status: StepStatus::Started,
            state: ChunkState::Idle,
            started_at: Utc::now(),
            ended_at: None,
            chunk_count: 0,
            read_count: 0,
            write_count: 0,
            filter_count: 0,
            rows_affected: 0,
            commit_count: 0,
            rollback_count: 0,
            failure: None,
        }
    }

    fn enter(&mut self, next: ChunkState) {
        debug!(
            step = %self.step_name,
            from = self.state.as_str(),
            to = next.as_str(),
            "chunk state transition"
        );
        self.state = next;
    }

    fn finish(&mut self, state: ChunkState, failure: Option<String>) {
        self.enter(state);
        self.status = if failure.is_some() {
            StepStatus::Failed
        } else {
            StepStatus::Completed
        };
        self.failure = failure;
        self.ended_at = Some(Utc::now());
    }

    pub fn progress(&self) -> ChunkProgress {
        ChunkProgress {
            step_name: self.step_name.clone(),
            chunk: self.chunk_count,
            read_count: self.read_count,
            write_count: self.write_count,
            filter_count: self.filter_count,
        }
    }
}

#[derive(Debug, Error)]
#[error(
    "step {} failed after {} committed chunks",
    .execution.step_name,
    .execution.chunk_count
)]
pub struct StepFailed {
    pub execution: StepExecution,
    #[source]
    pub error: BatchError,
}

pub struct ChunkStep<'a, R, T> {
    name: String,
    chunk_size: usize,
    mapper: &'a dyn ItemMapper<R, T>,
    validator: Option<&'a dyn ItemValidator<T>>,
    writer: &'a dyn ItemWriter<T>,
    abort: Option<Arc<AtomicBool>>,
}

impl<'a, R, T> ChunkStep<'a, R, T> {
    pub fn new(
        name: &str,
        chunk_size: usize,
        mapper: &'a dyn ItemMapper<R, T>,
        writer: &'a dyn ItemWriter<T>,
    ) -> BatchResult<Self> {
        if chunk_size == 0 {
            return Err(BatchError::InvalidConfig(
                "chunk size must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            chunk_size,
            mapper,
            validator: None,
            writer,
            abort: None,
        })
    }

    pub fn with_validator(mut self, validator: &'a dyn ItemValidator<T>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_abort_flag(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = Some(abort);
        self
    }

    pub fn execute(
        &self,
        connection: &mut Connection,
        reader: &mut dyn ItemReader<R>,
        listener: &mut dyn ChunkListener,
    ) -> Result<StepExecution, StepFailed> {
        let mut execution = StepExecution::start(&self.name);
        info!(step = %self.name, chunk_size = self.chunk_size, "starting step");

        loop {
            match self.run_chunk(connection, reader, &mut execution) {
                Ok(true) => listener.after_chunk(&execution.progress()),
                Ok(false) => {
                    execution.finish(ChunkState::JobDone, None);
                    listener.after_step(&execution);
                    return Ok(execution);
                }
                Err(err) => {
                    execution.rollback_count += 1;
                    execution.enter(ChunkState::ChunkFailed);
                    error!(
                        step = %self.name,
                        chunk = execution.chunk_count + 1,
                        error = %err,
                        "chunk failed, rolled back"
                    );
                    execution.finish(ChunkState::JobFailed, Some(err.to_string()));
                    listener.after_step(&execution);
                    return Err(StepFailed {
                        execution,
                        error: err,
                    });
                }
            }
        }
    }

    fn run_chunk(
        &self,
        connection: &mut Connection,
        reader: &mut dyn ItemReader<R>,
        execution: &mut StepExecution,
    ) -> BatchResult<bool> {
        let chunk = execution.chunk_count + 1;

        execution.enter(ChunkState::Reading);
        let mut raw = Vec::with_capacity(self.chunk_size.min(MAX_PREALLOCATED_ITEMS));
        while raw.len() < self.chunk_size {
            let Some(record) = reader.read()? else {
                break;
            };
            execution.read_count += 1;
            raw.push(record);
        }
        if raw.is_empty() {
            return Ok(false);
        }
        self.check_abort(chunk)?;

        execution.enter(ChunkState::Mapping);
        let items = raw
            .into_iter()
            .map(|record| self.mapper.map(record))
            .collect::<BatchResult<Vec<T>>>()?;

        execution.enter(ChunkState::Validating);
        let mut accepted = Vec::with_capacity(items.len());
        for item in items {
            let Some(validator) = self.validator else {
                accepted.push(item);
                continue;
            };
            match validator.validate(connection, &item) {
                Ok(()) => accepted.push(item),
                Err(err) if !err.is_chunk_fatal() => {
                    execution.filter_count += 1;
                    warn!(step = %self.name, chunk, reason = %err, "filtered item");
                }
                Err(err) => return Err(err),
            }
        }
        self.check_abort(chunk)?;

        execution.enter(ChunkState::Writing);
        // Dropping `tx` on any early return rolls the chunk back.
        let tx = connection
            .transaction()
            .map_err(|source| BatchError::Transaction {
                action: "begin",
                source,
            })?;
        let rows = self.writer.write(&tx, &accepted)?;
        self.check_abort(chunk)?;

        execution.enter(ChunkState::Committing);
        tx.commit().map_err(|source| BatchError::Transaction {
            action: "commit",
            source,
        })?;

        execution.chunk_count = chunk;
        execution.commit_count += 1;
        execution.write_count += accepted.len();
        execution.rows_affected += rows;
        execution.enter(ChunkState::ChunkDone);
        Ok(true)
    }

    fn check_abort(&self, chunk: usize) -> BatchResult<()> {
        match &self.abort {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(BatchError::Aborted {
                step: self.name.clone(),
                chunk,
            }),
            _ => Ok(()),
        }
    }
}
