use tracing::{info, warn};

use super::step::{StepExecution, StepStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkProgress {
    pub step_name: String,
    pub chunk: usize,
    pub read_count: usize,
    pub write_count: usize,
    pub filter_count: usize,
}

pub trait ChunkListener {
    fn after_chunk(&mut self, _progress: &ChunkProgress) {}

    fn after_step(&mut self, _execution: &StepExecution) {}
}

#[derive(Debug, Default)]
pub struct LoggingChunkListener;

impl ChunkListener for LoggingChunkListener {
    fn after_chunk(&mut self, progress: &ChunkProgress) {
        info!(
            step = %progress.step_name,
            chunk = progress.chunk,
            read = progress.read_count,
            written = progress.write_count,
            filtered = progress.filter_count,
            "processed chunk"
        );
    }

    fn after_step(&mut self, execution: &StepExecution) {
        match execution.status {
            StepStatus::Completed => info!(
                step = %execution.step_name,
                read = execution.read_count,
                written = execution.write_count,
                filtered = execution.filter_count,
                rows = execution.rows_affected,
                commits = execution.commit_count,
                "step completed"
            ),
            StepStatus::Failed | StepStatus::Started => warn!(
                step = %execution.step_name,
                read = execution.read_count,
                written = execution.write_count,
                rollbacks = execution.rollback_count,
                failure = %execution.failure.as_deref().unwrap_or_default(),
                "step did not complete"
            ),
        }
    }
}
