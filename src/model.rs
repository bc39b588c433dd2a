use serde::Serialize;

use crate::batch::StepExecution;

#[derive(Debug, Clone, Serialize)]
pub struct JobPaths {
    pub input_path: String,
    pub db_path: String,
    pub manifest_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub job_name: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub chunk_size: usize,
    pub input_sha256: String,
    pub paths: JobPaths,
    pub step: StepExecution,
    pub failure_reason: Option<String>,
    pub notes: Vec<String>,
}
