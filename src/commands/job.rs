use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::batch::repository::record_step_execution;
use crate::batch::{StepExecution, StepFailed};
use crate::cli::JobArgs;
use crate::commands::schema::{DB_SCHEMA_VERSION, ensure_schema, open_database};
use crate::model::{JobPaths, JobRunManifest};
use crate::util::{compact_stamp, ensure_directory, rfc3339, sha256_file, write_json_pretty};

pub fn resolve_db_path(cache_root: &Path, db_path: Option<&Path>) -> PathBuf {
    db_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cache_root.join("chunkload.sqlite"))
}

pub struct JobRun {
    job_name: &'static str,
    run_id: String,
    started_at: String,
    input_sha256: String,
    input_path: PathBuf,
    db_path: PathBuf,
    manifest_path: PathBuf,
}

impl JobRun {
    pub fn start(job_name: &'static str, args: &JobArgs) -> Result<Self> {
        let started_ts = Utc::now();

        let manifest_dir = args
            .manifest_dir
            .clone()
            .unwrap_or_else(|| args.cache_root.join("manifests"));
        ensure_directory(&manifest_dir)?;
        let (run_id, manifest_path) = allocate_run(&manifest_dir, job_name, started_ts);
        let db_path = resolve_db_path(&args.cache_root, args.db_path.as_deref());
        let input_sha256 = sha256_file(&args.input)?;

        info!(
            job = job_name,
            run_id = %run_id,
            input = %args.input.display(),
            db = %db_path.display(),
            "starting job"
        );

        Ok(Self {
            job_name,
            run_id,
            started_at: rfc3339(started_ts),
            input_sha256,
            input_path: args.input.clone(),
            db_path,
            manifest_path,
        })
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn open_database(&self) -> Result<Connection> {
        let connection = open_database(&self.db_path)?;
        ensure_schema(&connection)?;
        Ok(connection)
    }

    // A failed step is recorded before its error is returned.
    pub fn finish(
        self,
        connection: &Connection,
        command: String,
        chunk_size: usize,
        outcome: Result<StepExecution, StepFailed>,
    ) -> Result<JobRunManifest> {
        let (step, failure) = match outcome {
            Ok(step) => (step, None),
            Err(failed) => (failed.execution.clone(), Some(anyhow::Error::new(failed))),
        };

        if let Err(record_err) = record_step_execution(connection, &self.run_id, &step) {
            return Err(match failure {
                Some(step_err) => {
                    error!(
                        run_id = %self.run_id,
                        error = %format!("{record_err:#}"),
                        "failed to record step execution"
                    );
                    step_err.context(format!(
                        "{} job failed and its step execution could not be recorded: {record_err:#}",
                        self.job_name
                    ))
                }
                None => record_err,
            });
        }

        let manifest = JobRunManifest {
            manifest_version: 1,
            run_id: self.run_id.clone(),
            job_name: self.job_name.to_string(),
            db_schema_version: DB_SCHEMA_VERSION.to_string(),
            status: step.status.as_str().to_string(),
            started_at: self.started_at,
            updated_at: rfc3339(Utc::now()),
            command,
            chunk_size,
            input_sha256: self.input_sha256,
            paths: JobPaths {
                input_path: self.input_path.display().to_string(),
                db_path: self.db_path.display().to_string(),
                manifest_path: self.manifest_path.display().to_string(),
            },
            failure_reason: failure.as_ref().map(|err| format!("{err:#}")),
            notes: manifest_notes(&step),
            step,
        };
        write_json_pretty(&self.manifest_path, &manifest)?;

        match failure {
            None => {
                info!(
                    run_id = %manifest.run_id,
                    manifest = %self.manifest_path.display(),
                    "job completed"
                );
                Ok(manifest)
            }
            Some(err) => {
                warn!(
                    run_id = %manifest.run_id,
                    manifest = %self.manifest_path.display(),
                    "job failed"
                );
                Err(err).with_context(|| format!("{} job failed", self.job_name))
            }
        }
    }
}

// Stamps can still repeat within one millisecond; a numeric suffix keeps manifests apart.
fn allocate_run(
    manifest_dir: &Path,
    job_name: &str,
    started_ts: DateTime<Utc>,
) -> (String, PathBuf) {
    let base = compact_stamp(started_ts);
    let file_prefix = job_name.replace('-', "_");

    let mut attempt = 0usize;
    loop {
        let stamp = if attempt == 0 {
            base.clone()
        } else {
            format!("{base}-{attempt}")
        };
        let manifest_path = manifest_dir.join(format!("{file_prefix}_run_{stamp}.json"));
        if !manifest_path.exists() {
            return (format!("{job_name}-{stamp}"), manifest_path);
        }
        attempt += 1;
    }
}

fn manifest_notes(step: &StepExecution) -> Vec<String> {
    let mut notes = Vec::new();
    if step.filter_count > 0 {
        notes.push(format!(
            "{} items filtered by reference validation",
            step.filter_count
        ));
    }
    if step.rollback_count > 0 {
        notes.push(format!(
            "chunk {} rolled back; {} earlier chunks stay committed",
            step.chunk_count + 1,
            step.commit_count
        ));
    }
    notes
}

pub fn render_command(subcommand: &str, args: &JobArgs, extra: &[(&str, String)]) -> String {
    let mut command = vec![
        "chunkload".to_string(),
        subcommand.to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
        "--input".to_string(),
        args.input.display().to_string(),
    ];

    if let Some(db_path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(db_path.display().to_string());
    }
    if let Some(manifest_dir) = &args.manifest_dir {
        command.push("--manifest-dir".to_string());
        command.push(manifest_dir.display().to_string());
    }
    for (flag, value) in extra {
        command.push(format!("--{flag}"));
        command.push(value.clone());
    }

    command.join(" ")
}
