use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use super::step::StepExecution;

pub(crate) fn ensure_step_execution_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS batch_step_execution (
              execution_id INTEGER PRIMARY KEY AUTOINCREMENT,
              run_id TEXT NOT NULL,
              step_name TEXT NOT NULL,
              status TEXT NOT NULL,
              started_at TEXT NOT NULL,
              ended_at TEXT,
              chunk_count INTEGER NOT NULL,
              read_count INTEGER NOT NULL,
              write_count INTEGER NOT NULL,
              filter_count INTEGER NOT NULL,
              rows_affected INTEGER NOT NULL,
              commit_count INTEGER NOT NULL,
              rollback_count INTEGER NOT NULL,
              failure TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_step_execution_step ON batch_step_execution(step_name, started_at);
            ",
        )
        .context("failed to initialize batch_step_execution table")?;

    Ok(())
}

pub fn record_step_execution(
    connection: &Connection,
    run_id: &str,
    execution: &StepExecution,
) -> Result<i64> {
    connection
        .execute(
            "
            INSERT INTO batch_step_execution(
              run_id, step_name, status, started_at, ended_at,
              chunk_count, read_count, write_count, filter_count, rows_affected,
              commit_count, rollback_count, failure
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ",
            params![
                run_id,
                execution.step_name,
                execution.status.as_str(),
                execution.started_at,
                execution.ended_at,
                execution.chunk_count as i64,
                execution.read_count as i64,
                execution.write_count as i64,
                execution.filter_count as i64,
                execution.rows_affected as i64,
                execution.commit_count as i64,
                execution.rollback_count as i64,
                execution.failure,
            ],
        )
        .with_context(|| format!("failed to record execution of step {}", execution.step_name))?;

    Ok(connection.last_insert_rowid())
}

#[derive(Debug, Clone)]
pub struct StepExecutionRow {
    pub run_id: String,
    pub step_name: String,
    pub status: String,
    pub read_count: i64,
    pub write_count: i64,
    pub filter_count: i64,
    pub failure: Option<String>,
}

pub fn latest_step_executions(connection: &Connection, limit: usize) -> Result<Vec<StepExecutionRow>> {
    let mut statement = connection.prepare(
        "
        SELECT run_id, step_name, status, read_count, write_count, filter_count, failure
        FROM batch_step_execution
        ORDER BY execution_id DESC
        LIMIT ?1
        ",
    )?;

    let mut rows = statement.query([limit as i64])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(StepExecutionRow {
            run_id: row.get(0)?,
            step_name: row.get(1)?,
            status: row.get(2)?,
            read_count: row.get(3)?,
            write_count: row.get(4)?,
            filter_count: row.get(5)?,
            failure: row.get(6)?,
        });
    }

    Ok(out)
}
