use anyhow::Result;
use tracing::{info, warn};

use crate::batch::repository::latest_step_executions;
use crate::cli::StatusArgs;
use crate::commands::job::resolve_db_path;
use crate::commands::schema::{count_rows, open_database};

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = resolve_db_path(&args.cache_root, args.db_path.as_deref());

    info!(cache_root = %args.cache_root.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let conn = open_database(&db_path)?;
    let customers = count_rows(&conn, "SELECT COUNT(*) FROM customer").unwrap_or(0);
    let countries = count_rows(&conn, "SELECT COUNT(*) FROM country").unwrap_or(0);
    let capitals = count_rows(&conn, "SELECT COUNT(*) FROM country_capital").unwrap_or(0);

    info!(
        path = %db_path.display(),
        customers,
        countries,
        capitals,
        "database status"
    );

    match latest_step_executions(&conn, args.limit) {
        Ok(rows) if rows.is_empty() => info!("no step executions recorded"),
        Ok(rows) => {
            for row in rows {
                info!(
                    run_id = %row.run_id,
                    step = %row.step_name,
                    status = %row.status,
                    read = row.read_count,
                    written = row.write_count,
                    filtered = row.filter_count,
                    failure = %row.failure.unwrap_or_default(),
                    "step execution"
                );
            }
        }
        Err(err) => warn!(error = %err, "step execution history unavailable"),
    }

    Ok(())
}
