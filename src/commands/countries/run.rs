use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use tracing::info;

use crate::batch::{ChunkStep, JsonArrayItemReader, LoggingChunkListener};
use crate::cli::CountriesArgs;
use crate::commands::job::{JobRun, render_command};

use super::domain::{CountryData, CountryRecord};
use super::mapper::normalize_country;
use super::writers::country_writer;

const JOB_NAME: &str = "countries";
const STEP_NAME: &str = "import_country_step";

pub fn run(args: CountriesArgs) -> Result<()> {
    let job = JobRun::start(JOB_NAME, &args.job)?;

    let chunk_size = args.chunk_size as usize;
    let writer = country_writer();
    let step = ChunkStep::<CountryRecord, CountryData>::new(
        STEP_NAME,
        chunk_size,
        &normalize_country,
        &writer,
    )?;

    let input = File::open(job.input_path())
        .with_context(|| format!("failed to open {}", job.input_path().display()))?;
    let mut reader = JsonArrayItemReader::<_, CountryRecord>::from_reader(BufReader::new(input))
        .with_context(|| format!("failed to parse {}", job.input_path().display()))?;

    let mut connection = job.open_database()?;
    let outcome = step.execute(&mut connection, &mut reader, &mut LoggingChunkListener);

    let command = render_command(
        JOB_NAME,
        &args.job,
        &[("chunk-size", args.chunk_size.to_string())],
    );
    let manifest = job.finish(&connection, command, chunk_size, outcome)?;
    info!(
        countries = manifest.step.write_count,
        rows = manifest.step.rows_affected,
        "countries imported"
    );

    Ok(())
}
