use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::batch::{
    ChunkStep, FlatFileItemReader, LineMapper, LoggingChunkListener, PatternMatchingTokenizer,
    RawLine, TokenizerConfig,
};
use crate::cli::CustomerUpdatesArgs;
use crate::commands::job::{JobRun, render_command};

use super::domain::CustomerUpdate;
use super::mapper::{customer_update_layouts, map_customer_update};
use super::writers::{customer_update_writer, customer_validator};

const JOB_NAME: &str = "customer-updates";
const STEP_NAME: &str = "customer_update_step";

pub fn run(args: CustomerUpdatesArgs) -> Result<()> {
    let job = JobRun::start(JOB_NAME, &args.job)?;

    let config = load_tokenizer_config(args.layout_config.as_deref(), args.delimiter)?;
    let tokenizer =
        PatternMatchingTokenizer::new(&config).context("invalid customer record layouts")?;
    let mapper = LineMapper::new(tokenizer, map_customer_update);
    let validator = customer_validator();
    let writer = customer_update_writer();

    let chunk_size = args.chunk_size as usize;
    let step =
        ChunkStep::<RawLine, CustomerUpdate>::new(STEP_NAME, chunk_size, &mapper, &writer)?
            .with_validator(&validator);

    let input = File::open(job.input_path())
        .with_context(|| format!("failed to open {}", job.input_path().display()))?;
    let mut reader =
        FlatFileItemReader::new(BufReader::new(input)).with_lines_to_skip(args.lines_to_skip);
    if !args.comment_prefixes.is_empty() {
        reader = reader.with_comment_prefixes(args.comment_prefixes.clone());
    }

    let mut connection = job.open_database()?;
    let outcome = step.execute(&mut connection, &mut reader, &mut LoggingChunkListener);

    let manifest = job.finish(
        &connection,
        render_customer_updates_command(&args),
        chunk_size,
        outcome,
    )?;
    info!(
        read = manifest.step.read_count,
        written = manifest.step.write_count,
        filtered = manifest.step.filter_count,
        "customer updates applied"
    );

    Ok(())
}

// The delimiter flag wins over both built-in and file layouts.
pub(super) fn load_tokenizer_config(
    layout_config: Option<&Path>,
    delimiter: Option<char>,
) -> Result<TokenizerConfig> {
    let mut config = match layout_config {
        Some(path) => {
            let raw = fs::read(path)
                .with_context(|| format!("failed to read layout config {}", path.display()))?;
            serde_json::from_slice::<TokenizerConfig>(&raw)
                .with_context(|| format!("failed to parse layout config {}", path.display()))?
        }
        None => customer_update_layouts(),
    };

    if let Some(delimiter) = delimiter {
        config.delimiter = delimiter;
    }

    Ok(config)
}

pub(super) fn render_customer_updates_command(args: &CustomerUpdatesArgs) -> String {
    let mut extra = vec![("chunk-size", args.chunk_size.to_string())];
    if let Some(path) = &args.layout_config {
        extra.push(("layout-config", path.display().to_string()));
    }
    if let Some(delimiter) = args.delimiter {
        extra.push(("delimiter", delimiter.to_string()));
    }
    if args.lines_to_skip > 0 {
        extra.push(("lines-to-skip", args.lines_to_skip.to_string()));
    }
    for prefix in &args.comment_prefixes {
        extra.push(("comment-prefix", prefix.clone()));
    }

    render_command(JOB_NAME, &args.job, &extra)
}
