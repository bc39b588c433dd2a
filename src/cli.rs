use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "chunkload",
    version,
    about = "Chunk-oriented flat-file and JSON imports into SQLite"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    CustomerUpdates(CustomerUpdatesArgs),
    Countries(CountriesArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    #[arg(long, default_value = ".cache/chunkload")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub manifest_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CustomerUpdatesArgs {
    #[command(flatten)]
    pub job: JobArgs,

    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    pub chunk_size: u32,

    #[arg(long)]
    pub layout_config: Option<PathBuf>,

    #[arg(long)]
    pub delimiter: Option<char>,

    #[arg(long, default_value_t = 0)]
    pub lines_to_skip: usize,

    #[arg(long = "comment-prefix")]
    pub comment_prefixes: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CountriesArgs {
    #[command(flatten)]
    pub job: JobArgs,

    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub chunk_size: u32,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/chunkload")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}
