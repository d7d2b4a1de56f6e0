use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Join, rank, and quality-check the historical menu dataset",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Join cleaned menu tables, keep the top dishes, and write the analysis dataset
    Pipeline(PipelineArgs),
    /// Compare raw and cleaned tables against the analysis dataset and write a quality report
    Assess(AssessArgs),
}

#[derive(Debug, Args)]
pub struct PipelineArgs {
    /// Optional YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Directory holding the input tables (defaults to the current directory)
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,
    /// Destination for the analysis dataset
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Number of most frequent dishes to keep
    #[arg(long = "top-dishes")]
    pub top_dishes: Option<usize>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct AssessArgs {
    /// Optional YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Directory holding the input tables (defaults to the current directory)
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,
    /// Analysis dataset produced by the pipeline command
    #[arg(short = 'a', long = "analysis")]
    pub analysis: Option<PathBuf>,
    /// Destination for the quality report
    #[arg(short = 'r', long = "report")]
    pub report: Option<PathBuf>,
    /// Report rendering
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: ReportFormat,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
