use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{annotate::AnnotationKind, config::FallbackPolicy, infer::DateDetection};

#[derive(Debug, Parser)]
#[command(author, version, about = "Preview and type tabular dataset payloads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Normalize a payload and print one page as a table
    Preview(PreviewArgs),
    /// Resolve the column schema of a payload
    Schema(SchemaArgs),
    /// Write the normalized table as CSV
    Export(ExportArgs),
    /// Append a validation or split summary row and print the table
    Annotate(AnnotateArgs),
}

/// Options shared by every command that reads a payload.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Payload file: JSON in any supported shape, or delimited text (`-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// YAML configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Delimiter for text payloads (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<char>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Date detection used during type inference
    #[arg(long = "date-detection")]
    pub date_detection: Option<DateDetection>,
    /// Table to show when the payload is not recognized
    #[arg(long)]
    pub fallback: Option<FallbackPolicy>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// 1-based page to display
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Rows per page
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,
    /// Print the resolved schema below the table
    #[arg(long = "show-schema")]
    pub show_schema: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum SchemaFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Backend schema (JSON) to enrich instead of inferring from scratch
    #[arg(long)]
    pub explicit: Option<PathBuf>,
    /// Output format
    #[arg(long, default_value = "yaml")]
    pub format: SchemaFormat,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter to use for output
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<char>,
}

#[derive(Debug, Args)]
pub struct AnnotateArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Kind of summary row
    #[arg(long)]
    pub kind: AnnotationKind,
    /// Summary text placed in the synthetic row
    #[arg(long)]
    pub message: String,
}

pub fn parse_delimiter(value: &str) -> Result<char, String> {
    match value {
        "tab" | "\t" => Ok('\t'),
        "comma" | "," => Ok(','),
        "|" | "pipe" => Ok('|'),
        ";" | "semicolon" => Ok(';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if first == '"' {
                return Err("Delimiter cannot be the quote character".to_string());
            }
            Ok(first)
        }
    }
}
