pub mod annotate;
pub mod cli;
pub mod config;
pub mod delimited;
pub mod error;
pub mod infer;
pub mod io_utils;
pub mod normalize;
pub mod paginate;
pub mod payload;
pub mod preview;
pub mod samples;
pub mod schema;
pub mod session;
pub mod source;
pub mod table;
pub mod value;

use std::{env, io::Write, path::Path, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};
use serde_json::Value as JsonValue;

use crate::{
    cli::{AnnotateArgs, Cli, Commands, ExportArgs, InputArgs, PreviewArgs, SchemaArgs, SchemaFormat},
    config::PreviewConfig,
    error::FetchError,
    io_utils::{open_csv_writer, open_output, read_payload, resolve_encoding, write_table_csv},
    session::PreviewSession,
    source::DatasetId,
    table::{render_page, status_line},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("dataset_preview", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Preview(args) => handle_preview(&args),
        Commands::Schema(args) => handle_schema(&args),
        Commands::Export(args) => handle_export(&args),
        Commands::Annotate(args) => handle_annotate(&args),
    }
}

fn resolve_config(args: &InputArgs) -> Result<PreviewConfig> {
    let mut config = match &args.config {
        Some(path) => PreviewConfig::load(path)
            .with_context(|| format!("Loading configuration from {path:?}"))?,
        None => PreviewConfig::default(),
    };
    if let Some(delimiter) = args.delimiter {
        config.delimiter = delimiter;
    }
    if let Some(date_detection) = args.date_detection {
        config.date_detection = date_detection;
    }
    if let Some(fallback) = args.fallback {
        config.fallback = fallback;
    }
    config.validate()?;
    Ok(config)
}

fn dataset_id(path: &Path) -> DatasetId {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(DatasetId::from)
        .unwrap_or_else(|| DatasetId::from("stdin"))
}

/// Loads the payload named by `args` into a fresh session.
fn open_session(args: &InputArgs, config: PreviewConfig) -> Result<(PreviewSession, DatasetId)> {
    let encoding = resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Reading payload '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(config.delimiter)
    );
    let payload = read_payload(&args.input, encoding)
        .with_context(|| format!("Reading payload from {:?}", args.input))?;
    let source = move |_: &DatasetId, _: Option<usize>| -> Result<JsonValue, FetchError> {
        Ok(payload.clone())
    };
    Ok((PreviewSession::new(config, source), dataset_id(&args.input)))
}

fn handle_preview(args: &PreviewArgs) -> Result<()> {
    let mut config = resolve_config(&args.input)?;
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
        config.validate()?;
    }
    let (mut session, id) = open_session(&args.input, config)?;
    session.load(id);
    if args.page != 1 && !session.change_page(args.page) {
        warn!(
            "Page {} is out of range (1..={}); showing page {}",
            args.page,
            session.paginator().total_pages(),
            session.paginator().current_page()
        );
    }

    let table = session.table();
    let rows = session.visible_rows();
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{}", render_page(&table, rows)).context("Writing table")?;
    writeln!(stdout, "{}", status_line(&table, session.paginator(), rows.len()))
        .context("Writing status line")?;
    if args.show_schema {
        writeln!(stdout).context("Writing schema")?;
        write!(stdout, "{}", table.schema().to_yaml_string()?).context("Writing schema")?;
    }
    Ok(())
}

fn handle_schema(args: &SchemaArgs) -> Result<()> {
    let config = resolve_config(&args.input)?;
    let (mut session, id) = open_session(&args.input, config)?;
    if let Some(path) = &args.explicit {
        let encoding = resolve_encoding(args.input.input_encoding.as_deref())?;
        let explicit = read_payload(path, encoding)
            .with_context(|| format!("Reading explicit schema from {path:?}"))?;
        session = session.with_schema_source(
            move |_: &DatasetId| -> Result<JsonValue, FetchError> { Ok(explicit.clone()) },
        );
    }
    session.load(id);
    let table = session.table();
    if table.is_fallback() {
        bail!("Payload {:?} is not a recognized table", args.input.input);
    }

    let schema = table.schema();
    let rendered = match args.format {
        SchemaFormat::Yaml => schema.to_yaml_string()?,
        SchemaFormat::Json => schema.to_json_string()? + "\n",
    };
    let mut output = open_output(args.output.as_deref())?;
    output
        .write_all(rendered.as_bytes())
        .context("Writing schema output")?;
    output.flush().context("Flushing schema output")?;
    if let Some(path) = &args.output {
        info!("Schema for {} column(s) written to {path:?}", schema.len());
    }
    Ok(())
}

fn handle_export(args: &ExportArgs) -> Result<()> {
    let config = resolve_config(&args.input)?;
    let (mut session, id) = open_session(&args.input, config)?;
    session.load(id);
    let table = session.table();
    if table.is_fallback() {
        bail!("Payload {:?} is not a recognized table", args.input.input);
    }
    let delimiter = args.output_delimiter.unwrap_or(',');
    debug!("Exporting with delimiter '{}'", printable_delimiter(delimiter));
    let mut writer = open_csv_writer(args.output.as_deref(), delimiter)?;
    write_table_csv(&mut writer, &table)?;
    if let Some(path) = &args.output {
        info!("Exported {} row(s) to {path:?}", table.row_count());
    }
    Ok(())
}

fn handle_annotate(args: &AnnotateArgs) -> Result<()> {
    let config = resolve_config(&args.input)?;
    let (mut session, id) = open_session(&args.input, config)?;
    session.load(id);
    session.annotate(args.kind, &args.message);
    let table = session.table();
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{}", render_page(&table, table.rows())).context("Writing table")?;
    writeln!(stdout, "{}", status_line(&table, session.paginator(), table.row_count()))
        .context("Writing status line")?;
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: char) -> String {
    match delimiter {
        '\t' => "\\t".to_string(),
        '\n' => "\\n".to_string(),
        other => other.to_string(),
    }
}
