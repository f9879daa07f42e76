//! CLI entry point.
//!
//! # Responsibility
//! - Run one save wave for a record read from JSON against the in-process
//!   host, then print the persisted annotated-notes values.
//! - Keep output deterministic so fixtures can be diffed.

use annotated_notes_core::{
    core_version, default_log_level, init_logging, AnnotatedNotesPlugin, ContentRecord, FieldKind,
    InMemoryHost, Record, SaveContext, SaveOptions, SaveService,
};
use clap::Parser;
use log::info;
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "annotated-notes", version, about = "Fill note annotations on save")]
struct Args {
    /// Record JSON file (id, site_id, kind, attributes, field_layout, values).
    #[arg(long)]
    record: PathBuf,

    /// Also print column metadata and capabilities of every annotated-notes
    /// field.
    #[arg(long)]
    columns: bool,

    /// Log level: trace|debug|info|warn|error.
    #[arg(long, env = "ANNOTATED_NOTES_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, env = "ANNOTATED_NOTES_LOG_DIR")]
    log_dir: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("annotated-notes: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = &args.log_dir {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }
    info!("event=cli_start module=cli version={}", core_version());

    let document = std::fs::read_to_string(&args.record)?;
    let mut record: ContentRecord = serde_json::from_str(&document)?;

    let host = InMemoryHost::new(AnnotatedNotesPlugin::registry()?);
    let ctx = SaveContext::new();
    let saved = host.save_record(&mut record, SaveOptions::FULL, &ctx);

    let mut report = json!({
        "record": record.key().to_string(),
        "saved": saved,
        "saves": host.save_log().len(),
        "values": host.stored_content(record.key()).unwrap_or_default(),
    });
    if args.columns {
        let columns: serde_json::Map<String, serde_json::Value> = record
            .field_layout()
            .unwrap_or_default()
            .iter()
            .filter_map(|field| match &field.kind {
                FieldKind::AnnotatedNotes(settings) => Some((
                    field.handle.clone(),
                    json!({
                        "columns": settings.columns(),
                        "capabilities": field
                            .kind
                            .capabilities()
                            .iter()
                            .map(|capability| json!({
                                "id": capability.as_str(),
                                "description": capability.description(),
                            }))
                            .collect::<Vec<_>>(),
                    }),
                )),
                _ => None,
            })
            .collect();
        report["columns"] = serde_json::Value::Object(columns);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
