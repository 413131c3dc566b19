pub mod autofill;
pub mod cell;
pub mod classify;
pub mod completion;
pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod model;
pub mod navigation;
pub mod schema;
pub mod session;
pub mod store;
pub mod styles;
pub mod workbook;

pub use config::{CliArgs, Command, SurveyConfig};
pub use error::{SurveyError, SurveyResult};
pub use logging::{LoggingConfig, init_logging};
pub use model::{CellInput, Completion, DataRow, EditRecord, ExemptionReason, Field, FieldType};
pub use session::{EditOutcome, ExportArtifact, SessionOrigin, SharedSession, SurveySession};
pub use store::{DirectoryStore, NullStore, SessionStore};

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

/// Run one CLI command and return its JSON report.
pub fn run(args: CliArgs) -> Result<Value> {
    let config = SurveyConfig::from_path(args.config.as_deref())?;
    let span = logging::operation_span(command_name(&args.command));
    let _entered = span.enter();

    match &args.command {
        Command::Schema { file } => {
            let session = open_session(&args, config, file)?;
            Ok(json!({
                "sheet": session.file_name(),
                "schema": session.schema(),
            }))
        }
        Command::Rows { file } => {
            let session = open_session(&args, config, file)?;
            let rows = session
                .rows()
                .iter()
                .map(|entity| {
                    let completion = session.completion(entity.row);
                    json!({
                        "row": entity.row,
                        "name": entity.name,
                        "filled": completion.filled,
                        "total": completion.total,
                        "percent": completion.rounded(),
                        "sufficient": session
                            .config()
                            .completion
                            .is_sufficient(&entity.name, &completion),
                    })
                })
                .collect::<Vec<_>>();
            Ok(json!({ "rows": rows }))
        }
        Command::Form { file, row } => {
            let session = open_session(&args, config, file)?;
            let row = resolve_row(&session, row)?;
            let form = session.form(row)?;
            Ok(json!({
                "form": form,
                "completion": session.completion(row),
                "next": session.next_incomplete(row, None)?,
                "force_edit": session.force_edit(),
            }))
        }
        Command::Set {
            file,
            row,
            column,
            value,
            out,
        } => {
            let mut session = open_session(&args, config, file)?;
            let row = resolve_row(&session, row)?;
            let field_type = session
                .schema()
                .field(*column)
                .map(|field| field.field_type)
                .ok_or(SurveyError::UnknownField { column: *column })?;
            let outcome = session.apply_edit(row, *column, CellInput::parse_for(field_type, value))?;
            let written = write_export(&session, out.as_deref())?;
            Ok(json!({ "outcome": outcome, "exported": written }))
        }
        Command::Exempt {
            file,
            row,
            column,
            out,
        } => {
            let mut session = open_session(&args, config, file)?;
            let row = resolve_row(&session, row)?;
            let outcome = session.toggle_exemption(row, *column)?;
            let written = write_export(&session, out.as_deref())?;
            Ok(json!({ "outcome": outcome, "exported": written }))
        }
        Command::FillDefaults { file, row, out } => {
            let mut session = open_session(&args, config, file)?;
            let row = resolve_row(&session, row)?;
            let filled = session.auto_fill(row)?;
            let written = write_export(&session, out.as_deref())?;
            Ok(json!({
                "filled": filled,
                "completion": session.completion(row),
                "exported": written,
            }))
        }
        Command::Next { file, row, after } => {
            let session = open_session(&args, config, file)?;
            let row = resolve_row(&session, row)?;
            let inputs = session.form(row)?.ordered_inputs();
            let next = navigation::find_next(&inputs, *after);
            Ok(json!({
                "index": next,
                "input": next.and_then(|index| inputs.get(index)),
            }))
        }
        Command::Restore { out } => {
            let store = store::open_or_null(args.store_dir.as_deref());
            let mut session = SurveySession::restore(config, store)
                .ok_or_else(|| anyhow!("no saved session to restore"))??;
            session.set_force_edit(args.force_edit);
            let target = out
                .clone()
                .unwrap_or_else(|| PathBuf::from(&session.config().export.file_name));
            let written = write_export(&session, Some(&target))?;
            Ok(json!({
                "file": session.file_name(),
                "rows": session.rows().len(),
                "exported": written,
            }))
        }
        Command::Discard => {
            let Some(dir) = args.store_dir.as_deref() else {
                bail!("--store-dir is required to discard a saved session");
            };
            let mut store = DirectoryStore::open(dir)?;
            store.clear()?;
            Ok(json!({ "discarded": dir }))
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Schema { .. } => "schema",
        Command::Rows { .. } => "rows",
        Command::Form { .. } => "form",
        Command::Set { .. } => "set",
        Command::Exempt { .. } => "exempt",
        Command::FillDefaults { .. } => "fill_defaults",
        Command::Next { .. } => "next",
        Command::Restore { .. } => "restore",
        Command::Discard => "discard",
    }
}

/// Open `file`. When the store already holds this exact file the saved session continues,
/// edits included; any other file starts a new one.
fn open_session(args: &CliArgs, config: SurveyConfig, file: &Path) -> Result<SurveySession> {
    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("workbook.xlsx")
        .to_string();
    let store = store::open_or_null(args.store_dir.as_deref());

    let continues = matches!(
        store.load_file(),
        Ok(Some(stored)) if stored.name == name && stored.bytes == bytes
    );
    let restored = if continues {
        SurveySession::restore(config.clone(), store)
    } else {
        None
    };
    let mut session = match restored {
        Some(session) => session?,
        None => {
            let store = store::open_or_null(args.store_dir.as_deref());
            SurveySession::load(&bytes, &name, config, store, SessionOrigin::NewUpload)?
        }
    };
    session.set_force_edit(args.force_edit);
    Ok(session)
}

/// Entity by row number, or by exact name.
fn resolve_row(session: &SurveySession, key: &str) -> Result<u32> {
    let key = key.trim();
    let by_number = key
        .parse::<u32>()
        .ok()
        .filter(|&row| session.rows().iter().any(|entity| entity.row == row));
    if let Some(row) = by_number {
        return Ok(row);
    }
    session
        .row_by_name(key)
        .map(|entity| entity.row)
        .ok_or_else(|| anyhow!("no entity named or numbered {key:?}"))
}

fn write_export(session: &SurveySession, out: Option<&Path>) -> Result<Option<PathBuf>> {
    let Some(out) = out else {
        return Ok(None);
    };
    let artifact = session.export()?;
    fs::write(out, &artifact.bytes)
        .with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(path = %out.display(), mime = %artifact.mime_type, "export written");
    Ok(Some(out.to_path_buf()))
}
