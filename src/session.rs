use crate::autofill::{self, PlannedFill};
use crate::classify::classify;
use crate::completion;
use crate::config::SurveyConfig;
use crate::error::{SurveyError, SurveyResult};
use crate::form::Form;
use crate::logging::session_span;
use crate::model::{
    CellInput, Completion, DataRow, EditRecord, ExemptionReason, PatternFillDescriptor,
};
use crate::navigation::find_next;
use crate::schema::{HeaderRows, Schema, extract_schema, index_rows};
use crate::store::SessionStore;
use crate::styles::{exemption_from_fill, user_exempt_fill};
use crate::workbook::{SheetModel, SurveyWorkbook};
use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    /// Fresh upload: replaces whatever the store held.
    NewUpload,
    /// Reopening the stored file; the store is left as is.
    Restore,
}

/// Something applying an edit did besides changing the value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum EditEffect {
    CellWritten { row: u32, column: u32 },
    DateFormatApplied { format: String },
    FillChanged { exemption: ExemptionReason },
    Persisted { key: String },
    PersistFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditOutcome {
    pub completion: Completion,
    pub effects: Vec<EditEffect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// What this session did to one cell.
#[derive(Debug, Clone, Default)]
struct CellHistory {
    /// Last value the user entered.
    value: Option<CellInput>,
    /// Fill the cell had before it was marked N/A; the inner `None` is "no fill".
    fill_before_exemption: Option<Option<PatternFillDescriptor>>,
}

/// One loaded survey workbook with its schema, entities and edit state.
pub struct SurveySession {
    config: SurveyConfig,
    file_name: String,
    workbook: SurveyWorkbook,
    schema: Schema,
    rows: Vec<DataRow>,
    selected: Option<usize>,
    force_edit: bool,
    history: HashMap<(u32, u32), CellHistory>,
    store: Box<dyn SessionStore>,
}

impl std::fmt::Debug for SurveySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurveySession")
            .field("file_name", &self.file_name)
            .field("selected", &self.selected)
            .field("force_edit", &self.force_edit)
            .finish_non_exhaustive()
    }
}

impl SurveySession {
    /// Decode a workbook and derive its schema. On failure nothing is installed and the store
    /// is untouched.
    pub fn load(
        bytes: &[u8],
        file_name: &str,
        config: SurveyConfig,
        mut store: Box<dyn SessionStore>,
        origin: SessionOrigin,
    ) -> SurveyResult<Self> {
        let span = session_span(file_name);
        let _entered = span.enter();

        let workbook = SurveyWorkbook::from_bytes(file_name, bytes)?;

        if origin == SessionOrigin::NewUpload {
            let saved = store
                .clear()
                .and_then(|()| store.save_file(file_name, bytes));
            if let Err(error) = saved {
                warn!(%error, category = error.category(), "session file not saved");
            }
        }

        let headers = HeaderRows::read(workbook.sheet(), &config.layout);
        let schema = extract_schema(&headers, &config);
        let rows = index_rows(
            workbook.sheet(),
            config.layout.data_start_row,
            schema.identity_column,
        );
        info!(
            sheet = workbook.sheet_name(),
            fields = schema.fields.len(),
            entities = rows.len(),
            ?origin,
            "survey workbook loaded"
        );

        Ok(Self {
            config,
            file_name: file_name.to_string(),
            workbook,
            schema,
            rows,
            selected: None,
            force_edit: false,
            history: HashMap::new(),
            store,
        })
    }

    /// Rebuild the stored session, replaying saved edits. `None` when there is nothing to
    /// restore or the store cannot be read.
    pub fn restore(
        config: SurveyConfig,
        store: Box<dyn SessionStore>,
    ) -> Option<SurveyResult<Self>> {
        let stored = match store.load_file() {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(error) => {
                warn!(%error, "session store unreadable, restore not offered");
                return None;
            }
        };
        let edits = store.edits().unwrap_or_else(|error| {
            warn!(%error, "stored edits unreadable, restoring the file alone");
            Vec::new()
        });

        let mut session = match Self::load(
            &stored.bytes,
            &stored.name,
            config,
            store,
            SessionOrigin::Restore,
        ) {
            Ok(session) => session,
            Err(error) => return Some(Err(error)),
        };
        for record in &edits {
            session.replay(record);
        }
        info!(file = %session.file_name, edits = edits.len(), "session restored");
        Some(Ok(session))
    }

    fn replay(&mut self, record: &EditRecord) {
        let (row, column) = (record.row, record.column);
        if let Some(value) = &record.value {
            let date_format = &self.config.auto_fill.date_format;
            self.workbook
                .sheet_mut()
                .write_value(row, column, value, date_format);
            self.history.entry((row, column)).or_default().value = Some(value.clone());
        }

        let fill = self.workbook.sheet().fill(row, column);
        let current = exemption_from_fill(fill.as_ref(), &self.config.keywords.user_exempt_pattern);
        match (record.exempted, current) {
            (true, ExemptionReason::None) => self.mark_exempt(row, column),
            (false, ExemptionReason::UserExempted) => self.clear_exempt(row, column),
            _ => {}
        }
    }

    fn mark_exempt(&mut self, row: u32, column: u32) {
        let sheet = self.workbook.sheet_mut();
        let before = sheet.fill(row, column);
        let fill = user_exempt_fill(before.as_ref(), &self.config.keywords.user_exempt_pattern);
        sheet.write_fill(row, column, Some(&fill));
        let history = self.history.entry((row, column)).or_default();
        if history.fill_before_exemption.is_none() {
            history.fill_before_exemption = Some(before);
        }
    }

    fn clear_exempt(&mut self, row: u32, column: u32) {
        let saved = self
            .history
            .get_mut(&(row, column))
            .and_then(|history| history.fill_before_exemption.take());
        let restored = match saved {
            Some(fill) => fill,
            // marked N/A in the file itself: drop the pattern, keep the colours
            None => self.workbook.sheet().fill(row, column).map(|fill| PatternFillDescriptor {
                pattern_type: None,
                ..fill
            }),
        };
        self.workbook
            .sheet_mut()
            .write_fill(row, column, restored.as_ref());
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn sheet(&self) -> &dyn SheetModel {
        self.workbook.sheet()
    }

    pub fn row_by_name(&self, name: &str) -> Option<&DataRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    pub fn select(&mut self, index: usize) -> Option<&DataRow> {
        let row = self.rows.get(index)?;
        self.selected = Some(index);
        debug!(row = row.row, name = %row.name, "entity selected");
        Some(row)
    }

    pub fn selected(&self) -> Option<&DataRow> {
        self.selected.and_then(|index| self.rows.get(index))
    }

    pub fn force_edit(&self) -> bool {
        self.force_edit
    }

    pub fn set_force_edit(&mut self, enabled: bool) {
        if self.force_edit != enabled {
            info!(enabled, "force-edit mode changed");
        }
        self.force_edit = enabled;
    }

    fn ensure_row(&self, row: u32) -> SurveyResult<&DataRow> {
        self.rows
            .iter()
            .find(|entity| entity.row == row)
            .ok_or(SurveyError::UnknownRow { row })
    }

    fn ensure_field(&self, column: u32) -> SurveyResult<()> {
        self.schema
            .field(column)
            .map(|_| ())
            .ok_or(SurveyError::UnknownField { column })
    }

    pub fn form(&self, row: u32) -> SurveyResult<Form> {
        self.ensure_row(row)?;
        Ok(Form::build(
            self.workbook.sheet(),
            row,
            &self.schema,
            self.force_edit,
            &self.config,
        ))
    }

    pub fn completion(&self, row: u32) -> Completion {
        completion::completion(self.workbook.sheet(), row, &self.schema, &self.config)
    }

    pub fn is_sufficiently_complete(&self, row: u32) -> SurveyResult<bool> {
        let entity = self.ensure_row(row)?;
        Ok(self
            .config
            .completion
            .is_sufficient(&entity.name, &self.completion(row)))
    }

    /// Write one answer and persist it. The caller decides when to re-render.
    pub fn apply_edit(
        &mut self,
        row: u32,
        column: u32,
        value: CellInput,
    ) -> SurveyResult<EditOutcome> {
        self.ensure_row(row)?;
        self.ensure_field(column)?;

        let date_format = self.config.auto_fill.date_format.clone();
        let sheet = self.workbook.sheet_mut();
        sheet.write_value(row, column, &value, &date_format);
        self.history.entry((row, column)).or_default().value = Some(value.clone());
        let exempted = self.is_user_exempted(row, column);

        let mut effects = vec![EditEffect::CellWritten { row, column }];
        if matches!(value, CellInput::Date(_)) {
            effects.push(EditEffect::DateFormatApplied {
                format: date_format,
            });
        }
        effects.push(self.persist(EditRecord {
            row,
            column,
            value: Some(value),
            exempted,
        }));

        Ok(EditOutcome {
            completion: self.completion(row),
            effects,
        })
    }

    fn is_user_exempted(&self, row: u32, column: u32) -> bool {
        let fill = self.workbook.sheet().fill(row, column);
        exemption_from_fill(fill.as_ref(), &self.config.keywords.user_exempt_pattern)
            == ExemptionReason::UserExempted
    }

    fn persist(&mut self, record: EditRecord) -> EditEffect {
        let key = record.key();
        match self.store.put_edit(&record) {
            Ok(()) => EditEffect::Persisted { key },
            Err(error) => {
                warn!(%error, key = %key, "edit not persisted");
                EditEffect::PersistFailed {
                    reason: error.to_string(),
                }
            }
        }
    }

    /// Flip the manual N/A marking of a field. Clearing it puts back the fill the cell had
    /// before; the cell's value is left alone.
    pub fn toggle_exemption(&mut self, row: u32, column: u32) -> SurveyResult<EditOutcome> {
        self.ensure_row(row)?;
        let field = self
            .schema
            .field(column)
            .ok_or(SurveyError::UnknownField { column })?;

        let sheet = self.workbook.sheet();
        let state = classify(
            field,
            sheet.fill(row, column).as_ref(),
            self.force_edit,
            &self.config,
        );
        let exempted = match state.exemption {
            ExemptionReason::SourceOptional => {
                return Err(SurveyError::NotToggleable { row, column });
            }
            ExemptionReason::UserExempted => false,
            ExemptionReason::None => true,
        };
        let field_type = field.field_type;

        if exempted {
            self.mark_exempt(row, column);
        } else {
            self.clear_exempt(row, column);
        }
        let exemption = if exempted {
            ExemptionReason::UserExempted
        } else {
            ExemptionReason::None
        };
        debug!(row, column, %field_type, ?exemption, "exemption toggled");

        let value = self
            .history
            .get(&(row, column))
            .and_then(|history| history.value.clone());

        let mut effects = vec![EditEffect::FillChanged { exemption }];
        effects.push(self.persist(EditRecord {
            row,
            column,
            value,
            exempted,
        }));
        Ok(EditOutcome {
            completion: self.completion(row),
            effects,
        })
    }

    /// Default answers for a row as of `today`, without applying them.
    pub fn plan_auto_fill(&self, row: u32, today: NaiveDate) -> SurveyResult<Vec<PlannedFill>> {
        self.ensure_row(row)?;
        Ok(autofill::plan(
            self.workbook.sheet(),
            row,
            &self.schema,
            &self.config,
            today,
        ))
    }

    /// Fill empty, non-exempt fields with their defaults. Returns how many were written.
    pub fn auto_fill(&mut self, row: u32) -> SurveyResult<usize> {
        self.auto_fill_on(row, Local::now().date_naive())
    }

    pub fn auto_fill_on(&mut self, row: u32, today: NaiveDate) -> SurveyResult<usize> {
        let planned = self.plan_auto_fill(row, today)?;
        for fill in &planned {
            self.apply_edit(row, fill.column, fill.value.clone())?;
        }
        info!(row, edits = planned.len(), "defaults filled");
        Ok(planned.len())
    }

    /// Index into the row's ordered inputs of the next unanswered required input.
    pub fn next_incomplete(&self, row: u32, cursor: Option<usize>) -> SurveyResult<Option<usize>> {
        let inputs = self.form(row)?.ordered_inputs();
        Ok(find_next(&inputs, cursor))
    }

    pub fn export(&self) -> SurveyResult<ExportArtifact> {
        let bytes = self.workbook.to_bytes().inspect_err(|error| {
            warn!(%error, "export failed");
        })?;
        info!(bytes = bytes.len(), "workbook exported");
        Ok(ExportArtifact {
            file_name: self.config.export.file_name.clone(),
            mime_type: self.config.export.mime_type.clone(),
            bytes,
        })
    }

    /// Forget the stored session. The in-memory workbook stays usable.
    pub fn discard(&mut self) -> SurveyResult<()> {
        self.store.clear()?;
        info!(file = %self.file_name, "stored session discarded");
        Ok(())
    }
}

/// A session shared across threads, guarded by a single lock per document.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<SurveySession>>,
}

impl SharedSession {
    pub fn new(session: SurveySession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn with<T>(&self, func: impl FnOnce(&mut SurveySession) -> T) -> T {
        let mut guard = self.inner.lock();
        func(&mut guard)
    }
}
