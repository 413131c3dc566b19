use crate::cell::{self, RawCellValue, date_to_serial};
use crate::error::{SurveyError, SurveyResult};
use crate::model::{CellInput, PatternFillDescriptor};
use crate::styles;
use std::io::Cursor;
use tracing::{debug, warn};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// Cell access needed by the survey core. Positions are 1-based.
pub trait SheetModel {
    fn raw_value(&self, row: u32, column: u32) -> RawCellValue;

    fn fill(&self, row: u32, column: u32) -> Option<PatternFillDescriptor>;

    /// Write a value; dates are stored as serial numbers displayed with `date_format`.
    fn write_value(&mut self, row: u32, column: u32, value: &CellInput, date_format: &str);

    /// Replace the pattern fill. `None` clears it.
    fn write_fill(&mut self, row: u32, column: u32, fill: Option<&PatternFillDescriptor>);

    fn column_count(&self) -> u32;

    fn row_count(&self) -> u32;

    fn display_value(&self, row: u32, column: u32) -> String {
        cell::normalize(&self.raw_value(row, column))
    }
}

impl SheetModel for Worksheet {
    fn raw_value(&self, row: u32, column: u32) -> RawCellValue {
        self.get_cell((column, row))
            .map(cell::raw_value)
            .unwrap_or_default()
    }

    fn fill(&self, row: u32, column: u32) -> Option<PatternFillDescriptor> {
        self.get_cell((column, row))
            .and_then(|cell| styles::pattern_fill_of(cell.get_style()))
    }

    fn write_value(&mut self, row: u32, column: u32, value: &CellInput, date_format: &str) {
        let cell = self.get_cell_mut((column, row));
        match value {
            CellInput::Empty => {
                cell.set_value_string(String::new());
            }
            CellInput::Text(text) => {
                cell.set_value_string(text.clone());
            }
            CellInput::Number(number) => {
                cell.set_value_number(*number);
            }
            CellInput::Date(date) => {
                cell.set_value_number(date_to_serial(*date));
                self.get_style_mut((column, row))
                    .get_number_format_mut()
                    .set_format_code(date_format);
            }
        }
    }

    fn write_fill(&mut self, row: u32, column: u32, fill: Option<&PatternFillDescriptor>) {
        styles::apply_pattern_fill(self.get_style_mut((column, row)), fill);
    }

    fn column_count(&self) -> u32 {
        self.get_highest_column_and_row().0
    }

    fn row_count(&self) -> u32 {
        self.get_highest_column_and_row().1
    }
}

/// A decoded workbook whose first worksheet holds the survey matrix.
pub struct SurveyWorkbook {
    book: Spreadsheet,
}

impl SurveyWorkbook {
    pub fn from_bytes(name: &str, bytes: &[u8]) -> SurveyResult<Self> {
        let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true)
            .map_err(|e| {
                warn!(file = name, error = %e, "workbook decode failed");
                SurveyError::unrecognized(name, e)
            })?;
        if book.get_sheet(&0).is_none() {
            return Err(SurveyError::unrecognized(name, "workbook has no worksheet"));
        }
        debug!(file = name, bytes = bytes.len(), "workbook decoded");
        Ok(Self { book })
    }

    pub fn to_bytes(&self) -> SurveyResult<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&self.book, &mut buffer).map_err(|e| {
            SurveyError::ExportFailed {
                reason: e.to_string(),
            }
        })?;
        Ok(buffer.into_inner())
    }

    pub fn sheet(&self) -> &Worksheet {
        // presence of sheet 0 is checked in from_bytes
        &self.book.get_sheet_collection()[0]
    }

    pub fn sheet_mut(&mut self) -> &mut Worksheet {
        &mut self.book.get_sheet_collection_mut()[0]
    }

    pub fn sheet_name(&self) -> &str {
        self.sheet().get_name()
    }
}
