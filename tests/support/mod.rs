#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;

use survey_matrix::cell::RawCellValue;
use survey_matrix::model::{CellInput, PatternFillDescriptor};
use survey_matrix::workbook::SheetModel;
use umya_spreadsheet::{PatternValues, Spreadsheet, Worksheet};

pub const FILE_NAME: &str = "releve.xlsx";

/// Columns of the fixture survey.
pub mod col {
    pub const BUILDING: u32 = 1;
    pub const AUDITORIUM: u32 = 2;
    pub const ANNOUNCED: u32 = 3;
    pub const REAL: u32 = 4;
    pub const VISIT: u32 = 5;
    pub const INFILTRATION: u32 = 6;
    pub const HUMIDITY: u32 = 7;
    pub const EXTINGUISHER: u32 = 8;
    pub const SEATING: u32 = 9;
    pub const REMARKS: u32 = 10;
    pub const LIGHTING: u32 = 11;
}

const CATEGORIES: [&str; 11] = [
    "Bâtiments",
    "Auditoires",
    "Capacité annoncée",
    "Capacité réelle",
    "Visite",
    "Etat",
    "",
    "Sécurité",
    "Sièges Gradin",
    "Remarques",
    "Eclairage",
];

const QUESTIONS: [&str; 11] = [
    "",
    "",
    "Places",
    "Places fonctionnelles",
    "Date de passage",
    "Infiltration",
    "Humidité",
    "Extincteur (testé)",
    "Type de sièges",
    "Commentaire",
    "Eclairage fonctionnel",
];

const TYPES: [&str; 11] = [
    "text",
    "text",
    "nombre",
    "nombre",
    "../../....",
    "o/n",
    "o/n",
    "o/n",
    "",
    "text",
    "v/f",
];

pub const FIRST_ROW: u32 = 6;
pub const HALL_ROW: u32 = 7;
pub const BLANK_ROW: u32 = 8;
pub const LAST_ROW: u32 = 9;

/// Auditorium survey: title rows, the three header rows, then the data block from row 6.
///
/// Row 7 has its remark cell hatched (facultative) and its infiltration already answered.
/// Row 8 has no auditorium name and is not an entity.
pub fn survey_book() -> Spreadsheet {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_mut(&0).unwrap();
    sheet.get_cell_mut((1, 1)).set_value("Relevé des auditoires");

    for (index, ((category, question), kind)) in CATEGORIES
        .iter()
        .zip(QUESTIONS.iter())
        .zip(TYPES.iter())
        .enumerate()
    {
        let column = index as u32 + 1;
        if !category.is_empty() {
            sheet.get_cell_mut((column, 3)).set_value(*category);
        }
        if !question.is_empty() {
            sheet.get_cell_mut((column, 4)).set_value(*question);
        }
        if !kind.is_empty() {
            sheet.get_cell_mut((column, 5)).set_value(*kind);
        }
    }

    sheet.get_cell_mut((col::BUILDING, FIRST_ROW)).set_value("Bât. A");
    sheet
        .get_cell_mut((col::AUDITORIUM, FIRST_ROW))
        .set_value("Auditoire 101");
    sheet
        .get_cell_mut((col::ANNOUNCED, FIRST_ROW))
        .set_value_number(120);

    sheet.get_cell_mut((col::BUILDING, HALL_ROW)).set_value("Bât. A");
    sheet
        .get_cell_mut((col::AUDITORIUM, HALL_ROW))
        .set_value("Hall principal");
    sheet
        .get_cell_mut((col::ANNOUNCED, HALL_ROW))
        .set_value_number(300);
    sheet
        .get_cell_mut((col::INFILTRATION, HALL_ROW))
        .set_value("o");
    hatch(sheet, col::REMARKS, HALL_ROW, PatternValues::LightUp);

    sheet.get_cell_mut((col::BUILDING, BLANK_ROW)).set_value("Bât. B");

    sheet.get_cell_mut((col::BUILDING, LAST_ROW)).set_value("Bât. B");
    sheet
        .get_cell_mut((col::AUDITORIUM, LAST_ROW))
        .set_value("Auditoire 102");

    book
}

pub fn hatch(sheet: &mut Worksheet, column: u32, row: u32, pattern: PatternValues) {
    sheet
        .get_style_mut((column, row))
        .get_fill_mut()
        .get_pattern_fill_mut()
        .set_pattern_type(pattern);
}

/// Solid background, as surveyors use to highlight a cell.
pub fn paint(sheet: &mut Worksheet, column: u32, row: u32, argb: &str) {
    let fill = sheet
        .get_style_mut((column, row))
        .get_fill_mut()
        .get_pattern_fill_mut();
    fill.set_pattern_type(PatternValues::Solid);
    fill.get_foreground_color_mut().set_argb(argb);
}

pub fn to_bytes(book: &Spreadsheet) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(book, &mut buffer).expect("write workbook");
    buffer.into_inner()
}

pub fn survey_bytes() -> Vec<u8> {
    to_bytes(&survey_book())
}

/// Sheet held in memory, for exercising the survey core without a workbook.
#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    values: HashMap<(u32, u32), String>,
    fills: HashMap<(u32, u32), PatternFillDescriptor>,
    columns: u32,
    rows: u32,
}

impl MemorySheet {
    pub fn set(&mut self, row: u32, column: u32, value: &str) {
        self.columns = self.columns.max(column);
        self.rows = self.rows.max(row);
        self.values.insert((row, column), value.to_string());
    }

    pub fn set_pattern(&mut self, row: u32, column: u32, pattern: &str) {
        self.fills
            .insert((row, column), PatternFillDescriptor::pattern(pattern));
    }
}

impl SheetModel for MemorySheet {
    fn raw_value(&self, row: u32, column: u32) -> RawCellValue {
        self.values
            .get(&(row, column))
            .map(|text| RawCellValue::Text(text.clone()))
            .unwrap_or_default()
    }

    fn fill(&self, row: u32, column: u32) -> Option<PatternFillDescriptor> {
        self.fills.get(&(row, column)).cloned()
    }

    fn write_value(&mut self, row: u32, column: u32, value: &CellInput, _date_format: &str) {
        let text = match value {
            CellInput::Empty => String::new(),
            CellInput::Text(text) => text.clone(),
            CellInput::Number(number) => number.to_string(),
            CellInput::Date(date) => date.format("%Y-%m-%d").to_string(),
        };
        self.set(row, column, &text);
    }

    fn write_fill(&mut self, row: u32, column: u32, fill: Option<&PatternFillDescriptor>) {
        match fill {
            Some(fill) => {
                self.fills.insert((row, column), fill.clone());
            }
            None => {
                self.fills.remove(&(row, column));
            }
        }
    }

    fn column_count(&self) -> u32 {
        self.columns
    }

    fn row_count(&self) -> u32 {
        self.rows
    }
}
