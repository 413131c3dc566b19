//! Field schema extraction from the three header rows, and entity indexing.

use crate::config::{MatrixLayout, SurveyConfig};
use crate::model::{DataRow, Field, FieldType};
use crate::workbook::SheetModel;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

/// Normalized text of the category, question and type rows, one entry per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderRows {
    pub categories: Vec<String>,
    pub questions: Vec<String>,
    pub types: Vec<String>,
}

impl HeaderRows {
    pub fn read<S: SheetModel + ?Sized>(sheet: &S, layout: &MatrixLayout) -> Self {
        let columns = sheet.column_count();
        let row = |position: u32| -> Vec<String> {
            (1..=columns)
                .map(|column| sheet.display_value(position, column))
                .collect()
        };
        Self {
            categories: row(layout.category_row),
            questions: row(layout.question_row),
            types: row(layout.type_row),
        }
    }

    pub fn column_count(&self) -> usize {
        self.categories
            .len()
            .max(self.questions.len())
            .max(self.types.len())
    }

    fn cell(values: &[String], index: usize) -> &str {
        values.get(index).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub fields: Vec<Field>,
    pub identity_column: u32,
}

impl Schema {
    pub fn field(&self, column: u32) -> Option<&Field> {
        self.fields.iter().find(|field| field.column == column)
    }

    /// Fields grouped by category, groups in order of first appearance.
    pub fn categories(&self) -> IndexMap<&str, Vec<&Field>> {
        let mut groups: IndexMap<&str, Vec<&Field>> = IndexMap::new();
        for field in &self.fields {
            groups.entry(field.category.as_str()).or_default().push(field);
        }
        groups
    }
}

pub fn extract_schema(headers: &HeaderRows, config: &SurveyConfig) -> Schema {
    let mut fields = Vec::new();
    let mut identity_column = None;
    let mut last_category = String::new();
    let gmf_keyword = config.keywords.gmf_header.as_str();

    for index in 0..headers.column_count() {
        let column = index as u32 + 1;
        let category = HeaderRows::cell(&headers.categories, index);
        let question = HeaderRows::cell(&headers.questions, index);
        let type_raw = HeaderRows::cell(&headers.types, index);

        if !category.is_empty() {
            last_category = category.to_string();
            let lowered = category.to_lowercase();
            if identity_column.is_none()
                && config
                    .keywords
                    .identity
                    .iter()
                    .any(|keyword| lowered.contains(keyword.as_str()))
            {
                identity_column = Some(column);
            }
        }

        let mut field_type = config.types.resolve(&type_raw.trim().to_lowercase());
        if !gmf_keyword.is_empty()
            && (category.contains(gmf_keyword) || question.contains(gmf_keyword))
        {
            field_type = Some(FieldType::Gmf);
        }

        if question.is_empty() && field_type.is_none() {
            continue;
        }

        fields.push(Field {
            column,
            category: last_category.clone(),
            question: question.to_string(),
            field_type: field_type.unwrap_or(FieldType::Text),
        });
    }

    let identity_column = identity_column.unwrap_or(config.layout.identity_fallback_column);
    debug!(
        fields = fields.len(),
        identity_column, "schema extracted from header rows"
    );

    Schema {
        fields,
        identity_column,
    }
}

/// Entities of the data block, in row order.
pub fn index_rows<S: SheetModel + ?Sized>(
    sheet: &S,
    data_start_row: u32,
    identity_column: u32,
) -> Vec<DataRow> {
    (data_start_row.max(1)..=sheet.row_count())
        .filter_map(|row| {
            let name = sheet.display_value(row, identity_column);
            (!name.is_empty()).then_some(DataRow { row, name })
        })
        .collect()
}
