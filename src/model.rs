use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    TrueFalse,
    YesNo,
    Date,
    Number,
    Gmf,
    Text,
}

/// One option of an exclusive-choice field: the code written to the cell and its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub code: &'static str,
    pub label: &'static str,
}

const TRUE_FALSE_CHOICES: &[Choice] = &[
    Choice { code: "v", label: "Vrai" },
    Choice { code: "f", label: "Faux" },
];
const YES_NO_CHOICES: &[Choice] = &[
    Choice { code: "o", label: "Oui" },
    Choice { code: "n", label: "Non" },
];
const GMF_CHOICES: &[Choice] = &[
    Choice { code: "G", label: "Gradin" },
    Choice { code: "M", label: "Mobile" },
    Choice { code: "F", label: "Fixe" },
];

impl FieldType {
    /// Options of a choice field; empty for free-value types.
    pub fn choices(self) -> &'static [Choice] {
        match self {
            FieldType::TrueFalse => TRUE_FALSE_CHOICES,
            FieldType::YesNo => YES_NO_CHOICES,
            FieldType::Gmf => GMF_CHOICES,
            FieldType::Date | FieldType::Number | FieldType::Text => &[],
        }
    }

    pub fn is_choice(self) -> bool {
        !self.choices().is_empty()
    }

    pub fn positive_choice(self) -> Option<&'static str> {
        self.choices().first().map(|c| c.code)
    }

    pub fn negative_choice(self) -> Option<&'static str> {
        match self {
            FieldType::TrueFalse | FieldType::YesNo => self.choices().get(1).map(|c| c.code),
            _ => None,
        }
    }
}

/// Schema entry bound to one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub column: u32,
    pub category: String,
    pub question: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn category_norm(&self) -> String {
        self.category.trim().to_lowercase()
    }

    pub fn question_norm(&self) -> String {
        self.question.trim().to_lowercase()
    }
}

/// One surveyed entity in the data block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRow {
    pub row: u32,
    pub name: String,
}

/// A value written into a cell by an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellInput {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl CellInput {
    pub fn text(value: impl Into<String>) -> Self {
        CellInput::Text(value.into())
    }

    /// Interpret raw user input for a field of the given type.
    pub fn parse_for(field_type: FieldType, raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellInput::Empty;
        }
        match field_type {
            FieldType::Number => trimmed
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .map(CellInput::Number)
                .unwrap_or_else(|| CellInput::text(raw)),
            FieldType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
                .map(CellInput::Date)
                .unwrap_or_else(|_| CellInput::text(raw)),
            _ => CellInput::text(raw),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellInput::Empty => true,
            CellInput::Text(text) => text.trim().is_empty(),
            CellInput::Number(_) | CellInput::Date(_) => false,
        }
    }
}

/// Persisted edit, replayed onto a freshly loaded workbook on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRecord {
    pub row: u32,
    pub column: u32,
    /// `None` when only the N/A marking changed; the workbook's own value stands.
    #[serde(default)]
    pub value: Option<CellInput>,
    #[serde(default)]
    pub exempted: bool,
}

impl EditRecord {
    pub fn key(&self) -> String {
        edit_key(self.row, self.column)
    }
}

pub fn edit_key(row: u32, column: u32) -> String {
    format!("{row}-{column}")
}

/// Why a field is left out of completion accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExemptionReason {
    #[default]
    None,
    /// The source file marks the cell facultative with a hatch pattern.
    SourceOptional,
    /// The user marked the field N/A.
    UserExempted,
}

/// Pattern fill as stored in the workbook style. `pattern_type` is `None` for no fill.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatternFillDescriptor {
    pub pattern_type: Option<String>,
    pub foreground_color: Option<String>,
    pub background_color: Option<String>,
}

impl PatternFillDescriptor {
    pub fn pattern(pattern_type: impl Into<String>) -> Self {
        Self {
            pattern_type: Some(pattern_type.into()),
            ..Self::default()
        }
    }
}

/// Filled versus countable fields of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Completion {
    pub filled: usize,
    pub total: usize,
}

impl Completion {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.filled as f64 / self.total as f64
        }
    }

    pub fn rounded(&self) -> u32 {
        self.percent().round() as u32
    }
}
