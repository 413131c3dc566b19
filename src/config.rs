use crate::error::{SurveyError, SurveyResult};
use crate::model::FieldType;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_EXPORT_FILE_NAME: &str = "Releve_TAVL_Completed.xlsx";
pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Static lookup tables describing the survey matrix convention.
///
/// Every table has a default matching the auditorium survey workbook, so a config file only
/// needs to name what differs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurveyConfig {
    pub layout: MatrixLayout,
    pub keywords: KeywordTables,
    pub auto_fill: AutoFillTables,
    pub types: TypeTokens,
    pub badges: BadgeTexts,
    pub completion: CompletionPolicy,
    pub export: ExportSettings,
}

/// 1-based row positions of the header block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MatrixLayout {
    pub category_row: u32,
    pub question_row: u32,
    pub type_row: u32,
    pub data_start_row: u32,
    pub identity_fallback_column: u32,
}

impl Default for MatrixLayout {
    fn default() -> Self {
        Self {
            category_row: 3,
            question_row: 4,
            type_row: 5,
            data_start_row: 6,
            identity_fallback_column: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeywordTables {
    /// Category substrings naming the entity column (lowercase).
    pub identity: Vec<String>,
    /// Exact labels of the building column (lowercase).
    pub building_labels: Vec<String>,
    /// Exact labels of the auditorium column (lowercase).
    pub auditorium_labels: Vec<String>,
    /// Substring marking the announced-capacity column (lowercase).
    pub announced_capacity: String,
    pub tiered: String,
    pub movable: String,
    /// Header keyword forcing the three-way seating selector. Matched case-sensitively.
    pub gmf_header: String,
    /// Pattern fill written when a user marks a field N/A.
    pub user_exempt_pattern: String,
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            identity: vec!["auditoires".to_string()],
            building_labels: vec!["bâtiments".to_string(), "batiments".to_string()],
            auditorium_labels: vec!["auditoires".to_string()],
            announced_capacity: "capacité annoncée".to_string(),
            tiered: "gradin".to_string(),
            movable: "mobile".to_string(),
            gmf_header: "Gradin".to_string(),
            user_exempt_pattern: "darkGray".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AutoFillTables {
    pub capacity_source: String,
    pub real_capacity_category: String,
    pub capacity_targets: Vec<String>,
    pub date_target: String,
    pub negative_keywords: Vec<String>,
    pub date_format: String,
}

impl Default for AutoFillTables {
    fn default() -> Self {
        Self {
            capacity_source: "capacité annoncée".to_string(),
            real_capacity_category: "capacité réelle".to_string(),
            capacity_targets: vec![
                "capacité réelle".to_string(),
                "réellement fonctionnelles".to_string(),
            ],
            date_target: "date de passage".to_string(),
            negative_keywords: vec!["humidit".to_string(), "infiltration".to_string()],
            date_format: "dd/mm/yyyy".to_string(),
        }
    }
}

/// Row-3 tokens and their canonical field types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TypeTokens {
    pub true_false: String,
    pub yes_no: String,
    pub date: String,
    pub number: String,
    pub gmf: String,
    /// Substrings that turn any type cell into a date (e.g. "../../....").
    pub date_markers: Vec<String>,
}

impl Default for TypeTokens {
    fn default() -> Self {
        Self {
            true_false: "v/f".to_string(),
            yes_no: "o/n".to_string(),
            date: "date".to_string(),
            number: "nombre".to_string(),
            gmf: "gmf".to_string(),
            date_markers: vec!["..".to_string(), "…".to_string()],
        }
    }
}

impl TypeTokens {
    /// Resolve a normalized (lowercased, trimmed) type cell. Empty input resolves to nothing,
    /// unknown tokens fall back to free text.
    pub fn resolve(&self, normalized: &str) -> Option<FieldType> {
        if normalized.is_empty() {
            return None;
        }
        if normalized.contains(self.date.as_str())
            || self
                .date_markers
                .iter()
                .any(|marker| normalized.contains(marker.as_str()))
        {
            return Some(FieldType::Date);
        }
        let resolved = if normalized == self.true_false {
            FieldType::TrueFalse
        } else if normalized == self.yes_no {
            FieldType::YesNo
        } else if normalized == self.number {
            FieldType::Number
        } else if normalized == self.gmf {
            FieldType::Gmf
        } else {
            FieldType::Text
        };
        Some(resolved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BadgeTexts {
    pub optional: String,
    pub user_exempt: String,
    pub manual_test: String,
    pub manual_test_markers: Vec<String>,
    pub default_category: String,
}

impl Default for BadgeTexts {
    fn default() -> Self {
        Self {
            optional: "Facultatif".to_string(),
            user_exempt: "N/A".to_string(),
            manual_test: "Test manuel requis".to_string(),
            manual_test_markers: vec!["(testé)".to_string(), "(testée)".to_string()],
            default_category: "Général".to_string(),
        }
    }
}

/// Per-entity bar for the "sufficiently complete" indicator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionPolicy {
    pub default_threshold: f64,
    pub hall_keyword: String,
    pub hall_threshold: f64,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self {
            default_threshold: 100.0,
            hall_keyword: "hall".to_string(),
            hall_threshold: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportSettings {
    pub file_name: String,
    pub mime_type: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            mime_type: XLSX_MIME_TYPE.to_string(),
        }
    }
}

impl SurveyConfig {
    /// Load from an optional file, defaults otherwise.
    pub fn from_path(path: Option<&Path>) -> SurveyResult<Self> {
        match path {
            Some(path) => load_config_file(path),
            None => Ok(Self::default()),
        }
    }
}

pub fn load_config_file(path: &Path) -> SurveyResult<SurveyConfig> {
    let config_error = |reason: String| SurveyError::Config {
        path: path.to_path_buf(),
        reason,
    };
    if !path.exists() {
        return Err(config_error("file does not exist".to_string()));
    }
    let contents = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .map_err(|e| config_error(format!("failed to parse YAML: {e}"))),
        "json" => serde_json::from_str(&contents)
            .map_err(|e| config_error(format!("failed to parse JSON: {e}"))),
        other => Err(config_error(format!("unsupported config extension: {other}"))),
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "survey-matrix",
    about = "Fill header-matrix survey workbooks row by row",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        env = "SURVEY_MATRIX_CONFIG",
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "SURVEY_MATRIX_STORE_DIR",
        value_name = "DIR",
        help = "Directory holding the saved session (file and edits)",
        global = true
    )]
    pub store_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "SURVEY_MATRIX_FORCE_EDIT",
        help = "Unlock structural read-only fields",
        global = true
    )]
    pub force_edit: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the extracted field schema.
    Schema { file: PathBuf },
    /// List entities with their completion.
    Rows { file: PathBuf },
    /// Print the form projected for one entity.
    Form {
        file: PathBuf,
        #[arg(long)]
        row: String,
    },
    /// Write one answer.
    Set {
        file: PathBuf,
        #[arg(long)]
        row: String,
        #[arg(long)]
        column: u32,
        #[arg(long)]
        value: String,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Toggle the N/A marking of one field.
    Exempt {
        file: PathBuf,
        #[arg(long)]
        row: String,
        #[arg(long)]
        column: u32,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Fill empty fields of one entity with their default answers.
    FillDefaults {
        file: PathBuf,
        #[arg(long)]
        row: String,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Locate the next unanswered required input.
    Next {
        file: PathBuf,
        #[arg(long)]
        row: String,
        #[arg(long, value_name = "INDEX")]
        after: Option<usize>,
    },
    /// Rebuild the saved session and export it.
    Restore {
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Forget the saved session.
    Discard,
}
