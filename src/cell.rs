//! Plain display values out of heterogeneous workbook cells.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use umya_spreadsheet::{Cell, CellRawValue};

/// Cell content as the workbook codec hands it over.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawCellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    /// Rich text, one entry per run.
    RichText(Vec<String>),
    Hyperlink {
        text: String,
        target: String,
    },
    Formula {
        formula: String,
        result: Option<Box<RawCellValue>>,
    },
    Error(String),
}

/// Extract the display string of a raw cell. Never fails.
pub fn normalize(value: &RawCellValue) -> String {
    match value {
        RawCellValue::Empty => String::new(),
        RawCellValue::RichText(runs) => runs.concat(),
        RawCellValue::Hyperlink { text, .. } => text.clone(),
        RawCellValue::Formula { result, .. } => {
            result.as_deref().map(normalize).unwrap_or_default()
        }
        RawCellValue::Text(text) => text.clone(),
        RawCellValue::Number(number) => number.to_string(),
        RawCellValue::Bool(flag) => flag.to_string(),
        RawCellValue::Date(date) => format_date_time(date),
        RawCellValue::Error(code) => code.clone(),
    }
}

fn format_date_time(date: &NaiveDateTime) -> String {
    if date.time() == NaiveTime::MIN {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

/// Excel serial day number (1900 system) to a timestamp.
pub fn serial_to_date_time(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    excel_epoch().checked_add_signed(Duration::milliseconds(millis))
}

pub fn date_to_serial(date: NaiveDate) -> f64 {
    (date.and_time(NaiveTime::MIN) - excel_epoch()).num_days() as f64
}

/// Whether a number format code renders a date.
pub fn is_date_format(code: &str) -> bool {
    let mut plain = String::with_capacity(code.len());
    let mut in_quotes = false;
    let mut in_brackets = false;
    for ch in code.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            _ if in_quotes || in_brackets => {}
            _ => plain.push(ch.to_ascii_lowercase()),
        }
    }
    if plain == "general" {
        return false;
    }
    plain.contains('y') || plain.contains('d')
}

/// Read a workbook cell into its raw shape.
pub fn raw_value(cell: &Cell) -> RawCellValue {
    let scalar = scalar_value(cell);
    if cell.is_formula() {
        let result = match scalar {
            RawCellValue::Empty => None,
            other => Some(Box::new(other)),
        };
        return RawCellValue::Formula {
            formula: cell.get_formula().to_string(),
            result,
        };
    }
    if let Some(link) = cell.get_hyperlink() {
        return RawCellValue::Hyperlink {
            text: normalize(&scalar),
            target: link.get_url().to_string(),
        };
    }
    scalar
}

fn scalar_value(cell: &Cell) -> RawCellValue {
    match cell.get_cell_value().get_raw_value() {
        CellRawValue::Empty => RawCellValue::Empty,
        CellRawValue::String(text) => RawCellValue::Text(text.to_string()),
        CellRawValue::RichText(rich) => RawCellValue::RichText(
            rich.get_rich_text_elements()
                .iter()
                .map(|run| run.get_text().to_string())
                .collect(),
        ),
        CellRawValue::Numeric(number) => {
            let dated = cell
                .get_style()
                .get_number_format()
                .map(|fmt| is_date_format(fmt.get_format_code()))
                .unwrap_or(false);
            match dated.then(|| serial_to_date_time(*number)).flatten() {
                Some(date) => RawCellValue::Date(date),
                None => RawCellValue::Number(*number),
            }
        }
        CellRawValue::Bool(flag) => RawCellValue::Bool(*flag),
        _ => {
            let shown = cell.get_value();
            if shown.starts_with('#') {
                RawCellValue::Error(shown.to_string())
            } else if shown.is_empty() {
                RawCellValue::Empty
            } else {
                RawCellValue::Text(shown.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_each_shape() {
        assert_eq!(normalize(&RawCellValue::Empty), "");
        assert_eq!(
            normalize(&RawCellValue::RichText(vec!["Audi".into(), "toire A".into()])),
            "Auditoire A"
        );
        assert_eq!(
            normalize(&RawCellValue::Hyperlink {
                text: "plan".into(),
                target: "https://example.org".into()
            }),
            "plan"
        );
        assert_eq!(
            normalize(&RawCellValue::Formula {
                formula: "B2*2".into(),
                result: Some(Box::new(RawCellValue::Number(120.0)))
            }),
            "120"
        );
        assert_eq!(normalize(&RawCellValue::Number(12.5)), "12.5");
        assert_eq!(normalize(&RawCellValue::Bool(true)), "true");
    }

    #[test]
    fn formula_without_cached_result_is_empty() {
        let raw = RawCellValue::Formula {
            formula: "SUM(A1:A3)".into(),
            result: None,
        };
        assert_eq!(normalize(&raw), "");
    }

    #[test]
    fn serial_dates_round_trip_through_the_epoch() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let serial = date_to_serial(date);
        assert_eq!(serial, 45352.0);
        let back = serial_to_date_time(serial).unwrap();
        assert_eq!(normalize(&RawCellValue::Date(back)), "2024-03-01");
    }

    #[test]
    fn detects_date_formats() {
        assert!(is_date_format("dd/mm/yyyy"));
        assert!(is_date_format("[$-40C]d mmmm yyyy"));
        assert!(!is_date_format("0.00"));
        assert!(!is_date_format("General"));
        assert!(!is_date_format("\"day\" 0"));
    }
}
