mod support;

use support::{BLANK_ROW, FIRST_ROW, HALL_ROW, LAST_ROW, col};
use survey_matrix::classify::{ReadOnlyRule, classify};
use survey_matrix::config::SurveyConfig;
use survey_matrix::model::{ExemptionReason, FieldType};
use survey_matrix::schema::{HeaderRows, extract_schema, index_rows};
use survey_matrix::workbook::{SheetModel, SurveyWorkbook};

fn workbook() -> SurveyWorkbook {
    SurveyWorkbook::from_bytes(support::FILE_NAME, &support::survey_bytes()).expect("decode")
}

#[test]
fn schema_comes_from_the_three_header_rows() {
    let workbook = workbook();
    let config = SurveyConfig::default();
    let headers = HeaderRows::read(workbook.sheet(), &config.layout);
    let schema = extract_schema(&headers, &config);

    assert_eq!(schema.identity_column, col::AUDITORIUM);
    assert_eq!(schema.fields.len(), 11);

    let types: Vec<FieldType> = schema.fields.iter().map(|f| f.field_type).collect();
    assert_eq!(
        types,
        vec![
            FieldType::Text,
            FieldType::Text,
            FieldType::Number,
            FieldType::Number,
            FieldType::Date,
            FieldType::YesNo,
            FieldType::YesNo,
            FieldType::YesNo,
            FieldType::Gmf,
            FieldType::Text,
            FieldType::TrueFalse,
        ]
    );

    // empty category cell inherits the one to its left
    let humidity = schema.field(col::HUMIDITY).expect("humidity field");
    assert_eq!(humidity.category, "Etat");
    assert_eq!(humidity.question, "Humidité");
}

#[test]
fn entities_are_rows_with_a_name() {
    let workbook = workbook();
    let rows = index_rows(workbook.sheet(), 6, col::AUDITORIUM);
    let positions: Vec<u32> = rows.iter().map(|r| r.row).collect();
    assert_eq!(positions, vec![FIRST_ROW, HALL_ROW, LAST_ROW]);
    assert!(!positions.contains(&BLANK_ROW));
    assert_eq!(rows[1].name, "Hall principal");
}

#[test]
fn numbers_and_fills_survive_the_codec() {
    let workbook = workbook();
    let sheet = workbook.sheet();
    assert_eq!(sheet.display_value(FIRST_ROW, col::ANNOUNCED), "120");
    assert_eq!(sheet.display_value(FIRST_ROW, col::REAL), "");

    let config = SurveyConfig::default();
    let headers = HeaderRows::read(sheet, &config.layout);
    let schema = extract_schema(&headers, &config);
    let remarks = schema.field(col::REMARKS).expect("remarks");

    let hatched = classify(remarks, sheet.fill(HALL_ROW, col::REMARKS).as_ref(), false, &config);
    assert_eq!(hatched.exemption, ExemptionReason::SourceOptional);
    let plain = classify(remarks, sheet.fill(FIRST_ROW, col::REMARKS).as_ref(), false, &config);
    assert_eq!(plain.exemption, ExemptionReason::None);
}

#[test]
fn structural_columns_are_read_only() {
    let workbook = workbook();
    let config = SurveyConfig::default();
    let schema = extract_schema(&HeaderRows::read(workbook.sheet(), &config.layout), &config);
    let rule = |column: u32, force: bool| {
        let field = schema.field(column).expect("field");
        classify(field, None, force, &config).read_only
    };

    assert_eq!(rule(col::BUILDING, false), Some(ReadOnlyRule::Building));
    assert_eq!(rule(col::AUDITORIUM, false), Some(ReadOnlyRule::Auditorium));
    assert_eq!(rule(col::ANNOUNCED, false), Some(ReadOnlyRule::AnnouncedCapacity));
    assert_eq!(rule(col::SEATING, false), Some(ReadOnlyRule::TieredChoice));
    assert_eq!(rule(col::REAL, false), None);
    assert_eq!(rule(col::ANNOUNCED, true), None);
}

#[test]
fn garbage_bytes_are_rejected() {
    let err = SurveyWorkbook::from_bytes("notes.txt", b"not a workbook").err();
    assert!(matches!(
        err,
        Some(survey_matrix::SurveyError::UnrecognizedFile { ref name, .. }) if name == "notes.txt"
    ));
}
