//! Default answers for empty fields of one entity.

use crate::classify::classify;
use crate::config::SurveyConfig;
use crate::model::{CellInput, Field, FieldType};
use crate::schema::Schema;
use crate::workbook::SheetModel;
use chrono::NaiveDate;
use serde::Serialize;

/// Default-value rules in priority order. The first rule matching a field decides it, even
/// when that rule then has no value to offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoFillRule {
    /// Real capacity copies the announced capacity.
    RealCapacity,
    /// Dates and the visit date get today.
    VisitDate,
    /// Yes/no defaults to yes, or no for damage questions (humidity, infiltration).
    YesNoDefault,
    /// True/false defaults to true.
    TrueFalseDefault,
}

pub const AUTO_FILL_RULES: [AutoFillRule; 4] = [
    AutoFillRule::RealCapacity,
    AutoFillRule::VisitDate,
    AutoFillRule::YesNoDefault,
    AutoFillRule::TrueFalseDefault,
];

struct FillContext<'a> {
    announced_capacity: &'a str,
    today: NaiveDate,
}

impl AutoFillRule {
    fn matches(self, field: &Field, category: &str, question: &str, config: &SurveyConfig) -> bool {
        let tables = &config.auto_fill;
        match self {
            AutoFillRule::RealCapacity => {
                (!tables.real_capacity_category.is_empty()
                    && category.contains(tables.real_capacity_category.as_str()))
                    || tables
                        .capacity_targets
                        .iter()
                        .any(|target| question.contains(target.as_str()))
            }
            AutoFillRule::VisitDate => {
                field.field_type == FieldType::Date
                    || (!tables.date_target.is_empty()
                        && question.contains(tables.date_target.as_str()))
            }
            AutoFillRule::YesNoDefault => field.field_type == FieldType::YesNo,
            AutoFillRule::TrueFalseDefault => field.field_type == FieldType::TrueFalse,
        }
    }

    fn value(
        self,
        field: &Field,
        question: &str,
        ctx: &FillContext<'_>,
        config: &SurveyConfig,
    ) -> Option<CellInput> {
        match self {
            AutoFillRule::RealCapacity => {
                let capacity = ctx.announced_capacity.trim();
                (!capacity.is_empty()).then(|| CellInput::parse_for(FieldType::Number, capacity))
            }
            AutoFillRule::VisitDate => Some(CellInput::Date(ctx.today)),
            AutoFillRule::YesNoDefault => {
                let negative = config
                    .auto_fill
                    .negative_keywords
                    .iter()
                    .any(|keyword| question.contains(keyword.as_str()));
                let code = if negative {
                    field.field_type.negative_choice()
                } else {
                    field.field_type.positive_choice()
                };
                code.map(CellInput::text)
            }
            AutoFillRule::TrueFalseDefault => field.field_type.positive_choice().map(CellInput::text),
        }
    }
}

/// One default answer to write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedFill {
    pub column: u32,
    pub rule: AutoFillRule,
    pub value: CellInput,
}

/// Current value of the announced-capacity column for a row, empty when there is none.
pub fn announced_capacity<S: SheetModel + ?Sized>(
    sheet: &S,
    row: u32,
    schema: &Schema,
    config: &SurveyConfig,
) -> String {
    let source = config.auto_fill.capacity_source.to_lowercase();
    schema
        .fields
        .iter()
        .find(|f| f.category_norm() == source || f.question_norm() == source)
        .map(|f| sheet.display_value(row, f.column))
        .unwrap_or_default()
}

/// Work out the default answers for a row without touching the sheet.
pub fn plan<S: SheetModel + ?Sized>(
    sheet: &S,
    row: u32,
    schema: &Schema,
    config: &SurveyConfig,
    today: NaiveDate,
) -> Vec<PlannedFill> {
    let capacity = announced_capacity(sheet, row, schema, config);
    let ctx = FillContext {
        announced_capacity: &capacity,
        today,
    };

    let mut planned = Vec::new();
    for field in &schema.fields {
        let fill = sheet.fill(row, field.column);
        if classify(field, fill.as_ref(), false, config).is_exempt() {
            continue;
        }
        if !sheet.display_value(row, field.column).trim().is_empty() {
            continue;
        }

        let category = field.category_norm();
        let question = field.question_norm();
        let Some(rule) = AUTO_FILL_RULES
            .into_iter()
            .find(|rule| rule.matches(field, &category, &question, config))
        else {
            continue;
        };
        if let Some(value) = rule.value(field, &question, &ctx, config) {
            planned.push(PlannedFill {
                column: field.column,
                rule,
                value,
            });
        }
    }
    planned
}
