use crate::classify::{FieldState, classify};
use crate::config::SurveyConfig;
use crate::model::{Choice, ExemptionReason, Field};
use crate::navigation::OrderedInput;
use crate::schema::Schema;
use crate::workbook::SheetModel;
use serde::Serialize;

/// One schema field projected onto a data row.
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub field: Field,
    pub value: String,
    pub state: FieldState,
    pub label: String,
    pub badges: Vec<String>,
    pub requires_manual_test: bool,
    pub choices: &'static [Choice],
}

impl FormField {
    pub fn is_choice_checked(&self, code: &str) -> bool {
        self.value.trim().eq_ignore_ascii_case(code)
    }

    fn inputs(&self) -> Vec<OrderedInput> {
        let column = self.field.column;
        let mut inputs = if self.field.field_type.is_choice() {
            let group = format!("field-{column}");
            self.choices
                .iter()
                .map(|choice| {
                    OrderedInput::choice(
                        column,
                        group.clone(),
                        choice.code,
                        self.is_choice_checked(choice.code),
                    )
                })
                .collect()
        } else {
            vec![OrderedInput::free(column, self.value.clone())]
        };
        for input in &mut inputs {
            input.disabled = self.state.is_disabled();
            input.optional = self.state.is_optional();
        }
        inputs
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSection {
    pub category: String,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Form {
    pub row: u32,
    pub sections: Vec<FormSection>,
}

impl Form {
    pub fn build<S: SheetModel + ?Sized>(
        sheet: &S,
        row: u32,
        schema: &Schema,
        force_edit: bool,
        config: &SurveyConfig,
    ) -> Self {
        let sections = schema
            .categories()
            .into_iter()
            .map(|(category, fields)| FormSection {
                category: if category.is_empty() {
                    config.badges.default_category.clone()
                } else {
                    category.to_string()
                },
                fields: fields
                    .into_iter()
                    .map(|field| project(sheet, row, field, force_edit, config))
                    .collect(),
            })
            .filter(|section| !section.fields.is_empty())
            .collect();
        Self { row, sections }
    }

    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.sections.iter().flat_map(|section| section.fields.iter())
    }

    /// Inputs in display order, one per option for choice fields.
    pub fn ordered_inputs(&self) -> Vec<OrderedInput> {
        self.fields().flat_map(FormField::inputs).collect()
    }
}

fn project<S: SheetModel + ?Sized>(
    sheet: &S,
    row: u32,
    field: &Field,
    force_edit: bool,
    config: &SurveyConfig,
) -> FormField {
    let fill = sheet.fill(row, field.column);
    let state = classify(field, fill.as_ref(), force_edit, config);
    let value = sheet.display_value(row, field.column);

    let base_label = if field.question.is_empty() {
        field.category.as_str()
    } else {
        field.question.as_str()
    };
    let (label, requires_manual_test) =
        strip_manual_test_marker(base_label, &config.badges.manual_test_markers);

    let mut badges = Vec::new();
    match state.exemption {
        ExemptionReason::SourceOptional => badges.push(config.badges.optional.clone()),
        ExemptionReason::UserExempted => badges.push(config.badges.user_exempt.clone()),
        ExemptionReason::None => {}
    }
    if requires_manual_test {
        badges.push(config.badges.manual_test.clone());
    }

    FormField {
        field: field.clone(),
        value,
        state,
        label,
        badges,
        requires_manual_test,
        choices: field.field_type.choices(),
    }
}

/// Remove "(testé)"-style markers from a label, case-insensitively.
fn strip_manual_test_marker(label: &str, markers: &[String]) -> (String, bool) {
    let lowered = label.to_lowercase();
    for marker in markers {
        let marker = marker.to_lowercase();
        if let Some(at) = lowered.find(&marker) {
            // lowercasing can change byte lengths; only cut when offsets still line up
            if label.is_char_boundary(at)
                && label.is_char_boundary(at + marker.len())
                && label[at..at + marker.len()].to_lowercase() == marker
            {
                let mut cleaned = String::with_capacity(label.len());
                cleaned.push_str(&label[..at]);
                cleaned.push_str(&label[at + marker.len()..]);
                return (cleaned.trim().to_string(), true);
            }
            return (label.to_string(), true);
        }
    }
    (label.to_string(), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["(testé)".to_string(), "(testée)".to_string()]
    }

    #[test]
    fn strips_manual_test_markers() {
        assert_eq!(
            strip_manual_test_marker("Alarme incendie (Testé)", &markers()),
            ("Alarme incendie".to_string(), true)
        );
        assert_eq!(
            strip_manual_test_marker("Sortie de secours", &markers()),
            ("Sortie de secours".to_string(), false)
        );
    }

    #[test]
    fn longer_marker_is_not_cut_in_half() {
        let (label, flagged) = strip_manual_test_marker("Porte (testée)", &markers());
        assert!(flagged);
        assert_eq!(label, "Porte");
    }
}
