use crate::classify::classify;
use crate::config::{CompletionPolicy, SurveyConfig};
use crate::model::Completion;
use crate::schema::Schema;
use crate::workbook::SheetModel;

/// Count answered fields of one row. Fields without a question and exempt fields do not count.
pub fn completion<S: SheetModel + ?Sized>(
    sheet: &S,
    row: u32,
    schema: &Schema,
    config: &SurveyConfig,
) -> Completion {
    let mut result = Completion::default();
    for field in schema.fields.iter().filter(|f| !f.question.is_empty()) {
        let fill = sheet.fill(row, field.column);
        if classify(field, fill.as_ref(), false, config).is_exempt() {
            continue;
        }
        result.total += 1;
        if !sheet.display_value(row, field.column).trim().is_empty() {
            result.filled += 1;
        }
    }
    result
}

impl CompletionPolicy {
    /// Bar an entity must reach; entities named like a hall get the lower one.
    pub fn threshold_for(&self, name: &str) -> f64 {
        let keyword = self.hall_keyword.to_lowercase();
        if !keyword.is_empty() && name.to_lowercase().contains(&keyword) {
            self.hall_threshold
        } else {
            self.default_threshold
        }
    }

    pub fn is_sufficient(&self, name: &str, completion: &Completion) -> bool {
        completion.total > 0 && completion.percent() >= self.threshold_for(name)
    }
}
