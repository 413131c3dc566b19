//! Per-field classification: exemption from the cell fill, read-only status from keywords.

use crate::config::SurveyConfig;
use crate::model::{ExemptionReason, Field, FieldType, PatternFillDescriptor};
use crate::styles::exemption_from_fill;
use serde::Serialize;

/// Structural fields whose value comes from the survey design. Checked in this order; the
/// first match is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadOnlyRule {
    /// Category or question is exactly a building label.
    Building,
    /// Category or question is exactly the auditorium label.
    Auditorium,
    /// Category or question mentions the announced capacity.
    AnnouncedCapacity,
    /// Category names both tiered and movable seating.
    MovableTiers,
    /// Seating selector under a tiered-seating header.
    TieredChoice,
}

pub const READ_ONLY_RULES: [ReadOnlyRule; 5] = [
    ReadOnlyRule::Building,
    ReadOnlyRule::Auditorium,
    ReadOnlyRule::AnnouncedCapacity,
    ReadOnlyRule::MovableTiers,
    ReadOnlyRule::TieredChoice,
];

impl ReadOnlyRule {
    fn matches(self, field: &Field, category: &str, question: &str, config: &SurveyConfig) -> bool {
        let keywords = &config.keywords;
        let either_is = |labels: &[String]| {
            labels
                .iter()
                .any(|label| category == label.as_str() || question == label.as_str())
        };
        match self {
            ReadOnlyRule::Building => either_is(&keywords.building_labels),
            ReadOnlyRule::Auditorium => either_is(&keywords.auditorium_labels),
            ReadOnlyRule::AnnouncedCapacity => {
                let keyword = keywords.announced_capacity.as_str();
                !keyword.is_empty() && (category.contains(keyword) || question.contains(keyword))
            }
            ReadOnlyRule::MovableTiers => {
                category.contains(keywords.tiered.as_str())
                    && category.contains(keywords.movable.as_str())
            }
            ReadOnlyRule::TieredChoice => {
                let keyword = keywords.tiered.as_str();
                field.field_type == FieldType::Gmf
                    && (category.contains(keyword) || question.contains(keyword))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FieldState {
    pub exemption: ExemptionReason,
    pub read_only: Option<ReadOnlyRule>,
}

impl FieldState {
    /// Any qualifying pattern fill, manual N/A included.
    pub fn is_optional(&self) -> bool {
        self.exemption != ExemptionReason::None
    }

    pub fn is_exempt(&self) -> bool {
        self.exemption != ExemptionReason::None
    }

    pub fn is_user_exempted(&self) -> bool {
        self.exemption == ExemptionReason::UserExempted
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.is_some()
    }

    /// Exempt and read-only fields render a disabled input.
    pub fn is_disabled(&self) -> bool {
        self.is_read_only() || self.is_exempt()
    }
}

/// First read-only rule matching the field, if any.
pub fn read_only_rule(field: &Field, config: &SurveyConfig) -> Option<ReadOnlyRule> {
    let category = field.category_norm();
    let question = field.question_norm();
    READ_ONLY_RULES
        .into_iter()
        .find(|rule| rule.matches(field, &category, &question, config))
}

/// Pure function of field, cell fill and the force-edit flag.
pub fn classify(
    field: &Field,
    fill: Option<&PatternFillDescriptor>,
    force_edit: bool,
    config: &SurveyConfig,
) -> FieldState {
    let exemption = exemption_from_fill(fill, &config.keywords.user_exempt_pattern);
    let read_only = if force_edit {
        None
    } else {
        read_only_rule(field, config)
    };
    FieldState {
        exemption,
        read_only,
    }
}
