//! "Next incomplete field" traversal over the ordered inputs of a form.
//!
//! Members of an exclusive-choice group are consecutive and count as one slot: a group is a
//! target while none of its members is checked, and the scan never stops on a sibling.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputKind {
    Free {
        value: String,
    },
    Choice {
        group: String,
        option: String,
        checked: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderedInput {
    pub column: u32,
    pub kind: InputKind,
    pub disabled: bool,
    pub optional: bool,
}

impl OrderedInput {
    pub fn free(column: u32, value: impl Into<String>) -> Self {
        Self {
            column,
            kind: InputKind::Free {
                value: value.into(),
            },
            disabled: false,
            optional: false,
        }
    }

    pub fn choice(
        column: u32,
        group: impl Into<String>,
        option: impl Into<String>,
        checked: bool,
    ) -> Self {
        Self {
            column,
            kind: InputKind::Choice {
                group: group.into(),
                option: option.into(),
                checked,
            },
            disabled: false,
            optional: false,
        }
    }

    pub fn group(&self) -> Option<&str> {
        match &self.kind {
            InputKind::Choice { group, .. } => Some(group),
            InputKind::Free { .. } => None,
        }
    }
}

/// `[start, end)` of the navigation unit containing `index`.
fn unit_bounds(inputs: &[OrderedInput], index: usize) -> (usize, usize) {
    let Some(group) = inputs[index].group() else {
        return (index, index + 1);
    };
    let mut start = index;
    while start > 0 && inputs[start - 1].group() == Some(group) {
        start -= 1;
    }
    let mut end = index + 1;
    while end < inputs.len() && inputs[end].group() == Some(group) {
        end += 1;
    }
    (start, end)
}

fn is_target(unit: &[OrderedInput]) -> bool {
    let Some(first) = unit.first() else {
        return false;
    };
    if first.disabled || first.optional {
        return false;
    }
    match &first.kind {
        InputKind::Free { value } => value.trim().is_empty(),
        InputKind::Choice { .. } => !unit
            .iter()
            .any(|input| matches!(input.kind, InputKind::Choice { checked: true, .. })),
    }
}

fn scan(inputs: &[OrderedInput], from: usize, to: usize) -> Option<usize> {
    let mut index = from;
    while index < to {
        let (start, end) = unit_bounds(inputs, index);
        if is_target(&inputs[start..end]) {
            return Some(start);
        }
        index = end;
    }
    None
}

/// Index of the first input of the next unanswered required slot after `cursor`, wrapping
/// around to the top. The cursor's own slot is not revisited. `None` means every required
/// input is answered.
pub fn find_next(inputs: &[OrderedInput], cursor: Option<usize>) -> Option<usize> {
    let cursor = cursor.filter(|&index| index < inputs.len());
    let (wrap_end, start) = match cursor {
        Some(index) => unit_bounds(inputs, index),
        None => (0, 0),
    };
    scan(inputs, start, inputs.len()).or_else(|| scan(inputs, 0, wrap_end))
}
