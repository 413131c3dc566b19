use crate::model::{ExemptionReason, PatternFillDescriptor};
use std::str::FromStr;
use umya_spreadsheet::structs::EnumTrait;
use umya_spreadsheet::{PatternValues, Style};

const NO_PATTERN: &str = "none";
const SOLID_PATTERN: &str = "solid";

/// Pattern fill of a cell style, if it has one.
pub fn pattern_fill_of(style: &Style) -> Option<PatternFillDescriptor> {
    let pattern = style.get_fill()?.get_pattern_fill()?;
    let kind = pattern.get_pattern_type().get_value_string();
    let fg = pattern
        .get_foreground_color()
        .map(|c| c.get_argb().to_string())
        .filter(|s| !s.is_empty());
    let bg = pattern
        .get_background_color()
        .map(|c| c.get_argb().to_string())
        .filter(|s| !s.is_empty());

    if kind.eq_ignore_ascii_case(NO_PATTERN) && fg.is_none() && bg.is_none() {
        return None;
    }

    Some(PatternFillDescriptor {
        pattern_type: if kind.eq_ignore_ascii_case(NO_PATTERN) {
            None
        } else {
            Some(kind.to_string())
        },
        foreground_color: fg,
        background_color: bg,
    })
}

/// A hatch or dot pattern (anything but none/solid) marks a cell exempt. The configured
/// user pattern distinguishes a manual N/A from a facultative cell of the source file.
pub fn exemption_from_fill(
    fill: Option<&PatternFillDescriptor>,
    user_pattern: &str,
) -> ExemptionReason {
    let Some(kind) = fill.and_then(|f| f.pattern_type.as_deref()) else {
        return ExemptionReason::None;
    };
    if kind.eq_ignore_ascii_case(NO_PATTERN) || kind.eq_ignore_ascii_case(SOLID_PATTERN) {
        ExemptionReason::None
    } else if kind.eq_ignore_ascii_case(user_pattern) {
        ExemptionReason::UserExempted
    } else {
        ExemptionReason::SourceOptional
    }
}

/// Fill marking a cell N/A: the user pattern over the cell's existing colours.
pub fn user_exempt_fill(
    base: Option<&PatternFillDescriptor>,
    user_pattern: &str,
) -> PatternFillDescriptor {
    PatternFillDescriptor {
        pattern_type: Some(user_pattern.to_string()),
        ..base.cloned().unwrap_or_default()
    }
}

pub fn apply_pattern_fill(style: &mut Style, desc: Option<&PatternFillDescriptor>) {
    let pat = style.get_fill_mut().get_pattern_fill_mut();
    let Some(desc) = desc else {
        pat.set_pattern_type(PatternValues::None);
        return;
    };
    let kind = desc.pattern_type.as_deref().unwrap_or(NO_PATTERN);
    if let Ok(pv) = PatternValues::from_str(kind) {
        pat.set_pattern_type(pv);
    }
    if let Some(fg) = &desc.foreground_color {
        pat.get_foreground_color_mut().set_argb(fg.clone());
    }
    if let Some(bg) = &desc.background_color {
        pat.get_background_color_mut().set_argb(bg.clone());
    }
}
