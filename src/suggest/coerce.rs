/// Coercion of untrusted candidates and the built-in fallback plan.
use chrono::NaiveTime;
use serde_json::Value;

use crate::types::{BlockCategory, NewTimeBlock, format_clock, parse_clock};

const DEFAULT_TITLE: &str = "Time block";
const DEFAULT_START: &str = "09:00";
const DEFAULT_END: &str = "10:00";

/// Maps one raw record onto block fields.
///
/// Unknown categories become `focus`; missing or malformed times become
/// 09:00/10:00. Returns `None` when the resulting start is not before the end.
pub fn coerce_suggestion(value: &Value) -> Option<NewTimeBlock> {
    let title = coerce_title(value.get("title"));
    let category = value
        .get("category")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<BlockCategory>().ok())
        .unwrap_or(BlockCategory::Focus);
    let start = coerce_clock(value.get("startTime"), DEFAULT_START)?;
    let end = coerce_clock(value.get("endTime"), DEFAULT_END)?;
    if start >= end {
        return None;
    }
    Some(NewTimeBlock::planned(
        title,
        category,
        format_clock(start),
        format_clock(end),
    ))
}

fn coerce_title(value: Option<&Value>) -> String {
    let title = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    };
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}

fn coerce_clock(value: Option<&Value>, default: &str) -> Option<NaiveTime> {
    value
        .and_then(Value::as_str)
        .and_then(parse_clock)
        .or_else(|| parse_clock(default))
}

/// Fixed plan used whenever the service cannot deliver one.
pub fn fallback_blocks() -> Vec<NewTimeBlock> {
    const PLAN: &[(&str, BlockCategory, &str, &str)] = &[
        ("Morning routine", BlockCategory::Rest, "06:00", "07:00"),
        ("Deep Work: main project", BlockCategory::Focus, "07:00", "10:00"),
        ("Email & admin", BlockCategory::Admin, "10:00", "11:00"),
        ("Meeting block", BlockCategory::Social, "11:00", "12:00"),
        ("Lunch break", BlockCategory::Play, "12:00", "13:00"),
        ("Deep Work: side project", BlockCategory::Focus, "13:00", "15:00"),
        ("Creative time", BlockCategory::Focus, "15:00", "16:00"),
        ("Admin & wrap-up", BlockCategory::Admin, "16:00", "17:00"),
        ("Family & dinner", BlockCategory::Social, "17:00", "19:00"),
        ("Free time / hobby", BlockCategory::Play, "19:00", "21:00"),
        ("Evening routine", BlockCategory::Rest, "21:00", "22:00"),
    ];
    PLAN.iter()
        .map(|(title, category, start, end)| NewTimeBlock::planned(*title, *category, *start, *end))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::BlockStatus;

    #[test]
    fn missing_fields_get_defaults() {
        let block = coerce_suggestion(&json!({})).expect("defaults form a valid block");
        assert_eq!(block.title, DEFAULT_TITLE);
        assert_eq!(block.category, BlockCategory::Focus);
        assert_eq!(block.start_time, "09:00");
        assert_eq!(block.end_time, "10:00");
        assert_eq!(block.status, Some(BlockStatus::Planned));
    }

    #[test]
    fn malformed_times_are_replaced() {
        let block = coerce_suggestion(&json!({
            "title": "Read",
            "category": "play",
            "startTime": "half past nine",
            "endTime": 10
        }))
        .expect("block");
        assert_eq!(block.category, BlockCategory::Play);
        assert_eq!(block.start_time, "09:00");
        assert_eq!(block.end_time, "10:00");
    }

    #[test]
    fn inverted_times_are_rejected() {
        let candidate = json!({"title": "Late", "startTime": "15:00", "endTime": "13:00"});
        assert!(coerce_suggestion(&candidate).is_none());
    }

    #[test]
    fn numeric_title_is_stringified() {
        let block = coerce_suggestion(&json!({"title": 42})).expect("block");
        assert_eq!(block.title, "42");
    }

    #[test]
    fn non_object_candidate_becomes_default_block() {
        let block = coerce_suggestion(&json!("just text")).expect("block");
        assert_eq!(block.title, DEFAULT_TITLE);
    }

    #[test]
    fn fallback_plan_is_well_formed() {
        let plan = fallback_blocks();
        assert_eq!(plan.len(), 11);
        for block in &plan {
            let start = parse_clock(&block.start_time).expect("start parses");
            let end = parse_clock(&block.end_time).expect("end parses");
            assert!(start < end, "{} must end after it starts", block.title);
        }
    }
}
