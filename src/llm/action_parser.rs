//! Turns free-form model replies into a validated [`ActionProposal`].
//!
//! Syntax is handled permissively (code fences, surrounding prose, nested
//! objects, loose number formats); semantics strictly (unknown action names
//! are rejected). The parser never fails: anything it cannot read becomes
//! `Wait`.
use serde_json::{Map, Value};

use crate::agent_engine::action::{Action, ActionProposal};

pub const UNPARSEABLE: &str = "unparseable";
pub const UNRECOGNIZED: &str = "unrecognized action";

type Object = Map<String, Value>;

pub fn parse_action(raw: &str) -> ActionProposal {
    match extract_action_object(raw) {
        Some(obj) => validate(&obj),
        None => {
            tracing::warn!(
                reply = %raw.chars().take(200).collect::<String>(),
                "model reply contained no action object"
            );
            ActionProposal::wait(UNPARSEABLE)
        }
    }
}

fn extract_action_object(raw: &str) -> Option<Object> {
    let text = strip_fences(raw);
    decode_object(text)
        .or_else(|| balanced_spans(text).find_map(decode_object))
        .or_else(|| single_level_spans(text).find_map(decode_object))
}

/// Remove a surrounding ```` ``` ```` / ```` ```json ```` fence, if any.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Only JSON objects that name an action count as a decode.
fn decode_object(candidate: &str) -> Option<Object> {
    match serde_json::from_str::<Value>(candidate.trim()).ok()? {
        Value::Object(obj) if obj.contains_key("action") => Some(obj),
        _ => None,
    }
}

/// Balanced `{…}` spans, one per opening brace, in order of appearance.
/// Each scan tracks nesting depth and skips braces inside string literals;
/// a brace that never closes only costs its own candidate.
fn balanced_spans(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices('{')
        .filter_map(move |(start, _)| balanced_from(text, start))
}

fn balanced_from(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Innermost `{…}` spans that contain no other braces.
fn single_level_spans(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices('{').filter_map(move |(start, _)| {
        let rest = &text[start + 1..];
        let end = rest.find(['{', '}'])?;
        rest[end..]
            .starts_with('}')
            .then(|| &text[start..=start + 1 + end])
    })
}

fn validate(obj: &Object) -> ActionProposal {
    let rationale = ["thought", "rationale", "reason"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .unwrap_or_default()
        .trim()
        .to_string();

    let name = obj
        .get("action")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_ascii_lowercase().replace(['-', ' '], "_"))
        .unwrap_or_default();

    // params may be nested under "params" or given flat alongside "action"
    let params = match obj.get("params") {
        Some(Value::Object(p)) => p,
        _ => obj,
    };

    let action = match name.as_str() {
        "tap" | "click" | "press" => Action::Tap {
            x: int_field(params, "x"),
            y: int_field(params, "y"),
        },
        "swipe" | "scroll" => Action::Swipe {
            x1: int_field(params, "x1"),
            y1: int_field(params, "y1"),
            x2: int_field(params, "x2"),
            y2: int_field(params, "y2"),
        },
        "input" | "type" | "text" | "type_text" => Action::Input {
            text: str_field(params, &["text"]),
        },
        "launch" | "open" | "open_app" | "launch_app" => Action::Launch {
            app: str_field(params, &["app", "package", "name"]),
        },
        "back" => Action::Back,
        "home" => Action::Home,
        "done" | "finish" | "finished" | "complete" => Action::Done,
        "wait" => Action::Wait,
        "failed" | "fail" | "failure" => Action::Failed,
        other => {
            tracing::warn!(action = other, "model proposed an unrecognized action");
            return ActionProposal::failed(UNRECOGNIZED);
        }
    };

    ActionProposal::new(action, rationale)
}

/// Integer coordinate; accepts ints, floats (rounded) and numeric strings. Missing → 0.
fn int_field(params: &Object, key: &str) -> i32 {
    let value = match params.get(key) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    };
    value
        .map(|v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
        .unwrap_or(0)
}

fn str_field(params: &Object, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| match params.get(*k) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}
