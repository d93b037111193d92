use crate::ipc::error::HandlerErr;
use crate::snapshot::{month_index, month_name};

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("{} is required", key)))
}

/// `year` may arrive as a number or a numeric string; null counts as absent.
pub fn get_optional_year(params: &serde_json::Value) -> Result<Option<i32>, HandlerErr> {
    let Some(v) = params.get("year") else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(None);
    }
    let parsed = match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) if s.trim().is_empty() => return Ok(None),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|y| i32::try_from(y).ok())
        .filter(|y| (1900..=9999).contains(y))
        .map(Some)
        .ok_or_else(|| HandlerErr::bad_params("year must be a four-digit number"))
}

pub fn get_optional_month(params: &serde_json::Value) -> Result<Option<String>, HandlerErr> {
    let Some(v) = params.get("month") else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(None);
    }
    let Some(s) = v.as_str().map(str::trim) else {
        return Err(HandlerErr::bad_params("month must be a month name"));
    };
    if s.is_empty() {
        return Ok(None);
    }
    month_index(s)
        .and_then(month_name)
        .map(|name| Some(name.to_string()))
        .ok_or_else(|| HandlerErr::bad_params(format!("unknown month: {}", s)))
}

pub fn get_required_array<'a>(
    params: &'a serde_json::Value,
    key: &str,
) -> Result<&'a Vec<serde_json::Value>, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}
