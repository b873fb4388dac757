#![forbid(unsafe_code)]

use super::ai::ai_error;
use dm_core::model::{Actor, NodeKind};
use serde_json::{Map, Value};

pub(crate) type Args = Map<String, Value>;

pub(crate) fn invalid(message: impl AsRef<str>) -> Value {
    ai_error("INVALID_INPUT", message.as_ref())
}

pub(crate) fn require_string(args: &Args, key: &str) -> Result<String, Value> {
    let Some(v) = args.get(key).and_then(|v| v.as_str()) else {
        return Err(invalid(format!("{key} is required")));
    };
    Ok(v.to_string())
}

pub(crate) fn optional_string(args: &Args, key: &str) -> Result<Option<String>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::String(v) => Ok(Some(v.to_string())),
        _ => Err(invalid(format!("{key} must be a string"))),
    }
}

pub(crate) fn optional_i64(args: &Args, key: &str) -> Result<Option<i64>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid(format!("{key} must be an integer"))),
        _ => Err(invalid(format!("{key} must be an integer"))),
    }
}

pub(crate) fn require_i64(args: &Args, key: &str) -> Result<i64, Value> {
    optional_i64(args, key)?.ok_or_else(|| invalid(format!("{key} is required")))
}

pub(crate) fn optional_usize(args: &Args, key: &str) -> Result<Option<usize>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(|v| v as usize)
            .map(Some)
            .ok_or_else(|| invalid(format!("{key} must be a non-negative integer"))),
        _ => Err(invalid(format!("{key} must be a non-negative integer"))),
    }
}

pub(crate) fn optional_string_array(args: &Args, key: &str) -> Result<Option<Vec<String>>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let Some(arr) = value.as_array() else {
        return Err(invalid(format!("{key} must be an array of strings")));
    };
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        let Some(s) = item.as_str() else {
            return Err(invalid(format!("{key} must be an array of strings")));
        };
        out.push(s.to_string());
    }
    Ok(Some(out))
}

/// Objects of an optional array argument; a missing key is an empty list.
pub(crate) fn object_list<'a>(args: &'a Args, key: &str) -> Result<Vec<&'a Args>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(Vec::new());
    };
    if value.is_null() {
        return Ok(Vec::new());
    }
    let Some(arr) = value.as_array() else {
        return Err(invalid(format!("{key} must be an array of objects")));
    };
    arr.iter()
        .enumerate()
        .map(|(idx, item)| {
            item.as_object()
                .ok_or_else(|| invalid(format!("{key}[{idx}] must be an object")))
        })
        .collect()
}

pub(crate) fn require_kind(args: &Args, key: &str) -> Result<NodeKind, Value> {
    let raw = require_string(args, key)?;
    NodeKind::parse(&raw).ok_or_else(|| invalid(format!("{key} must be one of: doc|block")))
}

pub(crate) fn optional_kind(args: &Args, key: &str) -> Result<Option<NodeKind>, Value> {
    match optional_string(args, key)? {
        None => Ok(None),
        Some(raw) => NodeKind::parse(&raw)
            .map(Some)
            .ok_or_else(|| invalid(format!("{key} must be one of: doc|block"))),
    }
}

/// `actor: {id, name}`; absent means the configured default actor.
pub(crate) fn optional_actor(args: &Args) -> Result<Option<Actor>, Value> {
    let Some(value) = args.get("actor") else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let Some(obj) = value.as_object() else {
        return Err(invalid("actor must be an object"));
    };
    let id = require_string(obj, "id").map_err(|_| invalid("actor.id is required"))?;
    let name = require_string(obj, "name").map_err(|_| invalid("actor.name is required"))?;
    if id.trim().is_empty() || name.trim().is_empty() {
        return Err(invalid("actor.id and actor.name must not be empty"));
    }
    Ok(Some(Actor::new(id.trim(), name.trim())))
}
