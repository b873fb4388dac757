#![forbid(unsafe_code)]

use dm_service::{ErrorKind, ServiceError};
use serde_json::{Value, json};

pub(crate) fn ai_ok(intent: &str, message: impl Into<String>, data: Value) -> Value {
    json!({
        "success": true,
        "intent": intent,
        "message": message.into(),
        "data": data,
        "error": null
    })
}

pub(crate) fn ai_error(code: &str, message: &str) -> Value {
    let message = message.trim();
    json!({
        "success": false,
        "intent": "error",
        "message": message,
        "data": null,
        "error": { "code": code, "message": message }
    })
}

pub(crate) fn error_code(err: &ServiceError) -> &'static str {
    match (err, err.kind()) {
        (ServiceError::Policy(_), _) => "POLICY_VIOLATION",
        (_, ErrorKind::NotFound) => "NOT_FOUND",
        (_, ErrorKind::PolicyViolation) => "READ_ONLY_BRANCH",
        (_, ErrorKind::InvalidInput) => "INVALID_INPUT",
        (_, ErrorKind::External) => "VCS_ERROR",
        (_, ErrorKind::Internal) => "STORE_ERROR",
    }
}

pub(crate) fn service_error(err: ServiceError) -> Value {
    let code = error_code(&err);
    if code == "STORE_ERROR" {
        tracing::error!(error = %err, "tool failed");
    }
    ai_error(code, &err.to_string())
}
