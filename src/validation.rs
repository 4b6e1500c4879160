/**
 * Input Validation Module
 *
 * Centralized validation for Tauri command inputs coming from the panel
 */
use std::path::{Component, Path};
use tauri::Emitter;
use thiserror::Error;

pub const MAX_DEVICE_NAME_LEN: usize = 256;
pub const MAX_RUN_ID_LEN: usize = 128;
pub const MAX_TEXT_PROMPT_LEN: usize = 1000;
pub const MIN_RECORD_SECONDS: u32 = 1;
pub const MAX_RECORD_SECONDS: u32 = 60;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path traversal detected")]
    PathTraversal,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Value too long: max {max}, got {actual}")]
    ValueTooLong { max: usize, actual: usize },
}

impl ValidationError {
    /// Short machine-readable code sent along with the message
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidRange(_) => "invalid_range",
            ValidationError::InvalidPath(_) => "invalid_path",
            ValidationError::PathTraversal => "path_traversal",
            ValidationError::InvalidFormat(_) => "invalid_format",
            ValidationError::ValueTooLong { .. } => "value_too_long",
        }
    }
}

/// Validate device name (max 256 chars, no control characters)
pub fn validate_device_name(name: &str) -> Result<String, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::InvalidFormat(
            "Device name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_DEVICE_NAME_LEN {
        return Err(ValidationError::ValueTooLong {
            max: MAX_DEVICE_NAME_LEN,
            actual: name.len(),
        });
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat(
            "Device name contains invalid control characters".to_string(),
        ));
    }

    Ok(name.to_string())
}

/// Validate optional device name
pub fn validate_opt_device_name(name: &Option<String>) -> Result<(), ValidationError> {
    if let Some(n) = name {
        validate_device_name(n)?;
    }
    Ok(())
}

/// Parse the seed textbox (unsigned 64-bit integer, surrounding blanks ignored)
pub fn validate_seed(text: &str) -> Result<u64, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidFormat(
            "Seed cannot be empty".to_string(),
        ));
    }

    trimmed.parse::<u64>().map_err(|_| {
        ValidationError::InvalidFormat(format!(
            "Seed must be a non-negative integer, got '{}'",
            trimmed
        ))
    })
}

/// Validate a training run id: one relative path component, no traversal
pub fn validate_run_id(run_id: &str) -> Result<String, ValidationError> {
    if run_id.is_empty() {
        return Err(ValidationError::InvalidFormat(
            "Run id cannot be empty".to_string(),
        ));
    }

    if run_id.len() > MAX_RUN_ID_LEN {
        return Err(ValidationError::ValueTooLong {
            max: MAX_RUN_ID_LEN,
            actual: run_id.len(),
        });
    }

    if run_id.contains('\0') {
        return Err(ValidationError::InvalidPath(
            "Run id contains null byte".to_string(),
        ));
    }

    if run_id.contains("..") {
        return Err(ValidationError::PathTraversal);
    }

    let mut components = Path::new(run_id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !run_id.contains(['/', '\\']) => {
            Ok(run_id.to_string())
        }
        _ => Err(ValidationError::InvalidPath(format!(
            "Run id must be a single directory name, got '{}'",
            run_id
        ))),
    }
}

/// Validate recording length in seconds (1s to 60s)
pub fn validate_record_seconds(seconds: u32) -> Result<u32, ValidationError> {
    if !(MIN_RECORD_SECONDS..=MAX_RECORD_SECONDS).contains(&seconds) {
        return Err(ValidationError::InvalidRange(format!(
            "Recording length must be between {}s and {}s, got {}s",
            MIN_RECORD_SECONDS, MAX_RECORD_SECONDS, seconds
        )));
    }
    Ok(seconds)
}

/// Validate the synthesis text prompt (non-blank, max 1000 chars)
pub fn validate_text_prompt(text: &str) -> Result<String, ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::InvalidFormat(
            "Text prompt cannot be empty".to_string(),
        ));
    }

    let len = text.chars().count();
    if len > MAX_TEXT_PROMPT_LEN {
        return Err(ValidationError::ValueTooLong {
            max: MAX_TEXT_PROMPT_LEN,
            actual: len,
        });
    }

    Ok(text.to_string())
}

// ========== Validation Error Emission ==========

#[derive(serde::Serialize, Debug, Clone)]
pub struct ValidationErrorPayload<'a> {
    pub code: &'a str,    // e.g., "invalid_format", "path_traversal"
    pub message: &'a str, // short, user-friendly
    pub field: &'a str,   // e.g., "seed", "run_id"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Emit a validation error event to the frontend
pub fn emit_validation_error(
    app: &tauri::AppHandle,
    code: &str,
    field: &str,
    message: &str,
    value: Option<serde_json::Value>,
) {
    let payload = ValidationErrorPayload {
        code,
        field,
        message,
        value,
    };
    let _ = app.emit("toolbox:error", &payload);
}

/// Emit `err` for `field` and hand it back as a command error string
pub fn reject(
    app: &tauri::AppHandle,
    field: &str,
    err: ValidationError,
    value: Option<serde_json::Value>,
) -> String {
    let message = err.to_string();
    emit_validation_error(app, err.code(), field, &message, value);
    message
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn device_name_rejects_controls(s in r"[\x00-\x1F\x7F]{1,16}") {
            assert!(validate_device_name(&s).is_err());
        }

        #[test]
        fn device_name_accepts_reasonable_ascii(s in r"[A-Za-z0-9 _\-]{1,64}") {
            assert!(validate_device_name(&s).is_ok());
        }

        #[test]
        fn seed_roundtrips_any_u64(x in any::<u64>()) {
            prop_assert_eq!(validate_seed(&x.to_string()), Ok(x));
        }

        #[test]
        fn seed_rejects_non_digits(s in r"[A-Za-z_\-\.]{1,12}") {
            assert!(validate_seed(&s).is_err());
        }

        #[test]
        fn record_seconds_in_range(x in 1u32..=60) {
            assert!(validate_record_seconds(x).is_ok());
        }

        #[test]
        fn record_seconds_outside_range(x in any::<u32>().prop_filter("out of [1,60]", |v| *v < 1 || *v > 60)) {
            assert!(validate_record_seconds(x).is_err());
        }

        #[test]
        fn run_id_plain_names_accepted(s in r"[A-Za-z0-9_\-]{1,64}") {
            assert!(validate_run_id(&s).is_ok());
        }

        #[test]
        fn run_id_with_separator_rejected(a in r"[A-Za-z0-9]{1,8}", b in r"[A-Za-z0-9]{1,8}") {
            let joined = format!("{}/{}", a, b);
            assert!(validate_run_id(&joined).is_err());
        }
    }
}
