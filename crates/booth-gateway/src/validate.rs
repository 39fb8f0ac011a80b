// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boundary validation for guest-supplied input.
//!
//! Everything here runs before the state machine is touched, so handler
//! code downstream can assume normalized values.

use booth_core::BoothError;

/// Maximum stored guest name length in characters.
const MAX_NAME_CHARS: usize = 50;

/// Maximum accepted email length.
const MAX_EMAIL_CHARS: usize = 100;

fn invalid(field: &str, reason: &str) -> BoothError {
    BoothError::Validation {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Normalize a US phone number to 11 digits with a leading country code.
///
/// Accepts any punctuation; 10 digits get a `1` prepended, 11 digits must
/// already start with `1`.
pub fn normalize_phone(raw: &str) -> Result<String, BoothError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        10 => Ok(format!("1{digits}")),
        11 if digits.starts_with('1') => Ok(digits),
        _ => Err(invalid(
            "phone",
            "must be a 10-digit US number, optionally with a leading 1",
        )),
    }
}

/// Trim and length-cap the guest name.
pub fn sanitize_name(raw: &str) -> Result<String, BoothError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("name", "must not be empty"));
    }
    Ok(trimmed.chars().take(MAX_NAME_CHARS).collect())
}

/// Validate an optional email. Blank input becomes `None`.
pub fn validate_email(raw: Option<&str>) -> Result<Option<String>, BoothError> {
    let Some(raw) = raw else { return Ok(None) };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.len() > MAX_EMAIL_CHARS {
        return Err(invalid("email", "too long"));
    }
    let looks_like_address = trimmed.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
    });
    if !looks_like_address {
        return Err(invalid("email", "not a valid address"));
    }
    Ok(Some(trimmed.to_string()))
}

/// Verification codes are exactly six ASCII digits.
pub fn validate_code(raw: &str) -> Result<(), BoothError> {
    if raw.len() == 6 && raw.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(invalid("code", "must be exactly 6 digits"))
    }
}

/// Magic-byte sniff: accept JPEG, PNG, and GIF payloads only.
pub fn looks_like_image(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8, 0xFF])
        || bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47])
        || bytes.starts_with(b"GIF8")
}
