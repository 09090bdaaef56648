use crate::errors::{Result, ValidationError};

/// Normalizes a user-entered currency code to its upper-case three-letter form.
///
/// Surrounding whitespace is ignored. Anything other than three ASCII letters
/// is rejected.
pub fn normalize_currency_code(code: &str) -> Result<String> {
    let trimmed = code.trim();
    if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidCurrency(code.to_string()).into());
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Returns true if both codes name the same currency, ignoring case and padding.
pub fn same_currency(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
