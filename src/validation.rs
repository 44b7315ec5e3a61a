use bigdecimal::BigDecimal;

use crate::error::AppError;

pub const REASON_MAX_LEN: usize = 500;
pub const REFERENCE_MAX_LEN: usize = 255;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_positive_amount(amount: &BigDecimal) -> Result<(), AppError> {
    if amount <= &BigDecimal::from(0) {
        return Err(AppError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

/// A not-received reason is mandatory and bounded.
pub fn validate_reason(reason: &str) -> Result<String, AppError> {
    let reason = sanitize_string(reason);
    if reason.is_empty() {
        return Err(AppError::Validation("reason must not be empty".to_string()));
    }
    if reason.chars().count() > REASON_MAX_LEN {
        return Err(AppError::Validation(format!(
            "reason must be at most {} characters",
            REASON_MAX_LEN
        )));
    }

    Ok(reason)
}

pub fn validate_external_ref(external_ref: &str) -> Result<String, AppError> {
    let external_ref = sanitize_string(external_ref);
    if external_ref.chars().count() > REFERENCE_MAX_LEN {
        return Err(AppError::Validation(format!(
            "external reference must be at most {} characters",
            REFERENCE_MAX_LEN
        )));
    }

    Ok(external_ref)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_amounts_pass() {
        assert!(validate_positive_amount(&"0.01".parse().unwrap()).is_ok());
        assert!(validate_positive_amount(&"150.00".parse().unwrap()).is_ok());
    }

    #[test]
    fn zero_and_negative_amounts_fail() {
        assert!(validate_positive_amount(&BigDecimal::from(0)).is_err());
        assert!(validate_positive_amount(&"-1".parse().unwrap()).is_err());
    }

    #[test]
    fn reason_is_trimmed_and_required() {
        assert_eq!(
            validate_reason("  not found in bank statement  ").unwrap(),
            "not found in bank statement"
        );
        assert!(validate_reason("   ").is_err());
        assert!(validate_reason(&"x".repeat(REASON_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn reason_length_counts_characters_not_bytes() {
        // Two bytes per char in UTF-8; the cap is on characters.
        assert!(validate_reason(&"é".repeat(REASON_MAX_LEN)).is_ok());
        assert!(validate_reason(&"é".repeat(REASON_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn sanitize_collapses_whitespace_and_strips_controls() {
        assert_eq!(sanitize_string("a\tb\n c"), "a b c");
        assert_eq!(sanitize_string("\u{0000}clean"), "clean");
    }
}
