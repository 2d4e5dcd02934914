//! Input validation module

use crate::models::{CreateQuote, CreateTicket, NewQuoteItem};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} required")]
    MissingFields(String),

    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' is too long (max {max} characters)")]
    TooLong { field: String, max: usize },

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Invalid currency code '{0}' (expected three letters)")]
    InvalidCurrency(String),

    #[error("Item {index}: {field} cannot be negative")]
    NegativeAmount { index: usize, field: &'static str },

    #[error("Item {index}: {field} is too large")]
    AmountTooLarge { index: usize, field: &'static str },

    #[error("Quote total is too large")]
    TotalTooLarge,

    #[error("Invalid identifier format (letters, digits and hyphens only)")]
    InvalidPublicId,

    #[error("No {0} fields provided")]
    NoFields(&'static str),
}

/// Validate a quote creation request
pub fn validate_create_quote(input: &CreateQuote) -> Result<(), ValidationError> {
    require_all(&[
        ("name", input.name.as_str()),
        ("customer", input.customer.as_str()),
    ])?;

    max_len("name", &input.name, 255)?;
    max_len("customer", &input.customer, 255)?;

    if let Some(ref email) = input.contact_email {
        if !email.is_empty() && !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }
    }

    if let Some(ref public_id) = input.public_id {
        validate_public_id(public_id)?;
    }

    if let Some(ref currency) = input.currency {
        validate_currency(currency)?;
    }

    validate_items(&input.items)
}

/// Largest quantity or unit price accepted on a line item
const MAX_ITEM_AMOUNT: i64 = 1_000_000_000;

/// Quantities and prices may be fractional but never negative
pub fn validate_items(items: &[NewQuoteItem]) -> Result<(), ValidationError> {
    let max = Decimal::from(MAX_ITEM_AMOUNT);
    for (index, item) in items.iter().enumerate() {
        for (field, value) in [("quantity", item.quantity), ("unitPrice", item.unit_price)] {
            if value < Decimal::ZERO {
                return Err(ValidationError::NegativeAmount { index, field });
            }
            if value > max {
                return Err(ValidationError::AmountTooLarge { index, field });
            }
        }
    }
    Ok(())
}

/// Quote totals are stored as NUMERIC(20, 6) and must stay below 10^14
const MAX_QUOTE_TOTAL: i64 = 100_000_000_000_000;

pub fn validate_total(total: Decimal) -> Result<(), ValidationError> {
    if total >= Decimal::from(MAX_QUOTE_TOTAL) {
        return Err(ValidationError::TotalTooLarge);
    }
    Ok(())
}

/// Validate a ticket creation request
pub fn validate_create_ticket(input: &CreateTicket) -> Result<(), ValidationError> {
    require_all(&[
        ("customer", input.customer.as_str()),
        ("subject", input.subject.as_str()),
    ])?;
    max_len("subject", &input.subject, 500)?;

    if let Some(ref email) = input.requester_email {
        if !email.is_empty() && !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }
    }
    Ok(())
}

/// Validate a recipient address for an outgoing quote
pub fn validate_recipient(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "toEmail".to_string(),
        });
    }
    if !is_valid_email(email.trim()) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Caller-supplied public identifiers: `Q-2026-0001`, `ACME-42`, ...
pub fn validate_public_id(public_id: &str) -> Result<(), ValidationError> {
    if public_id.is_empty() || public_id.len() > 50 {
        return Err(ValidationError::InvalidPublicId);
    }

    let is_valid = public_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-');

    if !is_valid || public_id.starts_with('-') || public_id.ends_with('-') {
        return Err(ValidationError::InvalidPublicId);
    }

    Ok(())
}

pub fn validate_currency(code: &str) -> Result<(), ValidationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCurrency(code.to_string()))
    }
}

fn require_all(fields: &[(&str, &str)]) -> Result<(), ValidationError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing.join(" and ")))
    }
}

fn max_len(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Simple email validation
fn is_valid_email(email: &str) -> bool {
    // Basic check: contains @ and at least one .
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);

    !local.is_empty() && !domain.is_empty() && domain.contains('.') && domain.len() > 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn quote(name: &str, customer: &str) -> CreateQuote {
        CreateQuote {
            name: name.to_string(),
            customer: customer.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("user.name@domain.co.za"));
        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("@domain.com"));
        assert!(!is_valid_email("user@"));
    }

    #[test]
    fn test_validate_create_quote_valid() {
        assert!(validate_create_quote(&quote("Managed SOC", "Acme Bank")).is_ok());
    }

    #[test]
    fn test_validate_create_quote_names_missing_fields() {
        assert_eq!(
            validate_create_quote(&quote("  ", "")),
            Err(ValidationError::MissingFields("name and customer".to_string()))
        );
        assert_eq!(
            validate_create_quote(&quote("SOC", "")).unwrap_err().to_string(),
            "customer required"
        );
    }

    #[test]
    fn test_validate_create_quote_invalid_email() {
        let input = CreateQuote {
            contact_email: Some("not-an-email".to_string()),
            ..quote("SOC", "Acme")
        };
        assert_eq!(validate_create_quote(&input), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_validate_items_rejects_negative_amounts() {
        let items = vec![
            NewQuoteItem {
                quantity: Decimal::from(1),
                unit_price: Decimal::from(10),
                ..Default::default()
            },
            NewQuoteItem {
                quantity: Decimal::from(1),
                unit_price: Decimal::from_str("-0.5").unwrap(),
                ..Default::default()
            },
        ];
        assert_eq!(
            validate_items(&items),
            Err(ValidationError::NegativeAmount {
                index: 1,
                field: "unitPrice"
            })
        );
    }

    #[test]
    fn test_validate_items_rejects_huge_amounts() {
        let items = vec![NewQuoteItem {
            quantity: Decimal::from(1_000_000_000_000_000i64),
            unit_price: Decimal::from(1),
            ..Default::default()
        }];
        assert_eq!(
            validate_items(&items),
            Err(ValidationError::AmountTooLarge {
                index: 0,
                field: "quantity"
            })
        );
    }

    #[test]
    fn test_public_id_validation() {
        assert!(validate_public_id("Q-2026-1234").is_ok());
        assert!(validate_public_id("ACME42").is_ok());
        assert!(validate_public_id("-Q").is_err());
        assert!(validate_public_id("Q 2026").is_err());
        assert!(validate_public_id("").is_err());
    }

    #[test]
    fn test_currency_validation() {
        assert!(validate_currency("ZAR").is_ok());
        assert!(validate_currency("XXX").is_ok());
        assert!(validate_currency("RAND").is_err());
        assert!(validate_currency("Z4R").is_err());
    }

    #[test]
    fn test_validate_recipient() {
        assert!(validate_recipient("ops@acme.example").is_ok());
        assert!(matches!(
            validate_recipient(" "),
            Err(ValidationError::Required { .. })
        ));
        assert_eq!(validate_recipient("nope"), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_validate_create_ticket() {
        let input = CreateTicket {
            customer: "Acme".to_string(),
            subject: "".to_string(),
            ..Default::default()
        };
        assert_eq!(
            validate_create_ticket(&input),
            Err(ValidationError::MissingFields("subject".to_string()))
        );
    }

    #[test]
    fn test_validate_total_bound() {
        assert!(validate_total(Decimal::from_str("99999999999999.999999").unwrap()).is_ok());
        assert_eq!(
            validate_total(Decimal::from(1_000_000) * Decimal::from(1_000_000) * Decimal::from(100)),
            Err(ValidationError::TotalTooLarge)
        );
    }
}
