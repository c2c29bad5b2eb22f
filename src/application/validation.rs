use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use ethers::types::{Address, U256};
use ethers::utils::parse_ether;
use serde::{Deserialize, Serialize};

use crate::domain::models::{ScheduleTransferRequest, ValidatedTransfer};

/// Validation error for a user-supplied field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, Vec<ValidationError>>;

/// Validation utilities for scheduling requests
pub struct Validator;

impl Validator {
    /// Validate Ethereum address format
    pub fn validate_ethereum_address(address: &str, field_name: &str) -> Result<Address, ValidationError> {
        if address.is_empty() {
            return Err(ValidationError::new(field_name, "Address cannot be empty"));
        }

        let clean_address = address.strip_prefix("0x").unwrap_or(address);

        if clean_address.len() != 40 {
            return Err(ValidationError::new(
                field_name,
                "Address must be 40 characters long (excluding 0x prefix)",
            ));
        }

        if !clean_address.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::new(
                field_name,
                "Address must contain only hexadecimal characters",
            ));
        }

        address
            .parse::<Address>()
            .map_err(|_| ValidationError::new(field_name, "Invalid Ethereum address format"))
    }

    /// Parse an RFC 3339 timestamp, or a `YYYY-MM-DDTHH:MM` local form read
    /// as UTC, and require it to be strictly after `now`.
    pub fn validate_future_time(
        value: &str,
        field_name: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::new(field_name, format!("{} cannot be empty", field_name)));
        }

        let parsed = DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").map(|naive| Utc.from_utc_datetime(&naive))
            })
            .map_err(|_| ValidationError::new(field_name, format!("{} must be a valid date and time", field_name)))?;

        if parsed <= now {
            return Err(ValidationError::new(field_name, format!("{} must be in the future", field_name)));
        }

        Ok(parsed)
    }

    /// Parse a decimal ether amount into wei; must be positive.
    pub fn validate_ether_amount(value: &str, field_name: &str) -> Result<U256, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::new(field_name, format!("{} cannot be empty", field_name)));
        }

        if value.starts_with('-') {
            return Err(ValidationError::new(field_name, format!("{} cannot be negative", field_name)));
        }

        let wei = parse_ether(value)
            .map_err(|_| ValidationError::new(field_name, format!("{} must be a valid ether amount", field_name)))?;

        if wei.is_zero() {
            return Err(ValidationError::new(field_name, format!("{} must be greater than 0", field_name)));
        }

        Ok(wei)
    }
}

impl ScheduleTransferRequest {
    /// Checks every field, reporting all failures at once.
    pub fn validate(&self, now: DateTime<Utc>) -> ValidationResult<ValidatedTransfer> {
        let recipient = Validator::validate_ethereum_address(&self.recipient, "recipient");
        let send_at = Validator::validate_future_time(&self.send_at, "send_at", now);
        let amount = Validator::validate_ether_amount(&self.amount_eth, "amount_eth");

        match (recipient, send_at, amount) {
            (Ok(recipient), Ok(send_at), Ok(amount_wei)) => Ok(ValidatedTransfer {
                recipient,
                send_at,
                amount_wei,
            }),
            (recipient, send_at, amount) => Err([recipient.err(), send_at.err(), amount.err()]
                .into_iter()
                .flatten()
                .collect()),
        }
    }
}
