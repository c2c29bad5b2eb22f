use thiserror::Error;

use crate::application::validation::ValidationError;
use crate::infrastructure::contracts::types::ContractError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid request: {}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Contract(#[from] ContractError),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Vec<ValidationError>> for ServiceError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ServiceError::Validation(errors)
    }
}
