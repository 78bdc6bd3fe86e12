use thiserror::Error;

/// Errors raised while editing an animal record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnimalError {
    #[error("Coluna desconhecida: {0}")]
    UnknownColumn(String),
    #[error("Valor inteiro inválido para \"{column}\": {value}")]
    InvalidInteger { column: String, value: String },
    #[error("Valor numérico inválido para \"{column}\": {value}")]
    InvalidNumber { column: String, value: String },
    #[error("Data inválida para \"{column}\": {value}")]
    InvalidDate { column: String, value: String },
}
