use thiserror::Error;

/// Errors raised by batch operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoteError {
    #[error("Número de lote inválido: {0} (use um inteiro maior ou igual a 1)")]
    InvalidNumber(i64),
    #[error("Animal já está no lote {0}")]
    AlreadyInLote(i64),
    #[error("Animal já pertence ao(s) lote(s): {}", format_numbers(.0))]
    InOtherLotes(Vec<i64>),
}

fn format_numbers(numbers: &[i64]) -> String {
    numbers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
