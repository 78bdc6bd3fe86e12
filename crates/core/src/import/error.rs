use thiserror::Error;

/// Errors raised while reading an uploaded spreadsheet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Tipo de arquivo não suportado: {0}")]
    UnsupportedFormat(String),
    #[error("Colunas obrigatórias faltando no arquivo: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Nenhuma tabela encontrada no arquivo")]
    NoTable,
    #[error("Erro ao processar o arquivo: {0}")]
    Unreadable(String),
}
