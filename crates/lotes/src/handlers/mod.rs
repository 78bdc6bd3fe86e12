pub mod backup;
pub mod criar;
pub mod dados;
pub mod dashboard;
pub mod duplicatas;
pub mod editar;
pub mod error;
pub mod flash;
pub mod fora;
pub mod health;
pub mod imprimir;
pub mod lotes;
pub mod planilha;
pub mod template;

pub use error::AppError;
