//! Record list with search.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;

use lotes_core::animal::filter_animals;

use crate::state::AppState;

use super::{
    flash::{Flash, FlashMessage},
    template::HtmlTemplate,
    AppError,
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

struct RecordRow {
    rowid: i64,
    cells: Vec<String>,
}

#[derive(Template)]
#[template(path = "planilha.html")]
struct PlanilhaTemplate {
    flash: Option<FlashMessage>,
    q: String,
    columns: Vec<String>,
    rows: Vec<RecordRow>,
    total: usize,
}

/// Handler for the record list (GET /planilha).
pub async fn planilha_page(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    flash: Flash,
) -> Result<Response, AppError> {
    let repo = state.repo().await;
    let columns = repo.columns().await?;

    let notice = columns.is_empty().then(|| {
        FlashMessage::info("Nenhuma tabela de animais encontrada. Importe uma planilha em Dados.")
    });

    let records = repo.list_animals().await?;
    let rows: Vec<RecordRow> = filter_animals(&records, &query.q)
        .into_iter()
        .map(|record| RecordRow {
            rowid: record.rowid,
            cells: columns.iter().map(|c| record.text(c)).collect(),
        })
        .collect();

    Ok(flash.consume(HtmlTemplate(PlanilhaTemplate {
        flash: flash.0.clone().or(notice),
        q: query.q,
        columns,
        total: records.len(),
        rows,
    })))
}
