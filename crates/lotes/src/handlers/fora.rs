//! Animals with no batch link.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Response,
};

use lotes_core::animal::{filter_outside, OutsideRow};
use lotes_core::export::outside_csv;

use crate::state::AppState;

use super::{
    flash::{Flash, FlashMessage},
    planilha::SearchQuery,
    template::{attachment, HtmlTemplate, CSV},
    AppError,
};

#[derive(Template)]
#[template(path = "fora.html")]
struct ForaTemplate {
    flash: Option<FlashMessage>,
    q: String,
    csv_url: String,
    rows: Vec<OutsideRow>,
    total: usize,
}

/// Handler for the outside-batch list (GET /fora).
pub async fn fora_page(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    flash: Flash,
) -> Result<Response, AppError> {
    let outside = state.repo().await.animals_outside_lotes().await?;
    let total = outside.len();
    let rows = filter_outside(outside, &query.q);

    Ok(flash.consume(HtmlTemplate(ForaTemplate {
        flash: flash.0.clone(),
        csv_url: format!("/fora.csv?q={}", urlencoding::encode(&query.q)),
        q: query.q,
        rows,
        total,
    })))
}

/// CSV of the filtered outside-batch list (GET /fora.csv).
pub async fn fora_csv(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let outside = state.repo().await.animals_outside_lotes().await?;
    let rows = filter_outside(outside, &query.q);
    let bytes = outside_csv(&rows)?;

    Ok(attachment(CSV, "animais_fora_de_lote.csv", bytes))
}
