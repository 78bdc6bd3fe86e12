//! Batch grid and status transitions.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};
use serde::Deserialize;

use lotes_core::lote::{
    normalize_gta, partition_by_status, LoteSummary, StatusChange, GTA_PLACEHOLDER,
};

use crate::state::AppState;

use super::{
    flash::{redirect_with_flash, refusal, Flash, FlashMessage},
    template::HtmlTemplate,
    AppError,
};

/// One card of the batch grid.
struct LoteCard {
    numero: i64,
    items: i64,
    status: &'static str,
    done: bool,
    created_at: String,
    gta: String,
}

impl From<&LoteSummary> for LoteCard {
    fn from(lote: &LoteSummary) -> Self {
        Self {
            numero: lote.numero,
            items: lote.items,
            status: lote.status.label(),
            done: lote.status.is_done(),
            created_at: lote.created_at.clone().unwrap_or_default(),
            gta: lote.gta.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "lotes.html")]
struct LotesTemplate {
    flash: Option<FlashMessage>,
    summary: String,
    pending: Vec<LoteCard>,
    completed: Vec<LoteCard>,
    gta_placeholder: &'static str,
}

/// Handler for the batch grid (GET /lotes).
pub async fn list_lotes(
    State(state): State<AppState>,
    flash: Flash,
) -> Result<Response, AppError> {
    let board = partition_by_status(state.repo().await.list_lotes().await?);

    Ok(flash.consume(HtmlTemplate(LotesTemplate {
        flash: flash.0.clone(),
        summary: board.summary_line(),
        pending: board.pending.iter().map(LoteCard::from).collect(),
        completed: board.completed.iter().map(LoteCard::from).collect(),
        gta_placeholder: GTA_PLACEHOLDER,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ConcludeForm {
    #[serde(default)]
    pub gta: Option<String>,
}

/// Marks a batch as completed (POST /lotes/{numero}/concluir).
pub async fn conclude_lote(
    State(state): State<AppState>,
    Path(numero): Path<i64>,
    Form(form): Form<ConcludeForm>,
) -> Result<Response, AppError> {
    let gta = normalize_gta(form.gta.as_deref());
    let change = StatusChange::Conclude { gta: gta.clone() };

    let flash = match state.repo().await.change_status(numero, change).await {
        Ok(_) => FlashMessage::success(match gta {
            Some(gta) => format!("Lote {numero} concluído (GTA {gta})."),
            None => format!("Lote {numero} concluído."),
        }),
        Err(e) => refusal(e)?,
    };

    Ok(redirect_with_flash("/lotes", flash))
}

/// Moves a batch back to pending (POST /lotes/{numero}/reabrir).
pub async fn reopen_lote(
    State(state): State<AppState>,
    Path(numero): Path<i64>,
) -> Result<Response, AppError> {
    let flash = match state
        .repo()
        .await
        .change_status(numero, StatusChange::Reopen)
        .await
    {
        Ok(_) => FlashMessage::success(format!("Lote {numero} reaberto.")),
        Err(e) => refusal(e)?,
    };

    Ok(redirect_with_flash("/lotes", flash))
}
