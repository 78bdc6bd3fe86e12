//! Batch report: HTML preview and PDF download.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::Response,
};

use lotes_core::lote::Lote;
use lotes_core::report::{build_report, Bracket, LoteReport, Sex};
use lotes_core::storage::RepositoryError;

use crate::{pdf::render_report_pdf, state::AppState};

use super::{
    flash::{Flash, FlashMessage},
    template::{attachment, HtmlTemplate, PDF},
    AppError,
};

/// Loads a batch and aggregates its items.
async fn load_report(state: &AppState, numero: i64) -> Result<(Lote, LoteReport), AppError> {
    let repo = state.repo().await;
    let lote = repo
        .get_lote(numero)
        .await?
        .ok_or_else(|| RepositoryError::NotFound {
            entity_type: "Lote",
            id: numero.to_string(),
        })?;

    let columns = repo.columns().await?;
    let items = repo.lote_items(numero).await?;
    let report = build_report(&columns, &items);
    tracing::debug!(lote = numero, items = items.len(), rows = report.row_count(), "report built");

    Ok((lote, report))
}

struct RowView {
    serie: String,
    lacre: String,
    proprietario: String,
    cells: Vec<i64>,
}

#[derive(Template)]
#[template(path = "imprimir.html")]
struct ImprimirTemplate {
    flash: Option<FlashMessage>,
    numero: i64,
    status: &'static str,
    completed_at: String,
    gta: String,
    brackets: Vec<&'static str>,
    rows: Vec<RowView>,
    totals: Vec<i64>,
    total_m: i64,
    total_f: i64,
    row_count: usize,
}

/// Handler for the report preview (GET /lotes/{numero}/imprimir).
pub async fn report_page(
    State(state): State<AppState>,
    Path(numero): Path<i64>,
    flash: Flash,
) -> Result<Response, AppError> {
    let (lote, report) = load_report(&state, numero).await?;

    Ok(flash.consume(HtmlTemplate(ImprimirTemplate {
        flash: flash.0.clone(),
        numero,
        status: lote.status.label(),
        completed_at: lote.completed_at.unwrap_or_default(),
        gta: lote.gta.unwrap_or_default(),
        brackets: Bracket::ALL.iter().map(|b| b.label()).collect(),
        rows: report
            .rows
            .iter()
            .map(|row| RowView {
                serie: row.serie.clone(),
                lacre: row.lacre.clone(),
                proprietario: row.proprietario.clone(),
                cells: row.cells(),
            })
            .collect(),
        totals: report.total_cells(),
        total_m: report.grand_total(Sex::M),
        total_f: report.grand_total(Sex::F),
        row_count: report.row_count(),
    })))
}

/// Handler for the PDF download (GET /lotes/{numero}/pdf).
pub async fn report_pdf(
    State(state): State<AppState>,
    Path(numero): Path<i64>,
) -> Result<Response, AppError> {
    let (_, report) = load_report(&state, numero).await?;

    let bytes = tokio::task::spawn_blocking(move || render_report_pdf(numero, &report)).await??;
    tracing::info!(lote = numero, bytes = bytes.len(), "report pdf rendered");

    Ok(attachment(PDF, &format!("Lote_{numero}.pdf"), bytes))
}
