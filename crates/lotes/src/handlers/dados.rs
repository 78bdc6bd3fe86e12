//! Spreadsheet import: upload, preview and save.

use askama::Template;
use axum::{
    extract::{Multipart, State},
    response::Response,
    Form,
};
use serde::Deserialize;
use uuid::Uuid;

use lotes_core::animal::REQUIRED_COLUMNS;

use crate::{import::read_import, state::AppState};

use super::{
    flash::{redirect_with_flash, Flash, FlashMessage},
    template::HtmlTemplate,
    AppError,
};

/// Rows shown in the preview table.
const PREVIEW_ROWS: usize = 50;

struct PreviewView {
    token: String,
    file_name: String,
    row_count: usize,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Template)]
#[template(path = "dados.html")]
struct DadosTemplate {
    flash: Option<FlashMessage>,
    required: Vec<&'static str>,
    preview: Option<PreviewView>,
}

/// Handler for the import page (GET /dados).
pub async fn dados_page(
    State(state): State<AppState>,
    flash: Flash,
) -> Result<Response, AppError> {
    let preview = state.pending_import().await.map(|pending| PreviewView {
        token: pending.token.to_string(),
        file_name: pending.file_name,
        row_count: pending.table.row_count(),
        rows: pending
            .table
            .preview(PREVIEW_ROWS)
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect(),
        columns: pending.table.columns,
    });

    Ok(flash.consume(HtmlTemplate(DadosTemplate {
        flash: flash.0.clone(),
        required: REQUIRED_COLUMNS.to_vec(),
        preview,
    })))
}

/// Reads the `arquivo` field of a multipart upload.
///
/// An empty file input counts as no file.
pub(super) async fn read_file_field(
    multipart: &mut Multipart,
    fields: &mut Vec<(String, String)>,
) -> Result<Option<(String, Vec<u8>)>, AppError> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "arquivo" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            if !file_name.is_empty() && !bytes.is_empty() {
                file = Some((file_name, bytes.to_vec()));
            }
        } else {
            let value = field.text().await?;
            fields.push((name, value));
        }
    }
    Ok(file)
}

/// Parses an upload and keeps it for preview (POST /dados/previa).
pub async fn preview_import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let Some((file_name, bytes)) = read_file_field(&mut multipart, &mut Vec::new()).await? else {
        return Ok(redirect_with_flash(
            "/dados",
            FlashMessage::info("Selecione um arquivo para importar."),
        ));
    };

    let name = file_name.clone();
    let parsed = tokio::task::spawn_blocking(move || read_import(&name, &bytes)).await?;

    let flash = match parsed {
        Ok(table) => {
            let rows = table.row_count();
            state.stash_import(file_name.clone(), table).await;
            tracing::info!(file = %file_name, rows, "import previewed");
            FlashMessage::success(format!(
                "Arquivo {file_name} lido: {rows} linha(s). Confira a prévia e salve."
            ))
        }
        Err(e) => {
            tracing::info!(file = %file_name, error = %e, "import refused");
            FlashMessage::info(e.to_string())
        }
    };

    Ok(redirect_with_flash("/dados", flash))
}

#[derive(Debug, Deserialize)]
pub struct SaveImportForm {
    pub token: String,
}

/// Replaces the `animais` table with the previewed data (POST /dados/salvar).
pub async fn save_import(
    State(state): State<AppState>,
    Form(form): Form<SaveImportForm>,
) -> Result<Response, AppError> {
    let pending = match Uuid::parse_str(form.token.trim()) {
        Ok(token) => state.take_import(token).await,
        Err(_) => None,
    };
    let Some(pending) = pending else {
        return Ok(redirect_with_flash(
            "/dados",
            FlashMessage::info("A prévia expirou. Envie o arquivo novamente."),
        ));
    };

    let rows = state
        .repo()
        .await
        .replace_animals(&pending.table)
        .await?;
    tracing::info!(file = %pending.file_name, rows, "animais table replaced");

    Ok(redirect_with_flash(
        "/dados",
        FlashMessage::success(format!(
            "Tabela de animais substituída com {rows} registro(s) de {}.",
            pending.file_name
        )),
    ))
}
