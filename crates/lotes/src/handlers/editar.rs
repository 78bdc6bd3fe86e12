//! Single record editor.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::Response,
    Form,
};
use serde::Deserialize;

use lotes_core::animal::{
    coerce_submitted, pick_column, AnimalError, CellValue, EditInput, COL_SERIE, SERIE_CANDIDATES,
};

use crate::state::AppState;

use super::{
    flash::{redirect_with_flash, refusal, Flash, FlashMessage},
    template::HtmlTemplate,
    AppError,
};

struct FieldView {
    name: String,
    html_type: &'static str,
    step: &'static str,
    value: String,
}

impl FieldView {
    fn new(name: &str, value: &CellValue) -> Self {
        let input = EditInput::for_value(value);
        Self {
            name: name.to_string(),
            html_type: input.html_type(),
            step: input.step(),
            value: input.initial(),
        }
    }
}

/// An option of the record picker.
struct RecordChoice {
    rowid: i64,
    serie: String,
    selected: bool,
}

#[derive(Template)]
#[template(path = "editar.html")]
struct EditarTemplate {
    flash: Option<FlashMessage>,
    rowid_input: String,
    rowid: Option<i64>,
    lotes: String,
    fields: Vec<FieldView>,
    choices: Vec<RecordChoice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditarQuery {
    pub rowid: Option<String>,
}

/// Handler for the record editor (GET /editar).
pub async fn editar_page(
    State(state): State<AppState>,
    Query(query): Query<EditarQuery>,
    flash: Flash,
) -> Result<Response, AppError> {
    let repo = state.repo().await;
    let rowid_input = query.rowid.unwrap_or_default().trim().to_string();
    let mut notice = None;
    let mut rowid = None;
    let mut fields = Vec::new();
    let mut lotes = String::new();

    if !rowid_input.is_empty() {
        match rowid_input.parse::<i64>() {
            Ok(id) => {
                match repo.get_animal(id).await? {
                    Some(record) => {
                        rowid = Some(id);
                        fields = record
                            .fields
                            .iter()
                            .map(|(name, value)| FieldView::new(name, value))
                            .collect();
                        lotes = repo
                            .lotes_of_animal(id)
                            .await?
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", ");
                    }
                    None => {
                        notice = Some(FlashMessage::info(format!(
                            "Registro {id} não encontrado."
                        )));
                    }
                }
            }
            Err(_) => notice = Some(FlashMessage::error("Informe um rowid numérico.")),
        }
    }

    let columns = repo.columns().await?;
    let serie = pick_column(&SERIE_CANDIDATES, &columns).unwrap_or(COL_SERIE);
    let choices = repo
        .list_animals()
        .await?
        .iter()
        .map(|record| RecordChoice {
            rowid: record.rowid,
            serie: record.text(serie),
            selected: rowid == Some(record.rowid),
        })
        .collect();

    Ok(flash.consume(HtmlTemplate(EditarTemplate {
        flash: flash.0.clone().or(notice),
        rowid_input,
        rowid,
        lotes,
        fields,
        choices,
    })))
}

/// Coerces submitted form values against the stored record.
fn coerce_form(
    record: &[(String, CellValue)],
    submitted: &[(String, String)],
) -> Result<Vec<(String, CellValue)>, AnimalError> {
    submitted
        .iter()
        .map(|(name, raw)| {
            let original = record
                .iter()
                .find(|(column, _)| column == name)
                .map(|(_, value)| value)
                .ok_or_else(|| AnimalError::UnknownColumn(name.clone()))?;
            Ok((name.clone(), coerce_submitted(name, original, raw)?))
        })
        .collect()
}

/// Saves the editor form (POST /editar/{rowid}).
pub async fn update_animal(
    State(state): State<AppState>,
    Path(rowid): Path<i64>,
    Form(submitted): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let back = format!("/editar?rowid={rowid}");
    let repo = state.repo().await;

    let Some(record) = repo.get_animal(rowid).await? else {
        return Ok(redirect_with_flash(
            "/editar",
            FlashMessage::info(format!("Registro {rowid} não encontrado.")),
        ));
    };

    let values = match coerce_form(&record.fields, &submitted) {
        Ok(values) => values,
        Err(e) => return Ok(redirect_with_flash(&back, FlashMessage::info(e.to_string()))),
    };

    let flash = match repo.update_animal(rowid, &values).await {
        Ok(()) => {
            tracing::info!(rowid, columns = values.len(), "animal updated");
            FlashMessage::success(format!("Registro {rowid} atualizado."))
        }
        Err(e) => refusal(e)?,
    };

    Ok(redirect_with_flash(&back, flash))
}
