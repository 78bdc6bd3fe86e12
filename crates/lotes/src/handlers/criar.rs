//! Creating a batch and managing its items.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::Response,
    Form,
};
use serde::Deserialize;

use lotes_core::animal::{
    pick_column, AnimalRecord, COL_LACRE, COL_MUNICIPIO, COL_PROPRIETARIO, COL_SERIE,
    LACRE_CANDIDATES, OWNER_CANDIDATES, SERIE_CANDIDATES,
};
use lotes_core::lote::{validate_numero, Lote};

use crate::state::AppState;

use super::{
    flash::{redirect_with_flash, refusal, Flash, FlashMessage},
    template::HtmlTemplate,
    AppError,
};

/// Columns used to describe an animal on this page, resolved against the
/// current table.
struct ItemColumns {
    serie: &'static str,
    lacre: &'static str,
    proprietario: &'static str,
}

impl ItemColumns {
    fn resolve(columns: &[String]) -> Self {
        Self {
            serie: pick_column(&SERIE_CANDIDATES, columns).unwrap_or(COL_SERIE),
            lacre: pick_column(&LACRE_CANDIDATES, columns).unwrap_or(COL_LACRE),
            proprietario: pick_column(&OWNER_CANDIDATES, columns).unwrap_or(COL_PROPRIETARIO),
        }
    }
}

struct ItemView {
    rowid: i64,
    serie: String,
    lacre: String,
    proprietario: String,
    municipio: String,
}

impl ItemView {
    fn new(record: &AnimalRecord, columns: &ItemColumns) -> Self {
        Self {
            rowid: record.rowid,
            serie: record.text(columns.serie),
            lacre: record.text(columns.lacre),
            proprietario: record.text(columns.proprietario),
            municipio: record.text(COL_MUNICIPIO),
        }
    }
}

/// Where a search hit stands relative to the selected batch.
enum Placement {
    Available,
    InThisLote,
    InOtherLotes(String),
}

struct SearchHit {
    item: ItemView,
    placement: Placement,
}

impl SearchHit {
    fn available(&self) -> bool {
        matches!(self.placement, Placement::Available)
    }

    fn in_this_lote(&self) -> bool {
        matches!(self.placement, Placement::InThisLote)
    }

    fn other_lotes(&self) -> &str {
        match &self.placement {
            Placement::InOtherLotes(lotes) => lotes,
            _ => "",
        }
    }
}

#[derive(Template)]
#[template(path = "criar.html")]
struct CriarTemplate {
    flash: Option<FlashMessage>,
    numero_input: String,
    lacre: String,
    /// Selected batch number, when valid.
    numero: Option<i64>,
    lote: Option<Lote>,
    searched: bool,
    hits: Vec<SearchHit>,
    items: Vec<ItemView>,
}

impl CriarTemplate {
    fn lote_status(&self) -> &'static str {
        self.lote.as_ref().map(|l| l.status.label()).unwrap_or("")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CriarQuery {
    pub numero: Option<String>,
    pub lacre: Option<String>,
}

/// Handler for the batch editor (GET /lotes/criar).
pub async fn criar_page(
    State(state): State<AppState>,
    Query(query): Query<CriarQuery>,
    flash: Flash,
) -> Result<Response, AppError> {
    let repo = state.repo().await;
    let numero_input = query.numero.unwrap_or_default().trim().to_string();
    let lacre = query.lacre.unwrap_or_default().trim().to_string();

    let mut notice = None;
    let numero = if numero_input.is_empty() {
        None
    } else {
        let parsed = numero_input
            .parse::<i64>()
            .ok()
            .and_then(|n| validate_numero(n).ok());
        if parsed.is_none() {
            notice = Some(FlashMessage::error("Informe um número de lote válido."));
        }
        parsed
    };

    let columns = ItemColumns::resolve(&repo.columns().await?);

    let (lote, items) = match numero {
        Some(n) => {
            let lote = repo.get_lote(n).await?;
            let items = repo.lote_items(n).await?;
            if notice.is_none() && lote.is_none() {
                notice = Some(FlashMessage::info(format!(
                    "Lote {n} ainda não existe. Você pode criar e adicionar lacres."
                )));
            }
            (lote, items)
        }
        None => (None, Vec::new()),
    };

    let mut hits = Vec::new();
    if !lacre.is_empty() {
        for record in repo.find_by_lacre(&lacre).await? {
            let current = repo.lotes_of_animal(record.rowid).await?;
            let placement = if numero.is_some_and(|n| current.contains(&n)) {
                Placement::InThisLote
            } else if current.is_empty() {
                Placement::Available
            } else {
                let lotes: Vec<String> = current.iter().map(ToString::to_string).collect();
                Placement::InOtherLotes(lotes.join(", "))
            };
            hits.push(SearchHit {
                item: ItemView::new(&record, &columns),
                placement,
            });
        }
    }

    Ok(flash.consume(HtmlTemplate(CriarTemplate {
        flash: flash.0.clone().or(notice),
        numero_input,
        searched: !lacre.is_empty(),
        lacre,
        numero,
        lote,
        hits,
        items: items.iter().map(|r| ItemView::new(r, &columns)).collect(),
    })))
}

/// URL of the batch editor for `numero`, keeping the tag search.
fn criar_url(numero: i64, lacre: Option<&str>) -> String {
    match lacre.map(str::trim).filter(|l| !l.is_empty()) {
        Some(lacre) => format!(
            "/lotes/criar?numero={numero}&lacre={}",
            urlencoding::encode(lacre)
        ),
        None => format!("/lotes/criar?numero={numero}"),
    }
}

#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    pub rowid: i64,
    #[serde(default)]
    pub lacre: Option<String>,
}

/// Links an animal to a batch, creating the batch if needed
/// (POST /lotes/{numero}/itens).
pub async fn add_item(
    State(state): State<AppState>,
    Path(numero): Path<i64>,
    Form(form): Form<AddItemForm>,
) -> Result<Response, AppError> {
    let flash = match state.repo().await.add_item(numero, form.rowid).await {
        Ok(()) => FlashMessage::success(format!("Item inserido no lote {numero}.")),
        Err(e) => refusal(e)?,
    };

    Ok(redirect_with_flash(
        &criar_url(numero, form.lacre.as_deref()),
        flash,
    ))
}

/// Unlinks an animal (POST /lotes/{numero}/itens/{rowid}/remover).
pub async fn remove_item(
    State(state): State<AppState>,
    Path((numero, rowid)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    let flash = match state.repo().await.remove_item(numero, rowid).await {
        Ok(()) => FlashMessage::success("Item removido do lote."),
        Err(e) => refusal(e)?,
    };

    Ok(redirect_with_flash(&criar_url(numero, None), flash))
}

/// Records a batch before any item is linked (POST /lotes/{numero}/salvar).
pub async fn save_lote(
    State(state): State<AppState>,
    Path(numero): Path<i64>,
) -> Result<Response, AppError> {
    let flash = match state.repo().await.ensure_lote(numero).await {
        Ok(()) => FlashMessage::success(format!("Lote {numero} salvo.")),
        Err(e) => refusal(e)?,
    };

    Ok(redirect_with_flash(&criar_url(numero, None), flash))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteLoteForm {
    #[serde(default)]
    pub confirmar: Option<String>,
}

/// Deletes a batch and its links (POST /lotes/{numero}/excluir).
///
/// Requires the confirmation checkbox.
pub async fn delete_lote(
    State(state): State<AppState>,
    Path(numero): Path<i64>,
    Form(form): Form<DeleteLoteForm>,
) -> Result<Response, AppError> {
    if form.confirmar.is_none() {
        return Ok(redirect_with_flash(
            &criar_url(numero, None),
            FlashMessage::info("Marque a confirmação para excluir o lote."),
        ));
    }

    match state.repo().await.delete_lote(numero).await {
        Ok(()) => Ok(redirect_with_flash(
            "/lotes/criar",
            FlashMessage::success(format!(
                "Lote {numero} e todos os seus itens foram excluídos."
            )),
        )),
        Err(e) => Ok(redirect_with_flash(&criar_url(numero, None), refusal(e)?)),
    }
}
