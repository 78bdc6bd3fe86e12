//! Duplicate tags and their CSV exports.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::Response,
};

use lotes_core::animal::AnimalRecord;
use lotes_core::duplicates::{display_columns, filter_groups, sort_groups, summarize};
use lotes_core::export::{duplicates_csv, group_csv, group_file_name};
use lotes_core::storage::RepositoryError;

use crate::state::AppState;

use super::{
    flash::{Flash, FlashMessage},
    planilha::SearchQuery,
    template::{attachment, HtmlTemplate, CSV},
    AppError,
};

struct GroupView {
    lacre: String,
    count: i64,
    csv_url: String,
    rows: Vec<Vec<String>>,
}

#[derive(Template)]
#[template(path = "duplicatas.html")]
struct DuplicatasTemplate {
    flash: Option<FlashMessage>,
    q: String,
    distinct_tags: usize,
    duplicate_rows: i64,
    columns: Vec<String>,
    groups: Vec<GroupView>,
}

/// Handler for the duplicate tag list (GET /duplicatas).
pub async fn duplicatas_page(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    flash: Flash,
) -> Result<Response, AppError> {
    let repo = state.repo().await;
    let groups = repo.duplicate_groups().await?;
    let summary = summarize(&groups);

    let mut shown = filter_groups(groups, &query.q);
    sort_groups(&mut shown);

    let columns = display_columns(&repo.columns().await?);
    let mut views = Vec::with_capacity(shown.len());
    for group in shown {
        let records = repo.animals_with_tag(&group.lacre).await?;
        views.push(GroupView {
            csv_url: format!("/duplicatas/{}.csv", urlencoding::encode(&group.lacre)),
            rows: records
                .iter()
                .map(|r| columns.iter().map(|c| r.display(c)).collect())
                .collect(),
            lacre: group.lacre,
            count: group.count,
        });
    }

    Ok(flash.consume(HtmlTemplate(DuplicatasTemplate {
        flash: flash.0.clone(),
        q: query.q,
        distinct_tags: summary.distinct_tags,
        duplicate_rows: summary.rows,
        columns,
        groups: views,
    })))
}

/// CSV of every duplicate row (GET /duplicatas.csv).
pub async fn duplicatas_csv(State(state): State<AppState>) -> Result<Response, AppError> {
    let repo = state.repo().await;
    let columns = repo.columns().await?;

    let mut groups: Vec<(String, Vec<AnimalRecord>)> = Vec::new();
    for group in repo.duplicate_groups().await? {
        let records = repo.animals_with_tag(&group.lacre).await?;
        groups.push((group.lacre, records));
    }

    let bytes = duplicates_csv(&columns, &groups)?;
    Ok(attachment(CSV, "duplicatas.csv", bytes))
}

/// CSV of one duplicate group (GET /duplicatas/{lacre}.csv).
pub async fn group_csv_download(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, AppError> {
    let lacre = file.strip_suffix(".csv").ok_or_else(|| RepositoryError::NotFound {
        entity_type: "Arquivo",
        id: file.clone(),
    })?;

    let repo = state.repo().await;
    let records = repo.animals_with_tag(lacre).await?;
    if records.is_empty() {
        return Err(RepositoryError::NotFound {
            entity_type: "Lacre",
            id: lacre.to_string(),
        }
        .into());
    }

    let bytes = group_csv(&repo.columns().await?, &records)?;
    Ok(attachment(CSV, &group_file_name(lacre), bytes))
}
