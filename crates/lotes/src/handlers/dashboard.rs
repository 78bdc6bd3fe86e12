//! Home page.

use askama::Template;
use axum::{extract::State, response::Response};

use lotes_core::backup::FileInfo;
use lotes_core::dashboard::{DashboardStats, HeadTotals};

use crate::state::AppState;

use super::{
    flash::{Flash, FlashMessage},
    template::HtmlTemplate,
    AppError,
};

/// Head count sums rendered without a trailing `.0` when they are whole.
struct HeadTotalsView {
    male: String,
    female: String,
    all: String,
}

impl From<HeadTotals> for HeadTotalsView {
    fn from(totals: HeadTotals) -> Self {
        Self {
            male: format_count(totals.male),
            female: format_count(totals.female),
            all: format_count(totals.all),
        }
    }
}

fn format_count(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    flash: Option<FlashMessage>,
    stats: DashboardStats,
    head_totals: Option<HeadTotalsView>,
    last_backup: Option<FileInfo>,
    database_size: String,
}

/// Handler for the home page (GET /).
pub async fn dashboard(
    State(state): State<AppState>,
    flash: Flash,
) -> Result<Response, AppError> {
    let stats = state.repo().await.dashboard_stats().await?;
    let last_backup = state.backups.last_backup().await;
    let database_size = state
        .backups
        .database_info()
        .await
        .map(|info| info.size_label())
        .unwrap_or_else(|| "—".to_string());

    Ok(flash.consume(HtmlTemplate(DashboardTemplate {
        flash: flash.0.clone(),
        head_totals: stats.head_totals.map(HeadTotalsView::from),
        stats,
        last_backup,
        database_size,
    })))
}
