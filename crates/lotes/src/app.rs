use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    handlers::{
        backup::{backup_page, download_database, restore_database},
        criar::{add_item, criar_page, delete_lote, remove_item, save_lote},
        dados::{dados_page, preview_import, save_import},
        dashboard::dashboard,
        duplicatas::{duplicatas_csv, duplicatas_page, group_csv_download},
        editar::{editar_page, update_animal},
        fora::{fora_csv, fora_page},
        health::{healthz, livez},
        imprimir::{report_page, report_pdf},
        lotes::{conclude_lote, list_lotes, reopen_lote},
        planilha::planilha_page,
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/", get(dashboard))
        .route("/lotes", get(list_lotes))
        .route("/lotes/criar", get(criar_page))
        .route("/lotes/{numero}/concluir", post(conclude_lote))
        .route("/lotes/{numero}/reabrir", post(reopen_lote))
        .route("/lotes/{numero}/salvar", post(save_lote))
        .route("/lotes/{numero}/itens", post(add_item))
        .route("/lotes/{numero}/itens/{rowid}/remover", post(remove_item))
        .route("/lotes/{numero}/excluir", post(delete_lote))
        .route("/lotes/{numero}/imprimir", get(report_page))
        .route("/lotes/{numero}/pdf", get(report_pdf))
        .route("/planilha", get(planilha_page))
        .route("/editar", get(editar_page))
        .route("/editar/{rowid}", post(update_animal))
        .route("/duplicatas", get(duplicatas_page))
        .route("/duplicatas.csv", get(duplicatas_csv))
        .route("/duplicatas/{file}", get(group_csv_download))
        .route("/fora", get(fora_page))
        .route("/fora.csv", get(fora_csv))
        .route("/dados", get(dados_page))
        .route("/dados/previa", post(preview_import))
        .route("/dados/salvar", post(save_import))
        .route("/backup", get(backup_page))
        .route("/backup/download", get(download_database))
        .route("/backup/restaurar", post(restore_database))
        .route("/livez", get(livez))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, Response},
    };
    use http_body_util::BodyExt;
    use lotes_core::animal::{CellValue, REQUIRED_COLUMNS};
    use lotes_core::import::ImportTable;
    use tower::ServiceExt;

    const TEST_COLUMNS: [&str; 4] = ["N.º Série", "Lacre", "Proprietário Origem", "M 13 - 24"];

    async fn seeded_state(dir: &std::path::Path) -> AppState {
        let state = AppState::for_tests(dir).await;
        let row = |serie: i64, lacre: i64, owner: &str, males: i64| {
            vec![
                CellValue::Integer(serie),
                CellValue::Integer(lacre),
                CellValue::from(owner),
                CellValue::Integer(males),
            ]
        };
        let table = ImportTable {
            columns: TEST_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: vec![
                row(1, 100, "Ana", 2),
                row(2, 101, "Bruno", 5),
                row(3, 100, "Carla", 1),
            ],
        };
        state.repo().await.replace_animals(&table).await.unwrap();
        state
    }

    async fn get(app: &Router, uri: &str) -> Response<Body> {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_form(app: &Router, uri: &str, body: &str) -> Response<Body> {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_bytes(response: Response<Body>) -> Vec<u8> {
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    async fn body_text(response: Response<Body>) -> String {
        String::from_utf8(body_bytes(response).await).unwrap()
    }

    fn location(response: &Response<Body>) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn test_pages_render_on_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(AppState::for_tests(dir.path()).await);

        for uri in [
            "/",
            "/lotes",
            "/lotes/criar",
            "/planilha",
            "/editar",
            "/duplicatas",
            "/fora",
            "/dados",
            "/backup",
            "/livez",
            "/healthz",
        ] {
            let response = get(&app, uri).await;
            assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        }
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(seeded_state(dir.path()).await);

        let html = body_text(get(&app, "/").await).await;

        assert!(html.contains("Bem-vindo ao painel principal"));
        assert!(html.contains("Ver duplicatas"));
    }

    #[tokio::test]
    async fn test_healthz_reports_database() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(AppState::for_tests(dir.path()).await);

        let response = get(&app, "/healthz").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["healthy"], true);
    }

    #[tokio::test]
    async fn test_batch_flow_from_item_to_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let state = seeded_state(dir.path()).await;
        let app = create_app(state.clone());

        let response = post_form(&app, "/lotes/3/itens", "rowid=2&lacre=101").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/lotes/criar?numero=3&lacre=101");
        assert!(response.headers().get(header::SET_COOKIE).is_some());
        assert_eq!(state.repo().await.lotes_of_animal(2).await.unwrap(), vec![3]);

        let html = body_text(get(&app, "/lotes").await).await;
        assert!(html.contains("Lote #3"));

        let html = body_text(get(&app, "/lotes/criar?numero=3&lacre=101").await).await;
        assert!(html.contains("Bruno"));
        assert!(html.contains("salvo neste lote"));

        let html = body_text(get(&app, "/lotes/3/imprimir").await).await;
        assert!(html.contains("Total de linhas (lacre): 1"));
        assert!(html.contains("GTA de Saída"));

        let response = get(&app, "/lotes/3/pdf").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        assert!(body_bytes(response).await.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_item_in_other_batch_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let state = seeded_state(dir.path()).await;
        let app = create_app(state.clone());

        post_form(&app, "/lotes/1/itens", "rowid=1").await;
        let response = post_form(&app, "/lotes/2/itens", "rowid=1").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.contains("info"));
        assert_eq!(state.repo().await.lotes_of_animal(1).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_conclude_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let state = seeded_state(dir.path()).await;
        let app = create_app(state.clone());
        post_form(&app, "/lotes/5/itens", "rowid=1").await;

        let response = post_form(&app, "/lotes/5/concluir", "gta=123-A").await;
        assert_eq!(location(&response), "/lotes");
        let lote = state.repo().await.get_lote(5).await.unwrap().unwrap();
        assert!(lote.status.is_done());
        assert_eq!(lote.gta.as_deref(), Some("123-A"));

        post_form(&app, "/lotes/5/reabrir", "").await;
        let lote = state.repo().await.get_lote(5).await.unwrap().unwrap();
        assert!(!lote.status.is_done());
        assert_eq!(lote.gta, None);
    }

    #[tokio::test]
    async fn test_conclude_unknown_batch_flashes_info() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(AppState::for_tests(dir.path()).await);

        let response = post_form(&app, "/lotes/42/concluir", "gta=").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers().get(header::SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let state = seeded_state(dir.path()).await;
        let app = create_app(state.clone());
        post_form(&app, "/lotes/7/itens", "rowid=1").await;

        post_form(&app, "/lotes/7/excluir", "").await;
        assert!(state.repo().await.get_lote(7).await.unwrap().is_some());

        let response = post_form(&app, "/lotes/7/excluir", "confirmar=1").await;
        assert_eq!(location(&response), "/lotes/criar");
        assert!(state.repo().await.get_lote(7).await.unwrap().is_none());
        assert!(state.repo().await.lotes_of_animal(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_of_unknown_batch_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(AppState::for_tests(dir.path()).await);

        assert_eq!(get(&app, "/lotes/99/imprimir").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(get(&app, "/lotes/99/pdf").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_flash_cookie_is_shown_once() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(AppState::for_tests(dir.path()).await);
        let flash = crate::handlers::flash::FlashMessage::success("Tudo certo por aqui");
        let cookie = flash.to_set_cookie_header();
        let cookie = cookie.split(';').next().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/lotes")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let cleared = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cleared.contains("Max-Age=0"));
        assert!(body_text(response).await.contains("Tudo certo por aqui"));
    }

    #[tokio::test]
    async fn test_planilha_search() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(seeded_state(dir.path()).await);

        let html = body_text(get(&app, "/planilha?q=bruno").await).await;

        assert!(html.contains("Bruno"));
        assert!(!html.contains("Carla"));
        assert!(html.contains("1 de 3 registro(s)."));
    }

    #[tokio::test]
    async fn test_edit_record() {
        let dir = tempfile::tempdir().unwrap();
        let state = seeded_state(dir.path()).await;
        let app = create_app(state.clone());

        let html = body_text(get(&app, "/editar?rowid=2").await).await;
        assert!(html.contains("type=\"number\""));
        assert!(html.contains("Ou selecione o registro"));
        assert!(html.contains("<option value=\"1\">1 · 1</option>"));
        assert!(html.contains("<option value=\"2\" selected>2 · 2</option>"));

        let response = post_form(&app, "/editar/2", "Lacre=555").await;
        assert_eq!(location(&response), "/editar?rowid=2");
        let record = state.repo().await.get_animal(2).await.unwrap().unwrap();
        assert_eq!(record.get("Lacre"), Some(&CellValue::Integer(555)));

        post_form(&app, "/editar/2", "Lacre=abc").await;
        let record = state.repo().await.get_animal(2).await.unwrap().unwrap();
        assert_eq!(record.get("Lacre"), Some(&CellValue::Integer(555)));
    }

    #[tokio::test]
    async fn test_duplicates_page_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(seeded_state(dir.path()).await);

        let html = body_text(get(&app, "/duplicatas").await).await;
        assert!(html.contains("Lacre 100"));
        assert!(!html.contains("Lacre 101"));

        let response = get(&app, "/duplicatas.csv").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = body_bytes(response).await;
        assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert_eq!(text.lines().count(), 3);

        assert_eq!(get(&app, "/duplicatas/100.csv").await.status(), StatusCode::OK);
        assert_eq!(
            get(&app, "/duplicatas/999.csv").await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_outside_batches_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let state = seeded_state(dir.path()).await;
        let app = create_app(state.clone());
        post_form(&app, "/lotes/1/itens", "rowid=1").await;

        let html = body_text(get(&app, "/fora").await).await;
        assert!(html.contains("2 de 2 animal(is)"));
        assert!(!html.contains("Ana"));

        let response = get(&app, "/fora.csv?q=carla").await;
        let bytes = body_bytes(response).await;
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("Carla"));
    }

    fn import_html() -> String {
        let header: String = REQUIRED_COLUMNS
            .iter()
            .map(|c| format!("<th>{c}</th>"))
            .collect();
        let row: String = REQUIRED_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, _)| format!("<td>{i}</td>"))
            .collect();
        format!("<table><tr>{header}</tr><tr>{row}</tr><tr>{row}</tr></table>")
    }

    fn multipart_body(boundary: &str, file_name: &str, content: &str) -> String {
        format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"arquivo\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {content}\r\n\
             --{boundary}--\r\n"
        )
    }

    #[tokio::test]
    async fn test_import_preview_then_save() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path()).await;
        let app = create_app(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/dados/previa")
                    .header(
                        header::CONTENT_TYPE,
                        "multipart/form-data; boundary=XBOUNDARY",
                    )
                    .body(Body::from(multipart_body(
                        "XBOUNDARY",
                        "gtas.html",
                        &import_html(),
                    )))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(location(&response), "/dados");

        let html = body_text(get(&app, "/dados").await).await;
        assert!(html.contains("gtas.html"));
        assert!(state.repo().await.columns().await.unwrap().is_empty());

        let token = state.pending_import().await.unwrap().token;
        post_form(&app, "/dados/salvar", &format!("token={token}")).await;

        assert_eq!(state.repo().await.list_animals().await.unwrap().len(), 2);
        assert!(state.pending_import().await.is_none());
    }

    #[tokio::test]
    async fn test_import_with_missing_columns_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path()).await;
        let app = create_app(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/dados/previa")
                    .header(
                        header::CONTENT_TYPE,
                        "multipart/form-data; boundary=XBOUNDARY",
                    )
                    .body(Body::from(multipart_body(
                        "XBOUNDARY",
                        "gtas.html",
                        "<table><tr><th>Lacre</th></tr><tr><td>1</td></tr></table>",
                    )))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(state.pending_import().await.is_none());
    }

    #[tokio::test]
    async fn test_save_with_stale_token_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let state = seeded_state(dir.path()).await;
        let app = create_app(state.clone());

        let response = post_form(&app, "/dados/salvar", "token=not-a-token").await;

        assert_eq!(location(&response), "/dados");
        assert_eq!(state.repo().await.list_animals().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_download_without_database_file_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(AppState::for_tests(dir.path()).await);

        let response = get(&app, "/backup/download").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/backup");
    }


    async fn file_state(dir: &std::path::Path) -> AppState {
        let config = crate::config::Config::new(dir.join("dados.db"), dir.join("backups"));
        let state = AppState::open(config).await.unwrap();
        state.repo().await.ensure_lote(1).await.unwrap();
        state
    }

    fn restore_body(boundary: &str, file: &[u8], checkboxes: &[&str]) -> Vec<u8> {
        let mut body = Vec::new();
        for name in checkboxes {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\n\
                     Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
                     1\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{boundary}\r\n\
                 Content-Disposition: form-data; name=\"arquivo\"; filename=\"copia.sqlite\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        body
    }

    fn database_with_lote(dir: &std::path::Path, numero: i64) -> Vec<u8> {
        let path = dir.join("incoming.sqlite");
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE lotes (numero INTEGER PRIMARY KEY, criado_em TEXT, \
             status TEXT NOT NULL DEFAULT 'pendente', concluido_em TEXT, gta_saida TEXT);",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO lotes (numero, criado_em) VALUES (?1, '2024-05-01 09:00:00')",
            [numero],
        )
        .unwrap();
        drop(conn);
        std::fs::read(path).unwrap()
    }

    async fn post_restore(app: &Router, body: Vec<u8>) -> Response<Body> {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/backup/restaurar")
                    .header(
                        header::CONTENT_TYPE,
                        "multipart/form-data; boundary=XBOUNDARY",
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn lote_numbers(state: &AppState) -> Vec<i64> {
        state
            .repo()
            .await
            .list_lotes()
            .await
            .unwrap()
            .into_iter()
            .map(|lote| lote.numero)
            .collect()
    }

    #[tokio::test]
    async fn test_restore_reopens_repository_on_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = file_state(dir.path()).await;
        let app = create_app(state.clone());
        let incoming = database_with_lote(dir.path(), 42);

        let response = post_restore(
            &app,
            restore_body("XBOUNDARY", &incoming, &["confirmar", "backup_antes"]),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/backup");
        assert_eq!(lote_numbers(&state).await, vec![42]);
        assert_eq!(state.backups.list_backups().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_restore_without_confirmation_keeps_database() {
        let dir = tempfile::tempdir().unwrap();
        let state = file_state(dir.path()).await;
        let app = create_app(state.clone());
        let incoming = database_with_lote(dir.path(), 42);

        let response =
            post_restore(&app, restore_body("XBOUNDARY", &incoming, &["backup_antes"])).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.contains("info"));
        assert_eq!(lote_numbers(&state).await, vec![1]);
        assert!(state.backups.list_backups().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path()).await;
        let app = create_app(state.clone());

        let response = post_form(&app, "/lotes/9/salvar", "").await;
        assert_eq!(location(&response), "/lotes/criar?numero=9");
        let lote = state.repo().await.get_lote(9).await.unwrap().unwrap();
        assert!(!lote.status.is_done());
        assert!(state.repo().await.lote_items(9).await.unwrap().is_empty());

        let html = body_text(get(&app, "/lotes/criar?numero=9").await).await;
        assert!(!html.contains("/lotes/9/salvar"));

        let response = post_form(&app, "/lotes/0/salvar", "").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(state.repo().await.get_lote(0).await.unwrap().is_none());
    }
}
