use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use catalog::app::{AppState, router};
use catalog::gallery::ImageMode;
use catalog::store::{MemorySheets, Mutation};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app_with(store: MemorySheets) -> (Router, Arc<AppState<MemorySheets>>) {
    let state = Arc::new(AppState::new(store, ImageMode::Link).expect("state"));
    (router(state.clone()), state)
}

fn app() -> (Router, Arc<AppState<MemorySheets>>) {
    app_with(
        MemorySheets::default()
            .with_tab(
                "Products",
                &[
                    &["id", "name", "quantity", "image"],
                    &["P1", "Brass Lamp", "3", "https://drive.google.com/file/d/lampId/view"],
                    &["P2", "Oak Table", "5", ""],
                ],
            )
            .with_tab("Stock", &[&["sku", "title"], &["S1", "Crate"]]),
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn index_shows_first_sheet_with_gallery() {
    let (app, _) = app();
    let (status, html) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<strong>Products</strong>"));
    assert!(html.contains("Brass Lamp"));
    assert!(html.contains("lampId"));
    assert!(!html.contains("file/d/lampId/view\" alt"));
}

#[tokio::test]
async fn index_search_without_id_column_warns() {
    let (app, _) = app();
    let (status, html) = send(&app, get("/?sheet=Stock&q=crate")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<strong>Stock</strong>"));
    assert!(html.contains("search is unavailable"));
}

#[tokio::test]
async fn index_search_filters_rows() {
    let (app, _) = app();
    let (_, html) = send(&app, get("/?sheet=Products&q=oak")).await;
    assert!(html.contains("Results for"));
}

#[tokio::test]
async fn add_form_appends_and_asks_for_reload() {
    let (app, state) = app();
    let (status, html) = send(
        &app,
        form("/sheets/Products/add", "id=P3&name=Chair&quantity=2&image="),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Row added. Reload to see the result."));
    assert_eq!(
        state.catalog.store().journal(),
        vec![Mutation::Append {
            tab: "Products".to_string(),
            row: vec!["P3".into(), "Chair".into(), "2".into(), "".into()],
        }]
    );
}

#[tokio::test]
async fn delete_form_with_unknown_id_changes_nothing() {
    let (app, state) = app();
    let (status, html) = send(&app, form("/sheets/Products/delete", "id=NOPE")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("No product found with ID"));
    assert!(state.catalog.store().journal().is_empty());
}

#[tokio::test]
async fn form_on_missing_sheet_is_not_found() {
    let (app, _) = app();
    let (status, _) = send(&app, form("/sheets/Missing/add", "id=1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_document_renders_warning() {
    let (app, _) = app_with(MemorySheets::default());
    let (status, html) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("The spreadsheet has no worksheets."));
}

#[tokio::test]
async fn api_lists_and_reads_sheets() {
    let (app, _) = app();

    let (_, body) = send(&app, get("/api/sheets")).await;
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!(["Products", "Stock"]));

    let (status, body) = send(&app, get("/api/sheets/Products")).await;
    assert_eq!(status, StatusCode::OK);
    let snapshot: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(snapshot["table"]["columns"], json!(["id", "name", "quantity", "image"]));
    assert_eq!(snapshot["table"]["rows"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn api_search_returns_matches() {
    let (app, _) = app();
    let (_, body) = send(&app, get("/api/sheets/Products/search?q=LAMP")).await;
    let outcome: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(outcome["results"]["rows"], json!([["P1", "Brass Lamp", "3", "https://drive.google.com/file/d/lampId/view"]]));
}

#[tokio::test]
async fn api_patch_updates_named_cells() {
    let (app, state) = app();
    let (status, body) = send(
        &app,
        json_request("PATCH", "/api/sheets/Products/rows/P2", json!({ "quantity": "8" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["level"], "success");
    assert_eq!(
        state.catalog.store().journal(),
        vec![Mutation::Update {
            tab: "Products".to_string(),
            row: 3,
            col: 3,
            value: "8".to_string(),
        }]
    );
}

#[tokio::test]
async fn api_delete_unknown_id_is_unprocessable() {
    let (app, state) = app();
    let request = Request::builder()
        .method("DELETE")
        .uri("/api/sheets/Products/rows/NOPE")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["level"], "error");
    assert!(state.catalog.store().journal().is_empty());
}

#[tokio::test]
async fn api_post_row_appends() {
    let (app, state) = app();
    let (status, _) = send(
        &app,
        json_request("POST", "/api/sheets/Products/rows", json!({ "id": "P7", "name": "Rug" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.catalog.store().values("Products").unwrap().len(), 4);
}

#[tokio::test]
async fn api_resolves_drive_links() {
    let (app, _) = app();
    let (_, body) = send(
        &app,
        get("/api/resolve?link=https%3A%2F%2Fdrive.google.com%2Ffile%2Fd%2Fabc%2Fview%3Fusp%3Dsharing"),
    )
    .await;

    let resolved: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(resolved["direct"], "https://drive.google.com/uc?export=view&id=abc");
}

#[tokio::test]
async fn export_csv_and_reject_unknown_format() {
    let (app, _) = app();

    let (status, body) = send(&app, get("/api/sheets/Products/export?format=csv")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("id,name,quantity,image\nP1,Brass Lamp,3,"));

    let (status, _) = send(&app, get("/api/sheets/Products/export?format=pdf")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
