#![cfg(feature = "web")]

use axum::{
    Form, Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::catalog::{self, Catalog, NewProduct, Notice, ProductUpdate, SearchOutcome, Snapshot};
use crate::drive::resolve_image_link;
use crate::error::SheetError;
use crate::export::{ExportFormat, export};
use crate::gallery::{ImageMode, build_gallery};
use crate::render::{FormKind, Page, Pages};
use crate::store::SheetStore;
use crate::table::Table;

pub struct AppState<S> {
    pub catalog: Catalog<S>,
    pub pages: Pages,
    pub image_mode: ImageMode,
    pub http: reqwest::Client,
}

impl<S: SheetStore> AppState<S> {
    pub fn new(store: S, image_mode: ImageMode) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(AppState {
            catalog: Catalog::new(store),
            pages: Pages::new()?,
            image_mode,
            http: reqwest::Client::new(),
        })
    }
}

/// Failures that end the interaction.
#[derive(Debug)]
pub enum AppError {
    Sheet(SheetError),
    Render(String),
    BadRequest(String),
}

impl From<SheetError> for AppError {
    fn from(e: SheetError) -> Self {
        AppError::Sheet(e)
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(e: handlebars::RenderError) -> Self {
        AppError::Render(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Sheet(e @ SheetError::TabNotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::Sheet(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Render(e) => (StatusCode::INTERNAL_SERVER_ERROR, e),
            AppError::BadRequest(e) => (StatusCode::BAD_REQUEST, e),
        };
        log::error!("request failed: {}", message);
        (status, message).into_response()
    }
}

#[derive(Deserialize, Default)]
struct PageQuery {
    sheet: Option<String>,
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct ResolveQuery {
    link: String,
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

#[derive(Deserialize)]
struct DeleteForm {
    #[serde(default)]
    id: String,
}

/// Replacement values for `PATCH`; the identifier comes from the path.
#[derive(Deserialize, Default)]
#[serde(default)]
struct FieldChanges {
    name: String,
    quantity: String,
    image: String,
}

#[derive(Serialize)]
struct ResolveResponse {
    link: String,
    direct: String,
}

#[derive(Serialize)]
struct SearchResponse {
    term: String,
    results: Option<Table>,
    notice: Option<Notice>,
}

/// Build the application router.
pub fn router<S: SheetStore>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/", get(show_page::<S>))
        .route("/sheets/:tab/add", post(submit_add::<S>))
        .route("/sheets/:tab/update", post(submit_update::<S>))
        .route("/sheets/:tab/delete", post(submit_delete::<S>))
        .route("/api/sheets", get(list_sheets::<S>))
        .route("/api/sheets/:tab", get(get_sheet::<S>))
        .route("/api/sheets/:tab/search", get(search_sheet::<S>))
        .route("/api/sheets/:tab/export", get(export_sheet::<S>))
        .route("/api/sheets/:tab/rows", post(add_row::<S>))
        .route(
            "/api/sheets/:tab/rows/:id",
            axum::routing::patch(update_row::<S>).delete(delete_row::<S>),
        )
        .route("/api/resolve", get(resolve_link))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Serve the catalog on `bind` until the process stops.
pub async fn run<S: SheetStore>(
    bind: &str,
    store: S,
    image_mode: ImageMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let app_state = Arc::new(AppState::new(store, image_mode)?);
    let app = router(app_state);

    let listener = TcpListener::bind(bind).await?;
    log::info!("Listening on http://{}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;
    log::info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

/// Requested worksheet if it exists, otherwise the first one.
fn pick_tab<'a>(tabs: &'a [String], requested: Option<&str>) -> Option<&'a String> {
    requested
        .and_then(|want| tabs.iter().find(|t| t.as_str() == want))
        .or_else(|| tabs.first())
}

async fn render_page<S: SheetStore>(
    state: &AppState<S>,
    tabs: &[String],
    snapshot: &Snapshot,
    term: &str,
    status: Option<(FormKind, &Notice)>,
) -> Result<Html<String>, AppError> {
    let gallery = build_gallery(state.image_mode, &state.http, &snapshot.table).await;
    let search = catalog::search(snapshot, term);

    let html = state.pages.render(&Page {
        tabs,
        snapshot: Some(snapshot),
        notices: &[],
        gallery: &gallery,
        search: &search,
        status,
    })?;
    Ok(Html(html))
}

async fn show_page<S: SheetStore>(
    Query(params): Query<PageQuery>,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Html<String>, AppError> {
    let tabs = state.catalog.connect().await?;

    let Some(tab) = pick_tab(&tabs, params.sheet.as_deref()) else {
        let notice = Notice::Warning("The spreadsheet has no worksheets.".to_string());
        let html = state.pages.render(&Page {
            tabs: &tabs,
            snapshot: None,
            notices: std::slice::from_ref(&notice),
            gallery: &[],
            search: &SearchOutcome::default(),
            status: None,
        })?;
        return Ok(Html(html));
    };

    let snapshot = state.catalog.load(tab).await?;
    render_page(&state, &tabs, &snapshot, &params.q, None).await
}

/// Connect and read `tab` as the start of a form submission.
async fn open_tab<S: SheetStore>(
    state: &AppState<S>,
    tab: &str,
) -> Result<(Vec<String>, Snapshot), AppError> {
    let tabs = state.catalog.connect().await?;
    if !tabs.iter().any(|t| t == tab) {
        return Err(SheetError::TabNotFound(tab.to_string()).into());
    }
    let snapshot = state.catalog.load(tab).await?;
    Ok((tabs, snapshot))
}

async fn submit_add<S: SheetStore>(
    Path(tab): Path<String>,
    State(state): State<Arc<AppState<S>>>,
    Form(product): Form<NewProduct>,
) -> Result<Html<String>, AppError> {
    let (tabs, snapshot) = open_tab(&state, &tab).await?;
    let notice = state.catalog.add(&snapshot, &product).await?;
    render_page(&state, &tabs, &snapshot, "", Some((FormKind::Add, &notice))).await
}

async fn submit_update<S: SheetStore>(
    Path(tab): Path<String>,
    State(state): State<Arc<AppState<S>>>,
    Form(update): Form<ProductUpdate>,
) -> Result<Html<String>, AppError> {
    let (tabs, snapshot) = open_tab(&state, &tab).await?;
    let notice = state.catalog.update(&snapshot, &update).await?;
    render_page(&state, &tabs, &snapshot, "", Some((FormKind::Update, &notice))).await
}

async fn submit_delete<S: SheetStore>(
    Path(tab): Path<String>,
    State(state): State<Arc<AppState<S>>>,
    Form(form): Form<DeleteForm>,
) -> Result<Html<String>, AppError> {
    let (tabs, snapshot) = open_tab(&state, &tab).await?;
    let notice = state.catalog.delete(&snapshot, &form.id).await?;
    render_page(&state, &tabs, &snapshot, "", Some((FormKind::Delete, &notice))).await
}

async fn list_sheets<S: SheetStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.catalog.connect().await?))
}

async fn get_sheet<S: SheetStore>(
    Path(tab): Path<String>,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Snapshot>, AppError> {
    let (_, snapshot) = open_tab(&state, &tab).await?;
    Ok(Json(snapshot))
}

async fn search_sheet<S: SheetStore>(
    Path(tab): Path<String>,
    Query(params): Query<SearchQuery>,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<SearchResponse>, AppError> {
    let (_, snapshot) = open_tab(&state, &tab).await?;
    let outcome = catalog::search(&snapshot, &params.q);
    Ok(Json(SearchResponse {
        term: outcome.term,
        results: outcome.results,
        notice: outcome.notice,
    }))
}

async fn export_sheet<S: SheetStore>(
    Path(tab): Path<String>,
    Query(params): Query<ExportQuery>,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Response, AppError> {
    let format: ExportFormat = params
        .format
        .as_deref()
        .unwrap_or("csv")
        .parse()
        .map_err(AppError::BadRequest)?;

    let (_, snapshot) = open_tab(&state, &tab).await?;
    let bytes = export(&snapshot.table, format).map_err(|e| AppError::Render(e.to_string()))?;
    let disposition = format!(
        "attachment; filename=\"{}.{}\"",
        tab.replace('"', ""),
        format.extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Status code for a write outcome: errors are the caller's problem.
fn notice_response(notice: Notice) -> Response {
    let status = if notice.is_error() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    (status, Json(notice)).into_response()
}

async fn add_row<S: SheetStore>(
    Path(tab): Path<String>,
    State(state): State<Arc<AppState<S>>>,
    Json(product): Json<NewProduct>,
) -> Result<Response, AppError> {
    let (_, snapshot) = open_tab(&state, &tab).await?;
    Ok(notice_response(state.catalog.add(&snapshot, &product).await?))
}

async fn update_row<S: SheetStore>(
    Path((tab, id)): Path<(String, String)>,
    State(state): State<Arc<AppState<S>>>,
    Json(changes): Json<FieldChanges>,
) -> Result<Response, AppError> {
    let (_, snapshot) = open_tab(&state, &tab).await?;
    let update = ProductUpdate {
        id,
        name: changes.name,
        quantity: changes.quantity,
        image: changes.image,
    };
    Ok(notice_response(state.catalog.update(&snapshot, &update).await?))
}

async fn delete_row<S: SheetStore>(
    Path((tab, id)): Path<(String, String)>,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Response, AppError> {
    let (_, snapshot) = open_tab(&state, &tab).await?;
    Ok(notice_response(state.catalog.delete(&snapshot, &id).await?))
}

async fn resolve_link(Query(params): Query<ResolveQuery>) -> Json<ResolveResponse> {
    let direct = resolve_image_link(&params.link);
    Json(ResolveResponse {
        link: params.link,
        direct,
    })
}
