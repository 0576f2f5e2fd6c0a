// src/api.rs
use axum::{
    extract::{Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::catalog::{FilterState, LoadOutcome, OverviewSnapshot, PageView};
use crate::dashboard::AppState;
use crate::model::{AutomationTask, FilterOptions, SupplierIntegration};
use crate::tasks::TaskSnapshot;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/catalog/rows", get(catalog_rows))
        .route("/catalog/view", get(catalog_view))
        .route("/catalog/filter", put(catalog_set_filter))
        .route("/catalog/query", post(catalog_type_query))
        .route("/catalog/page", post(catalog_load_page))
        .route("/catalog/overview", get(catalog_overview))
        .route("/catalog/filters", get(catalog_filters))
        .route("/catalog/refresh", post(catalog_refresh))
        .route("/tasks/recent", get(tasks_recent))
        .route("/tasks/snapshot", get(tasks_snapshot))
        .route("/suppliers/status", get(suppliers_status))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RowsQuery {
    #[serde(default)]
    page: usize,
    #[serde(default)]
    q: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    supplier: String,
}

/// Stateless merge cycle; does not touch the published view.
async fn catalog_rows(State(state): State<AppState>, Query(p): Query<RowsQuery>) -> Json<PageView> {
    let filter = FilterState::new(&p.q, &p.brand, &p.supplier);
    Json(state.coordinator.fetch_page(p.page, &filter).await)
}

async fn catalog_view(State(state): State<AppState>) -> Json<PageView> {
    Json(state.coordinator.current())
}

// Stale or no-op loads fall back to whatever view is published now.
fn view_or_current(state: &AppState, out: Option<LoadOutcome>) -> Json<PageView> {
    match out {
        Some(LoadOutcome::Committed(v)) => Json(v),
        _ => Json(state.coordinator.current()),
    }
}

async fn catalog_set_filter(
    State(state): State<AppState>,
    Json(filter): Json<FilterState>,
) -> Json<PageView> {
    let out = state.coordinator.set_filter(&filter).await;
    view_or_current(&state, out)
}

#[derive(Debug, Deserialize)]
struct QueryInput {
    #[serde(default)]
    q: String,
}

async fn catalog_type_query(
    State(state): State<AppState>,
    Json(input): Json<QueryInput>,
) -> Json<PageView> {
    let out = state.coordinator.type_query(input.q).await;
    view_or_current(&state, out)
}

#[derive(Debug, Deserialize)]
struct PageInput {
    page: usize,
}

async fn catalog_load_page(
    State(state): State<AppState>,
    Json(input): Json<PageInput>,
) -> Json<PageView> {
    let out = state.coordinator.reload(input.page).await;
    view_or_current(&state, Some(out))
}

async fn catalog_overview(State(state): State<AppState>) -> Json<OverviewSnapshot> {
    Json(state.overview.current())
}

async fn catalog_filters(State(state): State<AppState>) -> Json<FilterOptions> {
    Json(state.overview.current().filters)
}

#[derive(Serialize)]
struct RefreshOut {
    overview: OverviewSnapshot,
    view: PageView,
}

async fn catalog_refresh(State(state): State<AppState>) -> Json<RefreshOut> {
    let (overview, out) = state.refresh_all().await;
    let Json(view) = view_or_current(&state, Some(out));
    Json(RefreshOut { overview, view })
}

async fn tasks_recent(State(state): State<AppState>) -> Json<Vec<AutomationTask>> {
    Json(state.poller.latest().tasks)
}

async fn tasks_snapshot(State(state): State<AppState>) -> Json<TaskSnapshot> {
    Json(state.poller.latest())
}

#[derive(Serialize)]
struct SuppliersOut {
    suppliers: Vec<SupplierIntegration>,
}

async fn suppliers_status(State(state): State<AppState>) -> Json<SuppliersOut> {
    Json(SuppliersOut {
        suppliers: state.poller.latest().suppliers,
    })
}
