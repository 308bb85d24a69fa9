//! Axum server and routes.

use crate::backends::{self, Page};
use crate::{ApiError, ApiSettings};
use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use planet_client::{CancellationToken, PlanetClient};
use serde::Deserialize;
use stapi_store::{InMemoryOpportunityStore, InMemoryOrderStore};
use stapi_types::planet::PlanetOrderParameters;
use stapi_types::{
    Conformance, Link, OpportunityCollection, OpportunityPayload, OpportunitySearchRecord,
    OpportunitySearchRecords, OpportunityStore, Order, OrderCollection, OrderPayload,
    OrderStatuses, OrderStore, Product, ProductsCollection, RootResponse, CORE, OPPORTUNITIES,
    TYPE_GEOJSON, TYPE_JSON,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub client: PlanetClient,
    pub settings: ApiSettings,
    /// Product served when dynamic listing is off.
    pub product: Product,
    pub orders: Arc<dyn OrderStore + Send + Sync>,
    pub opportunities: Arc<dyn OpportunityStore + Send + Sync>,
    /// Cancelled on shutdown; every search polls under a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// State backed by process-lifetime in-memory stores.
    pub fn in_memory(client: PlanetClient, settings: ApiSettings, product: Product) -> Self {
        Self {
            client,
            settings,
            product,
            orders: Arc::new(InMemoryOrderStore::new()),
            opportunities: Arc::new(InMemoryOpportunityStore::new()),
            shutdown: CancellationToken::new(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/conformance", get(handle_conformance))
        .route("/products", get(handle_products))
        .route("/products/:product_id", get(handle_product))
        .route(
            "/products/:product_id/opportunities",
            post(handle_search_opportunities),
        )
        .route(
            "/products/:product_id/opportunities/:collection_id",
            get(handle_opportunity_collection),
        )
        .route("/products/:product_id/orders", post(handle_create_order))
        .route("/orders", get(handle_orders))
        .route("/orders/:order_id", get(handle_order))
        .route("/orders/:order_id/statuses", get(handle_order_statuses))
        .route("/searches/opportunities", get(handle_search_records))
        .route(
            "/searches/opportunities/:search_record_id",
            get(handle_search_record),
        )
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Raw header bytes; a present but unusable header must not read as absent.
fn authorization(headers: &HeaderMap) -> Option<&[u8]> {
    headers.get(AUTHORIZATION).map(HeaderValue::as_bytes)
}

fn typed_link(href: String, rel: &str, media_type: &str) -> Link {
    let mut link = Link::new(href, rel);
    link.media_type = Some(media_type.to_string());
    link
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

fn next_link(href: &str, next: Option<&str>, limit: Option<usize>) -> Option<Link> {
    let next = next?;
    let limit = backends::page_limit(limit);
    Some(Link::new(
        format!("{}?next={}&limit={}", href, urlencoding::encode(next), limit),
        "next",
    ))
}

async fn handle_root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    let base = &state.settings.public_url;
    Json(RootResponse {
        id: "stapi-planet".to_string(),
        conforms_to: vec![CORE.to_string(), OPPORTUNITIES.to_string()],
        links: vec![
            typed_link(format!("{}/", base), "self", TYPE_JSON),
            typed_link(format!("{}/conformance", base), "conformance", TYPE_JSON),
            typed_link(format!("{}/products", base), "products", TYPE_JSON),
            typed_link(format!("{}/orders", base), "orders", TYPE_GEOJSON),
            typed_link(
                format!("{}/searches/opportunities", base),
                "opportunity-search-records",
                TYPE_JSON,
            ),
        ],
    })
}

async fn handle_conformance() -> Json<Conformance> {
    Json(Conformance {
        conforms_to: vec![CORE.to_string(), OPPORTUNITIES.to_string()],
    })
}

async fn handle_products(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProductsCollection>, ApiError> {
    let products = backends::list_products(&state, authorization(&headers)).await?;
    Ok(Json(ProductsCollection {
        kind: "ProductCollection".to_string(),
        products,
        links: vec![typed_link(
            format!("{}/products", state.settings.public_url),
            "self",
            TYPE_JSON,
        )],
    }))
}

async fn handle_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Product>, ApiError> {
    let product = backends::find_product(&state, &product_id, authorization(&headers)).await?;
    Ok(Json(product))
}

async fn handle_search_opportunities(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    Json(search): Json<OpportunityPayload>,
) -> Result<Json<OpportunityCollection>, ApiError> {
    let auth = authorization(&headers);
    let product = backends::find_product(&state, &product_id, auth).await?;
    let cancel = state.shutdown.child_token();
    let collection =
        backends::search_opportunities(&state, &product, search, auth, &cancel).await?;
    Ok(Json(collection))
}

async fn handle_opportunity_collection(
    State(state): State<Arc<AppState>>,
    Path((_product_id, collection_id)): Path<(String, String)>,
) -> Result<Json<OpportunityCollection>, ApiError> {
    state
        .opportunities
        .get_opportunity_collection(&collection_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("opportunity collection {} not found", collection_id))
        })
}

async fn handle_create_order(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<OrderPayload<PlanetOrderParameters>>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let auth = authorization(&headers);
    let product = backends::find_product(&state, &product_id, auth).await?;
    let order = backends::create_order(&state, &product, payload, auth).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn handle_orders(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PageQuery>,
) -> Result<Json<OrderCollection>, ApiError> {
    let Page { items, next } =
        backends::get_orders(state.orders.as_ref(), q.next.as_deref(), q.limit).await?;
    let href = format!("{}/orders", state.settings.public_url);
    let mut links = vec![typed_link(href.clone(), "self", TYPE_GEOJSON)];
    links.extend(next_link(&href, next.as_deref(), q.limit));
    Ok(Json(OrderCollection {
        kind: "FeatureCollection".to_string(),
        features: items,
        links,
    }))
}

async fn handle_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Order>, ApiError> {
    backends::get_order(&state, &order_id, authorization(&headers))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("order {} not found", order_id)))
}

async fn handle_order_statuses(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<OrderStatuses>, ApiError> {
    let Page { items, next } = backends::get_order_statuses(
        state.orders.as_ref(),
        &order_id,
        q.next.as_deref(),
        q.limit,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("order {} not found", order_id)))?;
    let href = format!(
        "{}/statuses",
        backends::order_href(&state.settings.public_url, &order_id)
    );
    Ok(Json(OrderStatuses {
        statuses: items,
        links: next_link(&href, next.as_deref(), q.limit)
            .into_iter()
            .collect(),
    }))
}

async fn handle_search_records(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OpportunitySearchRecords>, ApiError> {
    let search_records = state.opportunities.get_search_records().await?;
    Ok(Json(OpportunitySearchRecords {
        search_records,
        links: vec![typed_link(
            format!("{}/searches/opportunities", state.settings.public_url),
            "self",
            TYPE_JSON,
        )],
    }))
}

async fn handle_search_record(
    State(state): State<Arc<AppState>>,
    Path(search_record_id): Path<String>,
) -> Result<Json<OpportunitySearchRecord>, ApiError> {
    state
        .opportunities
        .get_search_record(&search_record_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("search record {} not found", search_record_id)))
}

async fn handle_health() -> &'static str {
    "ok"
}
