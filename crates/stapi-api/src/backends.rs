//! Backend operations behind the routes: vendor calls, conversions, fixture-store paging.

use crate::server::AppState;
use crate::ApiError;
use chrono::Utc;
use planet_client::CancellationToken;
use stapi_convert::{
    iw_to_opportunity, opportunity_payload_to_iw_search, order_payload_to_create_order,
    planet_order_to_stapi_order, planet_product_to_stapi_product, ConvertError,
};
use stapi_types::planet::PlanetOrderParameters;
use stapi_types::{
    Link, OpportunityCollection, OpportunityPayload, OpportunitySearchRecord,
    OpportunitySearchStatus, OpportunitySearchStatusCode, Order, OrderPayload, OrderStatus,
    OrderStore, Product, TYPE_GEOJSON,
};
use uuid::Uuid;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// One page of results plus the token for the next page, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

pub fn product_href(public_url: &str, product_id: &str) -> String {
    format!("{}/products/{}", public_url, urlencoding::encode(product_id))
}

pub fn create_order_href(public_url: &str, product_id: &str) -> String {
    format!("{}/orders", product_href(public_url, product_id))
}

pub fn order_href(public_url: &str, order_id: &str) -> String {
    format!("{}/orders/{}", public_url, urlencoding::encode(order_id))
}

fn with_self_link(mut product: Product, public_url: &str) -> Product {
    product.links = vec![
        Link::new(product_href(public_url, &product.id), "self"),
        Link::new(create_order_href(public_url, &product.id), "create-order"),
    ];
    product
}

/// Products served by this adapter: the configured one, or Planet's list when dynamic.
pub async fn list_products(
    state: &AppState,
    authorization: Option<&[u8]>,
) -> Result<Vec<Product>, ApiError> {
    let public_url = &state.settings.public_url;
    if !state.settings.dynamic_products {
        return Ok(vec![with_self_link(state.product.clone(), public_url)]);
    }
    let creds = state.client.credentials(authorization)?;
    let products = state.client.get_products(&creds).await?;
    Ok(products
        .iter()
        .map(planet_product_to_stapi_product)
        .map(|p| with_self_link(p, public_url))
        .collect())
}

pub async fn find_product(
    state: &AppState,
    product_id: &str,
    authorization: Option<&[u8]>,
) -> Result<Product, ApiError> {
    if product_id == state.product.id {
        return Ok(with_self_link(
            state.product.clone(),
            &state.settings.public_url,
        ));
    }
    if state.settings.dynamic_products {
        let found = list_products(state, authorization)
            .await?
            .into_iter()
            .find(|p| p.id == product_id);
        if let Some(product) = found {
            return Ok(product);
        }
    }
    Err(ApiError::NotFound(format!("product {} not found", product_id)))
}

/// Run an imaging-window search for `product` and record it in the opportunity store.
pub async fn search_opportunities(
    state: &AppState,
    product: &Product,
    search: OpportunityPayload,
    authorization: Option<&[u8]>,
    cancel: &CancellationToken,
) -> Result<OpportunityCollection, ApiError> {
    let record_id = Uuid::new_v4().to_string();
    let result = run_search(state, product, &search, authorization, cancel).await;
    let (status_code, reason_text) = match &result {
        Ok(_) => (OpportunitySearchStatusCode::Completed, None),
        Err(ApiError::Client(planet_client::ClientError::Cancelled)) => {
            (OpportunitySearchStatusCode::Canceled, None)
        }
        Err(e) => (OpportunitySearchStatusCode::Failed, Some(e.to_string())),
    };

    let mut record = OpportunitySearchRecord {
        id: record_id.clone(),
        product_id: product.id.clone(),
        opportunity_request: search,
        status: OpportunitySearchStatus {
            timestamp: Utc::now(),
            status_code,
            reason_text,
            links: Vec::new(),
        },
        links: vec![Link::new(
            format!("{}/searches/opportunities/{}", state.settings.public_url, record_id),
            "self",
        )],
    };

    let collection = match result {
        Ok(mut collection) => {
            let collection_id = Uuid::new_v4().to_string();
            let href = format!(
                "{}/opportunities/{}",
                product_href(&state.settings.public_url, &product.id),
                collection_id
            );
            collection.id = Some(collection_id);
            let mut link = Link::new(href, "opportunities");
            link.media_type = Some(TYPE_GEOJSON.to_string());
            record.links.push(link.clone());
            collection.links.push(Link {
                rel: "self".to_string(),
                ..link
            });
            state
                .opportunities
                .put_opportunity_collection(collection.clone())
                .await?;
            Ok(collection)
        }
        Err(e) => Err(e),
    };
    state.opportunities.put_search_record(record).await?;
    collection
}

async fn run_search(
    state: &AppState,
    product: &Product,
    search: &OpportunityPayload,
    authorization: Option<&[u8]>,
    cancel: &CancellationToken,
) -> Result<OpportunityCollection, ApiError> {
    let creds = state.client.credentials(authorization)?;
    let iw_request = opportunity_payload_to_iw_search(product, search)?;
    let windows = state
        .client
        .get_imaging_windows(&creds, &iw_request, cancel)
        .await?;
    tracing::info!(product_id = %product.id, count = windows.len(), "imaging windows found");
    let create_href = create_order_href(&state.settings.public_url, &product.id);
    let features = windows
        .iter()
        .map(|iw| {
            iw_to_opportunity(iw, product, search, &create_href)?
                .into_json()
                .map_err(ConvertError::from)
        })
        .collect::<Result<Vec<_>, ConvertError>>()?;
    Ok(OpportunityCollection::new(features))
}

/// Place an order with Planet and record it with its first status.
pub async fn create_order(
    state: &AppState,
    product: &Product,
    payload: OrderPayload<PlanetOrderParameters>,
    authorization: Option<&[u8]>,
) -> Result<Order, ApiError> {
    let creds = state.client.credentials(authorization)?;
    let request = order_payload_to_create_order(&payload, product)?;
    let planet_order = state.client.create_order(&creds, &request).await?;
    let mut order = planet_order_to_stapi_order(planet_order)?;
    order.links = order_links(&state.settings.public_url, &order.id);
    tracing::info!(order_id = %order.id, status = %order.properties.status.status_code, "order created");

    state.orders.put_order(order.clone()).await?;
    state
        .orders
        .put_order_status(&order.id, order.properties.status.clone())
        .await?;
    Ok(order)
}

pub async fn get_order(
    state: &AppState,
    order_id: &str,
    authorization: Option<&[u8]>,
) -> Result<Option<Order>, ApiError> {
    let creds = state.client.credentials(authorization)?;
    let Some(planet_order) = state.client.get_order(&creds, order_id).await? else {
        return Ok(None);
    };
    let mut order = planet_order_to_stapi_order(planet_order)?;
    order.links = order_links(&state.settings.public_url, &order.id);
    Ok(Some(order))
}

fn order_links(public_url: &str, order_id: &str) -> Vec<Link> {
    let href = order_href(public_url, order_id);
    vec![
        Link::new(href.clone(), "self"),
        Link::new(format!("{}/statuses", href), "monitor"),
    ]
}

/// Requested page size clamped to `1..=MAX_LIMIT`; an empty page would repeat its own `next`.
pub fn page_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Orders from the store; `next` is the id of the first order of the page.
pub async fn get_orders(
    store: &dyn OrderStore,
    next: Option<&str>,
    limit: Option<usize>,
) -> Result<Page<Order>, ApiError> {
    let orders = store.get_orders().await?;
    let limit = page_limit(limit);
    let start = match next {
        Some(token) => orders
            .iter()
            .position(|o| o.id == token)
            .ok_or_else(|| ApiError::BadRequest(format!("invalid next token {:?}", token)))?,
        None => 0,
    };
    let end = (start + limit).min(orders.len());
    let next = (end > 0 && end < orders.len()).then(|| orders[end].id.clone());
    Ok(Page {
        items: orders[start..end].to_vec(),
        next,
    })
}

/// Status history from the store; `next` is an integer offset. `Ok(None)` for unknown orders.
pub async fn get_order_statuses(
    store: &dyn OrderStore,
    order_id: &str,
    next: Option<&str>,
    limit: Option<usize>,
) -> Result<Option<Page<OrderStatus>>, ApiError> {
    let Some(statuses) = store.get_order_statuses(order_id).await? else {
        return Ok(None);
    };
    let limit = page_limit(limit);
    let start = match next {
        Some(token) => token
            .parse::<usize>()
            .map_err(|_| ApiError::BadRequest(format!("invalid next token {:?}", token)))?,
        None => 0,
    };
    let start = start.min(statuses.len());
    let end = (start + limit).min(statuses.len());
    let next = (end > 0 && end < statuses.len()).then(|| end.to_string());
    Ok(Some(Page {
        items: statuses[start..end].to_vec(),
        next,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stapi_store::InMemoryOrderStore;
    use stapi_types::{
        DatetimeInterval, Geometry, OrderProperties, OrderSearchParameters, OrderStatusCode,
    };

    fn order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            kind: "Feature".to_string(),
            geometry: Geometry::point(0.0, 0.0),
            properties: OrderProperties {
                product_id: "INT-003001:Assured Tasking".to_string(),
                created: chrono::DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z").unwrap(),
                status: OrderStatus::now(OrderStatusCode::Received),
                search_parameters: OrderSearchParameters {
                    datetime: DatetimeInterval::parse(
                        "2025-01-01T00:00:00Z/2025-01-02T00:00:00Z",
                    )
                    .unwrap(),
                    geometry: Geometry::point(0.0, 0.0),
                    filter: None,
                },
                opportunity_properties: Default::default(),
                order_parameters: Default::default(),
            },
            links: Vec::new(),
        }
    }

    async fn store_with(n: usize) -> InMemoryOrderStore {
        let store = InMemoryOrderStore::new();
        for i in 0..n {
            store.put_order(order(&format!("o{}", i))).await.unwrap();
        }
        store
    }

    fn ids(page: &Page<Order>) -> Vec<&str> {
        page.items.iter().map(|o| o.id.as_str()).collect()
    }

    #[tokio::test]
    async fn orders_page_through_by_id_token() {
        let store = store_with(5).await;
        let first = get_orders(&store, None, Some(2)).await.unwrap();
        assert_eq!(ids(&first), vec!["o0", "o1"]);
        assert_eq!(first.next.as_deref(), Some("o2"));

        let second = get_orders(&store, first.next.as_deref(), Some(2))
            .await
            .unwrap();
        assert_eq!(ids(&second), vec!["o2", "o3"]);

        let last = get_orders(&store, second.next.as_deref(), Some(2))
            .await
            .unwrap();
        assert_eq!(ids(&last), vec!["o4"]);
        assert!(last.next.is_none());
    }

    #[tokio::test]
    async fn orders_limit_is_capped_and_defaulted() {
        let store = store_with(120).await;
        let page = get_orders(&store, None, Some(500)).await.unwrap();
        assert_eq!(page.items.len(), MAX_LIMIT);
        assert_eq!(page.next.as_deref(), Some("o100"));
        let page = get_orders(&store, None, None).await.unwrap();
        assert_eq!(page.items.len(), DEFAULT_LIMIT);
    }

    #[tokio::test]
    async fn zero_limit_still_advances() {
        let store = store_with(3).await;
        let page = get_orders(&store, Some("o1"), Some(0)).await.unwrap();
        assert_eq!(ids(&page), vec!["o1"]);
        assert_eq!(page.next.as_deref(), Some("o2"));

        let statuses = InMemoryOrderStore::new();
        for _ in 0..2 {
            statuses
                .put_order_status("o1", OrderStatus::now(OrderStatusCode::Received))
                .await
                .unwrap();
        }
        let page = get_order_statuses(&statuses, "o1", Some("0"), Some(0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn unknown_order_token_is_bad_request() {
        let store = store_with(2).await;
        let err = get_orders(&store, Some("nope"), None).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn empty_store_has_no_next() {
        let store = InMemoryOrderStore::new();
        let page = get_orders(&store, None, None).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn statuses_page_through_by_offset() {
        let store = InMemoryOrderStore::new();
        for code in [
            OrderStatusCode::Received,
            OrderStatusCode::Scheduled,
            OrderStatusCode::Completed,
        ] {
            store
                .put_order_status("o1", OrderStatus::now(code))
                .await
                .unwrap();
        }
        let page = get_order_statuses(&store, "o1", None, Some(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next.as_deref(), Some("2"));
        let page = get_order_statuses(&store, "o1", Some("2"), Some(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(page.items[0].status_code, OrderStatusCode::Completed);
        assert!(page.next.is_none());

        assert!(get_order_statuses(&store, "o2", None, None)
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            get_order_statuses(&store, "o1", Some("two"), None).await,
            Err(ApiError::BadRequest(_))
        ));
    }
}
