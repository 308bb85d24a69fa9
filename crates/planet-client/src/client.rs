//! Planet tasking client: orders, products and imaging-window searches.

use crate::{AsyncJobClient, ClientError, Credentials, Settings};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use stapi_types::vendor::{
    CreateOrderRequest, ImagingWindow, ImagingWindowSearch, PlanetOrder, PlanetProduct,
    ProductsResponse,
};
use tokio_util::sync::CancellationToken;

/// Client for `{base_url}` endpoints. Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct PlanetClient {
    http: reqwest::Client,
    orders_url: String,
    products_url: String,
    fallback_token: Option<String>,
    jobs: AsyncJobClient,
}

impl PlanetClient {
    pub fn new(settings: &Settings) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            jobs: AsyncJobClient::new(http.clone(), settings),
            http,
            orders_url: settings.orders_url(),
            products_url: settings.products_url(),
            fallback_token: settings.fallback_token.clone(),
        })
    }

    /// Credentials for one call, from the caller's `Authorization` header or the configured fallback.
    pub fn credentials(&self, authorization: Option<&[u8]>) -> Result<Credentials, ClientError> {
        Credentials::resolve(authorization, self.fallback_token.as_deref())
    }

    pub fn jobs(&self) -> &AsyncJobClient {
        &self.jobs
    }

    /// `GET /orders/{order_id}`; `Ok(None)` when Planet answers 404.
    pub async fn get_order(
        &self,
        credentials: &Credentials,
        order_id: &str,
    ) -> Result<Option<PlanetOrder>, ClientError> {
        let mut url = Url::parse(&self.orders_url)
            .map_err(|e| ClientError::Protocol(format!("invalid orders url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Protocol("orders url cannot be a base".to_string()))?
            .pop_if_empty()
            .push(order_id);
        tracing::debug!(order_id, "fetching order");
        let res = self
            .http
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, credentials.header_value())
            .send()
            .await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(res, "order").await.map(Some)
    }

    /// `POST /orders/`.
    pub async fn create_order(
        &self,
        credentials: &Credentials,
        request: &CreateOrderRequest,
    ) -> Result<PlanetOrder, ClientError> {
        tracing::debug!(imaging_window = %request.imaging_window, "creating order");
        let res = self
            .http
            .post(&self.orders_url)
            .header(AUTHORIZATION, credentials.header_value())
            .json(request)
            .send()
            .await?;
        read_json(res, "created order").await
    }

    /// `GET /products`.
    pub async fn get_products(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<PlanetProduct>, ClientError> {
        let res = self
            .http
            .get(&self.products_url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, credentials.header_value())
            .send()
            .await?;
        let products: ProductsResponse = read_json(res, "products").await?;
        Ok(products.into_products())
    }

    /// Run an imaging-window search job to completion.
    pub async fn get_imaging_windows(
        &self,
        credentials: &Credentials,
        search: &ImagingWindowSearch,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImagingWindow>, ClientError> {
        self.jobs
            .run_job_with_cancel(search, credentials, cancel)
            .await
    }
}

async fn read_json<T: DeserializeOwned>(
    res: reqwest::Response,
    what: &str,
) -> Result<T, ClientError> {
    if !res.status().is_success() {
        return Err(ClientError::from_response(res).await);
    }
    let text = res.text().await?;
    serde_json::from_str(&text).map_err(|e| ClientError::Decode(format!("{}: {}", what, e)))
}
