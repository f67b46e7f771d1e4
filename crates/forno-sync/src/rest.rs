//! # REST Backend
//!
//! `OrderBackend` and `CatalogBackend` over the hosted backend's REST
//! interface (one endpoint per table under `/rest/v1/`).
//!
//! ```text
//!   count_orders_since   GET   /rest/v1/orders?tenant_id=eq.T&created_at=gte.D
//!                              Prefer: count=exact   → Content-Range: 0-0/57
//!   create_order_header  POST  /rest/v1/orders       → [{"id": ...}]
//!   create_order_items   POST  /rest/v1/order_items
//!   set_favorite         PATCH /rest/v1/products?id=eq.P
//! ```

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use forno_core::{Money, OrderLineItem};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::backend::{CatalogBackend, OrderBackend, RemoteOrderHeader};
use crate::config::QueueConfig;
use crate::error::{RemoteError, RemoteResult, SyncError, SyncResult};

/// Connection details for the REST backend.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL, e.g. `"https://api.example.com"`.
    pub base_url: Url,

    /// Project API key.
    pub api_key: String,

    /// User token for `Authorization`. The API key is used when absent.
    pub access_token: Option<String>,
}

impl RestConfig {
    /// Builds the REST settings from the `[backend]` section.
    pub fn from_queue_config(config: &QueueConfig) -> SyncResult<Self> {
        let raw = config.backend.url.as_deref().ok_or(SyncError::MissingBackend)?;
        let api_key = config
            .backend
            .api_key
            .clone()
            .ok_or(SyncError::MissingBackend)?;

        Ok(RestConfig {
            base_url: Url::parse(raw)?,
            api_key,
            access_token: config.backend.access_token.clone(),
        })
    }
}

/// HTTP client for the order and product tables.
#[derive(Debug, Clone)]
pub struct RestBackend {
    config: RestConfig,
    http: Client,
}

impl RestBackend {
    #[must_use]
    pub fn new(config: RestConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// URL of a table endpoint.
    fn endpoint(&self, table: &str) -> RemoteResult<Url> {
        self.config
            .base_url
            .join(&format!("rest/v1/{}", table))
            .map_err(|e| RemoteError::Connection(format!("bad endpoint for {}: {}", table, e)))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .config
            .access_token
            .as_deref()
            .unwrap_or(&self.config.api_key);

        self.http
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(bearer)
    }
}

/// Turns a non-2xx response into a classified error.
async fn ensure_success(response: Response) -> RemoteResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    Err(RemoteError::from_status(status, text))
}

/// Total from a `Content-Range` header (`"0-0/57"`, `"*/0"`).
fn parse_content_range_total(value: &str) -> Option<u32> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[derive(Debug, Deserialize)]
struct CreatedRow {
    id: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ItemRow<'a> {
    order_id: &'a str,
    product_id: &'a str,
    quantity: i64,
    unit_price: Money,
}

#[async_trait]
impl OrderBackend for RestBackend {
    async fn count_orders_since(&self, tenant_id: &str, since: DateTime<Utc>) -> RemoteResult<u32> {
        let mut url = self.endpoint("orders")?;
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("tenant_id", &format!("eq.{}", tenant_id))
            .append_pair(
                "created_at",
                &format!("gte.{}", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );

        let response = self
            .request(Method::GET, url)
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| RemoteError::InvalidResponse("missing Content-Range".into()))?;

        let total = parse_content_range_total(range)
            .ok_or_else(|| RemoteError::InvalidResponse(format!("bad Content-Range: {}", range)))?;

        debug!(tenant_id, total, "Counted orders since start of day");
        Ok(total)
    }

    async fn create_order_header(&self, header: &RemoteOrderHeader) -> RemoteResult<String> {
        let url = self.endpoint("orders")?;

        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(header)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let rows: Vec<CreatedRow> = response.json().await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::InvalidResponse("order insert returned no rows".into()))?;

        Ok(match row.id {
            serde_json::Value::String(id) => id,
            other => other.to_string(),
        })
    }

    async fn create_order_items(&self, order_id: &str, items: &[OrderLineItem]) -> RemoteResult<()> {
        let url = self.endpoint("order_items")?;
        let rows: Vec<ItemRow<'_>> = items
            .iter()
            .map(|item| ItemRow {
                order_id,
                product_id: &item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();

        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await?;
        ensure_success(response).await?;

        Ok(())
    }
}

#[async_trait]
impl CatalogBackend for RestBackend {
    async fn set_favorite(&self, product_id: &str, is_favorite: bool) -> RemoteResult<()> {
        let mut url = self.endpoint("products")?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", product_id));

        let body = serde_json::json!({ "is_favorite": is_favorite });

        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;
        ensure_success(response).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> RestBackend {
        RestBackend::new(RestConfig {
            base_url: Url::parse(base).unwrap(),
            api_key: "anon".to_string(),
            access_token: None,
        })
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(parse_content_range_total("0-0/57"), Some(57));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-0/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn test_endpoint() {
        let rest = backend("https://api.example.com/");
        assert_eq!(
            rest.endpoint("orders").unwrap().as_str(),
            "https://api.example.com/rest/v1/orders"
        );
    }

    #[test]
    fn test_item_rows_carry_order_id() {
        let item = OrderLineItem {
            product_id: "p1".to_string(),
            quantity: 2,
            unit_price: Money::from_cents(1500),
        };
        let row = ItemRow {
            order_id: "order-9",
            product_id: &item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["order_id"], "order-9");
        assert_eq!(json["unit_price"], 1500);
    }

    #[test]
    fn test_config_requires_backend() {
        let mut config = QueueConfig::default();
        assert!(matches!(
            RestConfig::from_queue_config(&config),
            Err(SyncError::MissingBackend)
        ));

        config.backend.url = Some("https://api.example.com".to_string());
        config.backend.api_key = Some("anon".to_string());
        let rest = RestConfig::from_queue_config(&config).unwrap();
        assert_eq!(rest.api_key, "anon");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_retryable() {
        // Port 9 (discard) on localhost is not listening in test environments
        let rest = backend("http://127.0.0.1:9/");
        let err = rest
            .create_order_items("order-1", &[])
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
