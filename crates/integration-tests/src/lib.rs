//! End-to-end test harness for the Kombu stock engine.
//!
//! Tests drive the full axum router in process via [`tower::ServiceExt`],
//! so every request passes through routing, extraction, the authentication
//! middleware, and the JSON error mapping exactly as in production. The
//! clock is a pinned [`ManualClock`], which makes expiry behavior
//! deterministic without sleeping.
//!
//! Run with: `cargo test -p kombu-integration-tests`

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use kombu_server::auth::AllowAll;
use kombu_server::clock::{Clock, ManualClock};
use kombu_server::config::KombuConfig;
use kombu_server::routes;
use kombu_server::state::AppState;
use kombu_server::store::MemoryStore;

/// The instant every test starts at.
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid instant")
}

/// Parse a decimal literal in a test.
#[must_use]
pub fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

/// Read a decimal field off a JSON response body. Decimals serialize as
/// strings on the wire; parsing back avoids scale mismatches in assertions.
#[must_use]
pub fn dec_field(value: &Value, field: &str) -> Decimal {
    value[field]
        .as_str()
        .unwrap_or_else(|| panic!("field {field} missing or not a string in {value}"))
        .parse()
        .expect("valid decimal on the wire")
}

/// The application under test, with its injected manual clock.
pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Fresh application with an empty catalog and the clock pinned to
    /// [`epoch`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(KombuConfig::default())
    }

    /// Fresh application with explicit configuration (image directory,
    /// cache bounds).
    #[must_use]
    pub fn with_config(config: KombuConfig) -> Self {
        let clock = Arc::new(ManualClock::new(epoch()));
        let state = AppState::with_parts(
            config,
            MemoryStore::new(),
            Arc::clone(&clock) as Arc<dyn kombu_server::clock::Clock>,
            Arc::new(AllowAll),
        );
        let router = routes::router(state.clone());
        Self {
            state,
            clock,
            router,
        }
    }

    /// Move the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        self.clock.advance(Duration::days(days));
    }

    /// Send one request through the full router, returning the status and
    /// the parsed JSON body (or `Value::Null` for an empty body).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("well-formed test request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, path, None).await
    }

    // =========================================================================
    // Seeding helpers (everything goes through the HTTP surface)
    // =========================================================================

    /// Create an ingredient, returning its id.
    pub async fn create_ingredient(&self, name: &str, unit: &str) -> String {
        let (status, body) = self
            .post("/ingredients", json!({ "name": name, "unit": unit }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create ingredient: {body}");
        body["id"].as_str().expect("ingredient id").to_string()
    }

    /// Append a manual batch expiring `expires_in_days` from the current
    /// clock instant.
    pub async fn add_batch(&self, ingredient_id: &str, quantity: &str, expires_in_days: i64) {
        let expires_at = self.clock.now() + Duration::days(expires_in_days);
        let (status, body) = self
            .post(
                &format!("/ingredients/{ingredient_id}/batches"),
                json!({ "quantity": quantity, "expires_at": expires_at }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add batch: {body}");
    }

    /// Create a menu item from a request body, returning its id.
    pub async fn create_menu_item(&self, body: Value) -> String {
        let (status, body) = self.post("/menu", body).await;
        assert_eq!(status, StatusCode::CREATED, "create menu item: {body}");
        body["id"].as_str().expect("menu item id").to_string()
    }

    /// Place an order, returning the response body.
    pub async fn place_order(&self, body: Value) -> Value {
        let (status, body) = self.post("/orders", body).await;
        assert_eq!(status, StatusCode::CREATED, "place order: {body}");
        body
    }

    /// Drive an order to a terminal status, returning status and body.
    pub async fn transition_order(&self, order_id: &str, status: &str) -> (StatusCode, Value) {
        self.patch(
            &format!("/orders/{order_id}/status"),
            json!({ "status": status }),
        )
        .await
    }

    /// Current total available stock for an ingredient.
    pub async fn total_available(&self, ingredient_id: &str) -> Decimal {
        let (status, body) = self.get(&format!("/ingredients/{ingredient_id}")).await;
        assert_eq!(status, StatusCode::OK, "ingredient detail: {body}");
        dec_field(&body, "total_available")
    }
}

/// A sized ramen creation body with one size per `(label, price, requirements)`
/// entry.
#[must_use]
pub fn ramen_body(name: &str, sizes: &[(&str, &str, Vec<Value>)]) -> Value {
    let sizes: Vec<Value> = sizes
        .iter()
        .map(|(label, price, requirements)| {
            json!({ "label": label, "price": price, "requirements": requirements })
        })
        .collect();
    json!({
        "name": name,
        "category": "ramen",
        "pricing": { "kind": "sized", "sizes": sizes },
    })
}

/// An ingredient requirement entry for a menu item body.
#[must_use]
pub fn requirement(ingredient_id: &str, quantity: &str) -> Value {
    json!({ "ingredient_id": ingredient_id, "quantity": quantity })
}

/// A flat-priced menu item creation body.
#[must_use]
pub fn flat_body(name: &str, category: &str, price: &str, requirements: Vec<Value>) -> Value {
    json!({
        "name": name,
        "category": category,
        "pricing": { "kind": "flat", "price": price, "requirements": requirements },
    })
}
