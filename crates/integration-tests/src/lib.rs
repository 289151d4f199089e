//! Integration tests for Oakline.
//!
//! The suites drive the full storefront router - middleware, extractors,
//! handlers - over the in-memory stores and a static token verifier, so
//! they run hermetically with no database or network.
//!
//! # Test Categories
//!
//! - `identity` - guest id minting/echoing and bearer handling
//! - `cart_flow` - cart mutation and the guest-to-user merge protocol
//! - `wishlist_flow` - wishlist set semantics and merge
//! - `catalog_flow` - catalog listing, filtering, and admin CRUD

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;

use oakline_core::UserId;
use oakline_storefront::config::StorefrontConfig;
use oakline_storefront::routes;
use oakline_storefront::services::StaticTokenVerifier;
use oakline_storefront::state::AppState;

/// Bearer token the static verifier accepts for the test user.
pub const USER_TOKEN: &str = "integration-test-user-token";

/// Configuration suitable for hermetic tests.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused/oakline-test"),
        host: "127.0.0.1".parse().expect("valid addr"),
        port: 0,
        jwt_secret: SecretString::from("kJ8#mN2$pQ5&rT9@vW3^xZ6!bC4*dF7%"),
    }
}

/// A storefront application wired against in-memory stores.
pub struct TestApp {
    router: Router,
    /// The authenticated user [`USER_TOKEN`] resolves to.
    pub user: UserId,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let user = UserId::random();
        let verifier = StaticTokenVerifier::new().with_token(USER_TOKEN, user);
        let state = AppState::in_memory(test_config(), Arc::new(verifier));
        Self {
            router: routes::app(state),
            user,
        }
    }

    /// Issue a request and collect the response.
    ///
    /// # Panics
    ///
    /// Panics on transport-level failures; tests assert on the returned
    /// status and body instead.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).expect("serialize body")))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }

    /// GET with optional headers.
    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request("GET", uri, headers, None).await
    }

    /// POST a JSON body with optional headers.
    pub async fn post(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
        body: serde_json::Value,
    ) -> TestResponse {
        self.request("POST", uri, headers, Some(body)).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Collected response for assertions.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: serde_json::Value,
}

impl TestResponse {
    /// The echoed `x-guest-id` header, if present.
    #[must_use]
    pub fn guest_id(&self) -> Option<String> {
        self.headers
            .get("x-guest-id")
            .and_then(|value| value.to_str().ok())
            .map(String::from)
    }

    /// The error kind of a structured failure body.
    #[must_use]
    pub fn error_kind(&self) -> Option<&str> {
        self.json.get("error")?.get("kind")?.as_str()
    }
}

/// A minimal valid product draft for catalog setup.
#[must_use]
pub fn product_draft(sku: &str, amount: &str) -> serde_json::Value {
    serde_json::json!({
        "sku": sku,
        "name": format!("Test Product {sku}"),
        "product_type": "Wardrobe",
        "category": "Sliding Wardrobe",
        "price": { "amount": amount, "currency": "INR" },
        "designer": { "name": "Test Designer", "area": "Pune" }
    })
}
