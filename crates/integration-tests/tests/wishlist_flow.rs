//! Wishlist set semantics and the guest-to-user merge over the wire.

use oakline_integration_tests::{TestApp, USER_TOKEN, product_draft};

fn auth_header() -> String {
    format!("Bearer {USER_TOKEN}")
}

async fn seed_product(app: &TestApp, sku: &str) -> String {
    let response = app.post("/api/products", &[], product_draft(sku, "100")).await;
    assert_eq!(response.status, 201, "seed product: {:?}", response.json);
    response.json["id"].as_str().expect("product id").to_string()
}

#[tokio::test]
async fn add_is_idempotent() {
    let app = TestApp::new();
    let product = seed_product(&app, "OAK-W1").await;

    let first = app
        .post(
            "/api/wishlist/add",
            &[],
            serde_json::json!({ "product_id": product }),
        )
        .await;
    let guest = first.guest_id().expect("guest id");

    let second = app
        .post(
            "/api/wishlist/add",
            &[("x-guest-id", guest.as_str())],
            serde_json::json!({ "product_id": product }),
        )
        .await;

    assert_eq!(second.status, 200);
    assert_eq!(second.json["products"].as_array().expect("products").len(), 1);
}

#[tokio::test]
async fn add_unknown_product_is_not_found() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/wishlist/add",
            &[],
            serde_json::json!({ "product_id": "00000000-0000-4000-8000-000000000001" }),
        )
        .await;

    assert_eq!(response.status, 404);
    assert_eq!(response.error_kind(), Some("not_found"));
}

#[tokio::test]
async fn remove_is_idempotent() {
    let app = TestApp::new();
    let product = seed_product(&app, "OAK-W1").await;

    let add = app
        .post(
            "/api/wishlist/add",
            &[],
            serde_json::json!({ "product_id": product }),
        )
        .await;
    let guest = add.guest_id().expect("guest id");
    let headers = [("x-guest-id", guest.as_str())];

    let removed = app
        .request(
            "DELETE",
            &format!("/api/wishlist/remove/{product}"),
            &headers,
            None,
        )
        .await;
    assert_eq!(removed.status, 200);
    assert_eq!(removed.json["products"].as_array().expect("products").len(), 0);

    // Removing again is still a success.
    let again = app
        .request(
            "DELETE",
            &format!("/api/wishlist/remove/{product}"),
            &headers,
            None,
        )
        .await;
    assert_eq!(again.status, 200);
}

#[tokio::test]
async fn merge_unions_wishlists_and_retires_guest_record() {
    let app = TestApp::new();
    let auth = auth_header();
    let shared = seed_product(&app, "OAK-SHARED").await;
    let guest_only = seed_product(&app, "OAK-GUEST").await;

    // Guest wishlist: {shared, guest_only}
    let first = app
        .post(
            "/api/wishlist/add",
            &[],
            serde_json::json!({ "product_id": shared }),
        )
        .await;
    let guest = first.guest_id().expect("guest id");
    app.post(
        "/api/wishlist/add",
        &[("x-guest-id", guest.as_str())],
        serde_json::json!({ "product_id": guest_only }),
    )
    .await;

    // User wishlist: {shared}
    app.post(
        "/api/wishlist/add",
        &[("authorization", auth.as_str())],
        serde_json::json!({ "product_id": shared }),
    )
    .await;

    let merged = app
        .post(
            "/api/wishlist/merge",
            &[
                ("authorization", auth.as_str()),
                ("x-guest-id", guest.as_str()),
            ],
            serde_json::json!({}),
        )
        .await;

    assert_eq!(merged.status, 200);
    assert_eq!(merged.json["is_guest"], false);
    assert_eq!(merged.json["products"].as_array().expect("products").len(), 2);

    // Retired guest id resolves to a fresh empty wishlist afterwards.
    let after = app
        .get("/api/wishlist", &[("x-guest-id", guest.as_str())])
        .await;
    assert_eq!(after.json["products"].as_array().expect("products").len(), 0);
}

#[tokio::test]
async fn merge_requires_authentication() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/wishlist/merge",
            &[("x-guest-id", "00000000-0000-4000-8000-000000000001")],
            serde_json::json!({}),
        )
        .await;

    assert_eq!(response.status, 401);
    assert_eq!(response.error_kind(), Some("authentication_error"));
}

#[tokio::test]
async fn wishlist_is_populated_with_product_summaries() {
    let app = TestApp::new();
    let product = seed_product(&app, "OAK-W1").await;

    let response = app
        .post(
            "/api/wishlist/add",
            &[],
            serde_json::json!({ "product_id": product }),
        )
        .await;

    let products = response.json["products"].as_array().expect("products");
    assert_eq!(products[0]["product"]["sku"], "OAK-W1");
    assert_eq!(products[0]["product_id"], product.as_str());
}
