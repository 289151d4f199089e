//! Cart mutation and the guest-to-user merge protocol over the wire.

use oakline_integration_tests::{TestApp, USER_TOKEN, product_draft};

fn auth_header() -> String {
    format!("Bearer {USER_TOKEN}")
}

/// Create a product and return its id.
async fn seed_product(app: &TestApp, sku: &str, amount: &str) -> String {
    let response = app.post("/api/products", &[], product_draft(sku, amount)).await;
    assert_eq!(response.status, 201, "seed product: {:?}", response.json);
    response.json["id"].as_str().expect("product id").to_string()
}

#[tokio::test]
async fn add_accumulates_quantity_for_same_product() {
    let app = TestApp::new();
    let product = seed_product(&app, "OAK-1", "10").await;

    let first = app
        .post(
            "/api/cart/add",
            &[],
            serde_json::json!({ "product_id": product, "quantity": 2 }),
        )
        .await;
    assert_eq!(first.status, 200);
    let guest = first.guest_id().expect("guest id");

    let second = app
        .post(
            "/api/cart/add",
            &[("x-guest-id", guest.as_str())],
            serde_json::json!({ "product_id": product, "quantity": 3 }),
        )
        .await;

    assert_eq!(second.status, 200);
    let items = second.json["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(second.json["subtotal"], "50");
    assert_eq!(second.json["total"], "50");
}

#[tokio::test]
async fn add_unknown_product_is_not_found() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/cart/add",
            &[],
            serde_json::json!({
                "product_id": "00000000-0000-4000-8000-000000000001",
                "quantity": 1
            }),
        )
        .await;

    assert_eq!(response.status, 404);
    assert_eq!(response.error_kind(), Some("not_found"));
}

#[tokio::test]
async fn add_zero_quantity_is_rejected() {
    let app = TestApp::new();
    let product = seed_product(&app, "OAK-1", "10").await;

    let response = app
        .post(
            "/api/cart/add",
            &[],
            serde_json::json!({ "product_id": product, "quantity": 0 }),
        )
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.error_kind(), Some("validation_error"));
}

#[tokio::test]
async fn merge_combines_carts_and_retires_guest_record() {
    let app = TestApp::new();
    let auth = auth_header();
    let product_a = seed_product(&app, "OAK-A", "10").await;
    let product_b = seed_product(&app, "OAK-B", "5").await;

    // Guest cart: [{A, qty 2, price 10}]
    let guest_add = app
        .post(
            "/api/cart/add",
            &[],
            serde_json::json!({ "product_id": product_a, "quantity": 2 }),
        )
        .await;
    let guest = guest_add.guest_id().expect("guest id");

    // User cart: [{A, qty 1}, {B, qty 1}]
    for (product, qty) in [(&product_a, 1), (&product_b, 1)] {
        let response = app
            .post(
                "/api/cart/add",
                &[("authorization", auth.as_str())],
                serde_json::json!({ "product_id": product, "quantity": qty }),
            )
            .await;
        assert_eq!(response.status, 200);
    }

    // Merge: user cart becomes [{A, qty 3}, {B, qty 1}]
    let merged = app
        .post(
            "/api/cart/merge",
            &[
                ("authorization", auth.as_str()),
                ("x-guest-id", guest.as_str()),
            ],
            serde_json::json!({}),
        )
        .await;

    assert_eq!(merged.status, 200);
    assert_eq!(merged.json["is_guest"], false);
    let items = merged.json["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    let qty_a = items
        .iter()
        .find(|item| item["product_id"] == product_a.as_str())
        .expect("line A")["quantity"]
        .clone();
    assert_eq!(qty_a, 3);
    assert_eq!(merged.json["subtotal"], "35");

    // The guest record is gone: the same header now yields a fresh cart.
    let after = app
        .get("/api/cart", &[("x-guest-id", guest.as_str())])
        .await;
    assert_eq!(after.status, 200);
    assert_eq!(after.json["items"].as_array().expect("items").len(), 0);
}

#[tokio::test]
async fn merge_is_idempotent_over_the_wire() {
    let app = TestApp::new();
    let auth = auth_header();
    let product = seed_product(&app, "OAK-1", "10").await;

    let guest_add = app
        .post(
            "/api/cart/add",
            &[],
            serde_json::json!({ "product_id": product, "quantity": 2 }),
        )
        .await;
    let guest = guest_add.guest_id().expect("guest id");

    let headers = [
        ("authorization", auth.as_str()),
        ("x-guest-id", guest.as_str()),
    ];
    let first = app.post("/api/cart/merge", &headers, serde_json::json!({})).await;
    let second = app.post("/api/cart/merge", &headers, serde_json::json!({})).await;

    assert_eq!(first.status, 200);
    assert_eq!(second.status, 200);
    assert_eq!(first.json["items"], second.json["items"]);
    assert_eq!(second.json["items"].as_array().expect("items")[0]["quantity"], 2);
}

#[tokio::test]
async fn merge_requires_authentication() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/cart/merge",
            &[("x-guest-id", "00000000-0000-4000-8000-000000000001")],
            serde_json::json!({}),
        )
        .await;

    // The anonymous caller resolves as a guest; merge mandates a user.
    assert_eq!(response.status, 401);
    assert_eq!(response.error_kind(), Some("authentication_error"));
}

#[tokio::test]
async fn merge_requires_guest_header() {
    let app = TestApp::new();
    let auth = auth_header();

    let response = app
        .post(
            "/api/cart/merge",
            &[("authorization", auth.as_str())],
            serde_json::json!({}),
        )
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.error_kind(), Some("validation_error"));
}

#[tokio::test]
async fn update_quantity_zero_removes_line() {
    let app = TestApp::new();
    let auth = auth_header();
    let product = seed_product(&app, "OAK-1", "10").await;

    app.post(
        "/api/cart/add",
        &[("authorization", auth.as_str())],
        serde_json::json!({ "product_id": product, "quantity": 3 }),
    )
    .await;

    let response = app
        .request(
            "PUT",
            "/api/cart/update",
            &[("authorization", auth.as_str())],
            Some(serde_json::json!({ "product_id": product, "quantity": 0 })),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json["items"].as_array().expect("items").len(), 0);
    assert_eq!(response.json["total"], "0");
}

#[tokio::test]
async fn remove_absent_product_is_noop_success() {
    let app = TestApp::new();
    let auth = auth_header();
    let product = seed_product(&app, "OAK-1", "10").await;

    app.post(
        "/api/cart/add",
        &[("authorization", auth.as_str())],
        serde_json::json!({ "product_id": product, "quantity": 1 }),
    )
    .await;

    let response = app
        .post(
            "/api/cart/remove",
            &[("authorization", auth.as_str())],
            serde_json::json!({ "product_id": "00000000-0000-4000-8000-000000000002" }),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json["items"].as_array().expect("items").len(), 1);
}

#[tokio::test]
async fn discount_flows_into_total() {
    let app = TestApp::new();
    let auth = auth_header();
    let product = seed_product(&app, "OAK-1", "100").await;

    app.post(
        "/api/cart/add",
        &[("authorization", auth.as_str())],
        serde_json::json!({ "product_id": product, "quantity": 2 }),
    )
    .await;

    let response = app
        .post(
            "/api/cart/apply-discount",
            &[("authorization", auth.as_str())],
            serde_json::json!({ "amount": "30" }),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json["subtotal"], "200");
    assert_eq!(response.json["discount"], "30");
    assert_eq!(response.json["total"], "170");
}

#[tokio::test]
async fn clear_empties_cart_but_keeps_identity() {
    let app = TestApp::new();
    let product = seed_product(&app, "OAK-1", "10").await;

    let add = app
        .post(
            "/api/cart/add",
            &[],
            serde_json::json!({ "product_id": product, "quantity": 2 }),
        )
        .await;
    let guest = add.guest_id().expect("guest id");

    let cleared = app
        .post(
            "/api/cart/clear",
            &[("x-guest-id", guest.as_str())],
            serde_json::json!({}),
        )
        .await;

    assert_eq!(cleared.status, 200);
    assert_eq!(cleared.json["items"].as_array().expect("items").len(), 0);
    assert_eq!(cleared.json["owner"], guest.as_str());
    assert_eq!(cleared.json["total"], "0");
}

#[tokio::test]
async fn cart_entries_are_populated_with_product_summaries() {
    let app = TestApp::new();
    let product = seed_product(&app, "OAK-1", "10").await;

    let response = app
        .post(
            "/api/cart/add",
            &[],
            serde_json::json!({ "product_id": product, "quantity": 1 }),
        )
        .await;

    let items = response.json["items"].as_array().expect("items");
    assert_eq!(items[0]["product"]["sku"], "OAK-1");
    assert_eq!(items[0]["product"]["price"]["amount"], "10");
    assert_eq!(items[0]["unit_price"]["currency"], "INR");
}
