//! Resolved-menu availability through the HTTP surface.
//!
//! Seeds the catalog over the same routes a client would use, then checks
//! that `GET /menu` annotates every size with availability and shortfall
//! diagnostics.

use axum::http::StatusCode;
use serde_json::Value;
use uuid::Uuid;

use kombu_integration_tests::{TestApp, dec, dec_field, flat_body, ramen_body, requirement};

/// One nori sheet in stock; classic needs 1, deluxe 2, supreme 3.
async fn seed_miso_ramen(app: &TestApp) -> String {
    let nori = app.create_ingredient("Nori", "piece").await;
    app.add_batch(&nori, "1", 5).await;
    app.create_menu_item(ramen_body(
        "Miso Ramen",
        &[
            ("classic", "185", vec![requirement(&nori, "1")]),
            ("deluxe", "225", vec![requirement(&nori, "2")]),
            ("supreme", "265", vec![requirement(&nori, "3")]),
        ],
    ))
    .await;
    nori
}

fn size<'a>(item: &'a Value, label: &str) -> &'a Value {
    item["sizes"]
        .as_array()
        .expect("sizes array")
        .iter()
        .find(|size| size["label"] == label)
        .unwrap_or_else(|| panic!("size {label} missing in {item}"))
}

#[tokio::test]
async fn each_size_is_annotated_with_availability() {
    let app = TestApp::new();
    seed_miso_ramen(&app).await;

    let (status, menu) = app.get("/menu").await;
    assert_eq!(status, StatusCode::OK);
    let items = menu.as_array().expect("menu array");
    assert_eq!(items.len(), 1);

    let ramen = &items[0];
    assert_eq!(ramen["name"], "Miso Ramen");
    assert_eq!(ramen["is_available"], true, "classic is still servable");
    assert_eq!(dec_field(ramen, "base_price"), dec("185"));

    let classic = size(ramen, "classic");
    assert_eq!(classic["is_available"], true);
    assert!(
        classic.get("unavailable_ingredients").is_none(),
        "available sizes carry no diagnostics"
    );

    let deluxe = size(ramen, "deluxe");
    assert_eq!(deluxe["is_available"], false);
    let reasons = deluxe["unavailable_ingredients"]
        .as_array()
        .expect("shortfall diagnostics");
    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons[0]["name"], "Nori");
    assert_eq!(dec_field(&reasons[0], "required"), dec("2"));
    assert_eq!(dec_field(&reasons[0], "available"), dec("1"));
    assert_eq!(reasons[0]["unit"], "piece");
}

#[tokio::test]
async fn item_is_unavailable_only_when_every_size_is() {
    let app = TestApp::new();
    let nori = seed_miso_ramen(&app).await;

    // Drain the single sheet; every size now falls short.
    let order = app
        .place_order(serde_json::json!({
            "table_number": 4,
            "customer_name": "Aki",
            "items": [{
                "menu_item_id": menu_item_id(&app, "Miso Ramen").await,
                "size": "classic",
                "quantity": 1,
            }],
        }))
        .await;
    let (status, _) = app
        .transition_order(order["id"].as_str().expect("order id"), "completed")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.total_available(&nori).await, dec("0"));

    let (_, menu) = app.get("/menu").await;
    let ramen = &menu.as_array().expect("menu array")[0];
    assert_eq!(ramen["is_available"], false);
    assert_eq!(size(ramen, "classic")["is_available"], false);
}

#[tokio::test]
async fn manual_flag_overrides_stock() {
    let app = TestApp::new();
    seed_miso_ramen(&app).await;
    let id = menu_item_id(&app, "Miso Ramen").await;

    let (status, _) = app
        .patch(&format!("/menu/{id}"), serde_json::json!({ "available": false }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, menu) = app.get("/menu").await;
    let ramen = &menu.as_array().expect("menu array")[0];
    assert_eq!(ramen["is_available"], false, "manual flag wins over stock");
}

#[tokio::test]
async fn expired_batches_do_not_count() {
    let app = TestApp::new();
    seed_miso_ramen(&app).await;

    // The only batch expires 5 days out.
    app.advance_days(6);

    let (_, menu) = app.get("/menu").await;
    let ramen = &menu.as_array().expect("menu array")[0];
    assert_eq!(ramen["is_available"], false);
    let reasons = size(ramen, "classic")["unavailable_ingredients"]
        .as_array()
        .expect("diagnostics");
    assert_eq!(dec_field(&reasons[0], "available"), dec("0"));
}

#[tokio::test]
async fn dangling_ingredient_reference_resolves_as_unavailable() {
    let app = TestApp::new();
    let ghost = Uuid::new_v4().to_string();
    app.create_menu_item(flat_body(
        "Gyoza",
        "side",
        "95",
        vec![requirement(&ghost, "4")],
    ))
    .await;

    let (status, menu) = app.get("/menu").await;
    assert_eq!(status, StatusCode::OK, "a dangling reference is not an error");
    let gyoza = &menu.as_array().expect("menu array")[0];
    assert_eq!(gyoza["is_available"], false);
    let reasons = size(gyoza, "classic")["unavailable_ingredients"]
        .as_array()
        .expect("diagnostics");
    assert_eq!(reasons[0]["name"], format!("missing ingredient {ghost}"));
    assert_eq!(reasons[0]["unit"], Value::Null);
}

#[tokio::test]
async fn flat_items_surface_a_single_classic_size() {
    let app = TestApp::new();
    app.create_menu_item(flat_body("Ramune", "drink", "45", vec![])).await;

    let (_, menu) = app.get("/menu").await;
    let ramune = &menu.as_array().expect("menu array")[0];
    let sizes = ramune["sizes"].as_array().expect("sizes");
    assert_eq!(sizes.len(), 1);
    assert_eq!(sizes[0]["label"], "classic");
    assert_eq!(
        sizes[0]["is_available"], true,
        "no requirements means always in stock"
    );
    assert_eq!(dec_field(ramune, "base_price"), dec("45"));
}

#[tokio::test]
async fn category_and_search_filters_limit_the_menu() {
    let app = TestApp::new();
    seed_miso_ramen(&app).await;
    app.create_menu_item(flat_body("Gyoza", "side", "95", vec![])).await;

    let (_, ramen_only) = app.get("/menu?category=ramen").await;
    let items = ramen_only.as_array().expect("menu array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Miso Ramen");

    let (_, searched) = app.get("/menu?search=GYO").await;
    let items = searched.as_array().expect("menu array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Gyoza");

    let (_, none) = app.get("/menu?category=ramen&search=gyoza").await;
    assert_eq!(none.as_array().expect("menu array").len(), 0);
}

#[tokio::test]
async fn raw_catalog_listing_is_sorted_and_unannotated() {
    let app = TestApp::new();
    seed_miso_ramen(&app).await;
    app.create_menu_item(flat_body("Gyoza", "side", "95", vec![])).await;

    let (status, items) = app.get("/menu/items").await;
    assert_eq!(status, StatusCode::OK);
    let items = items.as_array().expect("catalog array");
    let names: Vec<&str> = items
        .iter()
        .map(|item| item["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Gyoza", "Miso Ramen"]);
    assert!(items[0].get("is_available").is_none(), "raw items carry no annotation");
}

#[tokio::test]
async fn pricing_shape_must_match_the_category() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/menu", flat_body("Shio Ramen", "ramen", "185", vec![]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "bad_request");

    let mut sized_side = ramen_body("Edamame", &[("classic", "65", vec![])]);
    sized_side["category"] = "side".into();
    let (status, body) = app.post("/menu", sized_side).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn duplicate_names_and_malformed_pricing_are_rejected() {
    let app = TestApp::new();
    app.create_menu_item(flat_body("Gyoza", "side", "95", vec![])).await;

    let (status, body) = app
        .post("/menu", flat_body("Gyoza", "side", "95", vec![]))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["error"], "conflict");

    let (status, body) = app.post("/menu", ramen_body("Shio Ramen", &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "validation");
}

/// Look a menu item id up by name through the raw listing.
async fn menu_item_id(app: &TestApp, name: &str) -> String {
    let (_, items) = app.get("/menu/items").await;
    items
        .as_array()
        .expect("catalog array")
        .iter()
        .find(|item| item["name"] == name)
        .and_then(|item| item["id"].as_str())
        .unwrap_or_else(|| panic!("menu item {name} not found"))
        .to_string()
}
