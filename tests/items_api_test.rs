//! Integration tests for the item catalog, low-stock alerts and export.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{response_json, response_text, TestApp};
use scanner_log_api::{entities::notification, services::export::CSV_HEADER};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};
use uuid::Uuid;

fn names(items: &Value) -> Vec<String> {
    items
        .as_array()
        .expect("item list")
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect()
}

async fn seed_catalog(app: &TestApp, token: &str) {
    for payload in [
        json!({"name": "Barcode Scanner", "sku": "BS-001", "quantity": 40,
               "description": "Scratch-resistant housing", "category": "hardware",
               "location": "A1"}),
        json!({"name": "Label Printer", "sku": "LP-002", "quantity": 8,
               "description": "Thermal, prints SCR labels", "category": "hardware",
               "location": "B2"}),
        json!({"name": "Cable", "sku": "SCR-USB", "quantity": 120,
               "category": "accessories", "location": "A1"}),
        json!({"name": "Toner", "sku": "TN-004", "quantity": 3,
               "category": "supplies", "location": "C3"}),
    ] {
        app.create_item(token, payload).await;
    }
}

#[tokio::test]
async fn create_item_applies_defaults() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;

    let item = app
        .create_item(&token, json!({"name": "Scanner", "sku": "SCN-1", "quantity": 50}))
        .await;
    assert_eq!(item["name"], "Scanner");
    assert_eq!(item["min_quantity"], 10);
    assert!(item["description"].is_null());
    assert!(Uuid::parse_str(item["id"].as_str().unwrap()).is_ok());

    let me = response_json(app.request(Method::GET, "/users/me", None, Some(&token)).await).await;
    assert_eq!(item["created_by"], me["id"]);
}

#[tokio::test]
async fn low_stock_creation_notifies_creator_once() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;

    let low = app
        .create_item(
            &token,
            json!({"name": "Scanner", "sku": "SCN-1", "quantity": 5, "min_quantity": 10}),
        )
        .await;
    app.create_item(
        &token,
        json!({"name": "Printer", "sku": "PRN-1", "quantity": 20, "min_quantity": 10}),
    )
    .await;

    let notifications = app.notifications(&token).await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["item_id"], low["id"]);
    assert_eq!(notifications[0]["is_read"], false);
    assert!(notifications[0]["message"]
        .as_str()
        .unwrap()
        .contains("SCN-1"));
}

#[tokio::test]
async fn quantity_equal_to_minimum_counts_as_low() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;

    app.create_item(
        &token,
        json!({"name": "Scanner", "sku": "SCN-1", "quantity": 10, "min_quantity": 10}),
    )
    .await;
    assert_eq!(app.notifications(&token).await.len(), 1);
}

#[tokio::test]
async fn each_low_stock_update_records_a_notification() {
    let app = TestApp::new().await;
    let creator = app.user_token("alice").await;
    let editor = app.user_token("bob").await;

    let item = app
        .create_item(&creator, json!({"name": "Scanner", "sku": "SCN-1", "quantity": 50}))
        .await;
    let uri = format!("/items/{}", item["id"].as_str().unwrap());

    for expected in 1..=2 {
        let response = app
            .request(Method::PUT, &uri, Some(json!({"quantity": 3})), Some(&editor))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await["quantity"], 3);
        assert_eq!(app.notifications(&editor).await.len(), expected);
    }

    // Alerts follow the acting user, not the creator
    assert!(app.notifications(&creator).await.is_empty());
}

#[tokio::test]
async fn update_changes_only_supplied_fields() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;

    let item = app
        .create_item(
            &token,
            json!({"name": "Scanner", "sku": "SCN-1", "quantity": 50,
                   "category": "hardware", "location": "A1"}),
        )
        .await;
    let uri = format!("/items/{}", item["id"].as_str().unwrap());

    let response = app
        .request(Method::PUT, &uri, Some(json!({"location": "B7"})), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;
    assert_eq!(updated["location"], "B7");
    assert_eq!(updated["category"], "hardware");
    assert_eq!(updated["quantity"], 50);

    // Empty patch leaves the row alone
    let response = app.request(Method::PUT, &uri, Some(json!({})), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["location"], "B7");
    assert!(app.notifications(&token).await.is_empty());
}

#[tokio::test]
async fn duplicate_sku_is_rejected() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;

    app.create_item(&token, json!({"name": "Scanner", "sku": "SCN-1"}))
        .await;
    let other = app
        .create_item(&token, json!({"name": "Printer", "sku": "PRN-1", "quantity": 30}))
        .await;

    let response = app
        .request(
            Method::POST,
            "/items",
            Some(json!({"name": "Clone", "sku": "SCN-1"})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/items/{}", other["id"].as_str().unwrap());
    let response = app
        .request(Method::PUT, &uri, Some(json!({"sku": "SCN-1"})), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_removes_item_and_its_notifications() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;

    let item = app
        .create_item(&token, json!({"name": "Scanner", "sku": "SCN-1", "quantity": 1}))
        .await;
    let id = Uuid::parse_str(item["id"].as_str().unwrap()).unwrap();
    let uri = format!("/items/{}", id);
    app.request(Method::PUT, &uri, Some(json!({"quantity": 0})), Some(&token))
        .await;
    assert_eq!(app.notifications(&token).await.len(), 2);

    let response = app.request(Method::DELETE, &uri, None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let remaining = notification::Entity::find()
        .filter(notification::Column::ItemId.eq(id))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    let response = app.request(Method::GET, &uri, None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.request(Method::DELETE, &uri, None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_or_malformed_item_ids() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;

    let missing = format!("/items/{}", Uuid::new_v4());
    let response = app.request(Method::GET, &missing, None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::PUT, &missing, Some(json!({"quantity": 1})), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::GET, "/items/not-a-uuid", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn item_routes_require_authentication() {
    let app = TestApp::new().await;

    for (method, uri) in [
        (Method::GET, "/items"),
        (Method::POST, "/items"),
        (Method::GET, "/items/export?format=csv"),
        (Method::GET, "/notifications"),
    ] {
        let response = app.request(method, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn list_is_ordered_by_name_and_paginated() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;
    seed_catalog(&app, &token).await;

    let all = response_json(app.request(Method::GET, "/items", None, Some(&token)).await).await;
    assert_eq!(
        names(&all),
        vec!["Barcode Scanner", "Cable", "Label Printer", "Toner"]
    );

    let page = response_json(
        app.request(Method::GET, "/items/?skip=1&limit=2", None, Some(&token))
            .await,
    )
    .await;
    assert_eq!(names(&page), vec!["Cable", "Label Printer"]);

    let empty = response_json(
        app.request(Method::GET, "/items?limit=0", None, Some(&token))
            .await,
    )
    .await;
    assert!(names(&empty).is_empty());
}

#[tokio::test]
async fn search_matches_name_description_and_sku() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;
    seed_catalog(&app, &token).await;

    let found = response_json(
        app.request(Method::GET, "/items?search=scr", None, Some(&token))
            .await,
    )
    .await;
    assert_eq!(names(&found), vec!["Barcode Scanner", "Cable", "Label Printer"]);
}

#[tokio::test]
async fn search_handles_accented_terms() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;
    app.create_item(&token, json!({"name": "Écran tactile", "sku": "ÉCR-1", "quantity": 30}))
        .await;
    app.create_item(&token, json!({"name": "Scanner", "sku": "SCN-1", "quantity": 30}))
        .await;

    // "Écran" and "ÉCR", percent-encoded
    for query in ["search=%C3%89cran", "search=%C3%89CR"] {
        let found = response_json(
            app.request(Method::GET, &format!("/items?{}", query), None, Some(&token))
                .await,
        )
        .await;
        assert_eq!(names(&found), vec!["Écran tactile"], "{}", query);
    }
}

#[tokio::test]
async fn filters_combine() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;
    seed_catalog(&app, &token).await;

    let hardware = response_json(
        app.request(Method::GET, "/items?category=hardware", None, Some(&token))
            .await,
    )
    .await;
    assert_eq!(names(&hardware), vec!["Barcode Scanner", "Label Printer"]);

    let in_a1_with_stock = response_json(
        app.request(
            Method::GET,
            "/items?location=A1&min_quantity=50",
            None,
            Some(&token),
        )
        .await,
    )
    .await;
    assert_eq!(names(&in_a1_with_stock), vec!["Cable"]);

    let scarce = response_json(
        app.request(Method::GET, "/items?max_quantity=8", None, Some(&token))
            .await,
    )
    .await;
    assert_eq!(names(&scarce), vec!["Label Printer", "Toner"]);
}

#[tokio::test]
async fn export_rejects_unknown_format() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;

    let response = app
        .request(Method::GET, "/items/export?format=xml", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .request(Method::GET, "/items/export", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn export_csv_is_an_attachment_with_header_row() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;
    seed_catalog(&app, &token).await;

    let response = app
        .request(Method::GET, "/items/export?format=csv", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/csv");
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=items.csv"
    );

    let body = response_text(response).await;
    let mut lines = body.lines();
    assert_eq!(lines.next().unwrap(), CSV_HEADER.join(","));
    assert_eq!(lines.count(), 4);
}

#[tokio::test]
async fn export_json_is_an_array_of_items() {
    let app = TestApp::new().await;
    let token = app.user_token("alice").await;
    seed_catalog(&app, &token).await;

    let response = app
        .request(Method::GET, "/items/export?format=json", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=items.json"
    );
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
}
