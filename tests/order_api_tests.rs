mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

use common::*;
use forkful::models::{new_object_id, MenuItem, Restaurant};

/// Owner account with a restaurant serving two dishes, plus a customer account.
fn seed(app: &TestApp) -> Restaurant {
    let owner = app.account("auth0|owner");
    app.account("auth0|customer");
    app.store
        .insert_restaurant(Restaurant {
            id: new_object_id().unwrap(),
            user: owner.id,
            restaurant_name: "Deli".into(),
            city: "Leeds".into(),
            country: "UK".into(),
            delivery_price: 199,
            estimated_delivery_time: 20,
            cuisines: vec!["Sandwiches".into()],
            menu_items: vec![
                MenuItem { id: "m1".into(), name: "Bagel".into(), price: 350 },
                MenuItem { id: "m2".into(), name: "Coffee".into(), price: 220 },
            ],
            image_url: "https://img.test/deli.png".into(),
            last_updated: Utc::now(),
        })
        .unwrap()
}

fn order_body(restaurant_id: &str, items: serde_json::Value) -> serde_json::Value {
    json!({
        "restaurantId": restaurant_id,
        "deliveryDetails": { "email": "c@example.com", "name": "Cam", "addressLine1": "2 Low St", "city": "Leeds" },
        "cartItems": items,
    })
}

async fn place(app: &TestApp, restaurant_id: &str) -> serde_json::Value {
    let body = order_body(restaurant_id, json!([{ "menuItemId": "m1", "quantity": 2 }, { "menuItemId": "m2", "quantity": 1 }]));
    let (status, order) = app.send_json(json_request("POST", "/api/order", Some("auth0|customer"), body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    order
}

#[tokio::test]
async fn placing_an_order_prices_the_cart() {
    let app = TestApp::new();
    let restaurant = seed(&app);
    let order = place(&app, &restaurant.id).await;
    assert_eq!(order["status"], "placed");
    assert_eq!(order["totalAmount"], 350 * 2 + 220 + 199);
    assert_eq!(order["cartItems"][0]["name"], "Bagel");
    assert_eq!(order["restaurant"], restaurant.id.as_str());
}

#[tokio::test]
async fn bad_orders_are_rejected() {
    let app = TestApp::new();
    let restaurant = seed(&app);

    let unknown_restaurant = order_body("ffffffffffffffffffffffff", json!([{ "menuItemId": "m1", "quantity": 1 }]));
    let (status, _) = app.send_json(json_request("POST", "/api/order", Some("auth0|customer"), unknown_restaurant)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let unknown_item = order_body(&restaurant.id, json!([{ "menuItemId": "m9", "quantity": 1 }]));
    let (status, _) = app.send_json(json_request("POST", "/api/order", Some("auth0|customer"), unknown_item)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let empty = order_body(&restaurant.id, json!([]));
    let (status, _) = app.send_json(json_request("POST", "/api/order", Some("auth0|customer"), empty)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_are_listed_for_customer_and_owner() {
    let app = TestApp::new();
    let restaurant = seed(&app);
    let first = place(&app, &restaurant.id).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = place(&app, &restaurant.id).await;

    let (status, mine) = app.send_json(empty_request("GET", "/api/order", Some("auth0|customer"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["_id"], second["_id"]);
    assert_eq!(mine[1]["_id"], first["_id"]);

    let (status, incoming) = app.send_json(empty_request("GET", "/api/my/restaurant/order", Some("auth0|owner"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(incoming.as_array().unwrap().len(), 2);

    let (status, _) = app.send_json(empty_request("GET", "/api/my/restaurant/order", Some("auth0|customer"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, owner_orders) = app.send_json(empty_request("GET", "/api/order", Some("auth0|owner"))).await;
    assert_eq!(owner_orders, json!([]));
}

#[tokio::test]
async fn owner_moves_order_status() {
    let app = TestApp::new();
    let restaurant = seed(&app);
    let order = place(&app, &restaurant.id).await;
    let uri = format!("/api/my/restaurant/order/{}/status", order["_id"].as_str().unwrap());

    let (status, updated) = app.send_json(json_request("PATCH", &uri, Some("auth0|owner"), json!({ "status": "outForDelivery" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "outForDelivery");
    assert_eq!(updated["_id"], order["_id"]);
}

#[tokio::test]
async fn status_update_guards() {
    let app = TestApp::new();
    let restaurant = seed(&app);
    let order = place(&app, &restaurant.id).await;
    let uri = format!("/api/my/restaurant/order/{}/status", order["_id"].as_str().unwrap());

    let (status, body) = app.send(json_request("PATCH", &uri, Some("auth0|customer"), json!({ "status": "delivered" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.is_empty());

    let (status, body) = app
        .send_json(json_request("PATCH", "/api/my/restaurant/order/ffffffffffffffffffffffff/status", Some("auth0|owner"), json!({ "status": "paid" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "order not found");

    let (status, _) = app.send_json(json_request("PATCH", &uri, Some("auth0|owner"), json!({ "status": "shipped" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, unchanged) = app.send_json(empty_request("GET", "/api/order", Some("auth0|customer"))).await;
    assert_eq!(unchanged[0]["status"], "placed");
}
