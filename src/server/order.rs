use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use super::extract::ApiJson;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::identity::IdentityContext;
use crate::models::{new_object_id, CartItem, DeliveryDetails, Order, OrderStatus, Restaurant};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub menu_item_id: String,
    pub quantity: u32,
}

/// Body of `POST /api/order`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub restaurant_id: String,
    pub delivery_details: DeliveryDetails,
    pub cart_items: Vec<CartItemRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

fn order_not_found() -> AppError { AppError::not_found("order_not_found", "order not found") }

/// Resolve cart lines against the menu and total them with the delivery price.
pub fn price_cart(restaurant: &Restaurant, items: &[CartItemRequest]) -> AppResult<(Vec<CartItem>, i64)> {
    if items.is_empty() {
        return Err(AppError::user("empty_cart", "Cart is empty"));
    }
    let mut lines = Vec::with_capacity(items.len());
    let mut total = restaurant.delivery_price;
    for item in items {
        let menu = restaurant
            .menu_item(&item.menu_item_id)
            .ok_or_else(|| AppError::user("unknown_menu_item".to_string(), format!("Menu item not found: {}", item.menu_item_id)))?;
        if item.quantity == 0 {
            return Err(AppError::user("invalid_quantity".to_string(), format!("Quantity must be positive for {}", menu.name)));
        }
        total = menu
            .price
            .checked_mul(i64::from(item.quantity))
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| AppError::user("invalid_total", "Order total is too large"))?;
        lines.push(CartItem { menu_item_id: menu.id.clone(), name: menu.name.clone(), quantity: item.quantity });
    }
    Ok((lines, total))
}

pub async fn create_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<IdentityContext>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<Order>)> {
    const FAILED: &str = "Something went wrong";
    let restaurant = state
        .store
        .find_restaurant(&req.restaurant_id)
        .map_err(|e| AppError::from(e).masked(FAILED))?
        .ok_or_else(|| AppError::not_found("restaurant_not_found", "restaurant not found"))?;
    let (cart_items, total_amount) = price_cart(&restaurant, &req.cart_items)?;
    let order = Order {
        id: new_object_id()?,
        restaurant: restaurant.id.clone(),
        user: ctx.user_id.clone(),
        delivery_details: req.delivery_details,
        cart_items,
        total_amount,
        status: OrderStatus::Placed,
        created_at: Utc::now(),
    };
    let saved = state.store.insert_order(order).map_err(|e| AppError::from(e).masked(FAILED))?;
    info!(target: "forkful::store", user = %ctx.user_id, order = %saved.id, total = saved.total_amount, "order placed");
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn get_my_orders(State(state): State<AppState>, Extension(ctx): Extension<IdentityContext>) -> AppResult<Json<Vec<Order>>> {
    state.store.orders_for_user(&ctx.user_id).map(Json).map_err(|e| AppError::from(e).masked("Something went wrong"))
}

pub async fn get_my_restaurant_orders(
    State(state): State<AppState>,
    Extension(ctx): Extension<IdentityContext>,
) -> AppResult<Json<Vec<Order>>> {
    const FAILED: &str = "Something went wrong";
    let restaurant = state
        .store
        .find_restaurant_by_owner(&ctx.user_id)
        .map_err(|e| AppError::from(e).masked(FAILED))?
        .ok_or_else(|| AppError::not_found("restaurant_not_found", "restaurant not found"))?;
    state.store.orders_for_restaurant(&restaurant.id).map(Json).map_err(|e| AppError::from(e).masked(FAILED))
}

/// Only the owner of the order's restaurant may move its status.
pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<IdentityContext>,
    Path(order_id): Path<String>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> AppResult<Json<Order>> {
    const FAILED: &str = "Unable to update order status";
    let order = state
        .store
        .find_order(&order_id)
        .map_err(|e| AppError::from(e).masked(FAILED))?
        .ok_or_else(order_not_found)?;
    let restaurant = state.store.find_restaurant(&order.restaurant).map_err(|e| AppError::from(e).masked(FAILED))?;
    if restaurant.as_ref().map(|r| r.user.as_str()) != Some(ctx.user_id.as_str()) {
        debug!(target: "forkful::auth", user = %ctx.user_id, order = %order.id, "status change by non-owner refused");
        return Err(AppError::unauthorized());
    }
    let status: OrderStatus = body.status.parse().map_err(|msg: String| AppError::user("invalid_status".to_string(), msg))?;
    match state.store.set_order_status(&order.id, status) {
        Ok(updated) => Ok(Json(updated)),
        Err(crate::storage::StoreError::NotFound { .. }) => Err(order_not_found()),
        Err(e) => Err(AppError::from(e).masked(FAILED)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MenuItem;

    fn restaurant() -> Restaurant {
        Restaurant {
            id: new_object_id().unwrap(),
            user: new_object_id().unwrap(),
            restaurant_name: "Deli".into(),
            city: "Leeds".into(),
            country: "UK".into(),
            delivery_price: 199,
            estimated_delivery_time: 20,
            cuisines: vec![],
            menu_items: vec![
                MenuItem { id: "m1".into(), name: "Bagel".into(), price: 350 },
                MenuItem { id: "m2".into(), name: "Coffee".into(), price: 220 },
            ],
            image_url: String::new(),
            last_updated: Utc::now(),
        }
    }

    fn line(id: &str, quantity: u32) -> CartItemRequest { CartItemRequest { menu_item_id: id.into(), quantity } }

    #[test]
    fn total_is_items_plus_delivery() {
        let (lines, total) = price_cart(&restaurant(), &[line("m1", 2), line("m2", 1)]).unwrap();
        assert_eq!(total, 350 * 2 + 220 + 199);
        assert_eq!(lines[0].name, "Bagel");
        assert_eq!(lines[1].quantity, 1);
    }

    #[test]
    fn bad_carts_are_user_errors() {
        let r = restaurant();
        assert_eq!(price_cart(&r, &[]).unwrap_err().http_status(), 400);
        assert_eq!(price_cart(&r, &[line("nope", 1)]).unwrap_err().http_status(), 400);
        assert_eq!(price_cart(&r, &[line("m1", 0)]).unwrap_err().http_status(), 400);
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let mut r = restaurant();
        r.menu_items[0].price = i64::MAX / 2 + 1;
        let err = price_cart(&r, &[line("m1", 2)]).unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.code_str(), "invalid_total");

        r.menu_items[0].price = i64::MAX - 199;
        assert_eq!(price_cart(&r, &[line("m1", 1)]).unwrap().1, i64::MAX);
        assert_eq!(price_cart(&r, &[line("m1", 1), line("m2", 1)]).unwrap_err().code_str(), "invalid_total");
    }
}
