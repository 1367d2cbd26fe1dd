use super::{SharedStore, StoreError, StoreResult};
use crate::models::{Order, OrderStatus};

impl SharedStore {
    pub fn insert_order(&self, order: Order) -> StoreResult<Order> {
        self.write(|c| {
            if c.orders.contains_key(&order.id) {
                return Err(StoreError::DuplicateKey { collection: "orders", index: "_id", key: order.id.clone() });
            }
            c.orders.insert(order.id.clone(), order.clone());
            Ok(order)
        })
    }

    pub fn find_order(&self, id: &str) -> StoreResult<Option<Order>> {
        self.read(|c| c.orders.get(id).cloned())
    }

    pub fn set_order_status(&self, id: &str, status: OrderStatus) -> StoreResult<Order> {
        self.write(|c| {
            let Some(order) = c.orders.get_mut(id) else {
                return Err(StoreError::NotFound { collection: "orders", id: id.to_string() });
            };
            order.status = status;
            Ok(order.clone())
        })
    }

    /// Orders placed by an account, newest first.
    pub fn orders_for_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        self.read(|c| newest_first(c.orders.values().filter(|o| o.user == user_id).cloned().collect()))
    }

    /// Orders placed against a restaurant, newest first.
    pub fn orders_for_restaurant(&self, restaurant_id: &str) -> StoreResult<Vec<Order>> {
        self.read(|c| newest_first(c.orders.values().filter(|o| o.restaurant == restaurant_id).cloned().collect()))
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    orders
}
