//! Document types persisted by the store and served over HTTP.
//! Field names on the wire follow the web client's camelCase convention and
//! every document carries its internal identifier as `_id`.

mod order;
mod restaurant;
mod user;

pub use order::{CartItem, DeliveryDetails, Order, OrderStatus};
pub use restaurant::{MenuItem, Restaurant};
pub use user::User;

use std::fmt::Write as _;

/// Generate a new 24-hex-character document identifier (96 random bits).
pub fn new_object_id() -> Result<String, getrandom::Error> {
    let mut bytes = [0u8; 12];
    getrandom::getrandom(&mut bytes)?;
    let mut id = String::with_capacity(24);
    for b in &bytes { let _ = write!(&mut id, "{:02x}", b); }
    Ok(id)
}
