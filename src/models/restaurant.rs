use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Minor currency units.
    pub price: i64,
}

/// A restaurant listing; each account owns at most one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    #[serde(rename = "_id")]
    pub id: String,
    /// Internal id of the owning account.
    pub user: String,
    pub restaurant_name: String,
    pub city: String,
    pub country: String,
    pub delivery_price: i64,
    /// Minutes.
    pub estimated_delivery_time: i64,
    pub cuisines: Vec<String>,
    pub menu_items: Vec<MenuItem>,
    pub image_url: String,
    pub last_updated: DateTime<Utc>,
}

impl Restaurant {
    pub fn menu_item(&self, id: &str) -> Option<&MenuItem> {
        self.menu_items.iter().find(|m| m.id == id)
    }

    pub fn has_cuisine(&self, cuisine: &str) -> bool {
        self.cuisines.iter().any(|c| c.eq_ignore_ascii_case(cuisine))
    }
}
