use super::{SharedStore, StoreError, StoreResult};
use crate::models::Restaurant;

impl SharedStore {
    /// Insert a restaurant; an account may own only one.
    pub fn insert_restaurant(&self, restaurant: Restaurant) -> StoreResult<Restaurant> {
        self.write(|c| {
            if c.restaurant_by_owner.contains_key(&restaurant.user) {
                return Err(StoreError::DuplicateKey { collection: "restaurants", index: "user", key: restaurant.user.clone() });
            }
            c.restaurant_by_owner.insert(restaurant.user.clone(), restaurant.id.clone());
            c.restaurants.insert(restaurant.id.clone(), restaurant.clone());
            Ok(restaurant)
        })
    }

    pub fn find_restaurant(&self, id: &str) -> StoreResult<Option<Restaurant>> {
        self.read(|c| c.restaurants.get(id).cloned())
    }

    pub fn find_restaurant_by_owner(&self, user_id: &str) -> StoreResult<Option<Restaurant>> {
        self.read(|c| c.restaurant_by_owner.get(user_id).and_then(|id| c.restaurants.get(id)).cloned())
    }

    /// Overwrite a restaurant document. Owner and id stay fixed.
    pub fn update_restaurant(&self, restaurant: &Restaurant) -> StoreResult<Restaurant> {
        self.write(|c| {
            let Some(existing) = c.restaurants.get_mut(&restaurant.id) else {
                return Err(StoreError::NotFound { collection: "restaurants", id: restaurant.id.clone() });
            };
            let owner = existing.user.clone();
            *existing = restaurant.clone();
            existing.user = owner;
            Ok(existing.clone())
        })
    }

    /// All restaurants whose city matches case-insensitively, in no particular order.
    pub fn restaurants_in_city(&self, city: &str) -> StoreResult<Vec<Restaurant>> {
        let needle = city.trim();
        self.read(|c| c.restaurants.values().filter(|r| r.city.eq_ignore_ascii_case(needle)).cloned().collect())
    }
}
