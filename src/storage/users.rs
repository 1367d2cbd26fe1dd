use super::{IdentityStore, SharedStore, StoreError, StoreResult};
use crate::models::User;

impl IdentityStore for SharedStore {
    fn find_user_by_auth0_id(&self, auth0_id: &str) -> StoreResult<Option<User>> {
        self.read(|c| c.user_by_auth0.get(auth0_id).and_then(|id| c.users.get(id)).cloned())
    }

    fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.read(|c| c.users.get(id).cloned())
    }

    fn insert_user(&self, user: User) -> StoreResult<User> {
        self.write(|c| {
            if c.user_by_auth0.contains_key(&user.auth0_id) {
                return Err(StoreError::DuplicateKey { collection: "users", index: "auth0Id", key: user.auth0_id.clone() });
            }
            if c.users.contains_key(&user.id) {
                return Err(StoreError::DuplicateKey { collection: "users", index: "_id", key: user.id.clone() });
            }
            c.user_by_auth0.insert(user.auth0_id.clone(), user.id.clone());
            c.users.insert(user.id.clone(), user.clone());
            Ok(user)
        })
    }

    fn update_user(&self, user: &User) -> StoreResult<User> {
        self.write(|c| {
            let Some(existing) = c.users.get_mut(&user.id) else {
                return Err(StoreError::NotFound { collection: "users", id: user.id.clone() });
            };
            existing.email = user.email.clone();
            existing.name = user.name.clone();
            existing.address_line1 = user.address_line1.clone();
            existing.city = user.city.clone();
            existing.country = user.country.clone();
            Ok(existing.clone())
        })
    }
}
