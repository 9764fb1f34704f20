use crate::clock;
use crate::error::StoreResult;
use crate::models::{User, UserRole};
use crate::schema::USER_ROLE;
use guidestore_core::{Collection, Engine, EntityId, IndexValue};
use std::sync::Arc;

/// Access to activated users.
///
/// An installation is assumed to have a single user; see
/// [`get_current_user`](Self::get_current_user).
#[derive(Clone)]
pub struct UserRepository {
    users: Collection<User>,
}

impl UserRepository {
    /// Creates a repository over `engine`.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            users: Collection::new(engine),
        }
    }

    /// Gets a user by id.
    pub fn get(&self, id: EntityId) -> StoreResult<Option<User>> {
        Ok(self.users.get(id)?)
    }

    /// Inserts a user.
    pub fn insert(&self, user: &mut User) -> StoreResult<EntityId> {
        Ok(self.users.insert(user)?)
    }

    /// Saves `user`. Returns `false` if it does not exist.
    pub fn update(&self, user: &User) -> StoreResult<bool> {
        Ok(self.users.update(user)?)
    }

    /// Deletes a user.
    pub fn delete(&self, id: EntityId) -> StoreResult<bool> {
        Ok(self.users.delete(id)?)
    }

    /// The installation's user: the earliest activated one.
    pub fn get_current_user(&self) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .all()?
            .into_iter()
            .min_by_key(|u| (u.activated_at, u.id)))
    }

    /// Stamps `last_login` with the current time and saves the user.
    pub fn update_last_login(&self, user: &mut User) -> StoreResult<bool> {
        user.last_login = clock::now();
        self.update(user)
    }

    /// Users with `role`.
    pub fn get_by_role(&self, role: UserRole) -> StoreResult<Vec<User>> {
        Ok(self
            .users
            .find_by_index(USER_ROLE, IndexValue::of(&role)?)?)
    }
}
