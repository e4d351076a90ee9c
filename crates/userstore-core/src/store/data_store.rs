use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;
use crate::cache::CachedData;
use crate::models::{ApiMessage, NewUser, User, UserId, UserUpdate};

/// Cached user list plus a selection pointer into it.
///
/// Locks are only held for the duration of a read or a swap, never across
/// an `.await`. Two overlapping `fetch_all_users` calls therefore race, and
/// whichever response lands last wins.
pub struct DataStore {
    api: ApiClient,
    users: RwLock<CachedData<Vec<User>>>,
    selected: RwLock<Option<User>>,
}

impl DataStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            users: RwLock::new(CachedData::default()),
            selected: RwLock::new(None),
        }
    }

    /// Convenience for the usual `Arc<DataStore>` handle
    pub fn shared(api: ApiClient) -> Arc<Self> {
        Arc::new(Self::new(api))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn users_read(&self) -> RwLockReadGuard<'_, CachedData<Vec<User>>> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn users_write(&self) -> RwLockWriteGuard<'_, CachedData<Vec<User>>> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn selected_write(&self) -> RwLockWriteGuard<'_, Option<User>> {
        self.selected.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Users =====

    /// Fetch the full user list and replace the cache with it.
    ///
    /// On failure the error is logged and returned; the cache is untouched.
    pub async fn fetch_all_users(&self) -> Result<Vec<User>> {
        match self.api.fetch_users().await {
            Ok(users) => {
                info!(count = users.len(), "Users fetched");
                self.users_write().replace(users.clone());
                Ok(users)
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch users");
                Err(e)
            }
        }
    }

    /// Snapshot of the cached users, in backend order
    pub fn users(&self) -> Vec<User> {
        self.users_read().data.clone()
    }

    /// How long ago the cache was filled, e.g. "5m ago" or "never"
    pub fn users_age(&self) -> String {
        self.users_read().age_display()
    }

    /// Select the first cached user with a matching id.
    ///
    /// A miss clears the selection and logs a warning; it is not an error.
    pub fn select_user_by_id(&self, id: UserId) -> Option<User> {
        let found = self.users_read().data.iter().find(|u| u.id == id).cloned();
        match found {
            Some(ref user) => debug!(id, name = %user.display_name(), "User selected"),
            None => warn!(id, "No cached user with this id, selection cleared"),
        }
        *self.selected_write() = found.clone();
        found
    }

    pub fn selected_user(&self) -> Option<User> {
        self.selected.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Load users, logging and swallowing any failure.
    ///
    /// Nothing retries a failed initialize; call it again to try again.
    pub async fn initialize(&self) {
        if let Err(e) = self.fetch_all_users().await {
            error!(error = %e, "Initialization failed, continuing without users");
        }
    }

    // ===== Mutations =====
    // These go straight to the backend. The cache only changes on the next fetch.

    pub async fn create_user(&self, user: &NewUser) -> Result<ApiMessage> {
        self.api.create_user(user).await.inspect_err(|e| {
            error!(email = %user.email, error = %e, "Failed to create user");
        })
    }

    pub async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<ApiMessage> {
        self.api.update_user(id, update).await.inspect_err(|e| {
            error!(id, error = %e, "Failed to update user");
        })
    }

    pub async fn delete_user(&self, id: UserId) -> Result<ApiMessage> {
        self.api.delete_user(id).await.inspect_err(|e| {
            error!(id, error = %e, "Failed to delete user");
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use reqwest::Url;

    fn offline_store() -> DataStore {
        // Port 9 (discard) is never contacted by these tests
        let api = ApiClient::new(
            Url::parse("http://127.0.0.1:9/").unwrap(),
            Arc::new(MemoryTokenStore::new("token")),
        )
        .unwrap();
        DataStore::new(api)
    }

    fn seed(store: &DataStore, ids: &[UserId]) {
        store.users_write().replace(ids.iter().copied().map(User::new).collect());
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = offline_store();
        assert!(store.users().is_empty());
        assert_eq!(store.selected_user(), None);
        assert_eq!(store.users_age(), "never");
    }

    #[test]
    fn test_select_user_by_id() {
        let store = offline_store();
        seed(&store, &[4, 5, 6]);

        let selected = store.select_user_by_id(5);
        assert_eq!(selected, Some(User::new(5)));
        assert_eq!(store.selected_user(), Some(User::new(5)));
    }

    #[test]
    fn test_select_picks_first_duplicate() {
        let store = offline_store();
        let mut first = User::new(7);
        first.name = Some("first".to_string());
        let mut second = User::new(7);
        second.name = Some("second".to_string());
        store.users_write().replace(vec![first.clone(), second]);

        assert_eq!(store.select_user_by_id(7), Some(first));
    }

    #[test]
    fn test_select_miss_clears_selection() {
        let store = offline_store();
        seed(&store, &[4, 5, 6]);

        store.select_user_by_id(4);
        assert!(store.selected_user().is_some());

        assert_eq!(store.select_user_by_id(99), None);
        assert_eq!(store.selected_user(), None);
    }

    #[test]
    fn test_select_on_empty_cache() {
        let store = offline_store();
        assert_eq!(store.select_user_by_id(1), None);
        assert_eq!(store.selected_user(), None);
    }

    #[test]
    fn test_users_age_after_seed() {
        let store = offline_store();
        seed(&store, &[]);
        assert_eq!(store.users_age(), "just now");
    }
}
