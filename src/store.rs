use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use uuid::Uuid;

use crate::{error::StoreError, models::User};

/// In-memory user table. Every operation, reads included, runs under
/// the same exclusive lock.
#[derive(Debug, Default)]
pub struct UserStore {
    users: Mutex<HashMap<String, User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Operations never leave the map half-updated, so a poisoned lock
    // still guards a consistent table.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts `user` under a freshly generated id and returns the id.
    pub fn create(&self, user: User) -> String {
        let id = Uuid::new_v4().to_string();
        self.lock().insert(id.clone(), user);
        id
    }

    pub fn get_all(&self) -> HashMap<String, User> {
        self.lock().clone()
    }

    pub fn get(&self, id: &str) -> Result<User, StoreError> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// Replaces the whole record stored under `id`.
    pub fn update(&self, id: &str, user: User) -> Result<User, StoreError> {
        let mut users = self.lock();
        let slot = users
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
        *slot = user.clone();
        Ok(user)
    }

    /// Removes the record under `id`, returning what was stored.
    pub fn delete(&self, id: &str) -> Result<User, StoreError> {
        self.lock()
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, sync::Arc, thread};

    fn ada() -> User {
        User {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            biography: "pioneer".into(),
        }
    }

    #[test]
    fn create_then_get_returns_same_record() {
        let store = UserStore::new();
        let id = store.create(ada());

        assert_eq!(store.get(&id), Ok(ada()));
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn create_returns_fresh_ids() {
        let store = UserStore::new();
        let ids: HashSet<_> = (0..100).map(|_| store.create(ada())).collect();

        assert_eq!(ids.len(), 100);
        assert_eq!(store.get_all().len(), 100);
    }

    #[test]
    fn get_all_counts_creates_minus_deletes() {
        let store = UserStore::new();
        let ids: Vec<_> = (0..5).map(|_| store.create(ada())).collect();
        store.delete(&ids[0]).unwrap();
        store.delete(&ids[3]).unwrap();

        let all = store.get_all();
        assert_eq!(all.len(), 3);
        assert!(!all.contains_key(&ids[0]));
        assert!(all.contains_key(&ids[1]));
    }

    #[test]
    fn update_replaces_every_field() {
        let store = UserStore::new();
        let id = store.create(ada());
        let replacement = User {
            first_name: "Grace".into(),
            ..User::default()
        };

        assert_eq!(store.update(&id, replacement.clone()), Ok(replacement.clone()));
        assert_eq!(store.get(&id), Ok(replacement));
    }

    #[test]
    fn missing_ids_report_not_found_and_leave_store_alone() {
        let store = UserStore::new();
        let id = store.create(ada());
        let missing = Uuid::new_v4().to_string();
        let err = StoreError::NotFound(missing.clone());

        assert_eq!(store.get(&missing), Err(err.clone()));
        assert_eq!(store.update(&missing, User::default()), Err(err.clone()));
        assert_eq!(store.delete(&missing), Err(err));
        assert!(!store.contains(&missing));
        assert_eq!(store.get_all(), HashMap::from([(id, ada())]));
    }

    #[test]
    fn delete_succeeds_once() {
        let store = UserStore::new();
        let id = store.create(ada());

        assert_eq!(store.delete(&id), Ok(ada()));
        assert_eq!(store.delete(&id), Err(StoreError::NotFound(id.clone())));
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn concurrent_creates_are_all_kept() {
        let store = Arc::new(UserStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..50 {
                        store.create(ada());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_all().len(), 400);
    }
}
