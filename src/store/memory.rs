use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use super::{CredentialStore, UserCredential};
use crate::error::DatabaseError;

/// In-process credential store keyed by username
///
/// Cloning is cheap and all clones share the same map. Records live for the
/// lifetime of the process.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    users: Arc<RwLock<HashMap<String, UserCredential>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredential>, DatabaseError> {
        Ok(self.users.read().get(username).cloned())
    }

    async fn insert(&self, credential: &UserCredential) -> Result<(), DatabaseError> {
        // Check and insert under one write lock
        let mut users = self.users.write();
        match users.entry(credential.username.clone()) {
            Entry::Occupied(_) => Err(DatabaseError::DuplicateUser(credential.username.clone())),
            Entry::Vacant(slot) => {
                slot.insert(credential.clone());
                Ok(())
            }
        }
    }
}
