use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use super::ProfileStore;
use crate::errors::MatchError;
use crate::{Profile, Role};

/// In-memory profile store. The default backend for development mode and
/// tests; single-key operations are atomic under the lock.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, id: &str) -> Result<Option<Profile>, MatchError> {
        let profiles = self.profiles.read().expect("store lock poisoned");
        Ok(profiles.get(id).cloned())
    }

    async fn put(&self, profile: Profile) -> Result<(), MatchError> {
        let mut profiles = self.profiles.write().expect("store lock poisoned");
        profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), MatchError> {
        let mut profiles = self.profiles.write().expect("store lock poisoned");
        match profiles.get_mut(id) {
            Some(profile) => {
                profile.deactivated = true;
                profile.updated_at = Utc::now();
                Ok(())
            }
            None => Err(MatchError::ProfileNotFound(id.to_string())),
        }
    }

    async fn list_eligible(
        &self,
        role: Role,
        exclude_deactivated: bool,
    ) -> Result<Vec<String>, MatchError> {
        let profiles = self.profiles.read().expect("store lock poisoned");
        let mut ids: Vec<String> = profiles
            .values()
            .filter(|p| p.role == role && !(exclude_deactivated && p.deactivated))
            .map(|p| p.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
