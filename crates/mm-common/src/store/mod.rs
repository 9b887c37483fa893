pub mod memory;

pub use memory::MemoryProfileStore;

use async_trait::async_trait;

use crate::errors::MatchError;
use crate::{Profile, Role};

/// Narrow persistence boundary for profiles. The store exclusively owns
/// profile lifecycle; the vector index holds a projection that the
/// mutating caller keeps in sync with explicit upsert/delete calls.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Profile>, MatchError>;

    /// Insert or replace a profile.
    async fn put(&self, profile: Profile) -> Result<(), MatchError>;

    /// Tombstone a profile: the record stays for audit with
    /// `deactivated = true`. Fails with `ProfileNotFound` when absent.
    async fn delete(&self, id: &str) -> Result<(), MatchError>;

    /// Ids of profiles with the given role, ascending. Used for role
    /// exclusion sets and index rebuilds.
    async fn list_eligible(
        &self,
        role: Role,
        exclude_deactivated: bool,
    ) -> Result<Vec<String>, MatchError>;
}
