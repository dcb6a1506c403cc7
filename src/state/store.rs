//! State store trait definition.
//!
//! This module defines the common interface for state storage backends.

use async_trait::async_trait;

use super::types::SyncState;
use crate::error::Result;

/// Trait for state storage backends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads the stored state.
    ///
    /// Returns `None` if no state exists yet.
    async fn load(&self) -> Result<Option<SyncState>>;

    /// Saves the state.
    async fn save(&self, state: &SyncState) -> Result<()>;

    /// Deletes the stored state.
    async fn delete(&self) -> Result<()>;

    /// Checks if state exists.
    async fn exists(&self) -> Result<bool>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}

#[async_trait]
impl StateStore for Box<dyn StateStore> {
    async fn load(&self) -> Result<Option<SyncState>> {
        (**self).load().await
    }

    async fn save(&self, state: &SyncState) -> Result<()> {
        (**self).save(state).await
    }

    async fn delete(&self) -> Result<()> {
        (**self).delete().await
    }

    async fn exists(&self) -> Result<bool> {
        (**self).exists().await
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }
}
