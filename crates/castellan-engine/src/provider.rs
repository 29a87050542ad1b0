//! Persistence collaborator interfaces
//!
//! The engine never touches storage itself; the surrounding system
//! provides these two traits. [`PermissionsProvider`] feeds ability
//! generation, [`PermissionStore`] backs the paged database
//! reconciliation.

use async_trait::async_trait;
use castellan_core::{Principal, Result};
use castellan_domain::Permission;

/// Looks up a principal's stored permissions, keyed by its roles (admin
/// users) or its stored permission list (tokens)
#[async_trait]
pub trait PermissionsProvider: Send + Sync {
    /// All permissions that apply to the given principal
    async fn find_user_permissions(&self, principal: &Principal) -> Result<Vec<Permission>>;
}

/// Paged access to the persisted permission table
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Fetch one page of permissions; pages are 1-based
    async fn find_page(&self, page: usize, page_size: usize) -> Result<Vec<Permission>>;

    /// Delete the permissions with the given ids in one batch
    async fn delete_by_ids(&self, ids: &[i64]) -> Result<()>;

    /// Rewrite a single permission
    async fn update(&self, id: i64, permission: &Permission) -> Result<()>;
}
