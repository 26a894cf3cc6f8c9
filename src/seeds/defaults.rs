//! Default roles
//!
//! Every installation starts with a regular role and an admin role that may
//! delete members.

use anyhow::Result;
use sea_orm::DatabaseConnection;

use super::{ensure_permission, ensure_role};

pub const DELETE_MEMBERS_PERMISSION: &str = "Can delete members";
pub const REGULAR_ROLE: &str = "Regular - Can't delete members";
pub const ADMIN_ROLE: &str = "Admin - Can delete members";

/// Seeds the default permission and roles. Safe to run repeatedly.
pub async fn seed_defaults(db: &DatabaseConnection) -> Result<()> {
    let delete_members = ensure_permission(db, DELETE_MEMBERS_PERMISSION).await?;

    ensure_role(db, REGULAR_ROLE, false, &[]).await?;
    ensure_role(db, ADMIN_ROLE, true, &[&delete_members]).await?;

    log::info!("Default roles seeded");
    Ok(())
}
