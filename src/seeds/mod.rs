//! Database seeding functionality
//!
//! Idempotent get-or-create seeds: the default roles every installation
//! starts with, and an optional demo fixture for local development.

pub mod defaults;
pub mod demo;

pub use defaults::seed_defaults;
pub use demo::seed_demo;

use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;

use crate::models::{permission, role};
use crate::repositories::{PermissionInput, PermissionRepository, RoleInput, RoleRepository};

/// Returns the permission called `name`, creating it if missing.
pub(crate) async fn ensure_permission(
    db: &DatabaseConnection,
    name: &str,
) -> Result<permission::Model> {
    let repo = PermissionRepository::new(db);

    if let Some(existing) = repo.find_by_name(name).await? {
        log::info!("Permission '{}' already exists, skipping", name);
        return Ok(existing);
    }

    log::info!("Creating permission: {}", name);
    repo.create(PermissionInput {
        name: name.to_string(),
    })
    .await
    .with_context(|| format!("Failed to create permission '{}'", name))
}

/// Returns the role called `name`, creating it with the given flag and
/// permissions if missing. An existing role is left untouched.
pub(crate) async fn ensure_role(
    db: &DatabaseConnection,
    name: &str,
    is_admin: bool,
    permissions: &[&permission::Model],
) -> Result<role::Model> {
    let repo = RoleRepository::new(db);

    if let Some(existing) = repo.find_by_name(name).await? {
        log::info!("Role '{}' already exists, skipping", name);
        return Ok(existing);
    }

    log::info!("Creating role: {}", name);
    let created = repo
        .create(RoleInput {
            name: name.to_string(),
            is_admin,
            permission_ids: permissions.iter().map(|p| p.id).collect(),
        })
        .await
        .with_context(|| format!("Failed to create role '{}'", name))?;

    Ok(created.role)
}
