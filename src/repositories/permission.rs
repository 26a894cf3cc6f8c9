//! Permission repository
//!
//! Permissions are leaf rows. Deleting one removes it from every role's
//! permission set without touching the roles themselves.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{normalize_name, unique_conflict};
use crate::error::RepositoryError;
use crate::models::{
    OnDelete,
    permission::{self, Entity as Permission},
    role_permission::{self, Entity as RolePermission},
};

const RESOURCE: &str = "permission";

/// Writable fields of a permission.
#[derive(Debug, Clone)]
pub struct PermissionInput {
    pub name: String,
}

/// Repository for Permission database operations
pub struct PermissionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PermissionRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// All permissions ordered by name.
    pub async fn list(&self) -> Result<Vec<permission::Model>, RepositoryError> {
        Ok(Permission::find()
            .order_by_asc(permission::Column::Name)
            .all(self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<permission::Model, RepositoryError> {
        Permission::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found(RESOURCE, id))
    }

    pub async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<permission::Model>, RepositoryError> {
        Ok(Permission::find()
            .filter(permission::Column::Name.eq(name))
            .one(self.db)
            .await?)
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(Permission::find().count(self.db).await?)
    }

    /// Create a permission. Fails with a conflict when the name is taken.
    pub async fn create(
        &self,
        input: PermissionInput,
    ) -> Result<permission::Model, RepositoryError> {
        let name = normalize_name("name", &input.name)?;
        self.ensure_name_available(&name, None).await?;

        let model = permission::ActiveModel {
            name: Set(name.clone()),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(unique_conflict("name", &name))?;

        tracing::info!(permission_id = model.id, name = %model.name, "Created permission");
        Ok(model)
    }

    /// Rename a permission.
    pub async fn update(
        &self,
        id: i32,
        input: PermissionInput,
    ) -> Result<permission::Model, RepositoryError> {
        let existing = self.get(id).await?;
        let name = normalize_name("name", &input.name)?;
        self.ensure_name_available(&name, Some(id)).await?;

        let mut active = existing.into_active_model();
        active.name = Set(name.clone());
        let model = active
            .update(self.db)
            .await
            .map_err(unique_conflict("name", &name))?;

        tracing::info!(permission_id = model.id, name = %model.name, "Updated permission");
        Ok(model)
    }

    /// Delete a permission and its role associations in one transaction.
    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        Permission::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found(RESOURCE, id))?;

        match role_permission::PERMISSION_REFERENCE.on_delete {
            OnDelete::Cascade => {
                let detached = RolePermission::delete_many()
                    .filter(role_permission::Column::PermissionId.eq(id))
                    .exec(&txn)
                    .await?;
                tracing::debug!(
                    permission_id = id,
                    roles = detached.rows_affected,
                    "Detached permission from roles"
                );
            }
            OnDelete::SetNull => {
                return Err(RepositoryError::Database(sea_orm::DbErr::Custom(format!(
                    "{} is part of a primary key and cannot be nulled",
                    role_permission::PERMISSION_REFERENCE.from
                ))));
            }
        }

        Permission::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(permission_id = id, "Deleted permission");
        Ok(())
    }

    async fn ensure_name_available(
        &self,
        name: &str,
        except_id: Option<i32>,
    ) -> Result<(), RepositoryError> {
        let mut query = Permission::find().filter(permission::Column::Name.eq(name));
        if let Some(id) = except_id {
            query = query.filter(permission::Column::Id.ne(id));
        }

        match query.one(self.db).await? {
            Some(_) => Err(RepositoryError::conflict("name", name)),
            None => Ok(()),
        }
    }
}
