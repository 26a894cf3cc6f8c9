//! Role repository
//!
//! Roles own their rows in `role_permissions`. A role's permission set is
//! always replaced wholesale, and deleting a role unassigns its members
//! according to [`team_member::ROLE_REFERENCE`].

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, Value,
    prelude::DateTimeWithTimeZone, sea_query::Expr,
};

use super::{normalize_name, unique_conflict};
use crate::error::RepositoryError;
use crate::models::{
    OnDelete,
    permission::{self, Entity as Permission},
    role::{self, Entity as Role},
    role_permission::{self, Entity as RolePermission},
    team_member::{self, Entity as TeamMember},
};

const RESOURCE: &str = "role";

/// A role together with its permissions, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleWithPermissions {
    pub role: role::Model,
    pub permissions: Vec<permission::Model>,
}

impl RoleWithPermissions {
    pub fn permission_names(&self) -> Vec<&str> {
        self.permissions.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Fields for creating or replacing a role.
#[derive(Debug, Clone, Default)]
pub struct RoleInput {
    pub name: String,
    pub is_admin: bool,
    pub permission_ids: Vec<i32>,
}

/// Partial role update. `None` leaves the field unchanged; a present
/// `permission_ids` replaces the whole set.
#[derive(Debug, Clone, Default)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub is_admin: Option<bool>,
    pub permission_ids: Option<Vec<i32>>,
}

impl From<RoleInput> for RoleUpdate {
    fn from(input: RoleInput) -> Self {
        Self {
            name: Some(input.name),
            is_admin: Some(input.is_admin),
            permission_ids: Some(input.permission_ids),
        }
    }
}

/// Repository for Role database operations
pub struct RoleRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RoleRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// All roles ordered by name, each with its permissions.
    pub async fn list(&self) -> Result<Vec<RoleWithPermissions>, RepositoryError> {
        let roles = Role::find()
            .order_by_asc(role::Column::Name)
            .all(self.db)
            .await?;

        let ids: Vec<i32> = roles.iter().map(|r| r.id).collect();
        let mut permissions = permissions_by_role(self.db, &ids).await?;

        Ok(roles
            .into_iter()
            .map(|role| RoleWithPermissions {
                permissions: permissions.remove(&role.id).unwrap_or_default(),
                role,
            })
            .collect())
    }

    pub async fn get(&self, id: i32) -> Result<RoleWithPermissions, RepositoryError> {
        load_role(self.db, id).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<role::Model>, RepositoryError> {
        Ok(Role::find()
            .filter(role::Column::Name.eq(name))
            .one(self.db)
            .await?)
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(Role::find().count(self.db).await?)
    }

    /// Create a role with the given permission set.
    pub async fn create(&self, input: RoleInput) -> Result<RoleWithPermissions, RepositoryError> {
        let name = normalize_name("name", &input.name)?;
        let permission_ids = dedup(&input.permission_ids);

        let txn = self.db.begin().await?;

        ensure_name_available(&txn, &name, None).await?;
        ensure_permissions_exist(&txn, &permission_ids).await?;

        let role = role::ActiveModel {
            name: Set(name.clone()),
            is_admin: Set(input.is_admin),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(unique_conflict("name", &name))?;

        attach_permissions(&txn, role.id, &permission_ids).await?;
        let created = load_role(&txn, role.id).await?;
        txn.commit().await?;

        tracing::info!(
            role_id = created.role.id,
            name = %created.role.name,
            permissions = created.permissions.len(),
            "Created role"
        );
        Ok(created)
    }

    /// Replace every field of a role, including its permission set.
    pub async fn replace(
        &self,
        id: i32,
        input: RoleInput,
    ) -> Result<RoleWithPermissions, RepositoryError> {
        self.update(id, input.into()).await
    }

    /// Apply a partial update. A present permission list discards the old set.
    pub async fn update(
        &self,
        id: i32,
        changes: RoleUpdate,
    ) -> Result<RoleWithPermissions, RepositoryError> {
        let name = changes
            .name
            .as_deref()
            .map(|raw| normalize_name("name", raw))
            .transpose()?;
        let permission_ids = changes.permission_ids.as_deref().map(dedup);

        let txn = self.db.begin().await?;

        let existing = Role::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found(RESOURCE, id))?;

        if let Some(name) = &name {
            ensure_name_available(&txn, name, Some(id)).await?;
        }
        if let Some(ids) = &permission_ids {
            ensure_permissions_exist(&txn, ids).await?;
        }

        let mut active = existing.into_active_model();
        if let Some(name) = &name {
            active.name = Set(name.clone());
        }
        if let Some(is_admin) = changes.is_admin {
            active.is_admin = Set(is_admin);
        }
        let conflict_name = name.clone().unwrap_or_default();
        active
            .update(&txn)
            .await
            .map_err(unique_conflict("name", &conflict_name))?;

        if let Some(ids) = &permission_ids {
            RolePermission::delete_many()
                .filter(role_permission::Column::RoleId.eq(id))
                .exec(&txn)
                .await?;
            attach_permissions(&txn, id, ids).await?;
        }

        let updated = load_role(&txn, id).await?;
        txn.commit().await?;

        tracing::info!(role_id = id, name = %updated.role.name, "Updated role");
        Ok(updated)
    }

    /// Delete a role. Members holding it are unassigned (or removed, if the
    /// reference policy says so) and its permission links are dropped, all in
    /// one transaction.
    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        Role::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found(RESOURCE, id))?;

        match team_member::ROLE_REFERENCE.on_delete {
            OnDelete::SetNull => {
                let now: DateTimeWithTimeZone = Utc::now().into();
                let cleared = TeamMember::update_many()
                    .col_expr(team_member::Column::RoleId, Expr::value(Value::Int(None)))
                    .col_expr(team_member::Column::UpdatedAt, Expr::value(now))
                    .filter(team_member::Column::RoleId.eq(id))
                    .exec(&txn)
                    .await?;
                tracing::debug!(role_id = id, members = cleared.rows_affected, "Unassigned role");
            }
            OnDelete::Cascade => {
                let removed = TeamMember::delete_many()
                    .filter(team_member::Column::RoleId.eq(id))
                    .exec(&txn)
                    .await?;
                tracing::debug!(
                    role_id = id,
                    members = removed.rows_affected,
                    "Removed members with role"
                );
            }
        }

        match role_permission::ROLE_REFERENCE.on_delete {
            OnDelete::Cascade => {
                RolePermission::delete_many()
                    .filter(role_permission::Column::RoleId.eq(id))
                    .exec(&txn)
                    .await?;
            }
            OnDelete::SetNull => {
                return Err(RepositoryError::Database(sea_orm::DbErr::Custom(format!(
                    "{} is part of a primary key and cannot be nulled",
                    role_permission::ROLE_REFERENCE.from
                ))));
            }
        }

        Role::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(role_id = id, "Deleted role");
        Ok(())
    }
}

/// Load one role with its name-sorted permissions.
pub(crate) async fn load_role<C>(conn: &C, id: i32) -> Result<RoleWithPermissions, RepositoryError>
where
    C: ConnectionTrait,
{
    let role = Role::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| RepositoryError::not_found(RESOURCE, id))?;

    let permissions = permissions_by_role(conn, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();

    Ok(RoleWithPermissions { role, permissions })
}

/// Permissions for each of `role_ids`, sorted by name. Roles without
/// permissions are absent from the map.
pub(crate) async fn permissions_by_role<C>(
    conn: &C,
    role_ids: &[i32],
) -> Result<HashMap<i32, Vec<permission::Model>>, RepositoryError>
where
    C: ConnectionTrait,
{
    let mut grouped: HashMap<i32, Vec<permission::Model>> = HashMap::new();
    if role_ids.is_empty() {
        return Ok(grouped);
    }

    let rows = RolePermission::find()
        .filter(role_permission::Column::RoleId.is_in(role_ids.iter().copied()))
        .find_also_related(Permission)
        .all(conn)
        .await?;

    for (link, permission) in rows {
        if let Some(permission) = permission {
            grouped.entry(link.role_id).or_default().push(permission);
        }
    }

    for permissions in grouped.values_mut() {
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
    }

    Ok(grouped)
}

fn dedup(ids: &[i32]) -> Vec<i32> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

async fn ensure_name_available<C>(
    conn: &C,
    name: &str,
    except_id: Option<i32>,
) -> Result<(), RepositoryError>
where
    C: ConnectionTrait,
{
    let mut query = Role::find().filter(role::Column::Name.eq(name));
    if let Some(id) = except_id {
        query = query.filter(role::Column::Id.ne(id));
    }

    match query.one(conn).await? {
        Some(_) => Err(RepositoryError::conflict("name", name)),
        None => Ok(()),
    }
}

/// Every id in `ids` must resolve; the error lists all that do not.
async fn ensure_permissions_exist<C>(conn: &C, ids: &[i32]) -> Result<(), RepositoryError>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(());
    }

    let found: BTreeSet<i32> = Permission::find()
        .filter(permission::Column::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let missing: Vec<i32> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(RepositoryError::missing_reference(
            "permission",
            "permission_ids",
            missing,
        ))
    }
}

async fn attach_permissions<C>(
    conn: &C,
    role_id: i32,
    permission_ids: &[i32],
) -> Result<(), RepositoryError>
where
    C: ConnectionTrait,
{
    if permission_ids.is_empty() {
        return Ok(());
    }

    let links = permission_ids
        .iter()
        .map(|&permission_id| role_permission::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission_id),
        });

    RolePermission::insert_many(links)
        .exec_without_returning(conn)
        .await?;

    Ok(())
}
