//! Team member repository
//!
//! [`save_team_member`] is the only function that writes team member rows.
//! The HTTP handlers, the repository methods and the seed scripts all go
//! through it, so every persisted member has passed the same checks.

use std::collections::BTreeSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::role::{RoleWithPermissions, permissions_by_role};
use super::unique_conflict;
use crate::error::RepositoryError;
use crate::models::{
    role::Entity as Role,
    team_member::{self, Entity as TeamMember},
};
use crate::validation::{
    FieldErrors, NAME_MAX_LEN, validate_email, validate_name, validate_phone_number,
};

const RESOURCE: &str = "team member";

/// Complete set of writable team member fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamMemberInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Checked exactly as given; never trimmed.
    pub phone_number: String,
    pub role_id: Option<i32>,
}

impl TeamMemberInput {
    /// Trims the name and email fields.
    pub fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            ..self
        }
    }

    /// Field-level checks only; every failing field is reported.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.check(
            "first_name",
            validate_name("first_name", &self.first_name, NAME_MAX_LEN),
        );
        errors.check(
            "last_name",
            validate_name("last_name", &self.last_name, NAME_MAX_LEN),
        );
        errors.check("email", validate_email(&self.email));
        errors.check("phone_number", validate_phone_number(&self.phone_number));
        errors
    }
}

/// Partial team member update. Outer `None` leaves a field unchanged;
/// `role_id: Some(None)` clears the role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamMemberUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub role_id: Option<Option<i32>>,
}

impl TeamMemberUpdate {
    /// Overlay the present fields on `existing`.
    pub fn merge(self, existing: &team_member::Model) -> TeamMemberInput {
        TeamMemberInput {
            first_name: self
                .first_name
                .unwrap_or_else(|| existing.first_name.clone()),
            last_name: self.last_name.unwrap_or_else(|| existing.last_name.clone()),
            email: self.email.unwrap_or_else(|| existing.email.clone()),
            phone_number: self
                .phone_number
                .unwrap_or_else(|| existing.phone_number.clone()),
            role_id: self.role_id.unwrap_or(existing.role_id),
        }
    }
}

/// A team member with its role (and the role's permissions) embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMemberWithRole {
    pub member: team_member::Model,
    pub role: Option<RoleWithPermissions>,
}

/// Validate `input` and persist it, inserting when `id` is `None` and
/// updating the existing row otherwise.
///
/// Checks run in this order and stop at the first failing stage:
/// 1. the addressed member exists (update only),
/// 2. field validation, collecting every bad field,
/// 3. the email is not used by another member,
/// 4. the role, when given, exists.
///
/// Generic over the connection so callers can run it inside their own
/// transaction.
pub async fn save_team_member<C>(
    conn: &C,
    id: Option<i32>,
    input: TeamMemberInput,
) -> Result<team_member::Model, RepositoryError>
where
    C: ConnectionTrait,
{
    let existing = match id {
        Some(id) => Some(
            TeamMember::find_by_id(id)
                .one(conn)
                .await?
                .ok_or_else(|| RepositoryError::not_found(RESOURCE, id))?,
        ),
        None => None,
    };

    let input = input.normalized();
    input.validate().into_result()?;

    let mut duplicate =
        TeamMember::find().filter(team_member::Column::Email.eq(input.email.as_str()));
    if let Some(id) = id {
        duplicate = duplicate.filter(team_member::Column::Id.ne(id));
    }
    if duplicate.one(conn).await?.is_some() {
        return Err(RepositoryError::conflict("email", input.email));
    }

    if let Some(role_id) = input.role_id {
        if Role::find_by_id(role_id).one(conn).await?.is_none() {
            return Err(RepositoryError::missing_reference(
                "role",
                "role_id",
                vec![role_id],
            ));
        }
    }

    let email = input.email.clone();
    let mut active = match existing {
        Some(model) => model.into_active_model(),
        None => <team_member::ActiveModel as Default>::default(),
    };
    active.first_name = Set(input.first_name);
    active.last_name = Set(input.last_name);
    active.email = Set(input.email);
    active.phone_number = Set(input.phone_number);
    active.role_id = Set(input.role_id);

    let saved = match id {
        Some(_) => active.update(conn).await,
        None => active.insert(conn).await,
    }
    .map_err(unique_conflict("email", &email))?;

    Ok(saved)
}

/// Repository for TeamMember database operations
pub struct TeamMemberRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TeamMemberRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// All members, newest first, with their roles embedded.
    pub async fn list(&self) -> Result<Vec<TeamMemberWithRole>, RepositoryError> {
        let rows = TeamMember::find()
            .order_by_desc(team_member::Column::CreatedAt)
            .order_by_desc(team_member::Column::Id)
            .find_also_related(Role)
            .all(self.db)
            .await?;

        let role_ids: Vec<i32> = rows
            .iter()
            .filter_map(|(_, role)| role.as_ref().map(|r| r.id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let permissions = permissions_by_role(self.db, &role_ids).await?;

        Ok(rows
            .into_iter()
            .map(|(member, role)| TeamMemberWithRole {
                member,
                role: role.map(|role| RoleWithPermissions {
                    permissions: permissions.get(&role.id).cloned().unwrap_or_default(),
                    role,
                }),
            })
            .collect())
    }

    pub async fn get(&self, id: i32) -> Result<TeamMemberWithRole, RepositoryError> {
        let member = TeamMember::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found(RESOURCE, id))?;
        load_member_role(self.db, member).await
    }

    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<team_member::Model>, RepositoryError> {
        Ok(TeamMember::find()
            .filter(team_member::Column::Email.eq(email.trim()))
            .one(self.db)
            .await?)
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(TeamMember::find().count(self.db).await?)
    }

    pub async fn create(
        &self,
        input: TeamMemberInput,
    ) -> Result<TeamMemberWithRole, RepositoryError> {
        let txn = self.db.begin().await?;
        let member = save_team_member(&txn, None, input).await?;
        let created = load_member_role(&txn, member).await?;
        txn.commit().await?;

        tracing::info!(
            member_id = created.member.id,
            role_id = ?created.member.role_id,
            "Created team member"
        );
        Ok(created)
    }

    /// Replace every writable field of a member.
    pub async fn replace(
        &self,
        id: i32,
        input: TeamMemberInput,
    ) -> Result<TeamMemberWithRole, RepositoryError> {
        let txn = self.db.begin().await?;
        let member = save_team_member(&txn, Some(id), input).await?;
        let replaced = load_member_role(&txn, member).await?;
        txn.commit().await?;

        tracing::info!(member_id = id, "Replaced team member");
        Ok(replaced)
    }

    /// Apply a partial update, then re-validate the merged record.
    pub async fn update(
        &self,
        id: i32,
        changes: TeamMemberUpdate,
    ) -> Result<TeamMemberWithRole, RepositoryError> {
        let txn = self.db.begin().await?;
        let existing = TeamMember::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found(RESOURCE, id))?;
        let member = save_team_member(&txn, Some(id), changes.merge(&existing)).await?;
        let updated = load_member_role(&txn, member).await?;
        txn.commit().await?;

        tracing::info!(member_id = id, "Updated team member");
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let result = TeamMember::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found(RESOURCE, id));
        }

        tracing::info!(member_id = id, "Deleted team member");
        Ok(())
    }
}

/// Embed the member's role using `conn`. Writers pass their open
/// transaction so the role is read before the write commits.
pub async fn load_member_role<C>(
    conn: &C,
    member: team_member::Model,
) -> Result<TeamMemberWithRole, RepositoryError>
where
    C: ConnectionTrait,
{
    let role = match member.role_id {
        Some(role_id) => Some(super::role::load_role(conn, role_id).await?),
        None => None,
    };
    Ok(TeamMemberWithRole { member, role })
}
