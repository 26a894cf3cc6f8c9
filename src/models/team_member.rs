//! Team member entity model
//!
//! A person record with an optional role. Field validation happens in
//! [`crate::repositories::team_member::save_team_member`]; `before_save`
//! re-checks the phone format so raw ActiveModel writes cannot persist a
//! malformed number either.

use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveValue, Set};

use super::{OnDelete, Reference};
use crate::validation::validate_phone_number;

/// Deleting a role unassigns its members; it never deletes them.
pub const ROLE_REFERENCE: Reference = Reference {
    from: "team_members.role_id",
    to: "roles.id",
    on_delete: OnDelete::SetNull,
};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "team_members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub first_name: String,

    pub last_name: String,

    /// Unique across all team members
    #[sea_orm(unique)]
    pub email: String,

    /// Always formatted as `(XXX) XXX-XXXX`
    pub phone_number: String,

    /// Assigned role, if any
    pub role_id: Option<i32>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id",
        on_delete = "SetNull"
    )]
    Role,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        match &self.phone_number {
            ActiveValue::Set(phone) | ActiveValue::Unchanged(phone) => {
                validate_phone_number(phone).map_err(DbErr::Custom)?;
            }
            ActiveValue::NotSet if insert => {
                return Err(DbErr::Custom("phone_number is required".to_string()));
            }
            ActiveValue::NotSet => {}
        }

        let now: DateTimeWithTimeZone = Utc::now().into();
        if insert && matches!(self.created_at, ActiveValue::NotSet) {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
