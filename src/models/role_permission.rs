//! Role/permission association entity
//!
//! One row per (role, permission) pair; the composite primary key makes a
//! role's permission collection a set.

use sea_orm::entity::prelude::*;

use super::{OnDelete, Reference};

/// Association rows disappear with their role.
pub const ROLE_REFERENCE: Reference = Reference {
    from: "role_permissions.role_id",
    to: "roles.id",
    on_delete: OnDelete::Cascade,
};

/// Association rows disappear with their permission; the role survives.
pub const PERMISSION_REFERENCE: Reference = Reference {
    from: "role_permissions.permission_id",
    to: "permissions.id",
    on_delete: OnDelete::Cascade,
};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "role_permissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub role_id: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub permission_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id",
        on_delete = "Cascade"
    )]
    Role,
    #[sea_orm(
        belongs_to = "super::permission::Entity",
        from = "Column::PermissionId",
        to = "super::permission::Column::Id",
        on_delete = "Cascade"
    )]
    Permission,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Permission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
