//! # Data Models
//!
//! SeaORM entities for permissions, roles, their association table and team
//! members, plus the explicit delete policies attached to each reference.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod permission;
pub mod role;
pub mod role_permission;
pub mod team_member;

pub use permission::Entity as Permission;
pub use role::Entity as Role;
pub use role_permission::Entity as RolePermission;
pub use team_member::Entity as TeamMember;

/// What happens to dependent rows when the row they reference is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Clear the reference and keep the dependent row.
    SetNull,
    /// Delete the dependent row together with the referenced one.
    Cascade,
}

/// A foreign reference between two tables and its delete policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Referencing table and column, e.g. `team_members.role_id`.
    pub from: &'static str,
    /// Referenced table and column, e.g. `roles.id`.
    pub to: &'static str,
    pub on_delete: OnDelete,
}

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "roster".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
