//! # Repository Layer
//!
//! Repositories encapsulate the SeaORM operations for permissions, roles and
//! team members. Every write validates its input, checks uniqueness and
//! references, and runs multi-row changes inside a single transaction.

pub mod permission;
pub mod role;
pub mod team_member;

pub use permission::{PermissionInput, PermissionRepository};
pub use role::{RoleInput, RoleRepository, RoleUpdate, RoleWithPermissions};
pub use team_member::{
    TeamMemberInput, TeamMemberRepository, TeamMemberUpdate, TeamMemberWithRole,
    load_member_role, save_team_member,
};

use sea_orm::DbErr;

use crate::error::{RepositoryError, is_unique_violation};
use crate::validation::{FieldErrors, NAME_MAX_LEN, validate_name};

/// Trims `raw` and checks it as a required name of at most [`NAME_MAX_LEN`] characters.
pub(crate) fn normalize_name(field: &'static str, raw: &str) -> Result<String, FieldErrors> {
    let name = raw.trim().to_string();
    let mut errors = FieldErrors::new();
    errors.check(field, validate_name(field, &name, NAME_MAX_LEN));
    errors.into_result().map(|()| name)
}

/// Maps a unique-index violation on `field` to a conflict, anything else to a database error.
pub(crate) fn unique_conflict<'a>(
    field: &'static str,
    value: &'a str,
) -> impl FnOnce(DbErr) -> RepositoryError + 'a {
    move |err| {
        if is_unique_violation(&err) {
            RepositoryError::conflict(field, value)
        } else {
            RepositoryError::Database(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_before_validation() {
        assert_eq!(normalize_name("name", "  view  ").unwrap(), "view");

        let errors = normalize_name("name", "   ").unwrap_err();
        assert_eq!(errors.get("name"), Some(&["name is required".to_string()][..]));
    }

    #[test]
    fn non_unique_errors_stay_database_errors() {
        let err = unique_conflict("name", "view")(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
