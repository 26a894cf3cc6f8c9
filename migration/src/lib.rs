//! Database migrations for the roster service.
//!
//! Migrations are applied strictly in the order listed by [`Migrator`]; each
//! table is created after the tables it references.

pub use sea_orm_migration::prelude::*;

mod m2025_06_01_000001_create_permissions;
mod m2025_06_01_000002_create_roles;
mod m2025_06_01_000003_create_role_permissions;
mod m2025_06_01_000004_create_team_members;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_01_000001_create_permissions::Migration),
            Box::new(m2025_06_01_000002_create_roles::Migration),
            Box::new(m2025_06_01_000003_create_role_permissions::Migration),
            Box::new(m2025_06_01_000004_create_team_members::Migration),
        ]
    }
}
