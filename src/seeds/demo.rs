//! Demo fixture
//!
//! A small team for local development: four permissions, an admin and a
//! developer role, and two members. Members are written through
//! [`save_team_member`] like any other write.

use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, TransactionTrait};

use super::{ensure_permission, ensure_role};
use crate::repositories::{TeamMemberInput, TeamMemberRepository, save_team_member};

struct DemoMember {
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    phone_number: &'static str,
    role: &'static str,
}

const DEMO_MEMBERS: &[DemoMember] = &[
    DemoMember {
        first_name: "John",
        last_name: "Doe",
        email: "john@example.com",
        phone_number: "(123) 456-7890",
        role: "Admin",
    },
    DemoMember {
        first_name: "Jane",
        last_name: "Smith",
        email: "jane@example.com",
        phone_number: "(098) 765-4321",
        role: "Developer",
    },
];

/// Seeds the demo permissions, roles and members. Safe to run repeatedly.
pub async fn seed_demo(db: &DatabaseConnection) -> Result<()> {
    let view = ensure_permission(db, "view_team_members").await?;
    let edit = ensure_permission(db, "edit_team_members").await?;
    let delete = ensure_permission(db, "delete_team_members").await?;
    let manage_roles = ensure_permission(db, "manage_roles").await?;

    let admin = ensure_role(db, "Admin", true, &[&view, &edit, &delete, &manage_roles]).await?;
    let developer = ensure_role(db, "Developer", false, &[&view, &edit]).await?;

    let members = TeamMemberRepository::new(db);
    let mut pending = Vec::new();
    for demo in DEMO_MEMBERS {
        if members.find_by_email(demo.email).await?.is_some() {
            log::info!("Team member '{}' already exists, skipping", demo.email);
        } else {
            pending.push(demo);
        }
    }

    let txn = db.begin().await?;
    for demo in pending {
        let role_id = match demo.role {
            "Admin" => admin.id,
            _ => developer.id,
        };

        log::info!("Creating team member: {}", demo.email);
        save_team_member(
            &txn,
            None,
            TeamMemberInput {
                first_name: demo.first_name.to_string(),
                last_name: demo.last_name.to_string(),
                email: demo.email.to_string(),
                phone_number: demo.phone_number.to_string(),
                role_id: Some(role_id),
            },
        )
        .await
        .with_context(|| format!("Failed to create team member '{}'", demo.email))?;
    }

    txn.commit().await?;
    log::info!("Demo data seeded");
    Ok(())
}
