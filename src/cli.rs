//! # CLI Commands
//!
//! `roster serve`, `roster migrate` and `roster seed`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::{db, seeds, server};

/// Team member, role and permission administration service
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands; `serve` when none is given
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Seed the default roles, optionally with demo data
    Seed(SeedArgs),
}

/// Arguments for the serve command
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind, overriding ROSTER_API_BIND_ADDR
    #[arg(long)]
    pub bind: Option<String>,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// List pending migrations without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Roll back the last applied migration
    #[arg(long, conflicts_with = "dry_run")]
    pub rollback: bool,
}

/// Arguments for the seed command
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Also create the demo permissions, roles and team members
    #[arg(long)]
    pub demo: bool,
}

/// Run the selected command against `config`.
pub async fn run(cli: Cli, mut config: AppConfig) -> Result<()> {
    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => {
            if let Some(bind) = args.bind {
                config.api_bind_addr = bind;
            }
            serve(config).await
        }
        Commands::Migrate(args) => {
            let db = db::init_pool(&config).await?;
            migrate(&db, &args).await
        }
        Commands::Seed(args) => {
            let db = db::init_pool(&config).await?;
            db::run_migrations(&db).await?;
            seed(&db, &args).await
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let db = db::init_pool(&config).await?;

    if config.auto_migrate {
        db::run_migrations(&db).await?;
    }
    if config.seed_defaults {
        seeds::seed_defaults(&db)
            .await
            .context("Failed to seed default roles")?;
    }

    server::run_server(config, db).await
}

/// Apply, preview or roll back migrations.
pub async fn migrate(db: &DatabaseConnection, args: &MigrateArgs) -> Result<()> {
    tracing::info!(
        dry_run = args.dry_run,
        rollback = args.rollback,
        "Running database migrations"
    );

    if args.dry_run {
        let pending = Migrator::get_pending_migrations(db)
            .await
            .context("Failed to get pending migrations")?;

        tracing::info!(pending_count = pending.len(), "Pending migrations found");
        for migration in &pending {
            tracing::info!(migration = %migration.name(), "Would apply");
        }
        return Ok(());
    }

    if args.rollback {
        Migrator::down(db, Some(1))
            .await
            .context("Failed to roll back migration")?;
        tracing::info!("Rollback completed");
        return Ok(());
    }

    db::run_migrations(db).await
}

/// Seed the defaults, and the demo fixture when requested.
pub async fn seed(db: &DatabaseConnection, args: &SeedArgs) -> Result<()> {
    seeds::seed_defaults(db).await?;
    if args.demo {
        seeds::seed_demo(db).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["roster"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn migrate_flags_conflict() {
        assert!(Cli::try_parse_from(["roster", "migrate", "--dry-run", "--rollback"]).is_err());

        let cli = Cli::try_parse_from(["roster", "migrate", "--rollback"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Migrate(MigrateArgs { rollback: true, dry_run: false }))
        ));
    }

    #[test]
    fn seed_accepts_demo_flag() {
        let cli = Cli::try_parse_from(["roster", "seed", "--demo"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Seed(SeedArgs { demo: true }))));
    }
}
