use clap::{Parser, Subcommand};
use sea_orm::Database;
use sea_orm_migration::prelude::*;

/// Apply or inspect the trips schema.
#[derive(Debug, Parser)]
#[command(name = "migration")]
struct Args {
    /// Database to migrate.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./fuel.db?mode=rwc")]
    database_url: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations (default).
    Up,
    /// Roll back the last migration.
    Down,
    /// Drop everything and re-apply.
    Fresh,
    /// Print applied/pending migrations.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let db = Database::connect(&args.database_url).await?;

    match args.command.unwrap_or(Command::Up) {
        Command::Up => migration::Migrator::up(&db, None).await?,
        Command::Down => migration::Migrator::down(&db, Some(1)).await?,
        Command::Fresh => migration::Migrator::fresh(&db).await?,
        Command::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}
