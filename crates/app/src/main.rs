use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "fuel_estimator={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let mut builder = engine::Engine::builder();
    match settings.database_url() {
        Ok(url) => match parse_database(url).await {
            Ok(db) => builder = builder.database(db),
            Err(err) => tracing::error!("failed to initialize database: {err}"),
        },
        Err(reason) => tracing::error!("{reason}"),
    }
    let engine = builder.build().await?;

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let config = server::ServerConfig {
        anonymous_user: settings.anonymous_user(),
        session_idle: std::time::Duration::from_secs(settings.server.session_idle_secs),
        max_sessions: settings.server.max_sessions,
    };

    server::run_with_listener(engine, config, listener).await?;
    Ok(())
}

async fn parse_database(
    url: &str,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
