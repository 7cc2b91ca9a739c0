#[tokio::main]
async fn main() {
    use amber_ward_server::{
        api::{self, AppState},
        config::ServerConfig,
        db::SessionRepository,
        service::{AccessRequestService, AccessService, InviteService, OutboxWorker},
    };
    use amber_ward_access::{LoggingNotifier, Notifier};
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    let notifier: Arc<dyn Notifier> = Arc::new(LoggingNotifier);
    let invite_ttl = chrono::Duration::days(config.invite.ttl_days);

    let access = AccessService::new(db_pool.clone());
    let invites = InviteService::new(db_pool.clone(), notifier.clone(), invite_ttl);
    let requests = AccessRequestService::new(db_pool.clone());

    // Cleanup expired sessions and invites on startup
    let session_repo = SessionRepository::new(db_pool.clone());
    match session_repo.delete_expired().await {
        Ok(count) if count > 0 => {
            tracing::info!(
                deleted_sessions = count,
                "Cleaned up expired sessions on startup"
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Failed to cleanup expired sessions on startup");
        }
    }
    match invites.cleanup_expired().await {
        Ok(count) if count > 0 => {
            tracing::info!(
                deleted_invites = count,
                "Cleaned up expired invites on startup"
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Failed to cleanup expired invites on startup");
        }
    }

    // Spawn periodic cleanup of expired sessions and invites
    let cleanup_pool = db_pool.clone();
    let cleanup_notifier = notifier.clone();
    let cleanup_interval_secs = config.invite.cleanup_interval_seconds;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;

            let session_repo = SessionRepository::new(cleanup_pool.clone());
            match session_repo.delete_expired().await {
                Ok(count) if count > 0 => {
                    tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to cleanup expired sessions");
                }
            }

            let invite_service = InviteService::new(
                cleanup_pool.clone(),
                cleanup_notifier.clone(),
                invite_ttl,
            );
            match invite_service.cleanup_expired().await {
                Ok(count) if count > 0 => {
                    tracing::debug!(deleted_invites = count, "Periodic invite cleanup");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to cleanup expired invites");
                }
            }
        }
    });

    // Spawn the notification delivery worker
    let worker = OutboxWorker::new(
        db_pool.clone(),
        notifier,
        std::time::Duration::from_secs(config.outbox.poll_interval_seconds),
        config.outbox.max_attempts,
    );
    tokio::spawn(worker.run());

    let app_state = Arc::new(AppState {
        db_pool,
        access,
        invites,
        requests,
    });
    let app = api::router(app_state);

    tracing::info!(addr = %config.listen_addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind listen address");
    axum::serve(listener, app)
        .await
        .expect("server error");
}
