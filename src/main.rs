use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use chrono::Utc;
use dotenv::dotenv;
use std::net::TcpListener;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use tutorlink_server::auth::handlers::{login, logout, logout_all, refresh, register};
use tutorlink_server::auth::AuthGate;
use tutorlink_server::{health_check, not_found, AppError, AppState, Settings};

#[actix_web::main]
async fn main() -> tutorlink_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    // Load configuration. The JWT secret is part of it and must never be
    // logged, not even its length.
    let config = Settings::new()?;
    info!(
        environment = %config.environment,
        access_ttl_minutes = config.auth.access_ttl_minutes,
        refresh_ttl_days = config.auth.refresh_ttl_days,
        "configuration loaded"
    );

    info!("Starting server at {}:{}", config.server.host, config.server.port);

    // Initialize application state
    let state = AppState::new(config.clone()).await?;
    let state = web::Data::new(state);

    // Housekeeping: sweep expired refresh sessions. Revocation rows that
    // have not yet expired stay behind for audit.
    let sweep_state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(3600)).await;

            match sweep_state.sessions.purge_expired(Utc::now()).await {
                Ok(purged) if purged > 0 => {
                    info!(purged, "swept expired refresh sessions");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "session sweep failed"),
            }
        }
    });

    // Create and bind TCP listener
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    let workers = config.server.workers as usize;

    // Start HTTP server
    HttpServer::new(move || {
        let cors = if config.cors.enabled {
            let cors_config = Cors::default();

            // Apply specific CORS rules based on configuration
            let cors_config = if config.cors.allow_any_origin {
                cors_config
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .expose_any_header()
            } else {
                // More restrictive CORS for production use
                cors_config
                    .allowed_origin("https://app.tutorlink.example")
                    .allowed_origin("http://localhost:8080")
                    .allowed_origin("http://127.0.0.1:8080")
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                    .allowed_headers(vec!["Authorization", "Content-Type"])
                    .supports_credentials()
            };

            // Set max age
            cors_config.max_age(config.cors.max_age as usize)
        } else {
            // CORS disabled - use most restrictive settings
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/api/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/logout", web::post().to(logout))
                    .service(
                        web::resource("/logout-all")
                            .wrap(AuthGate::new(
                                state.codec.clone(),
                                state.credentials.clone(),
                            ))
                            .route(web::post().to(logout_all)),
                    ),
            )
            .default_service(web::route().to(not_found))
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
