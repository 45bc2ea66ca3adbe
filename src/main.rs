use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use hutsfarms::config::AppConfig;
use hutsfarms::db;
use hutsfarms::handlers;
use hutsfarms::services::email::HttpEmailProvider;
use hutsfarms::services::notify::{spawn_notifier, HttpBotNotifier};
use hutsfarms::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(!config.jwt_secret.is_empty(), "JWT_SECRET must be set");

    let conn = db::init_db(&config.database_url)?;

    // Seed the dashboard admin on first boot if credentials are provided.
    if let (Ok(username), Ok(password)) = (
        std::env::var("ADMIN_USERNAME"),
        std::env::var("ADMIN_PASSWORD"),
    ) {
        if db::queries::get_admin_by_username(&conn, &username)?.is_none() {
            let hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;
            db::queries::create_admin(&conn, &uuid::Uuid::new_v4().to_string(), &username, &hash)?;
            tracing::info!("seeded admin account {username}");
        }
    }

    let email = HttpEmailProvider::new(
        config.email_api_url.clone(),
        config.email_api_key.clone(),
        config.email_from.clone(),
    );

    let (notify_tx, notify_rx) = tokio::sync::mpsc::unbounded_channel();
    spawn_notifier(
        notify_rx,
        Box::new(HttpBotNotifier::new(config.bot_service_url.clone())),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        email: Box::new(email),
        notify_tx,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/bookings/create", post(handlers::bookings::create_booking))
        .route("/api/bookings/", get(handlers::bookings::list_bookings))
        .route("/api/bookings/confirm", post(handlers::bookings::confirm_booking))
        .route("/api/bookings/cancel", post(handlers::bookings::cancel_booking))
        .route("/api/bookings/complete", post(handlers::bookings::complete_bookings))
        .route("/api/bookings/update-status", post(handlers::bookings::update_status))
        .route(
            "/api/bookings/update-status-local",
            post(handlers::bookings::update_status_local),
        )
        .route("/api/users/signup/send-code", post(handlers::users::send_signup_code))
        .route(
            "/api/users/signup/verify-code",
            post(handlers::users::verify_signup_code),
        )
        .route("/api/users/login", post(handlers::users::login))
        .route(
            "/api/users/forgot-password/send-code",
            post(handlers::users::send_reset_code),
        )
        .route(
            "/api/users/forgot-password/verify-code",
            post(handlers::users::verify_reset_code),
        )
        .route(
            "/api/users/forgot-password/reset",
            post(handlers::users::reset_password),
        )
        .route("/api/admin/login", post(handlers::admin::login))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/update-status",
            post(handlers::admin::update_status),
        )
        .route("/api/admin/dashboard/stats", get(handlers::admin::dashboard_stats))
        .route("/api/owners/add", post(handlers::owners::add_owner))
        .route("/api/owners/login", post(handlers::owners::login))
        .route("/api/owners/properties", get(handlers::owners::properties))
        .route("/api/properties/login", post(handlers::properties::login))
        .route("/api/properties/", get(handlers::properties::get_property))
        .route("/api/properties/add", post(handlers::properties::add_property))
        .route("/api/properties/edit", post(handlers::properties::edit_property))
        .route(
            "/api/properties/edit/pricing",
            post(handlers::properties::edit_pricing),
        )
        .route("/api/messages/delete", post(handlers::messages::delete_messages))
        .route(
            "/api/messages/count/:user_id",
            get(handlers::messages::count_messages),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
