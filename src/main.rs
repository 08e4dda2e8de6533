mod auth;
mod clock;
mod errors;
mod extractors;
mod handlers;
mod mailer;
mod models;
mod services;
mod state;
mod store;
mod types;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    auth::Keys,
    clock::SystemClock,
    handlers::{
        add_song, band_detail, cancel_vote, cast_vote, create_band, create_invite_code,
        create_poll, delete_band, delete_invite_code, delete_poll, delete_song, forgot_password,
        list_invite_codes, list_members, list_polls, login, logout, my_bands, my_votes,
        poll_detail, refresh_token, register, remove_member, reset_password, update_band,
        update_member_role, update_poll, update_song,
    },
    mailer::LogMailer,
    state::AppState,
    store::PgStore,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let frontend_url =
        std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to create Postgres pool");

    let store = PgStore::new(pool);
    store
        .run_migrations()
        .await
        .expect("Failed to run migrations");

    let app_state = AppState::new(
        Arc::new(store),
        Arc::new(Keys::new(jwt_secret.as_bytes())),
        Arc::new(SystemClock),
        Arc::new(LogMailer),
        frontend_url,
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh_token))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/bands", post(create_band))
        .route("/api/bands/me", get(my_bands))
        .route(
            "/api/bands/{band_id}",
            get(band_detail).put(update_band).delete(delete_band),
        )
        .route("/api/bands/{band_id}/members", get(list_members))
        .route(
            "/api/bands/{band_id}/members/{user_id}/role",
            patch(update_member_role),
        )
        .route(
            "/api/bands/{band_id}/members/{user_id}",
            delete(remove_member),
        )
        .route(
            "/api/bands/{band_id}/invite-codes",
            get(list_invite_codes).post(create_invite_code),
        )
        .route(
            "/api/bands/{band_id}/invite-codes/{code}",
            delete(delete_invite_code),
        )
        .route(
            "/api/bands/{band_id}/polls",
            get(list_polls).post(create_poll),
        )
        .route(
            "/api/polls/{poll_id}",
            get(poll_detail).put(update_poll).delete(delete_poll),
        )
        .route("/api/polls/{poll_id}/songs", post(add_song))
        .route("/api/polls/{poll_id}/votes/me", get(my_votes))
        .route("/api/songs/{song_id}", put(update_song).delete(delete_song))
        .route("/api/votes", post(cast_vote))
        .route("/api/votes/{vote_id}", delete(cancel_vote))
        .layer(cors)
        .with_state(app_state)
        .fallback(handler_404);

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .expect("PORT must be a valid number");
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    tracing::debug!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing to see here")
}
