// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{actions, auth, comments, generate, videos},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, videos, comments, actions).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, API clients).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        // Logout needs an authenticated session to know whose tokens to drop.
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .layer(middleware::from_fn_with_state(
                    state.config.clone(),
                    auth_middleware,
                )),
        );

    let api_routes = Router::new()
        .route("/channel", get(videos::channel))
        .route("/videos", get(videos::list_videos))
        .route("/videos/{video_id}/comments", get(comments::list_comments))
        .route("/stats/replies", get(videos::reply_stats))
        .route("/comments/generate", post(generate::generate_reply))
        .route("/comments/reply", post(actions::post_reply))
        .route("/comments/delete", post(actions::delete_comment))
        .route("/comments/rate", post(actions::rate_comment))
        .route("/threads/complete", post(actions::mark_complete))
        .route("/threads/uncomplete", post(actions::unmark_complete))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api", Router::new().nest("/auth", auth_routes).merge(api_routes))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
