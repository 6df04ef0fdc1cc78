// tests/api_tests.rs

use replydeck::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
///
/// The pool connects lazily, so routes that reject a request before
/// touching the database (auth middleware, the login URL endpoint) can be
/// exercised without a running Postgres.
async fn spawn_app() -> String {
    let config = Config {
        database_url: "postgres://localhost/replydeck_test".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        google_client_id: "test-client-id".to_string(),
        google_client_secret: "test-client-secret".to_string(),
        oauth_redirect_url: "http://localhost:3000/api/auth/callback".to_string(),
        gemini_api_key: None,
        gemini_model: "gemini-2.0-flash-exp".to_string(),
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database_url)
        .expect("Failed to build lazy pool");

    let state = AppState::new(pool, config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn login_returns_consent_url() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/auth/login", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);

    let body = response.json::<serde_json::Value>().await.unwrap();
    let auth_url = body["auth_url"].as_str().unwrap();
    assert!(auth_url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(auth_url.contains("access_type=offline"));
    assert!(auth_url.contains("state="));
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    for path in [
        "/api/channel",
        "/api/videos",
        "/api/videos/vid1/comments",
        "/api/stats/replies",
    ] {
        let response = client
            .get(&format!("{}{}", address, path))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 401, "GET {} should be 401", path);
    }

    for path in [
        "/api/comments/generate",
        "/api/comments/reply",
        "/api/comments/delete",
        "/api/comments/rate",
        "/api/threads/complete",
        "/api/threads/uncomplete",
        "/api/auth/logout",
    ] {
        let response = client
            .post(&format!("{}{}", address, path))
            .json(&serde_json::json!({}))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 401, "POST {} should be 401", path);
    }
}

#[tokio::test]
async fn garbage_bearer_token_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/videos", address))
        .header("Authorization", "Bearer not-a-jwt")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn oauth_state_token_is_not_a_session() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Pull a freshly signed state token out of the consent URL.
    let body = client
        .get(&format!("{}/api/auth/login", address))
        .send()
        .await
        .expect("Failed to execute request")
        .json::<serde_json::Value>()
        .await
        .unwrap();
    let auth_url = url::Url::parse(body["auth_url"].as_str().unwrap()).unwrap();
    let state = auth_url
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .expect("consent URL carries a state parameter");

    // Replaying it as a bearer token must bounce off the middleware.
    for path in ["/api/comments/generate", "/api/threads/complete"] {
        let response = client
            .post(&format!("{}{}", address, path))
            .header("Authorization", format!("Bearer {}", state))
            .json(&serde_json::json!({ "comment": "hi", "comment_id": "c1" }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 401, "POST {} should be 401", path);
    }

    let response = client
        .get(&format!("{}/api/videos", address))
        .header("Authorization", format!("Bearer {}", state))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn callback_rejects_forged_state() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!(
            "{}/api/auth/callback?code=abc&state=forged",
            address
        ))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}
