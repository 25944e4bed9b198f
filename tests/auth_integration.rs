use std::net::TcpListener;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use fintrack::auth::session_tokens;
use fintrack::configuration::{
    ApplicationSettings, DatabaseSettings, JwtSettings, PasswordSettings, Settings,
};
use fintrack::finance::EntryKind;
use fintrack::startup::{run, AppState};
use fintrack::store::{InMemoryCredentialStore, InMemoryFinanceStore};

pub struct TestApp {
    pub address: String,
    pub settings: Settings,
    pub credentials: Arc<InMemoryCredentialStore>,
    pub finances: Arc<InMemoryFinanceStore>,
}

fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "fintrack".to_string(),
            max_connections: 1,
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            allowed_origin: "*".to_string(),
            max_body_bytes: 4096,
        },
        jwt: JwtSettings {
            secret: "integration-test-secret-at-least-32-bytes".to_string(),
            token_ttl_seconds: 3600,
            issuer: "fintrack".to_string(),
        },
        password: PasswordSettings { hash_cost: 4 },
    }
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let settings = test_settings();
    let credentials = Arc::new(InMemoryCredentialStore::new());
    let finances = Arc::new(InMemoryFinanceStore::new());
    let state = AppState::new(&settings, credentials.clone(), finances.clone())
        .expect("Failed to build application state");

    let server = run(listener, state, &settings.application)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        settings,
        credentials,
        finances,
    }
}

impl TestApp {
    async fn post_register(&self, body: &Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/register", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn post_login(&self, body: &Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/login", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn get_me(&self, authorization: Option<&str>) -> reqwest::Response {
        let mut request = reqwest::Client::new().get(&format!("{}/api/me", &self.address));
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        request.send().await.expect("Failed to execute request.")
    }

    /// Register `username` with password `s3cret!` and return a session token.
    async fn register_and_login(&self, username: &str) -> String {
        let credentials = json!({ "username": username, "password": "s3cret!" });
        assert_eq!(201, self.post_register(&credentials).await.status().as_u16());

        let response = self.post_login(&credentials).await;
        assert_eq!(200, response.status().as_u16());
        let body: Value = response.json().await.expect("Failed to parse response");
        body["token"].as_str().expect("token missing").to_string()
    }
}

// --- Registration Tests ---

#[tokio::test]
async fn register_returns_201_for_valid_credentials() {
    let app = spawn_app();

    let response = app
        .post_register(&json!({
            "username": "alice",
            "password": "s3cret!",
            "email": "alice@example.com"
        }))
        .await;

    assert_eq!(201, response.status().as_u16());
    assert_eq!(1, app.credentials.len().await);
}

#[tokio::test]
async fn register_without_email_is_accepted() {
    let app = spawn_app();

    let response = app
        .post_register(&json!({ "username": "alice", "password": "s3cret!" }))
        .await;

    assert_eq!(201, response.status().as_u16());
}

#[tokio::test]
async fn register_returns_409_for_duplicate_username() {
    let app = spawn_app();
    let body = json!({ "username": "alice", "password": "s3cret!" });

    assert_eq!(201, app.post_register(&body).await.status().as_u16());

    let response = app
        .post_register(&json!({ "username": "alice", "password": "different" }))
        .await;
    assert_eq!(409, response.status().as_u16());

    let error: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(error["code"], "USERNAME_TAKEN");

    // The first registration still owns the name.
    assert_eq!(200, app.post_login(&body).await.status().as_u16());
    assert_eq!(1, app.credentials.len().await);
}

#[tokio::test]
async fn register_returns_400_for_invalid_input() {
    let app = spawn_app();
    let test_cases = vec![
        (json!({ "username": "", "password": "s3cret!" }), "empty username"),
        (json!({ "username": "   ", "password": "s3cret!" }), "blank username"),
        (json!({ "username": "alice", "password": "" }), "empty password"),
        (json!({ "username": "al ice", "password": "s3cret!" }), "username with whitespace"),
        (
            json!({ "username": "alice", "password": "s3cret!", "email": "not-an-email" }),
            "malformed email",
        ),
        (json!({ "username": "alice" }), "missing password"),
        (json!({ "password": "s3cret!" }), "missing username"),
    ];

    for (invalid_body, description) in test_cases {
        let response = app.post_register(&invalid_body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for {}.",
            description
        );
    }
    assert_eq!(0, app.credentials.len().await);
}

#[tokio::test]
async fn register_returns_400_for_malformed_json() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/register", &app.address))
        .header("Content-Type", "application/json")
        .body("{\"username\": \"alice\", ")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    let error: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn register_rejects_oversized_body() {
    let app = spawn_app();
    let padding = "a".repeat(8192);

    let response = app
        .post_register(&json!({
            "username": "alice",
            "password": "s3cret!",
            "email": padding
        }))
        .await;

    assert_eq!(400, response.status().as_u16());
    assert_eq!(0, app.credentials.len().await);
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_token_for_valid_credentials() {
    let app = spawn_app();
    let credentials = json!({ "username": "alice", "password": "s3cret!" });
    app.post_register(&credentials).await;

    let response = app.post_login(&credentials).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].as_str().map(|t| !t.is_empty()).unwrap_or(false));
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app();
    app.post_register(&json!({ "username": "alice", "password": "s3cret!" }))
        .await;

    let wrong_password = app
        .post_login(&json!({ "username": "alice", "password": "wrong" }))
        .await;
    let unknown_user = app
        .post_login(&json!({ "username": "bob", "password": "s3cret!" }))
        .await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_user.status().as_u16());

    let wrong_password: Value = wrong_password.json().await.unwrap();
    let unknown_user: Value = unknown_user.json().await.unwrap();
    assert_eq!(wrong_password["code"], unknown_user["code"]);
    assert_eq!(wrong_password["message"], unknown_user["message"]);
    assert!(wrong_password.get("token").is_none());
}

// --- Protected Route Tests ---

#[tokio::test]
async fn login_rejects_suffix_beyond_hashable_length() {
    let app = spawn_app();
    let password = "a".repeat(71);
    let response = app
        .post_register(&json!({ "username": "alice", "password": password }))
        .await;
    assert_eq!(201, response.status().as_u16());

    let response = app
        .post_login(&json!({
            "username": "alice",
            "password": format!("{}DIFFERENT-PASSWORD", password)
        }))
        .await;
    assert_eq!(401, response.status().as_u16());

    let response = app
        .post_register(&json!({ "username": "bob", "password": "a".repeat(72) }))
        .await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn me_returns_token_subject() {
    let app = spawn_app();
    let token = app.register_and_login("alice").await;

    let response = app.get_me(Some(&format!("Bearer {}", token))).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn me_accepts_lowercase_scheme() {
    let app = spawn_app();
    let token = app.register_and_login("alice").await;

    let response = app.get_me(Some(&format!("bearer {}", token))).await;
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn me_returns_401_without_a_usable_header() {
    let app = spawn_app();
    let token = app.register_and_login("alice").await;

    let basic = format!("Basic {}", token);
    let extra = format!("Bearer {} extra", token);
    let concatenated = format!("Bearer {}garbage", token);
    let test_cases = vec![
        (None, "no header"),
        (Some("Bearer"), "scheme without token"),
        (Some("Bearer "), "empty token"),
        (Some(basic.as_str()), "wrong scheme"),
        (Some(extra.as_str()), "second token after a space"),
        (Some(concatenated.as_str()), "garbage appended to the token"),
        (Some("Bearer not.a.token"), "garbage token"),
    ];

    for (authorization, description) in test_cases {
        let response = app.get_me(authorization).await;
        assert_eq!(
            401,
            response.status().as_u16(),
            "The API did not fail with 401 for {}.",
            description
        );
        assert!(
            response.headers().contains_key("www-authenticate"),
            "Missing WWW-Authenticate for {}.",
            description
        );
    }
}

#[tokio::test]
async fn me_returns_401_for_expired_token() {
    let app = spawn_app();
    app.register_and_login("alice").await;

    let (issuer, _) = session_tokens(&app.settings.jwt);
    let expired = issuer
        .issue_at("alice", Utc::now() - Duration::hours(2))
        .expect("Failed to issue token")
        .into_string();

    let response = app.get_me(Some(&format!("Bearer {}", expired))).await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn me_returns_401_for_token_signed_with_another_key() {
    let app = spawn_app();

    let mut jwt = app.settings.jwt.clone();
    jwt.secret = "some-other-secret-that-is-32-bytes-long".to_string();
    let (issuer, _) = session_tokens(&jwt);
    let forged = issuer.issue("alice").expect("Failed to issue token").into_string();

    let response = app.get_me(Some(&format!("Bearer {}", forged))).await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn me_returns_401_for_flipped_signature_bit() {
    let app = spawn_app();
    let token = app.register_and_login("alice").await;

    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    assert_eq!(3, parts.len());
    let mut signature = URL_SAFE_NO_PAD.decode(&parts[2]).expect("signature is base64");
    signature[0] ^= 0x01;
    parts[2] = URL_SAFE_NO_PAD.encode(&signature);
    let tampered = parts.join(".");

    let response = app.get_me(Some(&format!("Bearer {}", tampered))).await;
    assert_eq!(401, response.status().as_u16());
}

// --- Finance Tests ---

#[tokio::test]
async fn submit_finance_stores_entry_under_token_subject() {
    let app = spawn_app();
    let token = app.register_and_login("alice").await;

    let response = reqwest::Client::new()
        .post(&format!("{}/api/submit-finance", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "type": "income",
            "source": "salary",
            "amount": "2500.00",
            "username": "mallory",
            "user_id": 1
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "saved");

    let entries = app.finances.entries().await;
    assert_eq!(1, entries.len());
    assert_eq!(entries[0].username, "alice");
    assert_eq!(entries[0].kind, EntryKind::Income);
    assert_eq!(entries[0].amount, "2500.00");
}

#[tokio::test]
async fn submit_finance_requires_a_session() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/api/submit-finance", &app.address))
        .json(&json!({ "type": "expense", "amount": "12.50" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    assert!(app.finances.entries().await.is_empty());
}

#[tokio::test]
async fn submit_finance_returns_400_for_invalid_entry() {
    let app = spawn_app();
    let token = app.register_and_login("alice").await;
    let test_cases = vec![
        (json!({ "type": "gift", "amount": "1" }), "unknown type"),
        (json!({ "type": "expense", "amount": "-4" }), "negative amount"),
        (json!({ "type": "expense", "amount": "1.234" }), "too many decimals"),
        (json!({ "type": "expense" }), "missing amount"),
    ];

    for (invalid_body, description) in test_cases {
        let response = reqwest::Client::new()
            .post(&format!("{}/api/submit-finance", &app.address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&invalid_body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for {}.",
            description
        );
    }
    assert!(app.finances.entries().await.is_empty());
}
