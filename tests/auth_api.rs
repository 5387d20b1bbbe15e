use std::net::TcpListener;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};

use jwt_auth::auth::{AuthService, TokenIssuer, TOKEN_LIFETIME_HOURS};
use jwt_auth::configuration::JwtSettings;
use jwt_auth::logger::REQUEST_ID_HEADER;
use jwt_auth::startup::run;
use jwt_auth::store::InMemoryCredentialStore;

const TEST_SECRET: &str = "integration-test-signing-key-0123456789";

pub struct TestApp {
    pub address: String,
    pub issuer: TokenIssuer,
    pub store: InMemoryCredentialStore,
}

impl TestApp {
    pub async fn register(&self, client: &reqwest::Client, body: &Value) -> reqwest::Response {
        client
            .post(&format!("{}/api/auth/register", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, client: &reqwest::Client, body: &Value) -> reqwest::Response {
        client
            .post(&format!("{}/api/auth/login", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let issuer = TokenIssuer::new(&JwtSettings {
        token: TEST_SECRET.to_string(),
    })
    .expect("Failed to build token issuer");
    let store = InMemoryCredentialStore::new();
    let service = AuthService::new(Arc::new(store.clone()), issuer.clone(), 4);

    let server = run(listener, service).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        issuer,
        store,
    }
}

fn credentials(username: &str, password: &str) -> Value {
    json!({ "username": username, "password": password })
}

// --- Registration ---

#[tokio::test]
async fn register_returns_200_without_password_hash() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    let response = app.register(&client, &credentials("alice", "p@ss1")).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], "alice");
    assert!(body.get("created_at").is_some());
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn register_returns_400_for_duplicate_username() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    let first = app.register(&client, &credentials("alice", "p@ss1")).await;
    assert_eq!(200, first.status().as_u16());

    let second = app.register(&client, &credentials("alice", "other")).await;
    assert_eq!(400, second.status().as_u16());
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["message"], "User already exists");
    assert_eq!(body["code"], "USER_ALREADY_EXISTS");

    // 기존 비밀번호가 유지되어야 함
    let login = app.login(&client, &credentials("alice", "p@ss1")).await;
    assert_eq!(200, login.status().as_u16());
}

#[tokio::test]
async fn concurrent_duplicate_registrations_admit_exactly_one() {
    let app = spawn_app();
    let client = reqwest::Client::new();
    let body = credentials("racer", "p@ss1");

    let responses = futures::future::join_all(
        (0..8).map(|_| app.register(&client, &body)),
    )
    .await;

    let statuses: Vec<u16> = responses.iter().map(|r| r.status().as_u16()).collect();
    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 1, "{:?}", statuses);
    assert_eq!(statuses.iter().filter(|s| **s == 400).count(), 7, "{:?}", statuses);
    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn register_returns_400_when_data_is_missing() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    let test_cases = vec![
        (json!({ "username": "alice" }), "missing password"),
        (json!({ "password": "p@ss1" }), "missing username"),
        (json!({}), "missing both"),
        (credentials("", "p@ss1"), "empty username"),
        (credentials("   ", "p@ss1"), "blank username"),
        (credentials("alice", ""), "empty password"),
        (credentials("alice", &"x".repeat(73)), "password over 72 bytes"),
    ];

    for (body, description) in test_cases {
        let response = app.register(&client, &body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 when the payload was {}.",
            description
        );
    }
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn register_returns_400_for_malformed_json() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/api/auth/register", &app.address))
        .header("Content-Type", "application/json")
        .body("{\"username\": \"alice\",")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// --- Login ---

#[tokio::test]
async fn alice_scenario() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    let response = app.register(&client, &credentials("alice", "p@ss1")).await;
    assert_eq!(200, response.status().as_u16());

    let response = app.login(&client, &credentials("alice", "p@ss1")).await;
    assert_eq!(200, response.status().as_u16());
    let token = response.text().await.unwrap();
    assert!(!token.is_empty());
    assert_eq!(token.split('.').count(), 3);

    let response = app.login(&client, &credentials("alice", "wrong")).await;
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Wrong password");

    let response = app.login(&client, &credentials("bob", "x")).await;
    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn login_token_carries_name_and_24h_expiry() {
    let app = spawn_app();
    let client = reqwest::Client::new();
    app.register(&client, &credentials("alice", "p@ss1")).await;

    let before = Utc::now();
    let response = app.login(&client, &credentials("alice", "p@ss1")).await;
    let after = Utc::now();

    assert_eq!(200, response.status().as_u16());
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));

    let token = response.text().await.unwrap();
    let claims = app.issuer.verify(&token).expect("Token should verify");
    let lifetime = Duration::hours(TOKEN_LIFETIME_HOURS);

    assert_eq!(claims.name, "alice");
    assert!(claims.exp >= (before + lifetime).timestamp() - 1);
    assert!(claims.exp <= (after + lifetime).timestamp());

    let header = jsonwebtoken::decode_header(&token).unwrap();
    assert_eq!(header.alg, jsonwebtoken::Algorithm::HS512);
}

#[tokio::test]
async fn login_returns_400_for_malformed_json() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/api/auth/login", &app.address))
        .header("Content-Type", "application/json")
        .body("not json")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
}

// --- Session slot ---

#[tokio::test]
async fn session_returns_last_issued_token() {
    let app = spawn_app();
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();
    app.register(&client, &credentials("alice", "p@ss1")).await;

    let token = app
        .login(&client, &credentials("alice", "p@ss1"))
        .await
        .text()
        .await
        .unwrap();

    let response = client
        .get(&format!("{}/api/auth/session", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    assert_eq!(response.text().await.unwrap(), token);
}

#[tokio::test]
async fn session_returns_401_without_cookie() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/auth/session", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn login_ignores_client_chosen_session_id() {
    let app = spawn_app();
    let client = reqwest::Client::new();
    let planted = "11111111-2222-3333-4444-555555555555";
    app.register(&client, &credentials("victim", "p@ss1")).await;

    let response = client
        .post(&format!("{}/api/auth/login", &app.address))
        .header("Cookie", format!("session_id={}", planted))
        .json(&credentials("victim", "p@ss1"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let issued_id = response
        .cookies()
        .find(|c| c.name() == "session_id")
        .map(|c| c.value().to_string())
        .expect("Missing session cookie");
    assert_ne!(issued_id, planted);

    let response = client
        .get(&format!("{}/api/auth/session", &app.address))
        .header("Cookie", format!("session_id={}", planted))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

// --- Bearer-protected route ---

#[tokio::test]
async fn me_returns_identity_for_valid_token() {
    let app = spawn_app();
    let client = reqwest::Client::new();
    app.register(&client, &credentials("alice", "p@ss1")).await;
    let token = app
        .login(&client, &credentials("alice", "p@ss1"))
        .await
        .text()
        .await
        .unwrap();

    let response = client
        .get(&format!("{}/api/auth/me", &app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "alice");
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn me_returns_401_for_missing_or_bad_tokens() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/auth/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_TOKEN");

    let bad_headers = vec![
        ("Bearer not.a.token", "garbage token"),
        ("Basic YWxpY2U6cEBzczE=", "wrong scheme"),
        ("Bearer", "empty bearer"),
    ];

    for (header, description) in bad_headers {
        let response = client
            .get(&format!("{}/api/auth/me", &app.address))
            .header("Authorization", header)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            401,
            response.status().as_u16(),
            "The API did not fail with 401 for {}.",
            description
        );
    }
}

#[tokio::test]
async fn me_rejects_token_signed_with_another_secret() {
    let app = spawn_app();
    let other = TokenIssuer::new(&JwtSettings {
        token: "a-completely-different-secret-0123456789".to_string(),
    })
    .unwrap();
    let credential = jwt_auth::store::UserCredential::new("alice", "unused".to_string());
    let forged = other.issue(&credential).unwrap();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/auth/me", &app.address))
        .bearer_auth(&forged.token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "TOKEN_INVALID");
}

// --- Request id correlation ---

async fn assert_error_id_matches_header(response: reqwest::Response, expected_status: u16) {
    assert_eq!(expected_status, response.status().as_u16());
    let header = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .expect("Missing request id header")
        .to_str()
        .unwrap()
        .to_string();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error_id"], header.as_str());
}

#[tokio::test]
async fn rejected_bearer_token_response_carries_request_id() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/auth/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_error_id_matches_header(response, 401).await;

    let response = client
        .get(&format!("{}/api/auth/me", &app.address))
        .bearer_auth("not.a.token")
        .send()
        .await
        .expect("Failed to execute request.");
    assert_error_id_matches_header(response, 401).await;
}

#[tokio::test]
async fn handler_error_id_matches_request_id_header() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    let response = app.login(&client, &credentials("nobody", "x")).await;
    assert_error_id_matches_header(response, 404).await;

    let response = client
        .post(&format!("{}/api/auth/register", &app.address))
        .header("Content-Type", "application/json")
        .body("{")
        .send()
        .await
        .expect("Failed to execute request.");
    assert_error_id_matches_header(response, 400).await;
}
