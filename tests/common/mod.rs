#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use chirpy::configuration::{Platform, Settings};
use chirpy::startup::run;
use chirpy::state::AppState;
use chirpy::store::MemoryStore;
use serde_json::{json, Value};

pub const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";
pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

fn test_settings(platform: Platform) -> Settings {
    Settings {
        db_url: "postgres://unused".to_string(),
        secret: SECRET.to_string(),
        polka_key: POLKA_KEY.to_string(),
        platform,
        port: 0,
        filepath_root: env!("CARGO_MANIFEST_DIR").to_string(),
        db_max_connections: 1,
        db_acquire_timeout_seconds: 1,
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_on(Platform::Dev)
}

pub fn spawn_app_on(platform: Platform) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let settings = test_settings(platform);
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), &settings);

    let server = run(listener, state, &settings.filepath_root).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/users"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register then log in, returning the session body
    pub async fn signed_in(&self, email: &str, password: &str) -> Value {
        assert_eq!(201, self.register(email, password).await.status().as_u16());
        let response = self
            .login(json!({ "email": email, "password": password }))
            .await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse session")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn create_chirp(&self, token: &str, body: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/chirps"))
            .bearer_auth(token)
            .json(&json!({ "body": body }))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub fn token_of(session: &Value) -> String {
    session["token"].as_str().expect("missing token").to_string()
}

pub fn refresh_token_of(session: &Value) -> String {
    session["refresh_token"]
        .as_str()
        .expect("missing refresh token")
        .to_string()
}
