#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use quickcheck::api::{AppState, create_app_state, router};
use quickcheck::config::Config;
use quickcheck::db::Store;
use quickcheck::models::user::{NewUser, User};
use quickcheck::services::{EmailMessage, Mailer};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const PASSWORD: &str = "Testseries1@";

/// Keeps every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Notifications go out on a background task.
    pub async fn wait_for(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..100 {
            let messages = self.messages();
            if messages.len() >= count {
                return messages;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.messages()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.jwt.secret = "integration-test-secret".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.observability.metrics_enabled = false;
    config
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_path = std::env::temp_dir().join(format!(
            "quickcheck-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let mut config = test_config();
        config.general.database_path = format!("sqlite:{}", db_path.display());

        let store = Store::new(&config.general.database_path)
            .await
            .expect("Failed to open test database");

        let mailer = Arc::new(RecordingMailer::default());
        let state = create_app_state(config, store, mailer.clone(), None);

        Self {
            router: router(state.clone()),
            state,
            mailer,
        }
    }

    pub fn store(&self) -> &Store {
        &self.state.store
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", uri, token, None).await
    }

    pub async fn register(&self, email: &str) -> (StatusCode, Value) {
        self.post(
            "/account/registration/",
            None,
            json!({
                "email": email,
                "first_name": "Ada",
                "last_name": "Obi",
                "password": PASSWORD,
                "password2": PASSWORD,
            }),
        )
        .await
    }

    /// Returns `(access, refresh)`.
    pub async fn login(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/account/login/",
                None,
                json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        (
            body["access"].as_str().unwrap().to_string(),
            body["refresh"].as_str().unwrap().to_string(),
        )
    }

    /// Registers through the API and returns the stored user with an access token.
    pub async fn signed_up(&self, email: &str) -> (User, String) {
        let (status, body) = self.register(email).await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
        let user = self.store().get_user_by_email(email).await.unwrap().unwrap();
        let (access, _) = self.login(email).await;
        (user, access)
    }

    pub async fn admin(&self, email: &str) -> (User, String) {
        let user = self
            .store()
            .create_user(
                NewUser {
                    email: email.to_string(),
                    first_name: "Grace".to_string(),
                    last_name: "Admin".to_string(),
                    password: PASSWORD.to_string(),
                    is_staff: true,
                    is_superuser: true,
                },
                &self.state.config.security,
            )
            .await
            .unwrap();
        let (access, _) = self.login(email).await;
        (user, access)
    }

    pub async fn apply(&self, user: &User, token: &str, amount: Value) -> (StatusCode, Value) {
        self.post(
            &format!("/loan/loan-request/{}/", user.id),
            Some(token),
            json!({ "amount_requested": amount, "purpose": "Business expansion" }),
        )
        .await
    }
}
