//! Shared harness for HTTP contract tests.
//!
//! Drives the real router in-process with `oneshot`, backed by in-memory
//! stores and a cheap Argon2 cost.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use api::AppState;
use auth::{AuthService, HashCost, MemoryStore, NewUser, Role, SessionSettings};
use storage::{EventService, MemoryEventStore};

pub const PASSWORD: &str = "pass";

#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

pub fn settings() -> SessionSettings {
    SessionSettings {
        hash_cost: HashCost {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        },
        ..SessionSettings::new("integration_test_secret")
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(settings())
    }

    pub fn with_settings(settings: SessionSettings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let auth_service = AuthService::new(store.clone(), store, settings).unwrap();
        let event_service = EventService::new(Arc::new(MemoryEventStore::new()));
        let state = Arc::new(AppState::new(auth_service, event_service));
        let router = api::router(state.clone(), Duration::from_secs(30));
        Self { router, state }
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, None, Some(body)).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn register(&self, phone: &str) -> (StatusCode, Value) {
        self.post(
            "/auth/register",
            json!({
                "phone": phone,
                "password": PASSWORD,
                "firstName": "name",
                "lastName": "name"
            }),
        )
        .await
    }

    /// Log in and return the response body (tokens and profile)
    pub async fn login(&self, phone: &str) -> Value {
        let (status, body) = self
            .post("/auth/login", json!({ "phone": phone, "password": PASSWORD }))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body
    }

    /// Register directly through the service with a given role, then log in
    pub async fn login_as(&self, phone: &str, role: Role) -> String {
        self.state
            .auth_service
            .register_with_role(
                NewUser {
                    phone: phone.to_string(),
                    password: PASSWORD.to_string(),
                    first_name: "John".to_string(),
                    last_name: "Doe".to_string(),
                    university: None,
                },
                role,
            )
            .await
            .unwrap();
        access_token(&self.login(phone).await)
    }
}

pub fn access_token(body: &Value) -> String {
    body["accessToken"].as_str().unwrap().to_string()
}

pub fn refresh_token(body: &Value) -> String {
    body["refreshToken"].as_str().unwrap().to_string()
}
