#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use tower::ServiceExt;

use forkful::identity::{provision_account, NewAccount, ProvisionOutcome, SharedSecretVerifier};
use forkful::media::{MediaUploader, UploadError};
use forkful::models::User;
use forkful::server::{build_router, AppState};
use forkful::storage::SharedStore;

pub const SECRET: &[u8] = b"integration-secret";
pub const AUDIENCE: &str = "forkful-api";
pub const ISSUER: &str = "https://tenant.example.com/";
pub const BOUNDARY: &str = "forkfulboundary7MA4YWxkTrZu0gW";

/// Records uploads in memory and hands out predictable URLs.
#[derive(Default)]
pub struct FakeUploader {
    pub uploads: Mutex<Vec<(usize, String)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl MediaUploader for FakeUploader {
    async fn upload(&self, bytes: Vec<u8>, mime: &str) -> Result<String, UploadError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(UploadError::Rejected { status: 500, body: "host down".into() });
        }
        let mut uploads = self.uploads.lock();
        uploads.push((bytes.len(), mime.to_string()));
        Ok(format!("https://img.test/{}.png", uploads.len()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: SharedStore,
    pub uploader: Arc<FakeUploader>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = SharedStore::in_memory();
        let uploader = Arc::new(FakeUploader::default());
        let verifier = Arc::new(SharedSecretVerifier::new(SECRET, AUDIENCE, ISSUER));
        let router = build_router(AppState::new(store.clone(), verifier, uploader.clone()));
        Self { router, store, uploader }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Bytes) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    pub async fn send_json(&self, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.send(req).await;
        let value = if body.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&body).unwrap() };
        (status, value)
    }

    /// Provision an account straight through the store.
    pub fn account(&self, sub: &str) -> User {
        let payload = NewAccount { email: format!("{}@example.com", sub.replace('|', "_")), ..Default::default() };
        match provision_account(&self.store, sub, payload).unwrap() {
            ProvisionOutcome::Created(u) => u,
            ProvisionOutcome::AlreadyProvisioned => panic!("account {} already exists", sub),
        }
    }
}

pub fn token_for(sub: &str) -> String {
    token_with(sub, AUDIENCE, SECRET)
}

pub fn token_with(sub: &str, audience: &str, secret: &[u8]) -> String {
    let claims = serde_json::json!({
        "sub": sub,
        "aud": audience,
        "iss": ISSUER,
        "exp": chrono::Utc::now().timestamp() + 600,
    });
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret)).unwrap()
}

pub fn request(method: &str, uri: &str, sub: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match sub {
        Some(s) => builder.header("authorization", format!("Bearer {}", token_for(s))),
        None => builder,
    }
}

pub fn json_request(method: &str, uri: &str, sub: Option<&str>, body: serde_json::Value) -> Request<Body> {
    request(method, uri, sub)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str, sub: Option<&str>) -> Request<Body> {
    request(method, uri, sub).body(Body::empty()).unwrap()
}

/// Hand-built multipart body: text fields plus an optional `imageFile` part.
pub fn multipart_body(fields: &[(&str, &str)], image: Option<(&[u8], &str)>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", BOUNDARY, name, value).as_bytes());
    }
    if let Some((bytes, mime)) = image {
        body.extend_from_slice(
            format!("--{}\r\nContent-Disposition: form-data; name=\"imageFile\"; filename=\"upload.img\"\r\nContent-Type: {}\r\n\r\n", BOUNDARY, mime)
                .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(method: &str, uri: &str, sub: &str, body: Vec<u8>) -> Request<Body> {
    request(method, uri, Some(sub))
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

pub fn restaurant_fields<'a>(name: &'a str, city: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("restaurantName", name),
        ("city", city),
        ("country", "UK"),
        ("deliveryPrice", "250"),
        ("estimatedDeliveryTime", "30"),
        ("cuisines[0]", "Noodles"),
        ("cuisines[1]", "Ramen"),
        ("menuItems[0][name]", "Tonkotsu"),
        ("menuItems[0][price]", "1200"),
        ("menuItems[1][name]", "Gyoza"),
        ("menuItems[1][price]", "450"),
    ]
}
