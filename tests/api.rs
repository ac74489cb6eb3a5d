use std::sync::Arc;

use auth_service::{config::Config, routes, services::clock::ManualClock, AppState, Stores};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
}

impl TestApp {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap()));
        let mut config = Config::with_secret("integration-secret");
        config.bcrypt_cost = 4;
        let state = AppState::new(&config, Stores::in_memory(), clock.clone());
        Self { router: routes::router(state), clock }
    }

    fn wait(&self, seconds: i64) {
        self.clock.advance(Duration::seconds(seconds));
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, body)
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, None, Some(body)).await
    }

    async fn register_customer(&self, email: &str) -> Value {
        let (status, body) = self.post("/v1.0/customers", customer(email)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    async fn customer_login(&self, email: &str) -> Value {
        let (status, body) = self
            .post("/v1.0/customers/login", json!({ "email": email, "password": "password123" }))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    async fn customer_refresh(&self, pair: &Value) -> (StatusCode, Value) {
        self.post(
            "/v1.0/customers/refresh",
            json!({ "access_token": pair["access_token"], "refresh_token": pair["refresh_token"] }),
        )
        .await
    }
}

fn customer(email: &str) -> Value {
    json!({
        "email": email,
        "password": "password123",
        "name": "Ada Lovelace",
        "address": "12 St James's Square",
        "city": "London",
        "postal_code": "SW1Y 4JH",
        "country_code": "GB"
    })
}

fn restaurant(vat_code: &str, owner_email: &str) -> Value {
    json!({
        "restaurant": {
            "vat_code": vat_code,
            "name": "Trattoria da Mario",
            "legal_name": "Trattoria da Mario S.r.l.",
            "tax_id": "RSSMRA80A01H501U",
            "timezone_id": "Europe/Rome",
            "contact": {
                "phone_prefix": "+39",
                "phone_number": "0612345678",
                "email": "info@trattoria.it",
                "address": "Via Roma 1",
                "city": "Roma",
                "postal_code": "00100",
                "country_code": "IT"
            }
        },
        "staff_owner": {
            "email": owner_email,
            "password": "supersecret",
            "name": "Mario Rossi",
            "address": "Via Roma 1",
            "city": "Roma",
            "postal_code": "00100",
            "country_code": "IT"
        }
    })
}

/// Reads the claims of an access token without verifying it.
fn claims(token: &Value) -> Value {
    let token = token.as_str().unwrap();
    let payload = token.split('.').nth(1).unwrap();
    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
}

fn is_object_id(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|id| id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit()))
}

fn assert_token_pair(pair: &Value) {
    assert!(!pair["access_token"].as_str().unwrap().is_empty());
    assert!(!pair["refresh_token"].as_str().unwrap().is_empty());
    assert!(pair["expires_in"].as_i64().unwrap() > 0);
    assert_eq!(pair["token_type"], "Bearer");
}

#[tokio::test]
async fn customer_happy_path() {
    let app = TestApp::new();
    let registered = app.register_customer("ada@example.com").await;
    assert!(is_object_id(&registered["id"]));
    assert_eq!(registered["email"], "ada@example.com");
    assert_eq!(registered["country_code"], "GB");
    assert!(registered["created_at"].is_string());
    assert!(registered.get("password").is_none());
    assert!(registered.get("password_hash").is_none());

    let pair = app.customer_login("ada@example.com").await;
    assert_token_pair(&pair);

    let claims = claims(&pair["access_token"]);
    assert_eq!(claims["sub"], registered["id"]);
    assert_eq!(claims["role"], "customer");
    assert_eq!(claims["tenant"], "");
}

#[tokio::test]
async fn customer_rotation_within_grace() {
    let app = TestApp::new();
    app.register_customer("ada@example.com").await;
    let original = app.customer_login("ada@example.com").await;

    app.wait(1);
    let (status, first) = app.customer_refresh(&original).await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_ne!(first["access_token"], original["access_token"]);
    assert_ne!(first["refresh_token"], original["refresh_token"]);
    assert_eq!(first["token_type"], original["token_type"]);
    assert_eq!(first["expires_in"], original["expires_in"]);

    app.wait(1);
    let (status, second) = app.customer_refresh(&original).await;
    assert_eq!(status, StatusCode::OK, "{second}");
    for earlier in [&original, &first] {
        assert_ne!(second["access_token"], earlier["access_token"]);
        assert_ne!(second["refresh_token"], earlier["refresh_token"]);
    }
}

#[tokio::test]
async fn customer_rotation_past_grace() {
    let app = TestApp::new();
    app.register_customer("ada@example.com").await;
    let original = app.customer_login("ada@example.com").await;

    app.wait(1);
    assert_eq!(app.customer_refresh(&original).await.0, StatusCode::OK);
    app.wait(1);
    assert_eq!(app.customer_refresh(&original).await.0, StatusCode::OK);

    app.wait(5);
    let (status, body) = app.customer_refresh(&original).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_REFRESH_TOKEN");
    assert_eq!(body["details"], json!([]));
}

#[tokio::test]
async fn staff_happy_path() {
    let app = TestApp::new();
    let (status, registered) = app.post("/v1.0/restaurants", restaurant("IT12345678901", "mario@trattoria.it")).await;
    assert_eq!(status, StatusCode::CREATED, "{registered}");

    let restaurant = &registered["restaurant"];
    let owner = &registered["staff_owner"];
    assert!(is_object_id(&restaurant["id"]));
    assert!(is_object_id(&owner["id"]));
    assert_eq!(restaurant["contact"]["phone_prefix"], "+39");
    assert_eq!(restaurant["timezone_id"], "Europe/Rome");
    assert_eq!(owner["owner"], true);
    assert!(owner.get("password_hash").is_none());

    let (status, pair) = app
        .post(
            "/v1.0/staff/login",
            json!({ "email": "mario@trattoria.it", "password": "supersecret", "restaurant_id": restaurant["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{pair}");
    assert_token_pair(&pair);

    let login_claims = claims(&pair["access_token"]);
    assert_eq!(login_claims["sub"], owner["id"]);
    assert_eq!(login_claims["role"], "staff");
    assert_eq!(login_claims["tenant"], restaurant["id"]);

    app.wait(1);
    let (status, rotated) = app
        .post(
            "/v1.0/staff/refresh",
            json!({ "access_token": pair["access_token"], "refresh_token": pair["refresh_token"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{rotated}");
    assert_eq!(claims(&rotated["access_token"])["tenant"], restaurant["id"]);

    let uri = format!("/v1.0/restaurants/{}", restaurant["id"].as_str().unwrap());
    let (status, fetched) = app.send(Method::GET, &uri, rotated["access_token"].as_str(), None).await;
    assert_eq!(status, StatusCode::OK, "{fetched}");
    assert_eq!(fetched["vat_code"], "IT12345678901");
}

#[tokio::test]
async fn role_gate() {
    let app = TestApp::new();
    let customer = app.register_customer("ada@example.com").await;
    let (_, registered) = app.post("/v1.0/restaurants", restaurant("IT1", "mario@trattoria.it")).await;
    let staff_token = registered["auth"]["access_token"].as_str().unwrap();

    let uri = format!("/v1.0/customers/{}", customer["id"].as_str().unwrap());
    let (status, body) = app.send(Method::GET, &uri, Some(staff_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let customer_token = customer["auth"]["access_token"].as_str().unwrap();
    let uri = format!("/v1.0/restaurants/{}", registered["restaurant"]["id"].as_str().unwrap());
    let (status, _) = app.send(Method::GET, &uri, Some(customer_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn subject_gate() {
    let app = TestApp::new();
    let a = app.register_customer("a@example.com").await;
    let b = app.register_customer("b@example.com").await;
    let a_token = app.customer_login("a@example.com").await["access_token"].clone();

    let uri = format!("/v1.0/customers/{}", b["id"].as_str().unwrap());
    let (status, body) = app.send(Method::GET, &uri, a_token.as_str(), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = app.send(Method::PUT, &uri, a_token.as_str(), Some(customer("a@example.com"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let own = format!("/v1.0/customers/{}", a["id"].as_str().unwrap());
    let (status, body) = app.send(Method::GET, &own, a_token.as_str(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], a["id"]);
}

#[tokio::test]
async fn customers_can_update_their_own_profile() {
    let app = TestApp::new();
    let a = app.register_customer("a@example.com").await;
    let token = a["auth"]["access_token"].as_str().unwrap();
    let uri = format!("/v1.0/customers/{}", a["id"].as_str().unwrap());

    let update = json!({
        "name": "Ada King",
        "address": "Ockham Park",
        "city": "Ockham",
        "postal_code": "GU23 6NT",
        "country_code": "gb"
    });
    let (status, body) = app.send(Method::PUT, &uri, Some(token), Some(update)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Ada King");
    assert_eq!(body["country_code"], "GB");
    assert_eq!(body["email"], "a@example.com");

    let (status, body) = app
        .send(Method::PUT, &uri, Some(token), Some(json!({ "name": "" , "address": "x", "city": "y", "postal_code": "12345", "country_code": "GB" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], json!(["name is required"]));
}

#[tokio::test]
async fn missing_or_expired_credentials_are_unauthorized() {
    let app = TestApp::new();
    let a = app.register_customer("a@example.com").await;
    let uri = format!("/v1.0/customers/{}", a["id"].as_str().unwrap());

    let (status, body) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.send(Method::GET, &uri, Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = a["auth"]["access_token"].as_str().unwrap();
    app.wait(3600);
    let (status, body) = app.send(Method::GET, &uri, Some(token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn registration_validation_and_conflicts() {
    let app = TestApp::new();

    let mut bad = customer("not-an-email");
    bad["password"] = json!("short");
    bad["country_code"] = json!("GBR");
    let (status, body) = app.post("/v1.0/customers", bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "validation failed");
    assert_eq!(
        body["details"],
        json!([
            "email must be a valid email address",
            "password must be a valid password with at least 8 characters long",
            "country_code is invalid"
        ])
    );

    let (status, body) = app.post("/v1.0/customers", json!({ "email": "ada@example.com" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_array().unwrap().contains(&json!("password is required")));

    app.register_customer("ada@example.com").await;
    let (status, body) = app.post("/v1.0/customers", customer("ada@example.com")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CUSTOMER_ALREADY_EXISTS");

    let mut nested = restaurant("IT1", "mario@trattoria.it");
    nested["restaurant"]["contact"]["phone_prefix"] = json!("39");
    let (status, body) = app.post("/v1.0/restaurants", nested).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], json!(["restaurant.contact.phone_prefix is invalid"]));

    assert_eq!(app.post("/v1.0/restaurants", restaurant("IT1", "mario@trattoria.it")).await.0, StatusCode::CREATED);
    let (status, body) = app.post("/v1.0/restaurants", restaurant("IT2", "mario@trattoria.it")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "STAFF_ALREADY_EXISTS");
}

#[tokio::test]
async fn undecodable_bodies_are_invalid_requests() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1.0/customers/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn bad_logins_share_one_error() {
    let app = TestApp::new();
    app.register_customer("ada@example.com").await;

    for body in [
        json!({ "email": "ada@example.com", "password": "wrong-password" }),
        json!({ "email": "nobody@example.com", "password": "password123" }),
    ] {
        let (status, body) = app.post("/v1.0/customers/login", body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_CREDENTIALS");
        assert_eq!(body["message"], "invalid credentials");
    }
}

#[tokio::test]
async fn refresh_with_someone_elses_access_token_is_a_mismatch() {
    let app = TestApp::new();
    app.register_customer("a@example.com").await;
    app.register_customer("b@example.com").await;
    let a = app.customer_login("a@example.com").await;
    let b = app.customer_login("b@example.com").await;

    let (status, body) = app
        .post(
            "/v1.0/customers/refresh",
            json!({ "access_token": b["access_token"], "refresh_token": a["refresh_token"] }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "TOKEN_MISMATCH");

    let (status, body) = app
        .post(
            "/v1.0/customers/refresh",
            json!({ "access_token": a["access_token"], "refresh_token": "no-such-token" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn health_and_request_ids() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-me")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-me");

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
