//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use murmur_api::routes;
use murmur_api::state::AppState;
use murmur_bus::{BusConfig, EventBus};
use murmur_notify::{AccountingService, Notifier};
use murmur_relay::{ChannelAuthorizer, RelayPublisher};
use murmur_test_support::{FixedClock, InMemoryReadStore, RecordingRelayClient, StaticIdentityVerifier};

/// Bearer token the test verifier accepts for the test user.
pub const ALICE_TOKEN: &str = "alice-session";

/// A fully wired app over in-memory collaborators, with handles kept for
/// assertions.
pub struct TestApp {
    pub app: Router,
    pub bus: Arc<EventBus>,
    pub notifier: Arc<Notifier>,
    pub relay: Arc<RecordingRelayClient>,
    pub store: Arc<InMemoryReadStore>,
    pub alice: Uuid,
}

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 2, 1, 9, 0, 0).unwrap(),
    ))
}

/// Build the full app router with in-memory relay/store and a static
/// identity verifier. Uses the same route structure as `main.rs`.
pub fn build_test_app() -> TestApp {
    build_test_app_with_bus_config(BusConfig::default())
}

/// Build the app with a custom bus configuration, for queue and ceiling
/// tests.
pub fn build_test_app_with_bus_config(config: BusConfig) -> TestApp {
    let alice = Uuid::new_v4();
    let bus = Arc::new(EventBus::with_config(config));
    let relay = Arc::new(RecordingRelayClient::new());
    let store = Arc::new(InMemoryReadStore::new());

    let publisher = Arc::new(RelayPublisher::new(Arc::clone(&relay) as _));
    let notifier = Arc::new(Notifier::new(Arc::clone(&bus), publisher));
    let authorizer = Arc::new(ChannelAuthorizer::new("relay-secret", fixed_clock()));
    let accounting = Arc::new(AccountingService::new(
        Arc::clone(&relay) as _,
        Arc::clone(&store) as _,
    ));
    let identity = Arc::new(StaticIdentityVerifier::new().with_token(ALICE_TOKEN, alice));

    let app_state = AppState::new(
        Arc::clone(&notifier),
        authorizer,
        accounting,
        identity,
    );

    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/notifications", routes::notifications::router())
        .with_state(app_state);

    TestApp {
        app,
        bus,
        notifier,
        relay,
        store,
        alice,
    }
}

fn request(method: &str, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Send a GET request and return the status and parsed JSON body.
pub async fn get_json(
    app: Router,
    uri: &str,
    bearer: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request("GET", uri, bearer)).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    (status, json)
}

/// Send a POST request with an empty body and return the status and parsed
/// JSON body.
pub async fn post_json(
    app: Router,
    uri: &str,
    bearer: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request("POST", uri, bearer)).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    (status, json)
}
