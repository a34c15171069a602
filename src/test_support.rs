use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::api;
use crate::core::{config::Settings, state::AppState};
use crate::repositories::classifications::{MemoryClassificationStore, SharedClassificationStore};
use crate::services::chat::ChatService;
use crate::services::dashboard::DashboardService;

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("ARIKYA_ENV", "test");
    std::env::set_var("ARIKYA_STRICT_CONFIG", "0");
    std::env::remove_var("GROQ_API_KEY");
    std::env::remove_var("DATABASE_URL");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
}

/// Memory-backend application context: no database, no AI credentials. Endpoints that
/// would reach the LLM fail with a missing-credentials error, which several tests rely
/// on to prove a code path never called it.
pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    set_test_env();

    let settings = Settings::load().expect("settings");
    let classifications: SharedClassificationStore = Arc::new(MemoryClassificationStore::new());
    let chat = ChatService::from_settings(&settings).expect("chat service");
    let dashboard = DashboardService::new(chat, classifications.clone());

    let state = AppState::new(settings, classifications, dashboard);
    let app = api::router::router(state.clone());

    TestContext { state, app, _guard: guard }
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
