//! Test helpers for graphrec-client integration tests
//!
//! `MockApi` serves the GraphRec HTTP surface from an in-process axum
//! server on an ephemeral port. Every request is logged when it arrives and
//! again when its response is ready, so tests can assert on ordering.
//! Per-route delays and failures are injected through the handle.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use graphrec_client::GraphRecClient;
use graphrec_common::config::ClientConfig;
use graphrec_common::store::MemoryStore;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Endpoint families the mock serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Status,
    Items,
    Like,
    Unlike,
    Likes,
    Preferences,
    Recommend,
    Metrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Arrived,
    Completed,
}

/// One logged request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub route: Route,
    pub phase: Phase,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Controls {
    delays: HashMap<Route, Duration>,
    /// Recommendation delay keyed by requested `k`
    recommend_delays: HashMap<usize, Duration>,
    failures: HashMap<Route, StatusCode>,
    garbage: HashSet<Route>,
    /// Fixed 200 JSON body replacing the normal response
    bodies: HashMap<Route, Value>,
    /// Extra entries returned beyond `k`
    recommend_overshoot: usize,
}

#[derive(Default)]
struct MockState {
    log: Mutex<Vec<RecordedRequest>>,
    controls: Mutex<Controls>,
    likes: Mutex<HashMap<String, BTreeSet<i64>>>,
    preferences: Mutex<HashMap<String, Vec<String>>>,
}

impl MockState {
    fn record(
        &self,
        route: Route,
        phase: Phase,
        path: String,
        query: HashMap<String, String>,
        body: Option<Value>,
    ) {
        self.log.lock().unwrap().push(RecordedRequest {
            route,
            phase,
            path,
            query,
            body,
        });
    }

    async fn pause(&self, route: Route, k: Option<usize>) {
        let delay = {
            let controls = self.controls.lock().unwrap();
            k.and_then(|k| controls.recommend_delays.get(&k).copied())
                .or_else(|| controls.delays.get(&route).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Injected failure or garbage body for the route, if any
    fn injected(&self, route: Route) -> Option<Response> {
        let controls = self.controls.lock().unwrap();
        if let Some(status) = controls.failures.get(&route) {
            return Some((*status, "injected failure").into_response());
        }
        if controls.garbage.contains(&route) {
            return Some((StatusCode::OK, "<html>not json</html>").into_response());
        }
        if let Some(body) = controls.bodies.get(&route) {
            return Some(Json(body.clone()).into_response());
        }
        None
    }
}

/// Handle to a running mock service
#[derive(Clone)]
pub struct MockApi {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockApi {
    /// Start a mock service on an ephemeral local port
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Client against this mock with an in-memory durable store
    pub fn client(&self) -> GraphRecClient {
        self.client_with_store(MemoryStore::new())
    }

    pub fn client_with_store(&self, store: MemoryStore) -> GraphRecClient {
        GraphRecClient::new(test_config(&self.base_url), Arc::new(store)).unwrap()
    }

    pub fn set_delay(&self, route: Route, delay: Duration) {
        self.state.controls.lock().unwrap().delays.insert(route, delay);
    }

    pub fn set_recommend_delay(&self, k: usize, delay: Duration) {
        self.state
            .controls
            .lock()
            .unwrap()
            .recommend_delays
            .insert(k, delay);
    }

    pub fn fail(&self, route: Route, status: StatusCode) {
        self.state.controls.lock().unwrap().failures.insert(route, status);
    }

    pub fn recover(&self, route: Route) {
        let mut controls = self.state.controls.lock().unwrap();
        controls.failures.remove(&route);
        controls.garbage.remove(&route);
        controls.bodies.remove(&route);
    }

    /// Answer the route with 200 and a non-JSON body
    pub fn garbage(&self, route: Route) {
        self.state
            .controls
            .lock()
            .unwrap()
            .garbage
            .insert(route);
    }

    /// Answer the route with 200 and the given JSON body
    pub fn respond_with(&self, route: Route, body: Value) {
        self.state.controls.lock().unwrap().bodies.insert(route, body);
    }

    pub fn set_recommend_overshoot(&self, extra: usize) {
        self.state.controls.lock().unwrap().recommend_overshoot = extra;
    }

    pub fn seed_likes(&self, user_id: &str, items: &[i64]) {
        self.state
            .likes
            .lock()
            .unwrap()
            .insert(user_id.to_string(), items.iter().copied().collect());
    }

    /// Full log, both phases, in order
    pub fn log(&self) -> Vec<RecordedRequest> {
        self.state.log.lock().unwrap().clone()
    }

    /// Requests in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log()
            .into_iter()
            .filter(|r| r.phase == Phase::Arrived)
            .collect()
    }

    pub fn requests_for(&self, route: Route) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.route == route)
            .collect()
    }

    /// Position of the first log entry matching route and phase
    pub fn position(&self, route: Route, phase: Phase) -> Option<usize> {
        self.log()
            .iter()
            .position(|r| r.route == route && r.phase == phase)
    }

    pub fn stored_preferences(&self, user_id: &str) -> Option<Vec<String>> {
        self.state.preferences.lock().unwrap().get(user_id).cloned()
    }
}

pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_string(),
        request_timeout_secs: 5,
        ..ClientConfig::default()
    }
}

/// Base URL of a local port with nothing listening
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

type Shared = State<Arc<MockState>>;

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/items", get(items))
        .route("/interaction/", post(like).delete(unlike))
        .route("/interaction/:user_id", get(likes))
        .route("/recommend/preferences", post(preferences))
        .route("/recommend/:user_id", get(recommend))
        .route("/metrics/", get(metrics))
        .with_state(state)
}

fn user_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn status(State(state): Shared) -> Response {
    state.record(Route::Status, Phase::Arrived, "/".into(), HashMap::new(), None);
    state.pause(Route::Status, None).await;
    let response = state.injected(Route::Status).unwrap_or_else(|| {
        Json(json!({
            "message": "GraphRec API is running",
            "docs_url": "/docs",
            "status": "online"
        }))
        .into_response()
    });
    state.record(Route::Status, Phase::Completed, "/".into(), HashMap::new(), None);
    response
}

async fn items(State(state): Shared) -> Response {
    state.record(Route::Items, Phase::Arrived, "/items".into(), HashMap::new(), None);
    state.pause(Route::Items, None).await;
    let response = state.injected(Route::Items).unwrap_or_else(|| {
        Json(json!({
            "1": {"title": "The Matrix", "category": "Sci-Fi"},
            "2": {"title": "Heat", "category": "Action", "year": 1995},
            "7": {"title": "Amelie", "category": "Romance"}
        }))
        .into_response()
    });
    state.record(Route::Items, Phase::Completed, "/items".into(), HashMap::new(), None);
    response
}

async fn like(State(state): Shared, Json(body): Json<Value>) -> Response {
    let path = "/interaction/".to_string();
    state.record(Route::Like, Phase::Arrived, path.clone(), HashMap::new(), Some(body.clone()));
    state.pause(Route::Like, None).await;
    let response = state.injected(Route::Like).unwrap_or_else(|| {
        let user = user_key(&body["user_id"]);
        let item = body["item_id"].as_i64().unwrap_or_default();
        state.likes.lock().unwrap().entry(user).or_default().insert(item);
        Json(json!({"status": "success", "msg": "Interaction logged"})).into_response()
    });
    state.record(Route::Like, Phase::Completed, path, HashMap::new(), Some(body));
    response
}

async fn unlike(State(state): Shared, Json(body): Json<Value>) -> Response {
    let path = "/interaction/".to_string();
    state.record(Route::Unlike, Phase::Arrived, path.clone(), HashMap::new(), Some(body.clone()));
    state.pause(Route::Unlike, None).await;
    let response = state.injected(Route::Unlike).unwrap_or_else(|| {
        let user = user_key(&body["user_id"]);
        let item = body["item_id"].as_i64().unwrap_or_default();
        if let Some(set) = state.likes.lock().unwrap().get_mut(&user) {
            set.remove(&item);
        }
        Json(json!({"status": "success", "msg": "Interaction removed"})).into_response()
    });
    state.record(Route::Unlike, Phase::Completed, path, HashMap::new(), Some(body));
    response
}

async fn likes(State(state): Shared, Path(user_id): Path<String>) -> Response {
    let path = format!("/interaction/{}", user_id);
    state.record(Route::Likes, Phase::Arrived, path.clone(), HashMap::new(), None);
    state.pause(Route::Likes, None).await;
    let response = state.injected(Route::Likes).unwrap_or_else(|| {
        let items: Vec<i64> = state
            .likes
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        Json(items).into_response()
    });
    state.record(Route::Likes, Phase::Completed, path, HashMap::new(), None);
    response
}

async fn preferences(State(state): Shared, Json(body): Json<Value>) -> Response {
    let path = "/recommend/preferences".to_string();
    state.record(Route::Preferences, Phase::Arrived, path.clone(), HashMap::new(), Some(body.clone()));
    state.pause(Route::Preferences, None).await;
    let response = state.injected(Route::Preferences).unwrap_or_else(|| {
        let user = user_key(&body["user_id"]);
        let genres: Vec<String> = body["genres"]
            .as_array()
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        state.preferences.lock().unwrap().insert(user, genres);
        Json(json!({"status": "success"})).into_response()
    });
    state.record(Route::Preferences, Phase::Completed, path, HashMap::new(), Some(body));
    response
}

async fn recommend(
    State(state): Shared,
    Path(user_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let path = format!("/recommend/{}", user_id);
    let k: usize = query.get("k").and_then(|k| k.parse().ok()).unwrap_or(5);
    state.record(Route::Recommend, Phase::Arrived, path.clone(), query.clone(), None);
    state.pause(Route::Recommend, Some(k)).await;
    let response = state.injected(Route::Recommend).unwrap_or_else(|| {
        let overshoot = state.controls.lock().unwrap().recommend_overshoot;
        // Ids encode k so overlapping responses can be told apart
        let recommendations: Vec<Value> = (0..k + overshoot)
            .map(|rank| {
                json!({
                    "id": (k * 100 + rank) as i64,
                    "title": format!("Item {}", k * 100 + rank),
                    "category": "Drama",
                    "reason": "Graph-Based"
                })
            })
            .collect();
        Json(json!({
            "user_id": user_id,
            "recommendations": recommendations,
            "latency_ms": 1.5
        }))
        .into_response()
    });
    state.record(Route::Recommend, Phase::Completed, path, query, None);
    response
}

async fn metrics(State(state): Shared) -> Response {
    state.record(Route::Metrics, Phase::Arrived, "/metrics/".into(), HashMap::new(), None);
    state.pause(Route::Metrics, None).await;
    let response = state.injected(Route::Metrics).unwrap_or_else(|| {
        Json(json!({
            "nodes_users": 610,
            "nodes_items": 9742,
            "edges_interactions": 100836
        }))
        .into_response()
    });
    state.record(Route::Metrics, Phase::Completed, "/metrics/".into(), HashMap::new(), None);
    response
}
