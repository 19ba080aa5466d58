//! End-to-end tests: convector triggers driving room sensors.
//!
//! Each test registers `conv_S1.action` with a 10 s interval, lets exactly one
//! poll cycle happen, cancels, and inspects the writes sent to the memory
//! service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use simenv::scenarios::temperature::{register_rooms, ConvectorRule};
use simenv::{
    CancellationToken, HttpMemoryClient, InMemoryStore, MemoryStore, PollingExecutor, RunReport,
    TriggerRegistry, WorkerOutcome,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const INTERVAL: Duration = Duration::from_secs(10);

fn room_store(action: &str, temperature: Value) -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    store.set("conv_S1", "text", "action", json!(action));
    store.set("temp_S1", "integer", "temperature", temperature);
    Arc::new(store)
}

async fn one_cycle(registry: TriggerRegistry, memory: Arc<dyn MemoryStore>) -> RunReport {
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(PollingExecutor::new(registry, memory).run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(150)).await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("executor did not stop")
        .unwrap()
}

fn single_room() -> TriggerRegistry {
    let mut registry = TriggerRegistry::new();
    registry.on("conv_S1", "action", INTERVAL, ConvectorRule::new("S1"));
    registry
}

// ===========================================================================
// In-process memory store
// ===========================================================================

#[tokio::test]
async fn increase_posts_one_degree_up() {
    let store = room_store("increase", json!(20));
    let report = one_cycle(single_room(), store.clone()).await;

    let posts = store.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0.as_str(), "temp_S1");
    assert_eq!(posts[0].1.as_str(), "temperature = 21");
    assert_eq!(report.workers[0].polls, 1);
    assert_eq!(report.workers[0].outcome, WorkerOutcome::Cancelled);
}

#[tokio::test]
async fn decrease_posts_one_degree_down() {
    let store = room_store("decrease", json!(20));
    one_cycle(single_room(), store.clone()).await;

    let posts = store.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0.as_str(), "temp_S1");
    assert_eq!(posts[0].1.as_str(), "temperature = 19");
}

#[tokio::test]
async fn hold_posts_nothing() {
    let store = room_store("hold", json!(20));
    let report = one_cycle(single_room(), store.clone()).await;

    assert!(store.posts().is_empty());
    assert_eq!(report.workers[0].polls, 1);
    assert_eq!(report.workers[0].outcome, WorkerOutcome::Cancelled);
}

#[tokio::test]
async fn non_string_action_is_idle() {
    let store = InMemoryStore::new();
    store.set("conv_S1", "integer", "action", json!(1));
    store.set("temp_S1", "integer", "temperature", json!(20));
    let store = Arc::new(store);

    one_cycle(single_room(), store.clone()).await;
    assert!(store.posts().is_empty());
}

#[tokio::test]
async fn missing_sensor_temperature_fails_the_trigger() {
    let store = {
        let s = InMemoryStore::new();
        s.set("conv_S1", "text", "action", json!("increase"));
        s.set("temp_S1", "text", "unit", json!("C"));
        Arc::new(s)
    };
    let report = one_cycle(single_room(), store.clone()).await;

    assert!(store.posts().is_empty());
    match &report.workers[0].outcome {
        WorkerOutcome::Failed(msg) => assert!(msg.contains("temperature"), "got {}", msg),
        other => panic!("Expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn extreme_temperature_fails_without_posting() {
    let store = room_store("increase", json!(i64::MAX));
    let report = one_cycle(single_room(), store.clone()).await;

    assert!(store.posts().is_empty());
    match &report.workers[0].outcome {
        WorkerOutcome::Failed(msg) => assert!(msg.contains("out of range"), "got {}", msg),
        other => panic!("Expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn rooms_are_driven_independently() {
    let store = InMemoryStore::new();
    store.set("conv_S1", "text", "action", json!("increase"));
    store.set("temp_S1", "integer", "temperature", json!(20));
    store.set("conv_S2", "text", "action", json!("decrease"));
    store.set("temp_S2", "integer", "temperature", json!(25));
    // S3 has no sensor: its trigger fails without affecting S1 and S2.
    store.set("conv_S3", "text", "action", json!("increase"));
    let store = Arc::new(store);

    let mut registry = TriggerRegistry::new();
    let rooms = vec!["S1".to_string(), "S2".to_string(), "S3".to_string()];
    register_rooms(&mut registry, &rooms, INTERVAL);
    let report = one_cycle(registry, store.clone()).await;

    let mut posts: Vec<(String, String)> = store
        .posts()
        .into_iter()
        .map(|(agent, cmd)| (agent.to_string(), cmd.to_string()))
        .collect();
    posts.sort();
    assert_eq!(
        posts,
        vec![
            ("temp_S1".to_string(), "temperature = 21".to_string()),
            ("temp_S2".to_string(), "temperature = 24".to_string()),
        ]
    );
    assert_eq!(report.workers.len(), 3);
    assert_eq!(report.workers[0].outcome, WorkerOutcome::Cancelled);
    assert_eq!(report.workers[1].outcome, WorkerOutcome::Cancelled);
    assert!(matches!(report.workers[2].outcome, WorkerOutcome::Failed(_)));
}

// ===========================================================================
// Over HTTP, against an in-process memory service
// ===========================================================================

#[derive(Clone, Default)]
struct Service {
    memories: Arc<Mutex<HashMap<String, Value>>>,
    inputs: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn get_memory(
    State(service): State<Service>,
    Path(agent): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let memories = service.memories.lock().unwrap();
    memories
        .get(&agent)
        .map(|memory| Json(json!({"name": agent, "memory": memory, "pool": []})))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn post_memory(
    State(service): State<Service>,
    Path(agent): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    service.inputs.lock().unwrap().push((agent, body));
    StatusCode::OK
}

async fn spawn_service(service: Service) -> String {
    let app = Router::new()
        .route("/memory/:agent", get(get_memory).post(post_memory))
        .with_state(service);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn http_cycle(action: &str) -> Vec<(String, Value)> {
    let service = Service::default();
    {
        let mut memories = service.memories.lock().unwrap();
        memories.insert(
            "conv_S1".into(),
            json!({"bool": {}, "integer": {}, "float": {}, "text": {"action": action}, "time": {}}),
        );
        memories.insert(
            "temp_S1".into(),
            json!({"bool": {}, "integer": {"temperature": 20}, "float": {}, "text": {}, "time": {}}),
        );
    }
    let base = spawn_service(service.clone()).await;

    let memory = Arc::new(HttpMemoryClient::new(base));
    one_cycle(single_room(), memory).await;

    let inputs = service.inputs.lock().unwrap().clone();
    inputs
}

#[tokio::test]
async fn http_increase_posts_to_sensor() {
    let inputs = http_cycle("increase").await;
    assert_eq!(inputs, vec![("temp_S1".to_string(), json!({"actions": "temperature = 21"}))]);
}

#[tokio::test]
async fn http_decrease_posts_to_sensor() {
    let inputs = http_cycle("decrease").await;
    assert_eq!(inputs, vec![("temp_S1".to_string(), json!({"actions": "temperature = 19"}))]);
}

#[tokio::test]
async fn http_hold_posts_nothing() {
    let inputs = http_cycle("hold").await;
    assert!(inputs.is_empty());
}
