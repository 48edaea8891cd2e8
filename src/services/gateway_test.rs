use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::Value;

use super::*;

// =============================================================================
// FAKE STORE
// =============================================================================

type Objects = Arc<Mutex<HashMap<String, Value>>>;

async fn list(State(objects): State<Objects>, Path(_tenant): Path<String>) -> Json<Vec<Value>> {
    let objects = objects.lock().unwrap();
    let mut items: Vec<Value> = objects
        .values()
        .map(|page| serde_json::json!({ "value": page }))
        .collect();
    items.sort_by_key(|item| item["value"]["key"].as_str().unwrap_or_default().to_owned());
    Json(items)
}

async fn read(State(objects): State<Objects>, Path((_tenant, key)): Path<(String, String)>) -> Result<Json<Value>, StatusCode> {
    let objects = objects.lock().unwrap();
    objects
        .get(&key)
        .map(|page| Json(serde_json::json!({ "value": page })))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create(
    State(objects): State<Objects>,
    Path((_tenant, key)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let mut objects = objects.lock().unwrap();
    if objects.contains_key(&key) {
        return Err(StatusCode::CONFLICT);
    }
    let mut page = body["value"].clone();
    page["name"] = Value::String(format!("{} (stored)", page["name"].as_str().unwrap_or_default()));
    objects.insert(key, page.clone());
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "value": page }))))
}

async fn update(
    State(objects): State<Objects>,
    Path((_tenant, key)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut objects = objects.lock().unwrap();
    if !objects.contains_key(&key) {
        return Err(StatusCode::NOT_FOUND);
    }
    let page = body["value"].clone();
    objects.insert(key, page.clone());
    Ok(Json(serde_json::json!({ "value": page })))
}

async fn remove(State(objects): State<Objects>, Path((_tenant, key)): Path<(String, String)>) -> StatusCode {
    let mut objects = objects.lock().unwrap();
    if objects.remove(&key).is_some() { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn fake_store() -> (Objects, HttpPageGateway) {
    let objects: Objects = Arc::new(Mutex::new(HashMap::new()));
    let app = Router::new()
        .route("/{tenant}/custom-objects", get(list))
        .route("/{tenant}/custom-objects/{key}", get(read).post(create).put(update).delete(remove))
        .with_state(objects.clone());
    let base = serve(app).await;
    let gateway = HttpPageGateway::new(&format!("{base}/"), "bu-1", Duration::from_secs(5), Duration::from_secs(5)).unwrap();
    (objects, gateway)
}

async fn failing_store() -> HttpPageGateway {
    let app = Router::new().fallback(|| async { StatusCode::INTERNAL_SERVER_ERROR });
    let base = serve(app).await;
    HttpPageGateway::new(&base, "bu-1", Duration::from_secs(5), Duration::from_secs(5)).unwrap()
}

// =============================================================================
// HAPPY PATH
// =============================================================================

#[tokio::test]
async fn base_url_includes_tenant() {
    let gateway = HttpPageGateway::new("http://store.test/api/", "acme", Duration::from_secs(1), Duration::from_secs(1)).unwrap();
    assert_eq!(gateway.base_url(), "http://store.test/api/acme");
    assert_eq!(gateway.object_url("page-1"), "http://store.test/api/acme/custom-objects/page-1");
}

#[tokio::test]
async fn create_fetch_update_delete_cycle() {
    let (objects, gateway) = fake_store().await;
    let page = Page::new_empty("Home", "/", "bu-1");

    let created = gateway.create_page(&page).await.unwrap();
    assert_eq!(created.key, page.key);
    assert_eq!(created.name, "Home (stored)");
    assert!(objects.lock().unwrap().contains_key(&page.key));

    let fetched = gateway.fetch_page(&page.key).await.unwrap();
    assert_eq!(fetched, created);

    let mut edited = fetched.clone();
    edited.route = "/home".into();
    let updated = gateway.update_page(&edited).await.unwrap();
    assert_eq!(updated.route, "/home");

    let all = gateway.fetch_pages().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], updated);

    gateway.delete_page(&page.key).await.unwrap();
    assert!(objects.lock().unwrap().is_empty());
    assert!(gateway.fetch_pages().await.unwrap().is_empty());
}

// =============================================================================
// FAILURES
// =============================================================================

#[tokio::test]
async fn missing_page_maps_to_fixed_message() {
    let (_objects, gateway) = fake_store().await;

    let err = gateway.fetch_page("page-x").await.unwrap_err();
    assert!(matches!(err, GatewayError::Status { status: 404, .. }));
    assert_eq!(err.to_string(), "Failed to fetch page with key: page-x");

    let err = gateway.delete_page("page-x").await.unwrap_err();
    assert_eq!(err.message(), "Failed to delete page with key: page-x");

    let page = Page::new_empty("Ghost", "/ghost", "bu-1");
    let err = gateway.update_page(&page).await.unwrap_err();
    assert_eq!(err.message(), format!("Failed to update page with key: {}", page.key));
}

#[tokio::test]
async fn duplicate_create_fails() {
    let (_objects, gateway) = fake_store().await;
    let page = Page::new_empty("Home", "/", "bu-1");
    gateway.create_page(&page).await.unwrap();
    let err = gateway.create_page(&page).await.unwrap_err();
    assert!(matches!(err, GatewayError::Status { status: 409, .. }));
    assert_eq!(err.message(), "Failed to create page");
}

#[tokio::test]
async fn server_error_maps_every_operation() {
    let gateway = failing_store().await;
    let page = Page::new_empty("Home", "/", "bu-1");

    assert_eq!(gateway.fetch_pages().await.unwrap_err().message(), "Failed to fetch pages");
    assert_eq!(gateway.create_page(&page).await.unwrap_err().message(), "Failed to create page");
    assert!(matches!(
        gateway.fetch_page("k").await.unwrap_err(),
        GatewayError::Status { status: 500, .. }
    ));
}

#[tokio::test]
async fn unreachable_store_is_transport_error() {
    // Bind and drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = HttpPageGateway::new(&format!("http://{addr}"), "bu-1", Duration::from_secs(2), Duration::from_secs(2)).unwrap();
    let err = gateway.fetch_pages().await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport { .. }));
    assert_eq!(err.message(), "Failed to fetch pages");
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let app = Router::new().route("/{tenant}/custom-objects", get(|| async { "not json" }));
    let base = serve(app).await;
    let gateway = HttpPageGateway::new(&base, "bu-1", Duration::from_secs(5), Duration::from_secs(5)).unwrap();
    let err = gateway.fetch_pages().await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode { .. }));
}
