use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// Resources keyed by `"{namespace}/{collection}"`, then by `_id`.
pub type Db = Arc<RwLock<HashMap<String, BTreeMap<String, Value>>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/_service/info", get(info))
        .route("/_status/{code}", get(status).post(status))
        .route(
            "/{version}/ns/{namespace}/{collection}",
            get(list_resources).post(create_resource),
        )
        .route(
            "/{version}/ns/{namespace}/{collection}/{id}",
            get(get_resource)
                .put(replace_resource)
                .patch(update_resource)
                .delete(delete_resource)
                .post(run_action),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn bucket(namespace: &str, collection: &str) -> String {
    format!("{namespace}/{collection}")
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn parse_body(body: &str) -> Result<Value, Response> {
    if body.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(body).map_err(|e| error(StatusCode::BAD_REQUEST, &e.to_string()))
}

async fn info() -> Json<Value> {
    Json(json!({ "name": "mock-server", "version": env!("CARGO_PKG_VERSION") }))
}

/// Answer with the requested status. 204 and 304 carry no body; other 3xx
/// point `location` at the service info.
async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED => {
            status.into_response()
        }
        Ok(status) if status.is_redirection() => (
            status,
            [(header::LOCATION, "/_service/info")],
            format!("status {code}"),
        )
            .into_response(),
        Ok(status) => (status, format!("status {code}")).into_response(),
        Err(_) => error(StatusCode::BAD_REQUEST, "invalid status code"),
    }
}

async fn list_resources(
    State(db): State<Db>,
    Path((_version, namespace, collection)): Path<(String, String, String)>,
) -> Json<Vec<Value>> {
    let db = db.read().await;
    let items = db
        .get(&bucket(&namespace, &collection))
        .map(|items| items.values().cloned().collect())
        .unwrap_or_default();
    Json(items)
}

async fn create_resource(
    State(db): State<Db>,
    Path((_version, namespace, collection)): Path<(String, String, String)>,
    body: String,
) -> Response {
    let mut resource = match parse_body(&body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return error(StatusCode::BAD_REQUEST, "body must be a JSON object"),
        Err(resp) => return resp,
    };
    let id = match resource.get("_id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => Uuid::new_v4().to_string(),
    };
    resource.insert("_id".to_string(), Value::String(id.clone()));

    let mut db = db.write().await;
    let items = db.entry(bucket(&namespace, &collection)).or_default();
    if items.contains_key(&id) {
        return error(StatusCode::CONFLICT, "resource already exists");
    }
    debug!(%namespace, %collection, %id, "created resource");
    let resource = Value::Object(resource);
    items.insert(id, resource.clone());
    (StatusCode::CREATED, Json(resource)).into_response()
}

async fn get_resource(
    State(db): State<Db>,
    Path((_version, namespace, collection, id)): Path<(String, String, String, String)>,
) -> Response {
    let db = db.read().await;
    match db.get(&bucket(&namespace, &collection)).and_then(|items| items.get(&id)) {
        Some(resource) => Json(resource.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "resource not found"),
    }
}

async fn replace_resource(
    State(db): State<Db>,
    Path((_version, namespace, collection, id)): Path<(String, String, String, String)>,
    body: String,
) -> Response {
    let mut resource = match parse_body(&body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return error(StatusCode::BAD_REQUEST, "body must be a JSON object"),
        Err(resp) => return resp,
    };
    resource.insert("_id".to_string(), Value::String(id.clone()));

    let mut db = db.write().await;
    match db.get_mut(&bucket(&namespace, &collection)).and_then(|items| items.get_mut(&id)) {
        Some(existing) => {
            *existing = Value::Object(resource);
            Json(existing.clone()).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "resource not found"),
    }
}

async fn update_resource(
    State(db): State<Db>,
    Path((_version, namespace, collection, id)): Path<(String, String, String, String)>,
    body: String,
) -> Response {
    let patch = match parse_body(&body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return error(StatusCode::BAD_REQUEST, "body must be a JSON object"),
        Err(resp) => return resp,
    };

    let mut db = db.write().await;
    let Some(existing) = db
        .get_mut(&bucket(&namespace, &collection))
        .and_then(|items| items.get_mut(&id))
    else {
        return error(StatusCode::NOT_FOUND, "resource not found");
    };
    if let Value::Object(fields) = &mut *existing {
        for (key, value) in patch {
            if key != "_id" {
                fields.insert(key, value);
            }
        }
    }
    Json(existing.clone()).into_response()
}

async fn delete_resource(
    State(db): State<Db>,
    Path((_version, namespace, collection, id)): Path<(String, String, String, String)>,
) -> Response {
    let mut db = db.write().await;
    match db.get_mut(&bucket(&namespace, &collection)).and_then(|items| items.remove(&id)) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error(StatusCode::NOT_FOUND, "resource not found"),
    }
}

/// `POST .../{collection}/{name}:{action}` on an existing resource.
async fn run_action(
    State(db): State<Db>,
    Path((_version, namespace, collection, target)): Path<(String, String, String, String)>,
    body: String,
) -> Response {
    let Some((name, action)) = target.split_once(':') else {
        return error(StatusCode::METHOD_NOT_ALLOWED, "POST needs a name:action target");
    };
    let request = match parse_body(&body) {
        Ok(request) => request,
        Err(resp) => return resp,
    };

    let db = db.read().await;
    if !db
        .get(&bucket(&namespace, &collection))
        .is_some_and(|items| items.contains_key(name))
    {
        return error(StatusCode::NOT_FOUND, "resource not found");
    }
    debug!(%namespace, %collection, name, action, "ran action");
    (
        StatusCode::ACCEPTED,
        Json(json!({ "_id": name, "action": action, "request": request })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_parses_as_empty_object() {
        assert_eq!(parse_body("").unwrap(), json!({}));
        assert_eq!(parse_body("  \n").unwrap(), json!({}));
    }

    #[test]
    fn malformed_body_is_rejected() {
        let resp = parse_body("{not json").unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn buckets_are_namespace_scoped() {
        assert_eq!(bucket("user.a", "alarms"), "user.a/alarms");
        assert_ne!(bucket("user.a", "alarms"), bucket("user.b", "alarms"));
    }
}
