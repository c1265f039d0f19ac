//! HTTP front end - routes every request to the geolocation handler
//!
//! Method and path are ignored: only the query string, the headers and the
//! caller's address reach the handler.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::HeaderName, HeaderMap, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::AppState;

/// Create the router that sends every request to the handler
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", any(handle_request))
        .route("/{*path}", any(handle_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_request(State(state): State<Arc<AppState>>, request: Request<Body>) -> Response {
    let sdk_request = to_sdk_request(&request);
    let sdk_response = state.handler.handle(sdk_request).await;
    into_http_response(sdk_response)
}

/// Build the SDK request from the parts the handler needs.
fn to_sdk_request(request: &Request<Body>) -> geoip_edge_sdk::Request {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    geoip_edge_sdk::Request {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: parse_query(request.uri().query()),
        headers: collect_headers(request.headers()),
        client_ip,
        request_id: Uuid::new_v4().to_string(),
    }
}

/// Flatten headers, combining repeated fields into one `", "`-joined value.
fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut out: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        out.entry(name.to_string())
            .and_modify(|combined| {
                combined.push_str(", ");
                combined.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    out
}

/// Parse a query string; the first occurrence of a repeated key wins.
fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(q) = query {
        for (k, v) in url::form_urlencoded::parse(q.as_bytes()) {
            params.entry(k.into_owned()).or_insert_with(|| v.into_owned());
        }
    }
    params
}

fn into_http_response(sdk_response: geoip_edge_sdk::Response) -> Response {
    let status = StatusCode::from_u16(sdk_response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, sdk_response.body.unwrap_or_default()).into_response();

    // Strip the default text/plain content type; the SDK response decides.
    let headers = response.headers_mut();
    headers.remove(axum::http::header::CONTENT_TYPE);
    for (key, value) in sdk_response.headers {
        match (HeaderName::try_from(key.as_str()), HeaderValue::try_from(value.as_str())) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!("Dropping invalid response header {:?}", key),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthStore, ConfigStore};
    use crate::geo::{GeoRecord, StaticProvider};
    use crate::handler::{GeoHandler, HandlerOptions};
    use axum::http::header::CONTENT_TYPE;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn provider() -> Arc<StaticProvider> {
        let record = |city: &str, region: &str| GeoRecord {
            city: Some(city.into()),
            continent: "NA".into(),
            country_code: "US".into(),
            country_code3: "USA".into(),
            country_name: "United States".into(),
            region: Some(region.into()),
        };
        Arc::new(
            StaticProvider::from_entries([
                ("8.8.8.8", record("Mountain View", "CA")),
                ("198.51.100.20", record("Seattle", "WA")),
            ])
            .unwrap(),
        )
    }

    fn app(options: HandlerOptions) -> Router {
        let store: Arc<dyn AuthStore> =
            Arc::new(ConfigStore::new("geoip_auth").with_entry("good", "true"));
        let handler = GeoHandler::build(options, provider(), Some(store)).unwrap();
        create_router(Arc::new(AppState {
            handler,
        }))
    }

    fn get(uri: &str) -> Request<Body> {
        let mut request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([198, 51, 100, 20], 51000))));
        request
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_parse_query_first_wins() {
        let params = parse_query(Some("ip=1.1.1.1&ip=2.2.2.2&x=%20y"));
        assert_eq!(params.get("ip").map(String::as_str), Some("1.1.1.1"));
        assert_eq!(params.get("x").map(String::as_str), Some(" y"));
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn test_to_sdk_request() {
        let mut request = get("/any/path?ip=8.8.8.8");
        request
            .headers_mut()
            .insert("X-Secret", HeaderValue::from_static("good"));

        let sdk = to_sdk_request(&request);
        assert_eq!(sdk.path, "/any/path");
        assert_eq!(sdk.non_empty_query_param("ip"), Some("8.8.8.8"));
        assert_eq!(sdk.header("X-Secret").map(String::as_str), Some("good"));
        assert_eq!(sdk.client_ip.as_deref(), Some("198.51.100.20"));
        assert!(!sdk.request_id.is_empty());
    }

    #[test]
    fn test_repeated_headers_are_combined() {
        let mut request = get("/");
        let headers = request.headers_mut();
        headers.append("X-Secret", HeaderValue::from_static("bad"));
        headers.append("X-Secret", HeaderValue::from_static("good"));
        headers.insert("X-Other", HeaderValue::from_bytes(b"caf\xc3\xa9").unwrap());

        let sdk = to_sdk_request(&request);
        assert_eq!(sdk.header("X-Secret").map(String::as_str), Some("bad, good"));
        assert_eq!(sdk.header("X-Other").map(String::as_str), Some("café"));
    }

    #[tokio::test]
    async fn test_open_lookup_by_query() {
        let response = app(HandlerOptions::open()).oneshot(get("/?ip=8.8.8.8")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["geo"]["city"], "Mountain View");
        assert_eq!(body["geo"]["region"], Value::Null);
    }

    #[tokio::test]
    async fn test_falls_back_to_peer_address() {
        let response = app(HandlerOptions::open()).oneshot(get("/lookup?ip=")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["geo"]["city"], "Seattle");
    }

    #[tokio::test]
    async fn test_authenticated_rejects_bad_secret() {
        let mut request = get("/?ip=8.8.8.8");
        request
            .headers_mut()
            .insert("X-Secret", HeaderValue::from_static("bad"));

        let response = app(HandlerOptions::authenticated()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body, json!({"Error": "Unauthorized"}));
    }

    #[tokio::test]
    async fn test_authenticated_rejects_repeated_secret() {
        let mut request = get("/?ip=8.8.8.8");
        let headers = request.headers_mut();
        headers.append("X-Secret", HeaderValue::from_static("bad"));
        headers.append("X-Secret", HeaderValue::from_static("good"));

        let response = app(HandlerOptions::authenticated()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body, json!({"Error": "Unauthorized"}));
    }

    #[tokio::test]
    async fn test_authenticated_passes_region() {
        let mut request = get("/?ip=8.8.8.8");
        request
            .headers_mut()
            .insert("X-Secret", HeaderValue::from_static("good"));

        let response = app(HandlerOptions::authenticated()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["geo"]["region"], "CA");
    }

    #[tokio::test]
    async fn test_unknown_address_is_plain_500() {
        let response = app(HandlerOptions::open())
            .oneshot(get("/?ip=192.0.2.55"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(body_string(response).await, "Internal Server Error");
    }

    #[tokio::test]
    async fn test_any_method_is_handled() {
        let mut request = Request::builder()
            .method("POST")
            .uri("/deep/nested/path?ip=8.8.8.8")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        let response = app(HandlerOptions::open()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
