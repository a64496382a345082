//! Integration tests for the geo gate with Wiremock
//!
//! Runs the full router against a mock GeoIP lookup service.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use geo_gate::adapters::inbound::{build_router, GateResponseBody};
use geo_gate::adapters::outbound::HttpLocationResolver;
use geo_gate::{
    Coordinate, Geofence, GeoGateService, IpExtractor, IpSource, Policy, PolicyConfig,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_policy() -> PolicyConfig {
    PolicyConfig {
        countries: vec!["India".to_string(), "United States".to_string()],
        cities: vec!["Mumbai".to_string(), "New York".to_string()],
        coordinates: vec![Coordinate::new(35.6897, 139.6895)],
        geofences: vec![Geofence::new(51.5074, -0.1278, 50.0)],
        ..PolicyConfig::default()
    }
}

fn service(
    lookup_url: &str,
    timeout: Duration,
    policy: PolicyConfig,
    sources: Vec<IpSource>,
) -> Arc<GeoGateService> {
    let resolver = HttpLocationResolver::new(lookup_url, timeout).unwrap();
    Arc::new(GeoGateService::new(
        IpExtractor::new(sources),
        Arc::new(resolver),
        Arc::new(Policy::new(policy).unwrap()),
    ))
}

fn default_service(lookup_url: &str, policy: PolicyConfig) -> Arc<GeoGateService> {
    service(
        lookup_url,
        Duration::from_secs(2),
        policy,
        vec![IpSource::Header("ip".to_string())],
    )
}

async fn mount_location(server: &MockServer, ip: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/city/{}", ip)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn location(country: &str, city: &str, lat: f64, lon: f64) -> serde_json::Value {
    serde_json::json!({
        "country": country,
        "city": city,
        "lat": lat,
        "lon": lon,
        "regionName": "ignored"
    })
}

fn get_root(ip: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/");
    if let Some(ip) = ip {
        builder = builder.header("ip", ip);
    }
    builder.body(Body::empty()).unwrap()
}

async fn gate_body(response: Response) -> GateResponseBody {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Default policy end to end: India allowed, everything else rejected
#[tokio::test]
async fn test_default_policy_end_to_end() {
    let mock_server = MockServer::start().await;
    mount_location(
        &mock_server,
        "115.240.90.163",
        location("India", "Mumbai", 19.076, 72.8777),
    )
    .await;
    mount_location(
        &mock_server,
        "177.71.128.1",
        location("Brazil", "Sao Paulo", -23.5475, -46.6361),
    )
    .await;

    let app = build_router(default_service(&mock_server.uri(), PolicyConfig::default()));

    // Allowed
    let response = app.clone().oneshot(get_root(Some("115.240.90.163"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["message"],
        "Allowed request from IP: 115.240.90.163, Country: India, City: Mumbai"
    );

    // Denied
    let response = app.clone().oneshot(get_root(Some("177.71.128.1"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        gate_body(response).await,
        GateResponseBody {
            status_code: 403,
            message: "Access Denied".to_string()
        }
    );

    // No address
    let response = app.clone().oneshot(get_root(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(gate_body(response).await.message, "No IP address found");

    // Malformed addresses
    for bad in ["not_an_ip", "256.256.256.256", "1.2.3", "::1"] {
        let response = app.clone().oneshot(get_root(Some(bad))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "candidate {}", bad);
        assert_eq!(gate_body(response).await.message, "Invalid IP address");
    }
}

/// Invalid or missing addresses never reach the lookup service
#[tokio::test]
async fn test_rejected_addresses_skip_lookup() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = build_router(default_service(&mock_server.uri(), PolicyConfig::default()));

    for ip in [None, Some(""), Some("   "), Some("not_an_ip")] {
        let response = app.clone().oneshot(get_root(ip)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

/// An empty `ip` header counts as no address at all
#[tokio::test]
async fn test_empty_header_is_missing() {
    let mock_server = MockServer::start().await;
    let app = build_router(default_service(&mock_server.uri(), PolicyConfig::default()));

    let response = app.oneshot(get_root(Some(""))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(gate_body(response).await.message, "No IP address found");
}

/// Lookup service failure is a 500, not a denial
#[tokio::test]
async fn test_lookup_service_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/city/8.8.8.8"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = build_router(default_service(&mock_server.uri(), PolicyConfig::default()));
    let response = app.oneshot(get_root(Some("8.8.8.8"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        gate_body(response).await,
        GateResponseBody {
            status_code: 500,
            message: "Error occurred while reading the geoip database".to_string()
        }
    );
}

/// Lookup body without required fields is a 500
#[tokio::test]
async fn test_lookup_incomplete_body() {
    let mock_server = MockServer::start().await;
    mount_location(
        &mock_server,
        "8.8.8.8",
        serde_json::json!({"country": "United States", "city": "Mountain View"}),
    )
    .await;

    let app = build_router(default_service(&mock_server.uri(), sample_policy()));
    let response = app.oneshot(get_root(Some("8.8.8.8"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

/// Lookup that outlives the timeout is a 500
#[tokio::test]
async fn test_lookup_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/city/8.8.8.8"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(location("India", "Mumbai", 19.076, 72.8777))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let app = build_router(service(
        &mock_server.uri(),
        Duration::from_millis(200),
        PolicyConfig::default(),
        vec![IpSource::Header("ip".to_string())],
    ));
    let response = app.oneshot(get_root(Some("8.8.8.8"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

/// Sample policy: each category on its own is enough to allow
#[tokio::test]
async fn test_sample_policy_categories() {
    let mock_server = MockServer::start().await;
    // Country
    mount_location(&mock_server, "8.8.8.8", location("United States", "Mountain View", 37.386, -122.0838)).await;
    // City, country not listed
    mount_location(&mock_server, "1.1.1.1", location("Nowhere", "Mumbai", 0.0, 0.0)).await;
    // Exact coordinate
    mount_location(&mock_server, "133.242.0.1", location("Japan", "Tokyo", 35.6897, 139.6895)).await;
    // Inside the London geofence (~11 km from center)
    mount_location(&mock_server, "81.2.69.142", location("United Kingdom", "Harrow", 51.58, -0.2346)).await;
    // Outside the geofence (~59 km)
    mount_location(&mock_server, "81.2.69.160", location("United Kingdom", "Reading", 51.4543, -0.9781))
        .await;
    // Nothing matches
    mount_location(&mock_server, "90.0.0.1", location("France", "Paris", 48.8566, 2.3522)).await;
    // Near but not exactly the Tokyo coordinate
    mount_location(&mock_server, "133.242.0.2", location("Japan", "Tokyo", 35.6898, 139.6895)).await;

    let app = build_router(default_service(&mock_server.uri(), sample_policy()));

    let cases = [
        ("8.8.8.8", StatusCode::OK),
        ("1.1.1.1", StatusCode::OK),
        ("133.242.0.1", StatusCode::OK),
        ("81.2.69.142", StatusCode::OK),
        ("81.2.69.160", StatusCode::FORBIDDEN),
        ("90.0.0.1", StatusCode::FORBIDDEN),
        ("133.242.0.2", StatusCode::FORBIDDEN),
    ];

    for (ip, expected) in cases {
        let response = app.clone().oneshot(get_root(Some(ip))).await.unwrap();
        assert_eq!(response.status(), expected, "ip {}", ip);
    }
}

/// Custom deny status and message are returned verbatim
#[tokio::test]
async fn test_custom_denied_response() {
    let mock_server = MockServer::start().await;
    mount_location(&mock_server, "90.0.0.1", location("France", "Paris", 48.8566, 2.3522)).await;

    let policy = PolicyConfig {
        access_denied_message: "Unavailable in your region".to_string(),
        access_denied_status_code: 451,
        ..PolicyConfig::default()
    };
    let app = build_router(default_service(&mock_server.uri(), policy));
    let response = app.oneshot(get_root(Some("90.0.0.1"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS);
    assert_eq!(
        gate_body(response).await,
        GateResponseBody {
            status_code: 451,
            message: "Unavailable in your region".to_string()
        }
    );
}

/// Full-form IPv6 addresses are looked up as given
#[tokio::test]
async fn test_ipv6_lookup() {
    let ip = "2001:0db8:0000:0000:0000:0000:0000:0001";
    let mock_server = MockServer::start().await;
    mount_location(&mock_server, ip, location("India", "Delhi", 28.6139, 77.209)).await;

    let app = build_router(default_service(&mock_server.uri(), PolicyConfig::default()));
    let response = app.oneshot(get_root(Some(ip))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

/// X-Forwarded-For fallback when the dedicated header is absent
#[tokio::test]
async fn test_forwarded_for_fallback() {
    let mock_server = MockServer::start().await;
    mount_location(&mock_server, "115.240.90.163", location("India", "Mumbai", 19.076, 72.8777))
        .await;

    let app = build_router(service(
        &mock_server.uri(),
        Duration::from_secs(2),
        PolicyConfig::default(),
        vec![IpSource::Header("ip".to_string()), IpSource::ForwardedFor],
    ));

    let request = Request::builder()
        .uri("/")
        .header("x-forwarded-for", "115.240.90.163, 10.0.0.1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

/// Abandoning a request mid-lookup leaves the gate usable
#[tokio::test]
async fn test_cancelled_request_during_lookup() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/city/8.8.8.8"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(location("India", "Mumbai", 19.076, 72.8777))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;
    mount_location(&mock_server, "115.240.90.163", location("India", "Mumbai", 19.076, 72.8777))
        .await;

    let app = build_router(default_service(&mock_server.uri(), PolicyConfig::default()));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(100),
        app.clone().oneshot(get_root(Some("8.8.8.8"))),
    )
    .await;
    assert!(abandoned.is_err());

    let response = app.oneshot(get_root(Some("115.240.90.163"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// Concurrent requests get independent decisions
#[tokio::test]
async fn test_concurrent_requests() {
    let mock_server = MockServer::start().await;
    mount_location(&mock_server, "115.240.90.163", location("India", "Mumbai", 19.076, 72.8777))
        .await;
    mount_location(&mock_server, "177.71.128.1", location("Brazil", "Sao Paulo", -23.5475, -46.6361))
        .await;

    let app = build_router(default_service(&mock_server.uri(), PolicyConfig::default()));

    let requests = (0..32).map(|i| {
        let app = app.clone();
        let ip = if i % 2 == 0 { "115.240.90.163" } else { "177.71.128.1" };
        async move { (ip, app.oneshot(get_root(Some(ip))).await.unwrap().status()) }
    });

    for (ip, status) in futures::future::join_all(requests).await {
        let expected = if ip == "115.240.90.163" {
            StatusCode::OK
        } else {
            StatusCode::FORBIDDEN
        };
        assert_eq!(status, expected);
    }
}

/// The health route is reachable without any address
#[tokio::test]
async fn test_health_is_not_gated() {
    let mock_server = MockServer::start().await;
    let app = build_router(default_service(&mock_server.uri(), PolicyConfig::default()));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}
