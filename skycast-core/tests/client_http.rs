//! HTTP-level tests for the weather provider client, run against a mock
//! weather/geocoding server.

use skycast_core::{
    AcquisitionError, Config, Coordinates, SnapshotCache, UnitSystem, WeatherClient,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEOUL: Coordinates = Coordinates { latitude: 37.57, longitude: 126.98 };

fn client_for(server: &MockServer) -> WeatherClient {
    let mut config = Config::default();
    config.set_api_key("TEST_KEY".into());
    client_with_config(server, &config)
}

fn client_with_config(server: &MockServer, config: &Config) -> WeatherClient {
    WeatherClient::new(config, SnapshotCache::in_memory()).with_endpoints(
        &format!("{}/weather", server.uri()),
        &format!("{}/geo/direct", server.uri()),
    )
}

fn seoul_conditions() -> serde_json::Value {
    serde_json::json!({
        "name": "Seoul",
        "sys": { "country": "KR", "sunrise": 1_700_000_000, "sunset": 1_700_040_000 },
        "main": { "temp": 21.3, "feels_like": 20.8, "humidity": 48 },
        "wind": { "speed": 2.1 },
        "weather": [{ "description": "clear sky", "icon": "01d" }]
    })
}

#[tokio::test]
async fn coordinate_fetch_maps_upstream_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "37.57"))
        .and(query_param("lon", "126.98"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seoul_conditions()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let snapshot = client.fetch_by_coordinates(SEOUL, UnitSystem::Metric).await.unwrap();

    assert_eq!(snapshot.location_name, "Seoul");
    assert_eq!(snapshot.country_code, "KR");
    assert_eq!(snapshot.temperature, 21.3);
    assert_eq!(snapshot.feels_like, 20.8);
    assert_eq!(snapshot.humidity, 48);
    assert_eq!(snapshot.wind_speed, 2.1);
    assert_eq!(snapshot.condition_description, "clear sky");
    assert_eq!(snapshot.condition_icon_id, "01d");
    assert_eq!(snapshot.sunrise_epoch, 1_700_000_000);
    assert_eq!(snapshot.sunset_epoch, 1_700_040_000);
    assert!(snapshot.fetched_at_epoch_ms > 0);
}

#[tokio::test]
async fn second_fetch_within_ttl_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seoul_conditions()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.fetch_by_coordinates(SEOUL, UnitSystem::Metric).await.unwrap();
    let second = client.fetch_by_coordinates(SEOUL, UnitSystem::Metric).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn unit_system_is_part_of_the_cache_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seoul_conditions()))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.fetch_by_coordinates(SEOUL, UnitSystem::Metric).await.unwrap();
    client.fetch_by_coordinates(SEOUL, UnitSystem::Imperial).await.unwrap();
}

#[tokio::test]
async fn missing_credential_fails_before_any_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seoul_conditions()))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with_config(&server, &Config::default());

    let by_coords = client.fetch_by_coordinates(SEOUL, UnitSystem::Metric).await.unwrap_err();
    assert_eq!(by_coords, AcquisitionError::InvalidCredentials);
    assert!(!by_coords.is_retryable());

    let by_city = client.fetch_by_city("Seoul", UnitSystem::Metric).await.unwrap_err();
    assert_eq!(by_city, AcquisitionError::InvalidCredentials);
}

#[tokio::test]
async fn provider_status_401_maps_to_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_by_coordinates(SEOUL, UnitSystem::Metric).await.unwrap_err();

    assert_eq!(err, AcquisitionError::InvalidCredentials);
    assert_eq!(err.code(), 401);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn provider_status_429_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_by_coordinates(SEOUL, UnitSystem::Metric).await.unwrap_err();

    assert_eq!(err, AcquisitionError::RateLimited);
    assert_eq!(err.code(), 429);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn provider_status_5xx_maps_to_server_fault() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_by_coordinates(SEOUL, UnitSystem::Metric).await.unwrap_err();

    assert_eq!(err, AcquisitionError::ServerFault(503));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn city_search_uses_geocoded_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .and(query_param("q", "Busan"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "lat": 35.18, "lon": 129.07, "name": "Busan" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "35.18"))
        .and(query_param("lon", "129.07"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seoul_conditions()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let snapshot = client.fetch_by_city("Busan", UnitSystem::Metric).await.unwrap();
    assert_eq!(snapshot.location_name, "Seoul");
}

#[tokio::test]
async fn bare_hangul_name_retries_geocoding_with_suffix_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .and(query_param("q", "서울"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .and(query_param("q", "서울시"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "lat": 37.57, "lon": 126.98, "name": "Seoul" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seoul_conditions()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let snapshot = client.fetch_by_city("서울", UnitSystem::Metric).await.unwrap();
    assert_eq!(snapshot.location_name, "Seoul");

    // Subsequent search for the same city is served from the city-keyed
    // cache entry: no further geocoding or weather calls (the mock
    // expectations above verify the counts on drop).
    let cached = client.fetch_by_city("서울", UnitSystem::Metric).await.unwrap();
    assert_eq!(cached, snapshot);
}

#[tokio::test]
async fn suffixed_hangul_name_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .and(query_param("q", "서울시"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seoul_conditions()))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_by_city("서울시", UnitSystem::Metric).await.unwrap_err();
    assert!(matches!(err, AcquisitionError::CityNotFound(_)));
}

#[tokio::test]
async fn unmatched_latin_name_fails_without_weather_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .and(query_param("q", "Nonexistentplace123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seoul_conditions()))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_by_city("Nonexistentplace123", UnitSystem::Metric).await.unwrap_err();

    assert_eq!(err, AcquisitionError::CityNotFound("Nonexistentplace123".to_string()));
    assert_eq!(err.code(), 404);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn city_search_does_not_populate_the_coordinate_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "lat": 37.57, "lon": 126.98, "name": "Seoul" }
        ])))
        .mount(&server)
        .await;
    // One call for the city search, one for the later coordinate fetch.
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seoul_conditions()))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.fetch_by_city("Seoul", UnitSystem::Metric).await.unwrap();
    client.fetch_by_coordinates(SEOUL, UnitSystem::Metric).await.unwrap();
}

#[tokio::test]
async fn geocoding_server_fault_is_translated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_by_city("Seoul", UnitSystem::Metric).await.unwrap_err();
    assert_eq!(err, AcquisitionError::ServerFault(500));
}

#[tokio::test]
async fn language_setting_reaches_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lang", "kr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seoul_conditions()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.set_api_key("TEST_KEY".into());
    config.language = "kr".to_string();

    let client = client_with_config(&server, &config);
    client.fetch_by_coordinates(SEOUL, UnitSystem::Metric).await.unwrap();
}
