//! Provider adapter tests against a local mock server
//!
//! Tests cover:
//! - Open-Meteo place search as suggestions and geocoding
//! - Open-Meteo forecast as destination weather
//! - GraphHopper routing and its failure mapping

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ridecast::config::{PlacesConfig, RoutingConfig, WeatherConfig};
use ridecast::providers::{GraphHopperClient, OpenMeteoPlaces, OpenMeteoWeather};
use ridecast::{
    Coordinate, GeocodeError, GeocodeProvider, RouteError, RouteProvider, RouteSummary,
    Suggestion, SuggestionError, SuggestionProvider, WeatherError, WeatherProvider,
};

fn place(name: &str, lat: f64, lng: f64, admin1: &str, country: &str) -> serde_json::Value {
    json!({
        "name": name,
        "latitude": lat,
        "longitude": lng,
        "admin1": admin1,
        "country": country
    })
}

fn lagos_results() -> serde_json::Value {
    json!({
        "results": [
            place("Lagos", 6.45407, 3.39467, "Lagos", "Nigeria"),
            place("Lagos", 37.10186, -8.67422, "Faro", "Portugal"),
            place("Lagos", 6.45407, 3.39467, "Lagos", "Nigeria"),
            place("Lagos de Moreno", 21.35, -101.93, "Jalisco", "Mexico"),
        ],
        "generationtime_ms": 0.9
    })
}

mod places_tests {
    use super::*;

    fn places(server: &MockServer) -> OpenMeteoPlaces {
        OpenMeteoPlaces::new(PlacesConfig {
            base_url: server.uri(),
            max_retries: 0,
            ..PlacesConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn suggestions_are_labelled_and_deduplicated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("name", "Lagos"))
            .and(query_param("count", "5"))
            .and(query_param("language", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(lagos_results()))
            .expect(1)
            .mount(&server)
            .await;

        let suggestions = places(&server).suggest("Lagos").await.unwrap();
        assert_eq!(
            suggestions,
            vec![
                Suggestion::from("Lagos, Nigeria"),
                Suggestion::from("Lagos, Faro, Portugal"),
                Suggestion::from("Lagos de Moreno, Jalisco, Mexico"),
            ]
        );
    }

    #[tokio::test]
    async fn missing_results_is_no_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "generationtime_ms": 0.4 })),
            )
            .mount(&server)
            .await;

        let result = places(&server).suggest("Qqqqxz").await;
        assert_eq!(result, Err(SuggestionError::NoResults));
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = places(&server).suggest("Lagos").await;
        assert!(matches!(result, Err(SuggestionError::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn undecodable_body_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = places(&server).suggest("Lagos").await;
        assert!(matches!(result, Err(SuggestionError::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn geocode_matches_full_label() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("name", "Lagos"))
            .and(query_param("count", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(lagos_results()))
            .mount(&server)
            .await;

        let coordinate = places(&server)
            .geocode("Lagos, Faro, Portugal")
            .await
            .unwrap();
        assert_eq!(coordinate, Coordinate::new(37.10186, -8.67422).unwrap());
    }

    #[tokio::test]
    async fn geocode_bare_name_takes_first_hit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(lagos_results()))
            .mount(&server)
            .await;

        let coordinate = places(&server).geocode("Lagos").await.unwrap();
        assert_eq!(coordinate, Coordinate::new(6.45407, 3.39467).unwrap());
    }

    #[tokio::test]
    async fn geocode_unmatched_label_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("name", "Lagos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(lagos_results()))
            .mount(&server)
            .await;

        // Same name, different place: must not fall back to Lagos, Nigeria
        let result = places(&server).geocode("Lagos, Texas, United States").await;
        assert_eq!(
            result,
            Err(GeocodeError::AddressNotFound(
                "Lagos, Texas, United States".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn geocode_without_hits_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let result = places(&server).geocode("Atlantis, Ocean").await;
        assert_eq!(
            result,
            Err(GeocodeError::AddressNotFound("Atlantis, Ocean".to_string()))
        );
    }
}

mod routing_tests {
    use super::*;

    fn router(server: &MockServer) -> GraphHopperClient {
        GraphHopperClient::new(RoutingConfig {
            api_key: Some("test-key-123".to_string()),
            base_url: server.uri(),
            max_retries: 0,
            ..RoutingConfig::default()
        })
        .unwrap()
    }

    fn ends() -> (Coordinate, Coordinate) {
        (
            Coordinate::new(6.45, 3.39).unwrap(),
            Coordinate::new(6.6, 3.35).unwrap(),
        )
    }

    #[tokio::test]
    async fn route_converts_units() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/route"))
            .and(query_param("profile", "car"))
            .and(query_param("key", "test-key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "paths": [{ "distance": 12300.0, "time": 1080000 }],
                "info": { "took": 3 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (origin, destination) = ends();
        let summary = router(&server).route(origin, destination).await.unwrap();
        assert_eq!(summary, RouteSummary::new(12.3, 18.0));
    }

    #[tokio::test]
    async fn bad_request_is_no_route() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/route"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "message": "Cannot find point 1: 6.6,3.35"
            })))
            .mount(&server)
            .await;

        let (origin, destination) = ends();
        let result = router(&server).route(origin, destination).await;
        assert_eq!(result, Err(RouteError::NoRouteFound));
    }

    #[tokio::test]
    async fn empty_paths_is_no_route() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/route"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "paths": [] })))
            .mount(&server)
            .await;

        let (origin, destination) = ends();
        let result = router(&server).route(origin, destination).await;
        assert_eq!(result, Err(RouteError::NoRouteFound));
    }

    #[tokio::test]
    async fn rate_limit_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/route"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let (origin, destination) = ends();
        let result = router(&server).route(origin, destination).await;
        assert!(matches!(result, Err(RouteError::ProviderUnavailable(_))));
    }

    #[test]
    fn missing_key_is_config_error() {
        // Only meaningful when the environment fallback is not set
        if std::env::var("GRAPHHOPPER_API_KEY").is_ok() {
            return;
        }
        let result = GraphHopperClient::new(RoutingConfig::default());
        assert!(matches!(result, Err(ridecast::RideError::Config { .. })));
    }
}

mod weather_tests {
    use super::*;

    fn weather(server: &MockServer) -> OpenMeteoWeather {
        OpenMeteoWeather::new(WeatherConfig {
            base_url: server.uri(),
            max_retries: 0,
            ..WeatherConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn forecast_skips_today() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("timezone", "auto"))
            .and(query_param("forecast_days", "6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "latitude": 6.6,
                "longitude": 3.35,
                "current": {
                    "time": "2024-01-15T12:00",
                    "temperature_2m": 30.1,
                    "apparent_temperature": 34.2,
                    "relative_humidity_2m": 68,
                    "wind_speed_10m": 14.0,
                    "weather_code": 1
                },
                "daily": {
                    "time": [
                        "2024-01-15", "2024-01-16", "2024-01-17",
                        "2024-01-18", "2024-01-19", "2024-01-20"
                    ],
                    "weather_code": [1, 2, 3, 61, 95, 0],
                    "temperature_2m_max": [31.0, 31.5, 30.0, 29.0, 28.5, 32.0],
                    "temperature_2m_min": [24.0, 24.5, 24.0, 23.0, 23.5, 25.0]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let snapshot = weather(&server)
            .weather(Coordinate::new(6.6, 3.35).unwrap())
            .await
            .unwrap();

        assert_eq!(snapshot.current.description, "Mainly clear");
        assert_eq!(snapshot.current.humidity_pct, 68);
        assert_eq!(snapshot.forecast.len(), 5);
        assert_eq!(snapshot.forecast[0].description, "Partly cloudy");
        assert_eq!(snapshot.forecast[4].description, "Clear sky");
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = weather(&server)
            .weather(Coordinate::new(6.6, 3.35).unwrap())
            .await;
        assert!(matches!(result, Err(WeatherError::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn invalid_coordinate_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = weather(&server)
            .weather(Coordinate {
                lat: 6.6,
                lng: 200.0,
            })
            .await;
        assert_eq!(
            result,
            Err(WeatherError::InvalidCoordinate {
                lat: 6.6,
                lng: 200.0
            })
        );
    }
}
