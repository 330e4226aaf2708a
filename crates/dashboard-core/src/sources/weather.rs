//! WeatherAPI.com forecast client.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{DataSource, Field, Snapshot};
use crate::config::WeatherConfig;
use crate::error::FetchError;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";
const FORECAST_PATH: &str = "forecast.json";
const MAX_FORECAST_DAYS: u8 = 10;
const MAX_ERROR_BODY: usize = 200;

const US_STATES: &[(&str, &str)] = &[
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
    ("District of Columbia", "DC"),
];

// Wire format (only the fields we render).

#[derive(Debug, Deserialize)]
struct ApiResponse {
    location: ApiLocation,
    current: ApiCurrent,
    #[serde(default)]
    forecast: Option<ApiForecast>,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    name: String,
    #[serde(default)]
    region: Option<String>,
    country: String,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    temp_f: f64,
    condition: ApiCondition,
    #[serde(default)]
    humidity: Option<f64>,
    #[serde(default)]
    wind_kph: Option<f64>,
    last_updated: String,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiForecast {
    #[serde(default)]
    forecastday: Vec<ApiForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastDay {
    date: String,
    day: ApiDay,
}

#[derive(Debug, Deserialize)]
struct ApiDay {
    maxtemp_f: f64,
    mintemp_f: f64,
    condition: ApiCondition,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Display-ready weather for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub location: String,
    pub temperature_f: f64,
    pub condition: String,
    pub humidity: Option<f64>,
    pub wind_kph: Option<f64>,
    pub last_updated: String,
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub max_f: f64,
    pub min_f: f64,
    pub condition: String,
}

impl WeatherReport {
    pub fn to_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::new("Location", &self.location),
            Field::new("Temperature", format!("{:.1}°F", self.temperature_f)),
            Field::new("Condition", &self.condition),
        ];
        if let Some(humidity) = self.humidity {
            fields.push(Field::new("Humidity", format!("{humidity:.0}%")));
        }
        if let Some(wind) = self.wind_kph {
            fields.push(Field::new("Wind", format!("{wind:.1} kph")));
        }
        fields.push(Field::new("Updated", &self.last_updated));

        for day in &self.forecast {
            fields.push(Field::new(
                day.date.format("%a %m/%d").to_string(),
                format!("{:.0}°/{:.0}°  {}", day.max_f, day.min_f, day.condition),
            ));
        }
        fields
    }
}

impl From<ApiResponse> for WeatherReport {
    fn from(response: ApiResponse) -> Self {
        let forecast = response
            .forecast
            .map(|f| f.forecastday)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|day| {
                let date = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d").ok()?;
                Some(ForecastDay {
                    date,
                    max_f: day.day.maxtemp_f,
                    min_f: day.day.mintemp_f,
                    condition: day.day.condition.text,
                })
            })
            .collect();

        Self {
            location: display_location(
                &response.location.name,
                response.location.region.as_deref(),
                &response.location.country,
            ),
            temperature_f: response.current.temp_f,
            condition: response.current.condition.text,
            humidity: response.current.humidity,
            wind_kph: response.current.wind_kph,
            last_updated: response.current.last_updated,
            forecast,
        }
    }
}

/// US locations render as `City, ST`; elsewhere `City, Region, Country`
/// (or `City, Country` without a region).
pub fn display_location(name: &str, region: Option<&str>, country: &str) -> String {
    let region = region.map(str::trim).filter(|r| !r.is_empty());
    let is_us = ["United States of America", "USA", "US"]
        .iter()
        .any(|c| country.eq_ignore_ascii_case(c));

    match region {
        Some(region) if is_us => format!("{name}, {}", state_abbreviation(region)),
        Some(region) => format!("{name}, {region}, {country}"),
        None => format!("{name}, {country}"),
    }
}

fn state_abbreviation(state: &str) -> &str {
    US_STATES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(state))
        .map_or(state, |(_, abbr)| *abbr)
}

/// Forecast client for the weather panel.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: String,
    base_url: String,
    forecast_days: u8,
    http: reqwest::Client,
}

impl WeatherApiClient {
    /// # Errors
    /// Fails on an empty API key or an invalid base URL.
    pub fn new(api_key: &str, base_url: Option<&str>, forecast_days: u8) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            bail!("Weather API key cannot be empty");
        }
        let base_url = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        Url::parse(base_url).with_context(|| format!("Invalid weather base URL: {base_url}"))?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            forecast_days,
            http: reqwest::Client::new(),
        })
    }

    /// Builds a client from the `[weather]` section.
    ///
    /// Authentication resolution order:
    /// 1. `api_key` in config
    /// 2. `WEATHER_API_KEY` environment variable
    ///
    /// # Errors
    /// Fails when no key is configured or the base URL is invalid.
    pub fn from_config(config: &WeatherConfig) -> Result<Self> {
        let Some(api_key) = config.effective_api_key() else {
            bail!(
                "No weather API key configured. Set `api_key` under [weather] or the WEATHER_API_KEY environment variable."
            );
        };
        Self::new(&api_key, config.effective_base_url(), config.forecast_days)
    }

    /// Fetches current conditions plus the configured number of forecast days.
    ///
    /// # Errors
    /// `FetchError::InvalidTarget` for a blank location or a day count outside
    /// 1..=10 (no request is sent); otherwise transport, status and parse
    /// failures.
    pub async fn forecast(&self, location: &str) -> Result<WeatherReport, FetchError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(FetchError::InvalidTarget(
                "Location cannot be empty".to_string(),
            ));
        }
        if !(1..=MAX_FORECAST_DAYS).contains(&self.forecast_days) {
            return Err(FetchError::InvalidTarget(format!(
                "Forecast days must be between 1 and {MAX_FORECAST_DAYS}"
            )));
        }

        let url = self.forecast_url(location)?;
        debug!(location, days = self.forecast_days, "requesting forecast");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: error_message(&body),
            });
        }

        let parsed: ApiResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;
        Ok(parsed.into())
    }

    fn forecast_url(&self, location: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}/{FORECAST_PATH}", self.base_url))
            .map_err(|e| FetchError::Request(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("q", location)
            .append_pair("days", &self.forecast_days.to_string())
            .append_pair("aqi", "no");
        Ok(url)
    }
}

/// Extracts the API's error message, falling back to a truncated raw body.
fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        return envelope.error.message;
    }
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[async_trait]
impl DataSource for WeatherApiClient {
    async fn fetch_current(&self, target: Option<&str>) -> Result<Snapshot, FetchError> {
        let location = target.ok_or_else(|| {
            FetchError::InvalidTarget("No locations configured".to_string())
        })?;
        let report = self.forecast(location).await?;
        Ok(Snapshot::Fields(report.to_fields()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn forecast_body() -> serde_json::Value {
        json!({
            "location": {
                "name": "Austin",
                "region": "Texas",
                "country": "United States of America",
                "localtime": "2024-06-02 14:35"
            },
            "current": {
                "temp_c": 31.1,
                "temp_f": 88.0,
                "condition": { "text": "Partly cloudy", "icon": "//cdn/116.png" },
                "humidity": 48,
                "wind_kph": 14.4,
                "last_updated": "2024-06-02 14:30"
            },
            "forecast": {
                "forecastday": [
                    {
                        "date": "2024-06-03",
                        "day": {
                            "maxtemp_f": 95.4,
                            "mintemp_f": 74.6,
                            "condition": { "text": "Sunny" }
                        }
                    }
                ]
            }
        })
    }

    fn client(server: &MockServer, days: u8) -> WeatherApiClient {
        WeatherApiClient::new("test-key", Some(&server.uri()), days).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_maps_response_to_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .and(query_param("key", "test-key"))
            .and(query_param("q", "Austin TX"))
            .and(query_param("days", "3"))
            .and(query_param("aqi", "no"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(1)
            .mount(&server)
            .await;

        let snapshot = client(&server, 3)
            .fetch_current(Some("Austin TX"))
            .await
            .unwrap();

        let Snapshot::Fields(fields) = snapshot else {
            panic!("expected fields");
        };
        let lines: Vec<(String, String)> = fields
            .into_iter()
            .map(|f| (f.label, f.value))
            .collect();
        let expected = [
            ("Location", "Austin, TX"),
            ("Temperature", "88.0°F"),
            ("Condition", "Partly cloudy"),
            ("Humidity", "48%"),
            ("Wind", "14.4 kph"),
            ("Updated", "2024-06-02 14:30"),
            ("Mon 06/03", "95°/75°  Sunny"),
        ];
        assert_eq!(lines.len(), expected.len());
        for ((label, value), (want_label, want_value)) in lines.iter().zip(expected) {
            assert_eq!(label, want_label);
            assert_eq!(value, want_value);
        }
    }

    #[tokio::test]
    async fn test_api_error_message_becomes_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 1006, "message": "No matching location found." }
            })))
            .mount(&server)
            .await;

        let err = client(&server, 3).forecast("Atlantis").await.unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "No matching location found.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"location\": 1}"))
            .mount(&server)
            .await;

        let err = client(&server, 3).forecast("Paris").await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_invalid_targets_send_no_request() {
        let server = MockServer::start().await;

        let err = client(&server, 3).forecast("   ").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidTarget(_)));

        let err = client(&server, 0).forecast("Paris").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidTarget(_)));

        let err = client(&server, 11).forecast("Paris").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidTarget(_)));

        let err = client(&server, 3).fetch_current(None).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidTarget(_)));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_display_location_formats() {
        assert_eq!(
            display_location("Denver", Some("colorado"), "USA"),
            "Denver, CO"
        );
        assert_eq!(
            display_location("Springfield", Some("Ontario-ish"), "US"),
            "Springfield, Ontario-ish"
        );
        assert_eq!(
            display_location("Paris", Some("Ile-de-France"), "France"),
            "Paris, Ile-de-France, France"
        );
        assert_eq!(display_location("Monaco", Some(""), "Monaco"), "Monaco, Monaco");
        assert_eq!(display_location("Reykjavik", None, "Iceland"), "Reykjavik, Iceland");
    }

    #[test]
    fn test_new_rejects_empty_key_and_bad_url() {
        assert!(WeatherApiClient::new("  ", None, 3).is_err());
        assert!(WeatherApiClient::new("k", Some("not a url"), 3).is_err());
        assert!(WeatherApiClient::new("k", None, 3).is_ok());
    }

    #[test]
    fn test_error_message_truncates_raw_body() {
        let body = "x".repeat(500);
        let message = error_message(&body);
        assert_eq!(message.len(), MAX_ERROR_BODY + 3);
        assert!(message.ends_with("..."));
    }
}
