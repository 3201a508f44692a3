//! Reverse geocoding: convert coordinates to a locality name.
//! Uses BigDataCloud's client endpoint - free, no API key required.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::model::{CURRENT_LOCATION_LABEL, Coordinates};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReverseGeocodeResponse {
    city: Option<String>,
    locality: Option<String>,
    principal_subdivision: Option<String>,
}

impl ReverseGeocodeResponse {
    /// Prefer city > locality > principal subdivision; blank strings don't count.
    fn best_name(self) -> Option<String> {
        [self.city, self.locality, self.principal_subdivision]
            .into_iter()
            .flatten()
            .map(|name| name.trim().to_string())
            .find(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ReverseGeocoder {
    url: String,
    lang: String,
    http: Client,
}

impl ReverseGeocoder {
    pub fn new(url: &str, lang: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { url: url.to_string(), lang: lang.to_string(), http })
    }

    /// Name the place at `coords`, or [`CURRENT_LOCATION_LABEL`] when the
    /// lookup fails for any reason.
    pub async fn locality_name(&self, coords: Coordinates) -> String {
        match self.lookup(coords).await {
            Some(name) => {
                tracing::debug!("Reverse geocoded ({coords}) to: {name}");
                name
            }
            None => CURRENT_LOCATION_LABEL.to_string(),
        }
    }

    async fn lookup(&self, coords: Coordinates) -> Option<String> {
        let response = match self
            .http
            .get(&self.url)
            .query(&[
                ("latitude", coords.lat.to_string()),
                ("longitude", coords.lon.to_string()),
                ("localityLanguage", self.lang.clone()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: ReverseGeocodeResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        body.best_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geocoder(server: &MockServer, lang: &str) -> ReverseGeocoder {
        ReverseGeocoder::new(&format!("{}/reverse", server.uri()), lang, Duration::from_secs(2))
            .expect("client builds")
    }

    fn parse(json: &str) -> ReverseGeocodeResponse {
        serde_json::from_str(json).expect("valid fixture")
    }

    #[test]
    fn prefers_city() {
        let body = parse(r#"{"city":"Lima","locality":"Miraflores","principalSubdivision":"Lima"}"#);
        assert_eq!(body.best_name().as_deref(), Some("Lima"));
    }

    #[test]
    fn skips_blank_city() {
        let body = parse(r#"{"city":"","locality":"Miraflores"}"#);
        assert_eq!(body.best_name().as_deref(), Some("Miraflores"));
    }

    #[test]
    fn falls_back_to_subdivision() {
        let body = parse(r#"{"principalSubdivision":"Cusco"}"#);
        assert_eq!(body.best_name().as_deref(), Some("Cusco"));
    }

    #[test]
    fn nothing_usable() {
        assert!(parse("{}").best_name().is_none());
    }

    #[tokio::test]
    async fn lookup_sends_coordinates_and_language() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("latitude", "-12.05"))
            .and(query_param("longitude", "-77.04"))
            .and(query_param("localityLanguage", "es"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "", "locality": "Miraflores"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let geocoder = geocoder(&server, "es");
        let name = geocoder.locality_name(Coordinates::new(-12.05, -77.04)).await;
        assert_eq!(name, "Miraflores");
    }

    #[tokio::test]
    async fn unparseable_body_yields_generic_label() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let name = geocoder(&server, "en").locality_name(Coordinates::new(0.0, 0.0)).await;
        assert_eq!(name, CURRENT_LOCATION_LABEL);
    }
}
