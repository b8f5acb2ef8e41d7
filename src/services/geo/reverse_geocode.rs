use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;

use crate::models::visit::{Coordinates, GeoPlace};

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, coordinates: Coordinates) -> Result<GeoPlace>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReverseGeocodeResponse {
    city: Option<String>,
    locality: Option<String>,
    country_name: Option<String>,
}

impl From<ReverseGeocodeResponse> for GeoPlace {
    fn from(body: ReverseGeocodeResponse) -> Self {
        // Small towns come back with an empty city and only a locality
        let city = body
            .city
            .filter(|c| !c.trim().is_empty())
            .or(body.locality);

        GeoPlace {
            city,
            country: body.country_name,
        }
    }
}

/// Unauthenticated reverse geocoding keyed by `{lat}` / `{lng}` in the URL template
pub struct ExternalReverseGeocoder {
    client: reqwest::Client,
    url_template: String,
}

impl ExternalReverseGeocoder {
    pub fn new(client: reqwest::Client, url_template: &str) -> Self {
        Self {
            client,
            url_template: url_template.to_string(),
        }
    }

    fn url_for(&self, coordinates: Coordinates) -> String {
        self.url_template
            .replace("{lat}", &coordinates.lat.to_string())
            .replace("{lng}", &coordinates.lng.to_string())
    }
}

#[async_trait]
impl ReverseGeocoder for ExternalReverseGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> Result<GeoPlace> {
        let response = self
            .client
            .get(self.url_for(coordinates))
            .send()
            .await
            .context("Reverse geocode request failed")?;

        if !response.status().is_success() {
            bail!("Reverse geocode returned {}", response.status());
        }

        let body: ReverseGeocodeResponse = response
            .json()
            .await
            .context("Reverse geocode response was not valid JSON")?;
        Ok(body.into())
    }
}
