use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;

use crate::models::visit::IpLocation;

/// IP geolocation lookup
#[async_trait]
pub trait IpLocator: Send + Sync {
    async fn locate(&self, ip: &str) -> Result<IpLocation>;
}

/// ipapi.co style response: `{"ip", "city", "country_name"}`, or `{"error": true, "reason"}`
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    ip: Option<String>,
    city: Option<String>,
    country_name: Option<String>,
}

pub struct ExternalIpLocator {
    client: reqwest::Client,
    url_template: String,
}

impl ExternalIpLocator {
    /// `url_template` uses `{ip}` as the placeholder, e.g. `https://ipapi.co/{ip}/json/`
    pub fn new(client: reqwest::Client, url_template: &str) -> Self {
        Self {
            client,
            url_template: url_template.to_string(),
        }
    }
}

#[async_trait]
impl IpLocator for ExternalIpLocator {
    async fn locate(&self, ip: &str) -> Result<IpLocation> {
        let url = self.url_template.replace("{ip}", ip);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("IP lookup request failed")?;

        if !response.status().is_success() {
            bail!("IP lookup returned {}", response.status());
        }

        let body: IpApiResponse = response
            .json()
            .await
            .context("IP lookup response was not valid JSON")?;
        parse_response(body)
    }
}

fn parse_response(body: IpApiResponse) -> Result<IpLocation> {
    if body.error {
        bail!(
            "IP lookup refused: {}",
            body.reason.unwrap_or_else(|| "no reason given".to_string())
        );
    }

    Ok(IpLocation {
        city: body.city,
        country: body.country_name,
        ip: body.ip,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_success_body() {
        let body: IpApiResponse = serde_json::from_str(
            r#"{"ip": "49.37.1.1", "city": "Trichy", "country_name": "India", "country": "IN"}"#,
        )
        .unwrap();

        let location = parse_response(body).unwrap();
        assert_eq!(location.city.as_deref(), Some("Trichy"));
        assert_eq!(location.country.as_deref(), Some("India"));
        assert_eq!(location.ip.as_deref(), Some("49.37.1.1"));
    }

    #[test]
    fn error_body_is_a_failure() {
        let raw = r#"{"ip": "127.0.0.1", "error": true, "reason": "Reserved IP Address"}"#;
        let body: IpApiResponse = serde_json::from_str(raw).unwrap();

        let err = parse_response(body).unwrap_err();
        assert!(err.to_string().contains("Reserved IP Address"));
    }
}
