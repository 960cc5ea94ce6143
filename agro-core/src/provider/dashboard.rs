use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::{
    config::ProviderConfig,
    model::{
        AirQuality, DataDomain, ExtendedWeather, ForecastDay, HourlyEntry, MoistureReading,
        Trends, VegetationIndices, WeatherSnapshot, YieldPrediction,
    },
    normalize::{self, Envelope},
};

use super::{AgroDataProvider, ProviderId};

/// Client for the dashboard backend's REST endpoints.
#[derive(Debug, Clone)]
pub struct DashboardApiProvider {
    base_url: Url,
    api_key: Option<String>,
    http: Client,
}

impl DashboardApiProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid dashboard API base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Invalid dashboard API base URL: {base_url}"));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for dashboard API")?;

        Ok(Self { base_url, api_key, http })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| anyhow!("Dashboard provider has no base_url configured"))?;

        Self::new(base_url, config.api_key.clone(), Duration::from_secs(config.timeout_secs))
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Invalid dashboard API base URL: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        domain: DataDomain,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!(%url, %domain, "requesting dashboard API");

        let mut request = self.http.get(url).query(query);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to dashboard API ({domain})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read dashboard API {domain} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Dashboard API {} request failed with status {}: {}",
                domain,
                status,
                truncate_body(&body),
            ));
        }

        let envelope: Envelope<T> = Envelope::from_json(&body)
            .with_context(|| format!("Failed to parse dashboard API {domain} JSON"))?;

        Ok(envelope.into_data(domain)?)
    }
}

#[async_trait]
impl AgroDataProvider for DashboardApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Dashboard
    }

    async fn current_weather(&self, city: &str) -> Result<WeatherSnapshot> {
        let raw = self
            .get(DataDomain::CurrentWeather, &["api", "weather", "current", city], &[])
            .await?;
        Ok(normalize::weather(raw)?)
    }

    async fn forecast(&self, city: &str) -> Result<Vec<ForecastDay>> {
        let raw = self.get(DataDomain::Forecast, &["api", "weather", "forecast", city], &[]).await?;
        Ok(normalize::forecast(raw)?)
    }

    async fn hourly(&self, city: &str) -> Result<Vec<HourlyEntry>> {
        let raw = self.get(DataDomain::Hourly, &["api", "weather", "hourly", city], &[]).await?;
        Ok(normalize::hourly(raw)?)
    }

    async fn extended(&self, city: &str) -> Result<ExtendedWeather> {
        let raw = self.get(DataDomain::Extended, &["api", "weather", "extended", city], &[]).await?;
        Ok(normalize::extended(raw)?)
    }

    async fn air_quality(&self, city: &str) -> Result<AirQuality> {
        let raw = self
            .get(DataDomain::AirQuality, &["api", "weather", "air-quality", city], &[])
            .await?;
        Ok(normalize::air_quality(raw)?)
    }

    async fn soil_moisture(&self, city: &str) -> Result<MoistureReading> {
        let raw = self
            .get(DataDomain::SoilMoisture, &["api", "weather", "moisture"], &[("city", city)])
            .await?;
        Ok(normalize::moisture(raw)?)
    }

    async fn vegetation(&self, city: &str) -> Result<VegetationIndices> {
        let raw = self.get(DataDomain::Vegetation, &["api", "vegetation", city], &[]).await?;
        Ok(normalize::vegetation(raw)?)
    }

    async fn trends(&self, city: &str) -> Result<Trends> {
        let raw = self.get(DataDomain::Trends, &["api", "analytics", "trends", city], &[]).await?;
        Ok(normalize::trends(raw)?)
    }

    async fn yield_prediction(&self, city: &str) -> Result<YieldPrediction> {
        let raw = self.get(DataDomain::Yield, &["api", "analytics", "yield", city], &[]).await?;
        Ok(normalize::yield_prediction(raw)?)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base: &str) -> DashboardApiProvider {
        DashboardApiProvider::new(base, None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_encodes_city_and_keeps_base_path() {
        let p = provider("http://localhost:5000/");
        let url = p.endpoint(&["api", "weather", "current", "Біла Церква"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/weather/current/%D0%91%D1%96%D0%BB%D0%B0%20%D0%A6%D0%B5%D1%80%D0%BA%D0%B2%D0%B0"
        );

        let p = provider("https://agro.example.com/backend");
        let url = p.endpoint(&["api", "vegetation", "Kyiv"]).unwrap();
        assert_eq!(url.as_str(), "https://agro.example.com/backend/api/vegetation/Kyiv");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "ї".repeat(300);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
