use crate::{
    Config,
    model::{
        AirQuality, ExtendedWeather, ForecastDay, HourlyEntry, MoistureReading, Trends,
        VegetationIndices, WeatherSnapshot, YieldPrediction,
    },
    provider::{dashboard::DashboardApiProvider, sample::SampleProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod dashboard;
pub mod sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Dashboard,
    Sample,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Dashboard => "dashboard",
            ProviderId::Sample => "sample",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Dashboard, ProviderId::Sample]
    }

    /// Whether the provider needs a `[providers.<id>]` section to work.
    pub fn needs_config(&self) -> bool {
        matches!(self, ProviderId::Dashboard)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "dashboard" => Ok(ProviderId::Dashboard),
            "sample" => Ok(ProviderId::Sample),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: dashboard, sample."
            )),
        }
    }
}

/// One fetch per data domain. Every method fails independently of the others.
#[async_trait]
pub trait AgroDataProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn current_weather(&self, city: &str) -> anyhow::Result<WeatherSnapshot>;

    async fn forecast(&self, city: &str) -> anyhow::Result<Vec<ForecastDay>>;

    async fn hourly(&self, city: &str) -> anyhow::Result<Vec<HourlyEntry>>;

    async fn extended(&self, city: &str) -> anyhow::Result<ExtendedWeather>;

    async fn air_quality(&self, city: &str) -> anyhow::Result<AirQuality>;

    async fn soil_moisture(&self, city: &str) -> anyhow::Result<MoistureReading>;

    async fn vegetation(&self, city: &str) -> anyhow::Result<VegetationIndices>;

    async fn trends(&self, city: &str) -> anyhow::Result<Trends>;

    async fn yield_prediction(&self, city: &str) -> anyhow::Result<YieldPrediction>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn AgroDataProvider>> {
    let boxed: Box<dyn AgroDataProvider> = match id {
        ProviderId::Dashboard => {
            let provider_config = config.provider_config(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "No configuration for provider '{id}'.\n\
                     Hint: run `agro configure {id}` and enter the API base URL."
                )
            })?;
            Box::new(DashboardApiProvider::from_config(provider_config)?)
        }
        ProviderId::Sample => Box::new(SampleProvider::new()),
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn AgroDataProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}
