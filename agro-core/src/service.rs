use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    Config,
    alerts::{self, AlertInputs},
    calendar,
    classify::{self, Classification, MetricKind},
    model::{Alert, CalendarOperation, DashboardSnapshot, DataDomain, RiskLevel, VegetationHealth},
    provider::{self, AgroDataProvider, ProviderId, sample::SampleProvider},
    recommend::{self, RecommendationContext, Recommendations},
};

#[derive(Debug)]
pub struct DashboardService {
    primary: Box<dyn AgroDataProvider>,
    fallback: Option<Box<dyn AgroDataProvider>>,
}

impl DashboardService {
    pub fn new(primary: Box<dyn AgroDataProvider>) -> Self {
        Self { primary, fallback: None }
    }

    pub fn with_fallback(mut self, fallback: Box<dyn AgroDataProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Builds the service for `id`, or for the configured default provider.
    pub fn from_config(config: &Config, id: Option<ProviderId>) -> anyhow::Result<Self> {
        let id = match id {
            Some(id) => id,
            None => config.default_provider_id()?,
        };
        let service = Self::new(provider::provider_from_config(id, config)?);

        if config.fallback_to_sample && id != ProviderId::Sample {
            Ok(service.with_fallback(Box::new(SampleProvider::new())))
        } else {
            Ok(service)
        }
    }

    pub fn provider_id(&self) -> ProviderId {
        self.primary.id()
    }

    /// Fetches every domain for `city` concurrently. A failed domain is logged
    /// and, if a fallback is set, retried there once; otherwise its slot stays
    /// empty.
    pub async fn fetch(&self, city: &str) -> DashboardSnapshot {
        let (
            weather,
            forecast,
            hourly,
            extended,
            air_quality,
            moisture,
            vegetation,
            trends,
            yield_prediction,
        ) = tokio::join!(
            self.fetch_domain(city, DataDomain::CurrentWeather, |p| p.current_weather(city)),
            self.fetch_domain(city, DataDomain::Forecast, |p| p.forecast(city)),
            self.fetch_domain(city, DataDomain::Hourly, |p| p.hourly(city)),
            self.fetch_domain(city, DataDomain::Extended, |p| p.extended(city)),
            self.fetch_domain(city, DataDomain::AirQuality, |p| p.air_quality(city)),
            self.fetch_domain(city, DataDomain::SoilMoisture, |p| p.soil_moisture(city)),
            self.fetch_domain(city, DataDomain::Vegetation, |p| p.vegetation(city)),
            self.fetch_domain(city, DataDomain::Trends, |p| p.trends(city)),
            self.fetch_domain(city, DataDomain::Yield, |p| p.yield_prediction(city)),
        );

        let snapshot = DashboardSnapshot {
            city: city.to_string(),
            fetched_at: Utc::now(),
            weather,
            forecast,
            hourly,
            extended,
            air_quality,
            moisture,
            vegetation,
            trends,
            yield_prediction,
        };

        let missing = snapshot.missing_domains();
        if !missing.is_empty() {
            info!(city, ?missing, "dashboard snapshot is incomplete");
        }
        snapshot
    }

    async fn fetch_domain<'a, T, F, Fut>(
        &'a self,
        city: &str,
        domain: DataDomain,
        fetch: F,
    ) -> Option<T>
    where
        F: Fn(&'a dyn AgroDataProvider) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let err = match fetch(self.primary.as_ref()).await {
            Ok(value) => return Some(value),
            Err(err) => err,
        };
        let reason = format!("{err:#}");
        warn!(city, %domain, provider = %self.primary.id(), error = %reason, "fetch failed");

        let fallback = self.fallback.as_deref()?;
        match fetch(fallback).await {
            Ok(value) => {
                info!(city, %domain, provider = %fallback.id(), "using fallback data");
                Some(value)
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(
                    city,
                    %domain,
                    provider = %fallback.id(),
                    error = %reason,
                    "fallback fetch failed"
                );
                None
            }
        }
    }
}

/// Everything derived from one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub snapshot: DashboardSnapshot,
    pub moisture_status: Classification,
    pub vegetation_status: Classification,
    pub vegetation_health: Option<VegetationHealth>,
    pub air_quality_status: Classification,
    pub recommendations: Recommendations,
    pub alerts: Vec<Alert>,
    pub calendar: Vec<CalendarOperation>,
}

/// Runs the classifier, recommendation rules, alert rules and calendar over
/// `snapshot`. Pure apart from logging.
pub fn analyze(snapshot: DashboardSnapshot, today: NaiveDate, now: DateTime<Utc>) -> DashboardReport {
    let moisture_value = snapshot.moisture.as_ref().map(|m| m.current_moisture);

    if let Some((reading, server)) =
        snapshot.moisture.as_ref().and_then(|m| m.risk_level.map(|level| (m, level)))
    {
        let client = RiskLevel::from_moisture(reading.current_moisture);
        if client != server {
            debug!(
                city = %snapshot.city,
                %server,
                %client,
                moisture = reading.current_moisture,
                "server risk level disagrees with client classification"
            );
        }
    }

    let ctx = RecommendationContext::from_snapshot(&snapshot);
    let recommendations = recommend::generate(&ctx);
    let calendar = calendar::build(&ctx, today);
    let vegetation_health = ctx.vegetation_health();
    let alerts = alerts::aggregate(&AlertInputs::from_snapshot(&snapshot), now);

    DashboardReport {
        moisture_status: classify::classify(MetricKind::SoilMoisture, moisture_value),
        vegetation_status: classify::classify(
            MetricKind::Ndvi,
            snapshot.vegetation.as_ref().map(|v| v.ndvi),
        ),
        vegetation_health,
        air_quality_status: classify::classify(
            MetricKind::AirQualityIndex,
            snapshot.air_quality.as_ref().map(|a| a.index),
        ),
        recommendations,
        alerts,
        calendar,
        snapshot,
    }
}

/// Identifies one refresh started through [`DashboardSession::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    id: u64,
    city: String,
}

/// Holds the snapshot currently on display. Only the most recently started
/// request may replace it; responses to superseded requests are dropped.
#[derive(Debug, Default)]
pub struct DashboardSession {
    latest: AtomicU64,
    current: RwLock<Option<DashboardSnapshot>>,
}

impl DashboardSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, city: &str) -> RequestTicket {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RequestTicket { id, city: city.to_string() }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.id
    }

    /// Stores `snapshot` if `ticket` is still the newest request.
    pub async fn commit(&self, ticket: &RequestTicket, snapshot: DashboardSnapshot) -> bool {
        let mut current = self.current.write().await;
        if !self.is_current(ticket) {
            warn!(city = %ticket.city, request = ticket.id, "dropping response for superseded request");
            return false;
        }
        *current = Some(snapshot);
        true
    }

    pub async fn current(&self) -> Option<DashboardSnapshot> {
        self.current.read().await.clone()
    }

    /// Fetches `city` and commits the result. Returns `None` when a newer
    /// refresh started while this one was in flight.
    pub async fn refresh(&self, service: &DashboardService, city: &str) -> Option<DashboardSnapshot> {
        let ticket = self.begin(city);
        let snapshot = service.fetch(city).await;
        if self.commit(&ticket, snapshot.clone()).await {
            Some(snapshot)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AirQuality, ExtendedWeather, ForecastDay, HourlyEntry, MoistureReading, Trends,
        VegetationIndices, WeatherSnapshot, YieldPrediction,
    };
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Sample data, except that current weather for `held_city` waits until
    /// `release` is notified.
    #[derive(Debug)]
    struct HeldProvider {
        inner: SampleProvider,
        held_city: &'static str,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl AgroDataProvider for HeldProvider {
        fn id(&self) -> ProviderId {
            ProviderId::Sample
        }

        async fn current_weather(&self, city: &str) -> anyhow::Result<WeatherSnapshot> {
            if city == self.held_city {
                self.release.notified().await;
            }
            self.inner.current_weather(city).await
        }

        async fn forecast(&self, city: &str) -> anyhow::Result<Vec<ForecastDay>> {
            self.inner.forecast(city).await
        }

        async fn hourly(&self, city: &str) -> anyhow::Result<Vec<HourlyEntry>> {
            self.inner.hourly(city).await
        }

        async fn extended(&self, city: &str) -> anyhow::Result<ExtendedWeather> {
            self.inner.extended(city).await
        }

        async fn air_quality(&self, city: &str) -> anyhow::Result<AirQuality> {
            self.inner.air_quality(city).await
        }

        async fn soil_moisture(&self, city: &str) -> anyhow::Result<MoistureReading> {
            self.inner.soil_moisture(city).await
        }

        async fn vegetation(&self, city: &str) -> anyhow::Result<VegetationIndices> {
            self.inner.vegetation(city).await
        }

        async fn trends(&self, city: &str) -> anyhow::Result<Trends> {
            self.inner.trends(city).await
        }

        async fn yield_prediction(&self, city: &str) -> anyhow::Result<YieldPrediction> {
            self.inner.yield_prediction(city).await
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn sample_service() -> DashboardService {
        DashboardService::new(Box::new(SampleProvider::anchored_at(now())))
    }

    #[tokio::test]
    async fn sample_fetch_fills_every_domain() {
        let snapshot = sample_service().fetch("Kyiv").await;
        assert!(snapshot.missing_domains().is_empty());
        assert_eq!(snapshot.city, "Kyiv");
    }

    #[test]
    fn analyze_empty_snapshot_renders_placeholders() {
        let report = analyze(DashboardSnapshot::empty("Kyiv", now()), now().date_naive(), now());

        assert!(report.moisture_status.is_unknown());
        assert!(report.vegetation_status.is_unknown());
        assert!(report.air_quality_status.is_unknown());
        assert!(report.alerts.is_empty());
        assert_eq!(report.recommendations.notes.len(), 1);
        assert_eq!(report.calendar.len(), 1);
    }

    #[test]
    fn analyze_classifies_from_current_moisture() {
        let mut snapshot = DashboardSnapshot::empty("Kyiv", now());
        snapshot.moisture = Some(MoistureReading {
            current_moisture: 15.0,
            historical_average: Some(40.0),
            moisture_difference: Some(-25.0),
            // Deliberately inconsistent with the value.
            risk_level: Some(RiskLevel::Normal),
        });
        snapshot.vegetation = Some(VegetationIndices {
            ndvi: 0.25,
            evi: None,
            savi: None,
            ndwi: None,
            lai: None,
            health: None,
        });

        let report = analyze(snapshot, now().date_naive(), now());

        assert_eq!(report.moisture_status.status, "very_low");
        assert_eq!(report.vegetation_status.status, "very_low");
        assert_eq!(report.vegetation_health, Some(VegetationHealth::Poor));
        assert!(report.alerts.iter().any(|a| a.id == "moisture-critical"));
        assert!(report.alerts.iter().any(|a| a.id == "vegetation-poor"));
    }

    #[tokio::test]
    async fn session_drops_superseded_responses() {
        let session = DashboardSession::new();
        let slow = session.begin("Lviv");
        let fast = session.begin("Odesa");

        assert!(session.commit(&fast, DashboardSnapshot::empty("Odesa", now())).await);
        assert!(!session.commit(&slow, DashboardSnapshot::empty("Lviv", now())).await);

        let shown = session.current().await.expect("snapshot committed");
        assert_eq!(shown.city, "Odesa");
    }

    #[tokio::test]
    async fn session_refresh_commits_latest() {
        let session = DashboardSession::new();
        let service = sample_service();

        let snapshot = session.refresh(&service, "Kharkiv").await.expect("committed");
        assert_eq!(snapshot.city, "Kharkiv");
        assert_eq!(session.current().await.map(|s| s.city), Some("Kharkiv".to_string()));
    }

    #[tokio::test]
    async fn slower_refresh_for_older_city_does_not_overwrite_newer() {
        let release = Arc::new(Notify::new());
        let service = DashboardService::new(Box::new(HeldProvider {
            inner: SampleProvider::anchored_at(now()),
            held_city: "Lviv",
            release: Arc::clone(&release),
        }));
        let session = DashboardSession::new();

        let older = session.refresh(&service, "Lviv");
        let newer = async {
            let snapshot = session.refresh(&service, "Odesa").await;
            release.notify_one();
            snapshot
        };
        let (older, newer) = tokio::join!(older, newer);

        assert!(older.is_none());
        assert_eq!(newer.map(|s| s.city), Some("Odesa".to_string()));
        assert_eq!(session.current().await.map(|s| s.city), Some("Odesa".to_string()));
    }
}
