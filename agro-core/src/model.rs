use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One independently fetched slice of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataDomain {
    CurrentWeather,
    Forecast,
    Hourly,
    Extended,
    AirQuality,
    SoilMoisture,
    Vegetation,
    Trends,
    Yield,
}

impl DataDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataDomain::CurrentWeather => "current-weather",
            DataDomain::Forecast => "forecast",
            DataDomain::Hourly => "hourly",
            DataDomain::Extended => "extended",
            DataDomain::AirQuality => "air-quality",
            DataDomain::SoilMoisture => "soil-moisture",
            DataDomain::Vegetation => "vegetation",
            DataDomain::Trends => "trends",
            DataDomain::Yield => "yield",
        }
    }
}

impl std::fmt::Display for DataDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions for a city. Temperatures are in Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub description: String,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub max_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub max_temperature: f64,
    pub min_temperature: f64,
    pub description: String,
    pub humidity: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub wind_speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub description: String,
    pub precipitation_probability: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedWeather {
    pub pressure: Option<f64>,
    pub visibility: Option<f64>,
    pub uv_index: Option<f64>,
    pub cloudiness: Option<f64>,
    pub dew_point: Option<f64>,
    pub feels_like: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub index: f64,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub co: Option<f64>,
    pub so2: Option<f64>,
}

/// Server-side moisture risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    Normal,
    ModerateDry,
    HighDry,
    ModerateWet,
    HighWet,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Normal => "normal",
            RiskLevel::ModerateDry => "moderate-dry",
            RiskLevel::HighDry => "high-dry",
            RiskLevel::ModerateWet => "moderate-wet",
            RiskLevel::HighWet => "high-wet",
        }
    }

    /// Parses the server label. Accepts `_` as well as `-` separators.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "normal" => Some(RiskLevel::Normal),
            "moderate-dry" => Some(RiskLevel::ModerateDry),
            "high-dry" => Some(RiskLevel::HighDry),
            "moderate-wet" => Some(RiskLevel::ModerateWet),
            "high-wet" => Some(RiskLevel::HighWet),
            _ => None,
        }
    }

    /// Risk category implied by a moisture percentage, using the same band
    /// edges as the client-side moisture classifier.
    pub fn from_moisture(percent: f64) -> Self {
        if percent < 20.0 {
            RiskLevel::HighDry
        } else if percent < 40.0 {
            RiskLevel::ModerateDry
        } else if percent <= 70.0 {
            RiskLevel::Normal
        } else if percent <= 85.0 {
            RiskLevel::ModerateWet
        } else {
            RiskLevel::HighWet
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoistureReading {
    /// Percent, always within `[0, 100]` after normalization.
    pub current_moisture: f64,
    pub historical_average: Option<f64>,
    pub moisture_difference: Option<f64>,
    pub risk_level: Option<RiskLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VegetationHealth {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl VegetationHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            VegetationHealth::Excellent => "excellent",
            VegetationHealth::Good => "good",
            VegetationHealth::Moderate => "moderate",
            VegetationHealth::Poor => "poor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "excellent" => Some(VegetationHealth::Excellent),
            "good" => Some(VegetationHealth::Good),
            "moderate" | "fair" => Some(VegetationHealth::Moderate),
            "poor" => Some(VegetationHealth::Poor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VegetationIndices {
    pub ndvi: f64,
    pub evi: Option<f64>,
    pub savi: Option<f64>,
    pub ndwi: Option<f64>,
    pub lai: Option<f64>,
    /// Health label supplied by the server, if any.
    pub health: Option<VegetationHealth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
    #[default]
    Unknown,
}

impl TrendDirection {
    /// Relative change between the first and last point below this is "stable".
    const STABLE_BAND: f64 = 0.05;

    /// Direction of a date-ordered series, comparing its first and last values.
    pub fn of(series: &[TrendPoint]) -> Self {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return TrendDirection::Unknown;
        };
        if series.len() < 2 {
            return TrendDirection::Unknown;
        }

        let scale = first.value.abs().max(f64::EPSILON);
        let change = (last.value - first.value) / scale;

        if change > Self::STABLE_BAND {
            TrendDirection::Rising
        } else if change < -Self::STABLE_BAND {
            TrendDirection::Falling
        } else {
            TrendDirection::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Rising => "↑ rising",
            TrendDirection::Falling => "↓ falling",
            TrendDirection::Stable => "→ stable",
            TrendDirection::Unknown => "? unknown",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-metric history, each series sorted by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    pub moisture: Vec<TrendPoint>,
    pub temperature: Vec<TrendPoint>,
    pub ndvi: Vec<TrendPoint>,
}

impl Trends {
    pub fn moisture_direction(&self) -> TrendDirection {
        TrendDirection::of(&self.moisture)
    }

    pub fn temperature_direction(&self) -> TrendDirection {
        TrendDirection::of(&self.temperature)
    }

    pub fn ndvi_direction(&self) -> TrendDirection {
        TrendDirection::of(&self.ndvi)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldPrediction {
    pub crop: String,
    pub predicted_yield: f64,
    pub unit: String,
    pub confidence: Option<f64>,
}

/// Urgency shared by alerts, actions and calendar operations.
///
/// Ordering puts `High` first, so an ascending sort lists urgent items on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Error,
    Warning,
    Info,
    Success,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Error => "error",
            AlertKind::Warning => "warning",
            AlertKind::Info => "info",
            AlertKind::Success => "success",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient alert. Recomputed on every refresh, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Irrigation,
    Drainage,
    Protection,
    Spraying,
    Inspection,
    Fertilization,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Irrigation => "irrigation",
            OperationType::Drainage => "drainage",
            OperationType::Protection => "protection",
            OperationType::Spraying => "spraying",
            OperationType::Inspection => "inspection",
            OperationType::Fertilization => "fertilization",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Planned,
    Urgent,
}

/// Where a calendar operation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationSource {
    Moisture,
    Weather,
    Forecast,
    Vegetation,
    Routine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarOperation {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OperationType,
    pub date: NaiveDate,
    pub priority: Priority,
    pub status: OperationStatus,
    pub recommendation: String,
    pub source: OperationSource,
}

/// Everything fetched for one city in one refresh. A `None` slot means that
/// domain's fetch failed or was never made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub city: String,
    pub fetched_at: DateTime<Utc>,
    pub weather: Option<WeatherSnapshot>,
    pub forecast: Option<Vec<ForecastDay>>,
    pub hourly: Option<Vec<HourlyEntry>>,
    pub extended: Option<ExtendedWeather>,
    pub air_quality: Option<AirQuality>,
    pub moisture: Option<MoistureReading>,
    pub vegetation: Option<VegetationIndices>,
    pub trends: Option<Trends>,
    pub yield_prediction: Option<YieldPrediction>,
}

impl DashboardSnapshot {
    pub fn empty(city: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            city: city.into(),
            fetched_at,
            weather: None,
            forecast: None,
            hourly: None,
            extended: None,
            air_quality: None,
            moisture: None,
            vegetation: None,
            trends: None,
            yield_prediction: None,
        }
    }

    /// Domains whose fetch produced no data.
    pub fn missing_domains(&self) -> Vec<DataDomain> {
        let slots = [
            (DataDomain::CurrentWeather, self.weather.is_some()),
            (DataDomain::Forecast, self.forecast.is_some()),
            (DataDomain::Hourly, self.hourly.is_some()),
            (DataDomain::Extended, self.extended.is_some()),
            (DataDomain::AirQuality, self.air_quality.is_some()),
            (DataDomain::SoilMoisture, self.moisture.is_some()),
            (DataDomain::Vegetation, self.vegetation.is_some()),
            (DataDomain::Trends, self.trends.is_some()),
            (DataDomain::Yield, self.yield_prediction.is_some()),
        ];

        slots
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(domain, _)| domain)
            .collect()
    }
}
