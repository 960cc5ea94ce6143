use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::model::{VegetationHealth, VegetationIndices};

const UNKNOWN_LABEL: &str = "Невідомо";
const UNKNOWN_COLOR: &str = "#9e9e9e";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// `value < limit`
    Below(f64),
    /// `value <= limit`
    AtMost(f64),
    Any,
}

impl Bound {
    fn admits(&self, value: f64) -> bool {
        match *self {
            Bound::Below(limit) => value < limit,
            Bound::AtMost(limit) => value <= limit,
            Bound::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Band<S> {
    pub bound: Bound,
    pub status: S,
}

const fn band<S>(bound: Bound, status: S) -> Band<S> {
    Band { bound, status }
}

/// First band admitting `value`; missing or non-finite values match nothing.
fn first_match<S: Copy>(bands: &[Band<S>], value: Option<f64>) -> Option<S> {
    let value = value.filter(|v| v.is_finite())?;
    bands.iter().find(|b| b.bound.admits(value)).map(|b| b.status)
}

/// Human-facing rendering of a status band.
pub trait StatusLabel {
    /// Stable machine key, e.g. `"optimal"`.
    fn key(&self) -> &'static str;
    fn label(&self) -> &'static str;
    fn color(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoistureStatus {
    VeryLow,
    Low,
    Insufficient,
    Optimal,
    High,
    Excessive,
    Unknown,
}

const MOISTURE_BANDS: [Band<MoistureStatus>; 6] = [
    band(Bound::Below(20.0), MoistureStatus::VeryLow),
    band(Bound::Below(30.0), MoistureStatus::Low),
    band(Bound::Below(40.0), MoistureStatus::Insufficient),
    band(Bound::AtMost(70.0), MoistureStatus::Optimal),
    band(Bound::AtMost(85.0), MoistureStatus::High),
    band(Bound::Any, MoistureStatus::Excessive),
];

impl StatusLabel for MoistureStatus {
    fn key(&self) -> &'static str {
        match self {
            MoistureStatus::VeryLow => "very_low",
            MoistureStatus::Low => "low",
            MoistureStatus::Insufficient => "insufficient",
            MoistureStatus::Optimal => "optimal",
            MoistureStatus::High => "high",
            MoistureStatus::Excessive => "excessive",
            MoistureStatus::Unknown => "unknown",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MoistureStatus::VeryLow => "Дуже низька",
            MoistureStatus::Low => "Низька",
            MoistureStatus::Insufficient => "Недостатня",
            MoistureStatus::Optimal => "Оптимальна",
            MoistureStatus::High => "Висока",
            MoistureStatus::Excessive => "Надмірна",
            MoistureStatus::Unknown => UNKNOWN_LABEL,
        }
    }

    fn color(&self) -> &'static str {
        match self {
            MoistureStatus::VeryLow => "#d32f2f",
            MoistureStatus::Low => "#f4511e",
            MoistureStatus::Insufficient => "#ff9800",
            MoistureStatus::Optimal => "#4caf50",
            MoistureStatus::High => "#2196f3",
            MoistureStatus::Excessive => "#0d47a1",
            MoistureStatus::Unknown => UNKNOWN_COLOR,
        }
    }
}

pub fn moisture_status(percent: Option<f64>) -> MoistureStatus {
    first_match(&MOISTURE_BANDS, percent).unwrap_or(MoistureStatus::Unknown)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NdviStatus {
    NoVegetation,
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
    Unknown,
}

const NDVI_BANDS: [Band<NdviStatus>; 6] = [
    band(Bound::Below(0.1), NdviStatus::NoVegetation),
    band(Bound::Below(0.3), NdviStatus::VeryLow),
    band(Bound::Below(0.5), NdviStatus::Low),
    band(Bound::Below(0.7), NdviStatus::Moderate),
    band(Bound::Below(0.9), NdviStatus::High),
    band(Bound::Any, NdviStatus::VeryHigh),
];

impl StatusLabel for NdviStatus {
    fn key(&self) -> &'static str {
        match self {
            NdviStatus::NoVegetation => "no_vegetation",
            NdviStatus::VeryLow => "very_low",
            NdviStatus::Low => "low",
            NdviStatus::Moderate => "moderate",
            NdviStatus::High => "high",
            NdviStatus::VeryHigh => "very_high",
            NdviStatus::Unknown => "unknown",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            NdviStatus::NoVegetation => "Відсутність рослинності",
            NdviStatus::VeryLow => "Дуже низька рослинність",
            NdviStatus::Low => "Низька рослинність",
            NdviStatus::Moderate => "Помірна рослинність",
            NdviStatus::High => "Висока рослинність",
            NdviStatus::VeryHigh => "Дуже висока рослинність",
            NdviStatus::Unknown => UNKNOWN_LABEL,
        }
    }

    fn color(&self) -> &'static str {
        match self {
            NdviStatus::NoVegetation => "#8d6e63",
            NdviStatus::VeryLow => "#d32f2f",
            NdviStatus::Low => "#ff9800",
            NdviStatus::Moderate => "#cddc39",
            NdviStatus::High => "#66bb6a",
            NdviStatus::VeryHigh => "#1b5e20",
            NdviStatus::Unknown => UNKNOWN_COLOR,
        }
    }
}

pub fn ndvi_status(ndvi: Option<f64>) -> NdviStatus {
    first_match(&NDVI_BANDS, ndvi).unwrap_or(NdviStatus::Unknown)
}

/// Shared four-step scale for EVI, SAVI and LAI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    Unknown,
}

const EVI_BANDS: [Band<IndexLevel>; 4] = [
    band(Bound::Below(0.2), IndexLevel::VeryLow),
    band(Bound::Below(0.4), IndexLevel::Low),
    band(Bound::Below(0.6), IndexLevel::Moderate),
    band(Bound::Any, IndexLevel::High),
];

const SAVI_BANDS: [Band<IndexLevel>; 4] = [
    band(Bound::Below(0.2), IndexLevel::VeryLow),
    band(Bound::Below(0.4), IndexLevel::Low),
    band(Bound::Below(0.6), IndexLevel::Moderate),
    band(Bound::Any, IndexLevel::High),
];

const LAI_BANDS: [Band<IndexLevel>; 4] = [
    band(Bound::Below(1.0), IndexLevel::VeryLow),
    band(Bound::Below(2.0), IndexLevel::Low),
    band(Bound::Below(4.0), IndexLevel::Moderate),
    band(Bound::Any, IndexLevel::High),
];

impl StatusLabel for IndexLevel {
    fn key(&self) -> &'static str {
        match self {
            IndexLevel::VeryLow => "very_low",
            IndexLevel::Low => "low",
            IndexLevel::Moderate => "moderate",
            IndexLevel::High => "high",
            IndexLevel::Unknown => "unknown",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            IndexLevel::VeryLow => "Дуже низький",
            IndexLevel::Low => "Низький",
            IndexLevel::Moderate => "Помірний",
            IndexLevel::High => "Високий",
            IndexLevel::Unknown => UNKNOWN_LABEL,
        }
    }

    fn color(&self) -> &'static str {
        match self {
            IndexLevel::VeryLow => "#d32f2f",
            IndexLevel::Low => "#ff9800",
            IndexLevel::Moderate => "#cddc39",
            IndexLevel::High => "#4caf50",
            IndexLevel::Unknown => UNKNOWN_COLOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterStress {
    Severe,
    Moderate,
    Normal,
    Saturated,
    Unknown,
}

const NDWI_BANDS: [Band<WaterStress>; 4] = [
    band(Bound::Below(-0.3), WaterStress::Severe),
    band(Bound::Below(0.0), WaterStress::Moderate),
    band(Bound::AtMost(0.3), WaterStress::Normal),
    band(Bound::Any, WaterStress::Saturated),
];

impl StatusLabel for WaterStress {
    fn key(&self) -> &'static str {
        match self {
            WaterStress::Severe => "severe_stress",
            WaterStress::Moderate => "moderate_stress",
            WaterStress::Normal => "normal",
            WaterStress::Saturated => "saturated",
            WaterStress::Unknown => "unknown",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            WaterStress::Severe => "Сильний водний стрес",
            WaterStress::Moderate => "Помірний водний стрес",
            WaterStress::Normal => "Нормальне зволоження",
            WaterStress::Saturated => "Перезволоження",
            WaterStress::Unknown => UNKNOWN_LABEL,
        }
    }

    fn color(&self) -> &'static str {
        match self {
            WaterStress::Severe => "#d32f2f",
            WaterStress::Moderate => "#ff9800",
            WaterStress::Normal => "#4caf50",
            WaterStress::Saturated => "#1565c0",
            WaterStress::Unknown => UNKNOWN_COLOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirQualityStatus {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

const AQI_BANDS: [Band<AirQualityStatus>; 6] = [
    band(Bound::AtMost(50.0), AirQualityStatus::Good),
    band(Bound::AtMost(100.0), AirQualityStatus::Moderate),
    band(Bound::AtMost(150.0), AirQualityStatus::UnhealthyForSensitive),
    band(Bound::AtMost(200.0), AirQualityStatus::Unhealthy),
    band(Bound::AtMost(300.0), AirQualityStatus::VeryUnhealthy),
    band(Bound::Any, AirQualityStatus::Hazardous),
];

impl StatusLabel for AirQualityStatus {
    fn key(&self) -> &'static str {
        match self {
            AirQualityStatus::Good => "good",
            AirQualityStatus::Moderate => "moderate",
            AirQualityStatus::UnhealthyForSensitive => "unhealthy_for_sensitive",
            AirQualityStatus::Unhealthy => "unhealthy",
            AirQualityStatus::VeryUnhealthy => "very_unhealthy",
            AirQualityStatus::Hazardous => "hazardous",
            AirQualityStatus::Unknown => "unknown",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AirQualityStatus::Good => "Добра",
            AirQualityStatus::Moderate => "Помірна",
            AirQualityStatus::UnhealthyForSensitive => "Шкідлива для чутливих груп",
            AirQualityStatus::Unhealthy => "Шкідлива",
            AirQualityStatus::VeryUnhealthy => "Дуже шкідлива",
            AirQualityStatus::Hazardous => "Небезпечна",
            AirQualityStatus::Unknown => UNKNOWN_LABEL,
        }
    }

    fn color(&self) -> &'static str {
        match self {
            AirQualityStatus::Good => "#4caf50",
            AirQualityStatus::Moderate => "#ffeb3b",
            AirQualityStatus::UnhealthyForSensitive => "#ff9800",
            AirQualityStatus::Unhealthy => "#f44336",
            AirQualityStatus::VeryUnhealthy => "#9c27b0",
            AirQualityStatus::Hazardous => "#7e0023",
            AirQualityStatus::Unknown => UNKNOWN_COLOR,
        }
    }
}

pub fn air_quality_status(index: Option<f64>) -> AirQualityStatus {
    first_match(&AQI_BANDS, index).unwrap_or(AirQualityStatus::Unknown)
}

const HEALTH_BANDS: [Band<VegetationHealth>; 4] = [
    band(Bound::Below(0.3), VegetationHealth::Poor),
    band(Bound::Below(0.5), VegetationHealth::Moderate),
    band(Bound::Below(0.7), VegetationHealth::Good),
    band(Bound::Any, VegetationHealth::Excellent),
];

impl StatusLabel for VegetationHealth {
    fn key(&self) -> &'static str {
        self.as_str()
    }

    fn label(&self) -> &'static str {
        match self {
            VegetationHealth::Excellent => "Відмінний стан",
            VegetationHealth::Good => "Добрий стан",
            VegetationHealth::Moderate => "Задовільний стан",
            VegetationHealth::Poor => "Поганий стан",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            VegetationHealth::Excellent => "#1b5e20",
            VegetationHealth::Good => "#4caf50",
            VegetationHealth::Moderate => "#ff9800",
            VegetationHealth::Poor => "#d32f2f",
        }
    }
}

/// Health of the vegetation. A server-supplied label wins; otherwise it is
/// derived from NDVI.
pub fn vegetation_health(indices: &VegetationIndices) -> Option<VegetationHealth> {
    indices.health.or_else(|| first_match(&HEALTH_BANDS, Some(indices.ndvi)))
}

/// Metrics the classifier knows how to band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    SoilMoisture,
    Ndvi,
    Evi,
    Savi,
    Ndwi,
    Lai,
    AirQualityIndex,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::SoilMoisture => "moisture",
            MetricKind::Ndvi => "ndvi",
            MetricKind::Evi => "evi",
            MetricKind::Savi => "savi",
            MetricKind::Ndwi => "ndwi",
            MetricKind::Lai => "lai",
            MetricKind::AirQualityIndex => "aqi",
        }
    }

    pub const fn all() -> &'static [MetricKind] {
        &[
            MetricKind::SoilMoisture,
            MetricKind::Ndvi,
            MetricKind::Evi,
            MetricKind::Savi,
            MetricKind::Ndwi,
            MetricKind::Lai,
            MetricKind::AirQualityIndex,
        ]
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MetricKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "moisture" | "soil-moisture" | "soil_moisture" => Ok(MetricKind::SoilMoisture),
            "ndvi" => Ok(MetricKind::Ndvi),
            "evi" => Ok(MetricKind::Evi),
            "savi" => Ok(MetricKind::Savi),
            "ndwi" => Ok(MetricKind::Ndwi),
            "lai" => Ok(MetricKind::Lai),
            "aqi" | "air-quality" => Ok(MetricKind::AirQualityIndex),
            _ => Err(anyhow::anyhow!(
                "Unknown metric '{value}'. Supported metrics: moisture, ndvi, evi, savi, ndwi, lai, aqi."
            )),
        }
    }
}

/// Type-erased classifier output, ready for display or serialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub metric: MetricKind,
    pub value: Option<f64>,
    pub status: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

impl Classification {
    fn from_status(metric: MetricKind, value: Option<f64>, status: &impl StatusLabel) -> Self {
        Self { metric, value, status: status.key(), label: status.label(), color: status.color() }
    }

    pub fn is_unknown(&self) -> bool {
        self.status == "unknown"
    }
}

pub fn classify(metric: MetricKind, value: Option<f64>) -> Classification {
    match metric {
        MetricKind::SoilMoisture => {
            Classification::from_status(metric, value, &moisture_status(value))
        }
        MetricKind::Ndvi => Classification::from_status(metric, value, &ndvi_status(value)),
        MetricKind::Evi => Classification::from_status(
            metric,
            value,
            &first_match(&EVI_BANDS, value).unwrap_or(IndexLevel::Unknown),
        ),
        MetricKind::Savi => Classification::from_status(
            metric,
            value,
            &first_match(&SAVI_BANDS, value).unwrap_or(IndexLevel::Unknown),
        ),
        MetricKind::Lai => Classification::from_status(
            metric,
            value,
            &first_match(&LAI_BANDS, value).unwrap_or(IndexLevel::Unknown),
        ),
        MetricKind::Ndwi => Classification::from_status(
            metric,
            value,
            &first_match(&NDWI_BANDS, value).unwrap_or(WaterStress::Unknown),
        ),
        MetricKind::AirQualityIndex => {
            Classification::from_status(metric, value, &air_quality_status(value))
        }
    }
}
